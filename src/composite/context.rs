use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::blend::mode;
use crate::blend::mode::BlendMode;
use crate::composite::mask;
use crate::foundation::error::{BlendixError, BlendixResult};
use crate::foundation::math::{clamp_channel, mul_div255_u16};

/// Interleaved 8-bit pixel buffer layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Three bands per pixel: opaque RGB with implicit full alpha.
    Rgb,
    /// Four bands per pixel: RGBA with a trailing alpha sample.
    Rgba,
}

impl PixelLayout {
    /// Number of interleaved samples per pixel.
    pub fn bands(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// Channel-mixing precision for the alpha interpolation step.
///
/// Both settings use the same per-mode blend formulas; they differ only in
/// how the blended value and the untouched destination are weighted
/// together. [`MixPrecision::Float`] rounds once per channel instead of
/// once per term, trading a little speed for reduced banding. Consumers
/// that need byte-identical reproducible output must pin this hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MixPrecision {
    /// Fixed-point mixing with per-term rounding.
    #[default]
    Integer,
    /// Float-weighted mixing with a single rounding per channel.
    Float,
}

/// Hints bound into a compositing context for one rendering pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposeHints {
    /// Channel-mixing precision. Defaults to [`MixPrecision::Integer`].
    pub precision: MixPrecision,
}

impl ComposeHints {
    /// Return hints with the given mixing precision.
    pub fn with_precision(mut self, precision: MixPrecision) -> Self {
        self.precision = precision;
        self
    }
}

/// An ARGB compositing operator that can be bound to concrete pixel
/// layouts for one rendering pass.
///
/// Implementors are immutable once constructed and safe to share across
/// threads; the contexts they produce are cheap, single-pass bindings.
pub trait ArgbComposite {
    /// Bind this operator to source/destination layouts and hints.
    fn context(&self, src: PixelLayout, dst: PixelLayout, hints: ComposeHints) -> CompositeContext;
}

/// A blend mode paired with a constant overall alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendComposite {
    mode: BlendMode,
    alpha: u8,
}

impl BlendComposite {
    /// Create a fully opaque composite for `mode`.
    pub fn new(mode: BlendMode) -> Self {
        Self { mode, alpha: 255 }
    }

    /// Create a composite for `mode` with a constant overall alpha.
    ///
    /// `alpha` must be in `[0, 1]`; it is quantized to 8 bits here, once,
    /// so every context derived from this composite sees the same factor.
    pub fn with_alpha(mode: BlendMode, alpha: f32) -> BlendixResult<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(BlendixError::validation(format!(
                "blend alpha must be in [0, 1], got {alpha}"
            )));
        }
        Ok(Self {
            mode,
            alpha: quantize_unit(alpha),
        })
    }

    /// The blend mode this composite applies.
    pub fn mode(&self) -> BlendMode {
        self.mode
    }
}

impl ArgbComposite for BlendComposite {
    fn context(&self, src: PixelLayout, dst: PixelLayout, hints: ComposeHints) -> CompositeContext {
        tracing::trace!(
            mode = self.mode.name(),
            ?src,
            ?dst,
            precision = ?hints.precision,
            "binding blend compositing context"
        );
        CompositeContext {
            kernel: Kernel::Blend(self.mode),
            src,
            dst,
            alpha: u16::from(self.alpha),
            precision: hints.precision,
        }
    }
}

/// Quantize a `[0, 1]` factor to 8 bits.
pub(crate) fn quantize_unit(v: f32) -> u8 {
    ((v * 255.0).round() as i32).clamp(0, 255) as u8
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Kernel {
    Blend(BlendMode),
    /// Pass-through masking with per-channel alpha factors (r, g, b).
    Mask([u8; 3]),
}

/// A compositing operator bound to concrete pixel layouts for one pass.
///
/// Contexts hold no buffers and no mutable state; create one per rendering
/// pass, call [`compose`](Self::compose) over each scanline range, then
/// drop it. Sharing one context across threads for disjoint buffer regions
/// is sound.
#[derive(Clone, Copy, Debug)]
pub struct CompositeContext {
    pub(crate) kernel: Kernel,
    pub(crate) src: PixelLayout,
    pub(crate) dst: PixelLayout,
    /// Overall alpha factor, quantized to [0, 255].
    pub(crate) alpha: u16,
    pub(crate) precision: MixPrecision,
}

impl CompositeContext {
    /// Source pixel layout this context was bound to.
    pub fn src_layout(&self) -> PixelLayout {
        self.src
    }

    /// Destination pixel layout this context was bound to.
    pub fn dst_layout(&self) -> PixelLayout {
        self.dst
    }

    /// Composite `src` over `dst` in place.
    ///
    /// Buffers are interleaved 8-bit samples in the layouts this context
    /// was bound to, covering the same pixel count.
    ///
    /// # Panics
    ///
    /// Panics if either buffer length is not a multiple of its band count,
    /// or if the buffers cover different pixel counts. These are
    /// precondition violations, not recoverable conditions; callers are
    /// responsible for buffer shapes.
    pub fn compose(&self, src: &[u8], dst: &mut [u8]) {
        let sb = self.src.bands();
        let db = self.dst.bands();
        assert!(
            src.len().is_multiple_of(sb),
            "source length {} is not a multiple of {sb} bands",
            src.len()
        );
        assert!(
            dst.len().is_multiple_of(db),
            "destination length {} is not a multiple of {db} bands",
            dst.len()
        );
        assert_eq!(
            src.len() / sb,
            dst.len() / db,
            "source and destination cover different pixel counts"
        );

        match self.kernel {
            Kernel::Mask(factors) => mask::compose(self, src, dst, factors),
            Kernel::Blend(m) => self.compose_blend(src, dst, m),
        }
    }

    /// Parallel variant of [`compose`](Self::compose).
    ///
    /// Splits the pixel run into disjoint chunks and composes them on the
    /// rayon pool. Output is byte-identical to the serial path. Same panic
    /// contract as [`compose`](Self::compose).
    pub fn compose_par(&self, src: &[u8], dst: &mut [u8]) {
        let sb = self.src.bands();
        let db = self.dst.bands();
        assert!(
            src.len().is_multiple_of(sb),
            "source length {} is not a multiple of {sb} bands",
            src.len()
        );
        assert!(
            dst.len().is_multiple_of(db),
            "destination length {} is not a multiple of {db} bands",
            dst.len()
        );
        assert_eq!(
            src.len() / sb,
            dst.len() / db,
            "source and destination cover different pixel counts"
        );

        const CHUNK_PIXELS: usize = 4096;
        dst.par_chunks_mut(db * CHUNK_PIXELS)
            .zip(src.par_chunks(sb * CHUNK_PIXELS))
            .for_each(|(dchunk, schunk)| self.compose(schunk, dchunk));
    }

    fn compose_blend(&self, src: &[u8], dst: &mut [u8], m: BlendMode) {
        // Kernel dispatch happens once per compose call, never per pixel;
        // each arm monomorphizes the scanline drivers for its formula.
        match m {
            BlendMode::Normal => self.separable(src, dst, mode::blend_normal),
            BlendMode::Lighten => self.separable(src, dst, mode::blend_lighten),
            BlendMode::Darken => self.separable(src, dst, mode::blend_darken),
            BlendMode::Add => self.separable(src, dst, mode::blend_add),
            BlendMode::Subtract => self.separable(src, dst, mode::blend_subtract),
            BlendMode::Difference => self.separable(src, dst, mode::blend_difference),
            BlendMode::Exclusion => self.separable(src, dst, mode::blend_exclusion),
            BlendMode::Negation => self.separable(src, dst, mode::blend_negation),
            BlendMode::Multiply => self.separable(src, dst, mode::blend_multiply),
            BlendMode::Screen => self.separable(src, dst, mode::blend_screen),
            BlendMode::Burn => self.separable(src, dst, mode::blend_burn),
            BlendMode::ColorBurn => self.separable(src, dst, mode::blend_color_burn),
            BlendMode::LinearBurn => self.separable(src, dst, mode::blend_linear_burn),
            BlendMode::Dodge => self.separable(src, dst, mode::blend_dodge),
            BlendMode::ColorDodge => self.separable(src, dst, mode::blend_color_dodge),
            BlendMode::Overlay => self.separable(src, dst, mode::blend_overlay),
            BlendMode::HardLight => self.separable(src, dst, mode::blend_hard_light),
            BlendMode::SoftLight => self.separable(src, dst, mode::blend_soft_light),
            BlendMode::LinearLight => self.separable(src, dst, mode::blend_linear_light),
            BlendMode::PinLight => self.separable(src, dst, mode::blend_pin_light),
            BlendMode::VividLight => self.separable(src, dst, mode::blend_vivid_light),
            BlendMode::HardMix => self.separable(src, dst, mode::blend_hard_mix),
            BlendMode::Reflect => self.separable(src, dst, mode::blend_reflect),
            BlendMode::Glow => self.separable(src, dst, mode::blend_glow),
            BlendMode::Hue => self.nonseparable(src, dst, mode::blend_hue),
            BlendMode::Saturation => self.nonseparable(src, dst, mode::blend_saturation),
            BlendMode::Color => self.nonseparable(src, dst, mode::blend_color),
            BlendMode::Luminosity => self.nonseparable(src, dst, mode::blend_luminosity),
        }
    }

    fn separable<F>(&self, src: &[u8], dst: &mut [u8], op: F)
    where
        F: Fn(i32, i32) -> i32 + Copy,
    {
        self.drive(src, dst, move |sp, dp| {
            [
                clamp_channel(op(i32::from(sp[0]), i32::from(dp[0]))),
                clamp_channel(op(i32::from(sp[1]), i32::from(dp[1]))),
                clamp_channel(op(i32::from(sp[2]), i32::from(dp[2]))),
            ]
        });
    }

    fn nonseparable<F>(&self, src: &[u8], dst: &mut [u8], op: F)
    where
        F: Fn([u8; 3], [u8; 3]) -> [u8; 3] + Copy,
    {
        self.drive(src, dst, move |sp, dp| {
            op([sp[0], sp[1], sp[2]], [dp[0], dp[1], dp[2]])
        });
    }

    fn drive<F>(&self, src: &[u8], dst: &mut [u8], blend_px: F)
    where
        F: Fn(&[u8], &[u8]) -> [u8; 3],
    {
        let sb = self.src.bands();
        let db = self.dst.bands();
        let fast = sb == 4 && db == 4;
        match (self.precision, fast) {
            (MixPrecision::Integer, true) => drive_int_4x4(src, dst, self.alpha, blend_px),
            (MixPrecision::Integer, false) => drive_int(src, dst, sb, db, self.alpha, blend_px),
            (MixPrecision::Float, true) => drive_float_4x4(src, dst, self.alpha, blend_px),
            (MixPrecision::Float, false) => drive_float(src, dst, sb, db, self.alpha, blend_px),
        }
    }
}

// The four scanline drivers. Each mode's blend formula is computed first,
// then the shared interpolation folds it toward the destination under the
// effective source alpha: out = mix(sa, blended) + mix(255 - sa, dst).
// The 4x4 fast paths skip per-pixel band branching and must stay
// byte-identical to the general drivers on 4-band/4-band input.

fn drive_int<F>(src: &[u8], dst: &mut [u8], sb: usize, db: usize, alpha: u16, blend_px: F)
where
    F: Fn(&[u8], &[u8]) -> [u8; 3],
{
    for (sp, dp) in src.chunks_exact(sb).zip(dst.chunks_exact_mut(db)) {
        let coverage = if sb == 4 { u16::from(sp[3]) } else { 255 };
        let sa = mul_div255_u16(alpha, coverage);
        let da = 255 - sa;
        let blended = blend_px(sp, dp);
        for c in 0..3 {
            dp[c] = (mul_div255_u16(sa, u16::from(blended[c]))
                + mul_div255_u16(da, u16::from(dp[c]))) as u8;
        }
        if db == 4 {
            dp[3] = (sa + mul_div255_u16(da, u16::from(dp[3]))) as u8;
        }
    }
}

fn drive_int_4x4<F>(src: &[u8], dst: &mut [u8], alpha: u16, blend_px: F)
where
    F: Fn(&[u8], &[u8]) -> [u8; 3],
{
    for (sp, dp) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let sa = mul_div255_u16(alpha, u16::from(sp[3]));
        let da = 255 - sa;
        let blended = blend_px(sp, dp);
        for c in 0..3 {
            dp[c] = (mul_div255_u16(sa, u16::from(blended[c]))
                + mul_div255_u16(da, u16::from(dp[c]))) as u8;
        }
        dp[3] = (sa + mul_div255_u16(da, u16::from(dp[3]))) as u8;
    }
}

fn drive_float<F>(src: &[u8], dst: &mut [u8], sb: usize, db: usize, alpha: u16, blend_px: F)
where
    F: Fn(&[u8], &[u8]) -> [u8; 3],
{
    for (sp, dp) in src.chunks_exact(sb).zip(dst.chunks_exact_mut(db)) {
        let coverage = if sb == 4 { u16::from(sp[3]) } else { 255 };
        let sa = mul_div255_u16(alpha, coverage);
        let saf = f32::from(sa);
        let daf = f32::from(255 - sa);
        let blended = blend_px(sp, dp);
        for c in 0..3 {
            let v = (saf * f32::from(blended[c]) + daf * f32::from(dp[c])) / 255.0;
            dp[c] = v.round() as u8;
        }
        if db == 4 {
            let v = (saf * 255.0 + daf * f32::from(dp[3])) / 255.0;
            dp[3] = v.round() as u8;
        }
    }
}

fn drive_float_4x4<F>(src: &[u8], dst: &mut [u8], alpha: u16, blend_px: F)
where
    F: Fn(&[u8], &[u8]) -> [u8; 3],
{
    for (sp, dp) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let sa = mul_div255_u16(alpha, u16::from(sp[3]));
        let saf = f32::from(sa);
        let daf = f32::from(255 - sa);
        let blended = blend_px(sp, dp);
        for c in 0..3 {
            let v = (saf * f32::from(blended[c]) + daf * f32::from(dp[c])) / 255.0;
            dp[c] = v.round() as u8;
        }
        let v = (saf * 255.0 + daf * f32::from(dp[3])) / 255.0;
        dp[3] = v.round() as u8;
    }
}
