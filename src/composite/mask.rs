use crate::composite::context::{
    ArgbComposite, ComposeHints, CompositeContext, Kernel, MixPrecision, PixelLayout,
    quantize_unit,
};
use crate::foundation::error::{BlendixError, BlendixResult};
use crate::foundation::math::mul_div255_u16;

/// Pass-through compositing with independent per-channel alpha factors.
///
/// Instead of a blend formula, each source channel is copied toward the
/// destination under its own effective alpha: the shared effective source
/// alpha scaled by that channel's constructor-supplied factor. A factor of
/// zero pins the corresponding destination channel regardless of source
/// content; a factor of one gives plain source-over for that channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskComposite {
    factors: [u8; 3],
    alpha: u8,
}

impl MaskComposite {
    /// Create a fully opaque mask with the given channel factors.
    ///
    /// Each factor must be in `[0, 1]` and is quantized to 8 bits once,
    /// here.
    pub fn new(r: f32, g: f32, b: f32) -> BlendixResult<Self> {
        Self::with_alpha(r, g, b, 1.0)
    }

    /// Create a mask with channel factors and a constant overall alpha.
    pub fn with_alpha(r: f32, g: f32, b: f32, alpha: f32) -> BlendixResult<Self> {
        for (name, v) in [("r", r), ("g", g), ("b", b), ("alpha", alpha)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(BlendixError::validation(format!(
                    "mask {name} factor must be in [0, 1], got {v}"
                )));
            }
        }
        Ok(Self {
            factors: [quantize_unit(r), quantize_unit(g), quantize_unit(b)],
            alpha: quantize_unit(alpha),
        })
    }

    /// The quantized (r, g, b) channel factors.
    pub fn factors(&self) -> [u8; 3] {
        self.factors
    }
}

impl ArgbComposite for MaskComposite {
    fn context(&self, src: PixelLayout, dst: PixelLayout, hints: ComposeHints) -> CompositeContext {
        tracing::trace!(
            factors = ?self.factors,
            ?src,
            ?dst,
            precision = ?hints.precision,
            "binding mask compositing context"
        );
        CompositeContext {
            kernel: Kernel::Mask(self.factors),
            src,
            dst,
            alpha: u16::from(self.alpha),
            precision: hints.precision,
        }
    }
}

pub(crate) fn compose(ctx: &CompositeContext, src: &[u8], dst: &mut [u8], factors: [u8; 3]) {
    let sb = ctx.src.bands();
    let db = ctx.dst.bands();
    let fast = sb == 4 && db == 4;
    match (ctx.precision, fast) {
        (MixPrecision::Integer, true) => mask_int_4x4(src, dst, ctx.alpha, factors),
        (MixPrecision::Integer, false) => mask_int(src, dst, sb, db, ctx.alpha, factors),
        (MixPrecision::Float, true) => mask_float_4x4(src, dst, ctx.alpha, factors),
        (MixPrecision::Float, false) => mask_float(src, dst, sb, db, ctx.alpha, factors),
    }
}

// Mask drivers mirror the blend drivers, but the interpolation runs under a
// per-channel alpha mix(factor, sa) and the blended value is the raw source
// channel. Destination alpha (when present) composes under the unscaled sa.

fn mask_int(src: &[u8], dst: &mut [u8], sb: usize, db: usize, alpha: u16, factors: [u8; 3]) {
    for (sp, dp) in src.chunks_exact(sb).zip(dst.chunks_exact_mut(db)) {
        let coverage = if sb == 4 { u16::from(sp[3]) } else { 255 };
        let sa = mul_div255_u16(alpha, coverage);
        for c in 0..3 {
            let ca = mul_div255_u16(u16::from(factors[c]), sa);
            dp[c] = (mul_div255_u16(ca, u16::from(sp[c]))
                + mul_div255_u16(255 - ca, u16::from(dp[c]))) as u8;
        }
        if db == 4 {
            dp[3] = (sa + mul_div255_u16(255 - sa, u16::from(dp[3]))) as u8;
        }
    }
}

fn mask_int_4x4(src: &[u8], dst: &mut [u8], alpha: u16, factors: [u8; 3]) {
    for (sp, dp) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let sa = mul_div255_u16(alpha, u16::from(sp[3]));
        for c in 0..3 {
            let ca = mul_div255_u16(u16::from(factors[c]), sa);
            dp[c] = (mul_div255_u16(ca, u16::from(sp[c]))
                + mul_div255_u16(255 - ca, u16::from(dp[c]))) as u8;
        }
        dp[3] = (sa + mul_div255_u16(255 - sa, u16::from(dp[3]))) as u8;
    }
}

fn mask_float(src: &[u8], dst: &mut [u8], sb: usize, db: usize, alpha: u16, factors: [u8; 3]) {
    for (sp, dp) in src.chunks_exact(sb).zip(dst.chunks_exact_mut(db)) {
        let coverage = if sb == 4 { u16::from(sp[3]) } else { 255 };
        let sa = mul_div255_u16(alpha, coverage);
        for c in 0..3 {
            let ca = f32::from(mul_div255_u16(u16::from(factors[c]), sa));
            let v = (ca * f32::from(sp[c]) + (255.0 - ca) * f32::from(dp[c])) / 255.0;
            dp[c] = v.round() as u8;
        }
        if db == 4 {
            let saf = f32::from(sa);
            let v = (saf * 255.0 + (255.0 - saf) * f32::from(dp[3])) / 255.0;
            dp[3] = v.round() as u8;
        }
    }
}

fn mask_float_4x4(src: &[u8], dst: &mut [u8], alpha: u16, factors: [u8; 3]) {
    for (sp, dp) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let sa = mul_div255_u16(alpha, u16::from(sp[3]));
        for c in 0..3 {
            let ca = f32::from(mul_div255_u16(u16::from(factors[c]), sa));
            let v = (ca * f32::from(sp[c]) + (255.0 - ca) * f32::from(dp[c])) / 255.0;
            dp[c] = v.round() as u8;
        }
        let saf = f32::from(sa);
        let v = (saf * 255.0 + (255.0 - saf) * f32::from(dp[3])) / 255.0;
        dp[3] = v.round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::mode::BlendMode;
    use crate::composite::context::BlendComposite;

    fn bind(mask: &MaskComposite, src: PixelLayout, dst: PixelLayout) -> CompositeContext {
        mask.context(src, dst, ComposeHints::default())
    }

    #[test]
    fn zero_green_factor_pins_green_channel() {
        let mask = MaskComposite::new(1.0, 0.0, 1.0).unwrap();
        let ctx = bind(&mask, PixelLayout::Rgba, PixelLayout::Rgb);
        let src = [255u8, 255, 255, 255, 13, 200, 90, 255];
        let mut dst = [10u8, 20, 30, 40, 50, 60];
        let before = dst;
        ctx.compose(&src, &mut dst);
        assert_eq!(dst[1], before[1]);
        assert_eq!(dst[4], before[4]);
        // Red and blue follow pass-through masking at full factor.
        assert_eq!(dst[0], 255);
        assert_eq!(dst[2], 255);
        assert_eq!(dst[3], 13);
        assert_eq!(dst[5], 90);
    }

    #[test]
    fn unit_factors_match_normal_blend() {
        let mask = MaskComposite::with_alpha(1.0, 1.0, 1.0, 0.7).unwrap();
        let blend = BlendComposite::with_alpha(BlendMode::Normal, 0.7).unwrap();
        let src = [200u8, 100, 50, 230, 0, 255, 128, 64];
        let dst0 = [5u8, 15, 25, 35, 45, 55, 65, 75];
        for precision in [MixPrecision::Integer, MixPrecision::Float] {
            let hints = ComposeHints::default().with_precision(precision);
            let mut via_mask = dst0;
            mask.context(PixelLayout::Rgba, PixelLayout::Rgba, hints)
                .compose(&src, &mut via_mask);
            let mut via_blend = dst0;
            blend
                .context(PixelLayout::Rgba, PixelLayout::Rgba, hints)
                .compose(&src, &mut via_blend);
            assert_eq!(via_mask, via_blend, "precision={precision:?}");
        }
    }

    #[test]
    fn channel_factors_scale_the_effective_alpha() {
        // factor 0.5 over an opaque pair: ca = mix(128, 255) = 128.
        let mask = MaskComposite::new(0.5, 0.5, 0.5).unwrap();
        let ctx = bind(&mask, PixelLayout::Rgb, PixelLayout::Rgb);
        let src = [255u8, 255, 255];
        let mut dst = [0u8, 0, 0];
        ctx.compose(&src, &mut dst);
        assert_eq!(dst, [128, 128, 128]);
    }

    #[test]
    fn fast_path_matches_general_path() {
        let mask = MaskComposite::with_alpha(0.9, 0.3, 0.6, 0.8).unwrap();
        let pixels = 32;
        let src: Vec<u8> = (0..pixels * 4).map(|i| (i * 37 % 256) as u8).collect();
        let dst0: Vec<u8> = (0..pixels * 4).map(|i| (i * 91 % 256) as u8).collect();
        for precision in [MixPrecision::Integer, MixPrecision::Float] {
            let hints = ComposeHints::default().with_precision(precision);
            let ctx = mask.context(PixelLayout::Rgba, PixelLayout::Rgba, hints);

            let mut via_fast = dst0.clone();
            ctx.compose(&src, &mut via_fast);

            let mut via_general = dst0.clone();
            match precision {
                MixPrecision::Integer => {
                    mask_int(&src, &mut via_general, 4, 4, ctx.alpha, mask.factors())
                }
                MixPrecision::Float => {
                    mask_float(&src, &mut via_general, 4, 4, ctx.alpha, mask.factors())
                }
            }
            assert_eq!(via_fast, via_general, "precision={precision:?}");
        }
    }

    #[test]
    fn factor_validation_rejects_out_of_range() {
        assert!(MaskComposite::new(1.5, 0.0, 0.0).is_err());
        assert!(MaskComposite::new(0.0, -0.1, 0.0).is_err());
        assert!(MaskComposite::with_alpha(0.5, 0.5, 0.5, 2.0).is_err());
        assert!(MaskComposite::new(0.0, f32::NAN, 1.0).is_err());
    }

    #[test]
    fn factors_quantize_to_8_bits() {
        let mask = MaskComposite::new(1.0, 0.5, 0.0).unwrap();
        assert_eq!(mask.factors(), [255, 128, 0]);
    }
}
