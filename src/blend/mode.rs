use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blend::hsb::{hsb_to_rgb, rgb_to_hsb};
use crate::foundation::math::mul_div255_i32;

/// Photoshop-style layer blend modes.
///
/// Every mode defines only the fully blended per-channel value; the shared
/// alpha-interpolation wrapper lives in the compositing context and is
/// identical across modes. Channel math is 8-bit fixed point: inputs and
/// outputs are in `[0, 255]`, and division guards (`+1` offsets, explicit
/// `!= 0` / `== 255` branches) are part of each mode's contract at the
/// pure-black / pure-white extremes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// Source over destination; the source channel passes through unchanged.
    Normal,
    /// `max(s, d)`
    Lighten,
    /// `min(s, d)`
    Darken,
    /// `min(255, s + d)`; also known as linear dodge.
    Add,
    /// `max(0, d - s)`
    Subtract,
    /// `abs(s - d)`
    Difference,
    /// `d + mul(s, 255 - 2d)`
    Exclusion,
    /// `255 - abs(s - d)`
    Negation,
    /// `mul(s, d)`
    Multiply,
    /// `255 - mul(255 - s, 255 - d)`
    Screen,
    /// Destination-driven burn: `255 - ((255 - min(254, s)) << 8) / (d + 1)`.
    Burn,
    /// `255 - ((255 - d) << 8) / s` for `s != 0`; leaves `d` unchanged at
    /// `s == 0`.
    ColorBurn,
    /// `max(0, s + d - 255)`
    LinearBurn,
    /// Destination-driven dodge: `(s << 8) / (256 - d)`.
    Dodge,
    /// `(d << 8) / (255 - s)` for `s != 255`; at `s == 255` yields 0 for
    /// black destinations and 255 otherwise.
    ColorDodge,
    /// Hard light with source and destination swapped.
    Overlay,
    /// `2·mul(s, d)` below mid source, inverted screen above.
    HardLight,
    /// `t + mul(d, 255 - mul(255-d, 255-s) - t)` with `t = mul(s, d)`.
    SoftLight,
    /// `2s + d - 255` below mid source, `2(s - 128) + d` above, clamped.
    LinearLight,
    /// `min(2s, d)` below mid source, `max(2(s - 128), d)` above.
    PinLight,
    /// Color burn of doubled source below mid, color dodge of doubled
    /// source above.
    VividLight,
    /// Vivid light thresholded to pure 0 or 255 at mid.
    HardMix,
    /// `min(255, d² / (255 - s))` for `s != 255`, else `min(255, d²)`.
    Reflect,
    /// Reflect with source and destination swapped.
    Glow,
    /// Hue of the source with saturation and brightness of the destination.
    Hue,
    /// Saturation of the source with hue and brightness of the destination.
    Saturation,
    /// Hue and saturation of the source with brightness of the destination.
    Color,
    /// Brightness of the source with hue and saturation of the destination.
    Luminosity,
}

impl BlendMode {
    /// Every blend mode, in declaration order.
    pub const ALL: [BlendMode; 28] = [
        BlendMode::Normal,
        BlendMode::Lighten,
        BlendMode::Darken,
        BlendMode::Add,
        BlendMode::Subtract,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Negation,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Burn,
        BlendMode::ColorBurn,
        BlendMode::LinearBurn,
        BlendMode::Dodge,
        BlendMode::ColorDodge,
        BlendMode::Overlay,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::LinearLight,
        BlendMode::PinLight,
        BlendMode::VividLight,
        BlendMode::HardMix,
        BlendMode::Reflect,
        BlendMode::Glow,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    /// Stable string identifier, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Lighten => "Lighten",
            BlendMode::Darken => "Darken",
            BlendMode::Add => "Add",
            BlendMode::Subtract => "Subtract",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Negation => "Negation",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Burn => "Burn",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::LinearBurn => "LinearBurn",
            BlendMode::Dodge => "Dodge",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::Overlay => "Overlay",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::LinearLight => "LinearLight",
            BlendMode::PinLight => "PinLight",
            BlendMode::VividLight => "VividLight",
            BlendMode::HardMix => "HardMix",
            BlendMode::Reflect => "Reflect",
            BlendMode::Glow => "Glow",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }

    /// Look a mode up by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Return `true` for the HSB-space modes whose channels interact.
    pub(crate) fn is_nonseparable(self) -> bool {
        matches!(
            self,
            BlendMode::Hue | BlendMode::Saturation | BlendMode::Color | BlendMode::Luminosity
        )
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Separable channel formulas. Each takes raw source/destination channel
// values in [0, 255] and may return outside that range; the compositing
// drivers clamp once per channel.

pub(crate) fn blend_normal(s: i32, _d: i32) -> i32 {
    s
}

pub(crate) fn blend_lighten(s: i32, d: i32) -> i32 {
    s.max(d)
}

pub(crate) fn blend_darken(s: i32, d: i32) -> i32 {
    s.min(d)
}

pub(crate) fn blend_add(s: i32, d: i32) -> i32 {
    (s + d).min(255)
}

pub(crate) fn blend_subtract(s: i32, d: i32) -> i32 {
    (d - s).max(0)
}

pub(crate) fn blend_difference(s: i32, d: i32) -> i32 {
    (s - d).abs()
}

pub(crate) fn blend_exclusion(s: i32, d: i32) -> i32 {
    d + mul_div255_i32(s, 255 - 2 * d)
}

pub(crate) fn blend_negation(s: i32, d: i32) -> i32 {
    255 - (s - d).abs()
}

pub(crate) fn blend_multiply(s: i32, d: i32) -> i32 {
    mul_div255_i32(s, d)
}

pub(crate) fn blend_screen(s: i32, d: i32) -> i32 {
    255 - mul_div255_i32(255 - s, 255 - d)
}

pub(crate) fn blend_burn(s: i32, d: i32) -> i32 {
    // min(254, s) keeps the numerator non-zero so full burn stays pinned at
    // black instead of snapping to 255.
    255 - (((255 - s.min(254)) << 8) / (d + 1))
}

pub(crate) fn blend_color_burn(s: i32, d: i32) -> i32 {
    if s != 0 {
        (255 - (((255 - d) << 8) / s)).max(0)
    } else {
        d
    }
}

pub(crate) fn blend_linear_burn(s: i32, d: i32) -> i32 {
    (s + d - 255).max(0)
}

pub(crate) fn blend_dodge(s: i32, d: i32) -> i32 {
    (s << 8) / (256 - d)
}

pub(crate) fn blend_color_dodge(s: i32, d: i32) -> i32 {
    if s != 255 {
        ((d << 8) / (255 - s)).min(255)
    } else if d == 0 {
        0
    } else {
        255
    }
}

pub(crate) fn blend_overlay(s: i32, d: i32) -> i32 {
    blend_hard_light(d, s)
}

pub(crate) fn blend_hard_light(s: i32, d: i32) -> i32 {
    if s < 128 {
        2 * mul_div255_i32(s, d)
    } else {
        255 - 2 * mul_div255_i32(255 - s, 255 - d)
    }
}

pub(crate) fn blend_soft_light(s: i32, d: i32) -> i32 {
    let t = mul_div255_i32(s, d);
    t + mul_div255_i32(d, 255 - mul_div255_i32(255 - d, 255 - s) - t)
}

pub(crate) fn blend_linear_light(s: i32, d: i32) -> i32 {
    if s < 128 { 2 * s + d - 255 } else { 2 * (s - 128) + d }
}

pub(crate) fn blend_pin_light(s: i32, d: i32) -> i32 {
    if s > 127 {
        (2 * (s - 128)).max(d)
    } else {
        (2 * s).min(d)
    }
}

pub(crate) fn blend_vivid_light(s: i32, d: i32) -> i32 {
    // Doubled source never reaches 255 in either branch, so the inner
    // dodge/burn guards stay on their division paths.
    if s < 128 {
        blend_color_burn(2 * s, d)
    } else {
        blend_color_dodge(2 * (s - 128), d)
    }
}

pub(crate) fn blend_hard_mix(s: i32, d: i32) -> i32 {
    if blend_vivid_light(s, d) < 128 { 0 } else { 255 }
}

pub(crate) fn blend_reflect(s: i32, d: i32) -> i32 {
    if s != 255 {
        (d * d / (255 - s)).min(255)
    } else {
        (d * d).min(255)
    }
}

pub(crate) fn blend_glow(s: i32, d: i32) -> i32 {
    blend_reflect(d, s)
}

// Non-separable HSB-space formulas. These recombine whole pixels through
// the shared conversion pair in `hsb`.

pub(crate) fn blend_hue(s: [u8; 3], d: [u8; 3]) -> [u8; 3] {
    let sh = rgb_to_hsb(s);
    let dh = rgb_to_hsb(d);
    hsb_to_rgb([sh[0], dh[1], dh[2]])
}

pub(crate) fn blend_saturation(s: [u8; 3], d: [u8; 3]) -> [u8; 3] {
    let sh = rgb_to_hsb(s);
    let dh = rgb_to_hsb(d);
    hsb_to_rgb([dh[0], sh[1], dh[2]])
}

pub(crate) fn blend_color(s: [u8; 3], d: [u8; 3]) -> [u8; 3] {
    let sh = rgb_to_hsb(s);
    let dh = rgb_to_hsb(d);
    hsb_to_rgb([sh[0], sh[1], dh[2]])
}

pub(crate) fn blend_luminosity(s: [u8; 3], d: [u8; 3]) -> [u8; 3] {
    let sh = rgb_to_hsb(s);
    let dh = rgb_to_hsb(d);
    hsb_to_rgb([dh[0], dh[1], sh[2]])
}
