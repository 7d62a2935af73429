/// Clamp an intermediate blend result into the 8-bit channel range.
#[inline]
pub(crate) fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Exact `round(x * y / 255)` for operands in `[0, 255]`.
///
/// 255 is odd, so `x*y/255` never lands exactly on one half and the rounding
/// is unambiguous. Verified against the full 256x256 table in tests.
#[inline]
pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Signed `round(x * y / 255)` for blend formulas whose factor can go
/// negative (e.g. Exclusion's `255 - 2d`).
#[inline]
pub(crate) fn mul_div255_i32(x: i32, y: i32) -> i32 {
    let p = x * y;
    if p >= 0 { (p + 127) / 255 } else { -((-p + 127) / 255) }
}
