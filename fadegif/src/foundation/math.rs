/// Linear interpolation between two channel values, rounded to nearest.
///
/// `t` is clamped into `[0, 1]`, so `t = 0` yields `a` and `t = 1` yields `b` exactly.
pub(crate) fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let t = t.clamp(0.0, 1.0);
    let a = f32::from(a);
    let b = f32::from(b);
    (a + t * (b - a)).round().clamp(0.0, 255.0) as u8
}

/// Convert a millisecond delay into GIF centiseconds (nearest, saturating).
pub(crate) fn ms_to_centis(ms: u32) -> u16 {
    let cs = (u64::from(ms) + 5) / 10;
    u16::try_from(cs).unwrap_or(u16::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
