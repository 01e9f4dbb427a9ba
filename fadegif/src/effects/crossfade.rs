use image::RgbaImage;

use crate::{FadeGifError, FadeGifResult, foundation::math::lerp_u8};

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Blend two pixels: every channel, alpha included, moves linearly from `a` (t=0) to `b` (t=1).
pub fn crossfade(a: Rgba8, b: Rgba8, t: f32) -> Rgba8 {
    [
        lerp_u8(a[0], b[0], t),
        lerp_u8(a[1], b[1], t),
        lerp_u8(a[2], b[2], t),
        lerp_u8(a[3], b[3], t),
    ]
}

/// Write `crossfade(a, b, t)` for every pixel of two equal-length RGBA8 buffers into `dst`.
pub fn crossfade_into(dst: &mut [u8], a: &[u8], b: &[u8], t: f32) -> FadeGifResult<()> {
    if dst.len() != a.len() || dst.len() != b.len() || !dst.len().is_multiple_of(4) {
        return Err(FadeGifError::validation(
            "crossfade_into expects equal-length rgba8 buffers",
        ));
    }
    for ((d, a), b) in dst
        .chunks_exact_mut(4)
        .zip(a.chunks_exact(4))
        .zip(b.chunks_exact(4))
    {
        let out = crossfade([a[0], a[1], a[2], a[3]], [b[0], b[1], b[2], b[3]], t);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Blend two equally sized images into a new one.
pub fn blend_images(a: &RgbaImage, b: &RgbaImage, t: f32) -> FadeGifResult<RgbaImage> {
    if a.dimensions() != b.dimensions() {
        return Err(FadeGifError::validation(format!(
            "cannot blend {:?} with {:?}: dimensions differ",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let (width, height) = a.dimensions();
    let mut out = RgbaImage::new(width, height);
    crossfade_into(&mut out, a.as_raw(), b.as_raw(), t)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/crossfade.rs"]
mod tests;
