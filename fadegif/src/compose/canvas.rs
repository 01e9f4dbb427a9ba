use image::RgbaImage;

use crate::{Canvas, FadeGifError, FadeGifResult, assets::source::SourceImage};

/// Smallest canvas that holds every image.
pub fn canvas_for(images: &[SourceImage]) -> FadeGifResult<Canvas> {
    let dims: Vec<(u32, u32)> = images.iter().map(SourceImage::dimensions).collect();
    Canvas::covering(&dims)
}

/// Place `image` centered on a fully transparent canvas.
///
/// Source pixels are copied verbatim; the area outside the image stays `(0, 0, 0, 0)`.
pub fn center_on_canvas(image: &SourceImage, canvas: Canvas) -> FadeGifResult<RgbaImage> {
    let (w, h) = image.dimensions();
    if !canvas.fits(w, h) {
        return Err(FadeGifError::validation(format!(
            "image '{}' ({w}x{h}) does not fit canvas {}x{}",
            image.name, canvas.width, canvas.height
        )));
    }
    if (w, h) == (canvas.width, canvas.height) {
        return Ok(image.pixels.clone());
    }

    let (x0, y0) = canvas.offset_for(w, h);
    let mut out = RgbaImage::new(canvas.width, canvas.height);
    let row_bytes = (w as usize) * 4;
    let src = image.pixels.as_raw();
    let dst_stride = (canvas.width as usize) * 4;
    let dst: &mut [u8] = &mut out;
    for y in 0..h as usize {
        let s = y * row_bytes;
        let d = (y0 as usize + y) * dst_stride + (x0 as usize) * 4;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
    Ok(out)
}

/// Compute the shared canvas and center every image on it, preserving order.
pub fn center_all(images: &[SourceImage]) -> FadeGifResult<(Canvas, Vec<RgbaImage>)> {
    let canvas = canvas_for(images)?;
    let centered = images
        .iter()
        .map(|img| center_on_canvas(img, canvas))
        .collect::<FadeGifResult<Vec<_>>>()?;
    Ok((canvas, centered))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/canvas.rs"]
mod tests;
