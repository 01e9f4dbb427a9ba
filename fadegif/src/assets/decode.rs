use std::path::Path;

use anyhow::Context;

use crate::{FadeGifError, FadeGifResult, assets::source::SourceImage};

/// File extensions accepted as animation sources (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

/// Return `true` when `path` ends with one of [`SUPPORTED_EXTENSIONS`].
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Decode encoded image bytes into straight-alpha RGBA8.
///
/// Any format enabled in the `image` crate is accepted; animated inputs contribute their first
/// frame.
pub fn decode_image(name: impl Into<String>, bytes: &[u8]) -> FadeGifResult<SourceImage> {
    let name = name.into();
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| FadeGifError::decode(format!("'{name}': {e}")))?;
    let pixels = dyn_img.into_rgba8();
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(FadeGifError::decode(format!(
            "'{name}': image has no pixels"
        )));
    }
    tracing::debug!(%name, width, height, "decoded image");
    Ok(SourceImage::from_rgba(name, pixels))
}

/// Read and decode one image file.
pub fn load_image(path: &Path) -> FadeGifResult<SourceImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(path.display().to_string(), &bytes)
}

/// Load every path in order; the first failure aborts the load.
pub fn load_images<P: AsRef<Path>>(paths: &[P]) -> FadeGifResult<Vec<SourceImage>> {
    paths.iter().map(|p| load_image(p.as_ref())).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
