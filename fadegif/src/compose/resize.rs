use image::imageops::{self, FilterType};

use crate::{FadeGifError, FadeGifResult, assets::source::SourceImage};

/// How source images are scaled before they are placed on the shared canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Use every image at its native size.
    #[default]
    Keep,
    /// Downscale images that exceed the box, preserving aspect ratio. Never upscales.
    Fit {
        /// Maximum width in pixels.
        max_width: u32,
        /// Maximum height in pixels.
        max_height: u32,
    },
}

impl ResizePolicy {
    /// Reject zero-sized bounding boxes.
    pub fn validate(&self) -> FadeGifResult<()> {
        if let Self::Fit {
            max_width,
            max_height,
        } = *self
            && (max_width == 0 || max_height == 0)
        {
            return Err(FadeGifError::validation(format!(
                "fit box must be non-empty, got {max_width}x{max_height}"
            )));
        }
        Ok(())
    }

    /// Target dimensions for an image of `width x height` under this policy.
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            Self::Keep => (width, height),
            Self::Fit {
                max_width,
                max_height,
            } => {
                if width <= max_width && height <= max_height {
                    return (width, height);
                }
                let scale = (f64::from(max_width) / f64::from(width))
                    .min(f64::from(max_height) / f64::from(height));
                let w = (f64::from(width) * scale).round().max(1.0) as u32;
                let h = (f64::from(height) * scale).round().max(1.0) as u32;
                (w.min(max_width), h.min(max_height))
            }
        }
    }
}

/// Apply `policy` to every image, returning images that are already in bounds untouched.
pub fn apply_resize(
    images: Vec<SourceImage>,
    policy: ResizePolicy,
) -> FadeGifResult<Vec<SourceImage>> {
    policy.validate()?;
    Ok(images
        .into_iter()
        .map(|img| {
            let (w, h) = img.dimensions();
            let (tw, th) = policy.target_size(w, h);
            if (tw, th) == (w, h) {
                return img;
            }
            tracing::debug!(name = %img.name, from = ?(w, h), to = ?(tw, th), "resizing source");
            SourceImage {
                pixels: imageops::resize(&img.pixels, tw, th, FilterType::Lanczos3),
                name: img.name,
            }
        })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/resize.rs"]
mod tests;
