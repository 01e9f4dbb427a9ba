use image::RgbaImage;

/// A decoded input image in straight-alpha RGBA8.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Human-readable origin (file path or request slot), used in logs and errors.
    pub name: String,
    /// Decoded pixels.
    pub pixels: RgbaImage,
}

impl SourceImage {
    /// Wrap already-decoded pixels.
    pub fn from_rgba(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}
