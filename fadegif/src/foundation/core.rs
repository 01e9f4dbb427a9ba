use crate::foundation::error::{FadeGifError, FadeGifResult};

/// Absolute 0-based index of a frame in the output animation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Output canvas dimensions in pixels.
///
/// Every output frame has exactly these dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> FadeGifResult<Self> {
        if width == 0 || height == 0 {
            return Err(FadeGifError::validation(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Smallest canvas that contains every `(width, height)` pair.
    pub fn covering(dims: &[(u32, u32)]) -> FadeGifResult<Self> {
        if dims.is_empty() {
            return Err(FadeGifError::validation(
                "cannot compute a canvas for zero images",
            ));
        }
        let width = dims.iter().map(|&(w, _)| w).max().unwrap_or(0);
        let height = dims.iter().map(|&(_, h)| h).max().unwrap_or(0);
        Self::new(width, height)
    }

    /// Return `true` when an image of `width x height` fits on this canvas.
    pub fn fits(self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }

    /// Top-left offset that centers a `width x height` image (floor division).
    pub fn offset_for(self, width: u32, height: u32) -> (u32, u32) {
        (
            self.width.saturating_sub(width) / 2,
            self.height.saturating_sub(height) / 2,
        )
    }

    /// Number of RGBA8 bytes needed for one frame of this canvas.
    pub fn pixel_len(self) -> FadeGifResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| FadeGifError::validation("canvas buffer size overflow"))
    }
}

/// Frame durations and transition length for one animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Duration of each still (source) frame in milliseconds.
    pub hold_ms: u32,
    /// Number of blended frames inserted between two consecutive sources.
    pub fade_frames: u32,
    /// Duration of each blended frame in milliseconds.
    pub fade_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            hold_ms: 500,
            fade_frames: 10,
            fade_ms: 100,
        }
    }
}

impl Timing {
    /// Reject timings that would produce zero-length still frames.
    pub fn validate(&self) -> FadeGifResult<()> {
        if self.hold_ms == 0 {
            return Err(FadeGifError::validation("hold duration must be > 0 ms"));
        }
        if self.fade_frames > 0 && self.fade_ms == 0 {
            return Err(FadeGifError::validation(
                "fade duration must be > 0 ms when fade frames are enabled",
            ));
        }
        Ok(())
    }

    /// Total output frames for `sources` input images: `N + (N - 1) * fade_frames`.
    pub fn frame_count(&self, sources: usize) -> u64 {
        if sources == 0 {
            return 0;
        }
        let n = sources as u64;
        n + (n - 1) * u64::from(self.fade_frames)
    }

    /// Blend weight of the `step`-th fade frame (1-based), `step / (fade_frames + 1)`.
    pub fn fade_weight(&self, step: u32) -> f32 {
        let step = step.clamp(1, self.fade_frames.max(1));
        (f64::from(step) / (f64::from(self.fade_frames) + 1.0)) as f32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
