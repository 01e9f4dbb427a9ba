use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;

use crate::{Canvas, FadeGifError, FadeGifResult, FrameIndex};

/// A composed output frame in straight-alpha RGBA8, tagged with its display duration.
#[derive(Clone, Debug)]
pub struct TimedFrame {
    /// Canvas-sized pixels.
    pub pixels: RgbaImage,
    /// Display duration in milliseconds.
    pub delay_ms: u32,
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Dimensions shared by every frame.
    pub canvas: Canvas,
    /// Number of frames that will be pushed.
    pub frame_count: u64,
}

/// Consumer of composed frames.
///
/// Ordering contract: frames arrive in strictly increasing [`FrameIndex`] order, starting at 0.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> FadeGifResult<()>;

    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &TimedFrame) -> FadeGifResult<()>;

    /// Push consecutive frames starting at `start`.
    fn push_frames(&mut self, start: FrameIndex, frames: &[TimedFrame]) -> FadeGifResult<()> {
        for (i, frame) in frames.iter().enumerate() {
            self.push_frame(FrameIndex(start.0 + i as u64), frame)?;
        }
        Ok(())
    }

    /// Called once after the last frame.
    fn end(&mut self) -> FadeGifResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, TimedFrame)>,
    finished: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, TimedFrame)] {
        &self.frames
    }

    /// Whether `end` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> FadeGifResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &TimedFrame) -> FadeGifResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| FadeGifError::encode("in-memory sink not started"))?;
        if frame.pixels.dimensions() != (cfg.canvas.width, cfg.canvas.height) {
            return Err(FadeGifError::encode(format!(
                "frame {} is {:?}, expected canvas {}x{}",
                idx.0,
                frame.pixels.dimensions(),
                cfg.canvas.width,
                cfg.canvas.height
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> FadeGifResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> FadeGifResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create output directory '{}'", parent.display())
        })?;
    }
    Ok(())
}
