use std::io::Write;

use gif::{DisposalMethod, Encoder, Repeat};
use rayon::prelude::*;

use crate::{
    encode::sink::{FrameSink, SinkConfig, TimedFrame},
    foundation::core::FrameIndex,
    foundation::error::{FadeGifError, FadeGifResult},
    foundation::math::ms_to_centis,
};

/// Options for [`GifSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GifSinkOpts {
    /// NeuQuant sampling speed, `1` (best palette) to `30` (fastest).
    pub quantize_speed: i32,
}

impl Default for GifSinkOpts {
    fn default() -> Self {
        Self { quantize_speed: 10 }
    }
}

impl GifSinkOpts {
    /// Reject speeds outside the range the quantizer accepts.
    pub fn validate(&self) -> FadeGifResult<()> {
        if !(1..=30).contains(&self.quantize_speed) {
            return Err(FadeGifError::validation(format!(
                "quantize speed must be in 1..=30, got {}",
                self.quantize_speed
            )));
        }
        Ok(())
    }
}

/// Sink that encodes frames as an infinitely looping animated GIF.
///
/// Each frame carries its own adaptive palette (no dithering), fully transparent pixels map to
/// the frame's transparent index, and every frame is disposed to background before the next.
pub struct GifSink<W: Write> {
    opts: GifSinkOpts,
    writer: Option<W>,
    encoder: Option<Encoder<W>>,
    cfg: Option<SinkConfig>,
    next_idx: u64,
}

impl<W: Write> GifSink<W> {
    /// Create a sink that writes into `writer` once started.
    pub fn new(writer: W, opts: GifSinkOpts) -> Self {
        Self {
            opts,
            writer: Some(writer),
            encoder: None,
            cfg: None,
            next_idx: 0,
        }
    }

    /// Finish the stream (if still open) and hand back the underlying writer.
    pub fn into_inner(mut self) -> FadeGifResult<W> {
        if let Some(encoder) = self.encoder.take() {
            return encoder
                .into_inner()
                .map_err(|e| FadeGifError::encode(format!("finish gif stream: {e}")));
        }
        self.writer
            .take()
            .ok_or_else(|| FadeGifError::encode("gif sink writer already consumed"))
    }

    fn check_frame(&mut self, idx: FrameIndex, frame: &TimedFrame) -> FadeGifResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| FadeGifError::encode("gif sink not started"))?;
        if idx.0 != self.next_idx {
            return Err(FadeGifError::encode(format!(
                "frames must be pushed in order: expected {}, got {}",
                self.next_idx, idx.0
            )));
        }
        if frame.pixels.dimensions() != (cfg.canvas.width, cfg.canvas.height) {
            return Err(FadeGifError::encode(format!(
                "frame {} is {:?}, expected canvas {}x{}",
                idx.0,
                frame.pixels.dimensions(),
                cfg.canvas.width,
                cfg.canvas.height
            )));
        }
        self.next_idx += 1;
        Ok(())
    }

    fn write(&mut self, frame: &gif::Frame<'_>) -> FadeGifResult<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| FadeGifError::encode("gif sink not started"))?;
        encoder.write_frame(frame)?;
        Ok(())
    }
}

fn gif_dimension(axis: &str, value: u32) -> FadeGifResult<u16> {
    u16::try_from(value).map_err(|_| {
        FadeGifError::validation(format!("gif {axis} {value} exceeds {}", u16::MAX))
    })
}

impl<W: Write + Send> FrameSink for GifSink<W> {
    fn begin(&mut self, cfg: SinkConfig) -> FadeGifResult<()> {
        self.opts.validate()?;
        let width = gif_dimension("width", cfg.canvas.width)?;
        let height = gif_dimension("height", cfg.canvas.height)?;

        let writer = self
            .writer
            .take()
            .ok_or_else(|| FadeGifError::encode("gif sink already started"))?;
        let mut encoder = Encoder::new(writer, width, height, &[])?;
        encoder.set_repeat(Repeat::Infinite)?;

        tracing::debug!(
            width,
            height,
            frames = cfg.frame_count,
            "gif stream started"
        );
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.next_idx = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &TimedFrame) -> FadeGifResult<()> {
        self.check_frame(idx, frame)?;
        let out = quantize(frame, self.opts.quantize_speed);
        self.write(&out)
    }

    fn push_frames(&mut self, start: FrameIndex, frames: &[TimedFrame]) -> FadeGifResult<()> {
        for (i, frame) in frames.iter().enumerate() {
            self.check_frame(FrameIndex(start.0 + i as u64), frame)?;
        }
        let speed = self.opts.quantize_speed;
        let quantized: Vec<gif::Frame<'static>> =
            frames.par_iter().map(|f| quantize(f, speed)).collect();
        for out in &quantized {
            self.write(out)?;
        }
        Ok(())
    }

    fn end(&mut self) -> FadeGifResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| FadeGifError::encode("gif sink not started"))?;
        if self.next_idx != cfg.frame_count {
            return Err(FadeGifError::encode(format!(
                "gif sink expected {} frames, received {}",
                cfg.frame_count, self.next_idx
            )));
        }
        if let Some(encoder) = self.encoder.take() {
            let writer = encoder
                .into_inner()
                .map_err(|e| FadeGifError::encode(format!("finish gif stream: {e}")))?;
            self.writer = Some(writer);
        }
        Ok(())
    }
}

/// Palettize one frame; dimensions are checked against the canvas before this is called.
fn quantize(frame: &TimedFrame, speed: i32) -> gif::Frame<'static> {
    let (width, height) = frame.pixels.dimensions();
    let mut rgba = frame.pixels.as_raw().clone();
    let mut out = gif::Frame::from_rgba_speed(width as u16, height as u16, &mut rgba, speed);
    out.delay = ms_to_centis(frame.delay_ms);
    out.dispose = DisposalMethod::Background;
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif_sink.rs"]
mod tests;
