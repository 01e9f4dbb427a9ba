use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;
use rayon::prelude::*;

use crate::{
    assets::decode::load_images,
    assets::source::SourceImage,
    compose::canvas::center_all,
    compose::resize::{ResizePolicy, apply_resize},
    effects::crossfade::blend_images,
    encode::gif_sink::{GifSink, GifSinkOpts},
    encode::sink::{FrameSink, SinkConfig, TimedFrame, ensure_parent_dir},
    foundation::core::{Canvas, Timing},
    foundation::error::{FadeGifError, FadeGifResult},
    sequence::plan::{FrameContent, PlannedFrame, plan_frames},
};

/// Everything that shapes one animation besides its source images.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationOpts {
    /// Frame durations and fade length.
    pub timing: Timing,
    /// Optional downscaling applied before centering.
    pub resize: ResizePolicy,
    /// GIF palette quantizer speed (`1..=30`).
    pub quantize_speed: i32,
    /// Worker threads for blending and quantizing; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for AnimationOpts {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            resize: ResizePolicy::Keep,
            quantize_speed: GifSinkOpts::default().quantize_speed,
            threads: None,
        }
    }
}

impl AnimationOpts {
    /// Validate every option before any pixels are touched.
    pub fn validate(&self) -> FadeGifResult<()> {
        self.timing.validate()?;
        self.resize.validate()?;
        self.gif_opts().validate()?;
        if self.threads == Some(0) {
            return Err(FadeGifError::validation("'threads' must be >= 1 when set"));
        }
        Ok(())
    }

    fn gif_opts(&self) -> GifSinkOpts {
        GifSinkOpts {
            quantize_speed: self.quantize_speed,
        }
    }
}

/// Summary of one render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStats {
    /// Shared dimensions of every output frame.
    pub canvas: Canvas,
    /// Frames pushed to the sink.
    pub frames_total: u64,
    /// Unchanged source frames.
    pub stills: u64,
    /// Blended transition frames.
    pub fades: u64,
}

/// Resize, center, blend and push every frame of the animation into `sink`.
///
/// Frames are produced one transition at a time, so at most `fade_frames + 1` composed frames
/// are alive at once besides the centered sources.
#[tracing::instrument(skip_all, fields(sources = images.len()))]
pub fn render_to_sink(
    images: Vec<SourceImage>,
    opts: &AnimationOpts,
    sink: &mut dyn FrameSink,
) -> FadeGifResult<RenderStats> {
    opts.validate()?;
    if images.is_empty() {
        return Err(FadeGifError::validation("at least one image is required"));
    }

    match opts.threads {
        None => render_segments(images, opts, sink),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| anyhow::anyhow!("build rayon thread pool: {e}"))?;
            pool.install(|| render_segments(images, opts, sink))
        }
    }
}

fn render_segments(
    images: Vec<SourceImage>,
    opts: &AnimationOpts,
    sink: &mut dyn FrameSink,
) -> FadeGifResult<RenderStats> {
    let images = apply_resize(images, opts.resize)?;
    let (canvas, centered) = center_all(&images)?;
    drop(images);

    let plan = plan_frames(centered.len(), &opts.timing);
    tracing::debug!(
        width = canvas.width,
        height = canvas.height,
        frames = plan.len(),
        "composed canvas"
    );

    sink.begin(SinkConfig {
        canvas,
        frame_count: plan.len() as u64,
    })?;

    let mut stats = RenderStats {
        canvas,
        frames_total: 0,
        stills: 0,
        fades: 0,
    };
    for segment in plan.segments() {
        let frames = segment
            .par_iter()
            .map(|planned| compose_frame(planned, &centered))
            .collect::<FadeGifResult<Vec<_>>>()?;
        sink.push_frames(segment[0].index, &frames)?;

        for planned in segment {
            match planned.content {
                FrameContent::Still { .. } => stats.stills += 1,
                FrameContent::Fade { .. } => stats.fades += 1,
            }
        }
        stats.frames_total += segment.len() as u64;
    }
    sink.end()?;

    Ok(stats)
}

fn compose_frame(planned: &PlannedFrame, centered: &[RgbaImage]) -> FadeGifResult<TimedFrame> {
    let source = |i: usize| {
        centered
            .get(i)
            .ok_or_else(|| FadeGifError::validation(format!("no frame source {i}")))
    };
    let pixels = match planned.content {
        FrameContent::Still { source: i } => source(i)?.clone(),
        FrameContent::Fade { from, to, weight } => {
            blend_images(source(from)?, source(to)?, weight)?
        }
    };
    Ok(TimedFrame {
        pixels,
        delay_ms: planned.delay_ms,
    })
}

/// Render decoded images into GIF bytes held in memory.
pub fn render_gif(images: Vec<SourceImage>, opts: &AnimationOpts) -> FadeGifResult<Vec<u8>> {
    let mut sink = GifSink::new(Vec::new(), opts.gif_opts());
    let stats = render_to_sink(images, opts, &mut sink)?;
    let bytes = sink.into_inner()?;
    tracing::info!(
        frames = stats.frames_total,
        width = stats.canvas.width,
        height = stats.canvas.height,
        bytes = bytes.len(),
        "encoded gif"
    );
    Ok(bytes)
}

/// Load image files, render them and write the GIF to `out_path`.
///
/// The parent directory of `out_path` is created when missing; an existing file is replaced.
#[tracing::instrument(skip(paths, opts), fields(out = %out_path.display()))]
pub fn render_gif_to_path<P: AsRef<Path>>(
    paths: &[P],
    out_path: &Path,
    opts: &AnimationOpts,
) -> FadeGifResult<RenderStats> {
    opts.validate()?;
    let images = load_images(paths)?;
    ensure_parent_dir(out_path)?;

    let file = File::create(out_path)
        .with_context(|| format!("create output '{}'", out_path.display()))?;
    let mut sink = GifSink::new(BufWriter::new(file), opts.gif_opts());
    let stats = render_to_sink(images, opts, &mut sink)?;
    let mut writer = sink.into_inner()?;
    writer
        .flush()
        .with_context(|| format!("flush output '{}'", out_path.display()))?;

    tracing::info!(
        frames = stats.frames_total,
        width = stats.canvas.width,
        height = stats.canvas.height,
        "gif saved to {}",
        out_path.display()
    );
    Ok(stats)
}

#[cfg(test)]
#[path = "../tests/unit/pipeline/pipeline.rs"]
mod tests;
