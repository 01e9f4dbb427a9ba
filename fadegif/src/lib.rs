//! fadegif composes a sequence of still images into a looping animated GIF, inserting
//! cross-fade frames between consecutive images.
//!
//! # Pipeline overview
//!
//! 1. **Load**: decode every input into straight-alpha RGBA8 ([`load_images`], [`decode_image`])
//! 2. **Compose**: optionally downscale ([`ResizePolicy`]), then center each image on the
//!    smallest canvas that holds all of them ([`center_all`])
//! 3. **Sequence**: lay out still and fade frames ([`plan_frames`]); `N` sources yield
//!    `N + (N - 1) * fade_frames` frames
//! 4. **Encode**: stream frames into a [`FrameSink`], usually a [`GifSink`]
//!
//! [`render_gif`] and [`render_gif_to_path`] run the whole pipeline in one call.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compose;
mod effects;
mod encode;
mod foundation;
mod pipeline;
mod sequence;

pub use assets::decode::{
    SUPPORTED_EXTENSIONS, decode_image, has_supported_extension, load_image, load_images,
};
pub use assets::source::SourceImage;
pub use compose::canvas::{canvas_for, center_all, center_on_canvas};
pub use compose::resize::{ResizePolicy, apply_resize};
pub use effects::crossfade::{Rgba8, blend_images, crossfade, crossfade_into};
pub use encode::gif_sink::{GifSink, GifSinkOpts};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig, TimedFrame, ensure_parent_dir};
pub use foundation::core::{Canvas, FrameIndex, Timing};
pub use foundation::error::{FadeGifError, FadeGifResult};
pub use pipeline::{AnimationOpts, RenderStats, render_gif, render_gif_to_path, render_to_sink};
pub use sequence::plan::{FrameContent, FramePlan, PlannedFrame, plan_frames};
