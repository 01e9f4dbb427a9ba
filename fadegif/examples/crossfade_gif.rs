use std::path::PathBuf;

use fadegif::{AnimationOpts, SourceImage, Timing, render_gif};
use image::{Rgba, RgbaImage};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let colors = [[230, 57, 70, 255], [241, 250, 238, 255], [29, 53, 87, 255]];
    let images = colors
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let size = 64 + 32 * i as u32;
            let pixels = RgbaImage::from_pixel(size, size, Rgba(c));
            SourceImage::from_rgba(format!("swatch{i}"), pixels)
        })
        .collect();

    let opts = AnimationOpts {
        timing: Timing {
            hold_ms: 700,
            fade_frames: 12,
            fade_ms: 40,
        },
        ..AnimationOpts::default()
    };
    let bytes = render_gif(images, &opts)?;

    let out = PathBuf::from("target").join("examples").join("crossfade.gif");
    fadegif::ensure_parent_dir(&out)?;
    std::fs::write(&out, bytes)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}
