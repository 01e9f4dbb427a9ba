use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use fadegif::{AnimationOpts, ResizePolicy, Timing};

const DEFAULT_FADE_FRAMES: u32 = 10;
const DEFAULT_FADE_MS: u32 = 100;

#[derive(Parser, Debug)]
#[command(
    after_help = "Trailing numbers after the images are read as [FADE_FRAMES] [FADE_MS], \
                  e.g. `fadegif make out.gif 500 a.png b.png 12 80`."
)]
pub(crate) struct MakeArgs {
    /// Output GIF path.
    pub(crate) output: PathBuf,

    /// Duration of each source image in milliseconds.
    pub(crate) hold_ms: u32,

    /// Input images, optionally followed by FADE_FRAMES and FADE_MS.
    #[arg(required = true, num_args = 1..)]
    pub(crate) inputs: Vec<String>,

    /// Blended frames per transition (overrides a trailing number).
    #[arg(long)]
    pub(crate) fade_frames: Option<u32>,

    /// Duration of each blended frame in milliseconds (overrides a trailing number).
    #[arg(long)]
    pub(crate) fade_ms: Option<u32>,

    /// Downscale images to fit WIDTHxHEIGHT before centering.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_fit)]
    pub(crate) fit: Option<ResizePolicy>,

    /// Palette quantizer speed, 1 (best) to 30 (fastest).
    #[arg(long, default_value_t = 10)]
    pub(crate) quantize_speed: i32,

    /// Override rayon worker threads.
    #[arg(long)]
    pub(crate) threads: Option<usize>,
}

/// Positional inputs split into image files and the optional trailing fade settings.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PositionalInputs {
    pub(crate) files: Vec<PathBuf>,
    pub(crate) fade_frames: Option<u32>,
    pub(crate) fade_ms: Option<u32>,
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(s: &str, what: &str) -> anyhow::Result<u32> {
    s.parse()
        .with_context(|| format!("{what} '{s}' is out of range"))
}

/// Split `<img>... [fade_frames] [fade_ms]`.
///
/// Two trailing numbers are `fade_frames fade_ms`; a single trailing number is `fade_frames`.
pub(crate) fn split_positional(inputs: &[String]) -> anyhow::Result<PositionalInputs> {
    let mut out = PositionalInputs::default();
    let rest = match inputs {
        [rest @ .., frames, ms] if is_number(frames) && is_number(ms) => {
            out.fade_frames = Some(parse_number(frames, "fade frames")?);
            out.fade_ms = Some(parse_number(ms, "fade duration")?);
            rest
        }
        [rest @ .., frames] if is_number(frames) => {
            out.fade_frames = Some(parse_number(frames, "fade frames")?);
            rest
        }
        all => all,
    };
    out.files = rest.iter().map(PathBuf::from).collect();
    Ok(out)
}

/// Keep inputs with a supported image extension, warning about the rest.
pub(crate) fn filter_supported(files: Vec<PathBuf>) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|p| {
            let ok = fadegif::has_supported_extension(p);
            if !ok {
                tracing::warn!(path = %p.display(), "skipping input with unsupported extension");
            }
            ok
        })
        .collect()
}

pub(crate) fn parse_fit(s: &str) -> Result<ResizePolicy, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let max_width: u32 = w
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{w}': {e}"))?;
    let max_height: u32 = h
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{h}': {e}"))?;
    if max_width == 0 || max_height == 0 {
        return Err(format!("fit box must be non-empty, got '{s}'"));
    }
    Ok(ResizePolicy::Fit {
        max_width,
        max_height,
    })
}

/// Resolve CLI arguments into the image list and animation options.
pub(crate) fn resolve(args: &MakeArgs) -> anyhow::Result<(Vec<PathBuf>, AnimationOpts)> {
    let positional = split_positional(&args.inputs)?;
    let files = filter_supported(positional.files);
    if files.is_empty() {
        bail!("No valid image files provided.");
    }

    let timing = Timing {
        hold_ms: args.hold_ms,
        fade_frames: args
            .fade_frames
            .or(positional.fade_frames)
            .unwrap_or(DEFAULT_FADE_FRAMES),
        fade_ms: args.fade_ms.or(positional.fade_ms).unwrap_or(DEFAULT_FADE_MS),
    };
    let opts = AnimationOpts {
        timing,
        resize: args.fit.unwrap_or_default(),
        quantize_speed: args.quantize_speed,
        threads: args.threads,
    };
    opts.validate()?;
    Ok((files, opts))
}

pub(crate) fn cmd_make(args: MakeArgs) -> anyhow::Result<()> {
    let (files, opts) = resolve(&args)?;
    tracing::debug!(inputs = files.len(), ?opts, "resolved make arguments");

    let stats = fadegif::render_gif_to_path(&files, &args.output, &opts)
        .with_context(|| format!("render '{}'", args.output.display()))?;
    tracing::debug!(?stats, "render finished");

    eprintln!("wrote {}", args.output.display());
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/make.rs"]
mod tests;
