use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use image::{Rgba, RgbaImage};
use serde_json::json;
use sha2::Digest as _;

#[derive(Clone, Debug)]
struct BenchArgs {
    width: u32,
    height: u32,
    images: u32,
    hold_ms: u32,
    fade_frames: u32,
    fade_ms: u32,
    quantize_speed: i32,
    warmup: u32,
    repeats: u32,
    threads: Option<usize>,
    out: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
struct RunMetrics {
    compose_total: Duration,
    encode_total: Duration,
    gif_bytes: usize,
    digest: String,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.width == 0 || args.height == 0 {
        anyhow::bail!("--width/--height must be > 0");
    }
    if args.images < 2 {
        anyhow::bail!("--images must be >= 2");
    }
    if let Some(n) = args.threads
        && n == 0
    {
        anyhow::bail!("--threads must be >= 1 when set");
    }

    let opts = fadegif::AnimationOpts {
        timing: fadegif::Timing {
            hold_ms: args.hold_ms,
            fade_frames: args.fade_frames,
            fade_ms: args.fade_ms,
        },
        resize: fadegif::ResizePolicy::Keep,
        quantize_speed: args.quantize_speed,
        threads: args.threads,
    };
    opts.validate()?;

    let sources = synthetic_sources(&args);
    eprintln!(
        "sources: {} x {}x{} ({} frames per run)",
        sources.len(),
        args.width,
        args.height,
        opts.timing.frame_count(sources.len())
    );

    for i in 0..args.warmup {
        run_once(&sources, &opts).with_context(|| format!("warmup run {i}"))?;
    }

    let mut runs = Vec::with_capacity(args.repeats as usize);
    let mut last_gif = Vec::new();
    for run_idx in 0..args.repeats {
        let (m, gif) = run_once(&sources, &opts).with_context(|| format!("run {run_idx}"))?;
        eprintln!(
            "run {run_idx:03}: compose={co:.3}s encode={en:.3}s bytes={b} sha256={d}",
            co = m.compose_total.as_secs_f64(),
            en = m.encode_total.as_secs_f64(),
            b = m.gif_bytes,
            d = &m.digest[..16],
        );
        runs.push(m);
        last_gif = gif;
    }

    let deterministic = runs.windows(2).all(|w| w[0].digest == w[1].digest);
    if !deterministic {
        eprintln!("warning: output digest differs between runs");
    }
    report_percentiles(&runs);

    if let Some(out) = &args.out {
        std::fs::write(out, &last_gif).with_context(|| format!("write '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }

    let summary = json!({
        "width": args.width,
        "height": args.height,
        "images": args.images,
        "frames": opts.timing.frame_count(sources.len()),
        "repeats": args.repeats,
        "deterministic": deterministic,
        "sha256": runs.last().map(|m| m.digest.clone()),
    });
    println!("{summary}");
    Ok(())
}

/// Gradient sources of slightly different sizes so centering is exercised.
fn synthetic_sources(args: &BenchArgs) -> Vec<fadegif::SourceImage> {
    (0..args.images)
        .map(|i| {
            let w = args.width.saturating_sub(i * 8).max(1);
            let h = args.height.saturating_sub(i * 6).max(1);
            let img = RgbaImage::from_fn(w, h, |x, y| {
                let r = (x * 255 / w.max(1)) as u8;
                let g = (y * 255 / h.max(1)) as u8;
                let b = (i * 73 % 256) as u8;
                Rgba([r, g, b, 255])
            });
            fadegif::SourceImage::from_rgba(format!("synthetic_{i}"), img)
        })
        .collect()
}

fn run_once(
    sources: &[fadegif::SourceImage],
    opts: &fadegif::AnimationOpts,
) -> anyhow::Result<(RunMetrics, Vec<u8>)> {
    let mut m = RunMetrics::default();

    let t0 = Instant::now();
    let mut mem = fadegif::InMemorySink::new();
    fadegif::render_to_sink(sources.to_vec(), opts, &mut mem)?;
    m.compose_total = t0.elapsed();

    let t1 = Instant::now();
    let gif = fadegif::render_gif(sources.to_vec(), opts)?;
    m.encode_total = t1.elapsed().saturating_sub(m.compose_total);

    m.gif_bytes = gif.len();
    m.digest = sha256_hex(&gif);
    Ok((m, gif))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn parse_args() -> anyhow::Result<BenchArgs> {
    let mut args = std::env::args().skip(1);

    let mut out = BenchArgs {
        width: 640,
        height: 360,
        images: 3,
        hold_ms: 500,
        fade_frames: 10,
        fade_ms: 100,
        quantize_speed: 10,
        warmup: 1,
        repeats: 10,
        threads: None,
        out: None,
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--width" => out.width = parse_u32(args.next(), "--width")?,
            "--height" => out.height = parse_u32(args.next(), "--height")?,
            "--images" => out.images = parse_u32(args.next(), "--images")?,
            "--hold-ms" => out.hold_ms = parse_u32(args.next(), "--hold-ms")?,
            "--fade-frames" => out.fade_frames = parse_u32(args.next(), "--fade-frames")?,
            "--fade-ms" => out.fade_ms = parse_u32(args.next(), "--fade-ms")?,
            "--quantize-speed" => {
                out.quantize_speed = parse_u32(args.next(), "--quantize-speed")? as i32
            }
            "--warmup" => out.warmup = parse_u32(args.next(), "--warmup")?,
            "--repeats" => out.repeats = parse_u32(args.next(), "--repeats")?,
            "--threads" => out.threads = Some(parse_usize(args.next(), "--threads")?),
            "--out" => {
                out.out = Some(PathBuf::from(args.next().ok_or_else(|| {
                    anyhow::anyhow!("missing value for --out (expected a path)")
                })?))
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => anyhow::bail!("unknown arg '{a}' (try --help)"),
        }
    }

    Ok(out)
}

fn print_help() {
    eprintln!(
        r#"fadegif-bench

Renders a synthetic cross-fade GIF repeatedly and reports p50/p90/p99 per stage.

Usage:
  cargo run -q --release
  cargo run -q --release -- --repeats 20 --images 3 --fade-frames 10
  cargo run -q --release -- --threads 2 --out target/bench.gif

Args:
  --width N           (default 640)
  --height N          (default 360)
  --images N          (default 3; >= 2)
  --hold-ms N         (default 500)
  --fade-frames N     (default 10)
  --fade-ms N         (default 100)
  --quantize-speed N  (default 10; 1..=30)
  --warmup N          (default 1)
  --repeats N         (default 10)
  --threads N         rayon worker threads (default auto)
  --out PATH          write the last GIF to PATH
"#
    );
}

fn parse_u32(v: Option<String>, flag: &str) -> anyhow::Result<u32> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<u32>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

fn parse_usize(v: Option<String>, flag: &str) -> anyhow::Result<usize> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<usize>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

fn report_percentiles(runs: &[RunMetrics]) {
    type Getter = fn(&RunMetrics) -> Duration;
    type Field = (&'static str, Getter);

    fn collect(runs: &[RunMetrics], f: Getter) -> Vec<Duration> {
        let mut v = runs.iter().map(f).collect::<Vec<_>>();
        v.sort_by_key(|d| d.as_nanos());
        v
    }

    fn p(v: &[Duration], p: f64) -> Duration {
        if v.is_empty() {
            return Duration::ZERO;
        }
        let n = v.len();
        let rank = (p * (n as f64)).ceil().clamp(1.0, n as f64) as usize;
        v[rank - 1]
    }

    fn fmt_ms(d: Duration) -> String {
        format!("{:.3}ms", d.as_secs_f64() * 1000.0)
    }

    let fields: &[Field] = &[
        ("compose_total", |m| m.compose_total),
        ("encode_total", |m| m.encode_total),
    ];

    eprintln!("\npercentiles across runs (p50/p90/p99):");
    for (name, getter) in fields {
        let v = collect(runs, *getter);
        eprintln!(
            "  {name:14} p50={p50:>10}  p90={p90:>10}  p99={p99:>10}",
            p50 = fmt_ms(p(&v, 0.50)),
            p90 = fmt_ms(p(&v, 0.90)),
            p99 = fmt_ms(p(&v, 0.99)),
        );
    }
}
