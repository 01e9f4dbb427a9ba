use image::Rgba;

use super::*;
use crate::{FrameIndex, InMemorySink};

fn solid(name: &str, w: u32, h: u32, px: [u8; 4]) -> SourceImage {
    SourceImage::from_rgba(name, RgbaImage::from_pixel(w, h, Rgba(px)))
}

fn opts(fade_frames: u32) -> AnimationOpts {
    AnimationOpts {
        timing: Timing {
            hold_ms: 400,
            fade_frames,
            fade_ms: 60,
        },
        ..AnimationOpts::default()
    }
}

#[test]
fn zero_images_is_validation_error() {
    let mut sink = InMemorySink::new();
    let err = render_to_sink(Vec::new(), &opts(3), &mut sink).unwrap_err();
    assert!(matches!(err, FadeGifError::Validation(_)));
    assert!(sink.config().is_none());
}

#[test]
fn single_image_yields_one_frame() {
    let mut sink = InMemorySink::new();
    let stats = render_to_sink(
        vec![solid("only", 3, 2, [1, 2, 3, 255])],
        &opts(10),
        &mut sink,
    )
    .unwrap();
    assert_eq!(stats.frames_total, 1);
    assert_eq!(stats.fades, 0);
    assert_eq!(sink.frames().len(), 1);
    assert_eq!(sink.frames()[0].1.delay_ms, 400);
    assert!(sink.is_finished());
}

#[test]
fn frames_cover_canvas_and_follow_formula() {
    let images = vec![
        solid("red", 4, 2, [255, 0, 0, 255]),
        solid("green", 2, 6, [0, 255, 0, 255]),
        solid("blue", 3, 3, [0, 0, 255, 255]),
    ];
    let mut sink = InMemorySink::new();
    let stats = render_to_sink(images, &opts(3), &mut sink).unwrap();

    assert_eq!(stats.canvas, Canvas::new(4, 6).unwrap());
    assert_eq!(stats.frames_total, 3 + 2 * 3);
    assert_eq!(stats.stills, 3);
    assert_eq!(stats.fades, 6);
    assert_eq!(
        sink.config(),
        Some(SinkConfig {
            canvas: stats.canvas,
            frame_count: 9
        })
    );

    for (i, (idx, frame)) in sink.frames().iter().enumerate() {
        assert_eq!(*idx, FrameIndex(i as u64));
        assert_eq!(frame.pixels.dimensions(), (4, 6));
    }
    let delays: Vec<u32> = sink.frames().iter().map(|(_, f)| f.delay_ms).collect();
    assert_eq!(delays, [400, 60, 60, 60, 400, 60, 60, 60, 400]);
}

#[test]
fn fade_frames_blend_between_neighbours() {
    let images = vec![
        solid("black", 2, 2, [0, 0, 0, 255]),
        solid("white", 2, 2, [255, 255, 255, 255]),
    ];
    let mut sink = InMemorySink::new();
    render_to_sink(images, &opts(1), &mut sink).unwrap();

    let frames = sink.frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].1.pixels.get_pixel(0, 0).0, [0, 0, 0, 255]);
    // single fade frame sits at weight 1/2
    assert_eq!(frames[1].1.pixels.get_pixel(0, 0).0, [128, 128, 128, 255]);
    assert_eq!(frames[2].1.pixels.get_pixel(1, 1).0, [255, 255, 255, 255]);
}

#[test]
fn centered_padding_fades_through_transparency() {
    let images = vec![
        solid("wide", 4, 1, [255, 0, 0, 255]),
        solid("dot", 2, 1, [0, 0, 255, 255]),
    ];
    let mut sink = InMemorySink::new();
    render_to_sink(images, &opts(1), &mut sink).unwrap();

    // pixel 0 is red in the first source and padding in the second
    let mid = sink.frames()[1].1.pixels.get_pixel(0, 0).0;
    assert_eq!(mid, [128, 0, 0, 128]);
}

#[test]
fn resize_policy_bounds_canvas() {
    let images = vec![
        solid("big", 40, 20, [9, 9, 9, 255]),
        solid("small", 5, 5, [9, 9, 9, 255]),
    ];
    let opts = AnimationOpts {
        resize: ResizePolicy::Fit {
            max_width: 10,
            max_height: 10,
        },
        ..opts(0)
    };
    let mut sink = InMemorySink::new();
    let stats = render_to_sink(images, &opts, &mut sink).unwrap();
    assert_eq!(stats.canvas, Canvas::new(10, 5).unwrap());
    assert_eq!(stats.frames_total, 2);
}

#[test]
fn dedicated_thread_pool_renders_the_same_frames() {
    let images = || {
        vec![
            solid("a", 3, 3, [200, 10, 10, 255]),
            solid("b", 3, 3, [10, 10, 200, 255]),
        ]
    };
    let mut global = InMemorySink::new();
    render_to_sink(images(), &opts(4), &mut global).unwrap();

    let pooled_opts = AnimationOpts {
        threads: Some(2),
        ..opts(4)
    };
    let mut pooled = InMemorySink::new();
    render_to_sink(images(), &pooled_opts, &mut pooled).unwrap();

    assert_eq!(global.frames().len(), pooled.frames().len());
    for ((_, a), (_, b)) in global.frames().iter().zip(pooled.frames()) {
        assert_eq!(a.pixels, b.pixels);
    }
}

#[test]
fn invalid_opts_are_rejected_before_rendering() {
    let bad = [
        AnimationOpts {
            threads: Some(0),
            ..AnimationOpts::default()
        },
        AnimationOpts {
            quantize_speed: 31,
            ..AnimationOpts::default()
        },
        AnimationOpts {
            timing: Timing {
                hold_ms: 0,
                ..Timing::default()
            },
            ..AnimationOpts::default()
        },
    ];
    for opts in bad {
        let mut sink = InMemorySink::new();
        let err = render_to_sink(vec![solid("a", 1, 1, [0, 0, 0, 255])], &opts, &mut sink)
            .unwrap_err();
        assert!(err.is_user_error(), "{err}");
    }
}

#[test]
fn render_gif_returns_decodable_bytes() {
    let images = vec![
        solid("a", 6, 4, [255, 0, 0, 255]),
        solid("b", 2, 2, [0, 255, 0, 255]),
    ];
    let bytes = render_gif(images, &opts(2)).unwrap();

    let mut dec_opts = gif::DecodeOptions::new();
    dec_opts.set_color_output(gif::ColorOutput::RGBA);
    let mut dec = dec_opts.read_info(bytes.as_slice()).unwrap();
    assert_eq!((dec.width(), dec.height()), (6, 4));
    let mut count = 0;
    while dec.read_next_frame().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 4);
}
