use super::*;

fn solid(name: &str, w: u32, h: u32) -> SourceImage {
    let pixels = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 9, 9, 255]));
    SourceImage::from_rgba(name, pixels)
}

#[test]
fn keep_is_identity() {
    assert_eq!(ResizePolicy::Keep.target_size(1234, 5), (1234, 5));
}

#[test]
fn fit_downscales_preserving_aspect() {
    let fit = ResizePolicy::Fit {
        max_width: 100,
        max_height: 100,
    };
    assert_eq!(fit.target_size(400, 100), (100, 25));
    assert_eq!(fit.target_size(50, 200), (25, 100));
    assert_eq!(fit.target_size(300, 300), (100, 100));
}

#[test]
fn fit_never_upscales_or_collapses() {
    let fit = ResizePolicy::Fit {
        max_width: 64,
        max_height: 64,
    };
    assert_eq!(fit.target_size(10, 20), (10, 20));
    assert_eq!(fit.target_size(10_000, 1), (64, 1));
}

#[test]
fn fit_rejects_empty_box() {
    let fit = ResizePolicy::Fit {
        max_width: 0,
        max_height: 10,
    };
    assert!(fit.validate().is_err());
    assert!(apply_resize(vec![solid("a", 4, 4)], fit).is_err());
}

#[test]
fn apply_resize_only_touches_oversized_images() {
    let fit = ResizePolicy::Fit {
        max_width: 8,
        max_height: 8,
    };
    let out = apply_resize(vec![solid("small", 4, 6), solid("big", 32, 16)], fit).unwrap();
    assert_eq!(out[0].dimensions(), (4, 6));
    assert_eq!(out[1].dimensions(), (8, 4));
    assert_eq!(out[1].name, "big");
}

#[test]
fn policy_serde_shape() {
    let p: ResizePolicy =
        serde_json::from_str(r#"{ "fit": { "max_width": 320, "max_height": 240 } }"#).unwrap();
    assert_eq!(
        p,
        ResizePolicy::Fit {
            max_width: 320,
            max_height: 240
        }
    );
    let k: ResizePolicy = serde_json::from_str(r#""keep""#).unwrap();
    assert_eq!(k, ResizePolicy::Keep);
}
