use super::*;

fn timing(fade_frames: u32) -> Timing {
    Timing {
        hold_ms: 500,
        fade_frames,
        fade_ms: 80,
    }
}

#[test]
fn empty_plan_for_no_sources() {
    let plan = plan_frames(0, &timing(10));
    assert!(plan.is_empty());
    assert_eq!(plan.segments().count(), 0);
}

#[test]
fn single_source_is_one_still() {
    let plan = plan_frames(1, &timing(10));
    assert_eq!(plan.len(), 1);
    assert_eq!(
        plan.frames()[0],
        PlannedFrame {
            index: FrameIndex(0),
            content: FrameContent::Still { source: 0 },
            delay_ms: 500,
        }
    );
}

#[test]
fn plan_length_matches_frame_count() {
    for n in 0..5 {
        for fades in [0, 1, 3, 10] {
            let t = timing(fades);
            assert_eq!(plan_frames(n, &t).len() as u64, t.frame_count(n));
        }
    }
}

#[test]
fn plan_order_and_delays() {
    let plan = plan_frames(3, &timing(2));
    let kinds: Vec<String> = plan
        .frames()
        .iter()
        .map(|f| match f.content {
            FrameContent::Still { source } => format!("S{source}"),
            FrameContent::Fade { from, to, .. } => format!("F{from}{to}"),
        })
        .collect();
    assert_eq!(kinds, ["S0", "F01", "F01", "S1", "F12", "F12", "S2"]);

    for (i, f) in plan.frames().iter().enumerate() {
        assert_eq!(f.index, FrameIndex(i as u64));
        let expected = match f.content {
            FrameContent::Still { .. } => 500,
            FrameContent::Fade { .. } => 80,
        };
        assert_eq!(f.delay_ms, expected);
    }
}

#[test]
fn fade_weights_increase_strictly_inside_unit_interval() {
    let plan = plan_frames(2, &timing(4));
    let weights: Vec<f32> = plan
        .frames()
        .iter()
        .filter_map(|f| match f.content {
            FrameContent::Fade { weight, .. } => Some(weight),
            FrameContent::Still { .. } => None,
        })
        .collect();
    assert_eq!(weights.len(), 4);
    assert!((weights[0] - 0.2).abs() < 1e-6);
    assert!((weights[3] - 0.8).abs() < 1e-6);
    assert!(weights.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn segments_group_fades_with_landing_still() {
    let plan = plan_frames(3, &timing(2));
    let lens: Vec<usize> = plan.segments().map(<[PlannedFrame]>::len).collect();
    assert_eq!(lens, [1, 3, 3]);
    for seg in plan.segments() {
        assert!(matches!(
            seg.last().map(|f| f.content),
            Some(FrameContent::Still { .. })
        ));
    }
}
