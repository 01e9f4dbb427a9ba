use crate::{FrameIndex, Timing};

/// What a single output frame shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameContent {
    /// Source image `source`, unchanged.
    Still {
        /// Index into the centered source list.
        source: usize,
    },
    /// Cross-fade from `from` to `to` at `weight` (0 = `from`, 1 = `to`).
    Fade {
        /// Outgoing source index.
        from: usize,
        /// Incoming source index.
        to: usize,
        /// Blend weight of `to`.
        weight: f32,
    },
}

/// One entry of a [`FramePlan`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedFrame {
    /// Position in the output animation.
    pub index: FrameIndex,
    /// Pixel source for the frame.
    pub content: FrameContent,
    /// Display duration in milliseconds.
    pub delay_ms: u32,
}

/// Ordered description of every output frame.
///
/// Layout: `still(0)`, then for each following source `i`: `fade_frames` fades `i-1 -> i`,
/// then `still(i)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    frames: Vec<PlannedFrame>,
}

impl FramePlan {
    /// Borrow the planned frames in output order.
    pub fn frames(&self) -> &[PlannedFrame] {
        &self.frames
    }

    /// Number of planned frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when nothing is planned.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Split the plan into the leading still and one group per transition.
    ///
    /// Each group holds the fades of one transition followed by the still it lands on.
    pub fn segments(&self) -> impl Iterator<Item = &[PlannedFrame]> {
        let mut rest = self.frames.as_slice();
        std::iter::from_fn(move || {
            if rest.is_empty() {
                return None;
            }
            let end = rest
                .iter()
                .position(|f| matches!(f.content, FrameContent::Still { .. }))
                .map_or(rest.len(), |i| i + 1);
            let (head, tail) = rest.split_at(end);
            rest = tail;
            Some(head)
        })
    }
}

/// Lay out the output frames for `sources` centered images.
pub fn plan_frames(sources: usize, timing: &Timing) -> FramePlan {
    let mut frames = Vec::with_capacity(timing.frame_count(sources) as usize);
    let mut push = |content, delay_ms| {
        let index = FrameIndex(frames.len() as u64);
        frames.push(PlannedFrame {
            index,
            content,
            delay_ms,
        });
    };

    for i in 0..sources {
        if i > 0 {
            for step in 1..=timing.fade_frames {
                push(
                    FrameContent::Fade {
                        from: i - 1,
                        to: i,
                        weight: timing.fade_weight(step),
                    },
                    timing.fade_ms,
                );
            }
        }
        push(FrameContent::Still { source: i }, timing.hold_ms);
    }

    FramePlan { frames }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/plan.rs"]
mod tests;
