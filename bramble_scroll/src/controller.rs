// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-container scroll state: one position, at most one in-flight target.

use bramble_strip::ScrollBounds;

use crate::{
    FRAME_MS, MAX_CATCHUP_FRAMES, OverridePolicy, SETTLE_THRESHOLD, ScrollMode, ScrollTarget,
};

/// Resolves the destination for scrolling a lane range into view.
///
/// `range` is the target item's `[start, end]` span along the scroll axis.
/// The result is clamped into `bounds`; with `keep_visible` set, it is
/// further clamped so the given (focused) span is not pushed out of the
/// viewport. Pure and idempotent.
#[must_use]
pub fn target_scroll_clamped(
    range: (f64, f64),
    mode: ScrollMode,
    current: f64,
    viewport: f64,
    bounds: ScrollBounds,
    keep_visible: Option<(f64, f64)>,
) -> f64 {
    let (start, end) = range;
    let fully_visible = start >= current && end <= current + viewport;

    let raw = if mode.keeps_position_when_visible() && fully_visible {
        current
    } else {
        match mode {
            ScrollMode::Center => (start + end) / 2.0 - viewport / 2.0,
            ScrollMode::ToStart => start,
            ScrollMode::ToEnd => end - viewport,
            ScrollMode::InBounds => {
                if start < current {
                    // Target is before the viewport: align its start.
                    start
                } else {
                    // Target is past the viewport: align its end.
                    end - viewport
                }
            }
        }
    };

    let clamped = bounds.clamp(raw);
    match keep_visible {
        None => clamped,
        Some((keep_start, keep_end)) => {
            // Position must stay within [keep_end - viewport, keep_start] for
            // the kept span to remain visible. When the span is larger than
            // the viewport the interval inverts; favor its start edge.
            clamped.min(keep_start).max(keep_end - viewport).min(keep_start)
        }
    }
}

/// Result of one animation step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    /// The position changed this step.
    pub moved: bool,
    /// The target completed this step and was cleared.
    pub finished: bool,
}

/// Owns a container's scroll position and its single in-flight target.
///
/// The layout layer resolves node ids to lane ranges, computes destinations
/// with [`target_scroll_clamped`], and feeds them in through
/// [`ScrollController::request`]. The host's frame clock drives
/// [`ScrollController::tick`].
#[derive(Clone, Debug)]
pub struct ScrollController<K> {
    position: f64,
    bounds: ScrollBounds,
    target: Option<ScrollTarget<K>>,
}

impl<K: Copy + Eq> Default for ScrollController<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq> ScrollController<K> {
    /// Creates a controller at position zero with collapsed bounds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: 0.0,
            bounds: ScrollBounds::default(),
            target: None,
        }
    }

    /// Current scroll position.
    #[must_use]
    pub const fn position(&self) -> f64 {
        self.position
    }

    /// Sets the position directly, without clamping or animation.
    ///
    /// Used by the layout pass when it clamps scroll itself; does not touch
    /// any in-flight target.
    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    /// Current clamping bounds.
    #[must_use]
    pub const fn bounds(&self) -> ScrollBounds {
        self.bounds
    }

    /// Replaces the clamping bounds (content or viewport changed).
    pub fn set_bounds(&mut self, bounds: ScrollBounds) {
        self.bounds = bounds;
    }

    /// The in-flight target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&ScrollTarget<K>> {
        self.target.as_ref()
    }

    /// Returns `true` while an animation is in flight.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    /// Requests a scroll toward `node` with a pre-resolved destination `to`.
    ///
    /// Non-smooth requests jump immediately and clear any target. Smooth
    /// requests create a target, except that an unfinished target for the
    /// same node and mode is left untouched (its timing is preserved) and a
    /// conflicting target is only replaced when `policy` allows it.
    ///
    /// Returns `true` when the position or target changed.
    pub fn request(
        &mut self,
        node: K,
        mode: ScrollMode,
        to: f64,
        smooth: bool,
        policy: OverridePolicy,
        keep_focused_visible: bool,
        duration_ms: f64,
    ) -> bool {
        let to = self.bounds.clamp(to);

        if !smooth {
            let moved = to != self.position;
            self.position = to;
            self.target = None;
            return moved;
        }

        if let Some(current) = &self.target {
            let compatible = current.node == node && current.mode == mode;
            if compatible && current.to == to {
                // Same destination already in flight: keep its timing.
                return false;
            }
            let replace = match policy {
                OverridePolicy::Always => true,
                OverridePolicy::WhenPositionChanges => to != current.to,
                OverridePolicy::WhenPositionChangesOrFaster => {
                    to != current.to || duration_ms < current.remaining_ms()
                }
            };
            if !replace {
                return false;
            }
        }

        if to == self.position {
            // Already there; nothing to animate, but dropping an in-flight
            // target headed elsewhere still counts as a change.
            return self.target.take().is_some();
        }

        self.target = Some(ScrollTarget {
            node,
            mode,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
            keep_focused_visible,
            from: self.position,
            to,
        });
        true
    }

    /// Drops the in-flight target, freezing the position where it is.
    pub fn stop(&mut self) {
        self.target = None;
    }

    /// Updates the in-flight destination after a layout pass moved it.
    ///
    /// Rebuilds can shift lane offsets under an unfinished animation; the
    /// animation keeps its timing and eases toward the corrected position.
    pub fn retarget(&mut self, to: f64) {
        if let Some(target) = &mut self.target {
            target.to = self.bounds.clamp(to);
        }
    }

    /// Drops the target when its node no longer satisfies `still_present`.
    ///
    /// A target must always reference a node still in the child array; the
    /// layout pass calls this after every children replacement.
    pub fn discard_stale_target<F: FnMut(K) -> bool>(&mut self, mut still_present: F) {
        if let Some(target) = &self.target {
            if !still_present(target.node) {
                self.target = None;
            }
        }
    }

    /// Advances the animation by `dt_ms` milliseconds.
    ///
    /// Frame deltas are clamped to [`MAX_CATCHUP_FRAMES`] nominal frames. A
    /// target finishes when its elapsed time plus half a frame reaches the
    /// duration, or when the remaining distance drops below
    /// [`SETTLE_THRESHOLD`]; finishing snaps the position onto the
    /// destination exactly.
    pub fn tick(&mut self, dt_ms: f64) -> TickOutcome {
        let Some(target) = &mut self.target else {
            return TickOutcome {
                moved: false,
                finished: false,
            };
        };

        let dt = dt_ms.max(0.0).min(FRAME_MS * MAX_CATCHUP_FRAMES);
        target.elapsed_ms += dt;

        let done = target.elapsed_ms + FRAME_MS / 2.0 >= target.duration_ms;
        let new_position = if done {
            target.to
        } else {
            let t = (target.elapsed_ms / target.duration_ms).clamp(0.0, 1.0);
            target.from + (target.to - target.from) * ease_in_out(t)
        };

        let settled = done || (target.to - new_position).abs() < SETTLE_THRESHOLD;
        let moved = new_position != self.position;
        self.position = if settled { target.to } else { new_position };
        if settled {
            self.target = None;
        }
        TickOutcome {
            moved,
            finished: settled,
        }
    }
}

/// Accelerate–decelerate interpolation over `t` in `[0, 1]`.
fn ease_in_out(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use bramble_strip::ScrollBounds;

    use super::{ScrollController, TickOutcome, ease_in_out, target_scroll_clamped};
    use crate::{DEFAULT_DURATION_MS, FRAME_MS, OverridePolicy, ScrollMode};

    fn bounds_1000_350() -> ScrollBounds {
        ScrollBounds::for_content(1000.0, 350.0)
    }

    #[test]
    fn default_controller_starts_at_rest() {
        let controller = ScrollController::<u32>::default();
        assert_eq!(controller.position(), 0.0);
        assert!(!controller.is_animating());
    }

    #[test]
    fn resolution_modes_behave() {
        let bounds = bounds_1000_350();
        // Item spanning 500..600 in a 350 viewport.
        let range = (500.0, 600.0);

        assert_eq!(
            target_scroll_clamped(range, ScrollMode::ToStart, 0.0, 350.0, bounds, None),
            500.0
        );
        assert_eq!(
            target_scroll_clamped(range, ScrollMode::ToEnd, 0.0, 350.0, bounds, None),
            250.0
        );
        assert_eq!(
            target_scroll_clamped(range, ScrollMode::Center, 0.0, 350.0, bounds, None),
            375.0
        );
        // InBounds from before: align end; from after: align start.
        assert_eq!(
            target_scroll_clamped(range, ScrollMode::InBounds, 0.0, 350.0, bounds, None),
            250.0
        );
        assert_eq!(
            target_scroll_clamped(range, ScrollMode::InBounds, 640.0, 350.0, bounds, None),
            500.0
        );
        // InBounds with the item already fully visible keeps the position.
        assert_eq!(
            target_scroll_clamped(range, ScrollMode::InBounds, 490.0, 350.0, bounds, None),
            490.0
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let bounds = bounds_1000_350();
        let range = (900.0, 1000.0);
        let once = target_scroll_clamped(range, ScrollMode::Center, 0.0, 350.0, bounds, None);
        let twice = target_scroll_clamped(range, ScrollMode::Center, once, 350.0, bounds, None);
        assert_eq!(once, twice);
        assert_eq!(once, 650.0); // clamped to max available scroll
    }

    #[test]
    fn keep_visible_clamps_around_the_focused_span() {
        let bounds = bounds_1000_350();
        // Scrolling toward the tail would push the focused item (at 0..100)
        // out of view; the keep-visible clamp holds the position at its start.
        let to = target_scroll_clamped(
            (600.0, 700.0),
            ScrollMode::ToStart,
            0.0,
            350.0,
            bounds,
            Some((0.0, 100.0)),
        );
        assert_eq!(to, 0.0);
    }

    #[test]
    fn five_steps_right_keep_trailing_edge_visible() {
        // Ten 100 px tiles in a 350 px viewport, InBounds mode: stepping
        // focus tile by tile scrolls by the minimum needed to keep each
        // focused tile's trailing edge visible. Tile 5 spans 500..600, so the
        // final position is exactly 600 - 350.
        let bounds = ScrollBounds::for_content(1000.0, 350.0);
        let mut current = 0.0;
        for index in 1..=5_usize {
            let start = index as f64 * 100.0;
            let range = (start, start + 100.0);
            current = target_scroll_clamped(
                range,
                ScrollMode::InBounds,
                current,
                350.0,
                bounds,
                None,
            );
        }
        assert_eq!(current, 250.0);
    }

    #[test]
    fn non_smooth_requests_jump() {
        let mut controller = ScrollController::new();
        controller.set_bounds(bounds_1000_350());
        assert!(controller.request(
            3_u32,
            ScrollMode::ToStart,
            200.0,
            false,
            OverridePolicy::Always,
            false,
            DEFAULT_DURATION_MS,
        ));
        assert_eq!(controller.position(), 200.0);
        assert!(!controller.is_animating());
    }

    #[test]
    fn same_node_and_mode_keeps_original_timing() {
        let mut controller = ScrollController::new();
        controller.set_bounds(bounds_1000_350());
        controller.request(
            3_u32,
            ScrollMode::Center,
            300.0,
            true,
            OverridePolicy::WhenPositionChanges,
            false,
            DEFAULT_DURATION_MS,
        );
        controller.tick(100.0);
        let elapsed_before = controller.target().expect("target in flight").elapsed_ms;

        // Re-requesting the same node/mode/destination must not restart.
        let changed = controller.request(
            3_u32,
            ScrollMode::Center,
            300.0,
            true,
            OverridePolicy::WhenPositionChanges,
            false,
            DEFAULT_DURATION_MS,
        );
        assert!(!changed);
        assert_eq!(
            controller.target().expect("target kept").elapsed_ms,
            elapsed_before
        );
    }

    #[test]
    fn always_policy_replaces_and_when_position_changes_does_not() {
        let mut controller = ScrollController::<u32>::new();
        controller.set_bounds(bounds_1000_350());
        controller.request(
            3,
            ScrollMode::ToStart,
            300.0,
            true,
            OverridePolicy::Always,
            false,
            DEFAULT_DURATION_MS,
        );

        // Different node, same destination: WhenPositionChanges keeps it.
        let changed = controller.request(
            4,
            ScrollMode::ToStart,
            300.0,
            true,
            OverridePolicy::WhenPositionChanges,
            false,
            DEFAULT_DURATION_MS,
        );
        assert!(!changed);
        assert_eq!(controller.target().expect("original target").node, 3);

        // Always replaces even at the same destination.
        assert!(controller.request(
            4,
            ScrollMode::ToStart,
            300.0,
            true,
            OverridePolicy::Always,
            false,
            DEFAULT_DURATION_MS,
        ));
        assert_eq!(controller.target().expect("replaced target").node, 4);
    }

    #[test]
    fn faster_policy_replaces_on_shorter_remaining_time() {
        let mut controller = ScrollController::<u32>::new();
        controller.set_bounds(bounds_1000_350());
        controller.request(
            3,
            ScrollMode::ToStart,
            300.0,
            true,
            OverridePolicy::Always,
            false,
            DEFAULT_DURATION_MS,
        );

        // Same destination but a much shorter duration: replaced.
        assert!(controller.request(
            4,
            ScrollMode::ToStart,
            300.0,
            true,
            OverridePolicy::WhenPositionChangesOrFaster,
            false,
            100.0,
        ));
        assert_eq!(controller.target().expect("faster target").node, 4);
    }

    #[test]
    fn animation_settles_on_the_destination() {
        let mut controller = ScrollController::<u32>::new();
        controller.set_bounds(bounds_1000_350());
        controller.request(
            5,
            ScrollMode::ToStart,
            400.0,
            true,
            OverridePolicy::Always,
            false,
            DEFAULT_DURATION_MS,
        );

        let mut finished = false;
        let mut last = controller.position();
        for _ in 0..60 {
            let outcome = controller.tick(FRAME_MS);
            // Monotonic approach: never overshoots past the destination.
            assert!(controller.position() >= last - 1e-9);
            assert!(controller.position() <= 400.0 + 1e-9);
            last = controller.position();
            if outcome.finished {
                finished = true;
                break;
            }
        }
        assert!(finished, "animation should settle within 60 frames");
        assert_eq!(controller.position(), 400.0);
        assert!(!controller.is_animating());
    }

    #[test]
    fn dropped_frames_are_clamped_to_catchup_cap() {
        let mut controller = ScrollController::<u32>::new();
        controller.set_bounds(bounds_1000_350());
        controller.request(
            5,
            ScrollMode::ToStart,
            400.0,
            true,
            OverridePolicy::Always,
            false,
            DEFAULT_DURATION_MS,
        );

        // A one-second gap advances at most MAX_CATCHUP_FRAMES frames.
        controller.tick(1000.0);
        let target = controller.target().expect("still animating");
        assert!(target.elapsed_ms <= FRAME_MS * crate::MAX_CATCHUP_FRAMES + 1e-9);
    }

    #[test]
    fn stale_targets_are_discarded() {
        let mut controller = ScrollController::<u32>::new();
        controller.set_bounds(bounds_1000_350());
        controller.request(
            7,
            ScrollMode::Center,
            300.0,
            true,
            OverridePolicy::Always,
            false,
            DEFAULT_DURATION_MS,
        );
        controller.discard_stale_target(|node| node != 7);
        assert!(!controller.is_animating());
        assert_eq!(
            controller.tick(FRAME_MS),
            TickOutcome {
                moved: false,
                finished: false,
            }
        );
    }

    #[test]
    fn easing_accelerates_then_decelerates() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-12);
        // First quarter covers less ground than the second.
        let q1 = ease_in_out(0.25);
        let q2 = ease_in_out(0.5) - ease_in_out(0.25);
        assert!(q1 < q2);
    }
}
