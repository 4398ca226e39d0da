// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll target state and the policies governing its replacement.

/// How a target item is aligned within the viewport.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollMode {
    /// Center the item's lane range within the viewport.
    Center,
    /// Align the start of the lane range with the start of the viewport.
    ToStart,
    /// Align the end of the lane range with the end of the viewport.
    ToEnd,
    /// Move just enough to bring the lane range fully into view, toward the
    /// nearest edge; keep the current position when it already is.
    InBounds,
}

impl ScrollMode {
    /// Returns `true` for the modes that keep the current position when the
    /// target is already fully visible.
    #[must_use]
    pub const fn keeps_position_when_visible(self) -> bool {
        matches!(self, Self::InBounds)
    }
}

/// Decides whether a new scroll request replaces an unfinished target.
///
/// Consulted only when the in-flight target is for a different node, or for
/// the same node with an incompatible (different) mode; re-requesting the
/// same node and mode never restarts the animation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OverridePolicy {
    /// Always replace.
    Always,
    /// Replace only when the resolved destination differs.
    WhenPositionChanges,
    /// Replace when the destination differs, or when the new target would
    /// settle sooner than the remaining time of the current one.
    WhenPositionChangesOrFaster,
}

/// The in-flight destination and animation state of a container's scroll.
///
/// Created on every accepted scroll request; superseded or completed per
/// [`OverridePolicy`]. `elapsed_ms >= duration_ms` marks it finished. The
/// layout layer discards a target whose `node` leaves the child array.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollTarget<K> {
    /// The node the scroll is heading toward.
    pub node: K,
    /// Alignment mode used to resolve the destination.
    pub mode: ScrollMode,
    /// Total animation duration, in milliseconds.
    pub duration_ms: f64,
    /// Time already spent animating, in milliseconds.
    pub elapsed_ms: f64,
    /// Whether destination resolution additionally clamped to keep the
    /// focused item visible.
    pub keep_focused_visible: bool,
    /// Position when the target was created.
    pub from: f64,
    /// Resolved, clamped destination.
    pub to: f64,
}

impl<K> ScrollTarget<K> {
    /// Remaining animation time, in milliseconds.
    #[must_use]
    pub fn remaining_ms(&self) -> f64 {
        (self.duration_ms - self.elapsed_ms).max(0.0)
    }
}
