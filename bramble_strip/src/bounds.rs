// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll clamping bounds with overscroll and tail-growth allowances.

/// The closed interval a container's scroll position is clamped into.
///
/// The base interval is `[0, content - viewport]` (collapsed to `[0, 0]` when
/// content fits). Two allowances widen it:
///
/// - *overscroll* lets the position run past both edges by a fixed amount,
///   for hosts that render an edge-glow or bounce affordance;
/// - *extra tail* extends only the max edge, for "unfinished" lists that are
///   still loading items past the current end.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct ScrollBounds {
    /// Minimum allowed scroll position.
    pub min: f64,
    /// Maximum allowed scroll position.
    pub max: f64,
}

impl ScrollBounds {
    /// Bounds for the given content and viewport extents.
    #[must_use]
    pub fn for_content(content_extent: f64, viewport_extent: f64) -> Self {
        let max = (content_extent - viewport_extent).max(0.0);
        Self { min: 0.0, max }
    }

    /// Widens both edges by a non-negative overscroll allowance.
    #[must_use]
    pub fn with_overscroll(self, allowance: f64) -> Self {
        let allowance = allowance.max(0.0);
        Self {
            min: self.min - allowance,
            max: self.max + allowance,
        }
    }

    /// Extends only the max edge, for lists that are still growing.
    #[must_use]
    pub fn with_extra_tail(self, extra: f64) -> Self {
        Self {
            min: self.min,
            max: self.max + extra.max(0.0),
        }
    }

    /// Clamps `position` into the interval.
    #[must_use]
    pub fn clamp(self, position: f64) -> f64 {
        debug_assert!(self.min <= self.max, "inverted scroll bounds");
        position.max(self.min).min(self.max)
    }

    /// Returns `true` if `position` already lies within the interval.
    #[must_use]
    pub fn contains(self, position: f64) -> bool {
        position >= self.min && position <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::ScrollBounds;

    #[test]
    fn base_interval_collapses_when_content_fits() {
        let bounds = ScrollBounds::for_content(100.0, 350.0);
        assert_eq!(bounds, ScrollBounds { min: 0.0, max: 0.0 });
        assert_eq!(bounds.clamp(40.0), 0.0);
    }

    #[test]
    fn clamp_is_idempotent() {
        let bounds = ScrollBounds::for_content(1000.0, 350.0)
            .with_overscroll(20.0)
            .with_extra_tail(50.0);
        let once = bounds.clamp(5000.0);
        assert_eq!(once, 720.0);
        assert_eq!(bounds.clamp(once), once);
        assert_eq!(bounds.clamp(-100.0), -20.0);
    }

    #[test]
    fn allowances_ignore_negative_inputs() {
        let bounds = ScrollBounds::for_content(500.0, 100.0)
            .with_overscroll(-10.0)
            .with_extra_tail(-10.0);
        assert_eq!(bounds, ScrollBounds { min: 0.0, max: 400.0 });
        assert!(bounds.contains(400.0));
        assert!(!bounds.contains(400.1));
    }
}
