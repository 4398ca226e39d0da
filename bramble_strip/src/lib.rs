// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Strip: 1D lane/extent math for virtualized tile layouts.
//!
//! This crate provides the coordinate backbone shared by the Bramble engine:
//!
//! - [`LaneStrip`]: cumulative offsets for the lane-rows of a fixed-division
//!   grid (division 1 = simple list), with range and offset queries.
//! - [`ScrollBounds`]: the clamping interval for a container's scroll
//!   position, including overscroll and tail-growth allowances.
//! - [`Orientation`] and [`Gravity`]: the axis and cross-axis placement
//!   vocabulary used by higher layers.
//!
//! All extents and offsets live in a caller-chosen 1D coordinate space
//! (typically logical pixels along the container's scroll axis) and are
//! expected to be finite and non-negative.
//!
//! A *lane-row* is one row of a horizontal-stacking grid or one column of a
//! vertical-stacking grid: the unit the scroll axis advances over. Child
//! indices map onto lane-rows by integer division with the container's lane
//! count.
//!
//! ## Minimal example
//!
//! ```rust
//! use bramble_strip::LaneStrip;
//!
//! // Three rows of 100 px with 10 px spacing, two lanes per row.
//! let mut strip = LaneStrip::new(2);
//! strip.rebuild([100.0, 100.0, 100.0], 10.0);
//!
//! assert_eq!(strip.row_count(), 3);
//! assert_eq!(strip.row_of_index(3), 1);
//! assert_eq!(strip.row_start(1), 110.0);
//! assert_eq!(strip.total_extent(), 320.0);
//!
//! // Which rows intersect the coordinate range 50..=150?
//! assert_eq!(strip.rows_in_range(50.0, 150.0), Some((0, 1)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod strip;

pub use bounds::ScrollBounds;
pub use strip::LaneStrip;

/// Stacking direction of a container's scroll axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Children advance left-to-right; the scroll axis is horizontal.
    #[default]
    Horizontal,
    /// Children advance top-to-bottom; the scroll axis is vertical.
    Vertical,
}

impl Orientation {
    /// Returns `true` for [`Orientation::Horizontal`].
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal)
    }
}

/// Cross-axis placement of a child inside its lane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Gravity {
    /// Align with the start (top/left) edge of the lane.
    #[default]
    Start,
    /// Center within the lane.
    Center,
    /// Align with the end (bottom/right) edge of the lane.
    End,
}

impl Gravity {
    /// Distributes `leftover` cross-axis space before a child.
    ///
    /// Negative leftover (child larger than its lane) always places at the
    /// start so the child's origin stays inside the lane.
    #[must_use]
    pub fn offset(self, leftover: f64) -> f64 {
        if leftover <= 0.0 {
            return 0.0;
        }
        match self {
            Self::Start => 0.0,
            Self::Center => leftover / 2.0,
            Self::End => leftover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Gravity, Orientation};

    #[test]
    fn gravity_distributes_leftover_space() {
        assert_eq!(Gravity::Start.offset(10.0), 0.0);
        assert_eq!(Gravity::Center.offset(10.0), 5.0);
        assert_eq!(Gravity::End.offset(10.0), 10.0);
        // Oversized children pin to the start.
        assert_eq!(Gravity::Center.offset(-4.0), 0.0);
    }

    #[test]
    fn orientation_axis_queries() {
        assert!(Orientation::Horizontal.is_horizontal());
        assert!(!Orientation::Vertical.is_horizontal());
    }
}
