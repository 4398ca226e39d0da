// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cumulative lane-row offsets for a fixed-division grid.

use alloc::vec::Vec;

/// Cumulative offsets for the lane-rows of a fixed-division grid.
///
/// A strip stores `row_count() + 1` boundaries: `boundaries[i]` is the start
/// offset of row `i` and the final boundary is the total content extent. Row
/// spacing is folded into the boundaries, so `row_start(i + 1)` already sits
/// one spacing past `row_end(i)`.
///
/// Rebuilding is the only mutation: the owning layout pass recomputes row
/// extents (max over the lanes of each row) and calls [`LaneStrip::rebuild`].
/// Queries never allocate.
#[derive(Clone, Debug)]
pub struct LaneStrip {
    boundaries: Vec<f64>,
    spacing: f64,
    division: usize,
}

impl Default for LaneStrip {
    fn default() -> Self {
        Self::new(1)
    }
}

impl LaneStrip {
    /// Creates an empty strip with the given lane count.
    ///
    /// A `division` of zero is treated as one lane.
    #[must_use]
    pub fn new(division: usize) -> Self {
        debug_assert!(division > 0, "lane division must be at least 1");
        let mut boundaries = Vec::new();
        boundaries.push(0.0);
        Self {
            boundaries,
            spacing: 0.0,
            division: division.max(1),
        }
    }

    /// Returns the lane count.
    #[must_use]
    pub const fn division(&self) -> usize {
        self.division
    }

    /// Sets the lane count without touching the boundaries.
    ///
    /// Callers are expected to [`LaneStrip::rebuild`] afterwards; index/row
    /// mappings are undefined against stale boundaries.
    pub fn set_division(&mut self, division: usize) {
        debug_assert!(division > 0, "lane division must be at least 1");
        self.division = division.max(1);
    }

    /// Rebuilds the boundaries from per-row extents and inter-row spacing.
    ///
    /// Negative extents are clamped to zero. Extents are expected to be
    /// finite; NaNs are caught by a debug assertion.
    pub fn rebuild<I>(&mut self, row_extents: I, spacing: f64)
    where
        I: IntoIterator<Item = f64>,
    {
        self.spacing = spacing.max(0.0);
        self.boundaries.clear();
        self.boundaries.push(0.0);

        let mut cursor = 0.0;
        let mut first = true;
        for extent in row_extents {
            debug_assert!(extent.is_finite(), "row extents must be finite; got {extent:?}");
            if !first {
                cursor += self.spacing;
                self.boundaries.push(cursor);
            }
            first = false;
            cursor += extent.max(0.0);
        }
        if first {
            // No rows at all: a single zero boundary marks the empty strip.
            self.boundaries.clear();
            self.boundaries.push(0.0);
        } else {
            self.boundaries.push(cursor);
        }
    }

    /// Number of lane-rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    /// Returns `true` if the strip has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Total extent of the strip, spacing included.
    #[must_use]
    pub fn total_extent(&self) -> f64 {
        self.boundaries.last().copied().unwrap_or(0.0)
    }

    /// Row containing the given child index.
    #[must_use]
    pub const fn row_of_index(&self, index: usize) -> usize {
        index / self.division
    }

    /// Lane (cross-axis slot) of the given child index within its row.
    #[must_use]
    pub const fn lane_of_index(&self, index: usize) -> usize {
        index % self.division
    }

    /// First child index of the given row.
    #[must_use]
    pub const fn first_index_of_row(&self, row: usize) -> usize {
        row * self.division
    }

    /// Inclusive child-index range of the given row, clipped to `child_count`.
    ///
    /// Returns `None` for rows past the populated range.
    #[must_use]
    pub fn index_range_of_row(&self, row: usize, child_count: usize) -> Option<(usize, usize)> {
        let lo = self.first_index_of_row(row);
        if lo >= child_count {
            return None;
        }
        let hi = (lo + self.division - 1).min(child_count - 1);
        Some((lo, hi))
    }

    /// Start offset of the given row.
    ///
    /// Rows past the end report the total extent.
    #[must_use]
    pub fn row_start(&self, row: usize) -> f64 {
        let i = row.min(self.boundaries.len() - 1);
        self.boundaries[i]
    }

    /// End offset of the given row (start of its spacing gap, if any).
    #[must_use]
    pub fn row_end(&self, row: usize) -> f64 {
        let rows = self.row_count();
        if row + 1 >= rows {
            return self.total_extent();
        }
        self.boundaries[row + 1] - self.spacing
    }

    /// Extent of the given row, spacing excluded.
    #[must_use]
    pub fn row_extent(&self, row: usize) -> f64 {
        (self.row_end(row) - self.row_start(row)).max(0.0)
    }

    /// Row whose span contains `offset`, clamped into the populated range.
    ///
    /// Returns `None` when the strip is empty.
    #[must_use]
    pub fn row_at_offset(&self, offset: f64) -> Option<usize> {
        let rows = self.row_count();
        if rows == 0 {
            return None;
        }
        if offset <= 0.0 {
            return Some(0);
        }
        // Binary search over row starts; the candidate is the last row whose
        // start is at or before the offset.
        let starts = &self.boundaries[..rows];
        let mut lo = 0_usize;
        let mut hi = rows;
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            if starts[mid] <= offset {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(lo)
    }

    /// Inclusive row range intersecting the coordinate range `[min, max]`.
    ///
    /// Returns `None` when the strip is empty or the range is inverted.
    #[must_use]
    pub fn rows_in_range(&self, min: f64, max: f64) -> Option<(usize, usize)> {
        if max < min {
            return None;
        }
        let lo = self.row_at_offset(min)?;
        let mut hi = self.row_at_offset(max)?;
        // `row_at_offset` picks the row *starting* at or before `max`; trim
        // back when that row begins past the queried range.
        while hi > lo && self.row_start(hi) > max {
            hi -= 1;
        }
        // Skip a leading row that ends before the range begins (offset fell
        // into its trailing spacing gap).
        let lo = if lo < hi && self.row_end(lo) < min {
            lo + 1
        } else {
            lo
        };
        Some((lo, hi))
    }
}
