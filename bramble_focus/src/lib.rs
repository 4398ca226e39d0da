// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Focus: geometric directional focus search.
//!
//! This crate answers "where does focus go when the user presses a D-pad
//! direction" purely from rectangles. It is stateless: callers assemble a
//! [`FocusSpace`] from whatever nodes are currently built and visible, and
//! the search functions score every candidate against the focused rectangle.
//!
//! Three operations cover the engine's needs:
//!
//! - [`find_next_focus`]: the directional search. Candidates behind the
//!   requested direction, or not meaningfully past the focused rectangle,
//!   are rejected; the survivor with the lowest lexicographically-weighted
//!   cost wins (minimal directional travel, then minimal off-center bias,
//!   then minimal absolute offset). Ties keep the first-found candidate, so
//!   the caller's traversal order is the stable tiebreak.
//! - [`find_focus_from_rect`]: maximum-intersection recovery, used when a
//!   focused node is destroyed and focus must land on a geometrically
//!   sensible substitute.
//! - [`FixedNeighbors`]: explicit id-based manual wiring, consulted by the
//!   coordinator before any geometric search.
//!
//! Geometry is expressed as [`kurbo::Rect`] in a single caller-chosen
//! coordinate space; all entries within a [`FocusSpace`] must share it.
//!
//! ## Minimal example
//!
//! ```rust
//! use bramble_focus::{Direction, FocusEntry, FocusSpace, find_next_focus};
//! use kurbo::Rect;
//!
//! let entries = vec![
//!     FocusEntry { id: 1_u32, rect: Rect::new(0.0, 0.0, 100.0, 100.0) },
//!     FocusEntry { id: 2_u32, rect: Rect::new(110.0, 0.0, 210.0, 100.0) },
//! ];
//! let space = FocusSpace { nodes: &entries };
//!
//! let focused = Rect::new(0.0, 0.0, 100.0, 100.0);
//! let next = find_next_focus(&space, focused, Direction::Right, Some(1), false);
//! assert_eq!(next, Some(2));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod neighbors;
mod search;

pub use neighbors::FixedNeighbors;
pub use search::{find_focus_from_rect, find_next_focus};

use kurbo::Rect;

/// A D-pad navigation direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward negative x.
    Left,
    /// Toward positive x.
    Right,
    /// Toward negative y.
    Up,
    /// Toward positive y.
    Down,
}

impl Direction {
    /// Returns `true` for [`Direction::Left`] and [`Direction::Right`].
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Returns `true` for the directions that advance child order
    /// ([`Direction::Right`] and [`Direction::Down`]).
    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::Right | Self::Down)
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// A single focusable candidate within a [`FocusSpace`].
///
/// Callers are responsible for filtering: only currently-built, visible,
/// non-zero-size focusable nodes belong in a space.
#[derive(Clone, Debug)]
pub struct FocusEntry<K> {
    /// Identifier for this focusable node.
    pub id: K,
    /// Bounds in the coordinate space of the surrounding [`FocusSpace`].
    pub rect: Rect,
}

/// A read-only snapshot of focusable candidates.
#[derive(Clone, Debug)]
pub struct FocusSpace<'a, K> {
    /// Candidates, in the caller's traversal order (the stable tiebreak).
    pub nodes: &'a [FocusEntry<K>],
}
