// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the model tree: identifiers, flags, size policies,
//! container layout parameters.

use bramble_scroll::ScrollMode;
use bramble_strip::{Gravity, Orientation};

/// Identifier for a node in the tree (generational).
///
/// Ids are small, copyable handles; the arena owns the nodes. A stale id
/// (freed slot, old generation) is simply never alive again — parent
/// back-references therefore can never keep a node alive or form a cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and focusability.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (laid out and a focus-search candidate).
        const VISIBLE = 0b0000_0001;
        /// Node can receive focus.
        const FOCUSABLE = 0b0000_0010;
        /// Node is guaranteed focusable: the builder keeps expanding the
        /// build window until a lane containing such a node is included on
        /// each side, so edge-of-window searches always find a neighbor.
        const ALWAYS_FOCUSABLE = 0b0000_0110;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::ALWAYS_FOCUSABLE
    }
}

/// Per-axis size policy, resolved against the available extent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SizePolicy {
    /// Exactly this many logical pixels.
    Fixed(f64),
    /// Fill the available extent.
    Fill,
    /// Measure the node's visual once and reuse the result ("wrap").
    ///
    /// Resolution requires a synchronous host measure pass on first use; the
    /// result is cached on the node.
    MeasureOnce,
}

/// Size policies for both axes, in (width, height) order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SizeSpec {
    /// Horizontal policy.
    pub width: SizePolicy,
    /// Vertical policy.
    pub height: SizePolicy,
}

impl SizeSpec {
    /// Fixed size on both axes.
    #[must_use]
    pub const fn fixed(width: f64, height: f64) -> Self {
        Self {
            width: SizePolicy::Fixed(width),
            height: SizePolicy::Fixed(height),
        }
    }

    /// Fill the available space on both axes.
    #[must_use]
    pub const fn fill() -> Self {
        Self {
            width: SizePolicy::Fill,
            height: SizePolicy::Fill,
        }
    }
}

/// Kind tag for cache-eligible visuals.
///
/// Visuals of the same kind are interchangeable as far as pooling is
/// concerned; the host decides the granularity (for example, one kind per
/// tile template). The host manages symbol values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewKind(pub u64);

/// Layout parameters of a container node.
#[derive(Clone, Debug)]
pub struct LayoutParams {
    /// Stacking direction of the scroll axis.
    pub orientation: Orientation,
    /// Lane count; 1 is a simple list, more makes a grid.
    pub division: usize,
    /// Gap between lane-rows and between lanes, in logical pixels.
    pub spacing: f64,
    /// Padding at the container's edges, in logical pixels.
    pub padding: f64,
    /// Cross-axis placement of children smaller than their lane.
    pub gravity: Gravity,
    /// Disables virtualization: every child gets a live visual.
    pub build_all_children: bool,
    /// Number of off-window visuals kept alive (nearest first) before the
    /// furthest are evicted. `None` destroys everything outside the window.
    pub max_cached_offscreen_views: Option<usize>,
    /// Alignment used when a focus move scrolls the new target into view.
    pub focus_scroll_mode: ScrollMode,
    /// Overscroll allowance past both scroll edges.
    pub overscroll: f64,
    /// Extra scroll affordance past the end, for lists still growing.
    pub extra_tail_scroll: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            division: 1,
            spacing: 0.0,
            padding: 0.0,
            gravity: Gravity::Start,
            build_all_children: false,
            max_cached_offscreen_views: None,
            focus_scroll_mode: ScrollMode::InBounds,
            overscroll: 0.0,
            extra_tail_scroll: 0.0,
        }
    }
}

/// Why a rebuild was requested. Coalesced requests keep the first reason.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RebuildReason {
    /// First build after the container got a viewport.
    Initial,
    /// The child array was replaced.
    ChildrenChanged,
    /// The container's viewport changed.
    Resize,
    /// Scroll position moved (animation step or jump).
    Scroll,
    /// Explicit host request.
    Requested,
}

#[cfg(test)]
mod tests {
    use super::{NodeFlags, SizePolicy, SizeSpec};

    #[test]
    fn always_focusable_implies_focusable() {
        assert!(NodeFlags::ALWAYS_FOCUSABLE.contains(NodeFlags::FOCUSABLE));
        assert!(NodeFlags::default().contains(NodeFlags::VISIBLE | NodeFlags::FOCUSABLE));
    }

    #[test]
    fn size_spec_constructors() {
        let fixed = SizeSpec::fixed(100.0, 50.0);
        assert_eq!(fixed.width, SizePolicy::Fixed(100.0));
        assert_eq!(fixed.height, SizePolicy::Fixed(50.0));
        assert_eq!(SizeSpec::fill().width, SizePolicy::Fill);
    }
}
