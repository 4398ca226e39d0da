// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Tree: the virtualized tile engine for D-pad interfaces.
//!
//! This crate ties the workspace together: a model [`Tree`] of leaf and
//! container nodes, a lazy view builder that keeps host visuals alive only
//! inside each container's build window, pooled visual reuse through
//! [`CacheRegistry`], and a focus coordinator that turns directional input
//! into focus moves and scroll animations.
//!
//! The host UI framework sits behind the [`Host`] trait: the engine decides
//! *which* nodes have live visuals, *where* they sit, and *who* holds focus,
//! while the host owns the visual instances and does the rendering. All
//! calls happen on the host's main thread; the host's frame clock drives
//! [`Tree::tick`].
//!
//! A typical frame:
//!
//! 1. input arrives: the host calls [`Tree::move_focus`] (or one of the
//!    programmatic focus entry points) and acts on the [`MoveOutcome`];
//! 2. the host's clock fires: [`Tree::tick`] steps scroll animations, runs
//!    the rebuilds that input and mutations scheduled, and releases
//!    deferred cache returns;
//! 3. the builder calls back into the host to measure, build, place, free,
//!    and (re)focus visuals as the windows shift.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod build;
mod cache;
mod host;
mod nav;
#[cfg(test)]
mod testing;
mod tree;
mod types;

pub use bramble_focus::Direction;
pub use bramble_scroll::{DEFAULT_DURATION_MS, OverridePolicy, ScrollMode};
pub use bramble_strip::{Gravity, Orientation, ScrollBounds};
pub use cache::{CacheRegistry, ViewCache};
pub use host::Host;
pub use nav::{FocusPath, MoveOutcome};
pub use tree::Tree;
pub use types::{LayoutParams, NodeFlags, NodeId, RebuildReason, SizePolicy, SizeSpec, ViewKind};

/// Minimum pause between successive scroll retriggers from held-down
/// directional input, in milliseconds.
pub const RETRIGGER_MIN_MS: f64 = 80.0;
