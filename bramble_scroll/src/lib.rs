// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Scroll: scroll targeting and animation for tile containers.
//!
//! Each container owns one [`ScrollController`], which in turn holds at most
//! one in-flight [`ScrollTarget`] — the destination and animation state of
//! the container's scroll position. Three concerns live here:
//!
//! - **Resolution** ([`target_scroll_clamped`]): given a target item's lane
//!   range and a [`ScrollMode`], compute the destination position, clamped
//!   into the container's [`ScrollBounds`] and optionally further clamped so
//!   the currently focused item stays in view. Resolution is a pure function
//!   and idempotent: applying it twice with unchanged inputs yields the same
//!   value.
//! - **Override policy** ([`OverridePolicy`]): whether a new request replaces
//!   an unfinished target. Replacing is a decision, not an automatic cancel.
//! - **Stepping** ([`ScrollController::tick`]): accelerate–decelerate
//!   interpolation over the target duration, driven by the host's frame
//!   clock (nominally 60 Hz), with a catch-up cap after dropped frames.
//!
//! The controller knows nothing about nodes beyond an opaque id `K`; the
//! layout layer resolves ids to lane ranges and discards targets whose node
//! leaves the child array.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod controller;
mod target;

pub use controller::{ScrollController, TickOutcome, target_scroll_clamped};
pub use target::{OverridePolicy, ScrollMode, ScrollTarget};

/// Default scroll animation duration, in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 360.0;

/// Nominal frame interval (~60 Hz), in milliseconds.
pub const FRAME_MS: f64 = 16.7;

/// Largest frame delta honored by [`ScrollController::tick`], as a multiple
/// of [`FRAME_MS`]. Larger gaps (a dropped frame burst, a debugger pause) are
/// clamped so the animation never teleports.
pub const MAX_CATCHUP_FRAMES: f64 = 4.0;

/// Remaining distance, in logical pixels, below which a target is considered
/// settled.
pub const SETTLE_THRESHOLD: f64 = 0.5;
