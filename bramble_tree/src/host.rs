// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host-framework boundary.

use kurbo::Rect;

use crate::types::NodeId;

/// The engine's window onto the host UI framework.
///
/// The engine owns the model tree and decides *which* nodes have live
/// visuals, *where* they sit, and *who* holds focus; the host owns the
/// visual instances themselves and performs the actual rendering, measuring,
/// and input-focus bookkeeping. All calls happen on the host's main thread.
///
/// Visual lifecycle: [`Host::build_visual`] creates an instance;
/// [`Host::pre_free`] always runs before teardown; [`Host::post_free`]
/// consumes the instance *unless* the node is cache-eligible, in which case
/// the instance returns to its [`ViewCache`](crate::ViewCache) (deferred by
/// one tick) instead.
pub trait Host {
    /// The host-framework-backed counterpart of one live node.
    type Visual;

    /// Synchronously measures a measure-once node against the available
    /// extents, returning `(width, height)`.
    fn measure(&mut self, node: NodeId, avail_width: f64, avail_height: f64) -> (f64, f64);

    /// Creates the visual for `node` at the given resolved size.
    fn build_visual(&mut self, node: NodeId, width: f64, height: f64) -> Self::Visual;

    /// Positions a live visual within its parent container.
    fn place_visual(&mut self, node: NodeId, visual: &mut Self::Visual, frame: Rect);

    /// Asks the host to give input focus to `node`'s visual.
    fn grant_focus(&mut self, node: NodeId, visual: &mut Self::Visual);

    /// Asks the host to drop input focus from `node`'s visual.
    ///
    /// Used as a defensive clear before re-requesting focus on a target the
    /// host reports as already focused (a known host-framework quirk).
    fn clear_focus(&mut self, node: NodeId, visual: &mut Self::Visual) {
        let _ = (node, visual);
    }

    /// A visual holding focus is about to be destroyed.
    ///
    /// Return `true` when the host redirected focus itself; the engine then
    /// skips its own focus-continuity recovery.
    fn before_focus_lost(&mut self, node: NodeId) -> bool {
        let _ = node;
        false
    }

    /// Focus-continuity recovery found no substitute for the vacated
    /// rectangle; the host may move focus to an outer surface.
    fn after_focus_lost(&mut self, vacated: Rect) {
        let _ = vacated;
    }

    /// Runs before a visual is torn down (or returned to its cache).
    fn pre_free(&mut self, node: NodeId, visual: &mut Self::Visual) {
        let _ = (node, visual);
    }

    /// Consumes a torn-down visual. Not called for cache-eligible nodes,
    /// whose instances return to the pool instead.
    fn post_free(&mut self, node: NodeId, visual: Self::Visual);
}
