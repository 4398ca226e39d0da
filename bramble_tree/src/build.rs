// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The lazy view builder: resolves sizes, computes the build window, and
//! keeps host visuals alive exactly where the window (plus allowances) says.

use alloc::vec::Vec;

use bramble_focus::{FocusEntry, FocusSpace, find_focus_from_rect};
use bramble_scroll::target_scroll_clamped;
use bramble_strip::ScrollBounds;
use kurbo::{Rect, Vec2};

use crate::host::Host;
use crate::tree::{Tree, VisualSlot};
use crate::types::{NodeFlags, NodeId, RebuildReason, SizePolicy};

/// Geometry snapshot of one container, taken at the start of a pass so the
/// arena can be borrowed mutably while children are built.
struct Pass {
    horizontal: bool,
    spacing: f64,
    padding: f64,
    viewport_main: f64,
    lane_cross: f64,
}

fn nearest_center(entries: &[FocusEntry<NodeId>], shadow: Rect) -> Option<NodeId> {
    let center = shadow.center();
    entries
        .iter()
        .map(|entry| {
            let d = entry.rect.center() - center;
            (d.x * d.x + d.y * d.y, entry.id)
        })
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(core::cmp::Ordering::Equal))
        .map(|(_, id)| id)
}

impl<H: Host> Tree<H> {
    /// Runs a full layout pass over one container.
    ///
    /// Resolves child sizes, refreshes the lane strip and scroll bounds,
    /// re-resolves any in-flight scroll destination against the new
    /// geometry, computes the build window, frees visuals that fell out of
    /// it, and builds and places the ones inside. Child containers receive
    /// their resolved extents as viewports, which schedules their own
    /// rebuilds.
    ///
    /// Re-entrant requests (a host callback mutating the same container) are
    /// deferred to the next tick rather than recursed into.
    pub fn rebuild(&mut self, container: NodeId, reason: RebuildReason, host: &mut H) {
        {
            let Some(state) = self.container_mut(container) else {
                log::warn!("rebuild requested for non-container {container:?}");
                return;
            };
            if state.in_rebuild {
                log::warn!("re-entrant rebuild of {container:?} deferred");
                if state.pending.is_none() {
                    state.pending = Some(reason);
                }
                return;
            }
            state.in_rebuild = true;
        }
        self.rebuild_inner(container, host);
        if let Some(state) = self.container_mut(container) {
            state.in_rebuild = false;
        }
    }

    fn rebuild_inner(&mut self, container: NodeId, host: &mut H) {
        let Some(state) = self.container(container) else {
            return;
        };
        let params = state.params.clone();
        let (vw, vh) = state.viewport;
        let children = state.children.clone();

        let horizontal = params.orientation.is_horizontal();
        let (viewport_main, viewport_cross) = if horizontal { (vw, vh) } else { (vh, vw) };

        if children.is_empty() || viewport_main <= 0.0 || viewport_cross <= 0.0 {
            for &child in &children {
                self.free_subtree_visuals(child, host);
            }
            if let Some(state) = self.container_mut(container) {
                state.window = None;
                state.strip.rebuild(core::iter::empty::<f64>(), params.spacing);
                state.scroll.set_bounds(ScrollBounds::default());
            }
            return;
        }

        let division = params.division.max(1);
        #[allow(
            clippy::cast_precision_loss,
            reason = "lane counts are far below 2^52"
        )]
        let lane_cross = ((viewport_cross
            - 2.0 * params.padding
            - params.spacing * (division - 1) as f64)
            / division as f64)
            .max(0.0);
        let avail_main = (viewport_main - 2.0 * params.padding).max(0.0);
        let pass = Pass {
            horizontal,
            spacing: params.spacing,
            padding: params.padding,
            viewport_main,
            lane_cross,
        };

        // Child main extents feed the strip; the row takes the largest.
        let mut row_extents: Vec<f64> = Vec::with_capacity(children.len().div_ceil(division));
        let mut row_max = 0.0_f64;
        for (i, &child) in children.iter().enumerate() {
            let (w, h) = self.resolve_size(child, &pass, avail_main, host);
            row_max = row_max.max(if horizontal { w } else { h });
            if (i + 1) % division == 0 || i + 1 == children.len() {
                row_extents.push(row_max);
                row_max = 0.0;
            }
        }

        let clamped_position;
        {
            let Some(state) = self.container_mut(container) else {
                return;
            };
            state.strip.rebuild(row_extents, params.spacing);
            let content = state.strip.total_extent() + 2.0 * params.padding;
            let bounds = ScrollBounds::for_content(content, viewport_main)
                .with_overscroll(params.overscroll)
                .with_extra_tail(params.extra_tail_scroll);
            state.scroll.set_bounds(bounds);
            // Content may have shrunk under the current position.
            clamped_position = bounds.clamp(state.scroll.position());
            state.scroll.set_position(clamped_position);
        }

        // An unfinished destination was computed against the old geometry;
        // resolve it again so the animation lands where the node is now.
        let mut retarget = None;
        if let Some(state) = self.container(container) {
            if let Some(target) = state.scroll.target() {
                if let Some(index) = children.iter().position(|&c| c == target.node) {
                    let range = self.row_span(container, index);
                    let keep = target
                        .keep_focused_visible
                        .then(|| self.focused_span(container))
                        .flatten();
                    retarget = Some(target_scroll_clamped(
                        range,
                        target.mode,
                        clamped_position,
                        viewport_main,
                        state.scroll.bounds(),
                        keep,
                    ));
                }
            }
        }
        if let Some(to) = retarget {
            if let Some(state) = self.container_mut(container) {
                state.scroll.retarget(to);
            }
        }

        // The window covers everything between the current position and the
        // animation destination, so mid-flight frames never show gaps.
        let Some(state) = self.container(container) else {
            return;
        };
        let position = state.scroll.position();
        let to = state.scroll.target().map_or(position, |t| t.to);
        let lo_offset = position.min(to) - params.padding;
        let hi_offset = position.max(to) + viewport_main - params.padding;
        let Some((mut row_lo, mut row_hi)) = state.strip.rows_in_range(lo_offset, hi_offset)
        else {
            return;
        };
        let last_row = state.strip.row_count().saturating_sub(1);

        if params.build_all_children {
            row_lo = 0;
            row_hi = last_row;
        } else {
            // Guarantee a focusable neighbor just outside each window edge.
            while row_lo > 0 {
                row_lo -= 1;
                if self.row_has_always_focusable(&children, row_lo, division) {
                    break;
                }
            }
            while row_hi < last_row {
                row_hi += 1;
                if self.row_has_always_focusable(&children, row_hi, division) {
                    break;
                }
            }
        }

        let lo_idx = row_lo * division;
        let hi_idx = ((row_hi + 1) * division).min(children.len()) - 1;

        // Build before freeing: continuity recovery for an evicted focused
        // node needs the incoming window's candidates to exist.
        for idx in lo_idx..=hi_idx {
            self.place_child(container, idx, &pass, host);
        }

        self.free_outside_window(container, &children, lo_idx, hi_idx, &pass, host);

        if let Some(state) = self.container_mut(container) {
            state.window = Some((lo_idx, hi_idx));
        }
    }

    /// Builds and places one more not-yet-built child adjacent to the
    /// window, for hosts that spread construction over idle frames.
    ///
    /// Returns `false` once the window cannot grow further.
    pub fn prebuild_one(&mut self, container: NodeId, host: &mut H) -> bool {
        let Some(state) = self.container(container) else {
            return false;
        };
        let Some((lo, hi)) = state.window else {
            return false;
        };
        let child_count = state.children.len();
        let params = state.params.clone();
        let (vw, vh) = state.viewport;
        let horizontal = params.orientation.is_horizontal();
        let (viewport_main, viewport_cross) = if horizontal { (vw, vh) } else { (vh, vw) };

        let (idx, window) = if hi + 1 < child_count {
            (hi + 1, (lo, hi + 1))
        } else if lo > 0 {
            (lo - 1, (lo - 1, hi))
        } else {
            return false;
        };

        let division = params.division.max(1);
        #[allow(
            clippy::cast_precision_loss,
            reason = "lane counts are far below 2^52"
        )]
        let lane_cross = ((viewport_cross
            - 2.0 * params.padding
            - params.spacing * (division - 1) as f64)
            / division as f64)
            .max(0.0);
        let pass = Pass {
            horizontal,
            spacing: params.spacing,
            padding: params.padding,
            viewport_main,
            lane_cross,
        };
        self.place_child(container, idx, &pass, host);
        if let Some(state) = self.container_mut(container) {
            state.window = Some(window);
        }
        true
    }

    fn row_has_always_focusable(
        &self,
        children: &[NodeId],
        row: usize,
        division: usize,
    ) -> bool {
        let lo = row * division;
        let hi = (lo + division).min(children.len());
        children[lo..hi]
            .iter()
            .any(|&c| self.flags(c).contains(NodeFlags::ALWAYS_FOCUSABLE))
    }

    /// Resolves a child's (width, height), running the host measure pass for
    /// measure-once axes on first use.
    fn resolve_size(
        &mut self,
        id: NodeId,
        pass: &Pass,
        avail_main: f64,
        host: &mut H,
    ) -> (f64, f64) {
        let Some(node) = self.node(id) else {
            return (0.0, 0.0);
        };
        let size = node.size;
        let measured = node.measured;

        let (avail_w, avail_h) = if pass.horizontal {
            (avail_main, pass.lane_cross)
        } else {
            (pass.lane_cross, avail_main)
        };
        let quick = |policy: SizePolicy, avail: f64| match policy {
            SizePolicy::Fixed(v) => Some(v.max(0.0)),
            SizePolicy::Fill => Some(avail),
            SizePolicy::MeasureOnce => None,
        };
        let w = quick(size.width, avail_w);
        let h = quick(size.height, avail_h);
        if let (Some(w), Some(h)) = (w, h) {
            return (w, h);
        }

        let measured = match measured {
            Some(m) => m,
            None => {
                let m = host.measure(id, avail_w, avail_h);
                if let Some(node) = self.node_mut(id) {
                    node.measured = Some(m);
                }
                m
            }
        };
        (
            w.unwrap_or_else(|| measured.0.max(0.0)),
            h.unwrap_or_else(|| measured.1.max(0.0)),
        )
    }

    /// The `[start, end]` span of the row holding child `index`, in the
    /// container's content coordinates.
    pub(crate) fn row_span(&self, container: NodeId, index: usize) -> (f64, f64) {
        self.container(container).map_or((0.0, 0.0), |state| {
            let row = state.strip.row_of_index(index);
            let padding = state.params.padding;
            (
                padding + state.strip.row_start(row),
                padding + state.strip.row_end(row),
            )
        })
    }

    /// The main-axis span of the focused node's anchor row within
    /// `container`, when focus currently sits inside it.
    pub(crate) fn focused_span(&self, container: NodeId) -> Option<(f64, f64)> {
        let focused = self.focused?;
        let anchor = self.child_anchor(container, focused)?;
        let state = self.container(container)?;
        let index = state.children.iter().position(|&c| c == anchor)?;
        Some(self.row_span(container, index))
    }

    /// Builds (if needed) and places the child at `idx`, and propagates the
    /// resolved extents to child containers as their viewports.
    fn place_child(&mut self, container: NodeId, idx: usize, pass: &Pass, host: &mut H) {
        let Some(state) = self.container(container) else {
            return;
        };
        let Some(&child) = state.children.get(idx) else {
            return;
        };
        let row = state.strip.row_of_index(idx);
        let lane = state.strip.lane_of_index(idx);
        let row_start = state.strip.row_start(row);
        let position = state.scroll.position();
        let gravity = state.params.gravity;
        let avail_main = (pass.viewport_main - 2.0 * pass.padding).max(0.0);

        let (w, h) = self.resolve_size(child, pass, avail_main, host);

        // Frames are in viewport coordinates; scrolling re-places.
        let main = pass.padding + row_start - position;
        #[allow(
            clippy::cast_precision_loss,
            reason = "lane counts are far below 2^52"
        )]
        let lane_origin = pass.padding + lane as f64 * (pass.lane_cross + pass.spacing);
        let cross_extent = if pass.horizontal { h } else { w };
        let cross = lane_origin + gravity.offset(pass.lane_cross - cross_extent);
        let (x, y) = if pass.horizontal { (main, cross) } else { (cross, main) };
        let frame = Rect::new(x, y, x + w, y + h);

        let needs_build = self.node(child).is_some_and(|n| n.visual.is_none());
        if needs_build {
            let kind = self.node(child).and_then(|n| n.cache_kind);
            let visual = match kind.and_then(|k| self.cache.checkout(k)) {
                Some(recycled) => recycled,
                None => host.build_visual(child, w, h),
            };
            if let Some(node) = self.node_mut(child) {
                node.visual = Some(VisualSlot {
                    visual,
                    frame: Rect::ZERO,
                });
            }
        }
        if let Some(node) = self.node_mut(child) {
            if let Some(slot) = node.visual.as_mut() {
                if needs_build || slot.frame != frame {
                    slot.frame = frame;
                    host.place_visual(child, &mut slot.visual, frame);
                }
            }
        }

        if needs_build && self.focused == Some(child) {
            // Focus was parked on this node while it was off-window.
            self.grant_focus_to(child, host);
        }

        if self.is_container(child) {
            self.set_viewport(child, w, h);
        }
    }

    /// Frees built visuals outside `[lo_idx, hi_idx]`, keeping the nearest
    /// `max_cached_offscreen_views` alive as a scroll-back allowance. Kept
    /// visuals are re-placed so their frames keep tracking the scroll.
    fn free_outside_window(
        &mut self,
        container: NodeId,
        children: &[NodeId],
        lo_idx: usize,
        hi_idx: usize,
        pass: &Pass,
        host: &mut H,
    ) {
        let keep = self
            .container(container)
            .and_then(|s| s.params.max_cached_offscreen_views)
            .unwrap_or(0);

        // (distance to window, child index), nearest first.
        let mut offscreen: Vec<(usize, usize)> = children
            .iter()
            .enumerate()
            .filter(|&(i, &c)| (i < lo_idx || i > hi_idx) && self.is_built(c))
            .map(|(i, _)| {
                let distance = if i < lo_idx { lo_idx - i } else { i - hi_idx };
                (distance, i)
            })
            .collect();
        offscreen.sort_unstable();

        for (rank, &(_, i)) in offscreen.iter().enumerate() {
            if rank < keep {
                self.place_child(container, i, pass, host);
            } else {
                self.free_subtree_visuals(children[i], host);
            }
        }
    }

    /// Frees the visuals of `id` and everything below it, children first.
    pub(crate) fn free_subtree_visuals(&mut self, id: NodeId, host: &mut H) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.free_subtree_visuals(child, host);
        }
        if let Some(state) = self.container_mut(id) {
            state.window = None;
            state.scroll.stop();
        }
        self.free_visual(id, host);
    }

    /// Tears down one node's visual: pre-free hook, then either back to the
    /// pool (cache-eligible) or handed to the host to consume. Runs the
    /// focus-continuity recovery when the node held focus.
    pub(crate) fn free_visual(&mut self, id: NodeId, host: &mut H) {
        let held_focus = self.focused == Some(id);
        let (mut slot, cache_kind) = {
            let Some(node) = self.node_mut(id) else {
                return;
            };
            let Some(slot) = node.visual.take() else {
                return;
            };
            (slot, node.cache_kind)
        };

        let handled = if held_focus {
            self.focused = None;
            host.before_focus_lost(id)
        } else {
            true
        };

        host.pre_free(id, &mut slot.visual);
        match cache_kind {
            Some(kind) => self.cache.put_free(kind, slot.visual),
            None => host.post_free(id, slot.visual),
        }

        if !handled {
            self.recover_focus(id, slot.frame, host);
        }
    }

    /// Focus continuity: finds the spatially closest built substitute for a
    /// vacated rectangle, widening the search ancestor by ancestor, and
    /// grants it focus. Tells the host when nothing is left.
    fn recover_focus(&mut self, vacated: NodeId, vacated_frame: Rect, host: &mut H) {
        let mut scope = self.parent(vacated);
        let mut shadow = vacated_frame;
        let mut entries = Vec::new();
        while let Some(container) = scope {
            entries.clear();
            self.collect_focus_entries(container, Some(vacated), &mut entries);
            let space = FocusSpace { nodes: &entries };
            // Best overlap first; tiles rarely overlap, so fall back to the
            // candidate whose center sits closest to the vacated one.
            let found =
                find_focus_from_rect(&space, shadow).or_else(|| nearest_center(&entries, shadow));
            if let Some(found) = found {
                self.grant_focus_to(found, host);
                return;
            }
            if let Some(frame) = self.frame(container) {
                shadow = shadow + Vec2::new(frame.x0, frame.y0);
            }
            scope = self.parent(container);
        }
        host.after_focus_lost(shadow);
    }

    /// Grants host focus to `id`'s visual and records it as focused,
    /// clearing the previous holder first.
    pub(crate) fn grant_focus_to(&mut self, id: NodeId, host: &mut H) {
        // Cleared even when re-granting to the same node: some hosts ignore
        // a grant for a visual they believe is already focused.
        if let Some(prev) = self.focused.take() {
            if let Some(node) = self.node_mut(prev) {
                if let Some(slot) = node.visual.as_mut() {
                    host.clear_focus(prev, &mut slot.visual);
                }
            }
        }
        let granted = if let Some(node) = self.node_mut(id) {
            if let Some(slot) = node.visual.as_mut() {
                host.grant_focus(id, &mut slot.visual);
                true
            } else {
                false
            }
        } else {
            false
        };
        if granted {
            self.focused = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;

    use crate::cache::CacheRegistry;
    use crate::testing::{RecordingHost, tile_row, tile_row_with};
    use crate::tree::Tree;
    use crate::types::{LayoutParams, NodeFlags, SizePolicy, SizeSpec, ViewKind};
    use crate::{OverridePolicy, ScrollMode};

    #[test]
    fn jump_scroll_moves_the_window_and_frees_behind() {
        let mut host = RecordingHost::new();
        let (mut tree, container, tiles) = tile_row(10, 350.0, NodeFlags::default(), &mut host);
        assert_eq!(tree.build_window(container), Some((0, 4)));

        tree.scroll_to_node(
            tiles[9],
            ScrollMode::ToStart,
            false,
            OverridePolicy::Always,
            &mut host,
        );
        assert_eq!(tree.scroll_position(container), 650.0, "clamped to max");
        assert_eq!(tree.build_window(container), Some((5, 9)));
        assert_eq!(host.freed.len(), 5, "old window torn down");
        // Frames are viewport-relative: tile 6 starts at 600 - 650.
        assert_eq!(tree.frame(tiles[6]), Some(Rect::new(-50.0, 0.0, 50.0, 100.0)));
    }

    #[test]
    fn offscreen_allowance_keeps_the_nearest_views() {
        let mut host = RecordingHost::new();
        let params = LayoutParams {
            max_cached_offscreen_views: Some(2),
            ..LayoutParams::default()
        };
        let (mut tree, container, tiles) =
            tile_row_with(10, 350.0, NodeFlags::default(), None, params, &mut host);

        tree.scroll_to_node(
            tiles[9],
            ScrollMode::ToStart,
            false,
            OverridePolicy::Always,
            &mut host,
        );
        assert_eq!(tree.build_window(container), Some((5, 9)));
        assert!(tree.is_built(tiles[3]));
        assert!(tree.is_built(tiles[4]));
        assert!(!tree.is_built(tiles[2]));
        assert_eq!(host.freed.len(), 3);
    }

    #[test]
    fn measure_once_runs_the_host_pass_a_single_time() {
        let mut host = RecordingHost::new();
        let mut tree: Tree<RecordingHost> = Tree::new(CacheRegistry::new());
        let container =
            tree.insert_container(LayoutParams::default(), SizeSpec::fill(), NodeFlags::VISIBLE);
        let tile = tree.insert_leaf(
            SizeSpec {
                width: SizePolicy::MeasureOnce,
                height: SizePolicy::Fixed(100.0),
            },
            NodeFlags::default(),
            None,
        );
        tree.set_children(container, vec![tile], &mut host);
        tree.set_viewport(container, 350.0, 100.0);
        tree.tick(0.0, &mut host);
        assert_eq!(tree.frame(tile), Some(Rect::new(0.0, 0.0, 80.0, 100.0)));
        assert_eq!(host.measures.len(), 1);

        tree.set_viewport(container, 500.0, 100.0);
        tree.tick(0.0, &mut host);
        assert_eq!(host.measures.len(), 1, "cached across rebuilds");
    }

    #[test]
    fn unchanged_frames_are_not_replaced() {
        let mut host = RecordingHost::new();
        let (mut tree, container, _) = tile_row(10, 350.0, NodeFlags::default(), &mut host);
        let placed = host.placed.len();

        tree.request_rebuild(container, crate::RebuildReason::Requested);
        tree.tick(0.0, &mut host);
        assert_eq!(host.placed.len(), placed);
    }

    #[test]
    fn cache_eligible_visuals_flow_through_the_pool() {
        let mut host = RecordingHost::new();
        let kind = ViewKind(7);
        let (mut tree, container, tiles) = tile_row_with(
            10,
            100.0,
            NodeFlags::default(),
            Some(kind),
            LayoutParams::default(),
            &mut host,
        );
        assert_eq!(tree.build_window(container), Some((0, 2)));
        assert_eq!(host.built.len(), 3);

        tree.scroll_to_node(
            tiles[9],
            ScrollMode::ToStart,
            false,
            OverridePolicy::Always,
            &mut host,
        );
        // Freed instances are deferred, so this rebuild built fresh ones.
        assert_eq!(host.built.len(), 5);
        tree.tick(0.0, &mut host);

        tree.scroll_to_node(
            tiles[0],
            ScrollMode::ToStart,
            false,
            OverridePolicy::Always,
            &mut host,
        );
        assert_eq!(host.built.len(), 5, "window refilled from the pool");
        assert!(host.freed.is_empty(), "pooled instances skip post_free");
    }

    #[test]
    fn empty_viewport_tears_the_window_down() {
        let mut host = RecordingHost::new();
        let (mut tree, container, tiles) = tile_row(10, 350.0, NodeFlags::default(), &mut host);

        tree.set_viewport(container, 0.0, 0.0);
        tree.tick(0.0, &mut host);
        assert_eq!(tree.build_window(container), None);
        assert!(!tree.is_built(tiles[0]));
        assert_eq!(host.freed.len(), 5);
    }

    #[test]
    fn evicting_the_focused_tile_recovers_to_the_closest_survivor() {
        let mut host = RecordingHost::new();
        let (mut tree, _, tiles) = tile_row(10, 350.0, NodeFlags::default(), &mut host);
        tree.grant_focus_to(tiles[0], &mut host);

        tree.scroll_to_node(
            tiles[9],
            ScrollMode::ToStart,
            false,
            OverridePolicy::Always,
            &mut host,
        );
        // Tile 0 vacated (0..100); tile 6 now sits at -50..50, the closest.
        assert_eq!(tree.focused(), Some(tiles[6]));
        assert_eq!(host.granted.last(), Some(&tiles[6]));
    }

    #[test]
    fn prebuild_grows_the_window_one_child_at_a_time() {
        let mut host = RecordingHost::new();
        let (mut tree, container, tiles) = tile_row(10, 350.0, NodeFlags::default(), &mut host);
        assert_eq!(tree.build_window(container), Some((0, 4)));

        assert!(tree.prebuild_one(container, &mut host));
        assert_eq!(tree.build_window(container), Some((0, 5)));
        assert!(tree.is_built(tiles[5]));

        for _ in 0..4 {
            assert!(tree.prebuild_one(container, &mut host));
        }
        assert_eq!(tree.build_window(container), Some((0, 9)));
        assert!(!tree.prebuild_one(container, &mut host), "nothing left");
    }
}
