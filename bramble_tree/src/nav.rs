// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The focus coordinator: directional moves, programmatic focus, scroll
//! requests, and the per-frame tick that drives everything forward.

use alloc::vec::Vec;

use bramble_focus::{Direction, FocusSpace, find_next_focus};
use bramble_scroll::{
    DEFAULT_DURATION_MS, OverridePolicy, ScrollMode, target_scroll_clamped,
};
use smallvec::SmallVec;

use crate::host::Host;
use crate::tree::Tree;
use crate::types::{NodeFlags, NodeId, RebuildReason};
use crate::RETRIGGER_MIN_MS;

/// Upper bound on rebuild cascades within one tick (viewport propagation
/// through nested containers converges well before this).
const MAX_REBUILD_PASSES: usize = 8;

/// What a directional focus move accomplished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Focus landed on a new node.
    FocusMoved,
    /// No built candidate yet, but a scroll toward one was started; the
    /// move may succeed when repeated after the window catches up.
    OnlyScrolled,
    /// The edge of the content was hit along the scroll axis; the host
    /// decides what lies beyond.
    WantLeaveMajorDirection,
    /// The edge of the content was hit across the scroll axis.
    WantLeaveMinorDirection,
    /// A scroll toward the candidate is already in flight; repeat the move
    /// shortly.
    PendingLater,
    /// No focused node to move from, or the tree is in no state to move.
    Invalid,
    /// The move resolved to the position focus already holds.
    NoChanges,
}

/// A saved focus location as child indices from a root container down.
///
/// Indices survive child-array swaps and node churn where raw ids would
/// not; restoring clamps each level into the current array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusPath {
    indices: SmallVec<[usize; 4]>,
}

impl<H: Host> Tree<H> {
    /// Moves focus one step in `direction`.
    ///
    /// Resolution order: manual neighbor wiring (nearest declaration on the
    /// focused node's ancestor chain wins), then geometric search in the
    /// enclosing container, widening across the scroll axis to outer
    /// containers. A miss along the scroll axis starts a scroll toward the
    /// nearest focusable lane instead of giving up, rate-limited so held-down
    /// keys don't pile up requests.
    pub fn move_focus(&mut self, direction: Direction, host: &mut H) -> MoveOutcome {
        let Some(focused) = self.focused else {
            return MoveOutcome::Invalid;
        };
        if !self.is_alive(focused) {
            self.focused = None;
            return MoveOutcome::Invalid;
        }

        // Manual wiring overrides geometry.
        let mut cursor = Some(focused);
        while let Some(node) = cursor {
            if let Some(next) = self.neighbors.get(node, direction) {
                if self.is_alive(next) {
                    self.focus_possibly_unbuilt(next, host);
                    return MoveOutcome::FocusMoved;
                }
                self.neighbors.forget(next);
            }
            cursor = self.parent(node);
        }

        let mut scope = self.parent(focused).and_then(|p| self.nearest_container(p));
        let mut entries = Vec::new();
        while let Some(container) = scope {
            let Some(rect) = self.frame_in(container, focused) else {
                break;
            };
            entries.clear();
            self.collect_focus_entries(container, None, &mut entries);
            let space = FocusSpace { nodes: &entries };
            if let Some(found) = find_next_focus(&space, rect, direction, Some(focused), false) {
                self.grant_focus_to(found, host);
                self.scroll_ancestors_to(found, host);
                return MoveOutcome::FocusMoved;
            }
            let major = self
                .container(container)
                .map(|s| s.params.orientation.is_horizontal())
                == Some(direction.is_horizontal());
            if major {
                return self.advance_major(container, focused, direction, host);
            }
            scope = self.parent(container).and_then(|p| self.nearest_container(p));
        }
        MoveOutcome::WantLeaveMinorDirection
    }

    /// A scroll-axis miss: scan the lane strip for the next focusable row,
    /// scroll toward it, and retry the search once the window caught up.
    fn advance_major(
        &mut self,
        container: NodeId,
        focused: NodeId,
        direction: Direction,
        host: &mut H,
    ) -> MoveOutcome {
        let Some(anchor) = self.child_anchor(container, focused) else {
            return MoveOutcome::Invalid;
        };
        let (target, animating, last_move) = {
            let Some(state) = self.container(container) else {
                return MoveOutcome::Invalid;
            };
            let children = &state.children;
            let Some(anchor_index) = children.iter().position(|&c| c == anchor) else {
                return MoveOutcome::Invalid;
            };
            let division = state.params.division.max(1);
            let lane = anchor_index % division;
            let row_count = state.strip.row_count();
            let forward = direction.is_forward();

            // Walk rows outward; prefer the same lane within a row.
            let mut row = anchor_index / division;
            let mut candidate = None;
            loop {
                if forward {
                    row += 1;
                    if row >= row_count {
                        break;
                    }
                } else {
                    if row == 0 {
                        break;
                    }
                    row -= 1;
                }
                if state.strip.row_extent(row) <= 0.0 {
                    continue;
                }
                let lo = row * division;
                let hi = (lo + division).min(children.len());
                let same_lane = lo + lane;
                let pick = if same_lane < hi && self.is_focus_candidate(children[same_lane]) {
                    Some(same_lane)
                } else {
                    (lo..hi).find(|&i| self.is_focus_candidate(children[i]))
                };
                if let Some(i) = pick {
                    candidate = Some(children[i]);
                    break;
                }
            }
            let Some(target) = candidate else {
                return MoveOutcome::WantLeaveMajorDirection;
            };
            (target, state.scroll.is_animating(), state.last_major_move_ms)
        };

        if animating && self.now_ms - last_move < RETRIGGER_MIN_MS {
            return MoveOutcome::PendingLater;
        }

        let mode = self
            .container(container)
            .map_or(ScrollMode::InBounds, |s| s.params.focus_scroll_mode);
        let changed = self.request_scroll(
            container,
            target,
            mode,
            true,
            OverridePolicy::WhenPositionChanges,
            true,
            host,
        );
        let now = self.now_ms;
        if let Some(state) = self.container_mut(container) {
            state.last_major_move_ms = now;
        }

        // The rebuild above may have materialized the candidate.
        if let Some(rect) = self.frame_in(container, focused) {
            let mut entries = Vec::new();
            self.collect_focus_entries(container, None, &mut entries);
            let space = FocusSpace { nodes: &entries };
            if let Some(found) = find_next_focus(&space, rect, direction, Some(focused), false) {
                self.grant_focus_to(found, host);
                self.scroll_ancestors_to(found, host);
                return MoveOutcome::FocusMoved;
            }
        }
        if changed {
            MoveOutcome::OnlyScrolled
        } else {
            MoveOutcome::NoChanges
        }
    }

    fn is_focus_candidate(&self, id: NodeId) -> bool {
        self.flags(id)
            .contains(NodeFlags::VISIBLE | NodeFlags::FOCUSABLE)
    }

    /// Innermost container at or above `from`.
    fn nearest_container(&self, from: NodeId) -> Option<NodeId> {
        let mut cursor = Some(from);
        while let Some(node) = cursor {
            if self.is_container(node) {
                return Some(node);
            }
            cursor = self.parent(node);
        }
        None
    }

    /// Records `next` as focused, deferring the host grant until its visual
    /// exists when it is not built yet.
    fn focus_possibly_unbuilt(&mut self, next: NodeId, host: &mut H) {
        if self.is_built(next) {
            self.grant_focus_to(next, host);
            self.scroll_ancestors_to(next, host);
        } else {
            self.park_focus(next, host);
            // The scroll-triggered rebuild grants focus once it builds.
            self.scroll_ancestors_to(next, host);
        }
    }

    /// Marks `next` as focused without a host grant, clearing the previous
    /// holder's highlight so two visuals never look focused at once.
    fn park_focus(&mut self, next: NodeId, host: &mut H) {
        if let Some(prev) = self.focused.take() {
            if prev != next {
                if let Some(node) = self.node_mut(prev) {
                    if let Some(slot) = node.visual.as_mut() {
                        host.clear_focus(prev, &mut slot.visual);
                    }
                }
            }
        }
        self.focused = Some(next);
    }

    /// Moves focus to the child at `index` of `container` (clamped into the
    /// child array), scrolling it into view with the given alignment.
    /// Descends into nested containers, asking `inner` which of their
    /// children to land on; without a callback it targets the child nearest
    /// the container's current scroll position, so a pre-scrolled inner rail
    /// is not yanked back to its start.
    ///
    /// Returns `true` when focus ended up on the resolved target.
    pub fn focus_to_index(
        &mut self,
        container: NodeId,
        index: usize,
        mode: ScrollMode,
        smooth: bool,
        policy: OverridePolicy,
        inner: Option<&dyn Fn(&Self, NodeId) -> usize>,
        host: &mut H,
    ) -> bool {
        let child = {
            let Some(state) = self.container(container) else {
                return false;
            };
            if state.children.is_empty() {
                return false;
            }
            state.children[index.min(state.children.len() - 1)]
        };
        self.request_scroll(container, child, mode, smooth, policy, false, host);
        // Materialize the target even when the scroll did not change.
        self.rebuild(container, RebuildReason::Requested, host);

        if self.is_container(child) {
            let inner_index = match inner {
                Some(select) => select(self, child),
                None => self.first_visible_index(child),
            };
            return self.focus_to_index(child, inner_index, mode, smooth, policy, inner, host);
        }
        if self.is_built(child) && self.is_focus_candidate(child) {
            self.grant_focus_to(child, host);
        } else {
            self.park_focus(child, host);
        }
        self.focused == Some(child)
    }

    /// Index of the first child on the row at `container`'s current scroll
    /// position, or 0 for an unlaid-out container.
    fn first_visible_index(&self, container: NodeId) -> usize {
        self.container(container)
            .and_then(|state| {
                let offset = state.scroll.position() - state.params.padding;
                state
                    .strip
                    .row_at_offset(offset)
                    .map(|row| state.strip.first_index_of_row(row))
            })
            .unwrap_or(0)
    }

    /// Captures where focus sits as a chain of child indices from the
    /// outermost container down. Returns `None` when nothing is focused.
    #[must_use]
    pub fn save_focus(&self) -> Option<FocusPath> {
        let focused = self.focused?;
        let mut indices: SmallVec<[usize; 4]> = SmallVec::new();
        let mut node = focused;
        while let Some(parent) = self.parent(node) {
            if let Some(state) = self.container(parent) {
                let index = state.children.iter().position(|&c| c == node)?;
                indices.push(index);
            }
            node = parent;
        }
        indices.reverse();
        Some(FocusPath { indices })
    }

    /// Replays a saved focus path from `root` down, outermost level first,
    /// jumping each container's scroll so the restored node is in view.
    ///
    /// Returns `true` when focus ended up on the resolved node.
    pub fn restore_focus(&mut self, root: NodeId, path: &FocusPath, host: &mut H) -> bool {
        if path.indices.is_empty() {
            return false;
        }
        let mut container = root;
        let mut target = root;
        for (depth, &saved) in path.indices.iter().enumerate() {
            let child = {
                let Some(state) = self.container(container) else {
                    return false;
                };
                if state.children.is_empty() {
                    return false;
                }
                state.children[saved.min(state.children.len() - 1)]
            };
            let mode = self
                .container(container)
                .map_or(ScrollMode::InBounds, |s| s.params.focus_scroll_mode);
            self.request_scroll(
                container,
                child,
                mode,
                false,
                OverridePolicy::Always,
                false,
                host,
            );
            self.rebuild(container, RebuildReason::Requested, host);
            target = child;
            if depth + 1 < path.indices.len() {
                if !self.is_container(child) {
                    break;
                }
                container = child;
            }
        }
        if self.is_built(target) {
            self.grant_focus_to(target, host);
        } else {
            self.park_focus(target, host);
        }
        self.focused == Some(target)
    }

    /// Scrolls every container on `node`'s ancestor chain so the node comes
    /// into view, with the given alignment and animation settings.
    ///
    /// Returns `true` when any position or target changed.
    pub fn scroll_to_node(
        &mut self,
        node: NodeId,
        mode: ScrollMode,
        smooth: bool,
        policy: OverridePolicy,
        host: &mut H,
    ) -> bool {
        let mut changed = false;
        let mut child = node;
        let mut cursor = self.parent(node);
        while let Some(ancestor) = cursor {
            if self.is_container(ancestor) {
                changed |= self.request_scroll(ancestor, child, mode, smooth, policy, false, host);
            }
            child = ancestor;
            cursor = self.parent(ancestor);
        }
        changed
    }

    /// Scrolls `node` into view on every enclosing container, each with its
    /// own configured focus alignment.
    fn scroll_ancestors_to(&mut self, node: NodeId, host: &mut H) {
        let mut child = node;
        let mut cursor = self.parent(node);
        while let Some(ancestor) = cursor {
            if self.is_container(ancestor) {
                let mode = self
                    .container(ancestor)
                    .map_or(ScrollMode::InBounds, |s| s.params.focus_scroll_mode);
                self.request_scroll(
                    ancestor,
                    child,
                    mode,
                    true,
                    OverridePolicy::WhenPositionChanges,
                    true,
                    host,
                );
            }
            child = ancestor;
            cursor = self.parent(ancestor);
        }
    }

    /// Resolves and requests a scroll of `container` toward its direct
    /// child `anchor`, rebuilding immediately when anything changed so the
    /// window covers the path to the destination.
    fn request_scroll(
        &mut self,
        container: NodeId,
        anchor: NodeId,
        mode: ScrollMode,
        smooth: bool,
        policy: OverridePolicy,
        keep_focused_visible: bool,
        host: &mut H,
    ) -> bool {
        let to = {
            let Some(state) = self.container(container) else {
                return false;
            };
            let Some(index) = state.children.iter().position(|&c| c == anchor) else {
                return false;
            };
            let (vw, vh) = state.viewport;
            let viewport_main = if state.params.orientation.is_horizontal() {
                vw
            } else {
                vh
            };
            let range = self.row_span(container, index);
            let keep = if keep_focused_visible {
                self.focused_span(container)
            } else {
                None
            };
            target_scroll_clamped(
                range,
                mode,
                state.scroll.position(),
                viewport_main,
                state.scroll.bounds(),
                keep,
            )
        };
        let keep = keep_focused_visible;
        let changed = self.container_mut(container).is_some_and(|state| {
            state
                .scroll
                .request(anchor, mode, to, smooth, policy, keep, DEFAULT_DURATION_MS)
        });
        if changed {
            self.rebuild(container, RebuildReason::Scroll, host);
        }
        changed
    }

    /// Host-less variant used when syncing externally-driven focus; the
    /// rebuild is deferred to the next tick.
    pub(crate) fn scroll_child_into_view(&mut self, container: NodeId, child: NodeId) {
        let request = {
            let Some(state) = self.container(container) else {
                return;
            };
            let Some(index) = state.children.iter().position(|&c| c == child) else {
                return;
            };
            let (vw, vh) = state.viewport;
            let viewport_main = if state.params.orientation.is_horizontal() {
                vw
            } else {
                vh
            };
            let mode = state.params.focus_scroll_mode;
            let range = self.row_span(container, index);
            let to = target_scroll_clamped(
                range,
                mode,
                state.scroll.position(),
                viewport_main,
                state.scroll.bounds(),
                None,
            );
            (mode, to)
        };
        let (mode, to) = request;
        let changed = self.container_mut(container).is_some_and(|state| {
            state.scroll.request(
                child,
                mode,
                to,
                true,
                OverridePolicy::WhenPositionChanges,
                false,
                DEFAULT_DURATION_MS,
            )
        });
        if changed {
            self.request_rebuild(container, RebuildReason::Scroll);
        }
    }

    /// Advances engine time by `dt_ms`: steps scroll animations, runs the
    /// rebuilds they and earlier mutations scheduled, and releases deferred
    /// cache returns. Call once per host frame.
    pub fn tick(&mut self, dt_ms: f64, host: &mut H) {
        self.now_ms += dt_ms.max(0.0);

        let containers = self.alive_containers();
        for id in containers {
            let stepped = self
                .container_mut(id)
                .map(|state| state.scroll.tick(dt_ms));
            if let Some(outcome) = stepped {
                if outcome.moved || outcome.finished {
                    self.request_rebuild(id, RebuildReason::Scroll);
                }
            }
        }

        for _ in 0..MAX_REBUILD_PASSES {
            let mut pending = Vec::new();
            for id in self.alive_containers() {
                if let Some(state) = self.container_mut(id) {
                    if let Some(reason) = state.pending.take() {
                        pending.push((id, reason));
                    }
                }
            }
            if pending.is_empty() {
                break;
            }
            for (id, reason) in pending {
                self.rebuild(id, reason, host);
            }
        }

        self.cache.flush_deferred();
    }

    /// Tears the whole tree down: every visual is freed (cache-eligible
    /// instances still flow through their pools), every node slot released.
    /// The registry's deferred returns are flushed so the caches are whole.
    pub fn free(&mut self, host: &mut H) {
        // No continuity recovery during teardown.
        self.focused = None;
        for idx in 0..self.nodes.len() {
            let Some(node) = self.nodes[idx].as_mut() else {
                continue;
            };
            let cache_kind = node.cache_kind;
            let id = NodeId::new(
                u32::try_from(idx).unwrap_or(u32::MAX),
                node.generation,
            );
            if let Some(mut slot) = node.visual.take() {
                host.pre_free(id, &mut slot.visual);
                match cache_kind {
                    Some(kind) => self.cache.put_free(kind, slot.visual),
                    None => host.post_free(id, slot.visual),
                }
            }
            self.nodes[idx] = None;
            self.free_list.push(idx);
        }
        self.neighbors = bramble_focus::FixedNeighbors::new();
        self.cache.flush_deferred();
    }

    fn alive_containers(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(node) = node {
                if matches!(node.kind, crate::tree::NodeKind::Container(_)) {
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "NodeId uses 32-bit indices by design."
                    )]
                    out.push(NodeId::new(idx as u32, node.generation));
                }
            }
        }
        out
    }
}
