// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The model tree: a generational arena of leaf and container nodes.

use alloc::vec::Vec;

use bramble_focus::{FixedNeighbors, FocusEntry};
use bramble_scroll::ScrollController;
use bramble_strip::LaneStrip;
use hashbrown::HashSet;
use kurbo::Rect;

use crate::cache::CacheRegistry;
use crate::host::Host;
use crate::types::{LayoutParams, NodeFlags, NodeId, RebuildReason, SizeSpec, ViewKind};

/// Per-node visual bookkeeping: the host instance and its last placed frame.
#[derive(Debug)]
pub(crate) struct VisualSlot<V> {
    pub(crate) visual: V,
    /// Frame in the parent container's coordinate space.
    pub(crate) frame: Rect,
}

/// Container-only state.
pub(crate) struct ContainerState {
    pub(crate) children: Vec<NodeId>,
    pub(crate) params: LayoutParams,
    pub(crate) strip: LaneStrip,
    pub(crate) scroll: ScrollController<NodeId>,
    /// Inclusive child-index bounds currently materialized.
    pub(crate) window: Option<(usize, usize)>,
    /// Viewport extents as (width, height).
    pub(crate) viewport: (f64, f64),
    /// Re-entrancy guard for the rebuild pass.
    pub(crate) in_rebuild: bool,
    /// Coalesced "rebuild requested" token; drained on the next tick.
    pub(crate) pending: Option<RebuildReason>,
    /// Timestamp of the last major-axis move retry, for rate limiting.
    pub(crate) last_major_move_ms: f64,
}

impl ContainerState {
    fn new(params: LayoutParams) -> Self {
        let division = params.division.max(1);
        Self {
            children: Vec::new(),
            params,
            strip: LaneStrip::new(division),
            scroll: ScrollController::new(),
            window: None,
            viewport: (0.0, 0.0),
            in_rebuild: false,
            pending: None,
            last_major_move_ms: f64::MIN,
        }
    }
}

/// Leaf or container payload. Container-specific operations (child array,
/// scroll target) only exist on the container variant.
pub(crate) enum NodeKind {
    Leaf,
    Container(ContainerState),
}

pub(crate) struct Node<V> {
    pub(crate) generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) size: SizeSpec,
    pub(crate) flags: NodeFlags,
    pub(crate) cache_kind: Option<ViewKind>,
    /// Cached measure-once result as (width, height).
    pub(crate) measured: Option<(f64, f64)>,
    pub(crate) visual: Option<VisualSlot<V>>,
    pub(crate) kind: NodeKind,
}

/// The spatial-focus, virtualized-tile engine: model tree, lazy view
/// builder, scroll animation, and focus coordination in one state machine.
///
/// The tree is a generational arena. Nodes are created detached with
/// [`Tree::insert_leaf`] / [`Tree::insert_container`] and attached by
/// replacing a container's child array with [`Tree::set_children`] — the
/// single structural mutation point. Everything else (building visuals,
/// scrolling, moving focus) flows through the rebuild and tick entry points
/// in the builder and coordinator modules.
///
/// All operations run on the host's main thread; the host's frame clock
/// drives [`Tree::tick`](crate::Tree::tick).
pub struct Tree<H: Host> {
    pub(crate) nodes: Vec<Option<Node<H::Visual>>>,
    pub(crate) generations: Vec<u32>,
    pub(crate) free_list: Vec<usize>,
    pub(crate) cache: CacheRegistry<H::Visual>,
    pub(crate) neighbors: FixedNeighbors<NodeId>,
    pub(crate) focused: Option<NodeId>,
    /// Monotonic engine time, advanced by tick.
    pub(crate) now_ms: f64,
}

impl<H: Host> core::fmt::Debug for Tree<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("focused", &self.focused)
            .field("now_ms", &self.now_ms)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Tree<H> {
    /// Creates an empty tree using the given view-cache registry.
    ///
    /// The registry is supplied by whatever composes the screen, so pooling
    /// scope follows screen lifetime rather than any global state.
    #[must_use]
    pub fn new(cache: CacheRegistry<H::Visual>) -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            cache,
            neighbors: FixedNeighbors::new(),
            focused: None,
            now_ms: 0.0,
        }
    }

    fn insert_node(&mut self, node: Node<H::Visual>) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node { generation, ..node });
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new(idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node { generation, ..node }));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new((self.nodes.len() - 1) as u32, generation)
        }
    }

    /// Creates a detached leaf node.
    pub fn insert_leaf(
        &mut self,
        size: SizeSpec,
        flags: NodeFlags,
        cache_kind: Option<ViewKind>,
    ) -> NodeId {
        self.insert_node(Node {
            generation: 0,
            parent: None,
            size,
            flags,
            cache_kind,
            measured: None,
            visual: None,
            kind: NodeKind::Leaf,
        })
    }

    /// Creates a detached container node.
    pub fn insert_container(
        &mut self,
        params: LayoutParams,
        size: SizeSpec,
        flags: NodeFlags,
    ) -> NodeId {
        self.insert_node(Node {
            generation: 0,
            parent: None,
            size,
            flags,
            cache_kind: None,
            measured: None,
            visual: None,
            kind: NodeKind::Container(ContainerState::new(params)),
        })
    }

    /// Returns `true` if `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node<H::Visual>> {
        self.nodes
            .get(id.idx())
            .and_then(Option::as_ref)
            .filter(|n| n.generation == id.1)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<H::Visual>> {
        self.nodes
            .get_mut(id.idx())
            .and_then(Option::as_mut)
            .filter(|n| n.generation == id.1)
    }

    pub(crate) fn container(&self, id: NodeId) -> Option<&ContainerState> {
        match &self.node(id)?.kind {
            NodeKind::Container(state) => Some(state),
            NodeKind::Leaf => None,
        }
    }

    pub(crate) fn container_mut(&mut self, id: NodeId) -> Option<&mut ContainerState> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Container(state) => Some(state),
            NodeKind::Leaf => None,
        }
    }

    /// Returns `true` if `id` is a live container node.
    #[must_use]
    pub fn is_container(&self, id: NodeId) -> bool {
        self.container(id).is_some()
    }

    /// The node's owning container, or `None` at a root or detached node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// The container's child array; empty for leaves and dead ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.container(id).map_or(&[], |c| c.children.as_slice())
    }

    /// Returns `true` when `node` is `ancestor` or sits below it.
    #[must_use]
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// The node's flags, or empty for dead ids.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).map_or(NodeFlags::empty(), |n| n.flags)
    }

    /// Replaces the node's flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(node) = self.node_mut(id) {
            node.flags = flags;
        }
    }

    /// The node's size policies.
    #[must_use]
    pub fn size(&self, id: NodeId) -> Option<SizeSpec> {
        self.node(id).map(|n| n.size)
    }

    /// Replaces the node's size policies and invalidates its measure cache.
    pub fn set_size(&mut self, id: NodeId, size: SizeSpec) {
        if let Some(node) = self.node_mut(id) {
            node.size = size;
            node.measured = None;
        }
    }

    /// The last frame placed for the node's visual, in its parent
    /// container's coordinates; `None` while off-window.
    #[must_use]
    pub fn frame(&self, id: NodeId) -> Option<Rect> {
        self.node(id)?.visual.as_ref().map(|slot| slot.frame)
    }

    /// Returns `true` while the node has a live visual.
    #[must_use]
    pub fn is_built(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.visual.is_some())
    }

    /// The container's current build window as inclusive child indices.
    #[must_use]
    pub fn build_window(&self, id: NodeId) -> Option<(usize, usize)> {
        self.container(id)?.window
    }

    /// The container's current scroll position.
    #[must_use]
    pub fn scroll_position(&self, id: NodeId) -> f64 {
        self.container(id).map_or(0.0, |c| c.scroll.position())
    }

    /// Returns `true` while the container has an unfinished scroll target.
    #[must_use]
    pub fn is_scrolling(&self, id: NodeId) -> bool {
        self.container(id).is_some_and(|c| c.scroll.is_animating())
    }

    /// The node currently holding focus, as known to the engine.
    #[must_use]
    pub const fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// The manual focus-wiring table.
    pub fn neighbors_mut(&mut self) -> &mut FixedNeighbors<NodeId> {
        &mut self.neighbors
    }

    /// The view-cache registry.
    pub fn cache_mut(&mut self) -> &mut CacheRegistry<H::Visual> {
        &mut self.cache
    }

    /// Schedules a rebuild of the container on the next tick.
    pub fn request_rebuild(&mut self, container: NodeId, reason: RebuildReason) {
        if let Some(state) = self.container_mut(container) {
            // Coalesce: the first reason wins within one tick.
            if state.pending.is_none() {
                state.pending = Some(reason);
            }
        }
    }

    /// Sets the container's viewport extents (width, height) and schedules a
    /// resize rebuild when they changed.
    pub fn set_viewport(&mut self, container: NodeId, width: f64, height: f64) {
        let reason;
        {
            let Some(state) = self.container_mut(container) else {
                log::warn!("set_viewport on non-container {container:?}");
                return;
            };
            let new = (width.max(0.0), height.max(0.0));
            if state.viewport == new {
                return;
            }
            reason = if state.window.is_none() {
                RebuildReason::Initial
            } else {
                RebuildReason::Resize
            };
            state.viewport = new;
        }
        self.request_rebuild(container, reason);
    }

    /// Replaces a container's child array — the single structural mutation.
    ///
    /// Old children absent from the new sequence are detached (parent
    /// cleared, visuals freed, still alive for re-attachment elsewhere);
    /// new and retained children get their parent set to this container.
    /// The swap is all-or-nothing: readers never observe a partial array.
    /// A structural rebuild is scheduled for the next tick.
    ///
    /// Duplicate entries and dead ids are logic errors: debug builds assert,
    /// release builds keep the first occurrence and log.
    pub fn set_children(&mut self, container: NodeId, new_children: Vec<NodeId>, host: &mut H) {
        if !self.is_container(container) {
            log::warn!("set_children on non-container {container:?}");
            return;
        }

        // Sanitize: drop dead ids and duplicates, first occurrence wins.
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(new_children.len());
        let mut accepted: Vec<NodeId> = Vec::with_capacity(new_children.len());
        for child in new_children {
            if !self.is_alive(child) {
                debug_assert!(false, "dead node {child:?} in child array");
                log::warn!("dropping dead node {child:?} from child array");
                continue;
            }
            if !seen.insert(child) {
                debug_assert!(false, "duplicate node {child:?} in child array");
                log::warn!("dropping duplicate node {child:?} from child array");
                continue;
            }
            let parent = self.parent(child);
            if parent.is_some() && parent != Some(container) {
                debug_assert!(false, "node {child:?} already owned by {parent:?}");
                log::warn!("dropping node {child:?} still owned by {parent:?}");
                continue;
            }
            accepted.push(child);
        }

        // Detach old children that did not survive.
        let old = self
            .container(container)
            .map(|c| c.children.clone())
            .unwrap_or_default();
        for child in old {
            if !seen.contains(&child) {
                self.free_subtree_visuals(child, host);
                if let Some(node) = self.node_mut(child) {
                    node.parent = None;
                }
            }
        }

        for &child in &accepted {
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(container);
            }
        }

        if let Some(state) = self.container_mut(container) {
            // Whole-sequence swap; never mutated in place.
            state.children = accepted;
            state.window = None;
            state
                .scroll
                .discard_stale_target(|node| seen.contains(&node));
        }
        self.request_rebuild(container, RebuildReason::ChildrenChanged);
    }

    /// Removes a node and its subtree: visuals freed, arena slots recycled.
    pub fn remove(&mut self, id: NodeId, host: &mut H) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(state) = self.container_mut(parent) {
                state.children.retain(|c| *c != id);
                state.scroll.discard_stale_target(|node| node != id);
            }
            self.request_rebuild(parent, RebuildReason::ChildrenChanged);
        }
        self.remove_inner(id, host);
    }

    fn remove_inner(&mut self, id: NodeId, host: &mut H) {
        self.free_subtree_visuals(id, host);
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.remove_inner(child, host);
        }
        self.neighbors.forget(id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Syncs engine state with a host-initiated focus change (for example a
    /// touch event): records the focused node and nudges each enclosing
    /// container to keep it in view.
    pub fn note_host_focus(&mut self, node: NodeId) {
        if !self.is_alive(node) {
            // A notification for a node the engine already detached.
            log::debug!("host focus on dead node {node:?}; ignored");
            return;
        }
        self.focused = Some(node);
        let mut cursor = self.parent(node);
        let mut child = node;
        while let Some(container) = cursor {
            if self.is_container(container) {
                self.scroll_child_into_view(container, child);
            }
            child = container;
            cursor = self.parent(container);
        }
    }

    /// Collects the focusable candidates currently built under `container`,
    /// with frames expressed in the container's coordinate space.
    pub(crate) fn collect_focus_entries(
        &self,
        container: NodeId,
        skip: Option<NodeId>,
        out: &mut Vec<FocusEntry<NodeId>>,
    ) {
        for &child in self.children(container) {
            self.collect_entries_inner(child, skip, 0.0, 0.0, out);
        }
    }

    fn collect_entries_inner(
        &self,
        id: NodeId,
        skip: Option<NodeId>,
        dx: f64,
        dy: f64,
        out: &mut Vec<FocusEntry<NodeId>>,
    ) {
        if skip == Some(id) {
            return;
        }
        let Some(node) = self.node(id) else { return };
        let Some(slot) = &node.visual else { return };
        if !node.flags.contains(NodeFlags::VISIBLE) {
            return;
        }
        let frame = slot.frame + kurbo::Vec2::new(dx, dy);
        if node.flags.contains(NodeFlags::FOCUSABLE) && frame.width() > 0.0 && frame.height() > 0.0
        {
            out.push(FocusEntry { id, rect: frame });
        }
        if matches!(node.kind, NodeKind::Container(_)) {
            for &child in self.children(id) {
                self.collect_entries_inner(child, skip, frame.x0, frame.y0, out);
            }
        }
    }

    /// Expresses `node`'s frame in `ancestor`'s coordinate space.
    pub(crate) fn frame_in(&self, ancestor: NodeId, node: NodeId) -> Option<Rect> {
        let mut rect = self.frame(node)?;
        let mut cursor = self.parent(node)?;
        while cursor != ancestor {
            let frame = self.frame(cursor)?;
            rect = rect + kurbo::Vec2::new(frame.x0, frame.y0);
            cursor = self.parent(cursor)?;
        }
        Some(rect)
    }

    /// The direct child of `container` on the ancestor chain of `node`.
    pub(crate) fn child_anchor(&self, container: NodeId, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let parent = self.parent(current)?;
            if parent == container {
                return Some(current);
            }
            current = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;

    use crate::cache::CacheRegistry;
    use crate::testing::{RecordingHost, tile_row};
    use crate::types::{NodeFlags, SizeSpec};

    use super::Tree;

    #[test]
    fn recycled_slot_gets_a_new_generation() {
        let mut host = RecordingHost::new();
        let mut tree: Tree<RecordingHost> = Tree::new(CacheRegistry::new());
        let first = tree.insert_leaf(SizeSpec::fixed(10.0, 10.0), NodeFlags::default(), None);
        tree.remove(first, &mut host);
        assert!(!tree.is_alive(first));

        let second = tree.insert_leaf(SizeSpec::fixed(10.0, 10.0), NodeFlags::default(), None);
        assert_eq!(second.idx(), first.idx());
        assert_ne!(second, first);
        assert!(tree.is_alive(second));
        assert!(!tree.is_alive(first));
    }

    #[test]
    fn first_window_builds_visible_tiles_plus_guarantee() {
        let mut host = RecordingHost::new();
        let (tree, container, tiles) = tile_row(10, 350.0, NodeFlags::default(), &mut host);

        assert_eq!(tree.build_window(container), Some((0, 4)));
        assert_eq!(host.built.len(), 5);
        assert_eq!(tree.frame(tiles[2]), Some(Rect::new(200.0, 0.0, 300.0, 100.0)));
        assert!(!tree.is_built(tiles[5]));
    }

    #[test]
    fn set_children_swap_detaches_the_removed_child() {
        let mut host = RecordingHost::new();
        let (mut tree, container, tiles) = tile_row(4, 350.0, NodeFlags::default(), &mut host);
        assert_eq!(tree.parent(tiles[3]), Some(container));

        tree.set_children(container, vec![tiles[0], tiles[1], tiles[2]], &mut host);
        assert_eq!(tree.parent(tiles[3]), None);
        assert!(tree.is_alive(tiles[3]), "detached, not destroyed");
        assert!(!tree.is_built(tiles[3]));
        assert_eq!(host.freed, vec![tiles[3]]);
        assert_eq!(tree.children(container), &[tiles[0], tiles[1], tiles[2]]);

        // Detached nodes can be attached elsewhere.
        tree.set_children(container, vec![tiles[3], tiles[0]], &mut host);
        assert_eq!(tree.parent(tiles[3]), Some(container));
    }

    #[test]
    fn remove_recycles_the_whole_subtree() {
        let mut host = RecordingHost::new();
        let (mut tree, container, tiles) = tile_row(3, 350.0, NodeFlags::default(), &mut host);

        tree.remove(container, &mut host);
        assert!(!tree.is_alive(container));
        for tile in tiles {
            assert!(!tree.is_alive(tile));
        }
        assert_eq!(host.freed.len(), 3, "one teardown per built tile");
    }

    #[test]
    fn viewport_resize_is_coalesced_until_the_next_tick() {
        let mut host = RecordingHost::new();
        let (mut tree, container, _) = tile_row(10, 350.0, NodeFlags::default(), &mut host);
        let placed_before = host.placed.len();

        tree.set_viewport(container, 550.0, 100.0);
        assert_eq!(host.placed.len(), placed_before, "no work before tick");

        tree.tick(0.0, &mut host);
        assert_eq!(tree.build_window(container), Some((0, 6)));
    }

    #[test]
    fn note_host_focus_records_and_schedules_reveal() {
        let mut host = RecordingHost::new();
        let (mut tree, container, tiles) = tile_row(10, 350.0, NodeFlags::default(), &mut host);

        tree.note_host_focus(tiles[3]);
        assert_eq!(tree.focused(), Some(tiles[3]));
        // Tile 3 spans 300..400: the reveal scrolls to 50.
        tree.tick(0.0, &mut host);
        crate::testing::settle(&mut tree, &mut host);
        assert!((tree.scroll_position(container) - 50.0).abs() < 1e-9);
    }
}
