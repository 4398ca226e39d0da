// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared test fixture: a host that records every callback.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::cache::CacheRegistry;
use crate::host::Host;
use crate::tree::Tree;
use crate::types::{LayoutParams, NodeFlags, NodeId, SizeSpec, ViewKind};

/// Stand-in for a host-framework view; the serial tracks instance identity
/// across pooling.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TestVisual {
    pub(crate) serial: u32,
}

#[derive(Default)]
pub(crate) struct RecordingHost {
    pub(crate) built: Vec<NodeId>,
    pub(crate) freed: Vec<NodeId>,
    pub(crate) placed: Vec<(NodeId, Rect)>,
    pub(crate) granted: Vec<NodeId>,
    pub(crate) cleared: Vec<NodeId>,
    pub(crate) lost: Vec<Rect>,
    pub(crate) measures: Vec<NodeId>,
    pub(crate) measure_result: (f64, f64),
    next_serial: u32,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self {
            measure_result: (80.0, 80.0),
            ..Self::default()
        }
    }
}

impl Host for RecordingHost {
    type Visual = TestVisual;

    fn measure(&mut self, node: NodeId, _avail_width: f64, _avail_height: f64) -> (f64, f64) {
        self.measures.push(node);
        self.measure_result
    }

    fn build_visual(&mut self, node: NodeId, _width: f64, _height: f64) -> TestVisual {
        self.built.push(node);
        self.next_serial += 1;
        TestVisual {
            serial: self.next_serial,
        }
    }

    fn place_visual(&mut self, node: NodeId, _visual: &mut TestVisual, frame: Rect) {
        self.placed.push((node, frame));
    }

    fn grant_focus(&mut self, node: NodeId, _visual: &mut TestVisual) {
        self.granted.push(node);
    }

    fn clear_focus(&mut self, node: NodeId, _visual: &mut TestVisual) {
        self.cleared.push(node);
    }

    fn after_focus_lost(&mut self, vacated: Rect) {
        self.lost.push(vacated);
    }

    fn post_free(&mut self, node: NodeId, _visual: TestVisual) {
        self.freed.push(node);
    }
}

/// A horizontal strip of `count` fixed 100x100 tiles under one container,
/// with the given viewport width, ticked once so the first window exists.
pub(crate) fn tile_row(
    count: usize,
    viewport_width: f64,
    flags: NodeFlags,
    host: &mut RecordingHost,
) -> (Tree<RecordingHost>, NodeId, Vec<NodeId>) {
    tile_row_with(count, viewport_width, flags, None, LayoutParams::default(), host)
}

pub(crate) fn tile_row_with(
    count: usize,
    viewport_width: f64,
    flags: NodeFlags,
    cache_kind: Option<ViewKind>,
    params: LayoutParams,
    host: &mut RecordingHost,
) -> (Tree<RecordingHost>, NodeId, Vec<NodeId>) {
    let mut tree = Tree::new(CacheRegistry::new());
    let container = tree.insert_container(params, SizeSpec::fill(), NodeFlags::VISIBLE);
    let tiles: Vec<NodeId> = (0..count)
        .map(|_| tree.insert_leaf(SizeSpec::fixed(100.0, 100.0), flags, cache_kind))
        .collect();
    tree.set_children(container, tiles.clone(), host);
    tree.set_viewport(container, viewport_width, 100.0);
    tree.tick(0.0, host);
    (tree, container, tiles)
}

/// Runs enough ticks for any in-flight scroll animation to settle.
pub(crate) fn settle(tree: &mut Tree<RecordingHost>, host: &mut RecordingHost) {
    for _ in 0..40 {
        tree.tick(bramble_scroll::FRAME_MS, host);
    }
}
