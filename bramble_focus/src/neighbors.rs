// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit id-based neighbor wiring, consulted before geometric search.

use core::hash::Hash;

use hashbrown::HashMap;

use crate::Direction;

/// Manual focus wiring: "from node X, direction D goes to node Y".
///
/// Screens use this to override geometry at seams where the automatic search
/// makes a poor choice (for example, jumping from a hero banner into a menu).
/// The coordinator consults the table for the focused node and then walks up
/// the ancestor chain, so a container can wire an exit for its whole subtree.
#[derive(Clone, Debug)]
pub struct FixedNeighbors<K> {
    edges: HashMap<(K, Direction), K>,
}

impl<K> Default for FixedNeighbors<K> {
    fn default() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> FixedNeighbors<K> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires `from` → `to` for the given direction, replacing any previous edge.
    pub fn set(&mut self, from: K, direction: Direction, to: K) {
        self.edges.insert((from, direction), to);
    }

    /// Removes the edge for `from` in the given direction, if any.
    pub fn unset(&mut self, from: K, direction: Direction) {
        self.edges.remove(&(from, direction));
    }

    /// Removes every edge mentioning `node`, as source or target.
    ///
    /// Call when a node is detached so the table never yields dangling ids.
    pub fn forget(&mut self, node: K) {
        self.edges
            .retain(|(from, _), to| *from != node && *to != node);
    }

    /// Looks up the wired neighbor of `from` in the given direction.
    #[must_use]
    pub fn get(&self, from: K, direction: Direction) -> Option<K> {
        self.edges.get(&(from, direction)).copied()
    }

    /// Returns `true` if the table has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
