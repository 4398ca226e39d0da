// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pooling of visual instances for cache-eligible node kinds.

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::types::ViewKind;

/// Registered closest-match finder: returns the index of the idle instance
/// to check out, or `None` to fall back to most-recent.
type MatchFinder<V> = Box<dyn Fn(&[V]) -> Option<usize>>;

/// A pool of idle visual instances of one kind.
///
/// Caches bound allocation churn for tiles that are rebuilt frequently as
/// the window slides. Instances are created eagerly up to a pre-size and
/// replenished lazily; checkout takes the most recently returned instance
/// unless the caller supplies a closest-match finder.
#[derive(Debug)]
pub struct ViewCache<V> {
    idle: Vec<V>,
}

impl<V> Default for ViewCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ViewCache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { idle: Vec::new() }
    }

    /// Fills the idle set up to `count` instances using `build`.
    pub fn presize<F: FnMut() -> V>(&mut self, count: usize, mut build: F) {
        self.idle.reserve(count.saturating_sub(self.idle.len()));
        while self.idle.len() < count {
            self.idle.push(build());
        }
    }

    /// Takes an idle instance, most recently returned first.
    pub fn checkout(&mut self) -> Option<V> {
        self.idle.pop()
    }

    /// Takes the idle instance selected by `pick` over the idle set.
    ///
    /// `pick` is the pluggable "closest match" finder: it receives the idle
    /// instances and returns the index to check out, or `None` to fall back
    /// to most-recent. An out-of-range index also falls back.
    pub fn checkout_by<F>(&mut self, pick: F) -> Option<V>
    where
        F: FnOnce(&[V]) -> Option<usize>,
    {
        match pick(&self.idle) {
            Some(i) if i < self.idle.len() => Some(self.idle.swap_remove(i)),
            _ => self.checkout(),
        }
    }

    /// Returns an instance to the idle set.
    pub fn put(&mut self, instance: V) {
        self.idle.push(instance);
    }

    /// Number of idle instances.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }
}

/// All view caches of one screen, keyed by kind.
///
/// The registry is owned by whatever composes the screen and handed to the
/// engine at construction — there is no global lookup. Freed instances are
/// parked in a deferred queue and only rejoin their idle set on the next
/// engine tick; some host frameworks mis-render a view torn down and
/// re-added to the same parent within one synchronous pass.
pub struct CacheRegistry<V> {
    caches: HashMap<ViewKind, ViewCache<V>>,
    deferred: Vec<(ViewKind, V)>,
    finders: HashMap<ViewKind, MatchFinder<V>>,
}

impl<V: core::fmt::Debug> core::fmt::Debug for CacheRegistry<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("caches", &self.caches)
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

impl<V> Default for CacheRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheRegistry<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caches: HashMap::new(),
            deferred: Vec::new(),
            finders: HashMap::new(),
        }
    }

    /// Registers a closest-match finder for `kind`. Every checkout of that
    /// kind, including the ones the engine makes while sliding the window,
    /// runs the finder over the idle set instead of taking most-recent.
    pub fn set_finder<F>(&mut self, kind: ViewKind, finder: F)
    where
        F: Fn(&[V]) -> Option<usize> + 'static,
    {
        self.finders.insert(kind, Box::new(finder));
    }

    /// Pre-sizes the cache for `kind`, creating it if needed.
    pub fn presize<F: FnMut() -> V>(&mut self, kind: ViewKind, count: usize, build: F) {
        self.caches.entry(kind).or_default().presize(count, build);
    }

    /// Takes an idle instance of `kind`, if any, consulting the registered
    /// finder for that kind when one exists.
    pub fn checkout(&mut self, kind: ViewKind) -> Option<V> {
        let cache = self.caches.get_mut(&kind)?;
        match self.finders.get(&kind) {
            Some(find) => cache.checkout_by(|idle| find(idle)),
            None => cache.checkout(),
        }
    }

    /// Takes an idle instance of `kind` selected by a closest-match finder.
    pub fn checkout_by<F>(&mut self, kind: ViewKind, pick: F) -> Option<V>
    where
        F: FnOnce(&[V]) -> Option<usize>,
    {
        self.caches.get_mut(&kind)?.checkout_by(pick)
    }

    /// Queues a freed instance for return to its idle set on the next tick.
    pub fn put_free(&mut self, kind: ViewKind, instance: V) {
        self.deferred.push((kind, instance));
    }

    /// Moves deferred instances into their idle sets. Called once per tick.
    pub fn flush_deferred(&mut self) {
        for (kind, instance) in self.deferred.drain(..) {
            self.caches.entry(kind).or_default().put(instance);
        }
    }

    /// Drops the caches whose kind fails `keep` (stale contexts).
    pub fn prune<F: Fn(ViewKind) -> bool>(&mut self, keep: F) {
        self.caches.retain(|kind, _| keep(*kind));
        self.deferred.retain(|(kind, _)| keep(*kind));
        self.finders.retain(|kind, _| keep(*kind));
    }

    /// Number of idle instances for `kind`, deferred returns excluded.
    #[must_use]
    pub fn idle_count(&self, kind: ViewKind) -> usize {
        self.caches.get(&kind).map_or(0, ViewCache::idle_count)
    }
}

#[cfg(test)]
mod tests {
    use super::CacheRegistry;
    use crate::types::ViewKind;

    const TILE: ViewKind = ViewKind(1);
    const BANNER: ViewKind = ViewKind(2);

    #[test]
    fn presize_then_checkout_drains_the_pool() {
        let mut registry = CacheRegistry::new();
        let mut next = 0_u32;
        registry.presize(TILE, 3, || {
            next += 1;
            next
        });
        assert_eq!(registry.idle_count(TILE), 3);

        assert!(registry.checkout(TILE).is_some());
        assert!(registry.checkout(TILE).is_some());
        assert!(registry.checkout(TILE).is_some());
        assert_eq!(registry.checkout(TILE), None);
        assert_eq!(registry.checkout(BANNER), None);
    }

    #[test]
    fn returns_are_deferred_one_tick() {
        let mut registry = CacheRegistry::new();
        registry.put_free(TILE, 7_u32);

        // Not available until flushed.
        assert_eq!(registry.checkout(TILE), None);
        registry.flush_deferred();
        assert_eq!(registry.checkout(TILE), Some(7));
    }

    #[test]
    fn closest_match_finder_selects_the_instance() {
        let mut registry = CacheRegistry::new();
        registry.put_free(TILE, 10_u32);
        registry.put_free(TILE, 20);
        registry.put_free(TILE, 30);
        registry.flush_deferred();

        let picked = registry.checkout_by(TILE, |idle| idle.iter().position(|v| *v == 20));
        assert_eq!(picked, Some(20));
        // A finder that declines falls back to most-recent.
        let fallback = registry.checkout_by(TILE, |_| None);
        assert!(fallback.is_some());
        assert_eq!(registry.idle_count(TILE), 1);
    }

    #[test]
    fn registered_finder_drives_plain_checkout() {
        let mut registry = CacheRegistry::new();
        registry.put_free(TILE, 10_u32);
        registry.put_free(TILE, 20);
        registry.put_free(TILE, 30);
        registry.flush_deferred();
        registry.set_finder(TILE, |idle: &[u32]| idle.iter().position(|v| *v == 10));

        // checkout() itself routes through the finder, so the engine's
        // rebuild path reuses the instance the host considers closest.
        assert_eq!(registry.checkout(TILE), Some(10));
        // Kinds without a finder keep most-recent-first behavior.
        registry.put_free(BANNER, 1);
        registry.put_free(BANNER, 2);
        registry.flush_deferred();
        assert_eq!(registry.checkout(BANNER), Some(2));
    }

    #[test]
    fn prune_drops_stale_kinds_everywhere() {
        let mut registry = CacheRegistry::new();
        registry.presize(TILE, 1, || 1_u32);
        registry.presize(BANNER, 1, || 2);
        registry.put_free(BANNER, 3);

        registry.prune(|kind| kind == TILE);
        assert_eq!(registry.idle_count(TILE), 1);
        assert_eq!(registry.idle_count(BANNER), 0);
        registry.flush_deferred();
        assert_eq!(registry.idle_count(BANNER), 0);
    }
}
