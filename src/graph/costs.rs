//! Distance memoization.
//!
//! [`TravelingCosts`] caches distances from one fixed target (a query or the
//! node being inserted) to graph nodes for the duration of a single search or
//! insertion, across all layers it visits. [`DistanceCache`] is a bounded,
//! direct-mapped cache of node-to-node distances that survives across
//! insertions and serves neighbor selection and pruning.

use super::NodeId;
use crate::distance::Distance;
use std::collections::HashMap;

/// Distances from one target to graph nodes, each computed at most once.
pub struct TravelingCosts<'a, T, M: Distance<T>> {
    items: &'a [T],
    metric: &'a M,
    target: &'a T,
    known: HashMap<NodeId, M::Output>,
    computations: usize,
}

impl<'a, T, M: Distance<T>> TravelingCosts<'a, T, M> {
    pub fn new(items: &'a [T], metric: &'a M, target: &'a T) -> Self {
        Self {
            items,
            metric,
            target,
            known: HashMap::new(),
            computations: 0,
        }
    }

    /// Distance from the target to node `id`.
    #[inline]
    pub fn from(&mut self, id: NodeId) -> M::Output {
        if let Some(distance) = self.known.get(&id) {
            return *distance;
        }
        let distance = self.metric.distance(self.target, &self.items[id]);
        self.computations += 1;
        self.known.insert(id, distance);
        distance
    }

    /// Number of distance evaluations performed so far.
    pub fn computations(&self) -> usize {
        self.computations
    }
}

const FIBONACCI_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Direct-mapped cache of symmetric node pair distances.
///
/// The slot count is a power of two. A colliding pair overwrites the slot.
pub struct DistanceCache<D> {
    slots: Vec<Option<(u64, D)>>,
    shift: u32,
    hits: u64,
    misses: u64,
}

impl<D: Copy> DistanceCache<D> {
    /// Creates a cache with at least `slots` entries, rounded up to a power
    /// of two.
    pub fn new(slots: usize) -> Self {
        let slots = slots.max(1).next_power_of_two();
        Self {
            slots: vec![None; slots],
            shift: 64 - slots.trailing_zeros(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the cached distance between `a` and `b`, computing and storing
    /// it with `compute` on a miss.
    pub fn get_or_insert_with<F>(&mut self, a: NodeId, b: NodeId, compute: F) -> D
    where
        F: FnOnce() -> D,
    {
        let key = Self::key(a, b);
        let slot = self.slot(key);
        if let Some((stored, distance)) = self.slots[slot] {
            if stored == key {
                self.hits += 1;
                return distance;
            }
        }
        self.misses += 1;
        let distance = compute();
        self.slots[slot] = Some((key, distance));
        distance
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    #[inline]
    fn key(a: NodeId, b: NodeId) -> u64 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        ((lo as u64) << 32) | (hi as u64 & 0xFFFF_FFFF)
    }

    #[inline]
    fn slot(&self, key: u64) -> usize {
        if self.shift == 64 {
            return 0;
        }
        (key.wrapping_mul(FIBONACCI_MULTIPLIER) >> self.shift) as usize
    }
}

/// Node-to-node distances, optionally backed by a [`DistanceCache`].
pub struct PairDistances<'a, T, M: Distance<T>> {
    items: &'a [T],
    metric: &'a M,
    cache: Option<&'a mut DistanceCache<M::Output>>,
    computations: usize,
}

impl<'a, T, M: Distance<T>> PairDistances<'a, T, M> {
    pub fn new(
        items: &'a [T],
        metric: &'a M,
        cache: Option<&'a mut DistanceCache<M::Output>>,
    ) -> Self {
        Self {
            items,
            metric,
            cache,
            computations: 0,
        }
    }

    /// Distance between nodes `a` and `b`.
    pub fn between(&mut self, a: NodeId, b: NodeId) -> M::Output {
        let (items, metric) = (self.items, self.metric);
        let computations = &mut self.computations;
        let mut compute = || {
            *computations += 1;
            metric.distance(&items[a], &items[b])
        };
        match self.cache.as_deref_mut() {
            Some(cache) => cache.get_or_insert_with(a, b, compute),
            None => compute(),
        }
    }

    /// Number of distance evaluations that missed the cache.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
