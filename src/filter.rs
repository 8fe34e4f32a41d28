//! Search-time filtering of candidate nodes.
//!
//! A [`Filter`] decides which node ids may appear in search results. It is
//! asked in batches: given candidate ids, it returns the admitted subset.
//! Closures over a single id and `RoaringBitmap` allow lists implement it
//! out of the box.
//!
//! A [`FilterSession`] wraps one filter for one query. With caching enabled it
//! remembers every verdict in a [`FilterCache`], so each id reaches the
//! underlying filter at most once per query.

use crate::graph::NodeId;
use roaring::RoaringBitmap;

/// Batch predicate over node ids.
pub trait Filter: Send + Sync {
    /// Returns the admitted subset of `ids`, preserving their order.
    fn filter(&self, ids: &[NodeId]) -> Vec<NodeId>;
}

impl<F> Filter for F
where
    F: Fn(NodeId) -> bool + Send + Sync,
{
    fn filter(&self, ids: &[NodeId]) -> Vec<NodeId> {
        ids.iter().copied().filter(|&id| self(id)).collect()
    }
}

impl Filter for RoaringBitmap {
    fn filter(&self, ids: &[NodeId]) -> Vec<NodeId> {
        ids.iter()
            .copied()
            .filter(|&id| u32::try_from(id).is_ok_and(|id| self.contains(id)))
            .collect()
    }
}

/// Verdicts already reached within one session.
#[derive(Debug, Default, Clone)]
pub struct FilterCache {
    allowed: RoaringBitmap,
    disallowed: RoaringBitmap,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids from `ids` with no verdict yet.
    pub fn exclude_known(&self, ids: &[NodeId]) -> Vec<NodeId> {
        ids.iter()
            .copied()
            .filter(|&id| {
                let id = id as u32;
                !self.allowed.contains(id) && !self.disallowed.contains(id)
            })
            .collect()
    }

    /// Records verdicts for `evaluated`, of which `admitted` passed.
    pub fn remember(&mut self, evaluated: &[NodeId], admitted: &[NodeId]) {
        self.allowed.extend(admitted.iter().map(|&id| id as u32));
        for &id in evaluated {
            let id = id as u32;
            if !self.allowed.contains(id) {
                self.disallowed.insert(id);
            }
        }
    }

    #[inline]
    pub fn is_allowed(&self, id: NodeId) -> bool {
        self.allowed.contains(id as u32)
    }

    /// Number of ids with a recorded verdict.
    pub fn len(&self) -> u64 {
        self.allowed.len() + self.disallowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.disallowed.is_empty()
    }
}

/// One filter applied over the course of one query.
pub struct FilterSession<'f> {
    filter: &'f dyn Filter,
    cache: Option<FilterCache>,
    evaluations: usize,
}

impl<'f> FilterSession<'f> {
    /// Session that remembers verdicts.
    pub fn cached(filter: &'f dyn Filter) -> Self {
        Self::new(filter, true)
    }

    /// Session that asks the filter every time.
    pub fn uncached(filter: &'f dyn Filter) -> Self {
        Self::new(filter, false)
    }

    pub fn new(filter: &'f dyn Filter, use_cache: bool) -> Self {
        Self {
            filter,
            cache: use_cache.then(FilterCache::new),
            evaluations: 0,
        }
    }

    /// Returns the admitted subset of `ids`, preserving their order.
    pub fn filter(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        if ids.is_empty() {
            return Vec::new();
        }
        let Some(cache) = self.cache.as_mut() else {
            self.evaluations += ids.len();
            return self.filter.filter(ids);
        };

        let unknown = cache.exclude_known(ids);
        if !unknown.is_empty() {
            let admitted = self.filter.filter(&unknown);
            self.evaluations += unknown.len();
            cache.remember(&unknown, &admitted);
        }
        ids.iter()
            .copied()
            .filter(|&id| cache.is_allowed(id))
            .collect()
    }

    /// Number of ids handed to the underlying filter.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_filter() {
        let even = |id: NodeId| id % 2 == 0;
        assert_eq!(even.filter(&[1, 2, 3, 4, 6]), vec![2, 4, 6]);
    }

    #[test]
    fn test_bitmap_filter() {
        let allow: RoaringBitmap = [1u32, 5, 9].into_iter().collect();
        assert_eq!(allow.filter(&[9, 0, 5, 7]), vec![9, 5]);
    }

    #[test]
    fn test_cached_session_evaluates_once() {
        let calls = AtomicUsize::new(0);
        let counting = |id: NodeId| {
            calls.fetch_add(1, Ordering::Relaxed);
            id < 10
        };
        let mut session = FilterSession::cached(&counting);

        assert_eq!(session.filter(&[1, 12, 3]), vec![1, 3]);
        assert_eq!(session.filter(&[3, 12, 4, 1]), vec![3, 4, 1]);
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        assert_eq!(session.evaluations(), 4);
    }

    #[test]
    fn test_uncached_session_reevaluates() {
        let calls = AtomicUsize::new(0);
        let counting = |id: NodeId| {
            calls.fetch_add(1, Ordering::Relaxed);
            id != 2
        };
        let mut session = FilterSession::uncached(&counting);

        assert_eq!(session.filter(&[1, 2]), vec![1]);
        assert_eq!(session.filter(&[1, 2]), vec![1]);
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        assert!(!session.is_cached());
    }

    #[test]
    fn test_filter_cache_verdicts() {
        let mut cache = FilterCache::new();
        cache.remember(&[1, 2, 3], &[2]);
        assert!(cache.is_allowed(2));
        assert!(!cache.is_allowed(1));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.exclude_known(&[1, 2, 4]), vec![4]);
    }

    #[test]
    fn test_empty_batch() {
        let never = |_: NodeId| false;
        let mut session = FilterSession::cached(&never);
        assert!(session.filter(&[]).is_empty());
        assert_eq!(session.evaluations(), 0);
    }
}
