//! Best-first search within one layer.
//!
//! Two heaps drive the search: an expansion frontier with the closest
//! candidate on top and a bounded result set with the farthest result on top.
//! Both start from a single entry node. The search ends when the frontier
//! runs dry or when the result set is full and the next candidate is farther
//! than everything in it.

use super::costs::TravelingCosts;
use super::heap::BinaryHeap;
use super::visited::VisitedSet;
use super::{Graph, Neighbor, NodeId};
use crate::distance::Distance;
use crate::filter::FilterSession;
use std::cmp::Ordering;

type Comparer<D> = fn(&Neighbor<D>, &Neighbor<D>) -> Ordering;

fn closer_on_top<D: PartialOrd>(a: &Neighbor<D>, b: &Neighbor<D>) -> Ordering {
    b.cmp_closeness(a)
}

fn farther_on_top<D: PartialOrd>(a: &Neighbor<D>, b: &Neighbor<D>) -> Ordering {
    a.cmp_closeness(b)
}

/// Outcome of one layer search.
#[derive(Debug, Clone)]
pub struct LayerSearch<D> {
    /// Up to `k` nodes, in no particular order.
    pub nodes: Vec<Neighbor<D>>,
    /// Number of candidates whose neighbor lists were scanned. The candidate
    /// that ends the search is not counted. This is not the number of visited
    /// nodes; for that see the distance computations of the cost cache.
    pub expanded: usize,
}

impl<D: PartialOrd + Copy> LayerSearch<D> {
    /// Closest node found, if any.
    pub fn closest(&self) -> Option<Neighbor<D>> {
        self.nodes
            .iter()
            .copied()
            .min_by(|a, b| a.cmp_closeness(b))
    }
}

/// Scratch state for layer searches, reusable across calls.
pub struct Searcher<D> {
    visited: VisitedSet,
    expansion: BinaryHeap<Neighbor<D>, Comparer<D>>,
    results: BinaryHeap<Neighbor<D>, Comparer<D>>,
    ids: Vec<NodeId>,
}

impl<D: PartialOrd + Copy> Searcher<D> {
    /// Creates a searcher sized for a graph of `capacity` nodes.
    pub fn new(capacity: usize) -> Self {
        Self {
            visited: VisitedSet::with_capacity(capacity),
            expansion: BinaryHeap::new(closer_on_top::<D> as Comparer<D>),
            results: BinaryHeap::new(farther_on_top::<D> as Comparer<D>),
            ids: Vec::new(),
        }
    }

    /// Searches `layer` for the `k` nodes closest to the target of `costs`,
    /// starting from `entry`.
    ///
    /// With a filter session, once the result set is full it is narrowed to
    /// admitted ids before each new neighbor is considered. Results gathered
    /// before the set first fills are not checked here, so callers apply the
    /// session once more to the returned nodes.
    pub fn search_layer<T, M>(
        &mut self,
        graph: &Graph,
        entry: NodeId,
        costs: &mut TravelingCosts<'_, T, M>,
        layer: usize,
        k: usize,
        mut filter: Option<&mut FilterSession<'_>>,
    ) -> LayerSearch<D>
    where
        M: Distance<T, Output = D>,
    {
        if k == 0 {
            return LayerSearch {
                nodes: Vec::new(),
                expanded: 0,
            };
        }

        self.visited.reset(graph.len());
        self.expansion.clear();
        self.results.clear();

        let seed = Neighbor {
            id: entry,
            distance: costs.from(entry),
        };
        self.visited.insert(entry);
        self.expansion.push(seed);
        self.results.push(seed);

        let mut expanded = 0;
        while let Some(candidate) = self.expansion.pop() {
            if self.results.len() >= k {
                if let Some(farthest) = self.results.peek() {
                    if candidate.is_farther_than(farthest) {
                        break;
                    }
                }
            }

            for &id in graph.neighbors(candidate.id, layer).iter() {
                if !self.visited.insert(id) {
                    continue;
                }

                if let Some(session) = filter.as_deref_mut() {
                    if self.results.len() >= k {
                        self.retain_admitted(session);
                    }
                }

                let neighbor = Neighbor {
                    id,
                    distance: costs.from(id),
                };
                let admit = self.results.len() < k
                    || self
                        .results
                        .peek()
                        .map_or(true, |farthest| neighbor.is_closer_than(farthest));
                if admit {
                    self.expansion.push(neighbor);
                    self.results.push(neighbor);
                    if self.results.len() > k {
                        self.results.pop();
                    }
                }
            }

            expanded += 1;
        }

        self.expansion.clear();
        self.visited.clear();

        LayerSearch {
            nodes: self.results.drain().collect(),
            expanded,
        }
    }

    fn retain_admitted(&mut self, session: &mut FilterSession<'_>) {
        self.ids.clear();
        self.ids.extend(self.results.iter().map(|n| n.id));
        let mut admitted = session.filter(&self.ids);
        if admitted.len() == self.ids.len() {
            return;
        }
        admitted.sort_unstable();
        self.results
            .retain(|n| admitted.binary_search(&n.id).is_ok());
    }
}
