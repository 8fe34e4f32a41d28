//! Graph construction: level assignment, descent and linking.
//!
//! A new node first descends greedily from the entry point through the layers
//! above its own level. From its level down to 0 it runs a wider search,
//! picks neighbors with the configured selection policy and links both ways.
//! An existing neighbor pushed over its cap gets its whole list re-selected
//! against itself and replaced.

use super::costs::{DistanceCache, PairDistances, TravelingCosts};
use super::searcher::Searcher;
use super::select::{
    expand_candidates, select_heuristic, select_simple, HeuristicOptions, NeighbourSelection,
};
use super::{sort_by_closeness, EntryPoint, Graph, Links, Neighbor, NodeId};
use crate::distance::Distance;
use crate::index::Parameters;

/// Maps a uniform draw `u` in `[0, 1)` to a node level:
/// `min(max_level, floor(-ln(u) * level_lambda))`.
pub fn random_level(u: f64, level_lambda: f64, max_level: usize) -> usize {
    let level = (-u.ln() * level_lambda).floor();
    if level.is_nan() {
        return 0;
    }
    (level as usize).min(max_level)
}

/// What a single insertion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertReport {
    pub id: NodeId,
    pub layer: usize,
    /// Whether the node became the new entry point.
    pub promoted: bool,
    /// Candidates expanded across all layer searches.
    pub expanded: usize,
    /// Distance evaluations, excluding cache hits.
    pub distance_computations: usize,
}

/// Scratch state carried across insertions.
pub struct GraphConstructor<D> {
    searcher: Searcher<D>,
    pair_cache: Option<DistanceCache<D>>,
}

impl<D: PartialOrd + Copy> GraphConstructor<D> {
    pub fn new(params: &Parameters) -> Self {
        Self::with_capacity(params, params.initial_capacity)
    }

    /// Scratch state sized for a graph of `capacity` nodes.
    pub fn with_capacity(params: &Parameters, capacity: usize) -> Self {
        Self {
            searcher: Searcher::new(capacity),
            pair_cache: params
                .enable_distance_cache
                .then(|| DistanceCache::new(params.distance_cache_size)),
        }
    }

    /// Node pair cache, when enabled.
    pub fn distance_cache(&self) -> Option<&DistanceCache<D>> {
        self.pair_cache.as_ref()
    }

    /// Inserts the last element of `items` as node `graph.len()` with top
    /// layer `layer`.
    pub fn insert<T, M>(
        &mut self,
        graph: &mut Graph,
        items: &[T],
        metric: &M,
        params: &Parameters,
        layer: usize,
    ) -> InsertReport
    where
        M: Distance<T, Output = D>,
    {
        debug_assert_eq!(items.len(), graph.len() + 1);
        let id = graph.push_node(layer);

        let Some(entry) = graph.entry_point() else {
            graph.set_entry_point(EntryPoint { id, layer });
            tracing::debug!(node = id, layer, "first node becomes entry point");
            return InsertReport {
                id,
                layer,
                promoted: true,
                expanded: 0,
                distance_computations: 0,
            };
        };

        let mut costs = TravelingCosts::new(items, metric, &items[id]);
        let mut pairs = PairDistances::new(items, metric, self.pair_cache.as_mut());
        let mut current = entry.id;
        let mut expanded = 0;

        for level in (layer + 1..=entry.layer).rev() {
            let found = self
                .searcher
                .search_layer(graph, current, &mut costs, level, 1, None);
            expanded += found.expanded;
            if let Some(closest) = found.closest() {
                current = closest.id;
            }
        }

        for level in (0..=layer.min(entry.layer)).rev() {
            let found = self.searcher.search_layer(
                graph,
                current,
                &mut costs,
                level,
                params.ef_construction,
                None,
            );
            expanded += found.expanded;

            let mut candidates = found.nodes;
            sort_by_closeness(&mut candidates);
            if let Some(closest) = candidates.first() {
                current = closest.id;
            }

            let cap = params.layer_capacity(level);
            if params.expand_best_selection
                && params.neighbour_selection == NeighbourSelection::Heuristic
            {
                expand_candidates(graph, level, id, &mut candidates, |n| costs.from(n));
            }
            let chosen = select(&candidates, cap, params, |a, b| pairs.between(a, b));
            graph.set_neighbors(id, level, chosen.iter().map(|n| n.id).collect());

            for neighbor in &chosen {
                let degree = graph.add_neighbor(neighbor.id, level, id);
                if degree > cap {
                    prune(graph, neighbor.id, level, cap, params, &mut pairs);
                }
            }
            tracing::trace!(node = id, level, links = chosen.len(), "linked node");
        }

        let promoted = layer > entry.layer;
        if promoted {
            graph.set_entry_point(EntryPoint { id, layer });
            tracing::debug!(
                node = id,
                layer,
                previous = entry.id,
                "entry point promoted"
            );
        }

        InsertReport {
            id,
            layer,
            promoted,
            expanded,
            distance_computations: costs.computations() + pairs.computations(),
        }
    }
}

fn select<D, P>(candidates: &[Neighbor<D>], m: usize, params: &Parameters, between: P) -> Vec<Neighbor<D>>
where
    D: PartialOrd + Copy,
    P: FnMut(NodeId, NodeId) -> D,
{
    match params.neighbour_selection {
        NeighbourSelection::Simple => select_simple(candidates, m),
        NeighbourSelection::Heuristic => {
            let options = HeuristicOptions {
                keep_pruned_connections: params.keep_pruned_connections,
            };
            select_heuristic(candidates, m, options, between)
        }
    }
}

/// Re-selects the neighbors of `node` at `layer` against `node` itself and
/// replaces the list.
fn prune<T, M>(
    graph: &Graph,
    node: NodeId,
    layer: usize,
    cap: usize,
    params: &Parameters,
    pairs: &mut PairDistances<'_, T, M>,
) where
    M: Distance<T>,
{
    let mut candidates: Vec<Neighbor<M::Output>> = graph
        .neighbors(node, layer)
        .iter()
        .map(|&id| Neighbor {
            id,
            distance: pairs.between(node, id),
        })
        .collect();
    sort_by_closeness(&mut candidates);

    let kept = select(&candidates, cap, params, |a, b| pairs.between(a, b));
    let links: Links = kept.iter().map(|n| n.id).collect();
    graph.set_neighbors(node, layer, links);
}
