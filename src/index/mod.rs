//! The HNSW index: items, graph, parameters, random source and distance.
//!
//! Items are appended in insertion order and a node's id is its position.
//! Insertion takes `&mut self`; searches take `&self`, carry their own
//! scratch state and may run on any number of threads at once.
//!
//! # Example
//!
//! ```
//! use smallworld::{DistanceMetric, HnswIndex, Parameters};
//!
//! let mut index = HnswIndex::with_seed(Parameters::new(8), DistanceMetric::Euclidean, 7).unwrap();
//! index.add_items(vec![vec![0.0f32, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//!
//! let results = index.knn_search(&vec![0.1, 0.1], 2).unwrap();
//! assert_eq!(results[0].0, 0);
//! ```

pub mod params;

pub use params::Parameters;

use crate::constants::{hnsw, limits::MAX_NODES};
use crate::distance::Distance;
use crate::error::{HnswError, Result};
use crate::filter::{Filter, FilterSession};
use crate::graph::constructor::{random_level, GraphConstructor};
use crate::graph::costs::TravelingCosts;
use crate::graph::searcher::Searcher;
use crate::graph::{sort_by_closeness, EntryPoint, Graph, NodeId};
use crate::metrics::{check_health, GraphStatistics, HealthStatus, SearchStatistics, SearchStatsBuilder};
use crate::persistence;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::ops::Range;
use std::path::Path;
use std::time::Instant;

/// Per-query knobs for [`HnswIndex::knn_search_with`].
#[derive(Clone, Copy)]
pub struct SearchOptions<'f> {
    /// Layer 0 breadth. Falls back to the index's `ef_search`; never below `k`.
    pub ef: Option<usize>,
    /// Only ids admitted by this filter are returned.
    pub filter: Option<&'f dyn Filter>,
    /// Remember filter verdicts for the duration of the query.
    pub cache_filter: bool,
}

impl Default for SearchOptions<'_> {
    fn default() -> Self {
        Self {
            ef: None,
            filter: None,
            cache_filter: true,
        }
    }
}

impl<'f> SearchOptions<'f> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = Some(ef);
        self
    }

    pub fn with_filter(mut self, filter: &'f dyn Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Ask the filter about every id each time it is consulted.
    pub fn without_filter_cache(mut self) -> Self {
        self.cache_filter = false;
        self
    }
}

/// Results of one search together with its statistics.
#[derive(Debug, Clone)]
pub struct SearchOutcome<D> {
    /// `(id, distance)` pairs, nearest first.
    pub results: Vec<(NodeId, D)>,
    pub statistics: SearchStatistics,
}

/// Approximate nearest neighbor index over items of type `T`.
pub struct HnswIndex<T, M: Distance<T>, R = StdRng> {
    items: Vec<T>,
    graph: Graph,
    params: Parameters,
    metric: M,
    rng: R,
    constructor: GraphConstructor<M::Output>,
    ef_search: usize,
}

impl<T, M: Distance<T>> HnswIndex<T, M, StdRng> {
    /// Creates an empty index with an entropy-seeded generator.
    pub fn new(params: Parameters, metric: M) -> Result<Self> {
        Self::with_rng(params, metric, StdRng::from_entropy())
    }

    /// Creates an empty index whose level draws are reproducible.
    pub fn with_seed(params: Parameters, metric: M, seed: u64) -> Result<Self> {
        Self::with_rng(params, metric, StdRng::seed_from_u64(seed))
    }
}

impl<T, M: Distance<T>, R: Rng> HnswIndex<T, M, R> {
    /// Creates an empty index drawing node levels from `rng`.
    pub fn with_rng(params: Parameters, metric: M, rng: R) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            items: Vec::with_capacity(params.initial_capacity),
            graph: Graph::with_capacity(params.initial_capacity),
            constructor: GraphConstructor::new(&params),
            params,
            metric,
            rng,
            ef_search: hnsw::DEFAULT_EF_SEARCH,
        })
    }

    /// Inserts one item and returns its id.
    pub fn insert(&mut self, item: T) -> Result<NodeId> {
        self.check_capacity(1)?;
        Ok(self.insert_unchecked(item))
    }

    /// Inserts items in order and returns the ids they received.
    pub fn add_items<I>(&mut self, items: I) -> Result<Range<NodeId>>
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        self.check_capacity(items.len())?;

        let start = Instant::now();
        let first = self.items.len();
        self.items.reserve(items.len());
        for item in items {
            self.insert_unchecked(item);
        }
        tracing::debug!(
            added = self.items.len() - first,
            total = self.items.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "inserted batch"
        );
        Ok(first..self.items.len())
    }

    fn insert_unchecked(&mut self, item: T) -> NodeId {
        let layer = random_level(self.rng.gen(), self.params.level_lambda, self.params.max_level);
        self.items.push(item);
        let report =
            self.constructor
                .insert(&mut self.graph, &self.items, &self.metric, &self.params, layer);
        report.id
    }

    fn check_capacity(&self, additional: usize) -> Result<()> {
        let attempted = self.items.len().saturating_add(additional);
        if attempted > MAX_NODES {
            return Err(HnswError::capacity_exceeded(attempted, MAX_NODES));
        }
        Ok(())
    }
}

impl<T, M: Distance<T>, R> HnswIndex<T, M, R> {
    /// The `k` nearest items to `query` as `(id, distance)`, nearest first.
    pub fn knn_search(&self, query: &T, k: usize) -> Result<Vec<(NodeId, M::Output)>> {
        Ok(self
            .knn_search_with(query, k, &SearchOptions::default())?
            .results)
    }

    /// Like [`HnswIndex::knn_search`], returning only ids admitted by `filter`.
    pub fn knn_search_filtered(
        &self,
        query: &T,
        k: usize,
        filter: &dyn Filter,
    ) -> Result<Vec<(NodeId, M::Output)>> {
        let options = SearchOptions::default().with_filter(filter);
        Ok(self.knn_search_with(query, k, &options)?.results)
    }

    /// Full search: descends greedily to layer 1, then searches layer 0 with
    /// breadth `max(k, ef)`.
    pub fn knn_search_with(
        &self,
        query: &T,
        k: usize,
        options: &SearchOptions<'_>,
    ) -> Result<SearchOutcome<M::Output>> {
        if k == 0 {
            return Err(HnswError::invalid_parameter("k must be at least 1"));
        }
        let start = Instant::now();
        let mut stats = SearchStatsBuilder::new();

        let Some(entry) = self.graph.entry_point() else {
            stats.set_query_time(start.elapsed());
            return Ok(SearchOutcome {
                results: Vec::new(),
                statistics: stats.build(),
            });
        };

        let mut costs = TravelingCosts::new(&self.items, &self.metric, query);
        let mut searcher = Searcher::new(self.graph.len());
        let mut current = entry.id;
        for layer in (1..=entry.layer).rev() {
            let found = searcher.search_layer(&self.graph, current, &mut costs, layer, 1, None);
            stats.descended(found.expanded);
            if let Some(closest) = found.closest() {
                current = closest.id;
            }
        }

        let ef = options.ef.unwrap_or(self.ef_search).max(k);
        let mut session = options
            .filter
            .map(|filter| FilterSession::new(filter, options.cache_filter));
        let found = searcher.search_layer(&self.graph, current, &mut costs, 0, ef, session.as_mut());
        stats.bottom_layer(ef, found.expanded);

        let mut nodes = found.nodes;
        if let Some(session) = session.as_mut() {
            let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
            let mut admitted = session.filter(&ids);
            admitted.sort_unstable();
            nodes.retain(|n| admitted.binary_search(&n.id).is_ok());
            stats.set_filter_evaluations(session.evaluations());
        }
        sort_by_closeness(&mut nodes);
        nodes.truncate(k);

        stats.set_distance_computations(costs.computations());
        stats.set_query_time(start.elapsed());
        Ok(SearchOutcome {
            results: nodes.into_iter().map(|n| (n.id, n.distance)).collect(),
            statistics: stats.build(),
        })
    }

    /// Searches every query in parallel.
    pub fn knn_search_batch(&self, queries: &[T], k: usize) -> Result<Vec<Vec<(NodeId, M::Output)>>>
    where
        T: Sync,
        R: Sync,
    {
        queries
            .par_iter()
            .map(|query| self.knn_search(query, k))
            .collect()
    }

    /// Encodes the graph topology and parameters. Items are not included.
    pub fn serialize_graph(&self) -> Result<Vec<u8>> {
        let bytes = persistence::encode_graph(&self.graph, &self.params)?;
        tracing::info!(nodes = self.graph.len(), bytes = bytes.len(), "serialized graph");
        Ok(bytes)
    }

    /// Writes [`HnswIndex::serialize_graph`] output to `path`.
    pub fn save_graph(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::write_graph_file(path, &self.serialize_graph()?)
    }

    /// Rebuilds an index from serialized topology and the same items, in the
    /// same order, that it was built over.
    pub fn deserialize_graph(items: Vec<T>, metric: M, rng: R, bytes: &[u8]) -> Result<Self> {
        let (graph, params) = persistence::decode_graph(bytes, items.len())?;
        tracing::info!(
            nodes = graph.len(),
            top_layer = graph.entry_point().map_or(0, |ep| ep.layer),
            "deserialized graph"
        );
        Ok(Self {
            items,
            constructor: GraphConstructor::with_capacity(&params, graph.len()),
            graph,
            params,
            metric,
            rng,
            ef_search: hnsw::DEFAULT_EF_SEARCH,
        })
    }

    /// Reads a graph written by [`HnswIndex::save_graph`].
    pub fn load_graph(items: Vec<T>, metric: M, rng: R, path: impl AsRef<Path>) -> Result<Self> {
        let bytes = persistence::read_graph_file(path)?;
        Self::deserialize_graph(items, metric, rng, &bytes)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: NodeId) -> Option<&T> {
        self.items.get(id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Neighbors of `id` at `layer`, or `None` if the node does not reach it.
    pub fn neighbors(&self, id: NodeId, layer: usize) -> Option<Vec<NodeId>> {
        let top = self.graph.node_layer(id)?;
        (layer <= top).then(|| self.graph.neighbors(id, layer).to_vec())
    }

    pub fn node_layer(&self, id: NodeId) -> Option<usize> {
        self.graph.node_layer(id)
    }

    pub fn entry_point(&self) -> Option<EntryPoint> {
        self.graph.entry_point()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn ef_search(&self) -> usize {
        self.ef_search
    }

    /// Set the default layer 0 breadth. The effective breadth is never
    /// below `k`.
    pub fn set_ef_search(&mut self, ef: usize) {
        self.ef_search = ef;
    }

    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics::collect(&self.graph)
    }

    pub fn health_check(&self) -> HealthStatus {
        check_health(&self.graph, &self.params)
    }
}
