//! Statistics and health checks for graph monitoring.
//!
//! # Graph Statistics
//!
//! Use [`GraphStatistics`] to understand the shape of a built graph:
//!
//! ```ignore
//! let stats = index.statistics();
//! println!("{}", stats.summary());
//! // GraphStatistics:
//! //   Nodes: 10000 (top layer 4, entry point 8121)
//! //   Nodes per layer: [10000, 623, 41, 3, 1]
//! //   Layer 0 degree: min=3, max=32, mean=17.4
//! //   Memory: 2.71 MB
//! ```
//!
//! # Search Statistics
//!
//! Use [`SearchStatistics`] to profile individual queries:
//!
//! ```ignore
//! let outcome = index.knn_search_with(&query, 10, &SearchOptions::default())?;
//! println!("{:.3}ms, {} expanded", outcome.statistics.query_time_ms(), outcome.statistics.expanded_nodes);
//! ```
//!
//! # Health Checks
//!
//! ```ignore
//! match index.health_check() {
//!     HealthStatus::Healthy => println!("graph is consistent"),
//!     HealthStatus::Warning(issues) => println!("warnings: {:?}", issues),
//!     HealthStatus::Unhealthy(issues) => println!("broken: {:?}", issues),
//! }
//! ```

use crate::constants::cache::INLINE_NEIGHBORS;
use crate::graph::{Graph, Links, NodeId};
use crate::index::Parameters;
use std::collections::VecDeque;
use std::time::Duration;

/// Health status of a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    /// Every invariant holds.
    Healthy,
    /// Searchable, but some nodes may be hard to reach.
    Warning(Vec<String>),
    /// Structural invariants are violated.
    Unhealthy(Vec<String>),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, HealthStatus::Warning(_))
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }

    /// Get the issues if any.
    pub fn issues(&self) -> Option<&[String]> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Warning(issues) | HealthStatus::Unhealthy(issues) => Some(issues),
        }
    }
}

/// Shape of a graph at one point in time.
#[derive(Clone, Debug, Default)]
pub struct GraphStatistics {
    pub node_count: usize,
    /// Layer of the entry point, 0 for an empty graph.
    pub top_layer: usize,
    pub entry_point: Option<NodeId>,
    /// Number of nodes reaching each layer, from layer 0 upward.
    pub nodes_per_layer: Vec<usize>,
    pub layer0_degree_min: usize,
    pub layer0_degree_max: usize,
    pub layer0_degree_mean: f32,
    /// Total number of directed edges over all layers.
    pub edge_count: usize,
    /// Estimated memory held by the adjacency lists, in bytes.
    pub memory_bytes: usize,
}

impl GraphStatistics {
    /// Collects statistics by walking every node.
    pub fn collect(graph: &Graph) -> Self {
        let node_count = graph.len();
        let mut stats = Self {
            node_count,
            top_layer: graph.entry_point().map_or(0, |ep| ep.layer),
            entry_point: graph.entry_point().map(|ep| ep.id),
            nodes_per_layer: graph.nodes_per_layer(),
            layer0_degree_min: if node_count == 0 { 0 } else { usize::MAX },
            ..Self::default()
        };

        let mut layer0_total = 0usize;
        for id in 0..node_count {
            let top = graph.node_layer(id).unwrap_or(0);
            stats.memory_bytes += Graph::NODE_BYTES;
            for layer in 0..=top {
                let degree = graph.degree(id, layer);
                stats.edge_count += degree;
                stats.memory_bytes += std::mem::size_of::<Links>();
                if degree > INLINE_NEIGHBORS {
                    stats.memory_bytes += degree * std::mem::size_of::<NodeId>();
                }
                if layer == 0 {
                    layer0_total += degree;
                    stats.layer0_degree_min = stats.layer0_degree_min.min(degree);
                    stats.layer0_degree_max = stats.layer0_degree_max.max(degree);
                }
            }
        }
        if node_count > 0 {
            stats.layer0_degree_mean = layer0_total as f32 / node_count as f32;
        }
        stats
    }

    /// Create a human-readable summary.
    pub fn summary(&self) -> String {
        let entry = self
            .entry_point
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        format!(
            "GraphStatistics:\n  \
             Nodes: {} (top layer {}, entry point {})\n  \
             Nodes per layer: {:?}\n  \
             Layer 0 degree: min={}, max={}, mean={:.1}\n  \
             Edges: {}\n  \
             Memory: {:.2} MB",
            self.node_count,
            self.top_layer,
            entry,
            self.nodes_per_layer,
            self.layer0_degree_min,
            self.layer0_degree_max,
            self.layer0_degree_mean,
            self.edge_count,
            self.memory_bytes as f64 / (1024.0 * 1024.0)
        )
    }
}

/// Statistics about a single search operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchStatistics {
    /// Total query execution time.
    pub query_time: Duration,
    /// Candidates expanded across all layers.
    pub expanded_nodes: usize,
    /// Distances computed between the query and nodes.
    pub distance_computations: usize,
    /// Ids handed to the filter.
    pub filter_evaluations: usize,
    /// Layers walked greedily above layer 0.
    pub layers_descended: usize,
    /// Breadth of the layer 0 search.
    pub effective_ef: usize,
}

impl SearchStatistics {
    /// Get query time in milliseconds.
    pub fn query_time_ms(&self) -> f32 {
        self.query_time.as_secs_f32() * 1000.0
    }

    /// Create a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "SearchStatistics:\n  \
             Time: {:.3}ms\n  \
             Expanded nodes: {} over {} upper layers\n  \
             Distance computations: {}\n  \
             Filter evaluations: {}\n  \
             ef: {}",
            self.query_time_ms(),
            self.expanded_nodes,
            self.layers_descended,
            self.distance_computations,
            self.filter_evaluations,
            self.effective_ef
        )
    }
}

/// Builder for collecting search statistics during a search operation.
#[derive(Default)]
pub struct SearchStatsBuilder {
    stats: SearchStatistics,
}

impl SearchStatsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one layer search above layer 0.
    pub fn descended(&mut self, expanded: usize) {
        self.stats.layers_descended += 1;
        self.stats.expanded_nodes += expanded;
    }

    /// Record the layer 0 search.
    pub fn bottom_layer(&mut self, ef: usize, expanded: usize) {
        self.stats.effective_ef = ef;
        self.stats.expanded_nodes += expanded;
    }

    pub fn set_distance_computations(&mut self, count: usize) {
        self.stats.distance_computations = count;
    }

    pub fn set_filter_evaluations(&mut self, count: usize) {
        self.stats.filter_evaluations = count;
    }

    pub fn set_query_time(&mut self, duration: Duration) {
        self.stats.query_time = duration;
    }

    pub fn build(self) -> SearchStatistics {
        self.stats
    }
}

/// Verifies structural invariants and layer 0 reachability.
///
/// Violated invariants (degree above cap, links to missing nodes or layers,
/// a misplaced entry point) make the graph unhealthy. Nodes that cannot be
/// reached from the entry point at layer 0 only produce a warning.
pub fn check_health(graph: &Graph, params: &Parameters) -> HealthStatus {
    let node_count = graph.len();
    let mut critical = Vec::new();

    let entry = match graph.entry_point() {
        Some(entry) => entry,
        None if node_count == 0 => return HealthStatus::Healthy,
        None => {
            return HealthStatus::Unhealthy(vec![format!(
                "{node_count} nodes but no entry point"
            )])
        }
    };
    if graph.node_layer(entry.id) != Some(entry.layer) {
        critical.push(format!(
            "entry point {} records layer {} but spans {:?}",
            entry.id,
            entry.layer,
            graph.node_layer(entry.id)
        ));
    }

    for id in 0..node_count {
        let top = graph.node_layer(id).unwrap_or(0);
        if top > entry.layer {
            critical.push(format!(
                "node {id} at layer {top} is above entry point layer {}",
                entry.layer
            ));
        }
        if top > params.max_level {
            critical.push(format!("node {id} exceeds max level {}", params.max_level));
        }
        for layer in 0..=top {
            let links = graph.neighbors(id, layer);
            let cap = params.layer_capacity(layer);
            if links.len() > cap {
                critical.push(format!(
                    "node {id} has {} neighbors at layer {layer}, cap is {cap}",
                    links.len()
                ));
            }
            for &n in links.iter() {
                match graph.node_layer(n) {
                    None => critical.push(format!("node {id} links to missing node {n}")),
                    Some(reach) if reach < layer => critical.push(format!(
                        "node {id} links to {n} at layer {layer}, which {n} does not reach"
                    )),
                    _ => {}
                }
            }
        }
    }

    if !critical.is_empty() {
        return HealthStatus::Unhealthy(critical);
    }

    let unreachable = node_count - reachable_at_layer0(graph, entry.id);
    if unreachable > 0 {
        return HealthStatus::Warning(vec![format!(
            "{unreachable} of {node_count} nodes unreachable from entry point at layer 0"
        )]);
    }
    HealthStatus::Healthy
}

fn reachable_at_layer0(graph: &Graph, start: NodeId) -> usize {
    let mut seen = vec![false; graph.len()];
    let mut queue = VecDeque::from([start]);
    seen[start] = true;
    let mut count = 1;
    while let Some(id) = queue.pop_front() {
        for &n in graph.neighbors(id, 0).iter() {
            if n < seen.len() && !seen[n] {
                seen[n] = true;
                count += 1;
                queue.push_back(n);
            }
        }
    }
    count
}
