//! Construction parameters.

use crate::constants::{cache, hnsw, limits};
use crate::error::{HnswError, Result};
use crate::graph::select::NeighbourSelection;
use serde::{Deserialize, Serialize};

/// Parameters fixed at index creation and stored alongside the graph.
///
/// ```
/// use smallworld::Parameters;
///
/// let params = Parameters::new(12).with_ef_construction(100);
/// assert_eq!(params.m0, 24);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Max neighbors per node at layers above 0.
    pub m: usize,
    /// Max neighbors per node at layer 0.
    pub m0: usize,
    /// Search breadth used to find neighbors during insertion.
    pub ef_construction: usize,
    /// Scale of the exponential level distribution.
    pub level_lambda: f64,
    /// Highest layer a node can be assigned to.
    pub max_level: usize,
    pub neighbour_selection: NeighbourSelection,
    /// Grow the heuristic's candidate set with the candidates' own neighbors.
    pub expand_best_selection: bool,
    /// Backfill heuristic selections with the closest rejected candidates.
    pub keep_pruned_connections: bool,
    /// Memoize node pair distances during construction.
    pub enable_distance_cache: bool,
    /// Slots in the node pair distance cache.
    pub distance_cache_size: usize,
    /// Node storage reserved up front.
    pub initial_capacity: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new(hnsw::DEFAULT_M)
    }
}

impl Parameters {
    /// Parameters for a given `m`, with `m0 = 2 * m` and
    /// `level_lambda = 1 / ln(m)`.
    pub fn new(m: usize) -> Self {
        let level_lambda = if m > 1 { 1.0 / (m as f64).ln() } else { 0.0 };
        Self {
            m,
            m0: m.saturating_mul(2),
            ef_construction: hnsw::DEFAULT_EF_CONSTRUCTION,
            level_lambda,
            max_level: hnsw::DEFAULT_MAX_LEVEL,
            neighbour_selection: NeighbourSelection::Heuristic,
            expand_best_selection: false,
            keep_pruned_connections: true,
            enable_distance_cache: true,
            distance_cache_size: cache::DEFAULT_DISTANCE_CACHE_SLOTS,
            initial_capacity: hnsw::DEFAULT_INITIAL_CAPACITY,
        }
    }

    pub fn with_m0(mut self, m0: usize) -> Self {
        self.m0 = m0;
        self
    }

    pub fn with_ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction;
        self
    }

    pub fn with_level_lambda(mut self, level_lambda: f64) -> Self {
        self.level_lambda = level_lambda;
        self
    }

    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn with_neighbour_selection(mut self, selection: NeighbourSelection) -> Self {
        self.neighbour_selection = selection;
        self
    }

    pub fn with_expand_best_selection(mut self, enabled: bool) -> Self {
        self.expand_best_selection = enabled;
        self
    }

    pub fn with_keep_pruned_connections(mut self, enabled: bool) -> Self {
        self.keep_pruned_connections = enabled;
        self
    }

    pub fn with_distance_cache(mut self, enabled: bool) -> Self {
        self.enable_distance_cache = enabled;
        self
    }

    pub fn with_distance_cache_size(mut self, slots: usize) -> Self {
        self.distance_cache_size = slots;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Neighbor cap at `layer`.
    #[inline]
    pub fn layer_capacity(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m0
        } else {
            self.m
        }
    }

    /// Checks every field, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.m == 0 {
            return Err(HnswError::invalid_parameter("m must be at least 1"));
        }
        if self.m0 == 0 {
            return Err(HnswError::invalid_parameter("m0 must be at least 1"));
        }
        if self.m > limits::MAX_LINKS || self.m0 > limits::MAX_LINKS {
            return Err(HnswError::invalid_parameter(format!(
                "m ({}) and m0 ({}) must not exceed {}",
                self.m,
                self.m0,
                limits::MAX_LINKS
            )));
        }
        if self.ef_construction == 0 {
            return Err(HnswError::invalid_parameter(
                "ef_construction must be at least 1",
            ));
        }
        if !self.level_lambda.is_finite() || self.level_lambda < 0.0 {
            return Err(HnswError::invalid_parameter(format!(
                "level_lambda must be finite and non-negative, got {}",
                self.level_lambda
            )));
        }
        if self.max_level > hnsw::MAX_LEVEL_LIMIT {
            return Err(HnswError::invalid_parameter(format!(
                "max_level {} exceeds limit {}",
                self.max_level,
                hnsw::MAX_LEVEL_LIMIT
            )));
        }
        if self.enable_distance_cache && self.distance_cache_size == 0 {
            return Err(HnswError::invalid_parameter(
                "distance_cache_size must be at least 1 when the cache is enabled",
            ));
        }
        if self.distance_cache_size > limits::MAX_DISTANCE_CACHE_SLOTS {
            return Err(HnswError::invalid_parameter(format!(
                "distance_cache_size {} exceeds limit {}",
                self.distance_cache_size,
                limits::MAX_DISTANCE_CACHE_SLOTS
            )));
        }
        if self.initial_capacity > limits::MAX_INITIAL_CAPACITY {
            return Err(HnswError::invalid_parameter(format!(
                "initial_capacity {} exceeds limit {}",
                self.initial_capacity,
                limits::MAX_INITIAL_CAPACITY
            )));
        }
        Ok(())
    }
}
