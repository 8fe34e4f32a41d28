//! Dataset utilities for generating and evaluating vector search.
//!
//! Ground truth comes from an exhaustive scan, which only serves as the
//! reference when measuring recall.

use crate::distance::{normalize, DistanceMetric};
use crate::graph::{sort_by_closeness, Neighbor, NodeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashSet;

/// Vectors, queries, and ground truth for evaluation.
pub struct Dataset {
    pub vectors: Vec<Vec<f32>>,
    pub queries: Vec<Vec<f32>>,
    /// For each query, ids of its nearest vectors, nearest first.
    pub ground_truth: Vec<Vec<NodeId>>,
}

impl Dataset {
    /// Generate a random synthetic dataset with components uniform in
    /// `[-1, 1)`. The same seed always yields the same data.
    pub fn generate(n_vectors: usize, n_queries: usize, dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut draw = |count: usize| -> Vec<Vec<f32>> {
            (0..count)
                .map(|_| (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
                .collect()
        };
        let vectors = draw(n_vectors);
        let queries = draw(n_queries);

        Self {
            vectors,
            queries,
            ground_truth: Vec::new(),
        }
    }

    /// Like [`Dataset::generate`] with every vector scaled to unit length,
    /// for use with [`DistanceMetric::CosineUnit`].
    pub fn generate_normalized(n_vectors: usize, n_queries: usize, dim: usize, seed: u64) -> Self {
        let mut dataset = Self::generate(n_vectors, n_queries, dim, seed);
        for v in dataset.vectors.iter_mut().chain(dataset.queries.iter_mut()) {
            normalize(v);
        }
        dataset
    }

    /// Compute the `k` exact nearest neighbors of every query under `metric`.
    pub fn compute_ground_truth(&mut self, k: usize, metric: DistanceMetric) {
        let vectors = &self.vectors;
        self.ground_truth = self
            .queries
            .par_iter()
            .map(|query| exact_knn(vectors, query, k, metric))
            .collect();
    }
}

/// Exhaustive k-nearest-neighbor scan, nearest first, ties by lower id.
pub fn exact_knn(vectors: &[Vec<f32>], query: &[f32], k: usize, metric: DistanceMetric) -> Vec<NodeId> {
    let mut scored: Vec<Neighbor<f32>> = vectors
        .iter()
        .enumerate()
        .map(|(id, v)| Neighbor {
            id,
            distance: metric.compute(query, v),
        })
        .collect();
    sort_by_closeness(&mut scored);
    scored.into_iter().take(k).map(|n| n.id).collect()
}

/// Compute recall@k between predicted and ground truth results.
///
/// Recall is the fraction of true nearest neighbors that were found.
/// Returns a value between 0.0 and 1.0.
pub fn recall_at_k(predicted: &[NodeId], ground_truth: &[NodeId], k: usize) -> f32 {
    if k == 0 {
        return 1.0;
    }
    let pred_set: HashSet<NodeId> = predicted.iter().take(k).copied().collect();
    let truth_set: HashSet<NodeId> = ground_truth.iter().take(k).copied().collect();

    let intersection = pred_set.intersection(&truth_set).count();
    intersection as f32 / k as f32
}
