//! smallworld: Hierarchical Navigable Small World graphs in Rust.
//!
//! An approximate nearest neighbor index that trades exactness for speed.
//! Items of any type are organized into a layered proximity graph under a
//! caller-supplied distance; queries walk the graph from a single entry point
//! down to the densest layer.
//!
//! # Features
//!
//! - **Generic items and distances**: any `T` with a [`Distance`] over it,
//!   closures included
//! - **Heuristic neighbor selection** with optional candidate expansion and
//!   pruned-connection backfill
//! - **Filtered search**: restrict results with closures or `RoaringBitmap`
//!   allow lists
//! - **Parallel search**: `&self` queries, batch search with Rayon
//! - **Persistence**: versioned, checksummed topology format
//!
//! # Example
//!
//! ```
//! use smallworld::{Dataset, DistanceMetric, HnswIndex, Parameters};
//!
//! let dataset = Dataset::generate(500, 5, 16, 42);
//! let mut index = HnswIndex::with_seed(Parameters::new(12), DistanceMetric::Euclidean, 1).unwrap();
//! index.add_items(dataset.vectors.clone()).unwrap();
//!
//! let neighbors = index.knn_search(&dataset.queries[0], 10).unwrap();
//! assert_eq!(neighbors.len(), 10);
//! ```

pub mod constants;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod filter;
pub mod graph;
pub mod index;
pub mod metrics;
pub mod persistence;

// Re-export commonly used types at crate root
pub use dataset::{recall_at_k, Dataset};
pub use distance::{Distance, DistanceMetric};
pub use error::{HnswError, Result};
pub use filter::{Filter, FilterCache, FilterSession};
pub use graph::select::NeighbourSelection;
pub use graph::{EntryPoint, NodeId};
pub use index::{HnswIndex, Parameters, SearchOptions, SearchOutcome};
pub use metrics::{GraphStatistics, HealthStatus, SearchStatistics};
