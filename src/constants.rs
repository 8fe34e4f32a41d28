//! Named constants for configuration values.
//!
//! Default parameters and hard limits are collected here so they are easy to
//! find and tune.

/// Defaults for graph construction.
pub mod hnsw {
    /// Default M parameter (max connections per node above layer 0).
    pub const DEFAULT_M: usize = 16;

    /// Default ef_construction (beam width during build).
    pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

    /// Default cap on the layer a node may be assigned to.
    pub const DEFAULT_MAX_LEVEL: usize = 16;

    /// Highest configurable max level. Level draws beyond this carry no
    /// navigational value for any realistic node count.
    pub const MAX_LEVEL_LIMIT: usize = 64;

    /// Default search breadth. The effective breadth is `max(ef_search, k)`.
    pub const DEFAULT_EF_SEARCH: usize = 0;

    /// Node storage reserved up front by a fresh index.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;
}

/// Constants for the construction-time node pair distance cache.
pub mod cache {
    /// Default number of slots. Rounded up to a power of two.
    pub const DEFAULT_DISTANCE_CACHE_SLOTS: usize = 1 << 16;

    /// Inline capacity of neighbor lists before they spill to the heap.
    pub const INLINE_NEIGHBORS: usize = 32;
}

/// Constants for resource limits.
pub mod limits {
    /// Node ids and neighbor counts are persisted as `u32`.
    pub const MAX_NODES: usize = u32::MAX as usize;

    /// Largest neighbor cap accepted for `m` and `m0`.
    pub const MAX_LINKS: usize = 1 << 16;

    /// Largest node reservation a fresh index makes up front.
    pub const MAX_INITIAL_CAPACITY: usize = 1 << 24;

    /// Largest node pair distance cache, in slots.
    pub const MAX_DISTANCE_CACHE_SLOTS: usize = 1 << 24;
}
