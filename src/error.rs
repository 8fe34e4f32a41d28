//! Error types for smallworld operations.
//!
//! Construction and search report configuration problems synchronously, and
//! graph decoding reports every malformed, mismatched or inconsistent input as
//! a format error so no partially decoded index is ever returned.

use std::io;
use thiserror::Error;

/// Result type alias using [`HnswError`].
pub type Result<T> = std::result::Result<T, HnswError>;

/// Errors that can occur while building, searching or persisting a graph.
#[derive(Error, Debug)]
pub enum HnswError {
    /// Invalid parameter value provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Serialized graph has an invalid or unrecognized layout.
    #[error("invalid graph format: {0}")]
    InvalidFormat(String),

    /// Serialized graph was written by a newer format version.
    #[error("unsupported format version {found} (max supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the header.
        found: u32,
        /// Highest version this build can read.
        supported: u32,
    },

    /// Checksum verification failed while decoding.
    #[error("checksum mismatch: graph data may be corrupted")]
    ChecksumMismatch,

    /// The supplied items do not match the node count recorded in the graph.
    #[error("node count mismatch: graph has {expected} nodes, {actual} items supplied")]
    NodeCountMismatch {
        /// Node count recorded in the serialized graph.
        expected: usize,
        /// Number of items supplied by the caller.
        actual: usize,
    },

    /// A neighbor list references a node that does not exist.
    #[error("node {node} links to nonexistent node {neighbor} at layer {layer}")]
    DanglingNeighbor {
        /// Node owning the neighbor list.
        node: usize,
        /// Layer of the neighbor list.
        layer: usize,
        /// Offending neighbor id.
        neighbor: usize,
    },

    /// Node ids are persisted as `u32`, which bounds the graph size.
    #[error("capacity exceeded: attempted to hold {attempted} nodes, limit is {limit}")]
    CapacityExceeded {
        /// Node count the operation would have produced.
        attempted: usize,
        /// Maximum node count supported.
        limit: usize,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error while encoding or decoding the parameter block.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl HnswError {
    /// Creates a new `InvalidParameter` error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates a new `InvalidFormat` error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Creates a new `NodeCountMismatch` error.
    pub fn node_count_mismatch(expected: usize, actual: usize) -> Self {
        Self::NodeCountMismatch { expected, actual }
    }

    /// Creates a new `DanglingNeighbor` error.
    pub fn dangling_neighbor(node: usize, layer: usize, neighbor: usize) -> Self {
        Self::DanglingNeighbor {
            node,
            layer,
            neighbor,
        }
    }

    /// Creates a new `CapacityExceeded` error.
    pub fn capacity_exceeded(attempted: usize, limit: usize) -> Self {
        Self::CapacityExceeded { attempted, limit }
    }

    /// Returns true for errors raised while decoding a serialized graph.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::UnsupportedVersion { .. }
                | Self::ChecksumMismatch
                | Self::NodeCountMismatch { .. }
                | Self::DanglingNeighbor { .. }
                | Self::Serialization(_)
        )
    }
}

impl From<bincode::Error> for HnswError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
