//! Multi-layer proximity graph.
//!
//! Nodes are stored in an arena indexed by [`NodeId`]. Every node owns one
//! neighbor list per layer `0..=level`. Lists sit behind a per-node
//! `parking_lot::RwLock` and are only ever replaced or appended to while the
//! write lock is held, so readers always see a complete list.
//!
//! The submodules hold the pieces that operate on the graph:
//!
//! - [`heap`]: comparator-driven binary heap used for frontiers and results
//! - [`visited`]: reusable visited-node bitset
//! - [`costs`]: per-operation distance memoization
//! - [`searcher`]: best-first layer search
//! - [`select`]: neighbor selection policies
//! - [`constructor`]: insertion, linking and pruning

pub mod constructor;
pub mod costs;
pub mod heap;
pub mod searcher;
pub mod select;
pub mod visited;

use crate::constants::cache::INLINE_NEIGHBORS;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Dense node identifier, equal to the insertion position of the item.
pub type NodeId = usize;

/// Neighbor list of one node at one layer.
pub type Links = SmallVec<[NodeId; INLINE_NEIGHBORS]>;

/// A node paired with its distance to some reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<D> {
    /// Node id.
    pub id: NodeId,
    /// Distance from the reference point.
    pub distance: D,
}

impl<D: PartialOrd> Neighbor<D> {
    /// Total closeness order: by distance, then by id. A lower id counts as
    /// closer when distances are equal or incomparable.
    #[inline]
    pub fn cmp_closeness(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
            .then(self.id.cmp(&other.id))
    }

    #[inline]
    pub fn is_closer_than(&self, other: &Self) -> bool {
        self.cmp_closeness(other) == Ordering::Less
    }

    #[inline]
    pub fn is_farther_than(&self, other: &Self) -> bool {
        self.cmp_closeness(other) == Ordering::Greater
    }
}

/// Sorts neighbors nearest first.
pub fn sort_by_closeness<D: PartialOrd>(neighbors: &mut [Neighbor<D>]) {
    neighbors.sort_unstable_by(|a, b| a.cmp_closeness(b));
}

/// The node every search starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub id: NodeId,
    pub layer: usize,
}

#[derive(Debug)]
struct NodeConnections {
    layers: Vec<Links>,
}

/// Layered adjacency lists plus the entry point.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<RwLock<NodeConnections>>,
    entry_point: Option<EntryPoint>,
}

impl Graph {
    /// Fixed storage per node, excluding its neighbor lists.
    pub(crate) const NODE_BYTES: usize = std::mem::size_of::<RwLock<NodeConnections>>();

    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            entry_point: None,
        }
    }

    /// Rebuilds a graph from decoded adjacency lists.
    ///
    /// No validation happens here; the decoder checks every invariant first.
    pub(crate) fn from_layers(layers: Vec<Vec<Links>>, entry_point: Option<EntryPoint>) -> Self {
        Self {
            nodes: layers
                .into_iter()
                .map(|layers| RwLock::new(NodeConnections { layers }))
                .collect(),
            entry_point,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entry_point(&self) -> Option<EntryPoint> {
        self.entry_point
    }

    pub(crate) fn set_entry_point(&mut self, entry_point: EntryPoint) {
        self.entry_point = Some(entry_point);
    }

    /// Highest layer of `id`, or `None` if the node does not exist.
    pub fn node_layer(&self, id: NodeId) -> Option<usize> {
        self.nodes
            .get(id)
            .map(|node| node.read().layers.len().saturating_sub(1))
    }

    /// Appends a node spanning layers `0..=layer` with empty lists.
    pub(crate) fn push_node(&mut self, layer: usize) -> NodeId {
        let id = self.nodes.len();
        let layers = (0..=layer).map(|_| Links::new()).collect();
        self.nodes.push(RwLock::new(NodeConnections { layers }));
        id
    }

    /// Snapshot of the neighbors of `id` at `layer`. Empty when the node does
    /// not reach that layer.
    pub fn neighbors(&self, id: NodeId, layer: usize) -> Links {
        let node = self.nodes[id].read();
        node.layers.get(layer).cloned().unwrap_or_default()
    }

    /// Number of neighbors of `id` at `layer`.
    pub fn degree(&self, id: NodeId, layer: usize) -> usize {
        let node = self.nodes[id].read();
        node.layers.get(layer).map_or(0, |links| links.len())
    }

    /// Replaces the whole neighbor list of `id` at `layer`.
    pub(crate) fn set_neighbors(&self, id: NodeId, layer: usize, links: Links) {
        let mut node = self.nodes[id].write();
        if let Some(slot) = node.layers.get_mut(layer) {
            *slot = links;
        }
    }

    /// Adds `neighbor` to the list of `id` at `layer` unless already present.
    /// Returns the resulting degree.
    pub(crate) fn add_neighbor(&self, id: NodeId, layer: usize, neighbor: NodeId) -> usize {
        let mut node = self.nodes[id].write();
        match node.layers.get_mut(layer) {
            Some(links) => {
                if !links.contains(&neighbor) {
                    links.push(neighbor);
                }
                links.len()
            }
            None => 0,
        }
    }

    /// Number of nodes present at each layer, from layer 0 upward.
    pub fn nodes_per_layer(&self) -> Vec<usize> {
        let mut counts = Vec::new();
        for node in &self.nodes {
            let height = node.read().layers.len();
            if counts.len() < height {
                counts.resize(height, 0);
            }
            for count in counts.iter_mut().take(height) {
                *count += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closeness_breaks_ties_by_id() {
        let a = Neighbor { id: 1, distance: 0.5f32 };
        let b = Neighbor { id: 2, distance: 0.5f32 };
        assert!(a.is_closer_than(&b));
        assert!(b.is_farther_than(&a));
        assert_eq!(a.cmp_closeness(&a), Ordering::Equal);
    }

    #[test]
    fn test_closeness_nan_falls_back_to_id() {
        let a = Neighbor { id: 3, distance: f32::NAN };
        let b = Neighbor { id: 7, distance: 1.0f32 };
        assert!(a.is_closer_than(&b));
    }

    #[test]
    fn test_push_node_layers() {
        let mut graph = Graph::new();
        let a = graph.push_node(0);
        let b = graph.push_node(2);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.node_layer(a), Some(0));
        assert_eq!(graph.node_layer(b), Some(2));
        assert_eq!(graph.node_layer(5), None);
        assert_eq!(graph.nodes_per_layer(), vec![2, 1, 1]);
    }

    #[test]
    fn test_neighbor_lists() {
        let mut graph = Graph::new();
        let a = graph.push_node(1);
        let b = graph.push_node(0);

        assert_eq!(graph.add_neighbor(a, 0, b), 1);
        assert_eq!(graph.add_neighbor(a, 0, b), 1);
        // b has no layer 1
        assert_eq!(graph.add_neighbor(b, 1, a), 0);
        assert!(graph.neighbors(b, 1).is_empty());

        graph.set_neighbors(a, 0, Links::from_slice(&[b, b]));
        assert_eq!(graph.degree(a, 0), 2);
    }
}
