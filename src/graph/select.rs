//! Neighbor selection policies.
//!
//! Both policies take candidates sorted nearest first relative to a base node
//! and return at most `m` of them.

use super::{sort_by_closeness, Graph, Neighbor, NodeId};
use serde::{Deserialize, Serialize};

/// How a node picks its neighbors among search candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighbourSelection {
    /// Keep the `m` closest candidates.
    Simple,
    /// Keep candidates that are closer to the base than to any neighbor
    /// already kept.
    #[default]
    Heuristic,
}

/// Switches for [`select_heuristic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeuristicOptions {
    /// Fill remaining slots with the closest rejected candidates.
    pub keep_pruned_connections: bool,
}

/// The `m` closest candidates.
pub fn select_simple<D: Copy>(candidates: &[Neighbor<D>], m: usize) -> Vec<Neighbor<D>> {
    candidates.iter().take(m).copied().collect()
}

/// Diversity-aware selection.
///
/// Walking candidates nearest first, a candidate is kept only if its distance
/// to the base is strictly below its distance to every neighbor kept so far.
/// `between` returns the distance between two candidates.
pub fn select_heuristic<D, P>(
    candidates: &[Neighbor<D>],
    m: usize,
    options: HeuristicOptions,
    mut between: P,
) -> Vec<Neighbor<D>>
where
    D: PartialOrd + Copy,
    P: FnMut(NodeId, NodeId) -> D,
{
    let mut kept: Vec<Neighbor<D>> = Vec::with_capacity(m);
    let mut rejected: Vec<Neighbor<D>> = Vec::new();

    for candidate in candidates {
        if kept.len() >= m {
            break;
        }
        let diverse = kept
            .iter()
            .all(|chosen| candidate.distance < between(candidate.id, chosen.id));
        if diverse {
            kept.push(*candidate);
        } else {
            rejected.push(*candidate);
        }
    }

    if options.keep_pruned_connections {
        let room = m.saturating_sub(kept.len());
        kept.extend(rejected.into_iter().take(room));
    }
    kept
}

/// Adds the neighbors of every candidate at `layer` to the candidate set,
/// skipping `base` and ids already present, then re-sorts nearest first.
/// `to_base` returns the distance from a node to the base.
pub fn expand_candidates<D, B>(
    graph: &Graph,
    layer: usize,
    base: NodeId,
    candidates: &mut Vec<Neighbor<D>>,
    mut to_base: B,
) where
    D: PartialOrd + Copy,
    B: FnMut(NodeId) -> D,
{
    let mut seen: Vec<NodeId> = candidates.iter().map(|c| c.id).collect();
    seen.push(base);
    seen.sort_unstable();

    let originals: Vec<NodeId> = candidates.iter().map(|c| c.id).collect();
    for id in originals {
        for &next in graph.neighbors(id, layer).iter() {
            if let Err(pos) = seen.binary_search(&next) {
                seen.insert(pos, next);
                candidates.push(Neighbor {
                    id: next,
                    distance: to_base(next),
                });
            }
        }
    }
    sort_by_closeness(candidates);
}
