//! Serialization of graph topology.
//!
//! Only the graph is written: parameters, entry point and every neighbor
//! list. Items stay with the caller, who must supply them again, in the same
//! order, when decoding.
//!
//! # Format
//!
//! ```text
//! [HEADER 20B, see format::GraphHeader]
//! [PARAMS_LEN u32][PARAMS bincode]
//! [NODE_COUNT u32][ENTRY_POINT u32 (u32::MAX when empty)]
//! per node:  [MAX_LAYER u32]
//!   per layer 0..=MAX_LAYER:  [COUNT u32][COUNT x NEIGHBOR_ID u32]
//! ```
//!
//! Decoding validates the whole input before building anything, so a failure
//! never yields a partial graph.

mod format;

pub use format::{GraphHeader, FORMAT_VERSION, MAGIC, NO_ENTRY_POINT};

use crate::constants::limits::MAX_NODES;
use crate::error::{HnswError, Result};
use crate::graph::{EntryPoint, Graph, Links};
use crate::index::Parameters;
use format::{put_u32, ByteReader};
use std::path::Path;

/// Encodes `graph` and `params` into the versioned, checksummed format.
pub fn encode_graph(graph: &Graph, params: &Parameters) -> Result<Vec<u8>> {
    if graph.len() > MAX_NODES {
        return Err(HnswError::capacity_exceeded(graph.len(), MAX_NODES));
    }

    let params_bytes = bincode::serialize(params)?;
    let mut data = Vec::with_capacity(16 + params_bytes.len() + graph.len() * 16);
    put_u32(&mut data, params_bytes.len() as u32);
    data.extend_from_slice(&params_bytes);
    put_u32(&mut data, graph.len() as u32);
    put_u32(
        &mut data,
        graph.entry_point().map_or(NO_ENTRY_POINT, |ep| ep.id as u32),
    );

    for id in 0..graph.len() {
        let top = graph.node_layer(id).unwrap_or(0);
        put_u32(&mut data, top as u32);
        for layer in 0..=top {
            let links = graph.neighbors(id, layer);
            put_u32(&mut data, links.len() as u32);
            for &neighbor in links.iter() {
                put_u32(&mut data, neighbor as u32);
            }
        }
    }

    let header = GraphHeader::new(crc32fast::hash(&data));
    let mut out = Vec::with_capacity(GraphHeader::SIZE + data.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&data);
    Ok(out)
}

/// Decodes a graph that was built over `item_count` items.
pub fn decode_graph(bytes: &[u8], item_count: usize) -> Result<(Graph, Parameters)> {
    let result = decode_checked(bytes, item_count);
    if let Err(err) = &result {
        tracing::warn!(error = %err, len = bytes.len(), "rejected serialized graph");
    }
    result
}

fn decode_checked(bytes: &[u8], item_count: usize) -> Result<(Graph, Parameters)> {
    let data = verify_header(bytes)?;
    let mut reader = ByteReader::new(data);

    let params_len = reader.read_u32("parameter length")? as usize;
    let params: Parameters = bincode::deserialize(reader.read_bytes(params_len, "parameters")?)?;
    params
        .validate()
        .map_err(|err| HnswError::invalid_format(format!("stored parameters: {err}")))?;

    let node_count = reader.read_u32("node count")? as usize;
    if node_count != item_count {
        return Err(HnswError::node_count_mismatch(node_count, item_count));
    }

    let raw_entry = reader.read_u32("entry point")?;
    let entry_id = match (raw_entry, node_count) {
        (NO_ENTRY_POINT, 0) => None,
        (NO_ENTRY_POINT, _) => {
            return Err(HnswError::invalid_format("non-empty graph has no entry point"))
        }
        (_, 0) => return Err(HnswError::invalid_format("empty graph has an entry point")),
        (id, n) if (id as usize) < n => Some(id as usize),
        (id, _) => {
            return Err(HnswError::invalid_format(format!(
                "entry point {id} out of range"
            )))
        }
    };

    let mut nodes: Vec<Vec<Links>> = Vec::with_capacity(node_count.min(data.len() / 8));
    for id in 0..node_count {
        let top = reader.read_u32("node layer")? as usize;
        if top > params.max_level {
            return Err(HnswError::invalid_format(format!(
                "node {id} has layer {top} above max level {}",
                params.max_level
            )));
        }
        let mut layers = Vec::with_capacity(top + 1);
        for layer in 0..=top {
            let count = reader.read_u32("neighbor count")? as usize;
            let cap = params.layer_capacity(layer);
            if count > cap {
                return Err(HnswError::invalid_format(format!(
                    "node {id} has {count} neighbors at layer {layer}, cap is {cap}"
                )));
            }
            let mut links = Links::with_capacity(count.min(reader.remaining() / 4));
            for _ in 0..count {
                let neighbor = reader.read_u32("neighbor id")? as usize;
                if neighbor >= node_count {
                    return Err(HnswError::dangling_neighbor(id, layer, neighbor));
                }
                if neighbor == id || links.contains(&neighbor) {
                    return Err(HnswError::invalid_format(format!(
                        "node {id} repeats neighbor {neighbor} at layer {layer}"
                    )));
                }
                links.push(neighbor);
            }
            layers.push(links);
        }
        nodes.push(layers);
    }

    if reader.remaining() != 0 {
        return Err(HnswError::invalid_format(format!(
            "{} trailing bytes",
            reader.remaining()
        )));
    }

    let tops: Vec<usize> = nodes.iter().map(|layers| layers.len() - 1).collect();
    for (id, layers) in nodes.iter().enumerate() {
        for (layer, links) in layers.iter().enumerate() {
            if let Some(&absent) = links.iter().find(|&&n| tops[n] < layer) {
                return Err(HnswError::invalid_format(format!(
                    "node {id} links to {absent} at layer {layer}, which {absent} does not reach"
                )));
            }
        }
    }

    let entry_point = match entry_id {
        Some(id) => {
            let layer = tops[id];
            if let Some(higher) = tops.iter().position(|&top| top > layer) {
                return Err(HnswError::invalid_format(format!(
                    "entry point {id} at layer {layer} is below node {higher}"
                )));
            }
            Some(EntryPoint { id, layer })
        }
        None => None,
    };

    Ok((Graph::from_layers(nodes, entry_point), params))
}

/// Verifies the header and checksum, returning the data section.
pub(crate) fn verify_header(bytes: &[u8]) -> Result<&[u8]> {
    let header = GraphHeader::from_bytes(bytes)?;
    header.verify()?;

    let data = &bytes[GraphHeader::SIZE..];
    if crc32fast::hash(data) != header.checksum {
        return Err(HnswError::ChecksumMismatch);
    }
    Ok(data)
}

/// Writes serialized graph bytes to `path` and syncs the file.
pub fn write_graph_file(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let path = path.as_ref();
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved graph");
    Ok(())
}

/// Reads serialized graph bytes from `path`.
pub fn read_graph_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "read graph");
    Ok(bytes)
}
