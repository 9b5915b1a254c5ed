//! Assembly graph contract consumed by the overlapper, and an in-memory
//! implementation of it.

use crate::canonical::OverlapSpec;
use crate::types::{ChunkId, EdgeId, LengthEstimate, Orientation};
use std::collections::HashMap;
use thiserror::Error;

/// Phred score assumed for chunks loaded without per-base qualities.
pub const DEFAULT_PHRED: u8 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Unknown chunk: {0}")]
    UnknownChunk(ChunkId),

    #[error("Quality length {quality} does not match sequence length {sequence}")]
    QualityLength { sequence: usize, quality: usize },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// An edge of the assembly graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub id_a: ChunkId,
    pub id_b: ChunkId,
    pub orientation: Orientation,
    /// Gap between the chunks; negative means they overlap.
    pub distance: LengthEstimate,
    pub quality: f32,
    pub is_overlap: bool,
    pub a_contains_b: bool,
    pub b_contains_a: bool,
}

/// Everything needed to add an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    pub id_a: ChunkId,
    pub id_b: ChunkId,
    pub orientation: Orientation,
    pub distance: LengthEstimate,
    pub quality: f32,
    pub is_overlap: bool,
    pub a_contains_b: bool,
    pub b_contains_a: bool,
}

/// What the overlapper needs from the assembly graph.
pub trait ChunkGraph {
    /// Size of the chunk id space; ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    fn chunk_length(&self, id: ChunkId) -> Option<LengthEstimate>;

    /// Write the consensus sequence and per-base Phred qualities of `id`
    /// into the given buffers, replacing their contents. Returns the
    /// sequence length, or `None` for an unknown chunk.
    fn consensus(&self, id: ChunkId, sequence: &mut Vec<u8>, quality: &mut Vec<u8>) -> Option<usize>;

    /// An existing overlap edge between the pair in this orientation.
    fn find_overlap_edge(&self, id_a: ChunkId, id_b: ChunkId, orientation: Orientation) -> Option<&GraphEdge>;

    fn add_edge(&mut self, edge: NewEdge) -> EdgeId;
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub name: String,
    pub length: LengthEstimate,
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
}

/// In-memory assembly graph.
///
/// Edges are indexed by the canonical form of their spec, so a lookup finds
/// an edge regardless of which operand order it was added in.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    chunks: Vec<Chunk>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<OverlapSpec, Vec<EdgeId>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk with uniform default quality.
    pub fn add_chunk(&mut self, name: impl Into<String>, sequence: Vec<u8>) -> ChunkId {
        let quality = vec![DEFAULT_PHRED; sequence.len()];
        self.push_chunk(name.into(), sequence, quality)
    }

    /// Add a chunk with explicit per-base Phred qualities.
    pub fn add_chunk_with_quality(
        &mut self,
        name: impl Into<String>,
        sequence: Vec<u8>,
        quality: Vec<u8>,
    ) -> GraphResult<ChunkId> {
        if quality.len() != sequence.len() {
            return Err(GraphError::QualityLength {
                sequence: sequence.len(),
                quality: quality.len(),
            });
        }
        Ok(self.push_chunk(name.into(), sequence, quality))
    }

    fn push_chunk(&mut self, name: String, sequence: Vec<u8>, quality: Vec<u8>) -> ChunkId {
        let id = self.chunks.len() as ChunkId;
        self.chunks.push(Chunk {
            name,
            length: LengthEstimate::new(sequence.len() as f64, 0.0),
            sequence,
            quality,
        });
        id
    }

    pub fn chunk(&self, id: ChunkId) -> GraphResult<&Chunk> {
        self.chunks.get(id as usize).ok_or(GraphError::UnknownChunk(id))
    }

    pub fn chunk_by_name(&self, name: &str) -> Option<ChunkId> {
        self.chunks.iter().position(|c| c.name == name).map(|i| i as ChunkId)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&GraphEdge> {
        self.edges.get(id)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

impl ChunkGraph for MemoryGraph {
    fn node_count(&self) -> usize {
        self.chunks.len()
    }

    fn chunk_length(&self, id: ChunkId) -> Option<LengthEstimate> {
        self.chunks.get(id as usize).map(|c| c.length)
    }

    fn consensus(&self, id: ChunkId, sequence: &mut Vec<u8>, quality: &mut Vec<u8>) -> Option<usize> {
        let chunk = self.chunks.get(id as usize)?;
        sequence.clear();
        sequence.extend_from_slice(&chunk.sequence);
        quality.clear();
        quality.extend_from_slice(&chunk.quality);
        Some(chunk.sequence.len())
    }

    fn find_overlap_edge(&self, id_a: ChunkId, id_b: ChunkId, orientation: Orientation) -> Option<&GraphEdge> {
        let key = OverlapSpec::new(id_a, id_b, orientation).canonicalize().spec;
        self.edge_index
            .get(&key)?
            .iter()
            .map(|&eid| &self.edges[eid])
            .find(|edge| edge.is_overlap)
    }

    fn add_edge(&mut self, edge: NewEdge) -> EdgeId {
        let id = self.edges.len();
        let key = OverlapSpec::new(edge.id_a, edge.id_b, edge.orientation).canonicalize().spec;
        self.edges.push(GraphEdge {
            id,
            id_a: edge.id_a,
            id_b: edge.id_b,
            orientation: edge.orientation,
            distance: edge.distance,
            quality: edge.quality,
            is_overlap: edge.is_overlap,
            a_contains_b: edge.a_contains_b,
            b_contains_a: edge.b_contains_a,
        });
        self.edge_index.entry(key).or_default().push(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap_edge(id_a: ChunkId, id_b: ChunkId, orientation: Orientation, mean: f64) -> NewEdge {
        NewEdge {
            id_a,
            id_b,
            orientation,
            distance: LengthEstimate::new(mean, 1.0),
            quality: 0.0,
            is_overlap: true,
            a_contains_b: false,
            b_contains_a: false,
        }
    }

    #[test]
    fn test_consensus_replaces_buffers() {
        let mut graph = MemoryGraph::new();
        let id = graph.add_chunk("c0", b"ACGT".to_vec());
        let mut seq = b"stale contents".to_vec();
        let mut qual = vec![1, 2, 3];
        assert_eq!(graph.consensus(id, &mut seq, &mut qual), Some(4));
        assert_eq!(seq, b"ACGT");
        assert_eq!(qual, vec![DEFAULT_PHRED; 4]);
        assert_eq!(graph.consensus(9, &mut seq, &mut qual), None);
    }

    #[test]
    fn test_quality_length_checked() {
        let mut graph = MemoryGraph::new();
        let err = graph.add_chunk_with_quality("c0", b"ACGT".to_vec(), vec![20; 3]).unwrap_err();
        assert_eq!(err, GraphError::QualityLength { sequence: 4, quality: 3 });
    }

    #[test]
    fn test_find_overlap_edge_ignores_operand_order() {
        let mut graph = MemoryGraph::new();
        graph.add_chunk("a", b"AAAA".to_vec());
        graph.add_chunk("b", b"CCCC".to_vec());
        let eid = graph.add_edge(overlap_edge(0, 1, Orientation::Normal, -2.0));

        let found = graph.find_overlap_edge(1, 0, Orientation::Antinormal).unwrap();
        assert_eq!(found.id, eid);
        assert!(graph.find_overlap_edge(0, 1, Orientation::Innie).is_none());
    }

    #[test]
    fn test_non_overlap_edges_are_not_found() {
        let mut graph = MemoryGraph::new();
        graph.add_chunk("a", b"AAAA".to_vec());
        graph.add_chunk("b", b"CCCC".to_vec());
        let mut mate_edge = overlap_edge(0, 1, Orientation::Normal, 500.0);
        mate_edge.is_overlap = false;
        graph.add_edge(mate_edge);
        assert!(graph.find_overlap_edge(0, 1, Orientation::Normal).is_none());
    }
}
