//! Turning computed overlaps into graph edges.

use crate::graph::{ChunkGraph, NewEdge};
use crate::record::OverlapRecord;
use crate::types::{Coord, EdgeId, LengthEstimate};

/// Variance added per base of overlap.
pub const FUDGE_FACTOR: f64 = 0.026;

/// Smallest variance given to an overlap edge.
pub const MIN_EDGE_VARIANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedEdge {
    pub id: EdgeId,
    /// An equivalent overlap edge already existed.
    pub reused: bool,
}

/// Distance estimate of an overlap of `overlap` bases.
pub fn overlap_distance(overlap: Coord) -> LengthEstimate {
    let variance = (FUDGE_FACTOR * (overlap as f64).abs()).max(MIN_EDGE_VARIANCE);
    LengthEstimate::new(-(overlap as f64), variance)
}

/// Add an overlap edge for `record`, unless an overlap edge between the same
/// chunks in the same orientation already sits within `tolerance` of the
/// implied distance.
pub fn insert_overlap_edge<G: ChunkGraph>(graph: &mut G, record: &OverlapRecord, tolerance: f64) -> InsertedEdge {
    let spec = record.spec;
    let distance = overlap_distance(record.overlap);

    if let Some(existing) = graph.find_overlap_edge(spec.id_a, spec.id_b, spec.orientation) {
        if (existing.distance.mean - distance.mean).abs() < tolerance {
            return InsertedEdge {
                id: existing.id,
                reused: true,
            };
        }
    }

    log::debug!(
        "Adding overlap edge {} {:.0} +/- {:.1}",
        spec,
        distance.mean,
        distance.std_dev()
    );
    let id = graph.add_edge(NewEdge {
        id_a: spec.id_a,
        id_b: spec.id_b,
        orientation: spec.orientation,
        distance,
        quality: record.quality,
        is_overlap: true,
        a_contains_b: record.a_contains_b,
        b_contains_a: record.b_contains_a,
    });
    InsertedEdge { id, reused: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::OverlapSpec;
    use crate::graph::MemoryGraph;
    use crate::types::Orientation;

    fn computed(overlap: Coord) -> OverlapRecord {
        OverlapRecord {
            computed: true,
            overlap,
            ..OverlapRecord::provisional(OverlapSpec::new(0, 1, Orientation::Normal), 0, 500, 0.1)
        }
    }

    fn two_chunk_graph() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph.add_chunk("a", vec![b'A'; 600]);
        graph.add_chunk("b", vec![b'C'; 600]);
        graph
    }

    #[test]
    fn test_variance_floor_and_growth() {
        assert_eq!(overlap_distance(10).variance, MIN_EDGE_VARIANCE);
        assert!(overlap_distance(400).variance > overlap_distance(200).variance);
        assert_eq!(overlap_distance(200).mean, -200.0);
    }

    #[test]
    fn test_edge_within_tolerance_is_reused() {
        let mut graph = two_chunk_graph();
        let first = insert_overlap_edge(&mut graph, &computed(200), 5.0);
        assert!(!first.reused);

        let again = insert_overlap_edge(&mut graph, &computed(204), 5.0);
        assert_eq!(again, InsertedEdge { id: first.id, reused: true });
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn test_edge_at_tolerance_is_added() {
        let mut graph = two_chunk_graph();
        let first = insert_overlap_edge(&mut graph, &computed(200), 5.0);
        let second = insert_overlap_edge(&mut graph, &computed(205), 5.0);
        assert_ne!(first.id, second.id);
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_containment_flags_carried() {
        let mut graph = two_chunk_graph();
        let mut record = computed(300);
        record.b_contains_a = true;
        let inserted = insert_overlap_edge(&mut graph, &record, 5.0);
        let edge = graph.edge(inserted.id).unwrap();
        assert!(edge.is_overlap && edge.b_contains_a && !edge.a_contains_b);
    }
}
