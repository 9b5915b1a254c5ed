//! Overlap records held by the cache.

use crate::canonical::OverlapSpec;
use crate::graph::GraphEdge;
use crate::params::EDGE_WINDOW_DELTA;
use crate::types::Coord;
use serde::{Deserialize, Serialize};

/// Everything known about the overlap of one canonical pair.
///
/// Hangs are stored in the record's own operand order and in the frame of
/// its orientation (each chunk oriented as the orientation says): `ahang`
/// is the offset of B's start relative to A's start, `bhang` the offset of
/// B's end relative to A's end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapRecord {
    pub spec: OverlapSpec,
    /// Verified by alignment (as opposed to a provisional window).
    pub computed: bool,
    /// Overlap length; zero or negative means no confirmed overlap.
    pub overlap: Coord,
    pub min_overlap: Coord,
    pub max_overlap: Coord,
    pub ahang: Coord,
    pub bhang: Coord,
    pub a_contains_b: bool,
    pub b_contains_a: bool,
    pub suspicious: bool,
    pub quality: f32,
    /// `quality` holds a Bayesian confidence rather than a raw score.
    pub has_bayesian_quality: bool,
    pub error_rate: f32,
    /// Window proposed by the upstream overlap builder rather than found by alignment.
    pub from_external_builder: bool,
    pub builder_min_overlap: Coord,
    pub builder_max_overlap: Coord,
}

impl OverlapRecord {
    /// An uncomputed record for `spec` searching `[min_overlap, max_overlap]`.
    pub fn provisional(spec: OverlapSpec, min_overlap: Coord, max_overlap: Coord, error_rate: f32) -> Self {
        Self {
            spec,
            computed: false,
            overlap: (min_overlap + max_overlap) / 2,
            min_overlap,
            max_overlap,
            ahang: 0,
            bhang: 0,
            a_contains_b: false,
            b_contains_a: false,
            suspicious: false,
            quality: 0.0,
            has_bayesian_quality: false,
            error_rate,
            from_external_builder: false,
            builder_min_overlap: min_overlap,
            builder_max_overlap: max_overlap,
        }
    }

    /// A provisional record around the distance implied by a graph edge.
    pub fn provisional_from_edge(edge: &GraphEdge, error_rate: f32) -> Self {
        let spec = OverlapSpec::new(edge.id_a, edge.id_b, edge.orientation).canonicalize().spec;
        let overlap = -edge.distance.mean as Coord;
        Self {
            overlap,
            quality: edge.quality,
            builder_min_overlap: 0,
            builder_max_overlap: 0,
            ..Self::provisional(spec, overlap - EDGE_WINDOW_DELTA, overlap + EDGE_WINDOW_DELTA, error_rate)
        }
    }

    pub fn has_overlap(&self) -> bool {
        self.overlap > 0
    }

    pub fn is_containment(&self) -> bool {
        self.a_contains_b || self.b_contains_a
    }

    /// Re-express this record for `query`, the non-canonical equivalent of
    /// its own spec: containment flags and hangs trade places. The overlap
    /// length is the average of two symmetric estimates, so it is unchanged.
    pub fn mirrored(&self, query: OverlapSpec) -> OverlapRecord {
        let mut mirrored = self.clone();
        mirrored.spec = query;
        std::mem::swap(&mut mirrored.a_contains_b, &mut mirrored.b_contains_a);
        std::mem::swap(&mut mirrored.ahang, &mut mirrored.bhang);
        mirrored
    }

    /// Present this canonical record in the caller's form of the query.
    pub fn for_query(&self, query: OverlapSpec, was_canonical: bool) -> OverlapRecord {
        if was_canonical {
            self.clone()
        } else {
            self.mirrored(query)
        }
    }

    /// Whether a cached result may answer a request for this window and
    /// error rate without recomputing.
    pub fn answers(&self, min_overlap: Coord, max_overlap: Coord, error_rate: f32) -> bool {
        self.error_rate == error_rate
            && min_overlap >= self.min_overlap
            && max_overlap <= self.max_overlap
            && min_overlap <= self.overlap
            && max_overlap >= self.overlap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Orientation;

    fn containment_record() -> OverlapRecord {
        OverlapRecord {
            computed: true,
            overlap: 180,
            ahang: 50,
            bhang: -30,
            a_contains_b: true,
            ..OverlapRecord::provisional(OverlapSpec::new(3, 7, Orientation::Normal), 150, 250, 0.1)
        }
    }

    #[test]
    fn test_mirror_swaps_flags_and_hangs() {
        let record = containment_record();
        let query = OverlapSpec::new(7, 3, Orientation::Antinormal);
        let mirrored = record.mirrored(query);
        assert_eq!(mirrored.spec, query);
        assert!(mirrored.b_contains_a);
        assert!(!mirrored.a_contains_b);
        assert_eq!((mirrored.ahang, mirrored.bhang), (-30, 50));
        assert_eq!(mirrored.overlap, record.overlap);
        assert_eq!(mirrored.mirrored(record.spec), record);
    }

    #[test]
    fn test_answers_requires_nested_window() {
        let record = containment_record();
        assert!(record.answers(160, 200, 0.1));
        assert!(!record.answers(100, 200, 0.1));
        assert!(!record.answers(160, 200, 0.06));
        // overlap outside the requested window
        assert!(!record.answers(190, 240, 0.1));
    }

    #[test]
    fn test_provisional_midpoint() {
        let record = OverlapRecord::provisional(OverlapSpec::new(1, 2, Orientation::Innie), 11, 20, 0.1);
        assert_eq!(record.overlap, 15);
        assert_eq!((record.builder_min_overlap, record.builder_max_overlap), (11, 20));
        assert!(!record.computed);
    }
}
