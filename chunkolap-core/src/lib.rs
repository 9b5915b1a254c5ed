//! chunkolap core library
//!
//! Overlap cache, overlap computation engine, quality scoring and batch
//! overlap discovery for the chunks of an assembly graph.

pub mod types;
pub mod canonical;
pub mod params;
pub mod record;
pub mod graph;
pub mod align;
pub mod cache;
pub mod engine;
pub mod quality;
pub mod edge;
pub mod scan;

// Re-export commonly used types and functions
pub use types::{ChunkId, Coord, EdgeId, LengthEstimate, Orientation};
pub use canonical::{canonicalize, Canonical, OverlapSpec};
pub use params::{check_error_rate, AlignMode, OverlapParams, ParamsError, MAX_ERROR_RATE};
pub use record::OverlapRecord;
pub use graph::{ChunkGraph, GraphEdge, GraphError, MemoryGraph, NewEdge};
pub use align::{AlignRequest, Alignment, AlignmentTrace, LocalAligner, LocalAlignerParams, PairwiseAligner, TraceOp};
pub use cache::{CacheError, CacheResult, HintAction, OverlapHint, Overlapper};
pub use engine::{
    OverlapEngine, OverlapError, OverlapOutcome, OverlapQuery, OverlapResult, ScratchBuffers, SuspicionReason,
};
pub use quality::{QualityEstimate, QualityFunction};
pub use edge::{insert_overlap_edge, InsertedEdge};
pub use scan::{run_batch_discovery, BatchReport};

/// Version information for the chunkolap core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
