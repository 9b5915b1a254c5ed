//! Batch discovery over every pending entry of the cache.
//!
//! The id space `0..node_count` is cut into `sections` ranges per axis. Each
//! (outer, inner) block pass rescans the cache and handles only the entries
//! whose smaller id falls in the outer range and larger id in the inner one,
//! which keeps the chunks touched per pass together.

use crate::align::PairwiseAligner;
use crate::cache::Overlapper;
use crate::canonical::OverlapSpec;
use crate::edge::insert_overlap_edge;
use crate::engine::{OverlapEngine, OverlapResult, ScratchBuffers, Verdict};
use crate::graph::ChunkGraph;
use crate::types::ChunkId;
use log::{debug, info, warn};
use std::ops::Range;

/// Counts from one discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Pending entries picked up.
    pub examined: usize,
    /// Entries aligned.
    pub computed: usize,
    /// Entries whose window cannot hold an overlap.
    pub rejected: usize,
    pub suspicious: usize,
    /// Overlap edges added to the graph.
    pub edges_inserted: usize,
    /// Overlap edges that already existed.
    pub edges_reused: usize,
}

/// Id range of section `index` out of `sections` over `0..node_count`.
pub fn section_bounds(index: u32, sections: u32, node_count: usize) -> Range<ChunkId> {
    let sections = u64::from(sections.max(1));
    let n = node_count as u64;
    let lo = u64::from(index) * n / sections;
    let hi = (u64::from(index) + 1) * n / sections;
    lo as ChunkId..hi as ChunkId
}

/// Compute every pending cache entry and optionally add the resulting
/// overlaps to the graph.
///
/// Entries proposed by the external builder are skipped unless
/// `force_recompute` is set, and never produce edges.
pub fn run_batch_discovery<A: PairwiseAligner, G: ChunkGraph>(
    engine: &mut OverlapEngine<A>,
    cache: &mut Overlapper,
    graph: &mut G,
    scratch: &mut ScratchBuffers,
    force_recompute: bool,
    insert_edges: bool,
) -> OverlapResult<BatchReport> {
    let sections = engine.params().sections;
    let node_count = graph.node_count();
    let default_error_rate = engine.params().error_rate;
    let edge_tolerance = engine.params().edge_tolerance;
    let mut report = BatchReport::default();

    info!("Computing overlaps over {} chunks in {}x{} sections", node_count, sections, sections);

    for outer in 0..sections {
        let outer_range = section_bounds(outer, sections, node_count);
        for inner in 0..sections {
            let inner_range = section_bounds(inner, sections, node_count);
            debug!(
                "Section (o {}, i {}) outer [{}, {}) inner [{}, {})",
                outer, inner, outer_range.start, outer_range.end, inner_range.start, inner_range.end
            );

            let pending: Vec<OverlapSpec> = cache
                .records()
                .filter(|record| {
                    let (smaller, bigger) = record.spec.id_range();
                    outer_range.contains(&smaller)
                        && inner_range.contains(&bigger)
                        && !record.computed
                        && (!record.from_external_builder || force_recompute)
                })
                .map(|record| record.spec)
                .collect();

            for key in pending {
                // an earlier re-key in this pass may have replaced the entry
                let Some(mut record) = cache.lookup(&key).cloned() else {
                    continue;
                };
                if record.computed {
                    continue;
                }
                report.examined += 1;

                record.error_rate = default_error_rate;
                record.suspicious = false;

                if record.max_overlap < 0 {
                    warn!("Overlap {} has a negative window, no overlap possible", key);
                    record.overlap = 0;
                    record.computed = true;
                    cache.store(record);
                    report.rejected += 1;
                    continue;
                }

                let computation = engine.compute(&*graph, &mut record, scratch)?;
                report.computed += 1;

                match computation.rekey {
                    Some(rekey) => {
                        let _ = cache.rekey(&rekey.from, record.clone());
                    }
                    None => cache.store(record.clone()),
                }

                if let Verdict::Suspicious(reason) = computation.verdict {
                    report.suspicious += 1;
                    warn!(
                        "Suspicious overlap: looked for {} [{}, {}], found {} overlap {} ({})",
                        key, record.min_overlap, record.max_overlap, record.spec, record.overlap, reason
                    );
                    continue;
                }

                if insert_edges && !record.from_external_builder && record.overlap > 0 {
                    let inserted = insert_overlap_edge(graph, &record, edge_tolerance);
                    if inserted.reused {
                        report.edges_reused += 1;
                    } else {
                        report.edges_inserted += 1;
                    }
                }
            }
        }
    }

    info!(
        "Overlapper examined {} entries: {} computed, {} rejected, {} suspicious, {} edges added, {} reused",
        report.examined,
        report.computed,
        report.rejected,
        report.suspicious,
        report.edges_inserted,
        report.edges_reused
    );
    Ok(report)
}
