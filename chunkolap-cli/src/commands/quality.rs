//! Quality command implementation - Bayesian confidence of cached overlaps

use anyhow::{Context, Result};
use chunkolap_core::{insert_overlap_edge, ChunkGraph, QualityFunction, ScratchBuffers};
use std::path::PathBuf;

use crate::commands::{build_engine, load_cache_or_new, save_cache};
use crate::config::Config;
use crate::input::load_chunks;

pub fn execute(config: &Config, chunks: PathBuf, cache_path: PathBuf, function: String) -> Result<()> {
    let function: QualityFunction = function.parse().map_err(anyhow::Error::msg)?;
    let mut graph = load_chunks(&chunks)?;
    let mut cache = load_cache_or_new(&cache_path)?;
    let mut engine = build_engine(config)?;
    let tolerance = engine.params().edge_tolerance;

    let confirmed: Vec<_> = cache
        .sorted_records()
        .into_iter()
        .filter(|r| r.computed && !r.suspicious && r.overlap > 0)
        .cloned()
        .collect();
    log::info!("Scoring {} confirmed overlaps", confirmed.len());

    let mut scratch = ScratchBuffers::new();
    let mut scored = 0usize;
    for record in &confirmed {
        let spec = record.spec;
        if graph.chunk_length(spec.id_a).is_none() || graph.chunk_length(spec.id_b).is_none() {
            log::warn!("Skipping overlap {}: chunk not in {}", spec, chunks.display());
            continue;
        }
        let inserted = insert_overlap_edge(&mut graph, record, tolerance);
        let edge = graph
            .edge(inserted.id)
            .cloned()
            .context("Overlap edge vanished from the graph")?;

        let estimate = engine
            .evaluate_quality(&mut cache, &graph, &edge, spec.orientation, function, &mut scratch)
            .with_context(|| format!("Failed to score overlap {}", spec))?;
        let name = |id| graph.chunk(id).map(|c| c.name.clone()).unwrap_or_default();
        match estimate {
            Some(estimate) => {
                scored += 1;
                println!(
                    "{}\t{}\t{}\t{}\t{:.6}",
                    name(spec.id_a),
                    name(spec.id_b),
                    spec.orientation,
                    estimate.record.overlap,
                    estimate.confidence
                );
            }
            None => log::warn!("Could not realign overlap {}", spec),
        }
    }

    log::info!("Scored {} of {} overlaps", scored, confirmed.len());
    save_cache(&cache, &cache_path)
}
