//! Discover command implementation - batch overlap computation over a hint table

use anyhow::{Context, Result};
use chunkolap_core::{run_batch_discovery, HintAction, ScratchBuffers};
use std::path::PathBuf;

use crate::commands::{build_engine, load_cache_or_new, save_cache};
use crate::config::Config;
use crate::input::{load_chunks, load_hints, write_edges};

pub fn execute(
    config: &Config,
    chunks: PathBuf,
    hints: Option<PathBuf>,
    cache_path: PathBuf,
    edges: Option<PathBuf>,
    force_recompute: bool,
    no_edges: bool,
) -> Result<()> {
    log::info!("Starting overlap discovery");

    let mut graph = load_chunks(&chunks)?;
    let mut cache = load_cache_or_new(&cache_path)?;
    let mut engine = build_engine(config)?;

    if let Some(hints) = hints {
        let hints = load_hints(&hints, &graph)?;
        let (mut inserted, mut reopened, mut updated, mut ignored) = (0, 0, 0, 0);
        for hint in &hints {
            match cache.collect_overlap_hint(hint, engine.params()) {
                HintAction::Inserted => inserted += 1,
                HintAction::Reopened => reopened += 1,
                HintAction::Updated => updated += 1,
                HintAction::Ignored => ignored += 1,
            }
        }
        log::info!(
            "Collected hints: {} new, {} reopened, {} updated, {} ignored",
            inserted,
            reopened,
            updated,
            ignored
        );
    }

    let force_recompute = force_recompute || config.discover.force_recompute;
    let insert_edges = config.discover.insert_edges && !no_edges;
    let mut scratch = ScratchBuffers::new();
    let report = run_batch_discovery(
        &mut engine,
        &mut cache,
        &mut graph,
        &mut scratch,
        force_recompute,
        insert_edges,
    )
    .context("Overlap discovery failed")?;

    save_cache(&cache, &cache_path)?;
    if let Some(edges) = edges {
        write_edges(&edges, &graph)?;
        log::info!("Edges written to: {}", edges.display());
    }

    println!(
        "examined {}  computed {}  rejected {}  suspicious {}  edges added {}  reused {}",
        report.examined,
        report.computed,
        report.rejected,
        report.suspicious,
        report.edges_inserted,
        report.edges_reused
    );
    Ok(())
}
