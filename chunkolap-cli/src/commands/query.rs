//! Query command implementation - look up or compute one pair

use anyhow::{Context, Result};
use chunkolap_core::{Orientation, OverlapOutcome, OverlapQuery, Overlapper, ScratchBuffers};
use serde::Serialize;
use std::path::PathBuf;

use crate::commands::{build_engine, load_cache_or_new, save_cache};
use crate::config::Config;
use crate::error::CliError;
use crate::input::load_chunks;

/// A single pair as named on the command line.
#[derive(Debug, Clone)]
pub struct PairRequest {
    pub a: String,
    pub b: String,
    pub orientation: String,
    pub min: i64,
    pub max: i64,
    pub error_rate: Option<f32>,
    pub insert: bool,
}

#[derive(Serialize)]
struct QueryReport<'a> {
    status: &'static str,
    reason: Option<String>,
    record: Option<&'a chunkolap_core::OverlapRecord>,
}

pub fn execute(
    config: &Config,
    chunks: PathBuf,
    cache_path: Option<PathBuf>,
    request: PairRequest,
    json: bool,
) -> Result<()> {
    let mut graph = load_chunks(&chunks)?;
    let mut cache = match &cache_path {
        Some(path) => load_cache_or_new(path)?,
        None => Overlapper::new(),
    };
    let mut engine = build_engine(config)?;

    let id_a = graph.chunk_by_name(&request.a).ok_or_else(|| CliError::unknown_chunk(request.a.as_str()))?;
    let id_b = graph.chunk_by_name(&request.b).ok_or_else(|| CliError::unknown_chunk(request.b.as_str()))?;
    let orientation: Orientation = request.orientation.parse().map_err(anyhow::Error::msg)?;

    let query = OverlapQuery {
        id_a,
        id_b,
        orientation,
        min_overlap: request.min,
        max_overlap: request.max,
        error_rate: request.error_rate.unwrap_or(engine.params().error_rate),
        insert_edges: request.insert,
    };
    log::info!(
        "Looking for {} {} {} overlap in [{}, {}]",
        request.a,
        request.b,
        orientation,
        query.min_overlap,
        query.max_overlap
    );

    let mut scratch = ScratchBuffers::new();
    let outcome = engine
        .compute_or_lookup(&mut cache, &mut graph, &query, &mut scratch)
        .context("Overlap computation failed")?;

    let report = match &outcome {
        OverlapOutcome::Confirmed(record) => QueryReport {
            status: "confirmed",
            reason: None,
            record: Some(record),
        },
        OverlapOutcome::Suspicious(record, reason) => QueryReport {
            status: "suspicious",
            reason: Some(reason.to_string()),
            record: Some(record),
        },
        OverlapOutcome::NotFound => QueryReport {
            status: "not_found",
            reason: None,
            record: None,
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match report.record {
            Some(record) => println!(
                "{} overlap {} ahang {} bhang {}{}{}",
                report.status,
                record.overlap,
                record.ahang,
                record.bhang,
                if record.is_containment() { " containment" } else { "" },
                report.reason.map(|r| format!(" ({})", r)).unwrap_or_default()
            ),
            None => println!("{}", report.status),
        }
    }

    if request.insert {
        if let Some(path) = &cache_path {
            save_cache(&cache, path)?;
        }
    }
    Ok(())
}
