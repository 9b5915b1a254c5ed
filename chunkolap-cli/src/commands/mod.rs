//! Command implementations for the chunkolap CLI

pub mod discover;
pub mod dump;
pub mod quality;
pub mod query;

use anyhow::{Context, Result};
use chunkolap_core::{LocalAligner, OverlapEngine, Overlapper};
use std::path::Path;

use crate::config::Config;

/// Engine with the default aligner, configured from `config`.
pub fn build_engine(config: &Config) -> Result<OverlapEngine<LocalAligner>> {
    let aligner = LocalAligner::new(config.aligner.clone());
    OverlapEngine::new(aligner, config.overlap.clone()).context("Failed to set up overlap engine")
}

/// Read the cache at `path`, or start an empty one when the file does not exist.
pub fn load_cache_or_new(path: &Path) -> Result<Overlapper> {
    if !path.exists() {
        log::info!("No overlap cache at {}, starting empty", path.display());
        return Ok(Overlapper::new());
    }
    let cache = Overlapper::load_from_file(path)
        .with_context(|| format!("Failed to load overlap cache: {}", path.display()))?;
    log::info!("Loaded {} overlaps from {}", cache.len(), path.display());
    Ok(cache)
}

pub fn save_cache(cache: &Overlapper, path: &Path) -> Result<()> {
    cache
        .save_to_file(path)
        .with_context(|| format!("Failed to write overlap cache: {}", path.display()))?;
    log::info!("Wrote {} overlaps to {}", cache.len(), path.display());
    Ok(())
}
