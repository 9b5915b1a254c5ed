//! Tunable constants for overlap discovery.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on any error rate an overlap may be computed or stored with.
pub const MAX_ERROR_RATE: f32 = 0.25;

/// Window half-width used when a provisional record is built from a graph edge.
pub const EDGE_WINDOW_DELTA: i64 = 20;

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("error rate {0} outside (0, {max}]", max = MAX_ERROR_RATE)]
    ErrorRate(f32),

    #[error("section count must be positive")]
    Sections,

    #[error("invalid parameters: {0}")]
    Invalid(String),
}

/// How the aligner should look for an overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    /// End-to-end overlap alignment.
    Align,
    /// Local overlap, tolerant of ragged ends.
    LocalOverlap,
}

impl Default for AlignMode {
    fn default() -> Self {
        AlignMode::Align
    }
}

/// Parameters shared by the computation engine, the quality evaluator and
/// the batch scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapParams {
    /// Default error-rate ceiling for computed overlaps
    #[serde(default = "default_error_rate")]
    pub error_rate: f32,

    /// Minimum alignment score accepted from the aligner
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Alignments of this length or shorter are treated as no alignment
    #[serde(default = "default_min_length")]
    pub min_length: i64,

    /// Slop added on both sides of the alignment search window
    #[serde(default = "default_window_slop")]
    pub window_slop: i64,

    /// Tolerance on the intended offset before a flip counts as suspicious
    #[serde(default = "default_intent_slop")]
    pub intent_slop: i64,

    /// Number of id-space sections per axis in batch discovery
    #[serde(default = "default_sections")]
    pub sections: u32,

    /// Distance difference below which an existing overlap edge is reused
    #[serde(default = "default_edge_tolerance")]
    pub edge_tolerance: f64,

    /// Minimum half-width of a window collected from a hint
    #[serde(default = "default_hint_min_delta")]
    pub hint_min_delta: i64,

    #[serde(default)]
    pub align_mode: AlignMode,
}

fn default_error_rate() -> f32 { 0.10 }
fn default_score_threshold() -> f64 { 1e-6 }
fn default_min_length() -> i64 { 30 }
fn default_window_slop() -> i64 { 10 }
fn default_intent_slop() -> i64 { 5 }
fn default_sections() -> u32 { 5 }
fn default_edge_tolerance() -> f64 { 5.0 }
fn default_hint_min_delta() -> i64 { 10 }

impl Default for OverlapParams {
    fn default() -> Self {
        Self {
            error_rate: default_error_rate(),
            score_threshold: default_score_threshold(),
            min_length: default_min_length(),
            window_slop: default_window_slop(),
            intent_slop: default_intent_slop(),
            sections: default_sections(),
            edge_tolerance: default_edge_tolerance(),
            hint_min_delta: default_hint_min_delta(),
            align_mode: AlignMode::default(),
        }
    }
}

/// Error rates must be positive and at most [`MAX_ERROR_RATE`]; the cache
/// file format does not admit anything else.
pub fn check_error_rate(error_rate: f32) -> Result<(), ParamsError> {
    if error_rate > 0.0 && error_rate <= MAX_ERROR_RATE {
        Ok(())
    } else {
        Err(ParamsError::ErrorRate(error_rate))
    }
}

impl OverlapParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_error_rate(self.error_rate)?;
        if self.sections == 0 {
            return Err(ParamsError::Sections);
        }
        if self.min_length < 0 || self.window_slop < 0 || self.intent_slop < 0 {
            return Err(ParamsError::Invalid(
                "lengths and slops must be non-negative".to_string(),
            ));
        }
        if self.edge_tolerance < 0.0 {
            return Err(ParamsError::Invalid("edge tolerance must be non-negative".to_string()));
        }
        Ok(())
    }
}
