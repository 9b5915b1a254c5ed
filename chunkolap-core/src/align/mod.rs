//! Pairwise aligner contract.
//!
//! The overlapper never aligns sequences itself; it asks a
//! [`PairwiseAligner`] for the best overlap whose B start falls inside an
//! offset window on A and adapts whatever comes back.

pub mod local;

pub use local::{LocalAligner, LocalAlignerParams};

use crate::params::AlignMode;
use crate::types::{Coord, Orientation};
use std::ops::Range;

/// One alignment request.
///
/// `min_offset..=max_offset` bounds the start of B relative to the start of
/// A, in caller operand order; negative offsets mean B starts first.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignRequest {
    pub min_offset: Coord,
    pub max_offset: Coord,
    /// Reverse-complement B before aligning.
    pub opposite: bool,
    pub error_rate: f32,
    pub score_threshold: f64,
    pub min_length: Coord,
    pub mode: AlignMode,
    /// Also return the column trace.
    pub with_trace: bool,
}

/// A single alignment column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Match,
    Mismatch,
    /// Base present in A only.
    Insert,
    /// Base present in B only.
    Delete,
}

/// Column trace of an alignment, in caller operand order. B coordinates
/// refer to B as aligned, i.e. after reverse complement when requested.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentTrace {
    pub a_range: Range<usize>,
    pub b_range: Range<usize>,
    pub ops: Vec<TraceOp>,
}

impl AlignmentTrace {
    pub fn differences(&self) -> usize {
        self.ops.iter().filter(|op| **op != TraceOp::Match).count()
    }
}

/// Result of a successful alignment.
///
/// Hangs are in the aligner's operand order. When B starts before A the
/// aligner reports the pair swapped (`swapped == true`) so that `ahang` is
/// never negative; the caller-order hangs are then the negations.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub ahang: Coord,
    pub bhang: Coord,
    pub length: Coord,
    pub swapped: bool,
    /// Orientation class as seen from the aligner's operand order.
    pub orientation: Orientation,
    pub score: f64,
    pub trace: Option<AlignmentTrace>,
}

impl Alignment {
    /// `(ahang, bhang)` in caller operand order.
    pub fn caller_hangs(&self) -> (Coord, Coord) {
        if self.swapped {
            (-self.ahang, -self.bhang)
        } else {
            (self.ahang, self.bhang)
        }
    }
}

/// Orientation class an aligner reports for a pair, given whether B was
/// reverse-complemented and whether the operands were swapped.
pub fn reported_orientation(opposite: bool, swapped: bool) -> Orientation {
    match (opposite, swapped) {
        (false, _) => Orientation::Normal,
        (true, false) => Orientation::Innie,
        (true, true) => Orientation::Outtie,
    }
}

pub trait PairwiseAligner {
    /// Best overlap satisfying the request, or `None`.
    fn align(&mut self, seq_a: &[u8], seq_b: &[u8], request: &AlignRequest) -> Option<Alignment>;
}

impl<T: PairwiseAligner + ?Sized> PairwiseAligner for Box<T> {
    fn align(&mut self, seq_a: &[u8], seq_b: &[u8], request: &AlignRequest) -> Option<Alignment> {
        (**self).align(seq_a, seq_b, request)
    }
}
