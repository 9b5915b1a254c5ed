//! Confidence scoring of overlaps from per-base qualities.
//!
//! The Bayesian scorer treats every alignment column as an independent
//! chance of a sequencing discrepancy. With Phred error probabilities `pA`
//! and `pB`, an aligned column disagrees with probability
//! `pA + pB - pA * pB`; an indel column with the probability of the base
//! present. The expected number of discrepancies `lambda` is their sum, and
//! the confidence is the probability that a Poisson(`lambda`) count reaches
//! the number actually observed: discrepancies that sequencing error alone
//! explains give a confidence near 1.

use crate::align::{Alignment, AlignmentTrace, PairwiseAligner, TraceOp};
use crate::cache::Overlapper;
use crate::canonical::{canonicalize, OverlapSpec};
use crate::engine::{adapt_result, slipped_key, Adaptation, OverlapEngine, OverlapResult, ScratchBuffers, SearchWindow};
use crate::graph::{ChunkGraph, GraphEdge};
use crate::record::OverlapRecord;
use crate::types::{Coord, Orientation};
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityFunction {
    #[default]
    Bayesian,
}

impl std::str::FromStr for QualityFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bayesian" => Ok(QualityFunction::Bayesian),
            other => Err(format!("unknown quality function: {}", other)),
        }
    }
}

/// How to place the alignment window when recomputing with traceback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceSearch {
    /// The whole window at once.
    Window,
    /// Start around the intended offset and grow toward the window bounds,
    /// so that a tandem copy further out is not preferred.
    Widening,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityEstimate {
    pub record: OverlapRecord,
    pub confidence: f32,
}

/// Error probability of a Phred score.
pub fn phred_error(q: u8) -> f64 {
    10f64.powf(-f64::from(q) / 10.0)
}

/// `P(X >= k)` for `X ~ Poisson(lambda)`.
pub fn poisson_upper_tail(lambda: f64, k: usize) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if lambda <= 0.0 {
        return 0.0;
    }
    let ln_lambda = lambda.ln();
    let mut ln_term = -lambda;
    let mut below = ln_term.exp();
    for i in 1..k {
        ln_term += ln_lambda - (i as f64).ln();
        below += ln_term.exp();
    }
    (1.0 - below).clamp(0.0, 1.0)
}

/// Confidence of an alignment given both sequences' qualities.
///
/// `qual_b` must be indexed like the B sequence the trace refers to.
pub fn bayesian_confidence(trace: &AlignmentTrace, qual_a: &[u8], qual_b: &[u8]) -> f32 {
    let error_a = |i: usize| phred_error(qual_a.get(i).copied().unwrap_or(0));
    let error_b = |j: usize| phred_error(qual_b.get(j).copied().unwrap_or(0));

    let mut i = trace.a_range.start;
    let mut j = trace.b_range.start;
    let mut lambda = 0.0;
    let mut observed = 0usize;
    for op in &trace.ops {
        match op {
            TraceOp::Match | TraceOp::Mismatch => {
                let (pa, pb) = (error_a(i), error_b(j));
                lambda += pa + pb - pa * pb;
                if *op == TraceOp::Mismatch {
                    observed += 1;
                }
                i += 1;
                j += 1;
            }
            TraceOp::Insert => {
                lambda += error_a(i);
                observed += 1;
                i += 1;
            }
            TraceOp::Delete => {
                lambda += error_b(j);
                observed += 1;
                j += 1;
            }
        }
    }
    poisson_upper_tail(lambda, observed) as f32
}

impl<A: PairwiseAligner> OverlapEngine<A> {
    /// Realign the pair of `record` with traceback.
    pub fn align_with_trace<G: ChunkGraph>(
        &mut self,
        graph: &G,
        record: &OverlapRecord,
        search: TraceSearch,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<Option<(Alignment, SearchWindow, Coord, Coord)>> {
        let (len_a, len_b) = self.load_pair(graph, record.spec, scratch)?;
        let full = SearchWindow::prepare(
            record.spec.orientation,
            record.min_overlap,
            record.max_overlap,
            len_a,
            len_b,
            self.params.window_slop,
        );

        let found = match search {
            TraceSearch::Window => {
                let request = self.request(&full, record.error_rate, true);
                self.aligner.align(&scratch.seq_a, &scratch.seq_b, &request)
            }
            TraceSearch::Widening => {
                let step = self.params.window_slop.max(1);
                let mut begin = (full.intended - step).max(full.begin);
                let mut end = (full.intended + step).min(full.end);
                loop {
                    let window = SearchWindow { begin, end, ..full };
                    let request = self.request(&window, record.error_rate, true);
                    if let Some(alignment) = self.aligner.align(&scratch.seq_a, &scratch.seq_b, &request) {
                        debug!("Widening search for {} succeeded at [{}, {}]", record.spec, begin, end);
                        break Some(alignment);
                    }
                    if begin <= full.begin && end >= full.end {
                        break None;
                    }
                    begin = (begin - step).max(full.begin);
                    end = (end + step).min(full.end);
                }
            }
        };

        Ok(found
            .filter(|alignment| alignment.length > self.params.min_length && alignment.trace.is_some())
            .map(|alignment| (alignment, full, len_a, len_b)))
    }

    /// Score the overlap of `record` by realigning it. `None` when no
    /// alignment is found or the alignment is geometrically inconsistent.
    fn score_overlap<G: ChunkGraph>(
        &mut self,
        graph: &G,
        record: &OverlapRecord,
        function: QualityFunction,
        search: TraceSearch,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<Option<(f32, Adaptation)>> {
        let Some((alignment, window, len_a, len_b)) = self.align_with_trace(graph, record, search, scratch)? else {
            return Ok(None);
        };
        let adaptation = adapt_result(
            record.spec.orientation,
            &alignment,
            len_a,
            len_b,
            window.intended,
            self.params.intent_slop,
        );
        if let Some(reason) = adaptation.suspicion {
            warn!("Suspicious overlap {} while scoring quality: {}", record.spec, reason);
            return Ok(None);
        }
        if slipped_key(record.spec, adaptation.ahang, adaptation.bhang).is_some() {
            warn!("Overlap {} slipped while scoring quality", record.spec);
            return Ok(None);
        }
        let Some(trace) = alignment.trace.as_ref() else {
            return Ok(None);
        };

        if window.opposite {
            scratch.qual_b.reverse();
        }
        let confidence = match function {
            QualityFunction::Bayesian => bayesian_confidence(trace, &scratch.qual_a, &scratch.qual_b),
        };
        Ok(Some((confidence, adaptation)))
    }

    /// Confidence of the cached overlap behind `edge`, computed once and
    /// memoized in the cache.
    ///
    /// Returns `None` when the pair has no cached overlap, the cached overlap
    /// is empty or suspicious, or realignment fails.
    pub fn evaluate_quality<G: ChunkGraph>(
        &mut self,
        cache: &mut Overlapper,
        graph: &G,
        edge: &GraphEdge,
        orientation: Orientation,
        function: QualityFunction,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<Option<QualityEstimate>> {
        let query = OverlapSpec::new(edge.id_a, edge.id_b, orientation);
        let canonical = canonicalize(edge.id_a, edge.id_b, orientation);
        let Some(cached) = cache.lookup(&canonical.spec) else {
            return Ok(None);
        };
        if !cached.has_overlap() {
            return Ok(None);
        }
        if cached.suspicious {
            warn!("Refusing quality for suspicious overlap {}", cached.spec);
            return Ok(None);
        }
        if cached.has_bayesian_quality {
            return Ok(Some(QualityEstimate {
                record: cached.for_query(query, canonical.was_canonical),
                confidence: cached.quality,
            }));
        }

        let mut record = cached.clone();
        let Some((confidence, _)) = self.score_overlap(graph, &record, function, TraceSearch::Window, scratch)? else {
            return Ok(None);
        };
        record.quality = confidence;
        record.has_bayesian_quality = true;
        if let Some(stored) = cache.lookup_mut(&canonical.spec) {
            stored.quality = confidence;
            stored.has_bayesian_quality = true;
        }

        debug!("Quality of {} is {:.4}", record.spec, confidence);
        Ok(Some(QualityEstimate {
            record: record.for_query(query, canonical.was_canonical),
            confidence,
        }))
    }

    /// Confidence of the overlap implied by `edge`, without consulting or
    /// changing the cache.
    pub fn evaluate_edge_quality<G: ChunkGraph>(
        &mut self,
        graph: &G,
        edge: &GraphEdge,
        orientation: Orientation,
        function: QualityFunction,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<Option<QualityEstimate>> {
        let query = OverlapSpec::new(edge.id_a, edge.id_b, orientation);
        let canonical = canonicalize(edge.id_a, edge.id_b, orientation);
        let mut record = OverlapRecord::provisional_from_edge(edge, self.params.error_rate);
        record.spec = canonical.spec;

        let search = if record.min_overlap == record.max_overlap {
            TraceSearch::Window
        } else {
            TraceSearch::Widening
        };
        let Some((confidence, adaptation)) = self.score_overlap(graph, &record, function, search, scratch)? else {
            return Ok(None);
        };

        record.computed = true;
        record.overlap = adaptation.overlap;
        record.ahang = adaptation.ahang;
        record.bhang = adaptation.bhang;
        record.a_contains_b = adaptation.a_contains_b;
        record.b_contains_a = adaptation.b_contains_a;
        record.quality = confidence;
        record.has_bayesian_quality = true;
        Ok(Some(QualityEstimate {
            record: record.for_query(query, canonical.was_canonical),
            confidence,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(ops: Vec<TraceOp>) -> AlignmentTrace {
        let a_len = ops.iter().filter(|op| **op != TraceOp::Delete).count();
        let b_len = ops.iter().filter(|op| **op != TraceOp::Insert).count();
        AlignmentTrace {
            a_range: 0..a_len,
            b_range: 0..b_len,
            ops,
        }
    }

    #[test]
    fn test_phred_error() {
        assert!((phred_error(10) - 0.1).abs() < 1e-12);
        assert!((phred_error(30) - 0.001).abs() < 1e-12);
        assert_eq!(phred_error(0), 1.0);
    }

    #[test]
    fn test_poisson_tail() {
        assert_eq!(poisson_upper_tail(0.3, 0), 1.0);
        assert_eq!(poisson_upper_tail(0.0, 2), 0.0);
        // P(X >= 1) = 1 - e^-lambda
        assert!((poisson_upper_tail(0.5, 1) - (1.0 - (-0.5f64).exp())).abs() < 1e-12);
        assert!(poisson_upper_tail(0.5, 3) < poisson_upper_tail(0.5, 1));
    }

    #[test]
    fn test_clean_alignment_is_fully_confident() {
        let clean = trace(vec![TraceOp::Match; 100]);
        let quals = vec![30u8; 100];
        assert_eq!(bayesian_confidence(&clean, &quals, &quals), 1.0);
    }

    #[test]
    fn test_discrepancies_lower_confidence() {
        let mut ops = vec![TraceOp::Match; 100];
        ops[10] = TraceOp::Mismatch;
        let one = trace(ops.clone());
        ops[50] = TraceOp::Mismatch;
        ops[70] = TraceOp::Mismatch;
        let three = trace(ops);

        let high = vec![40u8; 100];
        let low = vec![10u8; 100];
        let one_high = bayesian_confidence(&one, &high, &high);
        let three_high = bayesian_confidence(&three, &high, &high);
        let three_low = bayesian_confidence(&three, &low, &low);
        assert!(three_high < one_high);
        // low-quality bases explain discrepancies better
        assert!(three_low > three_high);
        assert!((0.0..=1.0).contains(&three_low));
    }

    #[test]
    fn test_indels_consume_one_side() {
        let ops = vec![TraceOp::Match, TraceOp::Insert, TraceOp::Match, TraceOp::Delete, TraceOp::Match];
        let gapped = trace(ops);
        assert_eq!(gapped.a_range, 0..4);
        assert_eq!(gapped.b_range, 0..4);
        let confidence = bayesian_confidence(&gapped, &[20; 4], &[20; 4]);
        assert!(confidence > 0.0 && confidence < 1.0);
    }

    #[test]
    fn test_quality_function_parse() {
        assert_eq!("Bayesian".parse::<QualityFunction>(), Ok(QualityFunction::Bayesian));
        assert!("frequentist".parse::<QualityFunction>().is_err());
    }
}
