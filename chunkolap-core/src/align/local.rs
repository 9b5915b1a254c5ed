//! Default aligner backed by `bio`'s pairwise local alignment.

use super::{reported_orientation, AlignRequest, Alignment, AlignmentTrace, PairwiseAligner, TraceOp};
use crate::params::AlignMode;
use crate::types::Coord;
use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;
use bio::alphabets::dna::revcomp;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Scoring and end-tolerance settings for [`LocalAligner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalAlignerParams {
    /// Match score
    pub match_score: i32,
    /// Mismatch score (negative)
    pub mismatch_score: i32,
    /// Gap open score (negative)
    pub gap_open: i32,
    /// Gap extend score (negative)
    pub gap_extend: i32,
    /// Bases an overlap may stop short of a sequence end in `Align` mode
    pub end_slack: usize,
    /// Same, in `LocalOverlap` mode
    pub local_end_slack: usize,
}

impl Default for LocalAlignerParams {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_score: -3,
            gap_open: -5,
            gap_extend: -2,
            end_slack: 8,
            local_end_slack: 40,
        }
    }
}

/// Finds dovetail or containment overlaps with a local alignment of the
/// part of both sequences that can take part in an overlap starting inside
/// the requested offset window.
#[derive(Debug, Clone, Default)]
pub struct LocalAligner {
    params: LocalAlignerParams,
}

impl LocalAligner {
    pub fn new(params: LocalAlignerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LocalAlignerParams {
        &self.params
    }

    fn end_slack(&self, mode: AlignMode) -> usize {
        match mode {
            AlignMode::Align => self.params.end_slack,
            AlignMode::LocalOverlap => self.params.local_end_slack,
        }
    }
}

/// Parts of A and B an overlap starting at an offset in
/// `[min_offset, max_offset]` can cover. Far ends are widened by `pad` for
/// end slack and indel drift.
fn search_ranges(len_a: Coord, len_b: Coord, min_offset: Coord, max_offset: Coord, pad: Coord) -> (Range<usize>, Range<usize>) {
    let a_from = min_offset.clamp(0, len_a);
    let b_from = (-max_offset).clamp(0, len_b);
    let a_to = (max_offset + len_b + pad).clamp(a_from, len_a);
    let b_to = (len_a - min_offset + pad).clamp(b_from, len_b);
    (a_from as usize..a_to as usize, b_from as usize..b_to as usize)
}

impl PairwiseAligner for LocalAligner {
    fn align(&mut self, seq_a: &[u8], seq_b: &[u8], request: &AlignRequest) -> Option<Alignment> {
        let complemented;
        let seq_b: &[u8] = if request.opposite {
            complemented = revcomp(seq_b);
            &complemented
        } else {
            seq_b
        };

        let len_a = seq_a.len() as Coord;
        let len_b = seq_b.len() as Coord;
        if len_a == 0 || len_b == 0 || request.min_offset > request.max_offset {
            return None;
        }

        let slack = self.end_slack(request.mode);
        let drift = (f64::from(request.error_rate.max(0.0)) * 2.0 * len_a.min(len_b) as f64).ceil() as Coord;
        let (a_range, b_range) = search_ranges(len_a, len_b, request.min_offset, request.max_offset, slack as Coord + drift);
        let (a_from, b_from) = (a_range.start, b_range.start);
        let x = &seq_a[a_range];
        let y = &seq_b[b_range];
        if x.is_empty() || y.is_empty() {
            return None;
        }

        let match_score = self.params.match_score;
        let mismatch_score = self.params.mismatch_score;
        let score = move |a: u8, b: u8| {
            if a.eq_ignore_ascii_case(&b) {
                match_score
            } else {
                mismatch_score
            }
        };
        let mut aligner = Aligner::with_capacity(x.len(), y.len(), self.params.gap_open, self.params.gap_extend, score);
        let aln = aligner.local(x, y);
        if aln.xend <= aln.xstart || aln.yend <= aln.ystart {
            return None;
        }

        let a_start = a_from + aln.xstart;
        let a_end = a_from + aln.xend;
        let b_start = b_from + aln.ystart;
        let b_end = b_from + aln.yend;

        let reaches_left = a_start <= slack || b_start <= slack;
        let reaches_right = seq_a.len() - a_end <= slack || seq_b.len() - b_end <= slack;
        if !(reaches_left && reaches_right) {
            return None;
        }

        let ahang = a_start as Coord - b_start as Coord;
        let bhang = (len_b - b_end as Coord) - (len_a - a_end as Coord);
        if ahang < request.min_offset || ahang > request.max_offset {
            return None;
        }

        let ops: Vec<TraceOp> = aln
            .operations
            .iter()
            .filter_map(|op| match op {
                AlignmentOperation::Match => Some(TraceOp::Match),
                AlignmentOperation::Subst => Some(TraceOp::Mismatch),
                AlignmentOperation::Ins => Some(TraceOp::Insert),
                AlignmentOperation::Del => Some(TraceOp::Delete),
                AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => None,
            })
            .collect();

        let length = ops.len() as Coord;
        if length <= request.min_length {
            return None;
        }
        let differences = ops.iter().filter(|op| **op != TraceOp::Match).count();
        if differences as f64 > f64::from(request.error_rate) * length as f64 {
            return None;
        }
        let score = f64::from(aln.score);
        if score < request.score_threshold {
            return None;
        }

        let swapped = ahang < 0;
        let (ahang, bhang) = if swapped { (-ahang, -bhang) } else { (ahang, bhang) };
        let trace = request.with_trace.then(|| AlignmentTrace {
            a_range: a_start..a_end,
            b_range: b_start..b_end,
            ops,
        });

        Some(Alignment {
            ahang,
            bhang,
            length,
            swapped,
            orientation: reported_orientation(request.opposite, swapped),
            score,
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Orientation;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_dna(rng: &mut StdRng, len: usize) -> Vec<u8> {
        (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
    }

    fn request(min_offset: Coord, max_offset: Coord, opposite: bool) -> AlignRequest {
        AlignRequest {
            min_offset,
            max_offset,
            opposite,
            error_rate: 0.1,
            score_threshold: 1e-6,
            min_length: 30,
            mode: AlignMode::Align,
            with_trace: true,
        }
    }

    #[test]
    fn test_dovetail_forward() {
        let mut rng = StdRng::seed_from_u64(7);
        let shared = random_dna(&mut rng, 100);
        let a = [random_dna(&mut rng, 300), shared.clone()].concat();
        let b = [shared, random_dna(&mut rng, 200)].concat();

        let mut aligner = LocalAligner::default();
        let aln = aligner.align(&a, &b, &request(280, 320, false)).unwrap();
        assert_eq!((aln.ahang, aln.bhang), (300, 200));
        assert!(!aln.swapped);
        assert_eq!(aln.orientation, Orientation::Normal);
        let trace = aln.trace.unwrap();
        assert_eq!(trace.a_range, 300..400);
        assert_eq!(trace.b_range, 0..100);
        assert_eq!(trace.differences(), 0);
    }

    #[test]
    fn test_dovetail_reverse_complement() {
        let mut rng = StdRng::seed_from_u64(11);
        let shared = random_dna(&mut rng, 120);
        let a = [random_dna(&mut rng, 250), shared.clone()].concat();
        let b_forward = [shared, random_dna(&mut rng, 80)].concat();
        let b = revcomp(&b_forward);

        let mut aligner = LocalAligner::default();
        let aln = aligner.align(&a, &b, &request(240, 260, true)).unwrap();
        assert_eq!((aln.ahang, aln.bhang), (250, 80));
        assert_eq!(aln.orientation, Orientation::Innie);
    }

    #[test]
    fn test_b_first_is_reported_swapped() {
        let mut rng = StdRng::seed_from_u64(13);
        let shared = random_dna(&mut rng, 100);
        let a = [shared.clone(), random_dna(&mut rng, 200)].concat();
        let b = [random_dna(&mut rng, 300), shared].concat();

        let mut aligner = LocalAligner::default();
        let aln = aligner.align(&a, &b, &request(-320, -280, false)).unwrap();
        assert!(aln.swapped);
        assert_eq!((aln.ahang, aln.bhang), (300, 200));
        assert_eq!(aln.caller_hangs(), (-300, -200));
    }

    #[test]
    fn test_search_ranges_ignore_unreachable_tails() {
        // B starts 280..320 bases into a 400 bp A
        let short = search_ranges(400, 300, 280, 320, 20);
        let long = search_ranges(400, 20_300, 280, 320, 20);
        assert_eq!(short, (280..400, 0..140));
        assert_eq!(long, short);

        // B placed before A: only A's head is reachable
        let (a, b) = search_ranges(50_000, 800, -620, -580, 20);
        assert_eq!(a, 0..240);
        assert_eq!(b, 580..800);
    }

    #[test]
    fn test_long_tail_does_not_change_result() {
        let mut rng = StdRng::seed_from_u64(23);
        let shared = random_dna(&mut rng, 100);
        let a = [random_dna(&mut rng, 300), shared.clone()].concat();
        let b = [shared.clone(), random_dna(&mut rng, 200)].concat();
        let b_long = [b.clone(), random_dna(&mut rng, 20_000)].concat();

        let mut aligner = LocalAligner::default();
        let plain = aligner.align(&a, &b, &request(280, 320, false)).unwrap();
        let tailed = aligner.align(&a, &b_long, &request(280, 320, false)).unwrap();
        assert_eq!(tailed.ahang, plain.ahang);
        assert_eq!(tailed.bhang, plain.bhang + 20_000);
        assert_eq!(tailed.length, plain.length);
        assert_eq!(tailed.trace.unwrap().b_range, 0..100);

        // same for a long head on A when B comes first
        let a_first = [shared, random_dna(&mut rng, 200)].concat();
        let b_first = [random_dna(&mut rng, 300), a_first[..100].to_vec()].concat();
        let a_long = [a_first.clone(), random_dna(&mut rng, 20_000)].concat();
        let plain = aligner.align(&a_first, &b_first, &request(-320, -280, false)).unwrap();
        let tailed = aligner.align(&a_long, &b_first, &request(-320, -280, false)).unwrap();
        assert_eq!(tailed.caller_hangs().0, plain.caller_hangs().0);
        assert_eq!(tailed.trace.unwrap().a_range, 0..100);
    }

    #[test]
    fn test_offset_outside_window_rejected() {
        let mut rng = StdRng::seed_from_u64(17);
        let shared = random_dna(&mut rng, 100);
        let a = [random_dna(&mut rng, 300), shared.clone()].concat();
        let b = [shared, random_dna(&mut rng, 200)].concat();

        let mut aligner = LocalAligner::default();
        assert!(aligner.align(&a, &b, &request(0, 150, false)).is_none());
    }

    #[test]
    fn test_short_overlap_below_min_length() {
        let mut rng = StdRng::seed_from_u64(19);
        let shared = random_dna(&mut rng, 25);
        let a = [random_dna(&mut rng, 300), shared.clone()].concat();
        let b = [shared, random_dna(&mut rng, 300)].concat();

        let mut aligner = LocalAligner::default();
        assert!(aligner.align(&a, &b, &request(290, 310, false)).is_none());
    }
}
