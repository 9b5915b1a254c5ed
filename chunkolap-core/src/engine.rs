//! Overlap computation engine.
//!
//! One attempt runs through a fixed sequence of steps:
//!
//! 1. windowing: turn the record's `[min_overlap, max_overlap]` into an
//!    offset window on A ([`SearchWindow::prepare`])
//! 2. alignment through the [`PairwiseAligner`]
//! 3. adaptation: overlap length, containment and suspicion ([`adapt_result`])
//! 4. slippage repair: a result that slid into the mirrored arrangement is
//!    re-keyed ([`slipped_key`])
//!
//! The engine mutates the record it is handed and reports any re-keying as a
//! [`Rekey`]; applying that to the cache is the caller's transaction.

use crate::align::{AlignRequest, Alignment, PairwiseAligner};
use crate::cache::Overlapper;
use crate::canonical::{canonicalize, OverlapSpec};
use crate::edge::insert_overlap_edge;
use crate::graph::ChunkGraph;
use crate::params::{check_error_rate, OverlapParams, ParamsError};
use crate::record::OverlapRecord;
use crate::types::{ChunkId, Coord, EdgeId, Orientation};
use log::{debug, warn};
use thiserror::Error;

/// Extra bases probed past `min_length` by [`OverlapEngine::small_overlap_exists`].
const SMALL_OVERLAP_MARGIN: Coord = 5;

#[derive(Debug, Error)]
pub enum OverlapError {
    #[error("Chunk {0} has no consensus sequence in the graph")]
    MissingChunk(ChunkId),

    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),
}

pub type OverlapResult<T> = Result<T, OverlapError>;

/// Sequence and quality buffers reused across computations.
///
/// Buffers are overwritten on every use and never shrink.
#[derive(Debug, Default)]
pub struct ScratchBuffers {
    pub seq_a: Vec<u8>,
    pub qual_a: Vec<u8>,
    pub seq_b: Vec<u8>,
    pub qual_b: Vec<u8>,
}

impl ScratchBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seq_a: Vec::with_capacity(capacity),
            qual_a: Vec::with_capacity(capacity),
            seq_b: Vec::with_capacity(capacity),
            qual_b: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.seq_a.clear();
        self.qual_a.clear();
        self.seq_b.clear();
        self.qual_b.clear();
    }
}

/// Offset window on A in which B's start is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub begin: Coord,
    pub end: Coord,
    /// Offset implied by the midpoint of the overlap range.
    pub intended: Coord,
    /// B must be reverse-complemented.
    pub opposite: bool,
}

impl SearchWindow {
    /// # Panics
    ///
    /// Panics on `Antinormal`, which never appears in a canonical spec.
    pub fn prepare(
        orientation: Orientation,
        min_overlap: Coord,
        max_overlap: Coord,
        len_a: Coord,
        len_b: Coord,
        slop: Coord,
    ) -> Self {
        let midpoint = (min_overlap + max_overlap) / 2;
        let (begin, end, intended, opposite) = match orientation {
            Orientation::Normal => (len_a - max_overlap, len_a - min_overlap, len_a - midpoint, false),
            Orientation::Innie => (len_a - max_overlap, len_a - min_overlap, len_a - midpoint, true),
            // searched as an Innie with B placed before A
            Orientation::Outtie => (-(len_b - min_overlap), -(len_b - max_overlap), -(len_b - midpoint), true),
            Orientation::Antinormal => panic!("cannot window an Antinormal overlap; canonicalize first"),
        };
        Self {
            begin: begin - slop,
            end: end + slop,
            intended,
            opposite,
        }
    }
}

/// Why a result was flagged as suspicious.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspicionReason {
    /// The aligner's operand order and orientation disagree for this arrangement.
    OrientationMismatch,
    /// B landed on the other side of A's start than the window intended.
    OffsetMismatch,
    /// The result slid into the mirrored arrangement and was re-keyed.
    Slipped { from: OverlapSpec },
    /// The cached record was already flagged.
    Recorded,
}

impl std::fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuspicionReason::OrientationMismatch => write!(f, "orientation mismatch"),
            SuspicionReason::OffsetMismatch => write!(f, "offset mismatch"),
            SuspicionReason::Slipped { from } => write!(f, "slipped from {}", from),
            SuspicionReason::Recorded => write!(f, "flagged in cache"),
        }
    }
}

/// Outcome of one overlap request.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlapOutcome {
    Confirmed(OverlapRecord),
    Suspicious(OverlapRecord, SuspicionReason),
    NotFound,
}

impl OverlapOutcome {
    pub fn record(&self) -> Option<&OverlapRecord> {
        match self {
            OverlapOutcome::Confirmed(record) | OverlapOutcome::Suspicious(record, _) => Some(record),
            OverlapOutcome::NotFound => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, OverlapOutcome::Confirmed(_))
    }

    /// Confirmed overlap length, 0 otherwise.
    pub fn overlap(&self) -> Coord {
        match self {
            OverlapOutcome::Confirmed(record) => record.overlap.max(0),
            _ => 0,
        }
    }
}

/// Verdict of [`OverlapEngine::compute`]; the record itself was updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Confirmed,
    Suspicious(SuspicionReason),
    NotFound,
}

/// A cache key change produced by slippage repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rekey {
    pub from: OverlapSpec,
    pub to: OverlapSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Computation {
    pub verdict: Verdict,
    pub rekey: Option<Rekey>,
}

impl Computation {
    fn not_found() -> Self {
        Self {
            verdict: Verdict::NotFound,
            rekey: None,
        }
    }
}

/// Result of interpreting an alignment for a canonical spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adaptation {
    pub overlap: Coord,
    /// Hangs in the spec's operand order and orientation frame.
    pub ahang: Coord,
    pub bhang: Coord,
    pub a_contains_b: bool,
    pub b_contains_a: bool,
    pub suspicion: Option<SuspicionReason>,
}

/// Derive overlap length, containment and suspicion from an alignment.
///
/// The overlap is the mean of the two estimates `len_a - ahang` and
/// `len_b - bhang`, truncated toward zero.
pub fn adapt_result(
    orientation: Orientation,
    alignment: &Alignment,
    len_a: Coord,
    len_b: Coord,
    intended: Coord,
    intent_slop: Coord,
) -> Adaptation {
    let flipped = alignment.swapped;
    let oflipped = alignment.orientation != orientation;
    let overlap = ((len_a - alignment.ahang) + (len_b - alignment.bhang)) / 2;

    let contained = alignment.bhang < 0;
    let a_contains_b = contained && !flipped;
    let b_contains_a = contained && flipped;

    let orientation_mismatch = match orientation {
        Orientation::Outtie => flipped == oflipped,
        Orientation::Innie => flipped != oflipped,
        Orientation::Normal => oflipped,
        Orientation::Antinormal => panic!("cannot adapt an Antinormal overlap; canonicalize first"),
    };
    let offset_mismatch = (intended < -intent_slop && !flipped) || (intended > intent_slop && flipped);
    let suspicion = if orientation_mismatch {
        Some(SuspicionReason::OrientationMismatch)
    } else if offset_mismatch {
        Some(SuspicionReason::OffsetMismatch)
    } else {
        None
    };

    let (ahang, bhang) = natural_hangs(orientation, alignment.caller_hangs());
    Adaptation {
        overlap,
        ahang,
        bhang,
        a_contains_b,
        b_contains_a,
        suspicion,
    }
}

/// Express search-frame hangs (A forward, B as aligned) in the frame of the
/// orientation itself. An Outtie is searched with B placed before A, which
/// is the whole arrangement reverse-complemented: starts and ends trade
/// places and change sign.
fn natural_hangs(orientation: Orientation, (ahang, bhang): (Coord, Coord)) -> (Coord, Coord) {
    match orientation {
        Orientation::Outtie => (-bhang, -ahang),
        _ => (ahang, bhang),
    }
}

/// New key and hangs for a result whose hangs are both negative, meaning
/// B precedes A: Normal swaps operands, Innie and Outtie trade places.
pub fn slipped_key(spec: OverlapSpec, ahang: Coord, bhang: Coord) -> Option<(OverlapSpec, Coord, Coord)> {
    if ahang >= 0 || bhang >= 0 {
        return None;
    }
    let slipped = match spec.orientation {
        Orientation::Normal => (OverlapSpec::new(spec.id_b, spec.id_a, Orientation::Normal), -ahang, -bhang),
        Orientation::Innie | Orientation::Outtie => (
            OverlapSpec::new(spec.id_a, spec.id_b, spec.orientation.slipped()),
            -bhang,
            -ahang,
        ),
        Orientation::Antinormal => panic!("cannot re-key an Antinormal overlap; canonicalize first"),
    };
    Some(slipped)
}

/// An overlap request from the rest of the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapQuery {
    pub id_a: ChunkId,
    pub id_b: ChunkId,
    pub orientation: Orientation,
    pub min_overlap: Coord,
    pub max_overlap: Coord,
    pub error_rate: f32,
    /// Cache new results and add overlap edges to the graph.
    pub insert_edges: bool,
}

impl OverlapQuery {
    pub fn spec(&self) -> OverlapSpec {
        OverlapSpec::new(self.id_a, self.id_b, self.orientation)
    }
}

/// Computes overlaps between graph chunks.
pub struct OverlapEngine<A> {
    pub(crate) aligner: A,
    pub(crate) params: OverlapParams,
}

impl<A: PairwiseAligner> OverlapEngine<A> {
    pub fn new(aligner: A, params: OverlapParams) -> OverlapResult<Self> {
        params.validate()?;
        Ok(Self { aligner, params })
    }

    pub fn params(&self) -> &OverlapParams {
        &self.params
    }

    pub fn aligner(&self) -> &A {
        &self.aligner
    }

    pub fn aligner_mut(&mut self) -> &mut A {
        &mut self.aligner
    }

    /// Fetch both consensus sequences of `spec` into `scratch`.
    pub(crate) fn load_pair<G: ChunkGraph>(
        &self,
        graph: &G,
        spec: OverlapSpec,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<(Coord, Coord)> {
        let len_a = graph
            .consensus(spec.id_a, &mut scratch.seq_a, &mut scratch.qual_a)
            .ok_or(OverlapError::MissingChunk(spec.id_a))?;
        let len_b = graph
            .consensus(spec.id_b, &mut scratch.seq_b, &mut scratch.qual_b)
            .ok_or(OverlapError::MissingChunk(spec.id_b))?;
        Ok((len_a as Coord, len_b as Coord))
    }

    pub(crate) fn request(&self, window: &SearchWindow, error_rate: f32, with_trace: bool) -> AlignRequest {
        AlignRequest {
            min_offset: window.begin,
            max_offset: window.end,
            opposite: window.opposite,
            error_rate,
            score_threshold: self.params.score_threshold,
            min_length: self.params.min_length,
            mode: self.params.align_mode,
            with_trace,
        }
    }

    /// Align the pair of a canonical record and update it in place.
    ///
    /// On return the record is marked computed. When the result slid into
    /// the mirrored arrangement the record carries its new spec and the old
    /// one is reported in [`Computation::rekey`].
    pub fn compute<G: ChunkGraph>(
        &mut self,
        graph: &G,
        record: &mut OverlapRecord,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<Computation> {
        record.a_contains_b = false;
        record.b_contains_a = false;
        record.suspicious = false;
        record.computed = true;
        record.overlap = 0;
        record.ahang = 0;
        record.bhang = 0;

        if record.max_overlap < 0 {
            return Ok(Computation::not_found());
        }

        let (len_a, len_b) = self.load_pair(graph, record.spec, scratch)?;
        if record.min_overlap > len_a + len_b - self.params.min_length {
            return Ok(Computation::not_found());
        }

        let window = SearchWindow::prepare(
            record.spec.orientation,
            record.min_overlap,
            record.max_overlap,
            len_a,
            len_b,
            self.params.window_slop,
        );
        let request = self.request(&window, record.error_rate, false);
        let alignment = match self.aligner.align(&scratch.seq_a, &scratch.seq_b, &request) {
            Some(alignment) if alignment.length > self.params.min_length => alignment,
            _ => {
                debug!("No overlap for {} in [{}, {}]", record.spec, window.begin, window.end);
                return Ok(Computation::not_found());
            }
        };

        let adaptation = adapt_result(
            record.spec.orientation,
            &alignment,
            len_a,
            len_b,
            window.intended,
            self.params.intent_slop,
        );
        record.overlap = adaptation.overlap;
        record.ahang = adaptation.ahang;
        record.bhang = adaptation.bhang;
        record.a_contains_b = adaptation.a_contains_b;
        record.b_contains_a = adaptation.b_contains_a;
        record.quality = 0.0;
        record.has_bayesian_quality = false;

        let mut verdict = match adaptation.suspicion {
            Some(reason) => {
                record.suspicious = true;
                Verdict::Suspicious(reason)
            }
            None => Verdict::Confirmed,
        };

        let mut rekey = None;
        if let Some((to, ahang, bhang)) = slipped_key(record.spec, record.ahang, record.bhang) {
            let from = record.spec;
            warn!(
                "Fixing up suspicious overlap {} (ahang {} bhang {}) to {} (ahang {} bhang {}) len {}",
                from, record.ahang, record.bhang, to, ahang, bhang, record.overlap
            );
            record.spec = to;
            record.ahang = ahang;
            record.bhang = bhang;
            record.suspicious = true;
            verdict = Verdict::Suspicious(SuspicionReason::Slipped { from });
            rekey = Some(Rekey { from, to });
        }

        debug!(
            "Computed {}: overlap {} ahang {} bhang {} {:?}",
            record.spec, record.overlap, record.ahang, record.bhang, verdict
        );
        Ok(Computation { verdict, rekey })
    }

    /// Answer an overlap request from the cache when a cached result covers
    /// it, computing it otherwise.
    pub fn compute_or_lookup<G: ChunkGraph>(
        &mut self,
        cache: &mut Overlapper,
        graph: &mut G,
        query: &OverlapQuery,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<OverlapOutcome> {
        check_error_rate(query.error_rate)?;
        let canonical = canonicalize(query.id_a, query.id_b, query.orientation);
        let key = canonical.spec;

        let insert = match cache.lookup(&key) {
            Some(cached)
                if cached.computed && cached.answers(query.min_overlap, query.max_overlap, query.error_rate) =>
            {
                return Ok(cached_outcome(cached, query.spec(), canonical.was_canonical));
            }
            Some(_) => false,
            None => query.insert_edges,
        };

        let mut record = OverlapRecord::provisional(key, query.min_overlap, query.max_overlap, query.error_rate);
        let computation = self.compute(&*graph, &mut record, scratch)?;

        if let Some(rekey) = computation.rekey {
            let _ = cache.rekey(&rekey.from, record.clone());
        } else if insert {
            // A suspicious result only takes a free slot; the key was absent anyway.
            let _ = cache.insert(record.clone());
        }

        if insert && !record.suspicious && record.overlap > 0 {
            insert_overlap_edge(graph, &record, self.params.edge_tolerance);
        }

        Ok(match computation.verdict {
            Verdict::Suspicious(reason) => {
                warn!("Suspicious overlap for query {}: {}", query.spec(), reason);
                OverlapOutcome::Suspicious(record, reason)
            }
            Verdict::Confirmed if record.overlap > 0 => {
                OverlapOutcome::Confirmed(record.for_query(query.spec(), canonical.was_canonical))
            }
            _ => OverlapOutcome::NotFound,
        })
    }

    /// Length of an overlap just above the minimum alignable length, or 0.
    pub fn small_overlap_exists<G: ChunkGraph>(
        &mut self,
        cache: &mut Overlapper,
        graph: &mut G,
        id_a: ChunkId,
        id_b: ChunkId,
        orientation: Orientation,
        min_overlap: Coord,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<Coord> {
        let max_overlap = self.params.min_length + SMALL_OVERLAP_MARGIN;
        self.large_overlap_exists(cache, graph, id_a, id_b, orientation, min_overlap, max_overlap, scratch)
    }

    /// Length of an overlap in `[min_overlap, max_overlap]`, or 0. Never
    /// caches a new key or adds edges.
    #[allow(clippy::too_many_arguments)]
    pub fn large_overlap_exists<G: ChunkGraph>(
        &mut self,
        cache: &mut Overlapper,
        graph: &mut G,
        id_a: ChunkId,
        id_b: ChunkId,
        orientation: Orientation,
        min_overlap: Coord,
        max_overlap: Coord,
        scratch: &mut ScratchBuffers,
    ) -> OverlapResult<Coord> {
        let query = OverlapQuery {
            id_a,
            id_b,
            orientation,
            min_overlap,
            max_overlap,
            error_rate: self.params.error_rate,
            insert_edges: false,
        };
        Ok(self.compute_or_lookup(cache, graph, &query, scratch)?.overlap())
    }

    /// Install an overlap whose hangs were found elsewhere, replacing any
    /// cached result for the pair, and add it to the graph.
    #[allow(clippy::too_many_arguments)]
    pub fn record_known_overlap<G: ChunkGraph>(
        &mut self,
        cache: &mut Overlapper,
        graph: &mut G,
        id_a: ChunkId,
        id_b: ChunkId,
        orientation: Orientation,
        ahang: Coord,
        bhang: Coord,
    ) -> OverlapResult<EdgeId> {
        check_error_rate(self.params.error_rate)?;
        let len_b = graph.chunk_length(id_b).ok_or(OverlapError::MissingChunk(id_b))?;
        graph.chunk_length(id_a).ok_or(OverlapError::MissingChunk(id_a))?;

        let query = OverlapSpec::new(id_a, id_b, orientation);
        let canonical = query.canonicalize();
        let mut record = OverlapRecord::provisional(query, 0, 0, self.params.error_rate);
        record.computed = true;
        record.overlap = len_b.mean as Coord - bhang;
        record.ahang = ahang;
        record.bhang = bhang;
        record.b_contains_a = ahang < 0 && bhang > 0;
        record.a_contains_b = ahang > 0 && bhang < 0;
        record.builder_min_overlap = 0;
        record.builder_max_overlap = 0;
        let record = record.for_query(canonical.spec, canonical.was_canonical);

        cache.store(record.clone());
        let inserted = insert_overlap_edge(graph, &record, self.params.edge_tolerance);
        debug!("Recorded overlap {} as edge {}", record.spec, inserted.id);
        Ok(inserted.id)
    }
}

fn cached_outcome(cached: &OverlapRecord, query: OverlapSpec, was_canonical: bool) -> OverlapOutcome {
    if cached.suspicious {
        OverlapOutcome::Suspicious(cached.clone(), SuspicionReason::Recorded)
    } else if cached.overlap > 0 {
        OverlapOutcome::Confirmed(cached.for_query(query, was_canonical))
    } else {
        OverlapOutcome::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alignment(ahang: Coord, bhang: Coord, swapped: bool, orientation: Orientation) -> Alignment {
        Alignment {
            ahang,
            bhang,
            length: 200,
            swapped,
            orientation,
            score: 200.0,
            trace: None,
        }
    }

    #[test]
    fn test_window_normal_and_innie() {
        let normal = SearchWindow::prepare(Orientation::Normal, 190, 210, 1000, 800, 10);
        assert_eq!(normal, SearchWindow { begin: 780, end: 820, intended: 800, opposite: false });
        let innie = SearchWindow::prepare(Orientation::Innie, 190, 210, 1000, 800, 10);
        assert_eq!((innie.begin, innie.end, innie.opposite), (780, 820, true));
    }

    #[test]
    fn test_window_outtie() {
        let outtie = SearchWindow::prepare(Orientation::Outtie, 190, 210, 1000, 800, 10);
        assert_eq!(outtie, SearchWindow { begin: -620, end: -580, intended: -600, opposite: true });
    }

    #[test]
    #[should_panic(expected = "Antinormal")]
    fn test_window_antinormal_panics() {
        SearchWindow::prepare(Orientation::Antinormal, 0, 10, 100, 100, 10);
    }

    #[test]
    fn test_overlap_formula_truncates_odd_sums() {
        // (1000 - 800) + (999 - 798) = 401
        let adapted = adapt_result(Orientation::Normal, &alignment(800, 798, false, Orientation::Normal), 1000, 999, 800, 5);
        assert_eq!(adapted.overlap, 200);

        let even = adapt_result(Orientation::Normal, &alignment(800, 800, false, Orientation::Normal), 1000, 1000, 800, 5);
        assert_eq!(even.overlap, 200);
    }

    #[test]
    fn test_containment_classification() {
        let a_over_b = adapt_result(Orientation::Normal, &alignment(50, -30, false, Orientation::Normal), 1000, 920, 50, 5);
        assert!(a_over_b.a_contains_b && !a_over_b.b_contains_a);

        let b_over_a = adapt_result(Orientation::Normal, &alignment(50, -30, true, Orientation::Normal), 920, 1000, -50, 5);
        assert!(b_over_a.b_contains_a && !b_over_a.a_contains_b);

        let dovetail = adapt_result(Orientation::Normal, &alignment(50, 30, false, Orientation::Normal), 1000, 1000, 50, 5);
        assert!(!dovetail.a_contains_b && !dovetail.b_contains_a);
    }

    #[test]
    fn test_suspicion_rules() {
        // Innie found with B first is reported swapped as Outtie: consistent
        let innie = adapt_result(Orientation::Innie, &alignment(40, 10, true, Orientation::Outtie), 500, 500, -40, 5);
        assert_eq!(innie.suspicion, None);

        // Innie swapped but still reported Innie
        let innie = adapt_result(Orientation::Innie, &alignment(40, 10, true, Orientation::Innie), 500, 500, -40, 5);
        assert_eq!(innie.suspicion, Some(SuspicionReason::OrientationMismatch));

        // Outtie not swapped is reported as Innie: consistent
        let outtie = adapt_result(Orientation::Outtie, &alignment(40, 10, false, Orientation::Innie), 500, 500, 40, 5);
        assert_eq!(outtie.suspicion, None);

        let outtie = adapt_result(Orientation::Outtie, &alignment(40, 10, false, Orientation::Outtie), 500, 500, 40, 5);
        assert_eq!(outtie.suspicion, Some(SuspicionReason::OrientationMismatch));

        // intended B after A's start but the aligner put it first
        let normal = adapt_result(Orientation::Normal, &alignment(40, 10, true, Orientation::Normal), 500, 500, 300, 5);
        assert_eq!(normal.suspicion, Some(SuspicionReason::OffsetMismatch));

        // within slop either way is fine
        let normal = adapt_result(Orientation::Normal, &alignment(3, 10, true, Orientation::Normal), 500, 500, 4, 5);
        assert_eq!(normal.suspicion, None);
    }

    #[test]
    fn test_outtie_hangs_in_own_frame() {
        // B (reverse-complemented) found 600 bases before A's start
        let adapted = adapt_result(Orientation::Outtie, &alignment(600, 100, true, Orientation::Outtie), 900, 800, -600, 5);
        assert_eq!(adapted.suspicion, None);
        assert_eq!((adapted.ahang, adapted.bhang), (100, 600));
        assert_eq!(slipped_key(OverlapSpec::new(1, 2, Orientation::Outtie), adapted.ahang, adapted.bhang), None);

        // B after A's start is an Innie in disguise
        let adapted = adapt_result(Orientation::Outtie, &alignment(600, 100, false, Orientation::Innie), 900, 800, -600, 5);
        assert_eq!((adapted.ahang, adapted.bhang), (-100, -600));
        assert_eq!(
            slipped_key(OverlapSpec::new(1, 2, Orientation::Outtie), adapted.ahang, adapted.bhang),
            Some((OverlapSpec::new(1, 2, Orientation::Innie), 600, 100))
        );
    }

    #[test]
    fn test_slipped_key() {
        let normal = OverlapSpec::new(3, 7, Orientation::Normal);
        assert_eq!(
            slipped_key(normal, -300, -200),
            Some((OverlapSpec::new(7, 3, Orientation::Normal), 300, 200))
        );

        let innie = OverlapSpec::new(3, 7, Orientation::Innie);
        assert_eq!(
            slipped_key(innie, -300, -200),
            Some((OverlapSpec::new(3, 7, Orientation::Outtie), 200, 300))
        );

        assert_eq!(slipped_key(normal, -300, 200), None);
        assert_eq!(slipped_key(normal, 0, -200), None);
    }

    #[test]
    fn test_outcome_overlap() {
        let record = OverlapRecord {
            overlap: 120,
            ..OverlapRecord::provisional(OverlapSpec::new(1, 2, Orientation::Normal), 100, 140, 0.1)
        };
        assert_eq!(OverlapOutcome::Confirmed(record.clone()).overlap(), 120);
        assert_eq!(OverlapOutcome::Suspicious(record, SuspicionReason::OffsetMismatch).overlap(), 0);
        assert_eq!(OverlapOutcome::NotFound.overlap(), 0);
    }
}
