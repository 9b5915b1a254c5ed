//! Overlap cache keyed by canonical spec.
//!
//! Stream layout (little-endian, no header):
//! - `i64` record count
//! - `count` fixed-size records of [`RECORD_SIZE`] bytes each
//!
//! Records are written in map iteration order, which is not stable.

use crate::canonical::{canonicalize, OverlapSpec};
use crate::graph::GraphEdge;
use crate::params::OverlapParams;
use crate::record::OverlapRecord;
use crate::types::{ChunkId, Coord, Orientation};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Size in bytes of one persisted record.
pub const RECORD_SIZE: usize = 4 + 4 + 1 + 1 + 7 * 8 + 4 + 4;

const FLAG_COMPUTED: u8 = 1 << 0;
const FLAG_A_CONTAINS_B: u8 = 1 << 1;
const FLAG_B_CONTAINS_A: u8 = 1 << 2;
const FLAG_SUSPICIOUS: u8 = 1 << 3;
const FLAG_BAYESIAN: u8 = 1 << 4;
const FLAG_EXTERNAL_BUILDER: u8 = 1 << 5;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Stream truncated: expected {expected} records, read {read}")]
    Truncated { expected: i64, read: i64 },

    #[error("Data corruption: {0}")]
    Corruption(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// An overlap suggestion for a pair, expressed as an expected overlap length
/// and its uncertainty.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapHint {
    pub id_a: ChunkId,
    pub id_b: ChunkId,
    pub orientation: Orientation,
    pub mean_overlap: f64,
    pub delta_overlap: f64,
    pub quality: f32,
    pub bayesian: bool,
    pub from_external_builder: bool,
}

/// What [`Overlapper::collect_overlap_hint`] did with a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintAction {
    Inserted,
    /// A computed empty result was reopened for a wider window.
    Reopened,
    Updated,
    /// The window lies entirely at negative overlap, or nothing changed.
    Ignored,
}

/// The overlap cache.
#[derive(Debug, Clone, Default)]
pub struct Overlapper {
    records: HashMap<OverlapSpec, OverlapRecord>,
}

impl Overlapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a record under its own spec. Returns `false`, leaving the cache
    /// unchanged, when the key is already occupied.
    ///
    /// # Panics
    ///
    /// Panics if the record's spec is not canonical.
    #[must_use]
    pub fn insert(&mut self, record: OverlapRecord) -> bool {
        assert!(
            record.spec.is_canonical(),
            "non-canonical overlap spec {} inserted into cache",
            record.spec
        );
        match self.records.entry(record.spec) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Overwrite (or create) the entry for the record's spec.
    pub fn store(&mut self, record: OverlapRecord) {
        assert!(
            record.spec.is_canonical(),
            "non-canonical overlap spec {} stored in cache",
            record.spec
        );
        self.records.insert(record.spec, record);
    }

    /// Lookup by canonical key.
    pub fn lookup(&self, spec: &OverlapSpec) -> Option<&OverlapRecord> {
        self.records.get(spec)
    }

    pub fn lookup_mut(&mut self, spec: &OverlapSpec) -> Option<&mut OverlapRecord> {
        self.records.get_mut(spec)
    }

    pub fn delete(&mut self, spec: &OverlapSpec) -> Option<OverlapRecord> {
        self.records.remove(spec)
    }

    /// Lookup by any form of the pair, returning the record as seen from the
    /// caller's operand order.
    pub fn lookup_overlap(&self, id_a: ChunkId, id_b: ChunkId, orientation: Orientation) -> Option<OverlapRecord> {
        let canonical = canonicalize(id_a, id_b, orientation);
        self.records
            .get(&canonical.spec)
            .map(|record| record.for_query(OverlapSpec::new(id_a, id_b, orientation), canonical.was_canonical))
    }

    pub fn records(&self) -> impl Iterator<Item = &OverlapRecord> {
        self.records.values()
    }

    /// Records sorted by spec, for stable listings.
    pub fn sorted_records(&self) -> Vec<&OverlapRecord> {
        let mut records: Vec<&OverlapRecord> = self.records.values().collect();
        records.sort_by_key(|r| r.spec);
        records
    }

    /// Replace the entry for `from` with `record`, which lives under a
    /// different key. The old entry is removed even when the new key turns
    /// out to be occupied; returns whether the new record was stored.
    #[must_use]
    pub fn rekey(&mut self, from: &OverlapSpec, record: OverlapRecord) -> bool {
        self.records.remove(from);
        let to = record.spec;
        let stored = self.insert(record);
        if !stored {
            log::warn!("Re-keyed overlap {} -> {} collides with an existing entry", from, to);
        }
        stored
    }

    /// Widen or create the provisional window for a pair.
    pub fn collect_overlap_hint(&mut self, hint: &OverlapHint, params: &OverlapParams) -> HintAction {
        let delta = ((3.0 * hint.delta_overlap) as Coord).max(params.hint_min_delta);
        let min_overlap = (hint.mean_overlap - delta as f64).max(0.0) as Coord;
        let max_overlap = (hint.mean_overlap + delta as f64) as Coord;
        if max_overlap < 0 {
            return HintAction::Ignored;
        }

        let spec = canonicalize(hint.id_a, hint.id_b, hint.orientation).spec;
        log::debug!(
            "Collecting overlap hint {} [{}, {}]{}",
            spec,
            min_overlap,
            max_overlap,
            if hint.from_external_builder { " (builder)" } else { "" }
        );

        let Some(existing) = self.records.get_mut(&spec) else {
            let mut record = OverlapRecord::provisional(spec, min_overlap, max_overlap, params.error_rate);
            record.overlap = 0;
            record.quality = 1.0;
            record.from_external_builder = hint.from_external_builder;
            if hint.from_external_builder && hint.bayesian {
                record.computed = true;
                record.quality = hint.quality;
                record.has_bayesian_quality = true;
                record.overlap = (min_overlap + max_overlap) / 2;
            }
            self.records.insert(spec, record);
            return HintAction::Inserted;
        };

        if existing.computed {
            let widens = min_overlap < existing.min_overlap || max_overlap > existing.max_overlap;
            if existing.overlap == 0 && widens {
                existing.computed = false;
                existing.has_bayesian_quality = false;
                existing.min_overlap = existing.min_overlap.min(min_overlap);
                existing.max_overlap = existing.max_overlap.max(max_overlap);
                return HintAction::Reopened;
            }
            return HintAction::Ignored;
        }

        if hint.from_external_builder {
            if !existing.from_external_builder {
                existing.builder_min_overlap = min_overlap;
                existing.builder_max_overlap = max_overlap;
                existing.overlap = (min_overlap + max_overlap) / 2;
                existing.from_external_builder = true;
            } else if hint.quality < existing.quality {
                existing.builder_min_overlap = min_overlap;
                existing.builder_max_overlap = max_overlap;
            }
            existing.quality = hint.quality;
            existing.has_bayesian_quality = hint.bayesian;
            if hint.bayesian {
                existing.overlap = (existing.builder_min_overlap + existing.builder_max_overlap) / 2;
                existing.computed = true;
            }
        }
        existing.min_overlap = existing.min_overlap.min(min_overlap);
        existing.max_overlap = existing.max_overlap.max(max_overlap);
        HintAction::Updated
    }

    /// Install a computed entry taken from an existing graph edge.
    #[must_use]
    pub fn seed_from_edge(&mut self, edge: &GraphEdge, bayesian: bool, error_rate: f32) -> bool {
        let spec = canonicalize(edge.id_a, edge.id_b, edge.orientation).spec;
        let overlap = -edge.distance.mean;
        let delta = 3.0 * edge.distance.std_dev();
        let record = OverlapRecord {
            computed: true,
            overlap: overlap as Coord,
            quality: edge.quality,
            has_bayesian_quality: bayesian,
            builder_min_overlap: 0,
            builder_max_overlap: 0,
            ..OverlapRecord::provisional(spec, (overlap - delta) as Coord, (overlap + delta) as Coord, error_rate)
        };
        self.insert(record)
    }

    pub fn save_to_stream<W: Write>(&self, writer: &mut W) -> CacheResult<()> {
        writer.write_i64::<LittleEndian>(self.records.len() as i64)?;
        for record in self.records.values() {
            write_record(writer, record)?;
        }
        Ok(())
    }

    pub fn load_from_stream<R: Read>(reader: &mut R) -> CacheResult<Self> {
        let count = reader.read_i64::<LittleEndian>()?;
        if count < 0 {
            return Err(CacheError::Corruption(format!("negative record count {}", count)));
        }

        let mut cache = Self::with_capacity(count.min(1 << 20) as usize);
        for read in 0..count {
            let record = match read_record(reader) {
                Ok(record) => record,
                Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(CacheError::Truncated { expected: count, read });
                }
                Err(e) => return Err(e),
            };
            let spec = record.spec;
            if !cache.insert(record) {
                return Err(CacheError::Corruption(format!("duplicate overlap key {}", spec)));
            }
        }
        Ok(cache)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> CacheResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_to_stream(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::load_from_stream(&mut reader)
    }
}

fn write_record<W: Write>(writer: &mut W, record: &OverlapRecord) -> CacheResult<()> {
    let mut flags = 0u8;
    for (set, bit) in [
        (record.computed, FLAG_COMPUTED),
        (record.a_contains_b, FLAG_A_CONTAINS_B),
        (record.b_contains_a, FLAG_B_CONTAINS_A),
        (record.suspicious, FLAG_SUSPICIOUS),
        (record.has_bayesian_quality, FLAG_BAYESIAN),
        (record.from_external_builder, FLAG_EXTERNAL_BUILDER),
    ] {
        if set {
            flags |= bit;
        }
    }

    writer.write_u32::<LittleEndian>(record.spec.id_a)?;
    writer.write_u32::<LittleEndian>(record.spec.id_b)?;
    writer.write_u8(record.spec.orientation.tag())?;
    writer.write_u8(flags)?;
    for value in [
        record.overlap,
        record.min_overlap,
        record.max_overlap,
        record.ahang,
        record.bhang,
        record.builder_min_overlap,
        record.builder_max_overlap,
    ] {
        writer.write_i64::<LittleEndian>(value)?;
    }
    writer.write_f32::<LittleEndian>(record.quality)?;
    writer.write_f32::<LittleEndian>(record.error_rate)?;
    Ok(())
}

fn read_record<R: Read>(reader: &mut R) -> CacheResult<OverlapRecord> {
    let mut buf = [0u8; RECORD_SIZE];
    reader.read_exact(&mut buf)?;
    let mut cursor = &buf[..];

    let id_a = cursor.read_u32::<LittleEndian>()?;
    let id_b = cursor.read_u32::<LittleEndian>()?;
    let tag = cursor.read_u8()?;
    let orientation = Orientation::from_tag(tag)
        .ok_or_else(|| CacheError::Corruption(format!("invalid orientation tag {:#04x}", tag)))?;
    let flags = cursor.read_u8()?;
    let mut values = [0 as Coord; 7];
    for value in values.iter_mut() {
        *value = cursor.read_i64::<LittleEndian>()?;
    }
    let quality = cursor.read_f32::<LittleEndian>()?;
    let error_rate = cursor.read_f32::<LittleEndian>()?;

    let spec = OverlapSpec::new(id_a, id_b, orientation);
    if !spec.is_canonical() {
        return Err(CacheError::Corruption(format!("non-canonical overlap key {}", spec)));
    }
    // Also rejects NaN.
    if !(error_rate > 0.0) {
        return Err(CacheError::Corruption(format!(
            "overlap {} has non-positive error rate {}",
            spec, error_rate
        )));
    }
    if flags & FLAG_A_CONTAINS_B != 0 && flags & FLAG_B_CONTAINS_A != 0 {
        return Err(CacheError::Corruption(format!("overlap {} marked as mutual containment", spec)));
    }

    let [overlap, min_overlap, max_overlap, ahang, bhang, builder_min_overlap, builder_max_overlap] = values;
    Ok(OverlapRecord {
        spec,
        computed: flags & FLAG_COMPUTED != 0,
        overlap,
        min_overlap,
        max_overlap,
        ahang,
        bhang,
        a_contains_b: flags & FLAG_A_CONTAINS_B != 0,
        b_contains_a: flags & FLAG_B_CONTAINS_A != 0,
        suspicious: flags & FLAG_SUSPICIOUS != 0,
        quality,
        has_bayesian_quality: flags & FLAG_BAYESIAN != 0,
        error_rate,
        from_external_builder: flags & FLAG_EXTERNAL_BUILDER != 0,
        builder_min_overlap,
        builder_max_overlap,
    })
}
