//! Dump command implementation - list the records of an overlap cache

use anyhow::{anyhow, Result};
use chunkolap_core::{ChunkId, MemoryGraph, OverlapRecord, Overlapper};
use std::path::PathBuf;

use crate::input::load_chunks;

pub fn execute(cache_path: PathBuf, chunks: Option<PathBuf>, json: bool) -> Result<()> {
    if !cache_path.exists() {
        return Err(anyhow!("Overlap cache does not exist: {}", cache_path.display()));
    }
    let cache = Overlapper::load_from_file(&cache_path)?;
    let graph = chunks.as_deref().map(load_chunks).transpose()?;
    let records = cache.sorted_records();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("#a\tb\torient\tcomputed\toverlap\tmin\tmax\tahang\tbhang\tflags\tquality\terror_rate");
    for record in records {
        println!("{}", format_record(record, graph.as_ref()));
    }
    Ok(())
}

fn format_record(record: &OverlapRecord, graph: Option<&MemoryGraph>) -> String {
    let name = |id: ChunkId| match graph.and_then(|g| g.chunk(id).ok()) {
        Some(chunk) => chunk.name.clone(),
        None => id.to_string(),
    };

    let mut flags = String::new();
    for (set, flag) in [
        (record.a_contains_b, 'C'),
        (record.b_contains_a, 'c'),
        (record.suspicious, 'S'),
        (record.has_bayesian_quality, 'Q'),
        (record.from_external_builder, 'B'),
    ] {
        if set {
            flags.push(flag);
        }
    }
    if flags.is_empty() {
        flags.push('-');
    }

    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.3}",
        name(record.spec.id_a),
        name(record.spec.id_b),
        record.spec.orientation,
        if record.computed { "yes" } else { "no" },
        record.overlap,
        record.min_overlap,
        record.max_overlap,
        record.ahang,
        record.bhang,
        flags,
        record.quality,
        record.error_rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkolap_core::{Orientation, OverlapSpec};

    #[test]
    fn test_format_record_with_names() {
        let mut graph = MemoryGraph::new();
        graph.add_chunk("ctg1", b"ACGT".to_vec());
        graph.add_chunk("ctg2", b"ACGT".to_vec());
        let record = OverlapRecord {
            computed: true,
            overlap: 180,
            ahang: 50,
            bhang: -30,
            a_contains_b: true,
            suspicious: true,
            ..OverlapRecord::provisional(OverlapSpec::new(0, 1, Orientation::Normal), 150, 250, 0.1)
        };

        let line = format_record(&record, Some(&graph));
        assert!(line.starts_with("ctg1\tctg2\tN\tyes\t180\t150\t250\t50\t-30\tCS\t"));

        let line = format_record(&record, None);
        assert!(line.starts_with("0\t1\tN\t"));
    }
}
