//! Chunk sequences and overlap hint tables.
//!
//! Chunks are read from FASTA/FASTQ with needletail; every record becomes one
//! chunk, numbered in file order. FASTQ qualities are Phred+33; FASTA records
//! get the default quality.
//!
//! Hint tables are tab- or space-separated, one pair per line:
//!
//! ```text
//! # name_a  name_b  orientation  mean_overlap  stddev  [source]  [quality]
//! ctg1      ctg2    N            200           15
//! ctg2      ctg5    I            1200          80      builder   0.98
//! ```
//!
//! `source` is `align` (default) or `builder`; a quality column marks the
//! hint's quality as Bayesian.

use anyhow::{Context, Result};
use chunkolap_core::{ChunkGraph, MemoryGraph, Orientation, OverlapHint};
use needletail::parse_fastx_file;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::CliError;

const PHRED_OFFSET: u8 = 33;

/// Load every record of a FASTA/FASTQ file as a chunk.
pub fn load_chunks(path: &Path) -> Result<MemoryGraph> {
    let mut reader = parse_fastx_file(path)
        .with_context(|| format!("Failed to open sequence file: {}", path.display()))?;

    let mut graph = MemoryGraph::new();
    let mut names = HashSet::new();
    while let Some(record) = reader.next() {
        let record = record.with_context(|| format!("Failed to parse sequence file: {}", path.display()))?;
        let id = String::from_utf8_lossy(record.id()).to_string();
        let name = id.split_whitespace().next().unwrap_or_default().to_string();
        if !names.insert(name.clone()) {
            return Err(CliError::DuplicateChunk { name }.into());
        }

        let sequence = record.seq().to_vec();
        match record.qual() {
            Some(qual) => {
                let quality = qual.iter().map(|q| q.saturating_sub(PHRED_OFFSET)).collect();
                graph
                    .add_chunk_with_quality(name, sequence, quality)
                    .with_context(|| format!("Bad quality string in {}", path.display()))?;
            }
            None => {
                graph.add_chunk(name, sequence);
            }
        }
    }

    if graph.node_count() == 0 {
        return Err(CliError::EmptyInput { path: path.to_path_buf() }.into());
    }
    log::info!("Loaded {} chunks from {}", graph.node_count(), path.display());
    Ok(graph)
}

/// Read a hint table, resolving chunk names against `graph`.
pub fn load_hints(path: &Path, graph: &MemoryGraph) -> Result<Vec<OverlapHint>> {
    let file = File::open(path).with_context(|| format!("Failed to open hint file: {}", path.display()))?;
    let hints = parse_hints(BufReader::new(file), &path.display().to_string(), graph)?;
    log::info!("Read {} overlap hints from {}", hints.len(), path.display());
    Ok(hints)
}

pub fn parse_hints<R: BufRead>(reader: R, source: &str, graph: &MemoryGraph) -> Result<Vec<OverlapHint>> {
    let mut hints = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", source))?;
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if !(5..=7).contains(&fields.len()) {
            return Err(CliError::parse(source, line_no, "expected 5 to 7 columns").into());
        }
        let resolve = |name: &str| graph.chunk_by_name(name).ok_or_else(|| CliError::unknown_chunk(name));
        let id_a = resolve(fields[0])?;
        let id_b = resolve(fields[1])?;
        let orientation = fields[2]
            .parse::<Orientation>()
            .map_err(|e: String| CliError::parse(source.to_string(), line_no, e))?;
        let mean_overlap: f64 = fields[3]
            .parse()
            .map_err(|_| CliError::parse(source, line_no, "mean overlap is not a number"))?;
        let delta_overlap: f64 = fields[4]
            .parse()
            .map_err(|_| CliError::parse(source, line_no, "standard deviation is not a number"))?;
        let from_external_builder = match fields.get(5).copied() {
            None | Some("align") => false,
            Some("builder") => true,
            Some(_) => return Err(CliError::parse(source, line_no, "source must be 'align' or 'builder'").into()),
        };
        let quality = match fields.get(6) {
            Some(q) => Some(
                q.parse::<f32>()
                    .map_err(|_| CliError::parse(source, line_no, "quality is not a number"))?,
            ),
            None => None,
        };

        hints.push(OverlapHint {
            id_a,
            id_b,
            orientation,
            mean_overlap,
            delta_overlap,
            quality: quality.unwrap_or(1.0),
            bayesian: quality.is_some(),
            from_external_builder,
        });
    }
    Ok(hints)
}

/// Write every overlap edge of `graph` as a tab-separated table.
pub fn write_edges(path: &Path, graph: &MemoryGraph) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create edge file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "#id\tname_a\tname_b\torientation\tmean\tstddev\tquality\tcontainment")?;
    for edge in graph.edges().iter().filter(|e| e.is_overlap) {
        let name = |id| graph.chunk(id).map(|c| c.name.as_str()).unwrap_or("?");
        let containment = if edge.a_contains_b {
            "a_contains_b"
        } else if edge.b_contains_a {
            "b_contains_a"
        } else {
            "-"
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{:.0}\t{:.2}\t{:.4}\t{}",
            edge.id,
            name(edge.id_a),
            name(edge.id_b),
            edge.orientation,
            edge.distance.mean,
            edge.distance.std_dev(),
            edge.quality,
            containment
        )?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn graph() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph.add_chunk("ctg1", b"ACGTACGT".to_vec());
        graph.add_chunk("ctg2", b"TTGGCCAA".to_vec());
        graph
    }

    #[test]
    fn test_parse_hints() -> Result<()> {
        let table = "# header\n\nctg1\tctg2\tN\t200\t15\nctg2 ctg1 I 1200 80 builder 0.98\n";
        let hints = parse_hints(Cursor::new(table), "hints", &graph())?;
        assert_eq!(hints.len(), 2);

        assert_eq!((hints[0].id_a, hints[0].id_b), (0, 1));
        assert_eq!(hints[0].orientation, Orientation::Normal);
        assert_eq!(hints[0].mean_overlap, 200.0);
        assert!(!hints[0].from_external_builder && !hints[0].bayesian);

        assert_eq!(hints[1].orientation, Orientation::Innie);
        assert!(hints[1].from_external_builder && hints[1].bayesian);
        assert_eq!(hints[1].quality, 0.98);
        Ok(())
    }

    #[test]
    fn test_parse_hints_rejects_unknown_chunk() {
        let result = parse_hints(Cursor::new("ctg1 ctg9 N 200 15\n"), "hints", &graph());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("ctg9"));
    }

    #[test]
    fn test_parse_hints_reports_line() {
        let result = parse_hints(Cursor::new("ctg1 ctg2 N 200 15\nctg1 ctg2 X 200 15\n"), "hints", &graph());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("line 2"));
    }

    #[test]
    fn test_load_fastq_chunks() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "@read1 extra\nACGT\n+\nIIII\n@read2\nGGCC\n+\n!!!!\n")?;
        file.flush()?;

        let graph = load_chunks(file.path())?;
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.chunk_by_name("read1"), Some(0));
        assert_eq!(graph.chunk(0)?.quality, vec![40; 4]);
        assert_eq!(graph.chunk(1)?.quality, vec![0; 4]);
        Ok(())
    }

    #[test]
    fn test_duplicate_names_rejected() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, ">ctg1\nACGT\n>ctg1\nGGCC\n")?;
        file.flush()?;
        assert!(load_chunks(file.path()).is_err());
        Ok(())
    }
}
