use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod input;

use config::Config;

#[derive(Parser)]
#[command(name = "chunkolap")]
#[command(about = "chunkolap - overlap discovery between assembly graph chunks")]
#[command(version)]
#[command(long_about = "
chunkolap aligns assembly chunks against each other inside expected overlap
windows, keeps every result in a persistent overlap cache and turns confirmed
overlaps into graph edges.

Examples:
  chunkolap discover --chunks contigs.fa --hints hints.tsv --cache overlaps.olap --edges edges.tsv
  chunkolap query --chunks contigs.fa --cache overlaps.olap --a ctg1 --b ctg2 --orientation N --min 150 --max 250
  chunkolap quality --chunks contigs.fq --cache overlaps.olap
  chunkolap dump --cache overlaps.olap --json
  chunkolap config > chunkolap.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute every pending overlap proposed by a hint table
    Discover {
        /// Chunk sequences (FASTA/FASTQ, optionally gzipped)
        #[arg(long, required = true)]
        chunks: PathBuf,

        /// Overlap hint table
        #[arg(long)]
        hints: Option<PathBuf>,

        /// Overlap cache file; read if it exists, always written back
        #[arg(long, required = true)]
        cache: PathBuf,

        /// Write the resulting overlap edges as a table
        #[arg(long)]
        edges: Option<PathBuf>,

        /// Recompute windows proposed by the upstream overlap builder
        #[arg(long)]
        force_recompute: bool,

        /// Do not add discovered overlaps to the graph
        #[arg(long)]
        no_edges: bool,
    },

    /// Look up or compute the overlap of a single pair
    Query {
        /// Chunk sequences (FASTA/FASTQ, optionally gzipped)
        #[arg(long, required = true)]
        chunks: PathBuf,

        /// Overlap cache file
        #[arg(long)]
        cache: Option<PathBuf>,

        /// First chunk name
        #[arg(long, required = true)]
        a: String,

        /// Second chunk name
        #[arg(long, required = true)]
        b: String,

        /// Orientation (N, I, O or A)
        #[arg(long, default_value = "N")]
        orientation: String,

        /// Smallest admissible overlap length
        #[arg(long, required = true, allow_hyphen_values = true)]
        min: i64,

        /// Largest admissible overlap length
        #[arg(long, required = true, allow_hyphen_values = true)]
        max: i64,

        /// Error-rate ceiling (defaults to the configured one)
        #[arg(long)]
        error_rate: Option<f32>,

        /// Store a new result in the cache
        #[arg(long)]
        insert: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score every confirmed overlap of a cache from base qualities
    Quality {
        /// Chunk sequences with qualities (FASTQ, or FASTA for default qualities)
        #[arg(long, required = true)]
        chunks: PathBuf,

        /// Overlap cache file, updated in place
        #[arg(long, required = true)]
        cache: PathBuf,

        /// Quality function
        #[arg(long, default_value = "bayesian")]
        function: String,
    },

    /// List the records of an overlap cache
    Dump {
        /// Overlap cache file
        #[arg(long, required = true)]
        cache: PathBuf,

        /// Chunk sequences, to print names instead of ids
        #[arg(long)]
        chunks: Option<PathBuf>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print an example configuration file
    Config,
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose, cli.quiet)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Execute the requested command
    match cli.command {
        Commands::Discover {
            chunks,
            hints,
            cache,
            edges,
            force_recompute,
            no_edges,
        } => {
            commands::discover::execute(&config, chunks, hints, cache, edges, force_recompute, no_edges)?;
        }

        Commands::Query {
            chunks,
            cache,
            a,
            b,
            orientation,
            min,
            max,
            error_rate,
            insert,
            json,
        } => {
            let request = commands::query::PairRequest {
                a,
                b,
                orientation,
                min,
                max,
                error_rate,
                insert,
            };
            commands::query::execute(&config, chunks, cache, request, json)?;
        }

        Commands::Quality { chunks, cache, function } => {
            commands::quality::execute(&config, chunks, cache, function)?;
        }

        Commands::Dump { cache, chunks, json } => {
            commands::dump::execute(cache, chunks, json)?;
        }

        Commands::Config => {
            print!("{}", Config::example_toml()?);
        }
    }

    Ok(())
}
