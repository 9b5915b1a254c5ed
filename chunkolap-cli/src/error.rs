//! Error handling for the chunkolap CLI

use std::path::PathBuf;
use thiserror::Error;

/// Input problems the CLI reports with a precise location
#[derive(Error, Debug)]
pub enum CliError {
    #[error("No sequences found in {path}")]
    EmptyInput { path: PathBuf },

    #[error("Duplicate chunk name: {name}")]
    DuplicateChunk { name: String },

    #[error("Unknown chunk name: {name}")]
    UnknownChunk { name: String },

    #[error("Parsing error in {file} line {line}: {message}")]
    Parse { file: String, line: usize, message: String },
}

impl CliError {
    pub fn unknown_chunk<S: Into<String>>(name: S) -> Self {
        Self::UnknownChunk { name: name.into() }
    }

    pub fn parse<S: Into<String>>(file: S, line: usize, message: S) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}
