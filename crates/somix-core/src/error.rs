//! Shared error types.
//!
//! Per-file syntax errors are not fatal (see `somix_python::AnalyzeError`);
//! the errors here are the ones that abort the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can surface while writing the `.mse` output file.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
