//! Two-phase Python semantic analyzer.
//!
//! `analyze_directory` walks a source tree for `.py` files, runs the
//! Definition Collector (`collector`) over every file once, then hands the
//! result to the Fixpoint Driver (`fixpoint`), which repeatedly runs the
//! Usage Analyzer (`usage`) until parameter-type inference stops changing
//! anything or a hard iteration ceiling is reached.
//!
//! `resolver` and `type_env` hold the name-resolution and type-inference
//! machinery shared by the collector and usage passes; `scope` is the
//! lexical-scope stack both walk; `builtins` is the fixed call-ignore set;
//! `syntax` wraps the external parser.

pub mod builtins;
pub mod collector;
pub mod fixpoint;
pub mod resolver;
pub mod scope;
pub mod syntax;
pub mod type_env;
pub mod usage;

use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;

use somix_core::model::Model;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("base path is not a readable directory: {0}")]
    BasePathUnreadable(String),
}

/// The full result of analyzing a source tree.
pub struct AnalysisOutcome {
    pub model: Model,
    pub iterations: u32,
    pub converged: bool,
    /// Files that failed to parse and were skipped (count only; details
    /// are logged at `warn` level as they're encountered).
    pub files_skipped: usize,
}

/// Walk `base_path` for `.py` files (sorted by relative path for
/// deterministic id assignment downstream), run the Definition Collector
/// over all of them, then drive the Usage Analyzer to a fixpoint.
pub fn analyze_directory(base_path: &Path) -> Result<AnalysisOutcome, AnalyzeError> {
    if !base_path.is_dir() {
        return Err(AnalyzeError::BasePathUnreadable(
            base_path.display().to_string(),
        ));
    }

    let mut py_files: Vec<_> = WalkDir::new(base_path)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "py"))
        .map(|entry| entry.path().to_path_buf())
        .collect();
    py_files.sort();

    let mut modules = Vec::new();
    let mut files_skipped = 0usize;
    for path in &py_files {
        match syntax::parse_file(path, base_path) {
            Ok(parsed) => modules.push(parsed),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping file that failed to parse");
                files_skipped += 1;
            }
        }
    }

    let mut model = Model::new();
    for parsed in &modules {
        collector::collect_definitions(&mut model, parsed);
    }

    let result = fixpoint::run(&mut model, &modules);

    Ok(AnalysisOutcome {
        model,
        iterations: result.iterations,
        converged: result.converged,
        files_skipped,
    })
}
