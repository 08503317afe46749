//! Orchestrates one end-to-end run: analyze a source tree, assign ids,
//! and write the `.mse` output file.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use somix_core::error::OutputError;
use somix_core::serializer::{assign_ids, write_mse};
use somix_python::AnalyzeError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

pub struct RunReport {
    pub output_path: PathBuf,
    pub iterations: u32,
    pub converged: bool,
    pub files_skipped: usize,
    pub groupings: usize,
    pub codes: usize,
    pub datas: usize,
}

pub fn run(base_path: &Path, output_dir: &Path) -> Result<RunReport, PipelineError> {
    tracing::info!(base_path = %base_path.display(), "starting analysis");

    let outcome = somix_python::analyze_directory(base_path)?;
    tracing::info!(
        iterations = outcome.iterations,
        converged = outcome.converged,
        files_skipped = outcome.files_skipped,
        groupings = outcome.model.groupings.len(),
        codes = outcome.model.codes.len(),
        datas = outcome.model.datas.len(),
        "analysis complete"
    );

    let mut model = outcome.model;
    let id_map = assign_ids(&mut model);

    fs::create_dir_all(output_dir).map_err(|source| OutputError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let output_path = output_dir.join(output_filename(base_path));

    let file = File::create(&output_path).map_err(|source| OutputError::Write {
        path: output_path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_mse(&model, &id_map, &mut writer).map_err(|source| OutputError::Write {
        path: output_path.clone(),
        source,
    })?;

    Ok(RunReport {
        output_path,
        iterations: outcome.iterations,
        converged: outcome.converged,
        files_skipped: outcome.files_skipped,
        groupings: model.groupings.len(),
        codes: model.codes.len(),
        datas: model.datas.len(),
    })
}

/// `<repo_basename>_<YYYYMMDD_HHMMSS>.mse`
fn output_filename(base_path: &Path) -> String {
    let repo_basename = base_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "somix".to_string());
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("{repo_basename}_{timestamp}.mse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_filename_uses_repo_basename_and_timestamp_pattern() {
        let name = output_filename(Path::new("/repos/my-project"));
        assert!(name.starts_with("my-project_"));
        assert!(name.ends_with(".mse"));
    }

    #[test]
    fn run_produces_an_mse_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            src_dir.path().join("mod.py"),
            "class C:\n    def f(self):\n        pass\n",
        )
        .unwrap();

        let report = run(src_dir.path(), out_dir.path()).unwrap();
        assert!(report.output_path.exists());
        let content = std::fs::read_to_string(&report.output_path).unwrap();
        assert!(content.contains("SOMIX.Grouping"));
        assert!(content.contains("SOMIX.Code"));
    }
}
