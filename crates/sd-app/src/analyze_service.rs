//! Parse an output file and run the profile's analysis on it.

use std::path::{Path, PathBuf};

use sd_diag::{DiagnosticReport, analyze};
use sd_format::{Dataset, ParameterSet, read_dataset_path};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::profile::AnalysisProfile;

/// One analyzed file: its parameters alongside the diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub schema: String,
    pub params: ParameterSet,
    pub report: DiagnosticReport,
}

/// Run the profile's analysis on an already parsed dataset.
pub fn analyze_dataset(
    dataset: &Dataset,
    profile: &AnalysisProfile,
) -> AppResult<DiagnosticReport> {
    let theory = profile.theory_for(&dataset.params)?;
    let kind = profile.analysis_kind();
    debug!(?kind, ?theory, "running analysis");
    Ok(analyze(dataset, kind, &profile.diagnostics, theory)?)
}

/// Parse `path` with the profile's schema and analyze it.
pub fn analyze_file(path: &Path, profile: &AnalysisProfile) -> AppResult<FileAnalysis> {
    let schema = profile.schema.schema();
    let dataset = read_dataset_path(path, &schema)?;
    let report = analyze_dataset(&dataset, profile)?;

    info!(
        path = %path.display(),
        schema = %schema.name,
        converged = report.experimental.is_converged(),
        "analyzed output file"
    );

    Ok(FileAnalysis {
        path: path.to_path_buf(),
        schema: schema.name,
        params: dataset.params,
        report,
    })
}
