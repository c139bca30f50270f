//! Parameter sweeps: analyze many output files and tabulate the results.

use std::io::Write;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::warn;

use crate::analyze_service::{FileAnalysis, analyze_file};
use crate::error::{AppError, AppResult};
use crate::profile::AnalysisProfile;

/// Outcome for one file of a sweep. A failure stays with its file.
#[derive(Debug)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub outcome: AppResult<FileAnalysis>,
}

impl BatchEntry {
    pub fn analysis(&self) -> Option<&FileAnalysis> {
        self.outcome.as_ref().ok()
    }
}

/// Analyze every file with the same profile. Entries come back in input order.
pub fn analyze_batch(paths: &[PathBuf], profile: &AnalysisProfile) -> Vec<BatchEntry> {
    paths
        .par_iter()
        .map(|path| {
            let outcome = analyze_file(path, profile);
            if let Err(e) = &outcome {
                warn!(path = %path.display(), error = %e, "analysis failed");
            }
            BatchEntry {
                path: path.clone(),
                outcome,
            }
        })
        .collect()
}

fn cell(v: Option<f64>) -> String {
    v.map_or_else(|| "nan".to_string(), |v| v.to_string())
}

/// Write a space-separated results table with a header row:
/// `file <columns...> sigma converged explosion_t shock_t`.
///
/// Failed entries are skipped. Returns the number of rows written.
pub fn write_results_table<W: Write>(
    entries: &[BatchEntry],
    columns: &[String],
    mut writer: W,
) -> AppResult<usize> {
    if let Some(bad) = columns.iter().find(|c| c.is_empty() || c.contains(' ')) {
        return Err(AppError::InvalidInput(format!(
            "Column name '{}' cannot be written to a space-separated table",
            bad
        )));
    }

    let mut header = vec!["file".to_string()];
    header.extend(columns.iter().cloned());
    header.extend(
        ["sigma", "converged", "explosion_t", "shock_t"]
            .iter()
            .map(|s| s.to_string()),
    );
    writeln!(writer, "{}", header.join(" "))?;

    let mut written = 0;
    for entry in entries {
        let Some(analysis) = entry.analysis() else {
            continue;
        };
        let report = &analysis.report;
        let mut row = vec![entry.path.display().to_string().replace(' ', "_")];
        row.extend(
            columns
                .iter()
                .map(|c| cell(analysis.params.get_f64(c))),
        );
        row.push(cell(report.experimental.measured()));
        row.push(report.experimental.is_converged().to_string());
        row.push(cell(report.explosion.map(|e| e.time)));
        row.push(cell(report.shock.map(|e| e.time)));
        writeln!(writer, "{}", row.join(" "))?;
        written += 1;
    }
    Ok(written)
}
