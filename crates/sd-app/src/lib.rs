//! Shared application service layer for simdiag.
//!
//! Ties the parser and the diagnostics engine together for the CLI:
//! analysis profiles, single-file analysis, parallel sweeps with a results
//! table, and report rendering.

pub mod analyze_service;
pub mod batch;
pub mod error;
pub mod profile;
pub mod render;

pub use analyze_service::{FileAnalysis, analyze_dataset, analyze_file};
pub use batch::{BatchEntry, analyze_batch, write_results_table};
pub use error::{AppError, AppResult};
pub use profile::{
    AnalysisProfile, SchemaSource, TheoryModel, default_kind, default_theory, load_profile,
};
pub use render::{OutputMode, format_significant, render_report};
