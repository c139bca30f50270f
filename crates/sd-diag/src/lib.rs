//! Diagnostics engine for parsed simulator output.
//!
//! Provides:
//! - amplitude extraction per time sample
//! - threshold-crossing events (explosion, shock formation) and equilibrium
//! - exponential rate fits over the pre-event window, bulk and per point
//! - stability and damping analyses producing a [`DiagnosticReport`]

pub mod amplitude;
pub mod analysis;
pub mod config;
pub mod error;
pub mod events;
pub mod rate;
pub mod report;

pub use amplitude::{amplitude_of, amplitude_series};
pub use analysis::{analyze, analyze_damping, analyze_stability};
pub use config::DiagnosticsConfig;
pub use error::{DiagError, DiagResult};
pub use events::{
    Event, EventKind, detect_equilibrium, detect_explosion, detect_shock, first_crossing,
    fit_window_end,
};
pub use rate::{
    PointwiseRate, RateFit, estimate_bulk_rate, estimate_pointwise_rate, relative_error,
    theoretical_heat_rate,
};
pub use report::{AnalysisKind, DiagnosticReport, RateEstimate};
