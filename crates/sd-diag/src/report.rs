//! Structured analysis results handed to the reporting boundary.

use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Which rate estimate an analysis performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Amplitude fit with explosion/shock detection
    #[default]
    Stability,
    /// Per-point fit with equilibrium cut-off and median aggregation
    Damping,
}

/// Experimental rate, or the seed it fell back to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RateEstimate {
    Measured {
        sigma: f64,
        /// Samples used by the fit
        window: usize,
        /// Per-point fits that failed (damping only)
        failed_points: usize,
    },
    Unconverged {
        seed: f64,
        reason: String,
    },
}

impl RateEstimate {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Measured { .. })
    }

    /// Measured rate, `None` when unconverged.
    pub fn measured(&self) -> Option<f64> {
        match self {
            Self::Measured { sigma, .. } => Some(*sigma),
            Self::Unconverged { .. } => None,
        }
    }

    /// Measured rate, or the seed when unconverged.
    pub fn value(&self) -> f64 {
        match self {
            Self::Measured { sigma, .. } => *sigma,
            Self::Unconverged { seed, .. } => *seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub kind: AnalysisKind,
    pub theoretical_rate: Option<f64>,
    pub experimental: RateEstimate,
    pub relative_error: Option<f64>,
    pub explosion: Option<Event>,
    pub shock: Option<Event>,
    pub equilibrium: Option<Event>,
    pub observed_rows: usize,
    pub nominal_rows: usize,
}

impl DiagnosticReport {
    pub fn is_truncated(&self) -> bool {
        self.observed_rows < self.nominal_rows
    }
}
