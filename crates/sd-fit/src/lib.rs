//! Bounded nonlinear least squares for rate estimation.
//!
//! A damped Gauss-Newton (Levenberg-Marquardt) solver over `nalgebra`
//! vectors, plus the exponential decay/growth models the diagnostics fit.
//! Every solve is capped at a fixed iteration count and reports failure
//! instead of handing back its seed.

pub mod error;
pub mod exponential;
pub mod lm;

pub use error::{FitError, FitResult};
pub use exponential::{ExpFit, FitModel, fit_exponential_decay};
pub use lm::{FitConfig, LmResult, levenberg_marquardt};
