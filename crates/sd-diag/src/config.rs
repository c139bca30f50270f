//! Diagnostics thresholds and fit settings.

use sd_fit::{FitConfig, FitModel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Explosion when amplitude exceeds this multiple of the initial amplitude
    pub explosion_factor: f64,
    /// Shock formation when amplitude exceeds this multiple
    pub shock_factor: f64,
    /// Bulk fits stop at the first sample exceeding this multiple
    pub fit_end_factor: f64,
    /// Field magnitude below which the solution counts as settled
    pub equilibrium_tol: f64,
    pub fit_model: FitModel,
    pub fit: FitConfig,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            explosion_factor: 10.0,
            shock_factor: 1.1,
            fit_end_factor: 1.1,
            equilibrium_tol: 1e-8,
            fit_model: FitModel::FixedAmplitude,
            fit: FitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: DiagnosticsConfig =
            serde_yaml::from_str("explosion_factor: 40.0\nfit:\n  max_iterations: 50\n").unwrap();
        assert_eq!(config.explosion_factor, 40.0);
        assert_eq!(config.shock_factor, 1.1);
        assert_eq!(config.fit.max_iterations, 50);
        assert_eq!(config.fit_model, FitModel::FixedAmplitude);
    }

    #[test]
    fn free_amplitude_from_yaml() {
        let config: DiagnosticsConfig = serde_yaml::from_str("fit_model: free_amplitude\n").unwrap();
        assert_eq!(config.fit_model, FitModel::FreeAmplitude);
    }
}
