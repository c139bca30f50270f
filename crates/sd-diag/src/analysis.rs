//! Stability and damping analyses over a parsed dataset.

use sd_format::Dataset;
use tracing::debug;

use crate::amplitude::amplitude_series;
use crate::config::DiagnosticsConfig;
use crate::error::{DiagError, DiagResult};
use crate::events::{detect_equilibrium, detect_explosion, detect_shock, fit_window_end};
use crate::rate::{estimate_bulk_rate, estimate_pointwise_rate, relative_error};
use crate::report::{AnalysisKind, DiagnosticReport, RateEstimate};

pub fn analyze(
    dataset: &Dataset,
    kind: AnalysisKind,
    config: &DiagnosticsConfig,
    theory: Option<f64>,
) -> DiagResult<DiagnosticReport> {
    match kind {
        AnalysisKind::Stability => analyze_stability(dataset, config, theory),
        AnalysisKind::Damping => analyze_damping(dataset, config, theory),
    }
}

fn ensure_observed(dataset: &Dataset) -> DiagResult<()> {
    if dataset.field.observed_rows() == 0 {
        return Err(DiagError::NoSamples {
            what: "output has no time samples",
        });
    }
    Ok(())
}

fn estimate_from<T>(
    fit: DiagResult<T>,
    measured: impl FnOnce(T) -> RateEstimate,
) -> DiagResult<RateEstimate> {
    match fit {
        Ok(fit) => Ok(measured(fit)),
        Err(DiagError::FitDidNotConverge { seed, reason }) => {
            debug!(seed, %reason, "reporting unconverged rate");
            Ok(RateEstimate::Unconverged { seed, reason })
        }
        Err(e) => Err(e),
    }
}

/// Amplitude-based analysis: explosion and shock onset, then a bulk rate
/// fitted up to the first sample past `fit_end_factor`.
pub fn analyze_stability(
    dataset: &Dataset,
    config: &DiagnosticsConfig,
    theory: Option<f64>,
) -> DiagResult<DiagnosticReport> {
    ensure_observed(dataset)?;
    let time = dataset.observed_time();
    let amplitudes = amplitude_series(&dataset.field);

    let explosion = detect_explosion(&amplitudes, time, config.explosion_factor);
    let shock = detect_shock(&amplitudes, time, config.shock_factor);
    let equilibrium = detect_equilibrium(&dataset.field, time, config.equilibrium_tol);

    let end = fit_window_end(&amplitudes, config.fit_end_factor);
    let seed = theory.unwrap_or(0.0);
    let experimental = estimate_from(
        estimate_bulk_rate(&amplitudes, time, end, seed, config.fit_model, &config.fit),
        |fit| RateEstimate::Measured {
            sigma: fit.sigma,
            window: fit.window,
            failed_points: 0,
        },
    )?;

    let rel_err = theory
        .zip(experimental.measured())
        .and_then(|(th, m)| relative_error(th, m));

    Ok(DiagnosticReport {
        kind: AnalysisKind::Stability,
        theoretical_rate: theory,
        experimental,
        relative_error: rel_err,
        explosion,
        shock,
        equilibrium,
        observed_rows: dataset.field.observed_rows(),
        nominal_rows: dataset.field.nominal_rows(),
    })
}

/// Per-point analysis for diffusive decay: fit every spatial point up to
/// equilibrium and report the median rate against `theory`.
pub fn analyze_damping(
    dataset: &Dataset,
    config: &DiagnosticsConfig,
    theory: Option<f64>,
) -> DiagResult<DiagnosticReport> {
    ensure_observed(dataset)?;
    let time = dataset.observed_time();
    let amplitudes = amplitude_series(&dataset.field);

    let explosion = detect_explosion(&amplitudes, time, config.explosion_factor);
    let shock = detect_shock(&amplitudes, time, config.shock_factor);
    let equilibrium = detect_equilibrium(&dataset.field, time, config.equilibrium_tol);

    let end = equilibrium.map_or(time.len(), |e| e.index);
    let seed = theory.unwrap_or(0.0);
    let experimental = estimate_from(
        estimate_pointwise_rate(
            &dataset.field,
            time,
            end,
            seed,
            config.fit_model,
            &config.fit,
        ),
        |rate| RateEstimate::Measured {
            sigma: rate.sigma,
            window: rate.window,
            failed_points: rate.failed_points,
        },
    )?;

    let rel_err = theory
        .zip(experimental.measured())
        .and_then(|(th, m)| relative_error(th, m));

    Ok(DiagnosticReport {
        kind: AnalysisKind::Damping,
        theoretical_rate: theory,
        experimental,
        relative_error: rel_err,
        explosion,
        shock,
        equilibrium,
        observed_rows: dataset.field.observed_rows(),
        nominal_rows: dataset.field.nominal_rows(),
    })
}
