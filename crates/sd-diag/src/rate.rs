//! Damping/growth rate estimation.

use rayon::prelude::*;
use sd_core::median;
use sd_fit::{FitConfig, FitModel, fit_exponential_decay};
use sd_format::Field;
use tracing::debug;

use crate::error::{DiagError, DiagResult};

/// Bulk fit of the amplitude series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateFit {
    /// Positive for damping, negative for growth
    pub sigma: f64,
    pub amplitude: f64,
    pub iterations: usize,
    pub cost: f64,
    /// Samples used, `[0, window)`
    pub window: usize,
}

/// Per-point fits aggregated by the median.
#[derive(Debug, Clone, PartialEq)]
pub struct PointwiseRate {
    /// Median over the converged points
    pub sigma: f64,
    /// `None` where the point's fit failed
    pub per_point: Vec<Option<f64>>,
    pub failed_points: usize,
    pub window: usize,
}

/// Closed-form decay rate of `sin(4 pi x)` under `u_t = nu u_xx`.
pub fn theoretical_heat_rate(nu: f64) -> f64 {
    16.0 * core::f64::consts::PI.powi(2) * nu
}

/// `(theory - measured) / measured`, `None` when that is not finite.
pub fn relative_error(theory: f64, measured: f64) -> Option<f64> {
    let e = (theory - measured) / measured;
    e.is_finite().then_some(e)
}

/// Fit `a[i] ≈ a[0] exp(-sigma t[i])` over `[0, end)`.
pub fn estimate_bulk_rate(
    amplitudes: &[f64],
    time: &[f64],
    end: usize,
    seed: f64,
    model: FitModel,
    config: &FitConfig,
) -> DiagResult<RateFit> {
    let end = end.min(amplitudes.len()).min(time.len());
    let fit = fit_exponential_decay(&time[..end], &amplitudes[..end], model, seed, config)
        .map_err(|e| DiagError::FitDidNotConverge {
            seed,
            reason: e.to_string(),
        })?;
    debug!(sigma = fit.sigma, window = end, "bulk rate fitted");
    Ok(RateFit {
        sigma: fit.sigma,
        amplitude: fit.amplitude,
        iterations: fit.iterations,
        cost: fit.cost,
        window: end,
    })
}

/// Fit every spatial point over `[0, end)` and take the median rate.
///
/// Points run in parallel; the result does not depend on scheduling since
/// each point's fit is independent and results are collected in index order.
pub fn estimate_pointwise_rate(
    field: &Field,
    time: &[f64],
    end: usize,
    seed: f64,
    model: FitModel,
    config: &FitConfig,
) -> DiagResult<PointwiseRate> {
    let end = end.min(field.observed_rows()).min(time.len());
    let t = &time[..end];

    let per_point: Vec<Option<f64>> = (0..field.nx())
        .into_par_iter()
        .map(|j| {
            let y = field.column(j, end)?;
            match fit_exponential_decay(t, &y, model, seed, config) {
                Ok(fit) => Some(fit.sigma),
                Err(e) => {
                    debug!(point = j, error = %e, "point fit failed");
                    None
                }
            }
        })
        .collect();

    let sigmas: Vec<f64> = per_point.iter().flatten().copied().collect();
    let failed_points = per_point.len() - sigmas.len();
    if sigmas.is_empty() {
        return Err(DiagError::FitDidNotConverge {
            seed,
            reason: format!("none of {failed_points} spatial points converged"),
        });
    }

    Ok(PointwiseRate {
        sigma: median(&sigmas)?,
        per_point,
        failed_points,
        window: end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decaying_field(sigma: f64, u0: &[f64], time: &[f64]) -> Field {
        let rows: Vec<Vec<f64>> = time
            .iter()
            .map(|&t| u0.iter().map(|&u| u * (-sigma * t).exp()).collect())
            .collect();
        Field::from_rows(u0.len(), &rows).unwrap()
    }

    #[test]
    fn theory_matches_closed_form() {
        assert!((theoretical_heat_rate(0.01) - 1.579_136_7).abs() < 1e-6);
    }

    #[test]
    fn relative_error_guards_zero() {
        assert_eq!(relative_error(1.0, 0.0), None);
        assert!((relative_error(1.1, 1.0).unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn bulk_rate_respects_window() {
        let time: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
        let mut amps: Vec<f64> = time.iter().map(|&t| (-2.0 * t).exp()).collect();
        // Samples after the window would pull the fit elsewhere
        amps[8] = 50.0;
        amps[9] = 80.0;
        let fit =
            estimate_bulk_rate(&amps, &time, 8, 0.0, FitModel::FixedAmplitude, &FitConfig::default())
                .unwrap();
        assert_eq!(fit.window, 8);
        assert!((fit.sigma - 2.0).abs() < 1e-8);
    }

    #[test]
    fn bulk_rate_on_zero_amplitudes_is_unconverged() {
        let amps = vec![0.0; 5];
        let time: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let err =
            estimate_bulk_rate(&amps, &time, 5, 0.3, FitModel::FixedAmplitude, &FitConfig::default())
                .unwrap_err();
        assert!(matches!(err, DiagError::FitDidNotConverge { seed, .. } if seed == 0.3));
    }

    #[test]
    fn pointwise_median_skips_dead_points() {
        let time: Vec<f64> = (0..12).map(|i| i as f64 * 0.05).collect();
        let field = decaying_field(3.0, &[0.0, 1.0, -0.5, 0.8, 0.0], &time);
        let rate = estimate_pointwise_rate(
            &field,
            &time,
            time.len(),
            0.0,
            FitModel::FixedAmplitude,
            &FitConfig::default(),
        )
        .unwrap();
        assert_eq!(rate.failed_points, 2);
        assert_eq!(rate.per_point[0], None);
        assert!((rate.sigma - 3.0).abs() < 1e-8);
    }

    #[test]
    fn pointwise_parallel_matches_sequential() {
        let time: Vec<f64> = (0..20).map(|i| i as f64 * 0.4).collect();
        let u0: Vec<f64> = (0..64)
            .map(|j| if j % 9 == 0 { 0.0 } else { (0.3 * j as f64).sin() })
            .collect();
        let field = decaying_field(2.5, &u0, &time);
        let config = FitConfig::default();

        let rate =
            estimate_pointwise_rate(&field, &time, 15, 0.0, FitModel::FixedAmplitude, &config)
                .unwrap();

        let sequential: Vec<Option<f64>> = (0..field.nx())
            .map(|j| {
                let y = field.column(j, 15).unwrap();
                fit_exponential_decay(&time[..15], &y, FitModel::FixedAmplitude, 0.0, &config)
                    .ok()
                    .map(|fit| fit.sigma)
            })
            .collect();
        assert_eq!(rate.per_point, sequential);
        assert_eq!(rate.window, 15);
        assert_eq!(rate.failed_points, sequential.iter().filter(|s| s.is_none()).count());
    }

    #[test]
    fn pointwise_all_dead_is_unconverged() {
        let time = [0.0, 1.0, 2.0];
        let field = decaying_field(1.0, &[0.0, 0.0], &time);
        let err = estimate_pointwise_rate(
            &field,
            &time,
            3,
            0.0,
            FitModel::FixedAmplitude,
            &FitConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DiagError::FitDidNotConverge { .. }));
    }
}
