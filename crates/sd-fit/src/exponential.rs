//! Exponential decay/growth model `y(t) = A exp(-sigma t)`.

use nalgebra::{DMatrix, DVector};
use sd_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};
use crate::lm::{FitConfig, levenberg_marquardt};

/// Which parameters the fit is free to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitModel {
    /// `A = y[0]`, only `sigma` is fitted
    #[default]
    FixedAmplitude,
    /// Both `A` and `sigma` are fitted, `A` seeded with `y[0]`
    FreeAmplitude,
}

/// Fitted exponential.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpFit {
    pub amplitude: f64,
    /// Positive for decay, negative for growth
    pub sigma: f64,
    pub cost: f64,
    pub iterations: usize,
}

/// Fit `y ≈ A exp(-sigma t)` by least squares, seeding `sigma` with `seed`.
pub fn fit_exponential_decay(
    t: &[f64],
    y: &[f64],
    model: FitModel,
    seed: f64,
    config: &FitConfig,
) -> FitResult<ExpFit> {
    if t.len() != y.len() {
        return Err(FitError::InsufficientData {
            what: format!("{} times for {} samples", t.len(), y.len()),
        });
    }
    if y.len() < 2 {
        return Err(FitError::InsufficientData {
            what: format!("{} sample(s), need at least 2", y.len()),
        });
    }
    for (&ti, &yi) in t.iter().zip(y) {
        ensure_finite(ti, "sample time")?;
        ensure_finite(yi, "sample value")?;
    }
    ensure_finite(seed, "rate seed")?;

    let n = y.len();
    let a0 = y[0];

    let result = match model {
        FitModel::FixedAmplitude => {
            let residual = |p: &DVector<f64>| -> FitResult<DVector<f64>> {
                Ok(DVector::from_iterator(
                    n,
                    t.iter()
                        .zip(y)
                        .map(|(&ti, &yi)| a0 * (-p[0] * ti).exp() - yi),
                ))
            };
            let jacobian = |p: &DVector<f64>| -> FitResult<DMatrix<f64>> {
                Ok(DMatrix::from_fn(n, 1, |i, _| {
                    -t[i] * a0 * (-p[0] * t[i]).exp()
                }))
            };
            let fit = levenberg_marquardt(DVector::from_element(1, seed), residual, jacobian, config)?;
            ExpFit {
                amplitude: a0,
                sigma: fit.x[0],
                cost: fit.cost,
                iterations: fit.iterations,
            }
        }
        FitModel::FreeAmplitude => {
            let residual = |p: &DVector<f64>| -> FitResult<DVector<f64>> {
                Ok(DVector::from_iterator(
                    n,
                    t.iter()
                        .zip(y)
                        .map(|(&ti, &yi)| p[0] * (-p[1] * ti).exp() - yi),
                ))
            };
            let jacobian = |p: &DVector<f64>| -> FitResult<DMatrix<f64>> {
                Ok(DMatrix::from_fn(n, 2, |i, k| {
                    let e = (-p[1] * t[i]).exp();
                    if k == 0 { e } else { -t[i] * p[0] * e }
                }))
            };
            let fit = levenberg_marquardt(
                DVector::from_vec(vec![a0, seed]),
                residual,
                jacobian,
                config,
            )?;
            ExpFit {
                amplitude: fit.x[0],
                sigma: fit.x[1],
                cost: fit.cost,
                iterations: fit.iterations,
            }
        }
    };

    Ok(result)
}
