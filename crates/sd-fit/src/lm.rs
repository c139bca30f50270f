//! Levenberg-Marquardt least squares with a hard iteration cap.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FitError, FitResult};

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Maximum accepted-or-rejected iterations
    pub max_iterations: usize,
    /// Relative cost decrease below which an accepted step counts as converged
    pub cost_rel_tol: f64,
    /// Relative step size below which an accepted step counts as converged
    pub step_tol: f64,
    /// Cosine between residual and every Jacobian column below which the
    /// gradient is considered zero
    pub grad_tol: f64,
    /// Relative Gauss-Newton step below which a point where no damping
    /// lowers the cost is accepted as stationary
    pub stall_step_tol: f64,
    /// Initial Marquardt damping
    pub initial_damping: f64,
    /// Damping multiplier after a rejected step
    pub damping_up: f64,
    /// Damping multiplier after an accepted step
    pub damping_down: f64,
    /// Damping past which the solver gives up
    pub max_damping: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            cost_rel_tol: 1e-14,
            step_tol: 1e-12,
            grad_tol: 1e-12,
            stall_step_tol: 1e-8,
            initial_damping: 1e-3,
            damping_up: 10.0,
            damping_down: 0.1,
            max_damping: 1e16,
        }
    }
}

/// Converged solution.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Parameter vector
    pub x: DVector<f64>,
    /// Final sum of squared residuals
    pub cost: f64,
    /// Iterations used
    pub iterations: usize,
}

// Largest |cos| between the residual and any Jacobian column.
fn gradient_cosine(jac: &DMatrix<f64>, r: &DVector<f64>, g: &DVector<f64>) -> f64 {
    let r_norm = r.norm();
    if r_norm == 0.0 {
        return 0.0;
    }
    (0..jac.ncols())
        .map(|k| g[k].abs() / (jac.column(k).norm() * r_norm))
        .fold(0.0, f64::max)
}

// Gauss-Newton step relative to |x|, the scale-free stationarity test.
fn is_stationary(jtj: &DMatrix<f64>, g: &DVector<f64>, x: &DVector<f64>, tol: f64) -> bool {
    match jtj.clone().lu().solve(&(-g)) {
        Some(dx) => dx.iter().all(|v| v.is_finite()) && dx.norm() <= tol * (x.norm() + tol),
        None => false,
    }
}

/// Minimise `|r(x)|^2` starting from `x0`.
///
/// Convergence never looks at the absolute size of the cost, so data of any
/// magnitude is fitted to the same relative accuracy.
///
/// Fails with [`FitError::DidNotConverge`] when the iteration cap is hit,
/// when no damping makes progress, or when a Jacobian column vanishes (the
/// data carries no information about that parameter).
pub fn levenberg_marquardt<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &FitConfig,
) -> FitResult<LmResult>
where
    F: Fn(&DVector<f64>) -> FitResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> FitResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut cost = r.norm_squared();
    if !cost.is_finite() {
        return Err(FitError::NonFinite {
            what: "residual at initial guess".to_string(),
        });
    }
    let mut damping = config.initial_damping;

    for iter in 0..config.max_iterations {
        let jac = jacobian_fn(&x)?;
        let jtj = jac.transpose() * &jac;
        let g = jac.transpose() * &r;

        if let Some(k) = (0..jtj.nrows()).find(|&k| !(jtj[(k, k)] > f64::MIN_POSITIVE)) {
            return Err(FitError::DidNotConverge {
                what: format!("parameter {k} has a degenerate Jacobian column"),
                iterations: iter,
            });
        }

        // Scale-free: an exact fit has a zero residual and cosine 0
        if gradient_cosine(&jac, &r, &g) <= config.grad_tol {
            debug!(iterations = iter, cost, "fit converged");
            return Ok(LmResult {
                x,
                cost,
                iterations: iter,
            });
        }

        // Solve (JtJ + damping * diag(JtJ)) dx = -g, raising damping until cost drops
        let accepted = loop {
            let mut lhs = jtj.clone();
            for k in 0..lhs.nrows() {
                lhs[(k, k)] += damping * jtj[(k, k)];
            }

            let step = lhs.lu().solve(&(-&g));
            if let Some(dx) = step {
                let x_new = &x + &dx;
                let r_new = residual_fn(&x_new)?;
                let cost_new = r_new.norm_squared();
                if cost_new.is_finite() && cost_new < cost {
                    break Some((dx, x_new, r_new, cost_new));
                }
            }

            damping *= config.damping_up;
            if damping > config.max_damping {
                break None;
            }
        };

        let Some((dx, x_new, r_new, cost_new)) = accepted else {
            // Residual is at round-off level when the undamped step is negligible
            if is_stationary(&jtj, &g, &x, config.stall_step_tol) {
                debug!(iterations = iter, cost, "fit stalled at a stationary point");
                return Ok(LmResult {
                    x,
                    cost,
                    iterations: iter,
                });
            }
            return Err(FitError::DidNotConverge {
                what: format!("no descent step at cost {cost:e}"),
                iterations: iter,
            });
        };

        let small_step = dx.norm() <= config.step_tol * (x.norm() + config.step_tol);
        let small_decrease = cost - cost_new <= config.cost_rel_tol * cost;

        x = x_new;
        r = r_new;
        cost = cost_new;
        damping = (damping * config.damping_down).max(f64::EPSILON);

        if small_step || small_decrease {
            debug!(iterations = iter + 1, cost, "fit converged");
            return Ok(LmResult {
                x,
                cost,
                iterations: iter + 1,
            });
        }
    }

    Err(FitError::DidNotConverge {
        what: format!("iteration cap reached, cost = {cost:e}"),
        iterations: config.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_least_squares() {
        // y = 2x + 1 sampled exactly
        let xs = [0.0, 1.0, 2.0, 3.0];
        let residual = |p: &DVector<f64>| -> FitResult<DVector<f64>> {
            Ok(DVector::from_iterator(
                xs.len(),
                xs.iter().map(|&x| p[0] * x + p[1] - (2.0 * x + 1.0)),
            ))
        };
        let jacobian = |_: &DVector<f64>| -> FitResult<DMatrix<f64>> {
            Ok(DMatrix::from_fn(xs.len(), 2, |i, k| if k == 0 { xs[i] } else { 1.0 }))
        };

        let result = levenberg_marquardt(
            DVector::from_vec(vec![0.0, 0.0]),
            residual,
            jacobian,
            &FitConfig::default(),
        )
        .unwrap();

        assert!((result.x[0] - 2.0).abs() < 1e-8);
        assert!((result.x[1] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn zero_jacobian_is_reported() {
        let residual =
            |_: &DVector<f64>| -> FitResult<DVector<f64>> { Ok(DVector::from_element(3, 1.0)) };
        let jacobian =
            |_: &DVector<f64>| -> FitResult<DMatrix<f64>> { Ok(DMatrix::zeros(3, 1)) };

        let err = levenberg_marquardt(
            DVector::from_element(1, 0.0),
            residual,
            jacobian,
            &FitConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, FitError::DidNotConverge { iterations: 0, .. }));
    }

    #[test]
    fn tiny_residuals_do_not_stop_early() {
        // Samples near 1e-18: the cost is tiny long before the slope is right
        let t: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = t.iter().map(|&ti| 1e-18 * (-40.0 * ti).exp()).collect();
        let residual = |p: &DVector<f64>| -> FitResult<DVector<f64>> {
            Ok(DVector::from_iterator(
                t.len(),
                t.iter().zip(&y).map(|(&ti, &yi)| 1e-18 * (-p[0] * ti).exp() - yi),
            ))
        };
        let jacobian = |p: &DVector<f64>| -> FitResult<DMatrix<f64>> {
            Ok(DMatrix::from_fn(t.len(), 1, |i, _| {
                -t[i] * 1e-18 * (-p[0] * t[i]).exp()
            }))
        };

        let result = levenberg_marquardt(
            DVector::from_element(1, 0.0),
            residual,
            jacobian,
            &FitConfig::default(),
        )
        .unwrap();

        assert!((result.x[0] - 40.0).abs() < 1e-6 * 40.0);
    }

    #[test]
    fn iteration_cap_is_enforced() {
        // Root of (x - 1e6)^3 is far away; one iteration cannot reach it
        let residual = |p: &DVector<f64>| -> FitResult<DVector<f64>> {
            Ok(DVector::from_element(1, (p[0] - 1e6).powi(3)))
        };
        let jacobian = |p: &DVector<f64>| -> FitResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 3.0 * (p[0] - 1e6).powi(2)))
        };
        let config = FitConfig {
            max_iterations: 1,
            ..FitConfig::default()
        };

        let err =
            levenberg_marquardt(DVector::from_element(1, 0.0), residual, jacobian, &config)
                .unwrap_err();

        assert!(matches!(err, FitError::DidNotConverge { iterations: 1, .. }));
    }
}
