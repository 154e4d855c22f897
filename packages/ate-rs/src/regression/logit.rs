// src/regression/logit.rs

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::linalg::solve_linear_system;
use crate::utils::{AteError, Result};

/// Fitted probabilities are clipped to `[PROPENSITY_EPS, 1 - PROPENSITY_EPS]`
/// so that inverse-probability weights stay finite.
pub const PROPENSITY_EPS: f64 = 1e-6;

/// Options for the IRLS logistic fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitOptions {
    pub max_iter: usize,
    /// Convergence threshold on the largest absolute coefficient update.
    pub tol: f64,
    /// Ridge penalty on every coefficient except the intercept (column 0).
    pub l2_penalty: f64,
}

impl Default for LogitOptions {
    fn default() -> Self {
        Self { max_iter: 100, tol: 1e-8, l2_penalty: 0.0 }
    }
}

#[derive(Debug, Clone)]
pub struct LogisticModel {
    coefficients: Array1<f64>,
    iterations: usize,
}

impl LogisticModel {
    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// `P(D = 1 | x)` for each row, clipped away from 0 and 1.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(AteError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients)
            .mapv(|eta| sigmoid(eta).clamp(PROPENSITY_EPS, 1.0 - PROPENSITY_EPS)))
    }
}

/// Maximum-likelihood logistic regression by iteratively reweighted least
/// squares (Newton-Raphson).
///
/// # Arguments
/// * `x` - Design matrix with intercept column (n_obs, n_cols)
/// * `d` - Binary response, 0/1 (n_obs,)
/// * `opts` - Iteration cap, step tolerance, ridge penalty
///
/// # Errors
/// `Convergence` when the response has a single class, when the Hessian is
/// singular (collinear design), or when the coefficients diverge or do not
/// settle within `max_iter` Newton steps (perfect separation).
pub fn fit_logistic(
    x: ArrayView2<f64>,
    d: ArrayView1<f64>,
    opts: &LogitOptions,
) -> Result<LogisticModel> {
    let (n_obs, n_cols) = x.dim();

    if d.len() != n_obs {
        return Err(AteError::DimensionMismatch { expected: n_obs, got: d.len() });
    }
    if n_obs == 0 {
        return Err(AteError::Convergence("no observations".to_string()));
    }

    let n_pos = d.iter().filter(|&&v| v == 1.0).count();
    if n_pos == 0 || n_pos == n_obs {
        return Err(AteError::Convergence(format!(
            "response has a single class ({n_pos} of {n_obs} positive)"
        )));
    }

    let mut beta: Array1<f64> = Array1::zeros(n_cols);

    for iter in 1..=opts.max_iter {
        let p = x.dot(&beta).mapv(sigmoid);
        let w = p.mapv(|pi| pi * (1.0 - pi));

        // gradient = X'(d - p) - lambda * beta
        let mut grad = x.t().dot(&(&d - &p));
        // hessian = X' W X + lambda * I
        let xw = &x * &w.view().insert_axis(ndarray::Axis(1));
        let mut hess: Array2<f64> = x.t().dot(&xw);

        if opts.l2_penalty > 0.0 {
            for j in 1..n_cols {
                grad[j] -= opts.l2_penalty * beta[j];
                hess[[j, j]] += opts.l2_penalty;
            }
        }

        let delta = solve_linear_system(&hess, &grad).map_err(|_| {
            AteError::Convergence(format!("singular Hessian at iteration {iter}"))
        })?;

        beta += &delta;

        if beta.iter().any(|b| !b.is_finite()) {
            return Err(AteError::Convergence(format!(
                "coefficients diverged at iteration {iter}"
            )));
        }

        let max_step = delta.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if max_step < opts.tol {
            return Ok(LogisticModel { coefficients: beta, iterations: iter });
        }
    }

    Err(AteError::Convergence(format!(
        "no convergence within {} iterations",
        opts.max_iter
    )))
}

#[inline]
fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}
