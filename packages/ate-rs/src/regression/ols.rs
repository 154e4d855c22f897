// src/regression/ols.rs

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::linalg::{solve_linear_system, solve_pseudo_inverse};
use crate::utils::{AteError, Result};

/// Ordinary least squares fit of `y` on `x`.
///
/// `x` is expected to carry its own intercept column. The normal equations
/// `X'X b = X'y` are solved directly; if `X'X` is singular (for example a
/// confounder that is constant inside a bootstrap resample) the
/// minimum-norm solution from the pseudo-inverse is returned instead.
///
/// # Returns
/// Coefficients in design-column order.
pub fn fit_ols(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Array1<f64>> {
    let (n_obs, n_cols) = x.dim();

    if y.len() != n_obs {
        return Err(AteError::DimensionMismatch { expected: n_obs, got: y.len() });
    }
    if n_obs == 0 {
        return Err(AteError::InvalidInput("cannot fit OLS on zero rows".to_string()));
    }

    let xtx: Array2<f64> = x.t().dot(&x);
    let xty: Array1<f64> = x.t().dot(&y);

    match solve_linear_system(&xtx, &xty) {
        Ok(beta) => Ok(beta),
        Err(AteError::SingularDesign { .. }) => {
            log::warn!("OLS design with {n_cols} columns is rank-deficient, using pseudo-inverse");
            solve_pseudo_inverse(&xtx, &xty)
        }
        Err(e) => Err(e),
    }
}

/// Fitted values `X b`.
pub fn predict(x: ArrayView2<f64>, beta: ArrayView1<f64>) -> Result<Array1<f64>> {
    if x.ncols() != beta.len() {
        return Err(AteError::DimensionMismatch { expected: x.ncols(), got: beta.len() });
    }
    Ok(x.dot(&beta))
}
