// src/utils.rs

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AteError {
    /// A model expression or adjustment set references something the dataset
    /// does not have, or the expression itself is malformed.
    #[error("Formula error: {0}")]
    Formula(String),

    #[error("Logistic regression did not converge: {0}")]
    Convergence(String),

    #[error("Singular design matrix with {cols} columns")]
    SingularDesign { cols: usize },

    #[error("Treatment arm D={arm} has no observations")]
    EmptyArm { arm: u8 },

    #[error("Estimator returned a non-finite value: {0}")]
    NonFiniteEstimate(f64),

    #[error("Bootstrap round {round} failed: {source}")]
    Bootstrap {
        round: usize,
        #[source]
        source: Box<AteError>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Could not build thread pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, AteError>;

/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile of already sorted data, `q` in `[0, 100]`.
///
/// Linear interpolation between the two closest order statistics, which is
/// also what numpy does by default.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let q = (q / 100.0).clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let i = pos.floor() as usize;
    let j = pos.ceil() as usize;
    if i == j {
        return sorted[i];
    }
    let t = pos - i as f64;
    (1.0 - t) * sorted[i] + t * sorted[j]
}
