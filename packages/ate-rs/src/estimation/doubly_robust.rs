// src/estimation/doubly_robust.rs

use super::outcome::fit_arm_outcome_models;
use super::propensity::{propensity_scores, PropensityConfig};
use crate::data::Dataset;
use crate::regression::Formula;
use crate::utils::Result;

/// Outcome model fitted per arm plus a logistic propensity model.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleRobustConfig {
    pub outcome_model: Formula,
    pub propensity: PropensityConfig,
}

impl Default for DoubleRobustConfig {
    fn default() -> Self {
        Self {
            outcome_model: Formula::from_known_terms(&["W"]),
            propensity: PropensityConfig::default(),
        }
    }
}

impl DoubleRobustConfig {
    pub fn new(outcome_expr: &str, propensity_expr: &str) -> Result<Self> {
        Ok(Self {
            outcome_model: Formula::parse(outcome_expr)?,
            propensity: PropensityConfig::new(propensity_expr)?,
        })
    }
}

/// Augmented IPW.
///
/// `mean(m1 + D (Y - m1) / p) - mean(m0 + (1 - D) (Y - m0) / (1 - p))`
///
/// Consistent when either the per-arm outcome models `m0`, `m1` or the
/// propensity model `p` is correctly specified.
pub fn double_robust_estimate(data: &Dataset, config: &DoubleRobustConfig) -> Result<f64> {
    let preds = fit_arm_outcome_models(data, &config.outcome_model)?;
    let ps = propensity_scores(data, &config.propensity)?;
    let d = data.treatment();
    let y = data.outcome();
    let n_obs = data.n_obs();

    let mut treated_sum = 0.0;
    let mut untreated_sum = 0.0;
    for i in 0..n_obs {
        let m1 = preds.treated[i];
        let m0 = preds.control[i];
        treated_sum += m1 + (y[i] - m1) * d[i] / ps[i];
        untreated_sum += m0 + (y[i] - m0) * (1.0 - d[i]) / (1.0 - ps[i]);
    }

    Ok(treated_sum / n_obs as f64 - untreated_sum / n_obs as f64)
}
