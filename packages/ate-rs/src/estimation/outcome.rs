// src/estimation/outcome.rs
//! Outcome-regression estimators.

use ndarray::Array1;

use crate::data::Dataset;
use crate::regression::{fit_ols, predict, Formula};
use crate::utils::{AteError, Result};

/// OLS of the outcome on `model`; the ATE is the first slope.
#[derive(Debug, Clone, PartialEq)]
pub struct LinregCausalConfig {
    /// Treatment must be the first listed term.
    pub model: Formula,
}

impl LinregCausalConfig {
    pub fn new(expr: &str) -> Result<Self> {
        Ok(Self { model: Formula::parse(expr)? })
    }
}

/// Coefficient of the term right after the intercept in an OLS fit of the
/// outcome on `config.model`.
pub fn linreg_causal_estimate(data: &Dataset, config: &LinregCausalConfig) -> Result<f64> {
    if config.model.n_cols() < 2 {
        return Err(AteError::Formula(format!(
            "model '{}' has no term after the intercept",
            config.model
        )));
    }
    if !config.model.leads_with(data.treatment_name()) {
        log::debug!(
            "model '{}' does not list treatment '{}' first",
            config.model,
            data.treatment_name()
        );
    }

    let x = config.model.design_matrix(data)?;
    let beta = fit_ols(x.view(), data.outcome())?;
    Ok(beta[1])
}

/// Outcome model fitted separately in each treatment arm.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialOutcomeConfig {
    /// Confounders only, without the treatment.
    pub model: Formula,
}

impl Default for PotentialOutcomeConfig {
    fn default() -> Self {
        Self { model: Formula::from_known_terms(&["W", "Z"]) }
    }
}

impl PotentialOutcomeConfig {
    pub fn new(expr: &str) -> Result<Self> {
        Ok(Self { model: Formula::parse(expr)? })
    }
}

/// Predictions of the control-arm and treated-arm outcome models for every
/// unit of `data`.
pub(crate) struct ArmPredictions {
    pub control: Array1<f64>,
    pub treated: Array1<f64>,
}

pub(crate) fn fit_arm_outcome_models(data: &Dataset, model: &Formula) -> Result<ArmPredictions> {
    let (n_control, n_treated) = data.arm_counts();
    if n_control == 0 {
        return Err(AteError::EmptyArm { arm: 0 });
    }
    if n_treated == 0 {
        return Err(AteError::EmptyArm { arm: 1 });
    }

    let x_all = model.design_matrix(data)?;

    let control = data.arm(0);
    let beta0 = fit_ols(model.design_matrix(&control)?.view(), control.outcome())?;

    let treated = data.arm(1);
    let beta1 = fit_ols(model.design_matrix(&treated)?.view(), treated.outcome())?;

    Ok(ArmPredictions {
        control: predict(x_all.view(), beta0.view())?,
        treated: predict(x_all.view(), beta1.view())?,
    })
}

/// ATE from per-arm outcome models `m0`, `m1`:
/// `mean(D * (Y - m0(X)) + (1 - D) * (m1(X) - Y))`.
pub fn linreg_potentialoutcome_estimate(data: &Dataset, config: &PotentialOutcomeConfig) -> Result<f64> {
    let preds = fit_arm_outcome_models(data, &config.model)?;
    let d = data.treatment();
    let y = data.outcome();

    let total: f64 = (0..data.n_obs())
        .map(|i| d[i] * (y[i] - preds.control[i]) + (1.0 - d[i]) * (preds.treated[i] - y[i]))
        .sum();

    Ok(total / data.n_obs() as f64)
}
