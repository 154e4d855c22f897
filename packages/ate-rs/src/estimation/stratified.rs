// src/estimation/stratified.rs
//! Difference-in-means estimators: the unadjusted contrast and the
//! adjustment formula (stratification on discrete confounders).

use std::collections::BTreeMap;

use ndarray::ArrayView1;

use crate::data::Dataset;
use crate::utils::{mean, AteError, Result};

/// Unadjusted ATE: `mean(Y | D=1) - mean(Y | D=0)`.
///
/// `NaN` when either arm is empty.
pub fn naive_estimate(data: &Dataset) -> f64 {
    let d = data.treatment();
    let y = data.outcome();

    let arm_outcomes = |arm: f64| -> Vec<f64> {
        y.iter()
            .zip(d.iter())
            .filter(|(_, &di)| di == arm)
            .map(|(&yi, _)| yi)
            .collect()
    };
    let treated = arm_outcomes(1.0);
    let control = arm_outcomes(0.0);

    mean(&treated) - mean(&control)
}

/// Columns to stratify on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdjustmentFormulaConfig {
    pub adjustment_set: Vec<String>,
}

impl AdjustmentFormulaConfig {
    pub fn new(columns: &[&str]) -> Self {
        Self { adjustment_set: columns.iter().map(|c| c.to_string()).collect() }
    }
}

#[derive(Debug, Default)]
struct Stratum {
    n: usize,
    n_treated: usize,
    sum_treated: f64,
    n_control: usize,
    sum_control: f64,
}

/// ATE via the adjustment formula
/// `sum_z P(Z=z) * (E[Y | D=1, Z=z] - E[Y | D=0, Z=z])`.
///
/// A stratum is one distinct combination of values of the adjustment
/// columns. When a stratum has no treated (control) unit, the marginal
/// `E[Y | D=1]` (`E[Y | D=0]`) is used for it instead. With an empty
/// adjustment set there is a single stratum and the result equals
/// [`naive_estimate`].
///
/// # Errors
/// `EmptyArm` when the whole dataset lacks treated or control units, since
/// the marginal fallback is then undefined. `InvalidInput` on zero rows.
pub fn adjustment_formula_estimate(data: &Dataset, config: &AdjustmentFormulaConfig) -> Result<f64> {
    let columns: Vec<ArrayView1<f64>> = config
        .adjustment_set
        .iter()
        .map(|name| {
            data.column(name).ok_or_else(|| {
                AteError::Formula(format!("adjustment column '{name}' is not a column of the dataset"))
            })
        })
        .collect::<Result<_>>()?;

    let d = data.treatment();
    let y = data.outcome();
    let n_obs = data.n_obs();

    let mut strata: BTreeMap<Vec<u64>, Stratum> = BTreeMap::new();
    let mut marginal = Stratum::default();

    for i in 0..n_obs {
        // + 0.0 folds -0.0 into 0.0 so both land in the same stratum
        let key: Vec<u64> = columns.iter().map(|c| (c[i] + 0.0).to_bits()).collect();
        let stratum = strata.entry(key).or_default();
        stratum.n += 1;
        marginal.n += 1;
        if d[i] == 1.0 {
            stratum.n_treated += 1;
            stratum.sum_treated += y[i];
            marginal.n_treated += 1;
            marginal.sum_treated += y[i];
        } else {
            stratum.n_control += 1;
            stratum.sum_control += y[i];
            marginal.n_control += 1;
            marginal.sum_control += y[i];
        }
    }

    if n_obs == 0 {
        return Err(AteError::InvalidInput("adjustment formula on an empty dataset".to_string()));
    }
    if marginal.n_control == 0 {
        return Err(AteError::EmptyArm { arm: 0 });
    }
    if marginal.n_treated == 0 {
        return Err(AteError::EmptyArm { arm: 1 });
    }

    let fallback_treated = marginal.sum_treated / marginal.n_treated as f64;
    let fallback_control = marginal.sum_control / marginal.n_control as f64;

    let ate = strata
        .values()
        .map(|s| {
            let mu1 = if s.n_treated > 0 { s.sum_treated / s.n_treated as f64 } else { fallback_treated };
            let mu0 = if s.n_control > 0 { s.sum_control / s.n_control as f64 } else { fallback_control };
            let p = s.n as f64 / n_obs as f64;
            (mu1 - mu0) * p
        })
        .sum();

    Ok(ate)
}
