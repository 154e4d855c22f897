// src/estimation/propensity.rs
//! Propensity-score estimators: IPW, stabilized IPW, regression on the
//! score and nearest-neighbour matching on the score.

use ndarray::Array1;

use crate::data::Dataset;
use crate::regression::{fit_logistic, fit_ols, Formula, LogitOptions};
use crate::utils::{AteError, Result};

/// Name of the score column added for [`ps_linreg_estimate`].
pub const PROPENSITY_COLUMN: &str = "propensity_score";

/// Logistic propensity model `P(D = 1 | model terms)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropensityConfig {
    pub model: Formula,
    pub logit: LogitOptions,
}

impl Default for PropensityConfig {
    fn default() -> Self {
        Self { model: Formula::from_known_terms(&["Z"]), logit: LogitOptions::default() }
    }
}

impl PropensityConfig {
    pub fn new(expr: &str) -> Result<Self> {
        Ok(Self { model: Formula::parse(expr)?, logit: LogitOptions::default() })
    }

    pub fn with_logit(mut self, logit: LogitOptions) -> Self {
        self.logit = logit;
        self
    }
}

/// Fit the propensity model on all of `data` and score every unit.
///
/// Scores lie in `[PROPENSITY_EPS, 1 - PROPENSITY_EPS]`.
pub fn propensity_scores(data: &Dataset, config: &PropensityConfig) -> Result<Array1<f64>> {
    let x = config.model.design_matrix(data)?;
    let model = fit_logistic(x.view(), data.treatment(), &config.logit)?;
    model.predict_proba(x.view())
}

/// Horvitz-Thompson IPW: `mean(Y * (D - p) / (p * (1 - p)))`.
pub fn ipw_estimate(data: &Dataset, config: &PropensityConfig) -> Result<f64> {
    let ps = propensity_scores(data, config)?;
    let d = data.treatment();
    let y = data.outcome();

    let total: f64 = (0..data.n_obs())
        .map(|i| y[i] * (d[i] - ps[i]) / (ps[i] * (1.0 - ps[i])))
        .sum();

    Ok(total / data.n_obs() as f64)
}

/// Stabilized IPW.
///
/// Treated units get weight `P(D=1) / p`, controls `(1 - P(D=1)) / (1 - p)`.
/// Each arm's weighted outcome total is divided by the arm size and the
/// arms are differenced.
pub fn ipw_stabilized_estimate(data: &Dataset, config: &PropensityConfig) -> Result<f64> {
    let ps = propensity_scores(data, config)?;
    let d = data.treatment();
    let y = data.outcome();

    let (n_control, n_treated) = data.arm_counts();
    if n_control == 0 {
        return Err(AteError::EmptyArm { arm: 0 });
    }
    if n_treated == 0 {
        return Err(AteError::EmptyArm { arm: 1 });
    }
    let prob_d = n_treated as f64 / data.n_obs() as f64;

    let mut sum_treated = 0.0;
    let mut sum_control = 0.0;
    for i in 0..data.n_obs() {
        if d[i] == 1.0 {
            sum_treated += y[i] * prob_d / ps[i];
        } else {
            sum_control += y[i] * (1.0 - prob_d) / (1.0 - ps[i]);
        }
    }

    Ok(sum_treated / n_treated as f64 - sum_control / n_control as f64)
}

/// OLS of the outcome on treatment and the estimated score; the ATE is the
/// treatment coefficient.
pub fn ps_linreg_estimate(data: &Dataset, config: &PropensityConfig) -> Result<f64> {
    let ps = propensity_scores(data, config)?;
    let scored = data.with_column(PROPENSITY_COLUMN, ps)?;

    let model = Formula::from_terms(&[data.treatment_name(), PROPENSITY_COLUMN])?;
    let x = model.design_matrix(&scored)?;
    let beta = fit_ols(x.view(), scored.outcome())?;
    Ok(beta[1])
}

/// One-to-one nearest-neighbour matching on the score, with replacement.
///
/// Each treated unit is paired with the control whose score is closest and
/// each control with the closest treated unit. The ATE is the mean over all
/// units of `Y_treated - Y_control` within each pair. Ties in distance go to
/// the lowest row index.
///
/// With few distinct scores, as under a discrete `Z`, every unit in a score
/// stratum is paired with the same lowest-row counterpart. The estimate then
/// rests on a handful of outcomes and has much higher variance than the
/// weighting or regression estimators.
pub fn ps_matching_estimate(data: &Dataset, config: &PropensityConfig) -> Result<f64> {
    let ps = propensity_scores(data, config)?;
    let y = data.outcome();

    let treated = data.arm_indices(1);
    let control = data.arm_indices(0);
    if control.is_empty() {
        return Err(AteError::EmptyArm { arm: 0 });
    }
    if treated.is_empty() {
        return Err(AteError::EmptyArm { arm: 1 });
    }

    let treated_pool = score_pool(&ps, &treated);
    let control_pool = score_pool(&ps, &control);

    let mut total = 0.0;
    for &i in &treated {
        let j = nearest_row(&control_pool, ps[i]).ok_or(AteError::EmptyArm { arm: 0 })?;
        total += y[i] - y[j];
    }
    for &i in &control {
        let j = nearest_row(&treated_pool, ps[i]).ok_or(AteError::EmptyArm { arm: 1 })?;
        total += y[j] - y[i];
    }

    Ok(total / data.n_obs() as f64)
}

/// `(score, row)` pairs sorted by score, then row.
fn score_pool(ps: &Array1<f64>, rows: &[usize]) -> Vec<(f64, usize)> {
    let mut pool: Vec<(f64, usize)> = rows.iter().map(|&i| (ps[i], i)).collect();
    pool.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    pool
}

/// Row of the pool entry closest to `score`, lowest row on ties.
fn nearest_row(pool: &[(f64, usize)], score: f64) -> Option<usize> {
    let pos = pool.partition_point(|&(s, _)| s < score);

    // First entry of each run of equal scores holds the lowest row.
    let above = pool.get(pos).copied();
    let below = pos.checked_sub(1).map(|k| {
        let s = pool[k].0;
        pool[pool.partition_point(|&(t, _)| t < s)]
    });

    match (below, above) {
        (Some(lo), Some(hi)) => {
            let d_lo = score - lo.0;
            let d_hi = hi.0 - score;
            if d_lo < d_hi || (d_lo == d_hi && lo.1 < hi.1) {
                Some(lo.1)
            } else {
                Some(hi.1)
            }
        }
        (Some(lo), None) => Some(lo.1),
        (None, Some(hi)) => Some(hi.1),
        (None, None) => None,
    }
}
