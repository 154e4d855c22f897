// src/synthetic.rs
//! Synthetic observational data with a known ATE.
//!
//! Both generators confound the treatment through `Z` and the outcome
//! through `W`, with `Y = 1.5 + ate * D + 3 W + N(0, 1)`. Frames carry the
//! columns `Z, W, D, Y, p_treat`, where `p_treat` is the true propensity.

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::utils::{AteError, Result};

/// `P(W = 4 | Z = z)` for the discrete experiment.
const P_W4_GIVEN_Z: [f64; 3] = [0.3, 0.6, 0.9];
/// `P(D = 1 | Z = z)` for the discrete experiment.
const ALPHA_Z: [f64; 3] = [0.25, 0.5, 0.7];

const INTERCEPT: f64 = 1.5;
const COEF_W: f64 = 3.0;

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>> {
    Normal::new(mean, sd).map_err(|e| AteError::InvalidInput(format!("normal({mean}, {sd}): {e}")))
}

fn check_size(n: usize) -> Result<()> {
    if n == 0 {
        return Err(AteError::InvalidInput("synthetic sample size must be positive".to_string()));
    }
    Ok(())
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn outcome(rng: &mut StdRng, d: &[i64], w: &[i64], true_ate: f64) -> Result<Vec<f64>> {
    let noise = normal(0.0, 1.0)?;
    Ok(d.iter()
        .zip(w)
        .map(|(&di, &wi)| INTERCEPT + true_ate * di as f64 + COEF_W * wi as f64 + noise.sample(&mut *rng))
        .collect())
}

/// Discrete confounder `Z ~ U{0, 1, 2}`, `W ∈ {3, 4}` depending on `Z`,
/// treatment probability `[0.25, 0.5, 0.7][Z]`.
pub fn generate_discrete(n: usize, true_ate: f64, seed: u64) -> Result<DataFrame> {
    check_size(n)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let z: Vec<i64> = (0..n).map(|_| rng.random_range(0..3)).collect();
    let w: Vec<i64> = z
        .iter()
        .map(|&zi| if rng.random_bool(P_W4_GIVEN_Z[zi as usize]) { 4 } else { 3 })
        .collect();
    let p_treat: Vec<f64> = z.iter().map(|&zi| ALPHA_Z[zi as usize]).collect();
    let d: Vec<i64> = p_treat.iter().map(|&p| rng.random_bool(p) as i64).collect();
    let y = outcome(&mut rng, &d, &w, true_ate)?;

    log::debug!("generated discrete sample: n={n}, ate={true_ate}, seed={seed}");
    Ok(df!["Z" => z, "W" => w, "D" => d, "Y" => y, "p_treat" => p_treat]?)
}

/// Continuous confounder `Z ~ N(0, 0.5)`, `W = 3 + Bernoulli(sigmoid(Z))`,
/// treatment probability `sigmoid(-2.5 + 2.4 Z)`.
pub fn generate_continuous(n: usize, true_ate: f64, seed: u64) -> Result<DataFrame> {
    check_size(n)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let z_dist = normal(0.0, 0.5)?;
    let z: Vec<f64> = (0..n).map(|_| z_dist.sample(&mut rng)).collect();
    let w: Vec<i64> = z.iter().map(|&zi| 3 + rng.random_bool(sigmoid(zi)) as i64).collect();
    let p_treat: Vec<f64> = z.iter().map(|&zi| sigmoid(-2.5 + 2.4 * zi)).collect();
    let d: Vec<i64> = p_treat.iter().map(|&p| rng.random_bool(p) as i64).collect();
    let y = outcome(&mut rng, &d, &w, true_ate)?;

    log::debug!("generated continuous sample: n={n}, ate={true_ate}, seed={seed}");
    Ok(df!["Z" => z, "W" => w, "D" => d, "Y" => y, "p_treat" => p_treat]?)
}
