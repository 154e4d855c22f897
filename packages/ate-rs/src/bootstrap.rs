// src/bootstrap.rs
//! Nonparametric bootstrap of an ATE estimator.
//!
//! Seeding: one batch generator is seeded from `BootstrapConfig::seed` and
//! draws a seed for every round up front, in round order. Each round then
//! resamples from its own generator, so the multiset of resamples does not
//! depend on how rounds are scheduled and `n_jobs = 1` reproduces the
//! parallel result bit for bit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::data::Dataset;
use crate::estimation::Estimator;
use crate::results::EstimateResult;
use crate::utils::{mean, percentile_sorted, AteError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapConfig {
    /// Number of resamples.
    pub rounds: usize,
    pub seed: u64,
    /// Lower and upper percentile cut points, in `[0, 100]`.
    pub percentiles: (f64, f64),
    /// Worker threads. `1` runs sequentially on the calling thread, `0`
    /// lets rayon pick the thread count.
    pub n_jobs: usize,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { rounds: 500, seed: 1944, percentiles: (2.5, 97.5), n_jobs: 8 }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(AteError::InvalidInput("bootstrap needs at least one round".to_string()));
        }
        let (lo, hi) = self.percentiles;
        let in_range = |p: f64| p.is_finite() && (0.0..=100.0).contains(&p);
        if !in_range(lo) || !in_range(hi) || lo > hi {
            return Err(AteError::InvalidInput(format!(
                "percentiles must be ascending within [0, 100], got ({lo}, {hi})"
            )));
        }
        Ok(())
    }
}

/// Bootstrap distribution of one estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapSummary {
    pub mean: f64,
    pub ci: (f64, f64),
    /// Per-round estimates in round order.
    pub replicates: Vec<f64>,
}

impl BootstrapSummary {
    pub fn ci_width(&self) -> f64 {
        self.ci.1 - self.ci.0
    }

    /// Bootstrap standard error, centred on the replicate mean.
    pub fn std_error(&self) -> f64 {
        let r = self.replicates.len() as f64;
        let var: f64 = self.replicates.iter().map(|&t| (t - self.mean).powi(2)).sum::<f64>() / r;
        var.sqrt()
    }

    pub fn to_result(&self) -> EstimateResult {
        EstimateResult::Interval { value: self.mean, ci: self.ci }
    }
}

/// Per-round seeds derived from the batch seed.
pub fn round_seeds(seed: u64, rounds: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rounds).map(|_| rng.random::<u64>()).collect()
}

/// `n_obs` row indices drawn uniformly with replacement.
pub fn resample_indices(n_obs: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_obs).map(|_| rng.random_range(0..n_obs)).collect()
}

/// Bootstrap an arbitrary estimate function.
///
/// Any failing round, or any round returning a non-finite value, aborts the
/// whole batch with `AteError::Bootstrap`.
///
/// # Returns
/// Mean of the replicates and the percentile interval at
/// `config.percentiles` (linear interpolation).
pub fn bootstrap_with<F>(data: &Dataset, estimator: F, config: &BootstrapConfig) -> Result<BootstrapSummary>
where
    F: Fn(&Dataset) -> Result<f64> + Sync,
{
    config.validate()?;
    let n_obs = data.n_obs();
    if n_obs == 0 {
        return Err(AteError::InvalidInput("cannot bootstrap an empty dataset".to_string()));
    }

    log::debug!(
        "bootstrap: {} rounds over {} rows, seed {}, n_jobs {}",
        config.rounds,
        n_obs,
        config.seed,
        config.n_jobs
    );

    let seeds = round_seeds(config.seed, config.rounds);

    let run_round = |(round, &round_seed): (usize, &u64)| -> Result<f64> {
        let sample = data.take(&resample_indices(n_obs, round_seed));
        let value = estimator(&sample)
            .map_err(|e| AteError::Bootstrap { round, source: Box::new(e) })?;
        if !value.is_finite() {
            return Err(AteError::Bootstrap {
                round,
                source: Box::new(AteError::NonFiniteEstimate(value)),
            });
        }
        Ok(value)
    };

    let replicates: Vec<f64> = if config.n_jobs == 1 {
        seeds.iter().enumerate().map(run_round).collect::<Result<_>>()?
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_jobs)
            .build()
            .map_err(|e| AteError::ThreadPool(e.to_string()))?;
        pool.install(|| seeds.par_iter().enumerate().map(run_round).collect::<Result<Vec<f64>>>())?
    };

    let mut sorted = replicates.clone();
    sorted.sort_by(f64::total_cmp);
    let ci = (
        percentile_sorted(&sorted, config.percentiles.0),
        percentile_sorted(&sorted, config.percentiles.1),
    );

    let summary = BootstrapSummary { mean: mean(&replicates), ci, replicates };
    log::debug!("bootstrap: mean {:.6}, ci ({:.6}, {:.6})", summary.mean, ci.0, ci.1);
    Ok(summary)
}

/// Bootstrap one of the built-in estimators.
pub fn bootstrap(data: &Dataset, estimator: &Estimator, config: &BootstrapConfig) -> Result<BootstrapSummary> {
    bootstrap_with(data, |sample| estimator.estimate(sample), config)
}
