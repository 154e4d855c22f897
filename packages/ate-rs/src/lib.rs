// src/lib.rs
//! Average treatment effect estimators with bootstrap confidence intervals.
//!
//! A [`Dataset`] is resolved once from a polars frame by [`ColumnRoles`].
//! Each [`Estimator`] maps a dataset to a point estimate, and
//! [`bootstrap`] turns any estimator into a mean and percentile interval
//! over seeded resamples, sequentially or on a rayon pool. Results are
//! collected in a [`ResultsTable`] and flattened to a frame with columns
//! `method, value, ci_low, ci_high`.
//!
//! ```no_run
//! use ate_rs::{bootstrap, BootstrapConfig, ColumnRoles, Dataset, Estimator, LinregCausalConfig};
//!
//! let df = ate_rs::synthetic::generate_discrete(10_000, 2.0, 1944)?;
//! let data = Dataset::from_frame(&df, &ColumnRoles::default())?;
//! let estimator = Estimator::LinregCausal(LinregCausalConfig::new("D + Z + W")?);
//! let summary = bootstrap(&data, &estimator, &BootstrapConfig { rounds: 100, ..Default::default() })?;
//! println!("ATE {:.3} ({:.3}, {:.3})", summary.mean, summary.ci.0, summary.ci.1);
//! # Ok::<(), ate_rs::AteError>(())
//! ```

pub mod battery;
pub mod bootstrap;
pub mod data;
pub mod estimation;
pub mod regression;
pub mod results;
pub mod synthetic;
pub mod utils;

pub use battery::{run_battery, standard_battery, BatteryEntry, BatteryReport, Experiment, TRUE_ATE};
pub use bootstrap::{bootstrap, bootstrap_with, BootstrapConfig, BootstrapSummary};
pub use data::{ColumnRoles, Dataset};
pub use estimation::{
    AdjustmentFormulaConfig, DoubleRobustConfig, Estimator, LinregCausalConfig,
    PotentialOutcomeConfig, PropensityConfig,
};
pub use regression::{Formula, LogitOptions};
pub use results::{merge_results, EstimateResult, ResultsTable};
pub use utils::{AteError, Result};
