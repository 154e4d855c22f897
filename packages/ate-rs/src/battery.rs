// src/battery.rs
//! Named estimator line-ups and a runner that bootstraps each of them.
//!
//! The built-in line-ups assume the default column roles (`D`, `Y`, `Z`,
//! `W`).

use crate::bootstrap::{bootstrap, BootstrapConfig};
use crate::data::Dataset;
use crate::estimation::{
    AdjustmentFormulaConfig, DoubleRobustConfig, Estimator, LinregCausalConfig,
    PotentialOutcomeConfig, PropensityConfig,
};
use crate::regression::Formula;
use crate::results::ResultsTable;
use crate::utils::{AteError, Result};

/// Method name under which a known true ATE is recorded.
pub const TRUE_ATE: &str = "true_ate";

/// Which experiment a line-up belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Experiment {
    /// Synthetic data with a discrete confounder `Z`.
    Discrete,
    /// Synthetic data with a continuous confounder `Z`.
    Continuous,
    /// Real observational records.
    Observational,
}

impl Experiment {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "discrete" | "d" => Some(Experiment::Discrete),
            "continuous" | "c" => Some(Experiment::Continuous),
            "observational" | "obs" => Some(Experiment::Observational),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Experiment::Discrete => "discrete",
            Experiment::Continuous => "continuous",
            Experiment::Observational => "observational",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatteryEntry {
    pub method: String,
    pub estimator: Estimator,
}

impl BatteryEntry {
    pub fn new(method: impl Into<String>, estimator: Estimator) -> Self {
        Self { method: method.into(), estimator }
    }
}

fn linreg_causal(terms: &[&str]) -> Estimator {
    Estimator::LinregCausal(LinregCausalConfig { model: Formula::from_known_terms(terms) })
}

/// The estimators run for `experiment`, in reporting order.
///
/// Discrete data gets every estimator including three adjustment-formula
/// variants. Continuous data drops the adjustment formula (strata on a
/// continuous `Z` are singletons). Observational data further drops the
/// naive contrast and propensity matching.
pub fn standard_battery(experiment: Experiment) -> Vec<BatteryEntry> {
    let mut battery = Vec::new();

    if experiment != Experiment::Observational {
        battery.push(BatteryEntry::new("naive", Estimator::Naive));
    }
    if experiment == Experiment::Discrete {
        let adjustment_sets: [(&str, &[&str]); 3] =
            [("adjustment_z", &["Z"]), ("adjustment_zw", &["Z", "W"]), ("adjustment_w", &["W"])];
        for (method, set) in adjustment_sets {
            battery.push(BatteryEntry::new(method, Estimator::AdjustmentFormula(AdjustmentFormulaConfig::new(set))));
        }
    }

    battery.push(BatteryEntry::new("linreg_causal_zw", linreg_causal(&["D", "Z", "W"])));
    battery.push(BatteryEntry::new("linreg_causal_z", linreg_causal(&["D", "Z"])));
    battery.push(BatteryEntry::new("linreg_causal_w", linreg_causal(&["D", "W"])));
    battery.push(BatteryEntry::new(
        "linreg_potentialoutcome",
        Estimator::LinregPotentialOutcome(PotentialOutcomeConfig::default()),
    ));
    battery.push(BatteryEntry::new("ipw", Estimator::Ipw(PropensityConfig::default())));
    battery.push(BatteryEntry::new("ipw_stabilized", Estimator::IpwStabilized(PropensityConfig::default())));
    battery.push(BatteryEntry::new("ps_linreg", Estimator::PsLinreg(PropensityConfig::default())));
    if experiment != Experiment::Observational {
        battery.push(BatteryEntry::new("ps_matching", Estimator::PsMatching(PropensityConfig::default())));
    }
    battery.push(BatteryEntry::new("double_robust", Estimator::DoubleRobust(DoubleRobustConfig::default())));

    battery
}

/// Successful results plus the estimators whose bootstrap failed.
#[derive(Debug, Default)]
pub struct BatteryReport {
    pub results: ResultsTable,
    pub failures: Vec<(String, AteError)>,
}

impl BatteryReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Bootstrap every entry of `battery` on `data`.
///
/// A failed entry is logged and recorded in `failures`; the remaining
/// entries still run. When `true_ate` is given it is recorded first as a
/// point row named [`TRUE_ATE`].
pub fn run_battery(
    data: &Dataset,
    battery: &[BatteryEntry],
    config: &BootstrapConfig,
    true_ate: Option<f64>,
) -> Result<BatteryReport> {
    config.validate()?;

    let mut report = BatteryReport::default();
    if let Some(ate) = true_ate {
        report.results.insert(TRUE_ATE, ate);
    }

    for (step, entry) in battery.iter().enumerate() {
        log::info!(
            "[{}/{}] {} ({}), {} rounds",
            step + 1,
            battery.len(),
            entry.method,
            entry.estimator.kind(),
            config.rounds
        );
        match bootstrap(data, &entry.estimator, config) {
            Ok(summary) => {
                log::info!(
                    "{}: {:.4} ({:.4}, {:.4})",
                    entry.method,
                    summary.mean,
                    summary.ci.0,
                    summary.ci.1
                );
                report.results.insert(entry.method.clone(), summary.to_result());
            }
            Err(e) => {
                log::warn!("{} failed: {e}", entry.method);
                report.failures.push((entry.method.clone(), e));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnRoles;
    use crate::results::EstimateResult;
    use crate::synthetic::generate_discrete;

    fn methods(experiment: Experiment) -> Vec<String> {
        standard_battery(experiment).into_iter().map(|e| e.method).collect()
    }

    #[test]
    fn test_experiment_from_str() {
        assert_eq!(Experiment::from_str("Discrete"), Some(Experiment::Discrete));
        assert_eq!(Experiment::from_str("obs"), Some(Experiment::Observational));
        assert_eq!(Experiment::from_str("panel"), None);
        assert_eq!(Experiment::Continuous.name(), "continuous");
    }

    #[test]
    fn test_lineups() {
        assert_eq!(
            methods(Experiment::Discrete),
            vec![
                "naive",
                "adjustment_z",
                "adjustment_zw",
                "adjustment_w",
                "linreg_causal_zw",
                "linreg_causal_z",
                "linreg_causal_w",
                "linreg_potentialoutcome",
                "ipw",
                "ipw_stabilized",
                "ps_linreg",
                "ps_matching",
                "double_robust",
            ]
        );

        let continuous = methods(Experiment::Continuous);
        assert_eq!(continuous.len(), 10);
        assert!(!continuous.iter().any(|m| m.starts_with("adjustment")));

        let observational = methods(Experiment::Observational);
        assert_eq!(observational.len(), 8);
        assert!(!observational.contains(&"naive".to_string()));
        assert!(!observational.contains(&"ps_matching".to_string()));
    }

    #[test]
    fn test_run_discrete_battery() {
        let df = generate_discrete(1500, 2.0, 1944).unwrap();
        let ds = Dataset::from_frame(&df, &ColumnRoles::default()).unwrap();
        let cfg = BootstrapConfig { rounds: 10, n_jobs: 2, ..Default::default() };

        let battery = standard_battery(Experiment::Discrete);
        let report = run_battery(&ds, &battery, &cfg, Some(2.0)).unwrap();

        assert!(report.is_complete(), "failures: {:?}", report.failures);
        assert_eq!(report.results.len(), battery.len() + 1);
        assert_eq!(report.results.rows()[0].0, TRUE_ATE);
        assert_eq!(report.results.get(TRUE_ATE), Some(&EstimateResult::Point(2.0)));
        assert!(report.results.get("double_robust").unwrap().ci().is_some());
    }

    #[test]
    fn test_failures_are_isolated() {
        let df = generate_discrete(500, 2.0, 5).unwrap();
        let ds = Dataset::from_frame(&df, &ColumnRoles::default()).unwrap();
        let cfg = BootstrapConfig { rounds: 5, n_jobs: 1, ..Default::default() };

        let battery = vec![
            BatteryEntry::new("broken", Estimator::LinregCausal(LinregCausalConfig::new("D + Q").unwrap())),
            BatteryEntry::new("naive", Estimator::Naive),
        ];
        let report = run_battery(&ds, &battery, &cfg, None).unwrap();

        assert_eq!(report.results.methods().collect::<Vec<_>>(), vec!["naive"]);
        assert_eq!(report.failures.len(), 1);
        let (method, err) = &report.failures[0];
        assert_eq!(method, "broken");
        match err {
            AteError::Bootstrap { source, .. } => assert!(matches!(**source, AteError::Formula(_))),
            other => panic!("expected bootstrap failure, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let df = generate_discrete(100, 2.0, 5).unwrap();
        let ds = Dataset::from_frame(&df, &ColumnRoles::default()).unwrap();
        let cfg = BootstrapConfig { rounds: 0, ..Default::default() };
        let res = run_battery(&ds, &standard_battery(Experiment::Discrete), &cfg, None);
        assert!(matches!(res, Err(AteError::InvalidInput(_))));
    }
}
