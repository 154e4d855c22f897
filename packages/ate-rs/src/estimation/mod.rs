// src/estimation/mod.rs
pub mod doubly_robust;
pub mod outcome;
pub mod propensity;
pub mod stratified;

pub use doubly_robust::{double_robust_estimate, DoubleRobustConfig};
pub use outcome::{
    linreg_causal_estimate, linreg_potentialoutcome_estimate, LinregCausalConfig,
    PotentialOutcomeConfig,
};
pub use propensity::{
    ipw_estimate, ipw_stabilized_estimate, propensity_scores, ps_linreg_estimate,
    ps_matching_estimate, PropensityConfig, PROPENSITY_COLUMN,
};
pub use stratified::{adjustment_formula_estimate, naive_estimate, AdjustmentFormulaConfig};

use crate::data::Dataset;
use crate::utils::Result;

/// The fixed set of ATE estimators, each carrying its own configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Estimator {
    Naive,
    AdjustmentFormula(AdjustmentFormulaConfig),
    LinregCausal(LinregCausalConfig),
    LinregPotentialOutcome(PotentialOutcomeConfig),
    Ipw(PropensityConfig),
    IpwStabilized(PropensityConfig),
    PsLinreg(PropensityConfig),
    PsMatching(PropensityConfig),
    DoubleRobust(DoubleRobustConfig),
}

impl Estimator {
    /// Point estimate of the ATE on `data`.
    pub fn estimate(&self, data: &Dataset) -> Result<f64> {
        match self {
            Estimator::Naive => Ok(naive_estimate(data)),
            Estimator::AdjustmentFormula(cfg) => adjustment_formula_estimate(data, cfg),
            Estimator::LinregCausal(cfg) => linreg_causal_estimate(data, cfg),
            Estimator::LinregPotentialOutcome(cfg) => linreg_potentialoutcome_estimate(data, cfg),
            Estimator::Ipw(cfg) => ipw_estimate(data, cfg),
            Estimator::IpwStabilized(cfg) => ipw_stabilized_estimate(data, cfg),
            Estimator::PsLinreg(cfg) => ps_linreg_estimate(data, cfg),
            Estimator::PsMatching(cfg) => ps_matching_estimate(data, cfg),
            Estimator::DoubleRobust(cfg) => double_robust_estimate(data, cfg),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Naive => "naive",
            Estimator::AdjustmentFormula(_) => "adjustment_formula",
            Estimator::LinregCausal(_) => "linreg_causal",
            Estimator::LinregPotentialOutcome(_) => "linreg_potentialoutcome",
            Estimator::Ipw(_) => "ipw",
            Estimator::IpwStabilized(_) => "ipw_stabilized",
            Estimator::PsLinreg(_) => "ps_linreg",
            Estimator::PsMatching(_) => "ps_matching",
            Estimator::DoubleRobust(_) => "double_robust",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnRoles;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_dispatch_matches_direct_call() {
        let ds = Dataset::new(
            ColumnRoles::new("D", "Y", &["Z"]),
            array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0],
            array![1.0, 4.0, 2.0, 6.0, 5.0, 3.0],
            vec![array![0.0, 0.0, 1.0, 1.0, 0.0, 1.0]],
        )
        .unwrap();

        assert_relative_eq!(Estimator::Naive.estimate(&ds).unwrap(), naive_estimate(&ds));

        let cfg = AdjustmentFormulaConfig::new(&["Z"]);
        let est = Estimator::AdjustmentFormula(cfg.clone());
        assert_relative_eq!(
            est.estimate(&ds).unwrap(),
            adjustment_formula_estimate(&ds, &cfg).unwrap()
        );
        assert_eq!(est.kind(), "adjustment_formula");
    }
}
