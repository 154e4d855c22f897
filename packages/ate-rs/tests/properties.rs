// tests/properties.rs
//! Statistical properties of the estimators and the bootstrap engine.

use approx::assert_abs_diff_eq;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use ate_rs::estimation::{double_robust_estimate, ipw_estimate, ipw_stabilized_estimate, naive_estimate};
use ate_rs::synthetic::{generate_continuous, generate_discrete};
use ate_rs::{
    bootstrap, BootstrapConfig, ColumnRoles, Dataset, DoubleRobustConfig, Estimator, PropensityConfig,
};

/// Z ~ U{0,1,2}, W ∈ {3,4} driven by Z, D ~ Bernoulli(0.5) independent of
/// both, Y = 1.5 + ate D + 3 W + N(0, 1).
fn randomized(n: usize, ate: f64, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();

    let z = Array1::from_shape_fn(n, |_| rng.random_range(0..3) as f64);
    let w = z.mapv(|zi| if rng.random_bool([0.3, 0.6, 0.9][zi as usize]) { 4.0 } else { 3.0 });
    let d = Array1::from_shape_fn(n, |_| if rng.random_bool(0.5) { 1.0 } else { 0.0 });
    let y = Array1::from_shape_fn(n, |i| 1.5 + ate * d[i] + 3.0 * w[i] + noise.sample(&mut rng));

    Dataset::new(ColumnRoles::default(), d, y, vec![z, w]).unwrap()
}

fn continuous(n: usize, seed: u64) -> Dataset {
    Dataset::from_frame(&generate_continuous(n, 2.0, seed).unwrap(), &ColumnRoles::default()).unwrap()
}

#[test]
fn naive_is_centred_on_zero_without_effect() {
    let estimates: Vec<f64> = (0..40).map(|seed| naive_estimate(&randomized(2_000, 0.0, seed))).collect();
    let average = estimates.iter().sum::<f64>() / estimates.len() as f64;
    assert_abs_diff_eq!(average, 0.0, epsilon = 0.05);
}

#[test]
fn weighting_matches_naive_without_confounding() {
    let data = randomized(20_000, 2.0, 11);
    let cfg = PropensityConfig::default();

    let naive = naive_estimate(&data);
    let ipw = ipw_estimate(&data, &cfg).unwrap();
    let stabilized = ipw_stabilized_estimate(&data, &cfg).unwrap();

    assert_abs_diff_eq!(naive, 2.0, epsilon = 0.1);
    assert_abs_diff_eq!(stabilized, naive, epsilon = 0.1);
    assert_abs_diff_eq!(ipw, naive, epsilon = 0.25);
}

#[test]
fn double_robust_survives_one_misspecified_model() {
    let data = continuous(10_000, 1944);

    // Naive contrast is confounded through W.
    assert!(naive_estimate(&data) - 2.0 > 0.2);

    // Outcome model omits W, propensity model is correct.
    let wrong_outcome = DoubleRobustConfig::new("Z", "Z").unwrap();
    // Outcome model is correct, propensity model omits Z.
    let wrong_propensity = DoubleRobustConfig::new("W", "W").unwrap();

    let a = double_robust_estimate(&data, &wrong_outcome).unwrap();
    let b = double_robust_estimate(&data, &wrong_propensity).unwrap();
    assert_abs_diff_eq!(a, 2.0, epsilon = 0.35);
    assert_abs_diff_eq!(b, 2.0, epsilon = 0.15);
}

#[test]
fn double_robust_interval_with_misspecified_propensity() {
    let data = continuous(5_000, 7);
    let estimator = Estimator::DoubleRobust(DoubleRobustConfig::new("W", "W").unwrap());
    let cfg = BootstrapConfig { rounds: 60, seed: 1944, ..Default::default() };

    let summary = bootstrap(&data, &estimator, &cfg).unwrap();
    assert_abs_diff_eq!(summary.mean, 2.0, epsilon = 0.2);
}

#[test]
fn parallel_bootstrap_equals_sequential() {
    let df = generate_discrete(2_000, 2.0, 3).unwrap();
    let data = Dataset::from_frame(&df, &ColumnRoles::default()).unwrap();
    let estimator = Estimator::IpwStabilized(PropensityConfig::default());

    let sequential = BootstrapConfig { rounds: 40, seed: 99, n_jobs: 1, ..Default::default() };
    let expected = bootstrap(&data, &estimator, &sequential).unwrap();

    for n_jobs in [2, 3, 8] {
        let got = bootstrap(&data, &estimator, &BootstrapConfig { n_jobs, ..sequential }).unwrap();
        assert_eq!(got.mean, expected.mean, "n_jobs = {n_jobs}");
        assert_eq!(got.ci, expected.ci, "n_jobs = {n_jobs}");
        assert_eq!(got.replicates, expected.replicates);
    }
}

#[test]
fn more_rounds_stabilize_the_interval() {
    let data = randomized(400, 2.0, 5);

    let spread_of_lower_bound = |rounds: usize| {
        let lows: Vec<f64> = (0..8)
            .map(|seed| {
                let cfg = BootstrapConfig { rounds, seed, n_jobs: 1, ..Default::default() };
                bootstrap(&data, &Estimator::Naive, &cfg).unwrap().ci.0
            })
            .collect();
        let m = lows.iter().sum::<f64>() / lows.len() as f64;
        (lows.iter().map(|l| (l - m).powi(2)).sum::<f64>() / lows.len() as f64).sqrt()
    };

    assert!(spread_of_lower_bound(400) < spread_of_lower_bound(20));
}
