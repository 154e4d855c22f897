// src/regression/mod.rs

pub mod formula;
pub mod linalg;
pub mod logit;
pub mod ols;

pub use formula::Formula;
pub use logit::{fit_logistic, LogisticModel, LogitOptions, PROPENSITY_EPS};
pub use ols::{fit_ols, predict};
