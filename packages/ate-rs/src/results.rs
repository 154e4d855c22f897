// src/results.rs
//! Named estimator results and their flattening into polars frames.

use polars::prelude::*;

use crate::utils::Result;

/// Output of one estimator: a bare point estimate, or a point estimate with
/// a percentile interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimateResult {
    Point(f64),
    Interval { value: f64, ci: (f64, f64) },
}

impl EstimateResult {
    pub fn value(&self) -> f64 {
        match *self {
            EstimateResult::Point(value) => value,
            EstimateResult::Interval { value, .. } => value,
        }
    }

    pub fn ci(&self) -> Option<(f64, f64)> {
        match *self {
            EstimateResult::Point(_) => None,
            EstimateResult::Interval { ci, .. } => Some(ci),
        }
    }

    /// `true` when an interval exists and contains `x`.
    pub fn covers(&self, x: f64) -> bool {
        self.ci().is_some_and(|(lo, hi)| lo <= x && x <= hi)
    }
}

impl From<f64> for EstimateResult {
    fn from(value: f64) -> Self {
        EstimateResult::Point(value)
    }
}

/// Method name to result, keeping insertion order for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    rows: Vec<(String, EstimateResult)>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result. Re-inserting a method replaces its result and keeps its
    /// original position.
    pub fn insert(&mut self, method: impl Into<String>, result: impl Into<EstimateResult>) {
        let method = method.into();
        let result = result.into();
        match self.rows.iter_mut().find(|(m, _)| *m == method) {
            Some(row) => row.1 = result,
            None => self.rows.push((method, result)),
        }
    }

    pub fn get(&self, method: &str) -> Option<&EstimateResult> {
        self.rows.iter().find(|(m, _)| m == method).map(|(_, r)| r)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.get(method).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[(String, EstimateResult)] {
        &self.rows
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(m, _)| m.as_str())
    }

    /// One row per method with columns `method, value, ci_low, ci_high`.
    /// Point results get null interval bounds.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let methods: Vec<&str> = self.methods().collect();
        let values: Vec<f64> = self.rows.iter().map(|(_, r)| r.value()).collect();
        let ci_low: Vec<Option<f64>> = self.rows.iter().map(|(_, r)| r.ci().map(|c| c.0)).collect();
        let ci_high: Vec<Option<f64>> = self.rows.iter().map(|(_, r)| r.ci().map(|c| c.1)).collect();

        Ok(df!["method" => methods, "value" => values, "ci_low" => ci_low, "ci_high" => ci_high]?)
    }
}

impl<S: Into<String>> FromIterator<(S, EstimateResult)> for ResultsTable {
    fn from_iter<I: IntoIterator<Item = (S, EstimateResult)>>(iter: I) -> Self {
        let mut table = ResultsTable::new();
        for (method, result) in iter {
            table.insert(method, result);
        }
        table
    }
}

/// Outer join of two tables on `method`.
///
/// Methods of `left` come first in their order, then methods only present in
/// `right`. Value and interval columns are suffixed, e.g. `value_d` and
/// `value_c` for suffixes `("_d", "_c")`. A side missing a method gets nulls.
pub fn merge_results(left: &ResultsTable, right: &ResultsTable, suffixes: (&str, &str)) -> Result<DataFrame> {
    let mut methods: Vec<&str> = left.methods().collect();
    methods.extend(right.methods().filter(|m| !left.contains(m)));

    let side = |table: &ResultsTable| {
        let mut value = Vec::with_capacity(methods.len());
        let mut ci_low = Vec::with_capacity(methods.len());
        let mut ci_high = Vec::with_capacity(methods.len());
        for m in &methods {
            let found = table.get(m);
            value.push(found.map(|r| r.value()));
            ci_low.push(found.and_then(|r| r.ci()).map(|c| c.0));
            ci_high.push(found.and_then(|r| r.ci()).map(|c| c.1));
        }
        (value, ci_low, ci_high)
    };

    let (l_value, l_low, l_high) = side(left);
    let (r_value, r_low, r_high) = side(right);
    let (sfx_l, sfx_r) = suffixes;

    Ok(df![
        "method" => &methods,
        format!("value{sfx_l}") => l_value,
        format!("ci_low{sfx_l}") => l_low,
        format!("ci_high{sfx_l}") => l_high,
        format!("value{sfx_r}") => r_value,
        format!("ci_low{sfx_r}") => r_low,
        format!("ci_high{sfx_r}") => r_high,
    ]?)
}
