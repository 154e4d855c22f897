// src/regression/formula.rs
//! Additive model expressions such as `"D + Z + W"`.
//!
//! Only bare column names joined by `+` are understood, plus an optional
//! explicit `1` for the intercept. Every design matrix gets a leading column
//! of ones whether or not `1` is written.

use std::fmt;

use ndarray::Array2;

use crate::data::Dataset;
use crate::utils::{AteError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    terms: Vec<String>,
}

impl Formula {
    /// Parse an expression. Repeated terms are kept once, first occurrence
    /// wins the position.
    pub fn parse(expr: &str) -> Result<Self> {
        if expr.trim().is_empty() {
            return Err(AteError::Formula("empty model expression".to_string()));
        }

        let mut terms: Vec<String> = Vec::new();
        for raw in expr.split('+') {
            let term = raw.trim();
            if term.is_empty() {
                return Err(AteError::Formula(format!("empty term in '{expr}'")));
            }
            if term == "1" {
                continue;
            }
            if !is_identifier(term) {
                return Err(AteError::Formula(format!(
                    "unsupported term '{term}' in '{expr}', only column names joined by '+' are allowed"
                )));
            }
            if !terms.iter().any(|t| t == term) {
                terms.push(term.to_string());
            }
        }

        Ok(Self { terms })
    }

    /// Build from column names, validated like parsed terms.
    pub fn from_terms(terms: &[&str]) -> Result<Self> {
        Self::parse(&terms.join(" + "))
    }

    /// Built-in default expressions, already known to be well formed.
    pub(crate) fn from_known_terms(terms: &[&str]) -> Self {
        Self { terms: terms.iter().map(|t| t.to_string()).collect() }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of design columns, intercept included.
    pub fn n_cols(&self) -> usize {
        self.terms.len() + 1
    }

    /// `true` when the first term (the coefficient right after the
    /// intercept) is `name`.
    pub fn leads_with(&self, name: &str) -> bool {
        self.terms.first().is_some_and(|t| t == name)
    }

    /// Numeric design matrix: intercept, then one column per term in order.
    pub fn design_matrix(&self, data: &Dataset) -> Result<Array2<f64>> {
        let n_obs = data.n_obs();
        let mut x = Array2::ones((n_obs, self.n_cols()));

        for (j, term) in self.terms.iter().enumerate() {
            let col = data.column(term).ok_or_else(|| {
                AteError::Formula(format!("term '{term}' is not a column of the dataset"))
            })?;
            x.column_mut(j + 1).assign(&col);
        }

        Ok(x)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "1");
        }
        write!(f, "{}", self.terms.join(" + "))
    }
}

fn is_identifier(term: &str) -> bool {
    let mut chars = term.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnRoles;
    use ndarray::array;

    fn dataset() -> Dataset {
        Dataset::new(
            ColumnRoles::default(),
            array![0.0, 1.0, 1.0],
            array![1.0, 2.0, 3.0],
            vec![array![0.0, 1.0, 2.0], array![3.0, 4.0, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_terms_in_order() {
        let f = Formula::parse("D + Z+W").unwrap();
        assert_eq!(f.terms(), &["D", "Z", "W"]);
        assert_eq!(f.n_cols(), 4);
        assert!(f.leads_with("D"));
        assert_eq!(f.to_string(), "D + Z + W");
    }

    #[test]
    fn test_parse_explicit_intercept_and_duplicates() {
        let f = Formula::parse("1 + W + Z + W").unwrap();
        assert_eq!(f.terms(), &["W", "Z"]);

        let intercept_only = Formula::parse("1").unwrap();
        assert_eq!(intercept_only.n_cols(), 1);
        assert_eq!(intercept_only.to_string(), "1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Formula::parse("  "), Err(AteError::Formula(_))));
        assert!(matches!(Formula::parse("D + "), Err(AteError::Formula(_))));
        assert!(matches!(Formula::parse("D:Z"), Err(AteError::Formula(_))));
        assert!(matches!(Formula::parse("np.log(Z)"), Err(AteError::Formula(_))));
        assert!(matches!(Formula::parse("0 + D"), Err(AteError::Formula(_))));
    }

    #[test]
    fn test_design_matrix() {
        let x = Formula::parse("D + W").unwrap().design_matrix(&dataset()).unwrap();
        assert_eq!(x, array![[1.0, 0.0, 3.0], [1.0, 1.0, 4.0], [1.0, 1.0, 4.0]]);
    }

    #[test]
    fn test_design_matrix_unknown_column() {
        let res = Formula::parse("D + X").unwrap().design_matrix(&dataset());
        match res {
            Err(AteError::Formula(msg)) => assert!(msg.contains("'X'")),
            other => panic!("expected formula error, got {other:?}"),
        }
    }
}
