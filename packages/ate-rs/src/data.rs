// src/data.rs
//! Observation table keyed by semantic role.
//!
//! Column names are resolved once, when a [`Dataset`] is built from a polars
//! frame. Estimators then work on dense `f64` arrays and never look columns
//! up in the frame again.

use ndarray::{Array1, ArrayView1};
use polars::prelude::*;

use crate::utils::{AteError, Result};

/// Which frame columns play the treatment, outcome and confounder roles.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRoles {
    pub treatment: String,
    pub outcome: String,
    pub confounders: Vec<String>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            treatment: "D".to_string(),
            outcome: "Y".to_string(),
            confounders: vec!["Z".to_string(), "W".to_string()],
        }
    }
}

impl ColumnRoles {
    pub fn new(treatment: &str, outcome: &str, confounders: &[&str]) -> Self {
        Self {
            treatment: treatment.to_string(),
            outcome: outcome.to_string(),
            confounders: confounders.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.treatment.as_str())
            .chain(std::iter::once(self.outcome.as_str()))
            .chain(self.confounders.iter().map(|c| c.as_str()))
    }
}

/// In-memory observation table: one binary treatment, one outcome and any
/// number of named confounders, all of the same length.
#[derive(Debug, Clone)]
pub struct Dataset {
    roles: ColumnRoles,
    treatment: Array1<f64>,
    outcome: Array1<f64>,
    confounders: Vec<Array1<f64>>,
}

impl Dataset {
    /// Build a dataset from already extracted columns.
    ///
    /// `confounders` must follow the order of `roles.confounders`. Treatment
    /// values must be exactly 0 or 1 and every value must be finite.
    pub fn new(
        roles: ColumnRoles,
        treatment: Array1<f64>,
        outcome: Array1<f64>,
        confounders: Vec<Array1<f64>>,
    ) -> Result<Self> {
        let n_obs = treatment.len();

        if outcome.len() != n_obs {
            return Err(AteError::DimensionMismatch { expected: n_obs, got: outcome.len() });
        }
        if confounders.len() != roles.confounders.len() {
            return Err(AteError::InvalidInput(format!(
                "{} confounder names but {} confounder columns",
                roles.confounders.len(),
                confounders.len()
            )));
        }
        for col in &confounders {
            if col.len() != n_obs {
                return Err(AteError::DimensionMismatch { expected: n_obs, got: col.len() });
            }
        }

        let names: Vec<&str> = roles.all_names().collect();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(AteError::InvalidInput(format!("column '{name}' is assigned two roles")));
            }
        }

        if treatment.iter().any(|&d| d != 0.0 && d != 1.0) {
            return Err(AteError::InvalidInput(format!(
                "treatment column '{}' must only contain 0 and 1",
                roles.treatment
            )));
        }
        let all_finite = outcome.iter().all(|v| v.is_finite())
            && confounders.iter().all(|c| c.iter().all(|v| v.is_finite()));
        if !all_finite {
            return Err(AteError::InvalidInput("outcome and confounders must be finite".to_string()));
        }

        Ok(Self { roles, treatment, outcome, confounders })
    }

    /// Resolve the role columns of a polars frame.
    ///
    /// Integer and boolean columns are cast to `Float64`. Nulls are rejected.
    pub fn from_frame(df: &DataFrame, roles: &ColumnRoles) -> Result<Self> {
        let treatment = column_as_f64(df, &roles.treatment)?;
        let outcome = column_as_f64(df, &roles.outcome)?;
        let confounders = roles
            .confounders
            .iter()
            .map(|name| column_as_f64(df, name))
            .collect::<Result<Vec<_>>>()?;

        Self::new(roles.clone(), treatment, outcome, confounders)
    }

    pub fn n_obs(&self) -> usize {
        self.treatment.len()
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    pub fn treatment_name(&self) -> &str {
        &self.roles.treatment
    }

    pub fn outcome_name(&self) -> &str {
        &self.roles.outcome
    }

    pub fn treatment(&self) -> ArrayView1<'_, f64> {
        self.treatment.view()
    }

    pub fn outcome(&self) -> ArrayView1<'_, f64> {
        self.outcome.view()
    }

    /// Look a column up by its frame name, whatever its role.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        if name == self.roles.treatment {
            return Some(self.treatment.view());
        }
        if name == self.roles.outcome {
            return Some(self.outcome.view());
        }
        self.roles
            .confounders
            .iter()
            .position(|c| c == name)
            .map(|i| self.confounders[i].view())
    }

    /// Row indices of units with `D == arm`, in row order.
    pub fn arm_indices(&self, arm: u8) -> Vec<usize> {
        let target = f64::from(arm);
        self.treatment
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == target)
            .map(|(i, _)| i)
            .collect()
    }

    /// `(n_control, n_treated)`
    pub fn arm_counts(&self) -> (usize, usize) {
        let n_treated = self.treatment.iter().filter(|&&d| d == 1.0).count();
        (self.n_obs() - n_treated, n_treated)
    }

    /// New dataset made of the given rows, repeats allowed.
    pub fn take(&self, indices: &[usize]) -> Dataset {
        let pick = |col: &Array1<f64>| Array1::from_iter(indices.iter().map(|&i| col[i]));
        Dataset {
            roles: self.roles.clone(),
            treatment: pick(&self.treatment),
            outcome: pick(&self.outcome),
            confounders: self.confounders.iter().map(pick).collect(),
        }
    }

    /// Units with `D == arm` only.
    pub fn arm(&self, arm: u8) -> Dataset {
        self.take(&self.arm_indices(arm))
    }

    /// Copy of the dataset with one extra confounder column appended.
    pub fn with_column(&self, name: &str, values: Array1<f64>) -> Result<Dataset> {
        if values.len() != self.n_obs() {
            return Err(AteError::DimensionMismatch { expected: self.n_obs(), got: values.len() });
        }
        if self.column(name).is_some() {
            return Err(AteError::InvalidInput(format!("column '{name}' already exists")));
        }
        let mut out = self.clone();
        out.roles.confounders.push(name.to_string());
        out.confounders.push(values);
        Ok(out)
    }
}

fn column_as_f64(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let col = df.column(name)?.cast(&DataType::Float64)?;
    let values = col.f64()?;

    let out: Option<Vec<f64>> = values.iter().collect();
    out.map(Array1::from)
        .ok_or_else(|| AteError::InvalidInput(format!("column '{name}' contains nulls")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small() -> Dataset {
        Dataset::new(
            ColumnRoles::default(),
            array![0.0, 1.0, 1.0, 0.0],
            array![1.0, 2.0, 3.0, 4.0],
            vec![array![0.0, 1.0, 2.0, 0.0], array![3.0, 4.0, 4.0, 3.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_from_frame_casts_integers() {
        let df = df![
            "D" => [0i64, 1, 1],
            "Y" => [1.5, 2.5, 3.5],
            "Z" => [0i64, 2, 1],
            "W" => [3i64, 4, 4],
        ]
        .unwrap();
        let ds = Dataset::from_frame(&df, &ColumnRoles::default()).unwrap();

        assert_eq!(ds.n_obs(), 3);
        assert_eq!(ds.column("Z").unwrap().to_vec(), vec![0.0, 2.0, 1.0]);
        assert_eq!(ds.arm_counts(), (1, 2));
    }

    #[test]
    fn test_from_frame_missing_column() {
        let df = df!["D" => [0i64, 1], "Y" => [1.0, 2.0]].unwrap();
        let res = Dataset::from_frame(&df, &ColumnRoles::default());
        assert!(matches!(res, Err(AteError::Polars(_))));
    }

    #[test]
    fn test_rejects_non_binary_treatment() {
        let res = Dataset::new(
            ColumnRoles::new("D", "Y", &[]),
            array![0.0, 2.0],
            array![1.0, 2.0],
            vec![],
        );
        assert!(matches!(res, Err(AteError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_duplicate_roles() {
        let res = Dataset::new(
            ColumnRoles::new("D", "Y", &["D"]),
            array![0.0, 1.0],
            array![1.0, 2.0],
            vec![array![0.0, 1.0]],
        );
        assert!(matches!(res, Err(AteError::InvalidInput(_))));
    }

    #[test]
    fn test_take_and_arm() {
        let ds = small();
        let boot = ds.take(&[3, 3, 1]);
        assert_eq!(boot.outcome().to_vec(), vec![4.0, 4.0, 2.0]);
        assert_eq!(boot.column("W").unwrap().to_vec(), vec![3.0, 3.0, 4.0]);

        let treated = ds.arm(1);
        assert_eq!(treated.outcome().to_vec(), vec![2.0, 3.0]);
        assert_eq!(ds.arm_indices(0), vec![0, 3]);
    }

    #[test]
    fn test_with_column() {
        let ds = small().with_column("ps", array![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(ds.column("ps").unwrap()[2], 0.3);
        assert!(ds.with_column("Z", array![0.0, 0.0, 0.0, 0.0]).is_err());
    }
}
