// src/regression/linalg.rs

use ndarray::{Array1, Array2};

use crate::utils::{AteError, Result};

/// Pivots below this fraction of the largest diagonal entry mark the system
/// as singular.
const PIVOT_TOL: f64 = 1e-10;

/// Eigenvalues below this fraction of the largest one are dropped by the
/// pseudo-inverse.
const EIGEN_TOL: f64 = 1e-10;

const JACOBI_MAX_SWEEPS: usize = 100;

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `SingularDesign` when a pivot is numerically zero.
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();

    if a.ncols() != n {
        return Err(AteError::DimensionMismatch { expected: n, got: a.ncols() });
    }
    if b.len() != n {
        return Err(AteError::DimensionMismatch { expected: n, got: b.len() });
    }

    let scale = a.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);

    // Augmented matrix [A|b]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for k in 0..n {
        let mut max_val = aug[[k, k]].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let val = aug[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if !(max_val > PIVOT_TOL * scale) {
            return Err(AteError::SingularDesign { cols: n });
        }

        if max_row != k {
            for j in 0..=n {
                aug.swap([k, j], [max_row, j]);
            }
        }

        for i in (k + 1)..n {
            let factor = aug[[i, k]] / aug[[k, k]];
            for j in k..=n {
                aug[[i, j]] -= factor * aug[[k, j]];
            }
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

/// Minimum-norm solution of `A x = b` for symmetric positive semi-definite `A`.
///
/// Uses the Moore-Penrose pseudo-inverse built from a cyclic Jacobi
/// eigen-decomposition. Directions with eigenvalue below
/// `EIGEN_TOL * max_eigenvalue` are discarded.
pub fn solve_pseudo_inverse(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(AteError::DimensionMismatch { expected: n, got: a.ncols() });
    }
    if b.len() != n {
        return Err(AteError::DimensionMismatch { expected: n, got: b.len() });
    }

    let (eigenvalues, eigenvectors) = symmetric_eigen(a);
    let max_eig = eigenvalues.iter().fold(0.0_f64, |m, v| m.max(v.abs()));

    // x = V diag(1/lambda) V' b over the retained eigenpairs
    let mut x = Array1::zeros(n);
    if max_eig > 0.0 {
        for k in 0..n {
            let lambda = eigenvalues[k];
            if lambda.abs() <= EIGEN_TOL * max_eig {
                continue;
            }
            let v = eigenvectors.column(k);
            let coef = v.dot(b) / lambda;
            x.scaled_add(coef, &v);
        }
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(AteError::SingularDesign { cols: n });
    }
    Ok(x)
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues and a matrix whose columns are the eigenvectors.
fn symmetric_eigen(a: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut m = a.to_owned();
    let mut v = Array2::eye(n);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| m[[i, j]] * m[[i, j]])
            .sum();
        let diag: f64 = (0..n).map(|i| m[[i, i]] * m[[i, i]]).sum();
        if off <= 1e-30 * diag.max(f64::MIN_POSITIVE) {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = m[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let mkp = m[[k, p]];
                    let mkq = m[[k, q]];
                    m[[k, p]] = c * mkp - s * mkq;
                    m[[k, q]] = s * mkp + c * mkq;
                }
                for k in 0..n {
                    let mpk = m[[p, k]];
                    let mqk = m[[q, k]];
                    m[[p, k]] = c * mpk - s * mqk;
                    m[[q, k]] = s * mpk + c * mqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (m.diag().to_owned(), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_solve_linear_system() {
        let a = array![[4.0, 1.0], [1.0, 3.0]];
        let b = array![1.0, 2.0];
        let x = solve_linear_system(&a, &b).unwrap();

        assert_relative_eq!(x[0], 1.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 7.0 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![2.0, 3.0];
        let x = solve_linear_system(&a, &b).unwrap();

        assert_relative_eq!(x[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_is_reported() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(matches!(
            solve_linear_system(&a, &b),
            Err(AteError::SingularDesign { cols: 2 })
        ));
    }

    #[test]
    fn test_pseudo_inverse_matches_full_rank_solve() {
        let a = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let b = array![1.0, 2.0, 3.0];
        let exact = solve_linear_system(&a, &b).unwrap();
        let pinv = solve_pseudo_inverse(&a, &b).unwrap();

        for i in 0..3 {
            assert_relative_eq!(exact[i], pinv[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pseudo_inverse_minimum_norm() {
        // Duplicated column: X = [1, 1], X'X = [[1,1],[1,1]], X'y = [2,2].
        // Minimum-norm solution splits the coefficient evenly.
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let b = array![2.0, 2.0];
        let x = solve_pseudo_inverse(&a, &b).unwrap();

        assert_relative_eq!(x[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pseudo_inverse_zero_column() {
        let a = array![[2.0, 0.0], [0.0, 0.0]];
        let b = array![4.0, 0.0];
        let x = solve_pseudo_inverse(&a, &b).unwrap();

        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-12);
    }
}
