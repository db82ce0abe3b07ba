//! Small dense-matrix helpers used by the EKF update.
//!
//! Kept as explicit loops over `faer::Mat` rather than operator overloads:
//! the matrices here are always `n_dof`-sized (a handful of rows/columns),
//! so there is no performance reason to reach for anything fancier.

use faer::prelude::SpSolver;
use faer::Mat;
use trajopt_core::{TrajOptError, TrajOptResult};

pub fn mat_mul(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    let (m, k) = (a.nrows(), a.ncols());
    let n = b.ncols();
    assert_eq!(k, b.nrows(), "mat_mul: inner dimensions disagree");
    let mut out = Mat::zeros(m, n);
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0;
            for p in 0..k {
                acc += a.read(i, p) * b.read(p, j);
            }
            out.write(i, j, acc);
        }
    }
    out
}

pub fn mat_sub(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    assert_eq!(a.nrows(), b.nrows());
    assert_eq!(a.ncols(), b.ncols());
    let mut out = Mat::zeros(a.nrows(), a.ncols());
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            out.write(i, j, a.read(i, j) - b.read(i, j));
        }
    }
    out
}

pub fn mat_add(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    assert_eq!(a.nrows(), b.nrows());
    assert_eq!(a.ncols(), b.ncols());
    let mut out = Mat::zeros(a.nrows(), a.ncols());
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            out.write(i, j, a.read(i, j) + b.read(i, j));
        }
    }
    out
}

pub fn mat_transpose(a: &Mat<f64>) -> Mat<f64> {
    let mut out = Mat::zeros(a.ncols(), a.nrows());
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            out.write(j, i, a.read(i, j));
        }
    }
    out
}

/// Solves `A X = B` via partial-pivoted LU, the same decomposition the
/// teacher's power-flow solver uses for its Newton step.
pub fn solve(a: &Mat<f64>, b: &Mat<f64>) -> TrajOptResult<Mat<f64>> {
    let lu = a.partial_piv_lu();
    let x = lu.solve(b);
    for i in 0..x.nrows() {
        for j in 0..x.ncols() {
            if !x.read(i, j).is_finite() {
                return Err(TrajOptError::Numeric(
                    "singular matrix in EKF linear solve".to_string(),
                ));
            }
        }
    }
    Ok(x)
}

/// Lower-triangular Cholesky factor `L` such that `L L^T = a`. Returns a
/// [`TrajOptError::Numeric`] if `a` is not positive semi-definite, rather
/// than panicking — a bad linearization should be a rejected SQP step, not
/// a crash.
pub fn cholesky_lower(a: &Mat<f64>) -> TrajOptResult<Mat<f64>> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "cholesky_lower: matrix is not square");
    let mut l = Mat::zeros(n, n);
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a.read(i, j);
            for k in 0..j {
                sum -= l.read(i, k) * l.read(j, k);
            }
            if i == j {
                if sum < -1e-9 {
                    return Err(TrajOptError::Numeric(format!(
                        "covariance not positive semi-definite (diagonal {sum} at index {i})"
                    )));
                }
                l.write(i, j, sum.max(0.0).sqrt());
            } else {
                let denom = l.read(j, j);
                if denom.abs() < 1e-12 {
                    l.write(i, j, 0.0);
                } else {
                    l.write(i, j, sum / denom);
                }
            }
        }
    }
    Ok(l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cholesky_reconstructs_identity() {
        let mut a = Mat::zeros(2, 2);
        a.write(0, 0, 1.0);
        a.write(1, 1, 1.0);
        let l = cholesky_lower(&a).unwrap();
        let reconstructed = mat_mul(&l, &mat_transpose(&l));
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(reconstructed.read(i, j), a.read(i, j), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn cholesky_rejects_non_psd() {
        let mut a = Mat::zeros(1, 1);
        a.write(0, 0, -1.0);
        assert!(cholesky_lower(&a).is_err());
    }
}
