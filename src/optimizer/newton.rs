//! Dense symmetric positive-definite solves for Newton steps.
//!
//! Systems here are `(n_features + 1)²`, so a plain Cholesky factorization
//! is enough. A Hessian that is only semi-definite (a feature that never
//! fires and carries no penalty) is shifted by a small diagonal jitter.

use ndarray::{Array1, Array2};

/// Attempts with growing jitter before giving up.
const MAX_JITTER_ATTEMPTS: usize = 8;

/// Solves `a · x = b` for symmetric positive-(semi)definite `a`.
///
/// Returns `None` when `a` is not square, sizes disagree, or the matrix
/// stays indefinite after jittering.
pub fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return None;
    }
    let scale = a.diag().iter().fold(0.0_f64, |m, &v| m.max(v.abs())).max(f64::MIN_POSITIVE);

    let mut jitter = 0.0;
    for _ in 0..MAX_JITTER_ATTEMPTS {
        let mut shifted = a.clone();
        shifted.diag_mut().mapv_inplace(|v| v + jitter);
        if let Some(l) = cholesky(&shifted) {
            return Some(substitute(&l, b));
        }
        jitter = if jitter == 0.0 { scale * 1e-12 } else { jitter * 100.0 };
    }
    None
}

/// Lower-triangular `L` with `L·Lᵀ = a`.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag.is_nan() || diag <= 0.0 {
            return None;
        }
        let diag = diag.sqrt();
        l[[j, j]] = diag;
        for i in (j + 1)..n {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = v / diag;
        }
    }
    Some(l)
}

/// Forward then backward substitution through `L` and `Lᵀ`.
fn substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut v = b[i];
        for k in 0..i {
            v -= l[[i, k]] * y[k];
        }
        y[i] = v / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut v = y[i];
        for k in (i + 1)..n {
            v -= l[[k, i]] * x[k];
        }
        x[i] = v / l[[i, i]];
    }
    x
}
