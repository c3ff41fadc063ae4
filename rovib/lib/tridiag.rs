//! Symmetric tridiagonal eigenproblems and general tridiagonal linear solves.
//!
//! The radial problem on a uniform grid reduces to a symmetric tridiagonal
//! matrix with tens of thousands of rows, of which only the few eigenpairs
//! lying below the dissociation limit are wanted. Dense diagonalization is
//! out of the question at that size, so eigenvalues are located by
//! Sturm-sequence bisection and eigenvectors recovered by inverse iteration,
//! both of which cost *O*(*N*) per eigenpair.

use ndarray as nd;
use crate::{
    Arr1,
    error::{ LengthError, RangeError, SolverError },
    utils::argmax_abs,
};

/// Selects which eigenpairs of a symmetric tridiagonal matrix to compute.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Selection {
    /// All eigenvalues in the half-open interval `(lo, hi]`.
    Window(f64, f64),
    /// Eigenvalues with (zero-based, ascending) indices `lo..=hi`.
    Index(usize, usize),
}

/// Eigenpairs returned by a [`TridiagonalEigensolver`].
///
/// Eigenvalues are sorted in ascending order; `vectors` holds the matching
/// eigenvectors as columns, each with unit Euclidean norm.
#[derive(Clone, Debug)]
pub struct Eigenpairs {
    /// Index of the first returned eigenvalue within the full spectrum.
    pub first: usize,
    pub values: nd::Array1<f64>,
    pub vectors: nd::Array2<f64>,
}

impl Eigenpairs {
    /// Number of returned eigenpairs.
    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

/// Narrow interface to a symmetric tridiagonal eigensolver.
///
/// `diag` has length *N* and `off` length *N* − 1.
pub trait TridiagonalEigensolver {
    fn solve(&self, diag: &[f64], off: &[f64], selection: Selection)
        -> Result<Eigenpairs, SolverError>;
}

/// Sturm-sequence bisection for eigenvalues followed by inverse iteration for
/// eigenvectors.
///
/// Eigenvectors are normalized so that their component of largest magnitude
/// is positive.
#[derive(Copy, Clone, Debug)]
pub struct SturmBisection {
    /// Number of inverse-iteration sweeps per eigenvector.
    pub sweeps: usize,
    /// Hard cap on bisection steps per eigenvalue.
    pub maxiters: usize,
}

impl Default for SturmBisection {
    fn default() -> Self { Self { sweeps: 3, maxiters: 200 } }
}

// Gershgorin bounds on the spectrum
fn gershgorin(diag: &[f64], off: &[f64]) -> (f64, f64) {
    let n = diag.len();
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (i, &d) in diag.iter().enumerate() {
        let left = if i > 0 { off[i - 1].abs() } else { 0.0 };
        let right = if i + 1 < n { off[i].abs() } else { 0.0 };
        lo = lo.min(d - left - right);
        hi = hi.max(d + left + right);
    }
    (lo, hi)
}

// number of eigenvalues strictly less than `x`
fn sturm_count(diag: &[f64], off2: &[f64], x: f64, pivmin: f64) -> usize {
    let mut count: usize = 0;
    let mut q = diag[0] - x;
    if q.abs() < pivmin { q = -pivmin; }
    if q < 0.0 { count += 1; }
    for (&d, &e2) in diag.iter().skip(1).zip(off2) {
        q = d - x - e2 / q;
        if q.abs() < pivmin { q = -pivmin; }
        if q < 0.0 { count += 1; }
    }
    count
}

// smallest float greater than `x`
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        x
    } else if x == 0.0 {
        f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        f64::from_bits(x.to_bits() - 1)
    }
}

impl SturmBisection {
    // locate the `k`-th eigenvalue (zero-based) given bounds with
    // count(lo) <= k < count(hi)
    #[allow(clippy::too_many_arguments)]
    fn bisect(
        &self,
        diag: &[f64],
        off2: &[f64],
        k: usize,
        mut lo: f64,
        mut hi: f64,
        pivmin: f64,
        abstol: f64,
    ) -> f64
    {
        for _ in 0..self.maxiters {
            let tol = abstol + 2.0 * f64::EPSILON * lo.abs().max(hi.abs());
            if hi - lo <= tol { break; }
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi { break; }
            if sturm_count(diag, off2, mid, pivmin) > k {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        0.5 * (lo + hi)
    }

    // recover the eigenvector for a converged eigenvalue `lambda`
    fn inverse_iteration(
        &self,
        diag: &[f64],
        off: &[f64],
        lambda: f64,
        seed: usize,
        tnorm: f64,
    ) -> Result<nd::Array1<f64>, LengthError>
    {
        let n = diag.len();
        let shifted: Vec<f64> = diag.iter().map(|d| d - lambda).collect();
        let lu = TridiagonalLu::factor(off, &shifted, off, tnorm)?;
        // deterministic, irregular start vector so that no eigenvector is
        // accidentally orthogonal to it
        let mut x: Vec<f64>
            = (0..n)
            .map(|i| {
                let t = (i + 1) as f64 * 0.618_033_988_749_895
                    + seed as f64 * 0.414_213_562_373_095;
                1.0 + 0.5 * (t - t.floor())
            })
            .collect();
        for _ in 0..self.sweeps.max(1) {
            lu.solve_inplace(&mut x);
            let norm = x.iter().map(|xi| xi * xi).sum::<f64>().sqrt();
            if norm == 0.0 || !norm.is_finite() { break; }
            x.iter_mut().for_each(|xi| { *xi /= norm; });
        }
        let mut x = nd::Array1::from(x);
        if x[argmax_abs(&x)] < 0.0 { x.mapv_inplace(|xi| -xi); }
        Ok(x)
    }
}

impl TridiagonalEigensolver for SturmBisection {
    fn solve(&self, diag: &[f64], off: &[f64], selection: Selection)
        -> Result<Eigenpairs, SolverError>
    {
        let n = diag.len();
        if n == 0 || off.len() + 1 != n {
            return Err(LengthError(n, off.len() + 1).into());
        }
        let off2: Vec<f64> = off.iter().map(|e| e * e).collect();
        let (glo, ghi) = gershgorin(diag, off);
        let tnorm = glo.abs().max(ghi.abs()).max(f64::MIN_POSITIVE);
        let pivmin
            = f64::MIN_POSITIVE
            * off2.iter().copied().fold(1.0_f64, f64::max);
        let abstol = f64::EPSILON * tnorm;
        // widen slightly so the outer bounds strictly contain the spectrum
        let pad = 2.0 * f64::EPSILON * tnorm + pivmin;
        let (glo, ghi) = (glo - pad, ghi + pad);

        let (first, last) = match selection {
            Selection::Window(lo, hi) => {
                let lo = lo.max(glo);
                let hi = hi.min(ghi);
                if hi <= lo {
                    return Ok(Eigenpairs {
                        first: 0,
                        values: nd::Array1::zeros(0),
                        vectors: nd::Array2::zeros((n, 0)),
                    });
                }
                // counts of eigenvalues <= lo and <= hi
                let ilo = sturm_count(diag, &off2, next_up(lo), pivmin);
                let ihi = sturm_count(diag, &off2, next_up(hi), pivmin);
                (ilo, ihi)
            },
            Selection::Index(lo, hi) => {
                if hi >= n {
                    return Err(
                        RangeError::MatrixIndex { index: hi, size: n }.into());
                }
                (lo, hi + 1)
            },
        };
        let m = last.saturating_sub(first);

        let mut values: nd::Array1<f64> = nd::Array1::zeros(m);
        let mut vectors: nd::Array2<f64> = nd::Array2::zeros((n, m));
        let mut lower = glo;
        for (j, k) in (first..last).enumerate() {
            let lambda
                = self.bisect(diag, &off2, k, lower, ghi, pivmin, abstol);
            values[j] = lambda;
            let v = self.inverse_iteration(diag, off, lambda, k, tnorm)?;
            vectors.column_mut(j).assign(&v);
            // every eigenvalue above this one lies at or beyond `lambda`
            lower = lambda - abstol;
        }
        Ok(Eigenpairs { first, values, vectors })
    }
}

/// LU factorization with partial pivoting of a general tridiagonal matrix.
///
/// Row interchanges introduce a second superdiagonal, stored in `du2`.
#[derive(Clone, Debug)]
pub struct TridiagonalLu {
    dl: Vec<f64>,
    d: Vec<f64>,
    du: Vec<f64>,
    du2: Vec<f64>,
    swap: Vec<bool>,
}

impl TridiagonalLu {
    /// Factor the matrix with subdiagonal `dl`, diagonal `d`, and
    /// superdiagonal `du`.
    ///
    /// Exactly singular pivots are replaced by `tiny`-scaled perturbations so
    /// that the factorization remains usable for inverse iteration.
    pub fn factor(dl: &[f64], d: &[f64], du: &[f64], tiny: f64)
        -> Result<Self, LengthError>
    {
        let n = d.len();
        if dl.len() + 1 != n { return Err(LengthError(dl.len() + 1, n)); }
        if du.len() + 1 != n { return Err(LengthError(du.len() + 1, n)); }
        let mut dl = dl.to_vec();
        let mut d = d.to_vec();
        let mut du = du.to_vec();
        let mut du2 = vec![0.0; n.saturating_sub(2)];
        let mut swap = vec![false; n.saturating_sub(1)];
        for i in 0..n.saturating_sub(1) {
            if d[i].abs() >= dl[i].abs() {
                if d[i] != 0.0 {
                    let fact = dl[i] / d[i];
                    dl[i] = fact;
                    d[i + 1] -= fact * du[i];
                }
            } else {
                let fact = d[i] / dl[i];
                d[i] = dl[i];
                dl[i] = fact;
                let temp = du[i];
                du[i] = d[i + 1];
                d[i + 1] = temp - fact * d[i + 1];
                if i + 2 < n {
                    du2[i] = du[i + 1];
                    du[i + 1] = -fact * du[i + 1];
                }
                swap[i] = true;
            }
        }
        let eps = f64::EPSILON * tiny.abs().max(f64::MIN_POSITIVE);
        d.iter_mut().for_each(|di| { if *di == 0.0 { *di = eps; } });
        Ok(Self { dl, d, du, du2, swap })
    }

    /// Number of rows.
    pub fn len(&self) -> usize { self.d.len() }

    pub fn is_empty(&self) -> bool { self.d.is_empty() }

    /// Solve *A* *x* = *b* in place.
    ///
    /// *Panics if `b` does not have the matrix's row count*.
    pub fn solve_inplace(&self, b: &mut [f64]) {
        let n = self.d.len();
        assert_eq!(b.len(), n, "right-hand side has the wrong length");
        for i in 0..n.saturating_sub(1) {
            if self.swap[i] {
                let temp = b[i];
                b[i] = b[i + 1];
                b[i + 1] = temp - self.dl[i] * b[i];
            } else {
                b[i + 1] -= self.dl[i] * b[i];
            }
        }
        if n == 0 { return; }
        b[n - 1] /= self.d[n - 1];
        if n > 1 {
            b[n - 2] = (b[n - 2] - self.du[n - 2] * b[n - 1]) / self.d[n - 2];
        }
        for i in (0..n.saturating_sub(2)).rev() {
            b[i] = (b[i] - self.du[i] * b[i + 1] - self.du2[i] * b[i + 2])
                / self.d[i];
        }
    }

    /// Solve *A* *x* = *b*, returning *x*.
    pub fn solve<S>(&self, b: &Arr1<S>) -> Result<nd::Array1<f64>, LengthError>
    where S: nd::Data<Elem = f64>
    {
        if b.len() != self.len() { return Err(LengthError(b.len(), self.len())); }
        let mut x: Vec<f64> = b.to_vec();
        self.solve_inplace(&mut x);
        Ok(nd::Array1::from(x))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use super::*;

    // -u'' on [0, π] with Dirichlet boundaries; eigenvalues k² in the
    // continuum limit, exactly (2 - 2 cos(kπ/(n+1))) / h² on the grid
    fn laplacian(n: usize) -> (Vec<f64>, Vec<f64>, f64) {
        let h = std::f64::consts::PI / (n + 1) as f64;
        (vec![2.0 / h / h; n], vec![-1.0 / h / h; n - 1], h)
    }

    fn exact(k: usize, n: usize, h: f64) -> f64 {
        let theta = k as f64 * std::f64::consts::PI / (n + 1) as f64;
        (2.0 - 2.0 * theta.cos()) / h / h
    }

    #[test]
    fn window_selects_lowest_eigenvalues() {
        let n = 400;
        let (d, e, h) = laplacian(n);
        let pairs = SturmBisection::default()
            .solve(&d, &e, Selection::Window(0.0, 20.0)).unwrap();
        // k² < 20 for k = 1..=4
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs.first, 0);
        for (j, ev) in pairs.values.iter().enumerate() {
            assert_abs_diff_eq!(*ev, exact(j + 1, n, h), epsilon = 1e-8);
        }
    }

    #[test]
    fn window_excludes_lower_edge_and_includes_upper_edge() {
        let d = [1.0, 2.0, 3.0];
        let e = [0.0, 0.0];
        let pairs = SturmBisection::default()
            .solve(&d, &e, Selection::Window(1.0, 2.0)).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.first, 1);
        assert_abs_diff_eq!(pairs.values[0], 2.0, epsilon = 1e-12);
        assert_eq!(next_up(-0.0), f64::from_bits(1));
        assert!(next_up(-1.0) > -1.0);
    }

    #[test]
    fn eigenvectors_are_normalized_and_satisfy_the_equation() {
        let n = 200;
        let (d, e, _) = laplacian(n);
        let pairs = SturmBisection::default()
            .solve(&d, &e, Selection::Index(0, 2)).unwrap();
        for (j, lambda) in pairs.values.iter().enumerate() {
            let v = pairs.vectors.column(j);
            assert_abs_diff_eq!(v.dot(&v), 1.0, epsilon = 1e-12);
            let imax
                = v.iter().enumerate()
                .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
                .unwrap().0;
            assert!(v[imax] > 0.0);
            for i in 1..n - 1 {
                let tv = e[i - 1] * v[i - 1] + d[i] * v[i] + e[i] * v[i + 1];
                assert_abs_diff_eq!(tv, lambda * v[i], epsilon = 1e-6 * d[i]);
            }
        }
    }

    #[test]
    fn index_beyond_matrix_size_fails() {
        let (d, e, _) = laplacian(10);
        let res = SturmBisection::default()
            .solve(&d, &e, Selection::Index(0, 10));
        assert!(matches!(
            res,
            Err(SolverError::Range(RangeError::MatrixIndex { index: 10, size: 10 }))
        ));
    }

    #[test]
    fn lu_solves_with_pivoting() {
        // small diagonal forces row interchanges
        let dl = [3.0, 1.0, 4.0];
        let d = [1e-3, 2.0, -1.0, 5.0];
        let du = [2.0, 1.0, 0.5];
        let x_true = nd::array![1.0, -2.0, 0.5, 3.0];
        let b = nd::array![
            d[0] * x_true[0] + du[0] * x_true[1],
            dl[0] * x_true[0] + d[1] * x_true[1] + du[1] * x_true[2],
            dl[1] * x_true[1] + d[2] * x_true[2] + du[2] * x_true[3],
            dl[2] * x_true[2] + d[3] * x_true[3],
        ];
        let lu = TridiagonalLu::factor(&dl, &d, &du, 1.0).unwrap();
        let x = lu.solve(&b).unwrap();
        for (xi, ti) in x.iter().zip(&x_true) {
            assert_abs_diff_eq!(xi, ti, epsilon = 1e-12);
        }
    }
}
