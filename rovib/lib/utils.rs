//! Discrete sums over the radial grid.
//!
//! Wavefunctions returned by the level solver are normalized as plain vectors,
//! `Σ ψᵢ² = 1`, so grid "integrals" here are bare sums with no step factor.

use ndarray as nd;
use crate::{ Arr1, error::LengthError };

/// Compute `Σ qᵢ pᵢ wᵢ`.
pub fn wf_dot_weighted<S, T, U>(q: &Arr1<S>, p: &Arr1<T>, w: &Arr1<U>)
    -> Result<f64, LengthError>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
    U: nd::Data<Elem = f64>,
{
    LengthError::check(q, p)?;
    LengthError::check(q, w)?;
    Ok(
        q.iter().zip(p).zip(w)
            .map(|((qk, pk), wk)| qk * pk * wk)
            .sum()
    )
}

/// Compute `Σ qᵢ² wᵢ`.
pub fn wf_expect<S, T>(q: &Arr1<S>, w: &Arr1<T>) -> Result<f64, LengthError>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    LengthError::check(q, w)?;
    Ok(q.iter().zip(w).map(|(qk, wk)| qk * qk * wk).sum())
}

/// Compute `Σ (qᵢ (wᵢ - c))²`.
pub fn wf_shifted_sq<S, T>(q: &Arr1<S>, w: &Arr1<T>, c: f64)
    -> Result<f64, LengthError>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    LengthError::check(q, w)?;
    Ok(q.iter().zip(w).map(|(qk, wk)| (qk * (wk - c)).powi(2)).sum())
}

/// Index of the element of largest magnitude, or 0 for an empty array.
pub fn argmax_abs<S>(x: &Arr1<S>) -> usize
where S: nd::Data<Elem = f64>
{
    x.iter().enumerate()
        .fold((0, f64::NEG_INFINITY), |(im, am), (i, xi)| {
            if xi.abs() > am { (i, xi.abs()) } else { (im, am) }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums() {
        let q = nd::array![1.0, 2.0, -1.0];
        let p = nd::array![0.5, 0.5, 2.0];
        let w = nd::array![2.0, 1.0, 1.0];
        assert_eq!(wf_dot_weighted(&q, &p, &w).unwrap(), 1.0 + 1.0 - 2.0);
        assert_eq!(wf_expect(&q, &w).unwrap(), 2.0 + 4.0 + 1.0);
        assert_eq!(wf_shifted_sq(&q, &w, 1.0).unwrap(), 1.0);
        assert!(wf_expect(&q, &nd::array![1.0]).is_err());
    }

    #[test]
    fn largest_magnitude() {
        assert_eq!(argmax_abs(&nd::array![0.1, -3.0, 2.0]), 1);
        assert_eq!(argmax_abs(&nd::Array1::<f64>::zeros(0)), 0);
    }
}
