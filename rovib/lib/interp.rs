//! Cubic-spline interpolation of array-sampled (continuous) functions.
//!
//! Splines use not-a-knot end conditions: the third derivative is continuous
//! across the second and next-to-last knots. Evaluation is restricted to the
//! sampled domain; asking for a value outside it is an error, never an
//! extrapolation.
//!
//! ```
//! use ndarray as nd;
//! use rovib::interp::CubicSpline;
//!
//! let x: nd::Array1<f64> = nd::Array1::linspace(0.0, 2.0, 9);
//! let y = x.mapv(|xk| xk.powi(3) - 2.0 * xk);
//! let spline = CubicSpline::new(&x, &y).unwrap();
//! // not-a-knot splines reproduce cubics exactly
//! let yi = spline.interpolate(&nd::array![0.3, 1.7]).unwrap();
//! assert!((yi[0] - (0.027 - 0.6)).abs() < 1e-12);
//! assert!((yi[1] - (4.913 - 3.4)).abs() < 1e-12);
//! assert!(spline.interpolate(&nd::array![2.5]).is_err());
//! ```

use ndarray as nd;
use crate::{
    Arr1,
    error::{ InputError, LengthError, RangeError },
    tridiag::TridiagonalLu,
};

pub type InterpResult<T> = Result<T, RangeError>;

/// A cubic spline through a set of knots with strictly increasing abscissae.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    x: nd::Array1<f64>,
    y: nd::Array1<f64>,
    // second derivative at each knot
    m: nd::Array1<f64>,
}

impl CubicSpline {
    /// Build a spline through `(x, y)`.
    ///
    /// Two knots give a straight line and three a parabola; four or more give
    /// a not-a-knot cubic spline.
    pub fn new<S, T>(x: &Arr1<S>, y: &Arr1<T>) -> Result<Self, InputError>
    where
        S: nd::Data<Elem = f64>,
        T: nd::Data<Elem = f64>,
    {
        LengthError::check(x, y)?;
        let n = x.len();
        if n < 2 { return Err(InputError::TooFewPoints { min: 2, got: n }); }
        if let Some(k)
            = x.iter().zip(x.iter().skip(1)).position(|(a, b)| b <= a)
        {
            return Err(InputError::NotIncreasing { index: k + 1, value: x[k + 1] });
        }

        let h: Vec<f64>
            = x.iter().zip(x.iter().skip(1)).map(|(a, b)| b - a).collect();
        let delta: Vec<f64>
            = y.iter().zip(y.iter().skip(1)).zip(&h)
            .map(|((a, b), hk)| (b - a) / hk)
            .collect();
        let mut m: nd::Array1<f64> = nd::Array1::zeros(n);
        match n {
            2 => { },
            3 => {
                let c = 2.0 * (delta[1] - delta[0]) / (x[2] - x[0]);
                m.fill(c);
            },
            _ => {
                let k = n - 2;
                let mut sub: Vec<f64> = vec![0.0; k - 1];
                let mut diag: Vec<f64> = vec![0.0; k];
                let mut sup: Vec<f64> = vec![0.0; k - 1];
                let mut rhs: Vec<f64> = vec![0.0; k];
                for i in 1..=k {
                    diag[i - 1] = 2.0 * (h[i - 1] + h[i]);
                    rhs[i - 1] = 6.0 * (delta[i] - delta[i - 1]);
                    if i > 1 { sub[i - 2] = h[i - 1]; }
                    if i < k { sup[i - 1] = h[i]; }
                }
                // fold the not-a-knot conditions into the first and last rows
                let (h0, h1) = (h[0], h[1]);
                diag[0] += h0 * (h0 + h1) / h1;
                if k > 1 { sup[0] -= h0 * h0 / h1; }
                let (ha, hb) = (h[n - 3], h[n - 2]);
                diag[k - 1] += hb * (ha + hb) / ha;
                if k > 1 { sub[k - 2] -= hb * hb / ha; }

                let lu = TridiagonalLu::factor(&sub, &diag, &sup, 1.0)?;
                lu.solve_inplace(&mut rhs);
                m.slice_mut(nd::s![1..n - 1])
                    .iter_mut().zip(rhs)
                    .for_each(|(mk, r)| { *mk = r; });
                m[0] = ((h0 + h1) * m[1] - h0 * m[2]) / h1;
                m[n - 1] = ((ha + hb) * m[n - 2] - hb * m[n - 3]) / ha;
            },
        }
        Ok(Self { x: x.to_owned(), y: y.to_owned(), m })
    }

    /// Lower and upper bounds of the sampled domain.
    pub fn domain(&self) -> (f64, f64) { (self.x[0], self.x[self.x.len() - 1]) }

    // evaluate at a point known to lie inside the domain
    fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        let i
            = self.x.as_slice()
            .map(|xs| xs.partition_point(|xk| *xk <= t))
            .unwrap_or_else(|| self.x.iter().take_while(|xk| **xk <= t).count())
            .saturating_sub(1)
            .min(n - 2);
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = (t - self.x[i]) / h;
        a * self.y[i] + b * self.y[i + 1]
            + ((a.powi(3) - a) * self.m[i] + (b.powi(3) - b) * self.m[i + 1])
            * h * h / 6.0
    }

    /// Evaluate the spline at every point of `grid`.
    ///
    /// Fails with [`RangeError::OutOfDomain`] if any point lies outside the
    /// sampled domain.
    pub fn interpolate<S>(&self, grid: &Arr1<S>) -> InterpResult<nd::Array1<f64>>
    where S: nd::Data<Elem = f64>
    {
        let (domain_lo, domain_hi) = self.domain();
        let lo = grid.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = grid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !grid.is_empty() && (lo < domain_lo || hi > domain_hi) {
            return Err(RangeError::OutOfDomain { lo, hi, domain_lo, domain_hi });
        }
        Ok(grid.mapv(|t| self.eval(t)))
    }
}
