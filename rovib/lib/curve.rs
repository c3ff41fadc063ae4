//! Point-wise curves: potentials or dipole moments sampled at a set of radii.
//!
//! Files hold one sample per row as whitespace-delimited columns
//! ```text
//! # R, Å    U, cm⁻¹     [σ, cm⁻¹]
//!   2.0     9500.0
//!   2.2     6100.0
//! ```
//! with `#` comment lines and blank lines ignored. The optional third column
//! gives a per-point uncertainty used to weight fit residuals.

use std::{ fs, path::Path };
use ndarray as nd;
use crate::{
    Arr1,
    error::{ Error, InputError, LengthError },
    interp::{ CubicSpline, InterpResult },
    potential::Potential,
};

/// Default uncertainty of a sample with value `v`.
pub fn default_uncertainty(v: f64) -> f64 { (v / 100.0).max(100.0) }

/// An immutable, ordered set of `(r, value, uncertainty)` samples with a
/// cubic spline through them.
#[derive(Clone, Debug)]
pub struct PotentialCurve {
    r: nd::Array1<f64>,
    v: nd::Array1<f64>,
    unc: nd::Array1<f64>,
    spline: CubicSpline,
}

/// One row of a curve/model comparison.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveComparison {
    pub r: f64,
    /// Sampled value.
    pub sampled: f64,
    /// Model value.
    pub model: f64,
}

impl CurveComparison {
    /// `sampled - model`
    pub fn delta(&self) -> f64 { self.sampled - self.model }
}

impl PotentialCurve {
    /// Build a curve from radii, values, and optional uncertainties.
    ///
    /// Radii must be strictly increasing, all arrays must have equal length,
    /// and at least two points are required. Missing uncertainties default to
    /// `max(v / 100, 100)`.
    pub fn load<S, T, U>(r: &Arr1<S>, v: &Arr1<T>, unc: Option<&Arr1<U>>)
        -> Result<Self, InputError>
    where
        S: nd::Data<Elem = f64>,
        T: nd::Data<Elem = f64>,
        U: nd::Data<Elem = f64>,
    {
        LengthError::check(r, v)?;
        let unc: nd::Array1<f64>
            = match unc {
                Some(u) => {
                    LengthError::check(r, u)?;
                    u.to_owned()
                },
                None => v.mapv(default_uncertainty),
            };
        unc.iter()
            .try_for_each(|s| InputError::check_positive("uncertainty", *s))?;
        let spline = CubicSpline::new(r, v)?;
        Ok(Self { r: r.to_owned(), v: v.to_owned(), unc, spline })
    }

    /// Parse a curve from the contents of a two- or three-column file.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let mut cols: Vec<Vec<f64>> = Vec::new();
        let mut ncols: Option<usize> = None;
        for (k, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }
            let row: Vec<f64>
                = line.split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|_| {
                            InputError::Number { line: k + 1, token: tok.into() }
                        })
                })
                .collect::<Result<_, _>>()?;
            match ncols {
                None => {
                    if !(2..=3).contains(&row.len()) {
                        return Err(
                            InputError::Columns { line: k + 1, found: row.len() });
                    }
                    ncols = Some(row.len());
                    cols = vec![Vec::new(); row.len()];
                },
                Some(n) if n != row.len() => {
                    return Err(InputError::MixedColumns {
                        line: k + 1,
                        found: row.len(),
                        expected: n,
                    });
                },
                Some(_) => { },
            }
            cols.iter_mut().zip(row).for_each(|(c, x)| { c.push(x); });
        }
        let got = cols.first().map(|c| c.len()).unwrap_or(0);
        if got < 2 { return Err(InputError::TooFewPoints { min: 2, got }); }
        let r = nd::Array1::from(cols[0].clone());
        let v = nd::Array1::from(cols[1].clone());
        let unc = cols.get(2).map(|c| nd::Array1::from(c.clone()));
        Self::load(&r, &v, unc.as_ref())
    }

    /// Read and [parse][Self::parse] a curve file.
    pub fn from_file<P>(path: P) -> Result<Self, Error>
    where P: AsRef<Path>
    {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    /// Sampled radii.
    pub fn r(&self) -> &nd::Array1<f64> { &self.r }

    /// Sampled values.
    pub fn values(&self) -> &nd::Array1<f64> { &self.v }

    /// Per-point uncertainties.
    pub fn uncertainties(&self) -> &nd::Array1<f64> { &self.unc }

    /// Number of samples.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize { self.r.len() }

    /// Lower and upper bounds of the sampled radii.
    pub fn domain(&self) -> (f64, f64) { self.spline.domain() }

    /// Spline-interpolate the curve onto `grid`.
    ///
    /// Fails if any radius in `grid` lies outside [`Self::domain`].
    pub fn interpolate<S>(&self, grid: &Arr1<S>) -> InterpResult<nd::Array1<f64>>
    where S: nd::Data<Elem = f64>
    {
        self.spline.interpolate(grid)
    }

    /// Pair every sample with the value of an analytic potential at the same
    /// radius.
    pub fn evaluate_with_model(&self, model: &Potential) -> Vec<CurveComparison> {
        let vm = model.evaluate(&self.r);
        self.r.iter().zip(&self.v).zip(vm)
            .map(|((r, sampled), model)| {
                CurveComparison { r: *r, sampled: *sampled, model }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use crate::error::RangeError;
    use super::*;

    const FILE: &str = "
# R, A     U, cm-1
  1.0     5000.0
  1.5      800.0
  2.0        0.0

  2.5      900.0
  3.0     2500.0
";

    #[test]
    fn parse_two_columns() {
        let curve = PotentialCurve::parse(FILE).unwrap();
        assert_eq!(curve.len(), 5);
        assert_eq!(curve.domain(), (1.0, 3.0));
        assert_eq!(curve.uncertainties()[0], 100.0);
        assert_eq!(curve.uncertainties()[2], 100.0);
        let big = PotentialCurve::parse("1.0 20000.0\n2.0 0.0\n").unwrap();
        assert_eq!(big.uncertainties()[0], 200.0);
    }

    #[test]
    fn parse_three_columns() {
        let curve
            = PotentialCurve::parse("1.0 4.0 0.5\n2.0 1.0 0.5\n3.0 0.0 1.0\n")
            .unwrap();
        assert_eq!(curve.uncertainties().to_vec(), vec![0.5, 0.5, 1.0]);
    }

    #[test]
    fn parse_failures() {
        assert!(matches!(
            PotentialCurve::parse("1.0 2.0\n2.0 3.0 0.1\n"),
            Err(InputError::MixedColumns { line: 2, found: 3, expected: 2 })
        ));
        assert!(matches!(
            PotentialCurve::parse("1.0\n"),
            Err(InputError::Columns { line: 1, found: 1 })
        ));
        assert!(matches!(
            PotentialCurve::parse("1.0 x\n"),
            Err(InputError::Number { line: 1, .. })
        ));
        assert!(matches!(
            PotentialCurve::parse("# nothing\n"),
            Err(InputError::TooFewPoints { min: 2, got: 0 })
        ));
        assert!(matches!(
            PotentialCurve::parse("2.0 1.0\n1.0 2.0\n"),
            Err(InputError::NotIncreasing { index: 1, .. })
        ));
    }

    #[test]
    fn interpolation_stays_in_domain() {
        let curve = PotentialCurve::parse(FILE).unwrap();
        let vi = curve.interpolate(&nd::array![1.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(vi[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(vi[2], 2500.0, epsilon = 1e-12);
        assert!(matches!(
            curve.interpolate(&nd::array![0.9, 2.0]),
            Err(RangeError::OutOfDomain { .. })
        ));
        assert!(matches!(
            curve.interpolate(&nd::array![2.0, 3.01]),
            Err(RangeError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn load_checks_lengths() {
        let r = nd::array![1.0, 2.0, 3.0];
        let v = nd::array![1.0, 2.0, 3.0];
        let u = nd::array![1.0, 2.0];
        assert!(matches!(
            PotentialCurve::load(&r, &v, Some(&u)),
            Err(InputError::Length(_))
        ));
        assert!(matches!(
            PotentialCurve::load(&r, &nd::array![1.0], None::<&nd::Array1<f64>>),
            Err(InputError::Length(_))
        ));
    }
}
