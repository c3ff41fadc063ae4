//! Analytic potential energy curves.
//!
//! Three model families are supported, all sharing a short-range exponent
//! function expanded in the reduced radial variable
//! ```text
//!         r^q - rref^q
//! y_q  =  ------------ ,       β(y) = Σ βₙ yⁿ
//!         r^q + rref^q
//! ```
//! - Extended Morse Oscillator (EMO):
//!   `V(r) = De (1 - exp(-β(y_q) (r - re)))²`
//! - Morse/Long-Range (MLR), which blends β between its polynomial and the
//!   long-range limit `β∞ = ln(2 De / U_lr(re))` so that the potential takes
//!   the form `De - U_lr(r)` at large `r`.
//! - Double-Exponential/Long-Range (DELR), whose two exponential amplitudes
//!   are fixed by requiring a minimum of depth `De` at `re`.
//!
//! Every model can be shifted by an energy [`Origin`].

use std::fmt;
use ndarray as nd;
use crate::{
    Arr1,
    error::{ FitError, InputError },
    longrange::LongRange,
};

/// Energy origin of an analytic curve.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum Origin {
    /// Zero at the potential minimum.
    #[default]
    Minimum,
    /// Absolute term energy: the whole curve is shifted up by `Te`.
    Te(f64),
    /// Dissociation-referenced: the curve is shifted so that it dissociates
    /// to `Td`.
    Td(f64),
}

impl Origin {
    /// Build from the two optional settings, rejecting the ambiguous case
    /// where both are given.
    pub fn from_options(te: Option<f64>, td: Option<f64>)
        -> Result<Self, InputError>
    {
        match (te, td) {
            (Some(_), Some(_)) => Err(InputError::AmbiguousOrigin),
            (Some(te), None) => Ok(Self::Te(te)),
            (None, Some(td)) => Ok(Self::Td(td)),
            (None, None) => Ok(Self::Minimum),
        }
    }

    /// Additive energy shift for a curve of well depth `de`.
    pub fn shift(&self, de: f64) -> f64 {
        match *self {
            Self::Minimum => 0.0,
            Self::Te(te) => te,
            Self::Td(td) => td - de,
        }
    }
}

// reduced radial variable
fn y(r: f64, q: i32, rref: f64) -> f64 {
    let rq = r.powi(q);
    let rrefq = rref.powi(q);
    (rq - rrefq) / (rq + rrefq)
}

// power series in y with coefficients beta
fn beta_poly(beta: &[f64], y: f64) -> f64 {
    beta.iter().rev().fold(0.0, |acc, b| acc * y + b)
}

/// Extended Morse Oscillator.
#[derive(Clone, Debug, PartialEq)]
pub struct Emo {
    /// Well depth (cm⁻¹).
    pub de: f64,
    /// Equilibrium radius (Å).
    pub re: f64,
    /// Reference radius of the reduced variable (Å).
    pub rref: f64,
    pub q: i32,
    pub beta: Vec<f64>,
}

impl Emo {
    pub fn evaluate<S>(&self, r: &Arr1<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        r.mapv(|rk| {
            let b = beta_poly(&self.beta, y(rk, self.q, self.rref));
            self.de * (1.0 - (-b * (rk - self.re)).exp()).powi(2)
        })
    }
}

/// Morse/Long-Range potential.
///
/// See Le Roy et al., J. Chem. Phys. 131, 204309 (2009).
#[derive(Clone, Debug, PartialEq)]
pub struct Mlr {
    pub de: f64,
    pub re: f64,
    pub rref: f64,
    pub q: i32,
    /// Exponent of the blending variable.
    pub p: i32,
    pub beta: Vec<f64>,
    pub long_range: LongRange,
}

impl Mlr {
    pub fn evaluate<S>(&self, r: &Arr1<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        let ulr_re = self.long_range.value(self.re);
        let binf = (2.0 * self.de / ulr_re).ln();
        r.mapv(|rk| {
            let yq = y(rk, self.q, self.rref);
            let yp = y(rk, self.p, self.rref);
            let yp_eq = y(rk, self.p, self.re);
            let b = beta_poly(&self.beta, yq) * (1.0 - yp) + binf * yp;
            let ulr = self.long_range.value(rk);
            self.de * (1.0 - ulr / ulr_re * (-b * yp_eq).exp()).powi(2)
        })
    }
}

/// Double-Exponential/Long-Range potential.
///
/// See Le Roy et al., J. Chem. Phys. 119, 7398 (2003).
#[derive(Clone, Debug, PartialEq)]
pub struct Delr {
    pub de: f64,
    pub re: f64,
    pub rref: f64,
    pub q: i32,
    pub beta: Vec<f64>,
    pub long_range: LongRange,
}

impl Delr {
    /// Amplitudes `(A, B)` of the two exponential terms.
    pub fn amplitudes(&self) -> (f64, f64) {
        let beta_re = beta_poly(&self.beta, y(self.re, self.q, self.rref));
        let ulr_re = self.long_range.value(self.re);
        let dulr_re = self.long_range.deriv(self.re);
        let a = self.de - ulr_re - dulr_re / beta_re;
        let b = self.de - ulr_re + a;
        (a, b)
    }

    pub fn evaluate<S>(&self, r: &Arr1<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        let (a, b) = self.amplitudes();
        r.mapv(|rk| {
            let bk = beta_poly(&self.beta, y(rk, self.q, self.rref));
            let ex = (-bk * (rk - self.re)).exp();
            self.de - self.long_range.value(rk) + a * ex * ex - b * ex
        })
    }
}

/// Model families.
#[derive(Clone, Debug, PartialEq)]
pub enum Model {
    Emo(Emo),
    Mlr(Mlr),
    Delr(Delr),
}

/// An analytic potential: a model plus its energy origin.
///
/// Trial records built during a fit are fresh values produced by
/// [`Self::with_fit_vector`]; a record is never mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct Potential {
    pub model: Model,
    pub origin: Origin,
}

impl Potential {
    /// Wrap a model, checking the constraints every model kind shares.
    pub fn new(model: Model, origin: Origin) -> Result<Self, InputError> {
        let pot = Self { model, origin };
        pot.validate()?;
        Ok(pot)
    }

    /// Check the record for values that would make the curve undefined.
    pub fn validate(&self) -> Result<(), InputError> {
        InputError::check_positive("re", self.re())?;
        InputError::check_positive("rref", self.rref())?;
        if self.beta().is_empty() { return Err(InputError::EmptyBeta); }
        if let Model::Mlr(m) = &self.model {
            let ulr_re = m.long_range.value(m.re);
            if ulr_re.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
                return Err(InputError::LongRangeAtRe(ulr_re));
            }
        }
        if let Model::Delr(m) = &self.model {
            // the amplitudes divide by β(y(re))
            let beta_re = beta_poly(&m.beta, y(m.re, m.q, m.rref));
            if beta_re == 0.0 || !beta_re.is_finite() {
                return Err(InputError::BetaAtRe(beta_re));
            }
        }
        Ok(())
    }

    /// Section name of the model kind in parameter files.
    pub fn kind(&self) -> &'static str {
        match &self.model {
            Model::Emo(_) => "EMO",
            Model::Mlr(_) => "MLR",
            Model::Delr(_) => "DELR",
        }
    }

    pub fn de(&self) -> f64 {
        match &self.model {
            Model::Emo(m) => m.de,
            Model::Mlr(m) => m.de,
            Model::Delr(m) => m.de,
        }
    }

    pub fn re(&self) -> f64 {
        match &self.model {
            Model::Emo(m) => m.re,
            Model::Mlr(m) => m.re,
            Model::Delr(m) => m.re,
        }
    }

    pub fn rref(&self) -> f64 {
        match &self.model {
            Model::Emo(m) => m.rref,
            Model::Mlr(m) => m.rref,
            Model::Delr(m) => m.rref,
        }
    }

    pub fn q(&self) -> i32 {
        match &self.model {
            Model::Emo(m) => m.q,
            Model::Mlr(m) => m.q,
            Model::Delr(m) => m.q,
        }
    }

    pub fn beta(&self) -> &[f64] {
        match &self.model {
            Model::Emo(m) => &m.beta,
            Model::Mlr(m) => &m.beta,
            Model::Delr(m) => &m.beta,
        }
    }

    /// Long-range tail, if the model has one.
    pub fn long_range(&self) -> Option<&LongRange> {
        match &self.model {
            Model::Emo(_) => None,
            Model::Mlr(m) => Some(&m.long_range),
            Model::Delr(m) => Some(&m.long_range),
        }
    }

    /// Additive energy shift applied to the bare model.
    pub fn shift(&self) -> f64 { self.origin.shift(self.de()) }

    /// Asymptotic (dissociation) energy of the shifted curve.
    pub fn asymptote(&self) -> f64 { self.de() + self.shift() }

    /// Evaluate the curve at every radius in `r`.
    pub fn evaluate<S>(&self, r: &Arr1<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        let mut v = match &self.model {
            Model::Emo(m) => m.evaluate(r),
            Model::Mlr(m) => m.evaluate(r),
            Model::Delr(m) => m.evaluate(r),
        };
        let s = self.shift();
        if s != 0.0 { v += s; }
        v
    }

    /// Evaluate the curve at a single radius.
    pub fn value(&self, r: f64) -> f64 { self.evaluate(&nd::array![r])[0] }

    /// Adjustable parameters in the order `[de, re, β₀, β₁, …]`.
    pub fn fit_vector(&self) -> Vec<f64> {
        let mut x = vec![self.de(), self.re()];
        x.extend_from_slice(self.beta());
        x
    }

    /// Return a copy of `self` with `de`, `re`, and `beta` taken from a fit
    /// vector laid out as in [`Self::fit_vector`]; all other fields are copied
    /// unchanged.
    pub fn with_fit_vector(&self, x: &[f64]) -> Result<Self, FitError> {
        let expected = 2 + self.beta().len();
        if x.len() != expected {
            return Err(FitError::Vector { expected, got: x.len() });
        }
        let mut new = self.clone();
        let (de, re, beta) = match &mut new.model {
            Model::Emo(m) => (&mut m.de, &mut m.re, &mut m.beta),
            Model::Mlr(m) => (&mut m.de, &mut m.re, &mut m.beta),
            Model::Delr(m) => (&mut m.de, &mut m.re, &mut m.beta),
        };
        *de = x[0];
        *re = x[1];
        beta.copy_from_slice(&x[2..]);
        Ok(new)
    }
}

/// Writes the record in the section/key-value format read by
/// [`crate::input`].
impl fmt::Display for Potential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.kind())?;
        writeln!(f, "de    {:.3}", self.de())?;
        writeln!(f, "re    {:.6}", self.re())?;
        writeln!(f, "rref  {:.6}", self.rref())?;
        writeln!(f, "q     {}", self.q())?;
        if let Model::Mlr(m) = &self.model { writeln!(f, "p     {}", m.p)?; }
        write!(f, "beta  ")?;
        for (k, b) in self.beta().iter().enumerate() {
            if k > 0 { write!(f, "      ")?; }
            writeln!(f, "{:.5e}", b)?;
        }
        if let Some(lr) = self.long_range() {
            write!(f, "cnpow")?;
            for (n, _) in lr.terms.iter() { write!(f, " {}", n)?; }
            writeln!(f)?;
            write!(f, "cnval")?;
            for (_, cn) in lr.terms.iter() { write!(f, " {:.6e}", cn)?; }
            writeln!(f)?;
            writeln!(f, "dampf {}", lr.damping.as_str())?;
            writeln!(f, "rho   {}", lr.rho)?;
            writeln!(f, "s     {}", lr.s)?;
        }
        match self.origin {
            Origin::Minimum => { },
            Origin::Te(te) => writeln!(f, "te    {:.3}", te)?,
            Origin::Td(td) => writeln!(f, "td    {:.3}", td)?,
        }
        Ok(())
    }
}
