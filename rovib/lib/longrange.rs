//! Damped long-range dispersion sums.
//!
//! ```text
//! U_lr(r) = Σ D_n(r) C_n / rⁿ
//! ```
//! where *D*ₙ is a damping function suppressing each inverse-power term at
//! short range. Two damping families are available, both parameterized by a
//! system-dependent range parameter *ρ* and an order *s* ∊ {−2, …, 2}:
//! Tang–Toennies and Douketis et al. (see Le Roy et al., Mol. Phys. 109, 435
//! (2011)). The Douketis family omits the *s* = 1/2 variant.

use std::str::FromStr;
use crate::error::InputError;

// universal damping constants, indexed by s + 2
const B_TT: [f64; 5] = [2.1, 2.44, 2.78, 3.13, 3.47];
const B_DS: [f64; 5] = [2.5, 3.3, 3.95, 4.53, 4.99];
const C_DS: [f64; 5] = [0.468, 0.423, 0.39, 0.36, 0.34];

/// Damping function selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Damping {
    /// Tang–Toennies: incomplete-gamma-type series truncated at order n + s.
    TangToennies,
    /// Douketis et al.: double-exponential form.
    Douketis,
    /// No damping (*D*ₙ = 1).
    Off,
}

impl Damping {
    /// Short selector used in parameter files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TangToennies => "tt",
            Self::Douketis => "ds",
            Self::Off => "none",
        }
    }
}

impl FromStr for Damping {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tt" => Ok(Self::TangToennies),
            "ds" => Ok(Self::Douketis),
            "none" => Ok(Self::Off),
            _ => Err(InputError::UnknownDamping(s.to_string())),
        }
    }
}

fn factorial(k: i32) -> f64 { (1..=k).map(f64::from).product() }

/// A damped sum of inverse-power terms.
#[derive(Clone, Debug, PartialEq)]
pub struct LongRange {
    /// `(n, Cn)` pairs.
    pub terms: Vec<(i32, f64)>,
    pub damping: Damping,
    /// Range parameter *ρ* (Å⁻¹).
    pub rho: f64,
    /// Damping order *s*.
    pub s: i32,
}

impl LongRange {
    /// Create a new long-range sum, checking that the damping order lies in
    /// the tabulated range.
    pub fn new(terms: Vec<(i32, f64)>, damping: Damping, rho: f64, s: i32)
        -> Result<Self, InputError>
    {
        if !(-2..=2).contains(&s) { return Err(InputError::DampingOrder(s)); }
        Ok(Self { terms, damping, rho, s })
    }

    fn idx(&self) -> usize { (self.s + 2).clamp(0, 4) as usize }

    /// Damping factor *D*ₙ(*r*).
    pub fn damp(&self, r: f64, n: i32) -> f64 {
        let k = self.idx();
        match self.damping {
            Damping::TangToennies => {
                let x = B_TT[k] * self.rho * r;
                let sm: f64
                    = (0..n + self.s)
                    .map(|m| x.powi(m) / factorial(m))
                    .sum();
                1.0 - (-x).exp() * sm
            },
            Damping::Douketis => {
                let nf = f64::from(n);
                let ex = (
                    -B_DS[k] * self.rho * r / nf
                    - C_DS[k] * (self.rho * r).powi(2) / nf.sqrt()
                ).exp();
                (1.0 - ex).powi(n + self.s)
            },
            Damping::Off => 1.0,
        }
    }

    /// First derivative of the damping factor, *dD*ₙ/*dr*.
    pub fn damp_deriv(&self, r: f64, n: i32) -> f64 {
        let k = self.idx();
        match self.damping {
            Damping::TangToennies => {
                let b = B_TT[k] * self.rho;
                let x = b * r;
                let ex = (-x).exp();
                let sm: f64
                    = (0..n + self.s)
                    .map(|m| x.powi(m) / factorial(m))
                    .sum();
                let dsm: f64
                    = (1..n + self.s)
                    .map(|m| f64::from(m) * b * x.powi(m - 1) / factorial(m))
                    .sum();
                b * ex * sm - dsm * ex
            },
            Damping::Douketis => {
                let nf = f64::from(n);
                let ex = (
                    -B_DS[k] * self.rho * r / nf
                    - C_DS[k] * (self.rho * r).powi(2) / nf.sqrt()
                ).exp();
                f64::from(n + self.s) * (1.0 - ex).powi(n + self.s - 1) * ex
                    * (
                        B_DS[k] * self.rho / nf
                        + 2.0 * C_DS[k] * self.rho.powi(2) * r / nf.sqrt()
                    )
            },
            Damping::Off => 0.0,
        }
    }

    /// *U*_lr(*r*).
    pub fn value(&self, r: f64) -> f64 {
        self.terms.iter()
            .map(|&(n, cn)| self.damp(r, n) * cn * r.powi(-n))
            .sum()
    }

    /// *dU*_lr/*dr*.
    pub fn deriv(&self, r: f64) -> f64 {
        self.terms.iter()
            .map(|&(n, cn)| {
                -self.damp(r, n) * f64::from(n) * cn * r.powi(-n - 1)
                + self.damp_deriv(r, n) * cn * r.powi(-n)
            })
            .sum()
    }
}
