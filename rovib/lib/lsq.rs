//! Nonlinear least squares.
//!
//! Minimizes `½ Σ fᵢ(x)²` for a residual vector *f* using a
//! Levenberg–Marquardt iteration with forward-difference Jacobians and
//! Marquardt's diagonal scaling. Termination follows the usual three tests:
//! - `ftol`: the relative reduction of the cost in an accepted step is below
//!   `ftol`;
//! - `xtol`: the scaled step is small relative to the scaled parameters;
//! - `gtol`: the largest cosine between *f* and a column of the Jacobian is
//!   below `gtol`.

use log::{ debug, trace, warn };
use nalgebra as na;

/// Default tolerance for all three termination tests.
pub const DEF_TOL: f64 = 1e-8;

/// Default number of residual evaluations allowed per fitted parameter.
pub const DEF_NFEV_PER_PARAM: usize = 100;

/// Outcome of a minimization.
#[derive(Clone, Debug)]
pub struct Minimum {
    /// Final parameters.
    pub x: Vec<f64>,
    /// Residuals at `x`.
    pub fun: Vec<f64>,
    /// `½ Σ fun²`
    pub cost: f64,
    /// Human-readable reason for termination.
    pub message: String,
    /// Whether a convergence test was satisfied.
    pub success: bool,
    /// Number of residual evaluations, excluding those used for Jacobians.
    pub nfev: usize,
}

/// Narrow interface to a nonlinear least-squares solver.
pub trait Minimizer {
    /// Minimize the sum of squares of `residuals`, starting from `x0`.
    ///
    /// Errors returned by `residuals` at the initial point or while building a
    /// Jacobian abort the minimization; an error at a trial point only rejects
    /// that step.
    fn minimize<F, E>(&self, residuals: F, x0: &[f64]) -> Result<Minimum, E>
    where F: FnMut(&[f64]) -> Result<Vec<f64>, E>;
}

/// Levenberg–Marquardt minimizer.
#[derive(Copy, Clone, Debug)]
pub struct LevenbergMarquardt {
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    /// Maximum number of residual evaluations; `None` allows
    /// [`DEF_NFEV_PER_PARAM`] per parameter.
    pub max_nfev: Option<usize>,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self { ftol: DEF_TOL, xtol: DEF_TOL, gtol: DEF_TOL, max_nfev: None }
    }
}

fn cost_of(f: &na::DVector<f64>) -> f64 { 0.5 * f.norm_squared() }

fn all_finite<'a, I>(x: I) -> bool
where I: IntoIterator<Item = &'a f64>
{
    x.into_iter().all(|xk| xk.is_finite())
}

// forward-difference Jacobian, m × n
fn jacobian<F, E>(residuals: &mut F, x: &na::DVector<f64>, f0: &na::DVector<f64>)
    -> Result<na::DMatrix<f64>, E>
where F: FnMut(&[f64]) -> Result<Vec<f64>, E>
{
    let eps = f64::EPSILON.sqrt();
    let mut jac: na::DMatrix<f64> = na::DMatrix::zeros(f0.len(), x.len());
    let mut xh = x.clone();
    for k in 0..x.len() {
        let h = eps * x[k].abs().max(1.0);
        xh[k] = x[k] + h;
        let fh = na::DVector::from_vec(residuals(xh.as_slice())?);
        let h = xh[k] - x[k];
        jac.set_column(k, &((fh - f0) / h));
        xh[k] = x[k];
    }
    Ok(jac)
}

/// Solve the damped normal equations (JᵀJ + μD²) h = -g, returning `None` if
/// the system is not positive-definite.
fn damped_step(
    jtj: &na::DMatrix<f64>,
    g: &na::DVector<f64>,
    scale: &na::DVector<f64>,
    mu: f64,
) -> Option<na::DVector<f64>>
{
    let mut a = jtj.clone();
    a.set_diagonal(&(jtj.diagonal() + scale.component_mul(scale) * mu));
    na::Cholesky::new(a)
        .map(|chol| chol.solve(&(-g)))
        .filter(|step| all_finite(step.iter()))
}

impl Minimizer for LevenbergMarquardt {
    fn minimize<F, E>(&self, mut residuals: F, x0: &[f64]) -> Result<Minimum, E>
    where F: FnMut(&[f64]) -> Result<Vec<f64>, E>
    {
        let n = x0.len();
        let max_nfev = self.max_nfev.unwrap_or(DEF_NFEV_PER_PARAM * n.max(1));
        let mut x = na::DVector::from_column_slice(x0);
        let mut f = na::DVector::from_vec(residuals(x.as_slice())?);
        let mut nfev: usize = 1;
        let mut cost = cost_of(&f);
        let finish = |x: na::DVector<f64>, f: na::DVector<f64>, cost, message: &str, success, nfev| {
            Minimum {
                x: x.as_slice().to_vec(),
                fun: f.as_slice().to_vec(),
                cost,
                message: message.into(),
                success,
                nfev,
            }
        };
        if !all_finite(f.iter()) {
            return Ok(finish(
                x, f, cost, "Residuals are not finite in the initial point.", false, nfev,
            ));
        }
        if n == 0 {
            return Ok(finish(
                x, f, cost, "`gtol` termination condition is satisfied.", true, nfev,
            ));
        }

        let mut jac = jacobian(&mut residuals, &x, &f)?;
        let mut scale: na::DVector<f64> = na::DVector::zeros(n);
        let mut mu: f64 = 1e-3;
        let mut nu: f64 = 2.0;
        loop {
            if !all_finite(jac.iter()) {
                warn!("lm: Jacobian is not finite after {} evaluations", nfev);
                return Ok(finish(
                    x, f, cost, "Jacobian is not finite at the current point.", false, nfev,
                ));
            }
            let jtj: na::DMatrix<f64> = jac.tr_mul(&jac);
            let g: na::DVector<f64> = jac.tr_mul(&f);
            // Marquardt scaling never shrinks
            scale.iter_mut().zip(jtj.diagonal().iter())
                .for_each(|(s, d)| {
                    *s = s.max(d.sqrt());
                    if *s == 0.0 { *s = 1.0; }
                });

            let fnorm = f.norm();
            let gnorm
                = if fnorm == 0.0 {
                    0.0
                } else {
                    jac.column_iter().zip(g.iter())
                        .map(|(col, gk)| {
                            let cn = col.norm();
                            if cn == 0.0 { 0.0 } else { gk.abs() / (cn * fnorm) }
                        })
                        .fold(0.0, f64::max)
                };
            if gnorm <= self.gtol {
                return Ok(finish(
                    x, f, cost, "`gtol` termination condition is satisfied.", true, nfev,
                ));
            }

            // inner loop: raise damping until a step reduces the cost
            loop {
                if !mu.is_finite() {
                    return Ok(finish(
                        x, f, cost, "Damping parameter diverged without an acceptable step.",
                        false, nfev,
                    ));
                }
                let Some(step) = damped_step(&jtj, &g, &scale, mu) else {
                    mu *= nu;
                    nu *= 2.0;
                    continue;
                };
                let dx_norm = step.component_mul(&scale).norm();
                let x_norm = x.component_mul(&scale).norm();
                let x_conv = dx_norm <= self.xtol * (self.xtol + x_norm);

                let x_new: na::DVector<f64> = &x + &step;
                let trial = residuals(x_new.as_slice());
                nfev += 1;
                let f_new
                    = match trial {
                        Ok(f_new) if all_finite(&f_new) => Some(na::DVector::from_vec(f_new)),
                        _ => None,
                    };
                let cost_new = f_new.as_ref().map(cost_of).unwrap_or(f64::INFINITY);
                // ½ hᵀ (μ D² h - g)
                let predicted: f64
                    = 0.5 * step.dot(&(step.component_mul(&scale).component_mul(&scale) * mu - &g));
                let actual = cost - cost_new;
                let rho = if predicted > 0.0 { actual / predicted } else { -1.0 };
                trace!(
                    "lm: nfev = {}, cost = {:.6e}, trial = {:.6e}, mu = {:.3e}",
                    nfev, cost, cost_new, mu,
                );

                match f_new {
                    Some(f_new) if rho > 0.0 => {
                        let f_conv = actual <= self.ftol * cost;
                        x = x_new;
                        f = f_new;
                        cost = cost_new;
                        mu *= (1.0_f64 / 3.0).max(1.0 - (2.0 * rho - 1.0).powi(3));
                        nu = 2.0;
                        debug!("lm: accepted step, cost = {:.6e}", cost);
                        let message
                            = match (f_conv, x_conv) {
                                (true, true) => Some(
                                    "Both `ftol` and `xtol` termination conditions are satisfied."),
                                (true, false) => Some(
                                    "`ftol` termination condition is satisfied."),
                                (false, true) => Some(
                                    "`xtol` termination condition is satisfied."),
                                (false, false) => None,
                            };
                        if let Some(message) = message {
                            return Ok(finish(x, f, cost, message, true, nfev));
                        }
                        if nfev >= max_nfev { break; }
                        jac = jacobian(&mut residuals, &x, &f)?;
                        break;
                    },
                    _ => {
                        if x_conv {
                            return Ok(finish(
                                x, f, cost, "`xtol` termination condition is satisfied.",
                                true, nfev,
                            ));
                        }
                        mu *= nu;
                        nu *= 2.0;
                        if nfev >= max_nfev { break; }
                    },
                }
            }
            if nfev >= max_nfev {
                return Ok(finish(
                    x, f, cost,
                    "The maximum number of function evaluations is exceeded.",
                    false, nfev,
                ));
            }
        }
    }
}
