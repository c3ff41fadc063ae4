//! Least-squares fits of analytic potentials.
//!
//! The adjusted parameters are `[De, re, β₀, β₁, …]`; every other field of the
//! initial record is carried through unchanged. Residuals are
//! - `(Ecalc - Eexp) / 0.1` for each experimental level, when levels are part
//!   of the target;
//! - `(U - Umodel) / σ` for each sample of a point-wise curve, when a curve is
//!   part of the target.

use log::{ debug, info };
use ndarray as nd;
use crate::{
    curve::PotentialCurve,
    error::{ Error, FitError },
    input::ExperimentalLevelSet,
    lsq::{ LevenbergMarquardt, Minimizer },
    potential::Potential,
    solve::{ LevelSelection, RadialGridSolver },
};

/// Uncertainty (cm⁻¹) assigned to every experimental level.
pub const LEVEL_WEIGHT: f64 = 0.1;

/// What a fit should reproduce.
#[derive(Copy, Clone, Debug, Default)]
pub struct FitTarget<'a> {
    /// Point-wise curve.
    pub curve: Option<&'a PotentialCurve>,
    /// Experimental levels with the solver used to compute their model
    /// counterparts.
    pub levels: Option<(&'a ExperimentalLevelSet, &'a RadialGridSolver)>,
}

impl<'a> FitTarget<'a> {
    /// Target a point-wise curve only.
    pub fn curve(curve: &'a PotentialCurve) -> Self {
        Self { curve: Some(curve), levels: None }
    }

    /// Target experimental levels only.
    pub fn levels(levels: &'a ExperimentalLevelSet, solver: &'a RadialGridSolver)
        -> Self
    {
        Self { curve: None, levels: Some((levels, solver)) }
    }

    /// Add a point-wise curve to the target.
    pub fn with_curve(mut self, curve: &'a PotentialCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Number of residuals produced for this target.
    pub fn len(&self) -> usize {
        self.curve.map(|c| c.len()).unwrap_or(0)
            + self.levels.map(|(l, _)| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Result of a successful fit.
#[derive(Clone, Debug)]
pub struct FitResult {
    /// Fitted parameter record.
    pub parameters: Potential,
    /// Termination message of the minimizer.
    pub message: String,
    /// Always `true`; failed fits are returned as [`FitError::Failure`].
    pub success: bool,
    /// Residuals at the optimum.
    pub residuals: nd::Array1<f64>,
    /// Number of residual evaluations.
    pub nfev: usize,
}

/// Drives a [`Minimizer`] over trial parameter records.
#[derive(Copy, Clone, Debug, Default)]
pub struct FitEngine<M = LevenbergMarquardt> {
    minimizer: M,
}

impl FitEngine<LevenbergMarquardt> {
    /// Create a new engine with a default Levenberg–Marquardt minimizer.
    pub fn new() -> Self { Self::default() }
}

impl<M> FitEngine<M>
where M: Minimizer
{
    /// Create a new engine with a particular minimizer.
    pub fn with_minimizer(minimizer: M) -> Self { Self { minimizer } }

    /// Compute the residual vector of a parameter record against a target.
    pub fn residuals(&self, trial: &Potential, target: &FitTarget<'_>)
        -> Result<Vec<f64>, Error>
    {
        let mut res: Vec<f64> = Vec::with_capacity(target.len());
        if let Some((exp, solver)) = target.levels {
            let levels = solver.solve(trial, LevelSelection::Experimental(exp))?;
            for (j, v, eexp) in exp.iter() {
                let ecalc = levels.level(j, v)?.energy;
                res.push((ecalc - eexp) / LEVEL_WEIGHT);
            }
        }
        if let Some(curve) = target.curve {
            let model = trial.evaluate(curve.r());
            res.extend(
                curve.values().iter().zip(&model).zip(curve.uncertainties())
                    .map(|((u, um), s)| (u - um) / s)
            );
        }
        Ok(res)
    }

    /// Fit `initial` to `target`.
    ///
    /// `initial` is never modified; on success a new record holding the fitted
    /// `De`, `re`, and `β` is returned.
    pub fn fit(&self, initial: &Potential, target: &FitTarget<'_>)
        -> Result<FitResult, Error>
    {
        if target.curve.is_none() && target.levels.is_none() {
            return Err(FitError::NoTarget.into());
        }
        let x0 = initial.fit_vector();
        debug!("fit: {} parameters, {} residuals", x0.len(), target.len());
        let mut neval: usize = 0;
        let min = self.minimizer.minimize(
            |x: &[f64]| -> Result<Vec<f64>, Error> {
                neval += 1;
                let trial = initial.with_fit_vector(x)?;
                self.residuals(&trial, target)
            },
            &x0,
        )?;
        debug!("fit: {} residual evaluations including Jacobians", neval);
        if !min.success {
            info!("fit failed: {}", min.message);
            return Err(FitError::Failure { message: min.message }.into());
        }
        info!("fit done: {}", min.message);
        Ok(FitResult {
            parameters: initial.with_fit_vector(&min.x)?,
            message: min.message,
            success: true,
            residuals: nd::Array1::from(min.fun),
            nfev: min.nfev,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use crate::{
        input::{ RunMode, RunParameters },
        potential::{ Emo, Model, Origin },
    };
    use super::*;

    fn emo(de: f64, re: f64, beta: Vec<f64>) -> Potential {
        Potential::new(
            Model::Emo(Emo { de, re, rref: 1.5, q: 3, beta }),
            Origin::Minimum,
        ).unwrap()
    }

    fn synthetic_curve(pot: &Potential) -> PotentialCurve {
        let r: nd::Array1<f64> = nd::Array1::linspace(0.9, 4.0, 40);
        let v = pot.evaluate(&r);
        PotentialCurve::load(&r, &v, None::<&nd::Array1<f64>>).unwrap()
    }

    #[test]
    fn recovers_curve_parameters() {
        let truth = emo(30000.0, 1.27, vec![1.8, 0.15, -0.05]);
        let curve = synthetic_curve(&truth);
        let guess = emo(28000.0, 1.3, vec![1.7, 0.1, 0.0]);
        let res = FitEngine::new().fit(&guess, &FitTarget::curve(&curve)).unwrap();
        assert!(res.success);
        let p = &res.parameters;
        assert_relative_eq!(p.de(), 30000.0, max_relative = 1e-5);
        assert_relative_eq!(p.re(), 1.27, max_relative = 1e-6);
        for (b, bt) in p.beta().iter().zip(truth.beta()) {
            assert_relative_eq!(*b, *bt, epsilon = 1e-4);
        }
        assert!(res.residuals.iter().all(|r| r.abs() < 1e-3));
        // initial record untouched
        assert_eq!(guess.de(), 28000.0);
    }

    #[test]
    fn residuals_for_exact_parameters_vanish() {
        let truth = emo(30000.0, 1.27, vec![1.8, 0.15, -0.05]);
        let curve = synthetic_curve(&truth);
        let res = FitEngine::new()
            .residuals(&truth, &FitTarget::curve(&curve)).unwrap();
        assert_eq!(res.len(), 40);
        assert!(res.iter().all(|r| *r == 0.0));
    }

    #[test]
    fn recovers_levels() {
        let truth = emo(20000.0, 1.3, vec![2.0, 0.1]);
        let run = RunParameters::new(1.0, 35.0, 0.7, 3.5, 1500, RunMode::Fit).unwrap();
        let solver = RadialGridSolver::new(&run).unwrap();
        let probe = ExperimentalLevelSet::new(
            [(0, 0, 0.0), (0, 1, 0.0), (0, 2, 0.0), (0, 3, 0.0), (3, 0, 0.0), (3, 1, 0.0)]
        ).unwrap();
        let computed
            = solver.solve(&truth, LevelSelection::Experimental(&probe)).unwrap();
        let exp = ExperimentalLevelSet::new(
            computed.iter().map(|(j, v, lev)| (j, v, lev.energy))).unwrap();
        let curve = synthetic_curve(&truth);
        let guess = emo(20500.0, 1.31, vec![1.95, 0.1]);
        let target = FitTarget::levels(&exp, &solver).with_curve(&curve);
        let res = FitEngine::new().fit(&guess, &target).unwrap();
        assert_eq!(res.residuals.len(), 6 + 40);
        assert_relative_eq!(res.parameters.re(), 1.3, max_relative = 1e-5);
        assert_relative_eq!(res.parameters.de(), 20000.0, max_relative = 1e-3);
    }

    #[test]
    fn empty_target() {
        let guess = emo(28000.0, 1.3, vec![1.7]);
        assert!(matches!(
            FitEngine::new().fit(&guess, &FitTarget::default()),
            Err(Error::Fit(FitError::NoTarget))
        ));
    }

    #[test]
    fn exhausted_evaluations_are_a_failure() {
        let truth = emo(30000.0, 1.27, vec![1.8, 0.15, -0.05]);
        let curve = synthetic_curve(&truth);
        let guess = emo(20000.0, 1.5, vec![1.0, 0.0, 0.0]);
        let engine = FitEngine::with_minimizer(
            LevenbergMarquardt { max_nfev: Some(2), ..Default::default() });
        assert!(matches!(
            engine.fit(&guess, &FitTarget::curve(&curve)),
            Err(Error::Fit(FitError::Failure { .. }))
        ));
    }
}
