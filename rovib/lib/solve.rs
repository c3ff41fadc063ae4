//! Bound rovibrational levels of a radial potential.
//!
//! For each rotational quantum number *J* the radial equation
//! ```text
//!   d²f     J (J + 1)      V(r)       E
//! - ---  +  --------- f  + ---- f  =  - f
//!   dr²        r²           S         S
//! ```
//! is discretized on a uniform grid with the three-point second difference,
//! giving a symmetric tridiagonal matrix whose eigenvalues below the
//! dissociation limit are the bound levels. Each eigenvalue is then refined
//! with the leading-order correction of the three-point scheme (see
//! [`docs`][crate::docs#finite-difference-correction]).

use std::collections::BTreeMap;
use log::{ debug, warn };
use ndarray as nd;
use crate::{
    curve::PotentialCurve,
    error::{ Error, InputError, RangeError },
    input::{ ExperimentalLevelSet, RunParameters },
    potential::Potential,
    tridiag::{ Selection, SturmBisection, TridiagonalEigensolver },
    units::Units,
    utils::{ wf_expect, wf_shifted_sq },
    MIN_NGRID,
};

pub type SolveResult<T> = Result<T, Error>;

/// Anything that can be sampled onto a radial grid as a potential.
pub trait PotentialSampler {
    /// Evaluate the potential (cm⁻¹) at every radius of `grid`.
    fn sample(&self, grid: &nd::Array1<f64>) -> Result<nd::Array1<f64>, RangeError>;

    /// Upper bound (cm⁻¹) on the energy of a bound level, given the samples
    /// returned by [`Self::sample`].
    fn max_energy(&self, sampled: &nd::Array1<f64>) -> f64;
}

/// Point-wise curves are spline-interpolated; levels are bounded by the value
/// at the outer edge of the grid.
impl PotentialSampler for PotentialCurve {
    fn sample(&self, grid: &nd::Array1<f64>) -> Result<nd::Array1<f64>, RangeError> {
        self.interpolate(grid)
    }

    fn max_energy(&self, sampled: &nd::Array1<f64>) -> f64 {
        sampled.last().copied().unwrap_or(f64::NEG_INFINITY)
    }
}

/// Analytic curves are evaluated directly; levels are bounded by the
/// dissociation asymptote.
impl PotentialSampler for Potential {
    fn sample(&self, grid: &nd::Array1<f64>) -> Result<nd::Array1<f64>, RangeError> {
        Ok(self.evaluate(grid))
    }

    fn max_energy(&self, _sampled: &nd::Array1<f64>) -> f64 { self.asymptote() }
}

/// A uniform radial grid, including both end points.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGrid {
    r: nd::Array1<f64>,
    step: f64,
}

impl RadialGrid {
    /// Create a grid of `n` points from `rmin` to `rmax` (Å).
    pub fn new(rmin: f64, rmax: f64, n: usize) -> SolveResult<Self> {
        InputError::check_positive("rmin", rmin)?;
        if rmax.partial_cmp(&rmin) != Some(std::cmp::Ordering::Greater) {
            return Err(InputError::RadialBounds { rmin, rmax }.into());
        }
        RangeError::check_grid(n, MIN_NGRID)?;
        let r: nd::Array1<f64> = nd::Array1::linspace(rmin, rmax, n);
        let step = (rmax - rmin) / (n - 1) as f64;
        Ok(Self { r, step })
    }

    /// Radii (Å).
    pub fn r(&self) -> &nd::Array1<f64> { &self.r }

    /// Grid spacing (Å).
    pub fn step(&self) -> f64 { self.step }

    /// Number of points.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize { self.r.len() }
}

/// A single bound level.
#[derive(Clone, Debug)]
pub struct Level {
    /// Energy (cm⁻¹), including the finite-difference correction.
    pub energy: f64,
    /// Rotational constant *B*ᵥ (cm⁻¹).
    pub bv: f64,
    /// Wavefunction over the radial grid, normalized so that `Σ wf² = 1`.
    pub wf: nd::Array1<f64>,
}

/// Which levels to compute.
#[derive(Copy, Clone, Debug)]
pub enum LevelSelection<'a> {
    /// All bound levels for `J = 0..=jmax`.
    Blind { jmax: usize },
    /// For every J present in the set, the levels with vibrational indices
    /// from the lowest to the highest v listed for that J.
    Experimental(&'a ExperimentalLevelSet),
}

/// Solves for bound levels on a fixed radial grid.
#[derive(Clone, Debug)]
pub struct RadialGridSolver<E = SturmBisection> {
    units: Units,
    grid: RadialGrid,
    eigensolver: E,
}

impl RadialGridSolver<SturmBisection> {
    /// Create a new solver for the masses and grid of a run.
    pub fn new(run: &RunParameters) -> SolveResult<Self> {
        Self::with_eigensolver(run, SturmBisection::default())
    }
}

impl<E> RadialGridSolver<E>
where E: TridiagonalEigensolver
{
    /// Like [`RadialGridSolver::new`], but with a particular eigensolver.
    pub fn with_eigensolver(run: &RunParameters, eigensolver: E)
        -> SolveResult<Self>
    {
        let units = Units::from_masses(run.mass1, run.mass2);
        let grid = RadialGrid::new(run.rmin, run.rmax, run.ngrid)?;
        Ok(Self { units, grid, eigensolver })
    }

    pub fn units(&self) -> &Units { &self.units }

    pub fn grid(&self) -> &RadialGrid { &self.grid }

    /// Compute levels for a potential.
    pub fn solve<P>(&self, potential: &P, selection: LevelSelection<'_>)
        -> SolveResult<LevelSet>
    where P: PotentialSampler + ?Sized
    {
        let u = potential.sample(&self.grid.r)?;
        let emax = potential.max_energy(&u);
        let emax_nat: f64 = self.units.to_nat_energy(emax);
        debug!(
            "solving on {} points, h = {:.3e} Å, Emax = {:.3} cm⁻¹",
            self.grid.len(), self.grid.step, emax,
        );
        let mut levels: BTreeMap<usize, BTreeMap<usize, Level>> = BTreeMap::new();
        match selection {
            LevelSelection::Blind { jmax } => {
                for j in 0..=jmax {
                    let (found, _)
                        = self.solve_j(j, &u, Selection::Window(0.0, emax_nat))?;
                    if found.is_empty() {
                        warn!("J = {}: no bound levels below {:.3} cm⁻¹", j, emax);
                    }
                    levels.insert(j, found);
                }
            },
            LevelSelection::Experimental(exp) => {
                for j in exp.js() {
                    let Some((vmin, vmax)) = exp.v_range(j) else { continue; };
                    let (found, top)
                        = self.solve_j(j, &u, Selection::Index(vmin, vmax))?;
                    if top > emax_nat {
                        let available
                            = self.solve_j(j, &u, Selection::Window(0.0, emax_nat))?
                            .0.len();
                        return Err(RangeError::BoundStates {
                            j,
                            index: vmax,
                            available,
                        }.into());
                    }
                    levels.insert(j, found);
                }
            },
        }
        Ok(LevelSet { units: self.units, grid: self.grid.clone(), levels })
    }

    // levels for a single J, along with the largest raw eigenvalue
    fn solve_j(&self, j: usize, u: &nd::Array1<f64>, selection: Selection)
        -> SolveResult<(BTreeMap<usize, Level>, f64)>
    {
        let h = self.grid.step;
        let s = self.units.scale;
        let r = &self.grid.r;
        let jj = (j * (j + 1)) as f64;
        let diag: Vec<f64>
            = u.iter().zip(r)
            .map(|(uk, rk)| uk / s + jj / rk.powi(2) + 2.0 / h.powi(2))
            .collect();
        let off: Vec<f64> = vec![-1.0 / h.powi(2); diag.len() - 1];
        let pairs = self.eigensolver.solve(&diag, &off, selection)?;
        // a window counts v from its lowest level; indices are absolute
        let v0 = match selection {
            Selection::Window(..) => 0,
            Selection::Index(..) => pairs.first,
        };
        let inv_r2 = r.mapv(|rk| rk.powi(-2));
        let mut levels: BTreeMap<usize, Level> = BTreeMap::new();
        for (k, (ev, wf))
            in pairs.values.iter().zip(pairs.vectors.columns()).enumerate()
        {
            let e_unc: f64 = self.units.from_nat_energy(*ev);
            let fd_cor = h.powi(2) / s / 12.0 * wf_shifted_sq(&wf, u, e_unc)?;
            let bv = s * wf_expect(&wf, &inv_r2)?;
            levels.insert(
                v0 + k,
                Level { energy: e_unc + fd_cor, bv, wf: wf.to_owned() },
            );
        }
        debug!("J = {}: {} levels", j, levels.len());
        let top = pairs.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok((levels, top))
    }
}

/// One row of a computed/experimental level comparison.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevelComparison {
    pub j: usize,
    pub v: usize,
    /// Experimental energy (cm⁻¹).
    pub eexp: f64,
    /// Computed energy (cm⁻¹).
    pub ecalc: f64,
}

impl LevelComparison {
    /// `eexp - ecalc`
    pub fn delta(&self) -> f64 { self.eexp - self.ecalc }
}

/// Levels computed for a single potential, keyed by J and then v.
///
/// For fixed J, levels are indexed by their position in the spectrum, so that
/// energies increase strictly with v.
#[derive(Clone, Debug)]
pub struct LevelSet {
    units: Units,
    grid: RadialGrid,
    levels: BTreeMap<usize, BTreeMap<usize, Level>>,
}

impl LevelSet {
    /// Radial grid the levels were computed on.
    pub fn grid(&self) -> &RadialGrid { &self.grid }

    pub fn units(&self) -> &Units { &self.units }

    /// All J values present, in increasing order.
    pub fn js(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.keys().copied()
    }

    /// All levels for a given J, keyed by v.
    pub fn levels(&self, j: usize) -> Option<&BTreeMap<usize, Level>> {
        self.levels.get(&j)
    }

    /// Look up a single level.
    pub fn level(&self, j: usize, v: usize) -> Result<&Level, RangeError> {
        self.levels.get(&j)
            .and_then(|lv| lv.get(&v))
            .ok_or(RangeError::MissingLevel { j, v })
    }

    pub fn energy(&self, j: usize, v: usize) -> Option<f64> {
        self.level(j, v).ok().map(|lev| lev.energy)
    }

    pub fn bv(&self, j: usize, v: usize) -> Option<f64> {
        self.level(j, v).ok().map(|lev| lev.bv)
    }

    pub fn wf(&self, j: usize, v: usize) -> Option<&nd::Array1<f64>> {
        self.level(j, v).ok().map(|lev| &lev.wf)
    }

    /// Iterate over `(J, v, level)` in (J, v) order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Level)> + '_ {
        self.levels.iter()
            .flat_map(|(j, lv)| lv.iter().map(move |(v, lev)| (*j, *v, lev)))
    }

    /// Total number of levels.
    pub fn len(&self) -> usize { self.levels.values().map(|lv| lv.len()).sum() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Pair every computed level with its experimental counterpart, where one
    /// exists.
    pub fn compare(&self, exp: &ExperimentalLevelSet) -> Vec<LevelComparison> {
        self.iter()
            .filter_map(|(j, v, lev)| {
                exp.get(j, v)
                    .map(|eexp| LevelComparison { j, v, eexp, ecalc: lev.energy })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use crate::{
        input::RunMode,
        potential::{ Emo, Model, Origin },
    };
    use super::*;

    // Morse potential: EMO with a constant β
    fn morse(de: f64, re: f64, beta: f64) -> Potential {
        Potential::new(
            Model::Emo(Emo { de, re, rref: re, q: 1, beta: vec![beta] }),
            Origin::Minimum,
        ).unwrap()
    }

    fn run(ngrid: usize, jmax: usize) -> RunParameters {
        RunParameters::new(1.0, 35.0, 0.6, 4.0, ngrid, RunMode::Energy { jmax })
            .unwrap()
    }

    // rotationless Morse levels: ωe (v + ½) - ωe xe (v + ½)²
    fn morse_exact(units: &Units, de: f64, beta: f64, v: usize) -> f64 {
        let we = 2.0 * beta * (de * units.scale).sqrt();
        let wexe = beta.powi(2) * units.scale;
        let x = v as f64 + 0.5;
        we * x - wexe * x * x
    }

    #[test]
    fn morse_levels() {
        let pot = morse(10000.0, 1.3, 2.0);
        let solver = RadialGridSolver::new(&run(8000, 0)).unwrap();
        let levels
            = solver.solve(&pot, LevelSelection::Blind { jmax: 0 }).unwrap();
        let lv = levels.levels(0).unwrap();
        assert!(lv.len() > 5);
        let u = pot.evaluate(solver.grid().r());
        let h = solver.grid().step();
        let s = solver.units().scale;
        for v in 0..4 {
            let exact = morse_exact(solver.units(), 10000.0, 2.0, v);
            let lev = &lv[&v];
            assert_abs_diff_eq!(lev.energy, exact, epsilon = 1e-4);
            // the bare three-point eigenvalue misses by more than that
            let fd_cor
                = h.powi(2) / s / 12.0 * wf_shifted_sq(&lev.wf, &u, lev.energy).unwrap();
            assert!(fd_cor > 1e-4);
            assert!((lev.energy - fd_cor - exact).abs() > 1e-4);
        }
    }

    #[test]
    fn blind_levels_count_from_zero_below_shifted_origin() {
        let base = morse(10000.0, 1.3, 2.0);
        // minimum at -5000 cm⁻¹, asymptote at 5000 cm⁻¹
        let td = Potential { origin: Origin::Td(5000.0), ..base.clone() };
        let solver = RadialGridSolver::new(&run(3000, 0)).unwrap();
        let shifted
            = solver.solve(&td, LevelSelection::Blind { jmax: 0 }).unwrap();
        let lv = shifted.levels(0).unwrap();
        assert!(!lv.is_empty());
        assert!(lv.keys().copied().eq(0..lv.len()));
        assert!(lv[&0].energy > 0.0);

        let full
            = solver.solve(&base, LevelSelection::Blind { jmax: 0 }).unwrap();
        let below
            = full.levels(0).unwrap().values()
            .filter(|lev| lev.energy < 5000.0)
            .count();
        assert!(below > 0);
        assert_abs_diff_eq!(
            lv[&0].energy, full.energy(0, below).unwrap() - 5000.0, epsilon = 1e-5);
    }

    #[test]
    fn energies_increase_with_v() {
        let pot = morse(8000.0, 1.3, 2.2);
        let solver = RadialGridSolver::new(&run(3000, 2)).unwrap();
        let levels
            = solver.solve(&pot, LevelSelection::Blind { jmax: 2 }).unwrap();
        for j in 0..=2 {
            let lv = levels.levels(j).unwrap();
            assert!(lv.keys().copied().eq(0..lv.len()));
            assert!(
                lv.values().zip(lv.values().skip(1))
                    .all(|(a, b)| a.energy < b.energy)
            );
        }
        // rotational energy raises each level
        assert!(levels.energy(1, 0).unwrap() > levels.energy(0, 0).unwrap());
        // B ≈ S / re²
        let b0 = solver.units().scale / 1.3_f64.powi(2);
        assert_abs_diff_eq!(levels.bv(0, 0).unwrap(), b0, epsilon = 0.05 * b0);
        let e10 = levels.energy(1, 0).unwrap() - levels.energy(0, 0).unwrap();
        assert_abs_diff_eq!(e10, 2.0 * levels.bv(0, 0).unwrap(), epsilon = 2e-2);
    }

    #[test]
    fn wavefunctions_are_unit_vectors() {
        let pot = morse(8000.0, 1.3, 2.2);
        let solver = RadialGridSolver::new(&run(2000, 0)).unwrap();
        let levels
            = solver.solve(&pot, LevelSelection::Blind { jmax: 0 }).unwrap();
        for (_, _, lev) in levels.iter() {
            assert_abs_diff_eq!(lev.wf.dot(&lev.wf), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn experimental_selection() {
        let pot = morse(8000.0, 1.3, 2.2);
        let solver = RadialGridSolver::new(&run(2000, 0)).unwrap();
        let exp = ExperimentalLevelSet::new(
            [(0, 1, 0.0), (0, 3, 0.0), (2, 0, 0.0)]).unwrap();
        let levels
            = solver.solve(&pot, LevelSelection::Experimental(&exp)).unwrap();
        assert_eq!(levels.js().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(
            levels.levels(0).unwrap().keys().copied().collect::<Vec<_>>(),
            vec![1, 2, 3],
        );
        let blind
            = solver.solve(&pot, LevelSelection::Blind { jmax: 0 }).unwrap();
        assert_abs_diff_eq!(
            levels.energy(0, 2).unwrap(), blind.energy(0, 2).unwrap(),
            epsilon = 1e-6,
        );
        assert_eq!(levels.compare(&exp).len(), 3);
    }

    #[test]
    fn too_many_requested_levels() {
        let pot = morse(2000.0, 1.3, 2.2);
        let solver = RadialGridSolver::new(&run(2000, 0)).unwrap();
        let exp = ExperimentalLevelSet::new([(0, 40, 0.0)]).unwrap();
        assert!(matches!(
            solver.solve(&pot, LevelSelection::Experimental(&exp)),
            Err(Error::Range(RangeError::BoundStates { j: 0, index: 40, .. }))
        ));
    }

    #[test]
    fn grid_checks() {
        assert!(matches!(
            RadialGrid::new(0.5, 4.0, 10),
            Err(Error::Range(RangeError::GridTooCoarse { points: 10, .. }))
        ));
        assert!(matches!(
            RadialGrid::new(4.0, 0.5, 1000),
            Err(Error::Input(InputError::RadialBounds { .. }))
        ));
        let grid = RadialGrid::new(1.0, 2.0, 101).unwrap();
        assert_abs_diff_eq!(grid.step(), 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(grid.r()[100], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn curve_outside_grid_fails() {
        let r: nd::Array1<f64> = nd::Array1::linspace(1.0, 3.0, 50);
        let curve
            = PotentialCurve::load(
                &r, &r.mapv(|x| (x - 2.0).powi(2)), None::<&nd::Array1<f64>>)
            .unwrap();
        let solver = RadialGridSolver::new(&run(500, 0)).unwrap();
        assert!(matches!(
            solver.solve(&curve, LevelSelection::Blind { jmax: 0 }),
            Err(Error::Range(RangeError::OutOfDomain { .. }))
        ));
    }
}
