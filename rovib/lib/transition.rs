//! Transition frequencies and dipole matrix elements between two vibrational
//! bands.
//!
//! For a lower band `v''` (`v1`) and an upper band `v'` (`v2`), every pair of
//! rotational levels `(J', J'')` gets
//! ```text
//! freq = E(J', v') - E(J'', v'')
//! me   = Σ ψ(J'', v'') ψ(J', v') d
//! ```
//! where *d* is a point-wise dipole curve interpolated onto the radial grid
//! shared by both level sets. Dipole-allowed pairs can then be viewed as P and
//! R branches with Hönl–London factors, Boltzmann populations, and Einstein A
//! coefficients.

use std::collections::BTreeMap;
use log::debug;
use ndarray as nd;
use crate::{
    curve::PotentialCurve,
    error::{ Error, RangeError },
    solve::LevelSet,
    units::{ kB_cm, A_coeff, T_ref },
    utils::wf_dot_weighted,
};

/// A single `(J', J'')` transition.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transition {
    /// Energy of the lower level `(J'', v'')` (cm⁻¹).
    pub energy1: f64,
    /// `E(J', v') - E(J'', v'')` (cm⁻¹).
    pub freq: f64,
    /// Dipole matrix element (units of the dipole curve).
    pub me: f64,
}

/// Transitions between two vibrational bands, keyed by `J'` and then `J''`.
#[derive(Clone, Debug)]
pub struct TransitionSet {
    v1: usize,
    v2: usize,
    data: BTreeMap<usize, BTreeMap<usize, Transition>>,
}

impl TransitionSet {
    /// Compute transitions from band `v1` of `lower` to band `v2` of `upper`
    /// for every combination of the J values present in each.
    ///
    /// Both level sets must be computed on the same radial grid, which must
    /// lie within the domain of `dipole`.
    pub fn compute(
        lower: &LevelSet,
        upper: &LevelSet,
        v1: usize,
        v2: usize,
        dipole: &PotentialCurve,
    ) -> Result<Self, Error>
    {
        if lower.grid() != upper.grid() {
            return Err(RangeError::GridMismatch.into());
        }
        let d: nd::Array1<f64> = dipole.interpolate(lower.grid().r())?;
        let mut data: BTreeMap<usize, BTreeMap<usize, Transition>>
            = BTreeMap::new();
        for j2 in upper.js() {
            let up = upper.level(j2, v2)?;
            let row = data.entry(j2).or_default();
            for j1 in lower.js() {
                let lo = lower.level(j1, v1)?;
                let me = wf_dot_weighted(&lo.wf, &up.wf, &d)?;
                row.insert(
                    j1,
                    Transition {
                        energy1: lo.energy,
                        freq: up.energy - lo.energy,
                        me,
                    },
                );
            }
        }
        debug!(
            "computed {} transitions for v'' = {} → v' = {}",
            data.values().map(|row| row.len()).sum::<usize>(), v1, v2,
        );
        Ok(Self { v1, v2, data })
    }

    /// Lower vibrational band `v''`.
    pub fn v1(&self) -> usize { self.v1 }

    /// Upper vibrational band `v'`.
    pub fn v2(&self) -> usize { self.v2 }

    pub fn get(&self, j2: usize, j1: usize) -> Option<&Transition> {
        self.data.get(&j2).and_then(|row| row.get(&j1))
    }

    /// Iterate over `(J', J'', transition)` in (J', J'') order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Transition)> + '_ {
        self.data.iter()
            .flat_map(|(j2, row)| row.iter().map(move |(j1, t)| (*j2, *j1, t)))
    }

    /// All `J'` present, in increasing order.
    pub fn j2s(&self) -> impl Iterator<Item = usize> + '_ {
        self.data.keys().copied()
    }

    /// Transitions into upper level `J'`, keyed by `J''`.
    pub fn row(&self, j2: usize) -> Option<&BTreeMap<usize, Transition>> {
        self.data.get(&j2)
    }

    /// P and R branch lines up to the largest `J'` present: the P branch for
    /// `J'' = Jmax..=1` followed by the R branch for `J'' = 0..Jmax`.
    pub fn branches(&self) -> Result<Vec<BranchLine>, RangeError> {
        let Some(jm) = self.data.keys().next_back().copied() else {
            return Ok(Vec::new());
        };
        let pairs
            = (1..=jm).rev().map(|j1| (j1 - 1, j1))
            .chain((0..jm).map(|j1| (j1 + 1, j1)));
        pairs
            .map(|(j2, j1)| {
                let t = self.get(j2, j1)
                    .ok_or(RangeError::MissingLevel { j: j2, v: self.v2 })?;
                Ok(BranchLine::new(j2, j1, t))
            })
            .collect()
    }
}

/// Rotational branch of a ΔJ = ±1 transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Branch {
    /// `J' = J'' - 1`
    P,
    /// `J' = J'' + 1`
    R,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P => "P",
            Self::R => "R",
        }
    }
}

/// A single line of a P or R branch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BranchLine {
    pub branch: Branch,
    /// Upper J'.
    pub j2: usize,
    /// Lower J''.
    pub j1: usize,
    pub freq: f64,
    pub me: f64,
    /// Absorption Hönl–London factor.
    pub sa: f64,
    /// Energy of the lower level.
    pub energy1: f64,
    /// Boltzmann population of the lower level at [`T_ref`].
    pub pop: f64,
    /// Relative absorption intensity, `pop me² Sa`.
    pub intensity: f64,
    /// Emission Hönl–London factor.
    pub se: f64,
    /// Einstein A coefficient (s⁻¹).
    pub a: f64,
}

impl BranchLine {
    // j2 = j1 ± 1 is guaranteed by the caller
    fn new(j2: usize, j1: usize, t: &Transition) -> Self {
        let (jp, jpp) = (j2 as f64, j1 as f64);
        let (branch, sa, se)
            = if j2 > j1 {
                (Branch::R, (jpp + 1.0) / (2.0 * jpp + 1.0), jp / (2.0 * jp + 1.0))
            } else {
                (Branch::P, jpp / (2.0 * jpp + 1.0), (jp + 1.0) / (2.0 * jp + 1.0))
            };
        let pop = (2.0 * jpp + 1.0) * (-t.energy1 / kB_cm / T_ref).exp();
        let me2 = t.me.powi(2);
        Self {
            branch,
            j2,
            j1,
            freq: t.freq,
            me: t.me,
            sa,
            energy1: t.energy1,
            pop,
            intensity: pop * me2 * sa,
            se,
            a: A_coeff * me2 * se * t.freq.powi(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use crate::{
        input::{ RunMode, RunParameters },
        potential::{ Emo, Model, Origin, Potential },
        solve::{ LevelSelection, RadialGridSolver },
    };
    use super::*;

    fn levels(jmax: usize, ngrid: usize) -> LevelSet {
        let pot = Potential::new(
            Model::Emo(Emo { de: 8000.0, re: 1.3, rref: 1.3, q: 1, beta: vec![2.2] }),
            Origin::Minimum,
        ).unwrap();
        let run
            = RunParameters::new(1.0, 35.0, 0.6, 4.0, ngrid, RunMode::Energy { jmax })
            .unwrap();
        RadialGridSolver::new(&run).unwrap()
            .solve(&pot, LevelSelection::Blind { jmax }).unwrap()
    }

    fn dipole(f: impl Fn(f64) -> f64) -> PotentialCurve {
        let r: nd::Array1<f64> = nd::Array1::linspace(0.5, 5.0, 60);
        let d = r.mapv(f);
        PotentialCurve::load(&r, &d, Some(&nd::Array1::ones(60))).unwrap()
    }

    #[test]
    fn zero_dipole_gives_zero_elements() {
        let lv = levels(2, 1500);
        let ts = TransitionSet::compute(&lv, &lv, 0, 1, &dipole(|_| 0.0)).unwrap();
        assert_eq!(ts.iter().count(), 9);
        assert!(ts.iter().all(|(_, _, t)| t.me == 0.0));
    }

    #[test]
    fn constant_dipole_gives_overlaps() {
        let lv = levels(0, 1500);
        let same = TransitionSet::compute(&lv, &lv, 0, 0, &dipole(|_| 2.0)).unwrap();
        assert_abs_diff_eq!(same.get(0, 0).unwrap().me, 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(same.get(0, 0).unwrap().freq, 0.0);
        let fund = TransitionSet::compute(&lv, &lv, 0, 1, &dipole(|_| 2.0)).unwrap();
        assert_abs_diff_eq!(fund.get(0, 0).unwrap().me, 0.0, epsilon = 1e-8);
        assert!(fund.get(0, 0).unwrap().freq > 0.0);
    }

    #[test]
    fn branch_layout() {
        let lv = levels(3, 1500);
        let ts
            = TransitionSet::compute(&lv, &lv, 0, 1, &dipole(|r| 0.1 * r)).unwrap();
        let lines = ts.branches().unwrap();
        let layout: Vec<(Branch, usize, usize)>
            = lines.iter().map(|l| (l.branch, l.j2, l.j1)).collect();
        assert_eq!(
            layout,
            vec![
                (Branch::P, 2, 3), (Branch::P, 1, 2), (Branch::P, 0, 1),
                (Branch::R, 1, 0), (Branch::R, 2, 1), (Branch::R, 3, 2),
            ],
        );
        let r0 = &lines[3];
        assert_abs_diff_eq!(r0.sa, 1.0);
        assert_abs_diff_eq!(r0.se, 1.0 / 3.0);
        assert_abs_diff_eq!(
            r0.pop, (-r0.energy1 / kB_cm / T_ref).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(
            r0.a, A_coeff * r0.me.powi(2) / 3.0 * r0.freq.powi(3), epsilon = 1e-12);
        // R lines sit above the band origin, P lines below
        assert!(lines[3].freq > lines[2].freq);
    }

    #[test]
    fn dipole_must_cover_grid() {
        let lv = levels(0, 500);
        let r: nd::Array1<f64> = nd::Array1::linspace(1.0, 2.0, 10);
        let short
            = PotentialCurve::load(&r, &r, None::<&nd::Array1<f64>>).unwrap();
        assert!(matches!(
            TransitionSet::compute(&lv, &lv, 0, 1, &short),
            Err(Error::Range(RangeError::OutOfDomain { .. }))
        ));
        assert!(matches!(
            TransitionSet::compute(&lv, &lv, 0, 40, &dipole(|_| 1.0)),
            Err(Error::Range(RangeError::MissingLevel { j: 0, v: 40 }))
        ));
    }
}
