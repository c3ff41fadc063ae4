//! Provides functions and higher-level constructs for computing rovibrational
//! levels of diatomic molecules from a radial potential, transition dipole
//! matrix elements between them, and least-squares fits of analytic potential
//! models to point-wise curves and measured levels.
//!
//! Provides implementations for the following:
//! - Potentials:
//!     - Cubic-spline interpolated point-wise curves
//!     - Extended Morse Oscillator (EMO)
//!     - Morse/Long-Range (MLR)
//!     - Double-Exponential/Long-Range (DELR), with Tang–Toennies or Douketis
//!       damping of the long-range tail
//! - Levels:
//!     - Three-point finite-difference radial Hamiltonian, diagonalized by
//!       Sturm bisection and inverse iteration, with a fourth-order energy
//!       correction
//! - Transitions:
//!     - Dipole matrix elements, frequencies, and P/R branch intensities
//! - Fits:
//!     - Levenberg–Marquardt least squares against point-wise curves and/or
//!       experimental levels
//!
//! See [`docs`] for theoretical background.
//!
//! # Example
//! ```
//! use rovib::{
//!     input::{ Purpose, RunParameters },
//!     potential::Potential,
//!     solve::{ LevelSelection, RadialGridSolver },
//! };
//!
//! let run = RunParameters::parse(
//!     "[ENERGY]\nmass1 1.0\nmass2 35.0\nrmin 0.6\nrmax 4.0\njmax 1\nngrid 2000\n",
//!     Purpose::Energy,
//! ).unwrap();
//! let morse = Potential::parse(
//!     "[EMO]\nde 10000.0\nre 1.3\nrref 1.3\nq 1\nbeta 2.0\n"
//! ).unwrap();
//! let levels = RadialGridSolver::new(&run).unwrap()
//!     .solve(&morse, LevelSelection::Blind { jmax: 1 }).unwrap();
//! assert!(levels.energy(1, 0).unwrap() > levels.energy(0, 0).unwrap());
//! ```

pub mod error;
pub mod units;
pub mod utils;
pub mod tridiag;
pub mod interp;
pub mod curve;
pub mod longrange;
pub mod potential;
pub mod input;
pub mod solve;
pub mod transition;
pub mod lsq;
pub mod fit;
pub mod report;

pub mod docs;

/// Default number of radial grid points.
pub const DEF_NGRID: usize = 50000;

/// Smallest radial grid accepted by the level solver.
pub const MIN_NGRID: usize = 100;

pub type Arr1<S> = ndarray::ArrayBase<S, ndarray::Ix1>;
pub type Arr2<S> = ndarray::ArrayBase<S, ndarray::Ix2>;
