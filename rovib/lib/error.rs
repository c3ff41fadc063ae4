//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! Failures fall into three kinds, each fatal to the operation that raised
//! it:
//! - [`InputError`]: a malformed or incomplete parameter record, curve, or
//!   parameter file;
//! - [`RangeError`]: a request outside the valid domain of some sampled
//!   quantity (interpolation radius, eigenvalue index, radial grid);
//! - [`FitError`]: the least-squares driver could not converge.
//!
//! [anyhow]: https://crates.io/crates/anyhow

use ndarray as nd;
use thiserror::Error;

/// Returned when an operation requiring equal-length arrays encounters arrays
/// with unequal length.
#[derive(Debug, Error)]
#[error("encountered arrays with incompatible lengths; got {0} and {1}")]
pub struct LengthError(pub usize, pub usize);

impl LengthError {
    pub(crate) fn check<S, A, T, B>(
        a: &nd::ArrayBase<S, nd::Ix1>,
        b: &nd::ArrayBase<T, nd::Ix1>,
    ) -> Result<(), Self>
    where
        S: nd::Data<Elem = A>,
        T: nd::Data<Elem = B>,
    {
        let na = a.len();
        let nb = b.len();
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }
}

/// Returned when a parameter record, point-wise curve, or parameter file is
/// malformed or incomplete.
#[derive(Debug, Error)]
pub enum InputError {
    /// [`LengthError`]
    #[error("array length error: {0}")]
    Length(#[from] LengthError),

    /// Radii of a point-wise curve must be strictly increasing.
    #[error("radii must be strictly increasing; r[{index}] = {value} does not exceed the previous point")]
    NotIncreasing { index: usize, value: f64 },

    /// A point-wise curve needs enough points to build a cubic spline.
    #[error("point-wise curve needs at least {min} points; got {got}")]
    TooFewPoints { min: usize, got: usize },

    /// A data row in a point-wise curve file has an unsupported column count.
    #[error("line {line}: found {found} columns, only 2 or 3 supported")]
    Columns { line: usize, found: usize },

    /// Data rows in a point-wise curve file disagree on their column count.
    #[error("line {line}: found {found} columns, expected {expected}")]
    MixedColumns { line: usize, found: usize, expected: usize },

    /// A numeric field could not be parsed.
    #[error("line {line}: could not parse '{token}' as a number")]
    Number { line: usize, token: String },

    /// A parameter value could not be parsed.
    #[error("[{section}] {key}: could not parse '{value}'")]
    Value { section: String, key: String, value: String },

    /// A line in a parameter file is neither a section header nor a key/value
    /// pair inside a section.
    #[error("line {line}: expected a section header or 'key value' pair; got '{text}'")]
    Syntax { line: usize, text: String },

    /// A parameter file contains the wrong number of sections.
    #[error("expected exactly one section; found {0}")]
    SectionCount(usize),

    /// A section header does not name a known potential model.
    #[error("unknown potential model '{0}'")]
    UnknownModel(String),

    /// A section header does not name a known run purpose.
    #[error("unknown run type '{0}'")]
    UnknownPurpose(String),

    /// A run parameter section is not the one requested by the caller.
    #[error("run type '{found}' is not consistent with the actual run type '{expected}'")]
    WrongPurpose { expected: String, found: String },

    /// An unrecognized damping function selector.
    #[error("unknown damping function '{0}'; expected one of 'tt', 'ds', 'none'")]
    UnknownDamping(String),

    /// Damping order outside the tabulated range.
    #[error("damping order s must lie in -2..=2; got {0}")]
    DampingOrder(i32),

    /// Both `Te` and `Td` were given, leaving the energy origin ambiguous.
    #[error("both Te and Td given; energy origin is ambiguous")]
    AmbiguousOrigin,

    /// A required key is absent from a section.
    #[error("[{section}] missing required parameter '{key}'")]
    MissingKey { section: String, key: String },

    /// A key is not part of the required set for a section.
    #[error("[{section}] unexpected parameter '{key}'")]
    UnexpectedKey { section: String, key: String },

    /// A key appears twice in one section.
    #[error("[{section}] parameter '{key}' given more than once")]
    DuplicateKey { section: String, key: String },

    /// Long-range powers and coefficients must pair up one-to-one.
    #[error("got {powers} long-range powers but {coefficients} coefficients")]
    LongRangeTerms { powers: usize, coefficients: usize },

    /// A quantity that must be strictly positive is not.
    #[error("{name} must be positive; got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// The radial bounds are not ordered.
    #[error("rmin must be smaller than rmax; got rmin = {rmin}, rmax = {rmax}")]
    RadialBounds { rmin: f64, rmax: f64 },

    /// A `beta` coefficient list must have at least one entry.
    #[error("beta coefficient list is empty")]
    EmptyBeta,

    /// The long-range sum at the equilibrium radius must be positive for the
    /// MLR asymptote to be defined.
    #[error("long-range sum at re must be positive for MLR; got {0}")]
    LongRangeAtRe(f64),

    /// The DELR exponent `β(y(re))` vanishes, leaving the amplitudes undefined.
    #[error("beta series at re must be nonzero for DELR; got {0}")]
    BetaAtRe(f64),

    /// An experimental level set without any levels.
    #[error("no energy levels found")]
    EmptyLevels,
}

/// Returned when a request falls outside the valid domain of some sampled
/// quantity.
///
/// None of these are ever resolved by clamping or truncation.
#[derive(Debug, Error)]
pub enum RangeError {
    /// Interpolation requested outside the sampled domain.
    #[error("grid for spline out of range - [{lo}, {hi}] not in [{domain_lo}, {domain_hi}]")]
    OutOfDomain { lo: f64, hi: f64, domain_lo: f64, domain_hi: f64 },

    /// The radial grid has too few points to resolve the potential.
    #[error("radial grid of {points} points is too coarse; need at least {min}")]
    GridTooCoarse { points: usize, min: usize },

    /// An eigenvalue index beyond the size of the matrix.
    #[error("eigenvalue index {index} requested from a matrix of size {size}")]
    MatrixIndex { index: usize, size: usize },

    /// An eigenvalue index beyond the bound states available for some J.
    #[error("J = {j}: requested level v = {index}, but only {available} bound levels exist")]
    BoundStates { j: usize, index: usize, available: usize },

    /// Two level sets computed on different radial grids.
    #[error("level sets were computed on different radial grids")]
    GridMismatch,

    /// A (J, v) pair absent from a level set.
    #[error("level (J = {j}, v = {v}) is not present in the level set")]
    MissingLevel { j: usize, v: usize },
}

/// Returned from a [`TridiagonalEigensolver`][crate::tridiag::TridiagonalEigensolver].
#[derive(Debug, Error)]
pub enum SolverError {
    /// [`LengthError`]
    #[error("tridiagonal shape error: {0}")]
    Length(#[from] LengthError),

    /// [`RangeError`]
    #[error("{0}")]
    Range(#[from] RangeError),
}

/// Returned from the least-squares fit driver.
#[derive(Debug, Error)]
pub enum FitError {
    /// The optimizer terminated without satisfying a convergence criterion.
    #[error("fit FAILED: {message}")]
    Failure { message: String },

    /// Neither a point-wise curve nor experimental levels were supplied.
    #[error("fit target must contain a point-wise curve, experimental levels, or both")]
    NoTarget,

    /// A fit vector that does not match the parameter record's shape.
    #[error("fit vector of length {got} does not match the expected length {expected}")]
    Vector { expected: usize, got: usize },
}

/// Umbrella error for operations spanning several modules.
#[derive(Debug, Error)]
pub enum Error {
    /// [`InputError`]
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// [`RangeError`]
    #[error("range error: {0}")]
    Range(#[from] RangeError),

    /// [`FitError`]
    #[error("{0}")]
    Fit(#[from] FitError),

    /// [`std::io::Error`]
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LengthError> for Error {
    fn from(err: LengthError) -> Self { Self::Input(err.into()) }
}

impl From<SolverError> for Error {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Length(e) => Self::Input(e.into()),
            SolverError::Range(e) => Self::Range(e),
        }
    }
}

impl InputError {
    pub(crate) fn check_positive(name: &'static str, value: f64)
        -> Result<(), Self>
    {
        (value > 0.0).then_some(()).ok_or(Self::NonPositive { name, value })
    }
}

impl RangeError {
    pub(crate) fn check_grid(points: usize, min: usize) -> Result<(), Self> {
        (points >= min).then_some(())
            .ok_or(Self::GridTooCoarse { points, min })
    }
}
