//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Units](#units)
//! - [Finite-difference scheme](#finite-difference-scheme)
//! - [Finite-difference correction](#finite-difference-correction)
//! - [Rotational constants](#rotational-constants)
//! - [Transition moments](#transition-moments)
//! - [Fitting](#fitting)
//!
//! # Background
//! In the Born–Oppenheimer picture, the nuclear motion of a diatomic molecule
//! in a single electronic state is governed by a potential energy curve *V*(*r*)
//! depending only on the internuclear distance *r*. Separating out the angular
//! part of the nuclear wavefunction in terms of spherical harmonics with total
//! rotational quantum number *J* leaves the radial equation
//! ```text
//!    ħ² ∂²ψ              J (J + 1) ħ²
//! - --- --- + V(r) ψ(r) + ------------ ψ(r) = E ψ(r)
//!   2 μ ∂r²                  2 μ r²
//! ```
//! for the reduced radial wavefunction *ψ*(*r*) = *r* *R*(*r*), with *μ* =
//! *m*₁ *m*₂ / (*m*₁ + *m*₂) the reduced mass of the two nuclei. Bound solutions
//! are labeled by *J* and a vibrational quantum number *v* ∊ {0, 1, ...}
//! counting the nodes of *ψ*, and the collection of all *E*(*J*, *v*) is the
//! rovibrational term structure of the electronic state.
//!
//! The curve itself is supplied either point-wise (e.g. from an electronic
//! structure calculation), in which case it is interpolated with a
//! not-a-knot cubic spline, or through one of the analytic families in
//! [`potential`][crate::potential].
//!
//! # Units
//! All energies are given in cm⁻¹, lengths in Å, and masses in Da. Dividing
//! the radial equation through by
//! ```text
//!      ħ²      mₑ Eₕ a₀²
//! S = ---- =  -----------
//!     2 μ        2 μ
//! ```
//! (with *m*ₑ the electron mass in Da, *E*ₕ the Hartree energy in cm⁻¹, and *a*₀
//! the Bohr radius in Å) gives a form in which the only remaining scale is that
//! of the radial coordinate,
//! ```text
//!   ∂²ψ    (V(r)    J (J + 1))          E
//! - --- +  (---- + ---------) ψ(r) = ε ψ(r),     ε = -
//!   ∂r²    ( S         r²   )                        S
//! ```
//! so that *S*, in cm⁻¹ Å², is the only conversion needed between physical and
//! reduced energies. See [`Units`][crate::units::Units].
//!
//! # Finite-difference scheme
//! The radial coordinate is discretized on a uniform grid
//! ```text
//! r[i] = rmin + i h,   h = (rmax - rmin) / (N - 1),   i ∊ {0, ..., N - 1}
//! ```
//! with *ψ* taken to vanish just outside both ends. Replacing the second
//! derivative with the three-point central difference
//! ```text
//! ∂²ψ     ψ[i - 1] - 2 ψ[i] + ψ[i + 1]
//! --- ≈ ------------------------------
//! ∂r²                 h²
//! ```
//! turns the reduced radial equation into a symmetric tridiagonal eigenvalue
//! problem *H* *ψ* = *ε* *ψ* with
//! ```text
//! H[i, i]     = V(r[i]) / S + J (J + 1) / r[i]² + 2 / h²
//! H[i, i ± 1] = -1 / h²
//! ```
//! A symmetric tridiagonal matrix with nonzero off-diagonal elements has only
//! simple eigenvalues, and the *k*-th smallest has an eigenvector with exactly
//! *k* sign changes. Eigenvalue index therefore coincides with the vibrational
//! quantum number, which allows individual levels to be selected by index
//! without computing the rest of the spectrum. Eigenvalues are located by
//! bisection on the Sturm sequence of *H* − *x* *I* (whose number of sign
//! agreements counts the eigenvalues below *x*), and eigenvectors follow from
//! inverse iteration with the converged eigenvalue as a shift.
//!
//! Two selection modes are available: all eigenvalues lying in the bound
//! window \[0, *E*<sub>max</sub>/*S*), where *E*<sub>max</sub> is the
//! dissociation asymptote of the curve; or a fixed range of indices when the
//! levels of interest are known in advance (e.g. from experiment). Eigenvectors
//! are normalized to unit Euclidean norm over the grid, with the overall sign
//! chosen so that the largest-magnitude component is positive.
//!
//! # Finite-difference correction
//! The three-point difference has a truncation error that is fourth order in
//! the derivative,
//! ```text
//! ψ[i - 1] - 2 ψ[i] + ψ[i + 1]          h²
//! ------------------------------ = ψ'' + -- ψ'''' + O(h⁴)
//!               h²                      12
//! ```
//! Differentiating the radial equation twice and neglecting derivatives of the
//! potential, ψ'''' ≈ ((*V* − *E*)/*S*)² *ψ*, so the leading error in a
//! computed energy is removed by the first-order perturbation
//! ```text
//!           h²
//! ΔE =  ------ Σᵢ (ψ[i] (V(r[i]) - E))²
//!       12 S
//! ```
//! where *E* = *ε* *S* is the uncorrected energy. Reported level energies are
//! *E* + Δ*E*; on typical grids of several thousand points this brings the
//! finite-difference energies into agreement with the exact eigenvalues to
//! well below 0.01 cm⁻¹.
//!
//! # Rotational constants
//! The effective rotational constant of a level is the expectation value of
//! the centrifugal factor,
//! ```text
//! Bv = S ⟨ψ| r⁻² |ψ⟩ = S Σᵢ ψ[i]² / r[i]²
//! ```
//! evaluated with the normalized grid wavefunction.
//!
//! # Transition moments
//! For a dipole moment function *d*(*r*), the vibrational transition matrix
//! element between levels (*J*″, *v*″) and (*J*′, *v*′) computed on the same
//! grid is
//! ```text
//! M = Σᵢ ψ″[i] ψ′[i] d(r[i])
//! ```
//! with no step factor because the wavefunctions are normalized as vectors.
//! Within a single band pair, rotational lines obeying Δ*J* = ±1 form the P
//! (*J*′ = *J*″ − 1) and R (*J*′ = *J*″ + 1) branches, weighted by the
//! Hönl–London factors
//! ```text
//!        J″ + 1             J″
//! Sa_R = -------,   Sa_P = -------
//!        2J″ + 1           2J″ + 1
//! ```
//! (and their emission counterparts with *J*′ in place of *J*″), by the
//! Boltzmann population (2*J*″ + 1) exp(−*E*″/*k*<sub>B</sub>*T*) of the lower
//! level at room temperature, and by *ν*³ for the Einstein *A* coefficients.
//!
//! # Fitting
//! The parameters (*D*ₑ, *r*ₑ, *β*₀, *β*₁, ...) of an analytic curve can be
//! adjusted by nonlinear least squares against experimental term values, a
//! point-wise curve, or both. Each experimental level contributes a residual
//! (*E*<sub>calc</sub> − *E*<sub>exp</sub>)/0.1 cm⁻¹ and each curve sample a
//! residual (*V* − *V*<sub>model</sub>)/*σ*. The sum of squares is minimized
//! with the Levenberg–Marquardt method[^1], using forward-difference Jacobians
//! and Marquardt's diagonal scaling[^2].
//!
//! [^1]: K. Levenberg, "A method for the solution of certain non-linear
//! problems in least squares." Quarterly of Applied Mathematics **2** 164-168
//! (1944).
//!
//! [^2]: J. J. Moré, "The Levenberg-Marquardt algorithm: Implementation and
//! theory." In *Numerical Analysis*, Lecture Notes in Mathematics **630**
//! 105-116 (1978).
