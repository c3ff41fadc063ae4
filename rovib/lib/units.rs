#![allow(non_upper_case_globals)]

//! Physical constants and the unit system of the radial problem.
//!
//! All energies are in cm⁻¹, all lengths in Å, and all masses in unified
//! atomic mass units (Da). Conversion factors are fixed literals so that
//! computed levels are reproducible to well below 1e-5 cm⁻¹.

/// electron mass (Da)
pub const me_da: f64 = 5.48579909065e-4;
//                 +/- 0.00000000016e-4

/// Hartree energy (cm⁻¹)
pub const Eh_cm: f64 = 219474.63067;
//                 +/- 0.00000043

/// Bohr radius (Å)
pub const a0_ang: f64 = 0.529177210903;
//                  +/- 0.000000000080

/// Boltzmann constant (cm⁻¹ K⁻¹), at the precision used for populations
pub const kB_cm: f64 = 0.695;

/// Reference temperature for Boltzmann populations (K)
pub const T_ref: f64 = 298.0;

/// Einstein-A prefactor for a transition moment in Debye and a frequency in
/// cm⁻¹ (s⁻¹)
pub const A_coeff: f64 = 3.137e-7;

/// Energy/length scale of a two-body radial problem.
///
/// The radial equation is solved in the form
/// ```text
/// (-∂²/∂r² + J(J + 1)/r² + V(r)/S) f = (E/S) f
/// ```
/// so `scale` is the factor *S* = *ħ*²/(2*μ*) expressed in cm⁻¹·Å².
#[derive(Copy, Clone, Debug)]
pub struct Units {
    /// Reduced mass (Da).
    pub mu: f64,
    /// *ħ*²/(2*μ*) (cm⁻¹·Å²).
    pub scale: f64,
}

impl Units {
    /// Construct for a pair of masses given in Da.
    pub fn from_masses(mass1: f64, mass2: f64) -> Self {
        let mu = mass1 * mass2 / (mass1 + mass2);
        let scale = me_da * Eh_cm * a0_ang.powi(2) / (2.0 * mu);
        Self { mu, scale }
    }

    /// Convert an energy in cm⁻¹ to the reduced units of the radial equation
    /// (Å⁻²).
    pub fn to_nat_energy<T, U>(&self, x: T) -> U
    where T: std::ops::Mul<f64, Output = U>
    {
        x * self.scale.recip()
    }

    /// Convert an energy in reduced units (Å⁻²) back to cm⁻¹.
    pub fn from_nat_energy<T, U>(&self, x: T) -> U
    where T: std::ops::Mul<f64, Output = U>
    {
        x * self.scale
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn reduced_mass_and_scale() {
        let uu = Units::from_masses(1.007825, 34.968852);
        assert_relative_eq!(uu.mu, 0.979593, epsilon = 1e-6);
        // B = S / r² for a rigid rotor; HCl at 1.2746 Å gives ≈10.6 cm⁻¹
        assert_relative_eq!(uu.scale / 1.2746_f64.powi(2), 10.59, epsilon = 1e-2);
    }

    #[test]
    fn energy_round_trip() {
        let uu = Units::from_masses(1.0, 1.0);
        let e: f64 = uu.to_nat_energy(1234.5);
        let back: f64 = uu.from_nat_energy(e);
        assert_relative_eq!(back, 1234.5, epsilon = 1e-12);
    }
}
