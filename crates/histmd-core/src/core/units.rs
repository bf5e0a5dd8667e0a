//! Physical constants and unit conversions.
//!
//! Trajectory data is stored in atomic units (Bohr, Hartree, atomic time units and
//! electron masses). Temperatures are kept in Kelvin and pressures in GPa.

pub const PI: f64 = std::f64::consts::PI;

/// Hartree energy in Joule.
pub const HA: f64 = 4.359_744_722_207_1e-18;
/// Boltzmann constant in Joule per Kelvin.
pub const KB: f64 = 1.380_649e-23;
/// Electron-volt in Joule.
pub const EV: f64 = 1.602_176_634e-19;
/// Bohr radius in Angstrom.
pub const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_903;
/// Atomic unit of time in femtoseconds.
pub const ATU_TO_FS: f64 = 2.418_884_326_585_7e-2;
/// Unified atomic mass unit in electron masses.
pub const AMU_TO_EMASS: f64 = 1_822.888_486_209;
pub const HA_TO_EV: f64 = 27.211_386_245_988;
/// Energy of one THz photon in Hartree.
pub const THZ_TO_HA: f64 = 1.519_829_846_057_4e-4;

/// Stress in Ha/Bohr^3 to GPa.
pub const HA_BOHR3_TO_GPA: f64 =
    HA / (BOHR_TO_ANGSTROM * BOHR_TO_ANGSTROM * BOHR_TO_ANGSTROM) * 1e21;

/// Squared velocity in (Bohr/atu)^2 to (nm/ps)^2.
pub const VELOCITY2_TO_NM2_PS2: f64 = (BOHR_TO_ANGSTROM * 1e-1) * (BOHR_TO_ANGSTROM * 1e-1)
    / ((ATU_TO_FS * 1e-3) * (ATU_TO_FS * 1e-3));

/// Boltzmann constant in eV per Kelvin.
pub const KB_EV: f64 = KB / EV;

/// Frequency in THz to energy in meV.
pub const THZ_TO_MEV: f64 = THZ_TO_HA * HA_TO_EV * 1e3;

/// Converts a duration in atomic time units to picoseconds.
#[inline]
pub fn atu_to_ps(atu: f64) -> f64 {
    atu * ATU_TO_FS * 1e-3
}
