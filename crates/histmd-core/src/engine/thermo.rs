use super::error::{EngineError, Result};
use super::spectral::Smearing;
use crate::core::models::trajectory::Trajectory;
use crate::core::units;
use tracing::instrument;

/// Harmonic thermodynamic functions per atom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HarmonicThermo {
    /// Helmholtz free energy in eV.
    pub free_energy: f64,
    /// Internal energy in eV.
    pub internal_energy: f64,
    /// Heat capacity in units of kB.
    pub heat_capacity: f64,
    /// Entropy in units of kB.
    pub entropy: f64,
}

/// Integrates harmonic-oscillator functions over a phonon density of states
/// sampled on the grid produced by a VACF with time step `dtion_ps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermoIntegrator {
    dtion_ps: f64,
    omega_max_thz: Option<f64>,
}

impl ThermoIntegrator {
    pub fn new(dtion_ps: f64) -> Result<Self> {
        if !(dtion_ps > 0.0 && dtion_ps.is_finite()) {
            return Err(EngineError::invalid(
                "dtion",
                format!("time step must be positive, got {dtion_ps}"),
            ));
        }
        Ok(Self {
            dtion_ps,
            omega_max_thz: None,
        })
    }

    /// Truncates the integration at `omega_max_thz`.
    pub fn with_omega_max(mut self, omega_max_thz: f64) -> Result<Self> {
        if !(omega_max_thz > 0.0) {
            return Err(EngineError::invalid(
                "omega_max",
                format!("cutoff must be positive, got {omega_max_thz}"),
            ));
        }
        self.omega_max_thz = Some(omega_max_thz);
        Ok(self)
    }

    /// Frequency step in THz for a spectrum of `nfreq` points.
    pub fn domega(&self, nfreq: usize) -> f64 {
        1.0 / (2.0 * self.dtion_ps * nfreq as f64)
    }

    /// Number of bins kept below the cutoff.
    pub fn retained_bins(&self, nfreq: usize) -> usize {
        match self.omega_max_thz {
            None => nfreq,
            Some(omega) => ((omega / self.domega(nfreq)).floor() as usize).min(nfreq),
        }
    }

    /// Truncated copy of `pdos` whose trapezoidal integral is one.
    pub fn normalized(&self, pdos: &[f64]) -> Result<Vec<f64>> {
        let nfreq = pdos.len();
        let nmax = self.retained_bins(nfreq);
        if nmax < 2 {
            return Err(EngineError::invalid(
                "pdos",
                format!("at least 2 frequency bins are required, {nmax} retained"),
            ));
        }
        let domega = self.domega(nfreq);
        let norm: f64 = pdos[..nmax]
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]) * domega)
            .sum();
        if !(norm.is_finite() && norm != 0.0) {
            return Err(EngineError::invalid(
                "pdos",
                format!("spectrum integrates to {norm}"),
            ));
        }
        Ok(pdos[..nmax].iter().map(|p| p / norm).collect())
    }

    /// Harmonic free energy, internal energy, heat capacity and entropy at
    /// `temperature` Kelvin.
    pub fn integrate(&self, pdos: &[f64], temperature: f64) -> Result<HarmonicThermo> {
        if !(temperature > 0.0 && temperature.is_finite()) {
            return Err(EngineError::invalid(
                "temperature",
                format!("must be positive, got {temperature}"),
            ));
        }
        let nfreq = pdos.len();
        let dos = self.normalized(pdos)?;
        let domega = self.domega(nfreq);
        let kt = units::KB_EV * temperature;
        let to_ev = units::THZ_TO_HA * units::HA_TO_EV;

        let mut sums = HarmonicThermo::default();
        for (i, w) in dos.windows(2).enumerate() {
            let weight = 0.5 * (w[0] + w[1]) * domega;
            let omega = to_ev * (i as f64 + 0.5) * domega;
            let x = omega / (2.0 * kt);
            let mode = OscillatorTerms::at(x);
            sums.free_energy += mode.ln_two_sinh * weight;
            sums.internal_energy += omega * mode.coth * weight;
            sums.heat_capacity += mode.heat_capacity * weight;
            sums.entropy += (x * mode.coth - mode.ln_two_sinh) * weight;
        }

        Ok(HarmonicThermo {
            free_energy: 3.0 * kt * sums.free_energy,
            internal_energy: 1.5 * sums.internal_energy,
            heat_capacity: 3.0 * sums.heat_capacity,
            entropy: 3.0 * sums.entropy,
        })
    }
}

/// Per-mode factors of a quantum harmonic oscillator at `x = ħω/2kT`.
///
/// Evaluated through `e^{-2x}`; every term is finite for any positive `x`.
struct OscillatorTerms {
    ln_two_sinh: f64,
    coth: f64,
    heat_capacity: f64,
}

impl OscillatorTerms {
    fn at(x: f64) -> Self {
        let q = (-2.0 * x).exp();
        let one_minus_q = -(-2.0 * x).exp_m1();
        Self {
            ln_two_sinh: x + (-q).ln_1p(),
            coth: (1.0 + q) / one_minus_q,
            heat_capacity: 4.0 * x * x * q / (one_minus_q * one_minus_q),
        }
    }
}

impl Trajectory {
    /// Harmonic thermodynamics of the unsmeared all-atom PDOS over
    /// `[tbegin, tend)`, at the mean temperature of that range.
    #[instrument(skip_all, name = "thermo_functions")]
    pub fn thermo_functions(
        &self,
        tbegin: usize,
        tend: usize,
        omega_max_thz: Option<f64>,
    ) -> Result<HarmonicThermo> {
        self.check_times(tbegin, tend)
            .map_err(|e| EngineError::from(e).context("Thermodynamics calculations aborted"))?;
        let pdos = self
            .compute_pdos(tbegin, tend, Smearing::None)
            .map_err(|e| e.context("Unable to compute thermodynamic functions"))?;
        let temperature = self.mean_temperature(tbegin, tend)?;

        let mut integrator = ThermoIntegrator::new(self.time_step_ps())?;
        if let Some(omega) = omega_max_thz {
            integrator = integrator.with_omega_max(omega)?;
        }
        integrator.integrate(pdos.all(), temperature)
    }
}
