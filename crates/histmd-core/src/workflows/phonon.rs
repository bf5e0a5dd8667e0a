use crate::core::models::trajectory::Trajectory;
use crate::engine::config::AnalysisConfig;
use crate::engine::error::{EngineError, Result};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::spectral::{self, Smearing, SpeciesCurves};
use crate::engine::thermo::{HarmonicThermo, ThermoIntegrator};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct PhononAnalysis {
    /// Lag times of the VACF in picoseconds.
    pub time_axis_ps: Vec<f64>,
    /// Velocity autocorrelation per species bucket, in (nm/ps)^2.
    pub vacf: SpeciesCurves,
    /// Frequencies of the PDOS in meV.
    pub frequencies_mev: Vec<f64>,
    pub pdos: SpeciesCurves,
    /// Mean temperature of the analysed window, in Kelvin.
    pub temperature: f64,
    pub smearing: Smearing,
    /// Mean total energy in eV per atom.
    pub ground_energy: f64,
    /// Harmonic thermodynamics of the all-atom PDOS at `temperature`; absent
    /// when the window has no positive mean temperature.
    pub thermo: Option<HarmonicThermo>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermoPoint {
    pub temperature: f64,
    pub thermo: HarmonicThermo,
}

fn resolve_smearing(config: &AnalysisConfig, temperature: f64, dtion_ps: f64) -> Result<Smearing> {
    let kelvin = config
        .spectral
        .smearing_kelvin
        .unwrap_or(config.spectral.smearing_fraction * temperature);
    Smearing::from_temperature(kelvin, dtion_ps)
}

fn integrator(dtion_ps: f64, config: &AnalysisConfig) -> Result<ThermoIntegrator> {
    let integrator = ThermoIntegrator::new(dtion_ps)?;
    match config.thermo.omega_max_thz {
        Some(omega) => integrator.with_omega_max(omega),
        None => Ok(integrator),
    }
}

/// Runs the phonon analysis over frames `[tbegin, tend)`.
#[instrument(skip_all, name = "phonon_workflow")]
pub fn run(
    trajectory: &Trajectory,
    tbegin: usize,
    tend: usize,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<PhononAnalysis> {
    trajectory
        .check_times(tbegin, tend)
        .map_err(|e| EngineError::from(e).context("Phonon analysis aborted"))?;
    let dtion_ps = trajectory.time_step_ps();
    let temperature = trajectory.mean_temperature(tbegin, tend)?;
    let ground_energy = trajectory.mean_energy_per_atom_ev(tbegin, tend)?;
    let smearing = resolve_smearing(config, temperature, dtion_ps)?;
    info!(
        "Phonon analysis of frames [{tbegin}, {tend}) at T = {temperature:.2} K, dt = {dtion_ps:.3e} ps."
    );

    let vacf = reporter.phase("VACF", || trajectory.compute_vacf(tbegin, tend))?;
    let pdos = reporter.phase("PDOS", || {
        spectral::pdos_from_vacf(&vacf, smearing).map_err(|e| e.context("PDOS calculation failed"))
    })?;

    let thermo = if temperature > 0.0 {
        let thermo = reporter.phase("Thermodynamics", || {
            integrator(dtion_ps, config)?
                .integrate(pdos.all(), temperature)
                .map_err(|e| e.context("Unable to compute thermodynamic functions"))
        })?;
        Some(thermo)
    } else {
        warn!("Mean temperature is not positive; skipping thermodynamic functions.");
        reporter.report(Progress::Warning(
            "Thermodynamic functions skipped: no positive temperature".to_string(),
        ));
        None
    };

    Ok(PhononAnalysis {
        time_axis_ps: spectral::vacf_time_axis(vacf.points(), dtion_ps),
        frequencies_mev: spectral::pdos_frequency_axis(pdos.points(), dtion_ps),
        vacf,
        pdos,
        temperature,
        smearing,
        ground_energy,
        thermo,
    })
}

/// Harmonic thermodynamic functions at `temperature-points` temperatures
/// evenly spaced over `(0, sweep-factor * T]`, `T` being the mean temperature
/// of `[tbegin, tend)`.
#[instrument(skip_all, name = "thermo_sweep")]
pub fn thermo_sweep(
    trajectory: &Trajectory,
    tbegin: usize,
    tend: usize,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<ThermoPoint>> {
    trajectory
        .check_times(tbegin, tend)
        .map_err(|e| EngineError::from(e).context("Thermodynamics calculations aborted"))?;
    let dtion_ps = trajectory.time_step_ps();
    let mean = trajectory.mean_temperature(tbegin, tend)?;
    if !(mean > 0.0) {
        return Err(EngineError::invalid(
            "temperature",
            format!("mean temperature must be positive, got {mean}"),
        ));
    }
    let smearing = resolve_smearing(config, mean, dtion_ps)?;
    let pdos = reporter.phase("PDOS", || {
        trajectory
            .compute_pdos(tbegin, tend, smearing)
            .map_err(|e| e.context("Unable to compute thermodynamic functions"))
    })?;
    let integrator = integrator(dtion_ps, config)?;
    let dos = pdos.all();

    let npoints = config.thermo.temperature_points;
    let step = config.thermo.sweep_factor * mean / npoints as f64;
    reporter.report(Progress::TaskStart {
        total_steps: npoints as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let temperatures = (0..npoints).into_iter();
    #[cfg(feature = "parallel")]
    let temperatures = (0..npoints).into_par_iter();

    let points = temperatures
        .map(|k| {
            let temperature = (k + 1) as f64 * step;
            let thermo = integrator.integrate(dos, temperature)?;
            reporter.report(Progress::TaskIncrement);
            Ok(ThermoPoint {
                temperature,
                thermo,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    reporter.report(Progress::TaskFinish);
    info!("Thermodynamic sweep finished with {} point(s).", points.len());
    Ok(points)
}
