use super::error::{EngineError, Result};
use crate::core::models::trajectory::Trajectory;
use crate::core::units;
use crate::core::utils::{geometry, stats};
use std::fmt;

/// Mean and population standard deviation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimate {
    pub mean: f64,
    pub deviation: f64,
}

impl Estimate {
    pub fn of(values: &[f64]) -> Self {
        let mean = stats::mean(values);
        Self {
            mean,
            deviation: stats::deviation(values, mean),
        }
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            mean: self.mean * factor,
            deviation: self.deviation * factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermoSummary {
    /// Total energy in Hartree.
    pub etotal: Estimate,
    /// Cell volume in Bohr^3.
    pub volume: Estimate,
    /// Temperature in Kelvin, when the trajectory carries MD fields.
    pub temperature: Option<Estimate>,
    /// Pressure in GPa, when the trajectory carries MD fields.
    pub pressure: Option<Estimate>,
    /// Stress components in GPa, Voigt order.
    pub stress: [Estimate; 6],
}

impl Trajectory {
    pub fn summary(&self, tbegin: usize, tend: usize) -> Result<ThermoSummary> {
        self.check_times(tbegin, tend)
            .map_err(|e| EngineError::from(e).context("Thermodynamics calculations aborted"))?;
        let store = self.store();

        let volumes: Vec<f64> = store.rprimd[tbegin * 9..tend * 9]
            .chunks_exact(9)
            .map(geometry::cell_volume)
            .collect();
        let stress = std::array::from_fn(|s| {
            let component: Vec<f64> = (tbegin..tend).map(|t| store.stress[t * 6 + s]).collect();
            Estimate::of(&component).scaled(units::HA_BOHR3_TO_GPA)
        });
        let md = self.md.as_ref();

        Ok(ThermoSummary {
            etotal: Estimate::of(&store.etotal[tbegin..tend]),
            volume: Estimate::of(&volumes),
            temperature: md.map(|md| Estimate::of(&md.temperature[tbegin..tend])),
            pressure: md.map(|md| Estimate::of(&md.pressure[tbegin..tend])),
            stress,
        })
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, label: &str, value: Option<Estimate>) -> fmt::Result {
    match value {
        Some(v) => writeln!(f, "{label:<25}{:>12.5e} +/- {:>12.5e}", v.mean, v.deviation),
        None => writeln!(f, "{label:<25}{:>12}", "n/a"),
    }
}

impl fmt::Display for ThermoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " -- Thermodynamics information --")?;
        writeln!(f, "    ^^^^^^^^^^^^^^^^^^^^^^^^^^   ")?;
        write_row(f, " Total energy [Ha]:", Some(self.etotal))?;
        write_row(f, " Volume [Bohr^3]:", Some(self.volume))?;
        write_row(f, " Temperature [K]:", self.temperature)?;
        write_row(f, " Pressure [GPa]:", self.pressure)?;
        for (s, value) in self.stress.iter().enumerate() {
            write_row(f, &format!(" Stress {} [GPa]:", s + 1), Some(*value))?;
        }
        Ok(())
    }
}
