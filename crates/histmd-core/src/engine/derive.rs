use super::error::{EngineError, Result};
use crate::core::models::error::ModelError;
use crate::core::models::store::FieldStore;
use crate::core::models::trajectory::Trajectory;
use crate::core::species::SpeciesTable;
use crate::core::units;
use crate::core::utils::geometry;
use tracing::{debug, instrument};

/// A finite-difference update: velocities of frame `target` are
/// `(x[ahead] - x[behind]) * scale`.
#[derive(Debug, Clone, Copy)]
struct Difference {
    target: usize,
    ahead: usize,
    behind: usize,
    scale: f64,
}

/// Finite differences made possible by the arrival of frame `itime`.
///
/// Interior frames use a central difference, the first and last frames a
/// one-sided one.
fn differences_for(itime: usize, ntime: usize, dtion: f64) -> Vec<Difference> {
    let mut out = Vec::with_capacity(3);
    if itime >= 2 {
        out.push(Difference {
            target: itime - 1,
            ahead: itime,
            behind: itime - 2,
            scale: 0.5 / dtion,
        });
    }
    if itime > 0 && itime == ntime - 1 {
        out.push(Difference {
            target: itime,
            ahead: itime,
            behind: itime - 1,
            scale: 1.0 / dtion,
        });
    }
    if itime == 1 {
        out.push(Difference {
            target: 0,
            ahead: 1,
            behind: 0,
            scale: 1.0 / dtion,
        });
    }
    out
}

/// Per-atom masses in electron masses.
pub(crate) fn atom_masses(store: &FieldStore, species: &dyn SpeciesTable) -> Result<Vec<f64>> {
    store
        .typat
        .iter()
        .map(|&typ| {
            let z = store.znucl[typ - 1];
            species
                .mass(z)
                .map(|m| m * units::AMU_TO_EMASS)
                .ok_or(EngineError::UnknownSpecies(z))
        })
        .collect()
}

/// Kinetic temperature in Kelvin from `sum(m v^2)` in atomic units.
#[inline]
pub(crate) fn kinetic_temperature(mv2: f64, natom: usize) -> f64 {
    if natom == 0 {
        return 0.0;
    }
    mv2 * units::HA / (3.0 * units::KB * natom as f64)
}

/// Pressure in GPa: static part from the stress trace plus the ideal-gas
/// kinetic contribution.
#[inline]
pub(crate) fn kinetic_pressure(
    stress_trace: f64,
    natom: usize,
    volume: f64,
    temperature: f64,
) -> f64 {
    units::HA_BOHR3_TO_GPA
        * (-stress_trace / 3.0 + natom as f64 / volume * (units::KB / units::HA) * temperature)
}

fn check_time_step(dtion: f64) -> Result<()> {
    if !(dtion > 0.0 && dtion.is_finite()) {
        return Err(EngineError::invalid(
            "dtion",
            format!("time step must be positive, got {dtion}"),
        ));
    }
    Ok(())
}

impl Trajectory {
    /// Updates the velocities that frame `itime` makes computable, together
    /// with the temperature and pressure of every updated frame.
    ///
    /// Meant to be called once per frame as frames arrive; `dtion` is the
    /// time step in atomic time units. Nothing is modified on error.
    pub fn derive_velocities(
        &mut self,
        itime: usize,
        dtion: f64,
        species: &dyn SpeciesTable,
    ) -> Result<()> {
        self.store.check_index(itime)?;
        check_time_step(dtion)?;
        let masses = atom_masses(&self.store, species)?;
        let updates = differences_for(itime, self.ntime(), dtion);
        for update in &updates {
            self.check_cell(update.target)?;
        }

        let (natom, ntime) = (self.natom(), self.ntime());
        self.ensure_md().ensure_velocities(natom, ntime);
        for update in updates {
            self.apply_difference(update);
            self.update_pressure_temperature(update.target, &masses);
        }
        Ok(())
    }

    /// Derives velocities, temperature and pressure for every frame.
    #[instrument(skip_all, name = "derive_all")]
    pub fn derive_all(&mut self, dtion: f64, species: &dyn SpeciesTable) -> Result<()> {
        for itime in 0..self.ntime() {
            self.derive_velocities(itime, dtion, species)
                .map_err(|e| e.context(format!("Derivation failed at frame {itime}")))?;
        }
        debug!(
            "Derived velocities for {} frame(s) with dtion = {dtion}.",
            self.ntime()
        );
        Ok(())
    }

    /// Recomputes temperature and pressure of frame `itime` from stored velocities.
    pub fn derive_pressure_temperature(
        &mut self,
        itime: usize,
        species: &dyn SpeciesTable,
    ) -> Result<()> {
        self.store.check_index(itime)?;
        if !self.has_velocities() {
            return Err(ModelError::VelocitiesUnavailable.into());
        }
        let masses = atom_masses(&self.store, species)?;
        self.check_cell(itime)?;
        self.update_pressure_temperature(itime, &masses);
        Ok(())
    }

    fn check_cell(&self, itime: usize) -> Result<()> {
        let volume = geometry::cell_volume(&self.store.rprimd[itime * 9..(itime + 1) * 9]);
        if !(volume.abs() > f64::EPSILON) {
            return Err(EngineError::invalid(
                "rprimd",
                format!("cell of frame {itime} has zero volume"),
            ));
        }
        Ok(())
    }

    fn apply_difference(&mut self, d: Difference) {
        let n3 = 3 * self.store.natom;
        let Some(md) = self.md.as_mut() else {
            return;
        };
        let xcart = &self.store.xcart;
        let ahead = &xcart[d.ahead * n3..(d.ahead + 1) * n3];
        let behind = &xcart[d.behind * n3..(d.behind + 1) * n3];
        let target = &mut md.velocities[d.target * n3..(d.target + 1) * n3];
        for ((v, a), b) in target.iter_mut().zip(ahead).zip(behind) {
            *v = (a - b) * d.scale;
        }
    }

    fn update_pressure_temperature(&mut self, itime: usize, masses: &[f64]) {
        let natom = self.store.natom;
        let n3 = 3 * natom;
        let volume = geometry::cell_volume(&self.store.rprimd[itime * 9..(itime + 1) * 9]);
        let trace = geometry::stress_trace(&self.store.stress[itime * 6..(itime + 1) * 6]);
        let Some(md) = self.md.as_mut() else {
            return;
        };

        let mv2: f64 = md.velocities[itime * n3..(itime + 1) * n3]
            .chunks_exact(3)
            .zip(masses)
            .map(|(v, m)| m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
            .sum();
        let temperature = kinetic_temperature(mv2, natom);
        md.temperature[itime] = temperature;
        md.pressure[itime] = kinetic_pressure(trace, natom, volume, temperature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::frame::Frame;
    use crate::core::species::Mendeleev;

    const TOLERANCE: f64 = 1e-9;
    const CELL: [f64; 9] = [10.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0];

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
    }

    /// Two H and two O atoms drifting with constant velocity `v` per component.
    fn drifting_trajectory(nframes: usize, dtion: f64, v: f64) -> Trajectory {
        let mut traj = Trajectory::new(vec![1, 8], vec![1, 1, 2, 2]).unwrap();
        for t in 0..nframes {
            let x0 = [0.0, 2.0, 4.0, 6.0];
            let positions: Vec<f64> = x0
                .iter()
                .flat_map(|&x| [x + v * dtion * t as f64; 3])
                .collect();
            traj.append_frame(Frame::new(positions, CELL, dtion * t as f64))
                .unwrap();
        }
        traj
    }

    #[test]
    fn constant_velocity_is_recovered_on_every_frame() {
        let mut traj = drifting_trajectory(5, 2.0, 0.01);
        traj.derive_all(2.0, &Mendeleev).unwrap();

        for t in 0..5 {
            for v in traj.velocities(t).unwrap() {
                assert!(f64_approx_equal(*v, 0.01), "frame {t}: {v}");
            }
        }
    }

    #[test]
    fn temperature_and_pressure_follow_kinetic_formulas() {
        let v = 0.01;
        let mut traj = drifting_trajectory(5, 2.0, v);
        traj.derive_all(2.0, &Mendeleev).unwrap();

        let masses: f64 = [1.008, 1.008, 15.999, 15.999]
            .iter()
            .map(|m| m * units::AMU_TO_EMASS)
            .sum();
        let expected_t = masses * 3.0 * v * v * units::HA / (3.0 * units::KB * 4.0);
        let expected_p = units::HA_BOHR3_TO_GPA * 4.0 / 1000.0 * (units::KB / units::HA) * expected_t;

        for t in 0..5 {
            assert!(f64_approx_equal(traj.temperature(t).unwrap(), expected_t));
            assert!(f64_approx_equal(traj.pressure(t).unwrap(), expected_p));
        }
    }

    #[test]
    fn two_frames_use_forward_and_backward_differences() {
        let mut traj = drifting_trajectory(2, 1.0, 0.5);
        traj.derive_all(1.0, &Mendeleev).unwrap();
        assert!(f64_approx_equal(traj.velocities(0).unwrap()[0], 0.5));
        assert!(f64_approx_equal(traj.velocities(1).unwrap()[0], 0.5));
    }

    #[test]
    fn single_frame_leaves_zero_velocities() {
        let mut traj = drifting_trajectory(1, 1.0, 0.5);
        traj.derive_velocities(0, 1.0, &Mendeleev).unwrap();
        assert!(traj.velocities(0).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn incremental_derivation_matches_batch() {
        let mut batch = drifting_trajectory(4, 1.5, 0.02);
        batch.derive_all(1.5, &Mendeleev).unwrap();

        let source = drifting_trajectory(4, 1.5, 0.02);
        let mut incremental = Trajectory::new(vec![1, 8], vec![1, 1, 2, 2]).unwrap();
        for t in 0..4 {
            let frame = Frame::new(
                source.positions(t).unwrap().to_vec(),
                CELL,
                source.time_value(t).unwrap(),
            );
            incremental.append_frame(frame).unwrap();
            incremental.derive_velocities(t, 1.5, &Mendeleev).unwrap();
        }
        for t in 0..4 {
            assert_eq!(
                incremental.velocities(t).unwrap(),
                batch.velocities(t).unwrap()
            );
        }
    }

    #[test]
    fn invalid_time_step_is_rejected_before_any_change() {
        let mut traj = drifting_trajectory(3, 1.0, 0.1);
        let err = traj.derive_velocities(2, 0.0, &Mendeleev).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { name: "dtion", .. }));
        assert!(!traj.has_md_fields());
    }

    #[test]
    fn out_of_range_frame_is_rejected() {
        let mut traj = drifting_trajectory(3, 1.0, 0.1);
        let err = traj.derive_velocities(3, 1.0, &Mendeleev).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Model(ModelError::TimeOutOfRange { index: 3, ntime: 3 })
        ));
    }

    #[test]
    fn unknown_species_is_reported() {
        let mut traj = Trajectory::new(vec![250], vec![1]).unwrap();
        traj.append_frame(Frame::new(vec![0.0; 3], CELL, 0.0)).unwrap();
        traj.append_frame(Frame::new(vec![1.0; 3], CELL, 1.0)).unwrap();
        let err = traj.derive_velocities(1, 1.0, &Mendeleev).unwrap_err();
        assert!(matches!(err, EngineError::UnknownSpecies(250)));
    }

    #[test]
    fn pressure_temperature_requires_velocities() {
        let mut traj = drifting_trajectory(2, 1.0, 0.1);
        let err = traj.derive_pressure_temperature(0, &Mendeleev).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Model(ModelError::VelocitiesUnavailable)
        ));
    }
}
