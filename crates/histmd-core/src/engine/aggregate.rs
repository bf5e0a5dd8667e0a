use super::error::Result;
use crate::core::models::md::MdFields;
use crate::core::models::store::FieldStore;
use crate::core::models::trajectory::Trajectory;

/// Mean over frames `[tbegin, tend)` of a series holding `width` values per frame.
fn time_average(src: &[f64], width: usize, tbegin: usize, tend: usize) -> Vec<f64> {
    let weight = 1.0 / (tend - tbegin) as f64;
    let mut out = vec![0.0; width];
    for frame in src[tbegin * width..tend * width].chunks_exact(width) {
        for (o, v) in out.iter_mut().zip(frame) {
            *o += v * weight;
        }
    }
    out
}

impl Trajectory {
    /// A single-frame trajectory holding the mean of every field over
    /// `[tbegin, tend)`.
    ///
    /// Velocities are averaged only when present; the thermostat range is
    /// copied. The result shares no storage with `self`.
    pub fn average(&self, tbegin: usize, tend: usize) -> Result<Trajectory> {
        self.check_times(tbegin, tend)?;
        let n3 = 3 * self.natom();
        let src = self.store();

        let mut store = FieldStore::new(src.znucl.clone(), src.typat.clone())?;
        store.xcart = time_average(&src.xcart, n3, tbegin, tend);
        store.rprimd = time_average(&src.rprimd, 9, tbegin, tend);
        store.stress = time_average(&src.stress, 6, tbegin, tend);
        store.time = time_average(&src.time, 1, tbegin, tend);
        store.etotal = time_average(&src.etotal, 1, tbegin, tend);
        store.ntime = 1;

        let mut averaged = Trajectory::from_store(store);
        averaged.md = self.md.as_ref().map(|md| MdFields {
            ekin: time_average(&md.ekin, 1, tbegin, tend),
            velocities: if md.has_velocities() {
                time_average(&md.velocities, n3, tbegin, tend)
            } else {
                Vec::new()
            },
            temperature: time_average(&md.temperature, 1, tbegin, tend),
            pressure: time_average(&md.pressure, 1, tbegin, tend),
            entropy: time_average(&md.entropy, 1, tbegin, tend),
            thermostat: md.thermostat,
        });
        Ok(averaged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::error::ModelError;
    use crate::core::models::frame::{Frame, FrameMd};
    use crate::engine::error::EngineError;

    const TOLERANCE: f64 = 1e-12;

    fn series(nframes: usize, velocities: bool) -> Trajectory {
        let mut traj = Trajectory::new(vec![1, 8], vec![1, 2]).unwrap();
        for t in 0..nframes {
            let x = t as f64;
            let cell = [5.0 + x, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 5.0];
            let md = FrameMd {
                velocities: velocities.then(|| vec![x; 6]),
                temperature: 100.0 * x,
                ..Default::default()
            };
            traj.append_frame(
                Frame::new(vec![2.0 * x; 6], cell, x)
                    .with_stress([x; 6])
                    .with_etotal(-x)
                    .with_md(md),
            )
            .unwrap();
        }
        traj.set_thermostat([280.0, 320.0]);
        traj
    }

    #[test]
    fn average_is_a_single_frame_of_means() {
        let traj = series(5, true);
        let avg = traj.average(1, 4).unwrap();

        assert_eq!(avg.ntime(), 1);
        assert_eq!(avg.natom(), 2);
        assert!(avg.positions(0).unwrap().iter().all(|v| (v - 4.0).abs() < TOLERANCE));
        assert!((avg.box_vectors(0).unwrap()[(0, 0)] - 7.0).abs() < TOLERANCE);
        assert!((avg.total_energy(0).unwrap() + 2.0).abs() < TOLERANCE);
        assert!((avg.temperature(0).unwrap() - 200.0).abs() < TOLERANCE);
        assert!(avg.velocities(0).unwrap().iter().all(|v| (v - 2.0).abs() < TOLERANCE));
        assert_eq!(avg.md().unwrap().thermostat(), [280.0, 320.0]);
    }

    #[test]
    fn averaging_a_single_frame_reproduces_it() {
        let traj = series(3, true);
        let avg = traj.average(2, 3).unwrap();
        assert_eq!(avg.positions(0).unwrap(), traj.positions(2).unwrap());
        assert_eq!(avg.stress(0).unwrap(), traj.stress(2).unwrap());
    }

    #[test]
    fn missing_velocities_stay_missing() {
        let avg = series(3, false).average(0, 3).unwrap();
        assert!(avg.has_md_fields());
        assert!(!avg.has_velocities());
    }

    #[test]
    fn empty_range_is_rejected() {
        let traj = series(3, true);
        assert!(matches!(
            traj.average(2, 2),
            Err(EngineError::Model(ModelError::InvalidTimeRange { .. }))
        ));
        assert!(matches!(
            traj.average(0, 4),
            Err(EngineError::Model(ModelError::InvalidTimeRange { .. }))
        ));
    }
}
