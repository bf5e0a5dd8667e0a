//! Velocity autocorrelation and phonon density of states.
//!
//! The VACF is accumulated per species bucket: bucket 0 holds every atom and
//! bucket `s` the atoms of species `s`. The PDOS of a bucket is the type-II
//! cosine transform of its VACF, optionally broadened by a Gaussian.

pub mod acf;
pub mod backend;
pub mod dct;
pub mod smearing;

use super::error::{EngineError, Result};
use crate::core::models::error::ModelError;
use crate::core::models::trajectory::Trajectory;
use crate::core::species::{self, Mendeleev, SpeciesTable};
use crate::core::units;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use smearing::smearing_from_temperature;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Smearing {
    #[default]
    None,
    /// Gaussian width on the normalised frequency axis.
    Gaussian(f64),
}

impl Smearing {
    /// Smearing for a width given in Kelvin; zero disables it.
    pub fn from_temperature(kelvin: f64, dtion_ps: f64) -> Result<Self> {
        if !(kelvin >= 0.0 && kelvin.is_finite()) {
            return Err(EngineError::invalid(
                "smearing",
                format!("temperature width must be non-negative, got {kelvin}"),
            ));
        }
        if kelvin == 0.0 {
            Ok(Self::None)
        } else {
            Ok(Self::Gaussian(smearing_from_temperature(kelvin, dtion_ps)))
        }
    }

    fn validate(self) -> Result<()> {
        match self {
            Self::Gaussian(sigma) if !(sigma > 0.0 && sigma.is_finite()) => Err(
                EngineError::invalid("smearing", format!("width must be positive, got {sigma}")),
            ),
            _ => Ok(()),
        }
    }
}

/// One curve per species bucket, with display labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpeciesCurves {
    pub curves: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl SpeciesCurves {
    /// The curve of bucket 0, covering every atom.
    pub fn all(&self) -> &[f64] {
        self.curves.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.curves[i].as_slice())
    }

    /// Number of samples per curve.
    pub fn points(&self) -> usize {
        self.curves.first().map_or(0, Vec::len)
    }

    pub fn relabel(mut self, znucl: &[u32], table: &dyn SpeciesTable) -> Self {
        self.labels = species::bucket_labels(znucl, table);
        self
    }
}

/// Lag times of a VACF in picoseconds.
pub fn vacf_time_axis(ntau: usize, dtion_ps: f64) -> Vec<f64> {
    (0..ntau).map(|i| i as f64 * dtion_ps).collect()
}

/// Frequencies of a PDOS of `n` points in meV, up to the Nyquist frequency.
pub fn pdos_frequency_axis(n: usize, dtion_ps: f64) -> Vec<f64> {
    (0..n)
        .map(|i| units::THZ_TO_MEV * i as f64 / (dtion_ps * n as f64 * 2.0))
        .collect()
}

/// Transforms each VACF bucket into a PDOS bucket.
pub fn pdos_from_vacf(vacf: &SpeciesCurves, smearing: Smearing) -> Result<SpeciesCurves> {
    smearing.validate()?;
    backend::require("PDOS calculation")?;
    let transformed = dct::dct2_batch(&vacf.curves)?;
    let curves = match smearing {
        Smearing::None => transformed,
        Smearing::Gaussian(sigma) => smearing::gaussian_broaden_all(&transformed, sigma),
    };
    Ok(SpeciesCurves {
        curves,
        labels: vacf.labels.clone(),
    })
}

impl Trajectory {
    /// Velocity autocorrelation over `[tbegin, tend)`, in (nm/ps)^2, with
    /// buckets labelled from the built-in [`Mendeleev`] table.
    pub fn compute_vacf(&self, tbegin: usize, tend: usize) -> Result<SpeciesCurves> {
        self.compute_vacf_with(tbegin, tend, &Mendeleev)
    }

    /// Velocity autocorrelation over `[tbegin, tend)`, in (nm/ps)^2, with
    /// buckets labelled from `species`.
    ///
    /// Each bucket is normalised by three times its atom count; a species
    /// without atoms yields a zero curve.
    #[instrument(skip_all, name = "vacf")]
    pub fn compute_vacf_with(
        &self,
        tbegin: usize,
        tend: usize,
        species: &dyn SpeciesTable,
    ) -> Result<SpeciesCurves> {
        self.check_times(tbegin, tend)?;
        let md = self.md_fields()?;
        if !md.has_velocities() {
            return Err(ModelError::VelocitiesUnavailable.into());
        }

        let natom = self.natom();
        let n3 = 3 * natom;
        let window = &md.velocities[tbegin * n3..tend * n3];
        let (ntau, acf) =
            acf::autocorrelation(window, n3).map_err(|e| e.context("VACF calculation failed"))?;

        let counts = self.store().species_counts();
        let nbucket = counts.len();
        let typat = self.typat();

        #[cfg(not(feature = "parallel"))]
        let lags = (0..ntau).into_iter();
        #[cfg(feature = "parallel")]
        let lags = (0..ntau).into_par_iter();

        let per_lag: Vec<Vec<f64>> = lags
            .map(|tau| {
                let mut sums = vec![0.0; nbucket];
                let row = &acf[tau * n3..(tau + 1) * n3];
                for (atom, xyz) in row.chunks_exact(3).enumerate() {
                    let c = xyz[0] + xyz[1] + xyz[2];
                    sums[0] += c;
                    sums[typat[atom]] += c;
                }
                sums
            })
            .collect();

        let curves = (0..nbucket)
            .map(|b| {
                if counts[b] == 0 {
                    return vec![0.0; ntau];
                }
                let norm = units::VELOCITY2_TO_NM2_PS2 / (3 * counts[b]) as f64;
                per_lag.iter().map(|sums| sums[b] * norm).collect()
            })
            .collect();

        debug!("VACF: {ntau} lag(s) over {nbucket} bucket(s).");
        Ok(SpeciesCurves {
            curves,
            labels: species::bucket_labels(self.znucl(), species),
        })
    }

    /// Phonon density of states over `[tbegin, tend)`, one curve per bucket.
    #[instrument(skip_all, name = "pdos")]
    pub fn compute_pdos(
        &self,
        tbegin: usize,
        tend: usize,
        smearing: Smearing,
    ) -> Result<SpeciesCurves> {
        smearing.validate()?;
        backend::require("PDOS calculation")?;
        let vacf = self
            .compute_vacf(tbegin, tend)
            .map_err(|e| e.context("PDOS calculation failed"))?;
        pdos_from_vacf(&vacf, smearing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::frame::{Frame, FrameMd};

    const CELL: [f64; 9] = [8.0, 0.0, 0.0, 0.0, 8.0, 0.0, 0.0, 0.0, 8.0];

    fn rel_close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-300)
    }

    /// Atoms with isotropic constant velocities `speeds[atom]` per component.
    fn steady(znucl: Vec<u32>, typat: Vec<usize>, speeds: &[f64], nframes: usize) -> Trajectory {
        let natom = typat.len();
        let mut traj = Trajectory::new(znucl, typat).unwrap();
        for t in 0..nframes {
            let velocities: Vec<f64> = speeds.iter().flat_map(|&u| [u; 3]).collect();
            let md = FrameMd {
                velocities: Some(velocities),
                ..Default::default()
            };
            traj.append_frame(Frame::new(vec![0.0; 3 * natom], CELL, t as f64).with_md(md))
                .unwrap();
        }
        traj
    }

    #[test]
    fn vacf_buckets_are_normalised_by_atom_count() {
        let traj = steady(vec![1, 8, 6], vec![1, 1, 2], &[1e-3, 2e-3, 4e-3], 6);
        let vacf = traj.compute_vacf(0, 6).unwrap();

        assert_eq!(vacf.labels, vec!["All", "H", "O", "C"]);
        assert_eq!(vacf.points(), 3);
        let conv = units::VELOCITY2_TO_NM2_PS2;
        let all = (1e-6 + 4e-6 + 16e-6) / 3.0 * conv;
        let hydrogen = (1e-6 + 4e-6) / 2.0 * conv;
        let oxygen = 16e-6 * conv;
        for tau in 0..3 {
            assert!(rel_close(vacf.all()[tau], all));
            assert!(rel_close(vacf.get("H").unwrap()[tau], hydrogen));
            assert!(rel_close(vacf.get("O").unwrap()[tau], oxygen));
            assert_eq!(vacf.get("C").unwrap()[tau], 0.0);
        }
    }

    struct Isotopes;

    impl SpeciesTable for Isotopes {
        fn mass(&self, znucl: u32) -> Option<f64> {
            (znucl == 1).then_some(2.014)
        }

        fn name(&self, znucl: u32) -> Option<&str> {
            (znucl == 1).then_some("D")
        }
    }

    #[test]
    fn vacf_labels_come_from_the_given_table() {
        let traj = steady(vec![1, 8], vec![1, 2], &[1e-3, 2e-3], 4);
        let vacf = traj.compute_vacf_with(0, 4, &Isotopes).unwrap();
        assert_eq!(vacf.labels, vec!["All", "D", "Z8"]);
        assert_eq!(vacf.curves, traj.compute_vacf(0, 4).unwrap().curves);
    }

    #[test]
    fn vacf_respects_the_time_window() {
        let mut traj = steady(vec![1], vec![1], &[1e-3], 2);
        let fast = steady(vec![1], vec![1], &[3e-3], 4);
        traj.merge(&fast, &Default::default()).unwrap();

        let vacf = traj.compute_vacf(2, 6).unwrap();
        assert_eq!(vacf.points(), 2);
        assert!(rel_close(vacf.all()[0], 9e-6 * units::VELOCITY2_TO_NM2_PS2));
    }

    #[test]
    fn vacf_requires_velocities() {
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        traj.append_frame(Frame::new(vec![0.0; 3], CELL, 0.0)).unwrap();
        assert!(matches!(
            traj.compute_vacf(0, 1),
            Err(EngineError::Model(ModelError::MdFieldsUnavailable))
        ));
    }

    #[test]
    fn invalid_window_is_rejected() {
        let traj = steady(vec![1], vec![1], &[1e-3], 3);
        assert!(matches!(
            traj.compute_vacf(2, 2),
            Err(EngineError::Model(ModelError::InvalidTimeRange { .. }))
        ));
    }

    #[test]
    fn frequency_axis_reaches_nyquist() {
        let axis = pdos_frequency_axis(4, 0.5);
        assert_eq!(axis[0], 0.0);
        assert!(rel_close(axis[2], units::THZ_TO_MEV * 0.5));
        assert_eq!(vacf_time_axis(3, 0.5), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn smearing_from_zero_temperature_is_disabled() {
        assert_eq!(Smearing::from_temperature(0.0, 1e-3).unwrap(), Smearing::None);
        assert!(Smearing::from_temperature(-1.0, 1e-3).is_err());
    }

    #[test]
    fn non_positive_gaussian_width_is_rejected() {
        let traj = steady(vec![1], vec![1], &[1e-3], 4);
        let err = traj.compute_pdos(0, 4, Smearing::Gaussian(0.0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidArgument {
                name: "smearing",
                ..
            }
        ));
    }

    #[cfg(feature = "fft")]
    #[test]
    fn steady_velocities_give_a_zero_frequency_peak() {
        let traj = steady(vec![1], vec![1, 1], &[1e-3, 1e-3], 8);
        let pdos = traj.compute_pdos(0, 8, Smearing::None).unwrap();
        let c0 = 1e-6 * units::VELOCITY2_TO_NM2_PS2;

        assert_eq!(pdos.labels, vec!["All", "H"]);
        assert!(rel_close(pdos.all()[0], 2.0 * 4.0 * c0));
        for v in &pdos.all()[1..] {
            assert!(v.abs() < 1e-9 * c0);
        }
    }

    #[cfg(feature = "fft")]
    #[test]
    fn pdos_errors_carry_context() {
        let mut traj = Trajectory::new_md(vec![1], vec![1]).unwrap();
        traj.append_frame(Frame::new(vec![0.0; 3], CELL, 0.0)).unwrap();
        let err = traj.compute_pdos(0, 1, Smearing::None).unwrap_err();
        assert!(err.to_string().starts_with("PDOS calculation failed"));
        assert!(matches!(
            err.root_cause(),
            EngineError::Model(ModelError::VelocitiesUnavailable)
        ));
    }

    #[cfg(not(feature = "fft"))]
    #[test]
    fn pdos_without_backend_fails_hard() {
        let traj = steady(vec![1], vec![1], &[1e-3], 4);
        assert!(matches!(
            traj.compute_pdos(0, 4, Smearing::None),
            Err(EngineError::BackendUnavailable(_))
        ));
    }
}
