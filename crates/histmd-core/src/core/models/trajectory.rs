use super::error::ModelError;
use super::frame::Frame;
use super::md::MdFields;
use super::store::FieldStore;
use crate::core::io::loader::LoaderHandle;
use crate::core::io::traits::{FrameSource, LoadError};
use crate::core::units;
use crate::core::utils::{geometry, stats};
use nalgebra::Matrix3;
use tracing::{debug, info, warn};

/// Time step assumed when a trajectory has fewer than two frames, in atomic time units.
pub const DEFAULT_TIME_STEP_ATU: f64 = 100.0;

/// A time-ordered sequence of frames produced by a molecular-dynamics run.
///
/// The base fields live in a [`FieldStore`]; molecular-dynamics quantities are an
/// optional capability ([`MdFields`]) queried through [`Trajectory::has_md_fields`].
/// A trajectory may own a background loader filling it incrementally; dropping the
/// trajectory stops and joins that loader before the storage is released.
#[derive(Debug, Default)]
pub struct Trajectory {
    pub(crate) loader: Option<LoaderHandle>,
    pub(crate) store: FieldStore,
    pub(crate) md: Option<MdFields>,
}

impl Drop for Trajectory {
    fn drop(&mut self) {
        if let Some(mut loader) = self.loader.take() {
            if let Err(e) = loader.shutdown() {
                warn!("Loader shutdown during teardown failed: {}", e);
            }
        }
    }
}

impl Clone for Trajectory {
    /// Snapshots the frames loaded so far; a running loader is not shared.
    fn clone(&self) -> Self {
        Self {
            loader: None,
            store: self.store.clone(),
            md: self.md.clone(),
        }
    }
}

impl Trajectory {
    /// Creates an empty trajectory without molecular-dynamics fields.
    pub fn new(znucl: Vec<u32>, typat: Vec<usize>) -> Result<Self, ModelError> {
        Ok(Self::from_store(FieldStore::new(znucl, typat)?))
    }

    /// Creates an empty trajectory carrying molecular-dynamics fields.
    pub fn new_md(znucl: Vec<u32>, typat: Vec<usize>) -> Result<Self, ModelError> {
        let mut traj = Self::new(znucl, typat)?;
        traj.md = Some(MdFields::default());
        Ok(traj)
    }

    pub fn from_store(store: FieldStore) -> Self {
        Self {
            loader: None,
            store,
            md: None,
        }
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn md(&self) -> Option<&MdFields> {
        self.md.as_ref()
    }

    #[inline]
    pub fn natom(&self) -> usize {
        self.store.natom
    }

    #[inline]
    pub fn ntime(&self) -> usize {
        self.store.ntime
    }

    pub fn znucl(&self) -> &[u32] {
        &self.store.znucl
    }

    pub fn typat(&self) -> &[usize] {
        &self.store.typat
    }

    pub fn has_md_fields(&self) -> bool {
        self.md.is_some()
    }

    pub fn has_velocities(&self) -> bool {
        self.md.as_ref().is_some_and(MdFields::has_velocities)
    }

    pub fn set_thermostat(&mut self, range: [f64; 2]) {
        self.ensure_md().thermostat = range;
    }

    /// Appends one frame, growing every array in the same call.
    ///
    /// A frame carrying MD data turns on the MD capability (earlier frames are
    /// zero-filled); a frame without MD data is zero-filled when the trajectory
    /// already carries MD fields.
    pub fn append_frame(&mut self, frame: Frame) -> Result<(), ModelError> {
        self.store.validate_frame(&frame)?;
        let (natom, ntime) = (self.store.natom, self.store.ntime);
        if frame.md.is_some() && self.md.is_none() {
            self.md = Some(MdFields::zeroed(natom, ntime, false));
        }
        if let Some(md) = self.md.as_mut() {
            md.push(natom, ntime, frame.md.as_ref());
        }
        self.store.push(&frame);
        Ok(())
    }

    pub fn check_times(&self, tbegin: usize, tend: usize) -> Result<(), ModelError> {
        self.store.check_times(tbegin, tend)
    }

    pub fn positions(&self, t: usize) -> Result<&[f64], ModelError> {
        self.store.check_index(t)?;
        let n = 3 * self.natom();
        Ok(&self.store.xcart[t * n..(t + 1) * n])
    }

    pub fn box_vectors(&self, t: usize) -> Result<Matrix3<f64>, ModelError> {
        self.store.check_index(t)?;
        Ok(geometry::lattice_matrix(&self.store.rprimd[t * 9..(t + 1) * 9]))
    }

    pub fn stress(&self, t: usize) -> Result<&[f64], ModelError> {
        self.store.check_index(t)?;
        Ok(&self.store.stress[t * 6..(t + 1) * 6])
    }

    pub fn time_value(&self, t: usize) -> Result<f64, ModelError> {
        self.store.check_index(t)?;
        Ok(self.store.time[t])
    }

    pub fn total_energy(&self, t: usize) -> Result<f64, ModelError> {
        self.store.check_index(t)?;
        Ok(self.store.etotal[t])
    }

    pub fn volume(&self, t: usize) -> Result<f64, ModelError> {
        self.store.volume(t)
    }

    pub fn velocities(&self, t: usize) -> Result<&[f64], ModelError> {
        self.store.check_index(t)?;
        let md = self.md_fields()?;
        if !md.has_velocities() {
            return Err(ModelError::VelocitiesUnavailable);
        }
        let n = 3 * self.natom();
        Ok(&md.velocities[t * n..(t + 1) * n])
    }

    pub fn kinetic_energy(&self, t: usize) -> Result<f64, ModelError> {
        self.md_scalar(t, |md| &md.ekin)
    }

    pub fn temperature(&self, t: usize) -> Result<f64, ModelError> {
        self.md_scalar(t, |md| &md.temperature)
    }

    pub fn pressure(&self, t: usize) -> Result<f64, ModelError> {
        self.md_scalar(t, |md| &md.pressure)
    }

    pub fn entropy(&self, t: usize) -> Result<f64, ModelError> {
        self.md_scalar(t, |md| &md.entropy)
    }

    /// Mean temperature over `[tbegin, tend)`.
    pub fn mean_temperature(&self, tbegin: usize, tend: usize) -> Result<f64, ModelError> {
        self.check_times(tbegin, tend)?;
        Ok(stats::mean(&self.md_fields()?.temperature[tbegin..tend]))
    }

    /// Mean total energy over `[tbegin, tend)` in eV per atom.
    pub fn mean_energy_per_atom_ev(&self, tbegin: usize, tend: usize) -> Result<f64, ModelError> {
        self.check_times(tbegin, tend)?;
        let natom = self.natom().max(1) as f64;
        Ok(stats::mean(&self.store.etotal[tbegin..tend]) * units::HA_TO_EV / natom)
    }

    /// Time step between the first two frames, in atomic time units.
    pub fn time_step(&self) -> Option<f64> {
        (self.ntime() > 1).then(|| self.store.time[1] - self.store.time[0])
    }

    /// Time step in picoseconds, falling back to [`DEFAULT_TIME_STEP_ATU`].
    pub fn time_step_ps(&self) -> f64 {
        units::atu_to_ps(self.time_step().unwrap_or(DEFAULT_TIME_STEP_ATU))
    }

    pub(crate) fn md_fields(&self) -> Result<&MdFields, ModelError> {
        self.md.as_ref().ok_or(ModelError::MdFieldsUnavailable)
    }

    pub(crate) fn ensure_md(&mut self) -> &mut MdFields {
        let (natom, ntime) = (self.store.natom, self.store.ntime);
        self.md
            .get_or_insert_with(|| MdFields::zeroed(natom, ntime, false))
    }

    fn md_scalar(
        &self,
        t: usize,
        field: impl Fn(&MdFields) -> &Vec<f64>,
    ) -> Result<f64, ModelError> {
        self.store.check_index(t)?;
        Ok(field(self.md_fields()?)[t])
    }

    /// Starts a background thread feeding frames from `source`.
    ///
    /// A previously running loader is drained to completion first.
    pub fn spawn_loader<S: FrameSource>(&mut self, source: S) -> Result<(), LoadError> {
        self.finish_loading()?;
        self.loader = Some(LoaderHandle::spawn(source)?);
        info!("Background loader started.");
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|l| !l.is_exhausted())
    }

    /// Appends every frame already delivered by the loader, without blocking.
    ///
    /// Returns the number of frames appended.
    pub fn poll_frames(&mut self) -> Result<usize, LoadError> {
        let mut appended = 0;
        while let Some(msg) = self.loader.as_mut().and_then(LoaderHandle::try_next) {
            self.ingest(msg)?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Blocks until at least `ntime` frames are available or the source is exhausted.
    pub fn wait_frames(&mut self, ntime: usize) -> Result<usize, LoadError> {
        while self.ntime() < ntime {
            match self.loader.as_mut().and_then(LoaderHandle::next_blocking) {
                Some(msg) => self.ingest(msg)?,
                None => break,
            }
        }
        Ok(self.ntime())
    }

    /// Loads every remaining frame and joins the loader thread.
    pub fn finish_loading(&mut self) -> Result<(), LoadError> {
        if self.loader.is_none() {
            return Ok(());
        }
        self.wait_frames(usize::MAX)?;
        if let Some(mut loader) = self.loader.take() {
            loader.shutdown()?;
        }
        debug!("Loader finished with {} frame(s).", self.ntime());
        Ok(())
    }

    fn ingest(&mut self, msg: Result<Frame, LoadError>) -> Result<(), LoadError> {
        let frame = match msg {
            Ok(frame) => frame,
            Err(e) => {
                self.loader = None;
                return Err(e);
            }
        };
        if let Err(e) = self.append_frame(frame) {
            self.loader = None;
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::frame::FrameMd;
    use std::sync::{Arc, Mutex};

    fn frame(natom: usize, t: f64) -> Frame {
        Frame::new(
            vec![t; 3 * natom],
            [8.0, 0.0, 0.0, 0.0, 8.0, 0.0, 0.0, 0.0, 8.0],
            t,
        )
        .with_etotal(-t)
    }

    fn md_frame(natom: usize, t: f64, v: f64) -> Frame {
        frame(natom, t).with_md(FrameMd {
            velocities: Some(vec![v; 3 * natom]),
            temperature: 100.0 * t,
            ..Default::default()
        })
    }

    struct FailingSource {
        remaining: usize,
    }

    impl FrameSource for FailingSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, LoadError> {
            if self.remaining == 0 {
                return Err(LoadError::Source("truncated record".to_string()));
            }
            self.remaining -= 1;
            Ok(Some(frame(1, self.remaining as f64)))
        }
    }

    #[test]
    fn accessors_are_bounds_checked() {
        let mut traj = Trajectory::new(vec![1], vec![1, 1]).unwrap();
        traj.append_frame(frame(2, 0.0)).unwrap();
        assert_eq!(traj.positions(0).unwrap().len(), 6);
        assert!(matches!(
            traj.positions(1),
            Err(ModelError::TimeOutOfRange { index: 1, ntime: 1 })
        ));
        assert!(matches!(
            traj.temperature(0),
            Err(ModelError::MdFieldsUnavailable)
        ));
    }

    #[test]
    fn md_frame_on_plain_trajectory_enables_md_fields_with_zero_history() {
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        traj.append_frame(frame(1, 0.0)).unwrap();
        traj.append_frame(md_frame(1, 1.0, 2.0)).unwrap();

        assert!(traj.has_md_fields());
        assert!(traj.has_velocities());
        assert_eq!(traj.velocities(0).unwrap(), &[0.0, 0.0, 0.0]);
        assert_eq!(traj.velocities(1).unwrap(), &[2.0, 2.0, 2.0]);
        assert_eq!(traj.temperature(1).unwrap(), 100.0);
    }

    #[test]
    fn velocities_absent_is_reported_distinctly() {
        let mut traj = Trajectory::new_md(vec![1], vec![1]).unwrap();
        traj.append_frame(frame(1, 0.0)).unwrap();
        assert!(traj.has_md_fields());
        assert!(!traj.has_velocities());
        assert!(matches!(
            traj.velocities(0),
            Err(ModelError::VelocitiesUnavailable)
        ));
    }

    #[test]
    fn time_step_falls_back_for_single_frame() {
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        traj.append_frame(frame(1, 0.0)).unwrap();
        assert_eq!(traj.time_step(), None);
        assert!((traj.time_step_ps() - units::atu_to_ps(DEFAULT_TIME_STEP_ATU)).abs() < 1e-15);
        traj.append_frame(frame(1, 40.0)).unwrap();
        assert_eq!(traj.time_step(), Some(40.0));
    }

    #[test]
    fn mean_energy_per_atom_converts_to_ev() {
        let mut traj = Trajectory::new(vec![1], vec![1, 1]).unwrap();
        traj.append_frame(frame(2, 1.0)).unwrap();
        traj.append_frame(frame(2, 3.0)).unwrap();
        let e = traj.mean_energy_per_atom_ev(0, 2).unwrap();
        assert!((e - (-2.0 * units::HA_TO_EV / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn loader_delivers_all_frames_and_joins() {
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        let frames: Vec<Frame> = (0..10).map(|i| frame(1, i as f64)).collect();
        traj.spawn_loader(frames.into_iter()).unwrap();
        assert!(traj.wait_frames(3).unwrap() >= 3);
        traj.finish_loading().unwrap();
        assert_eq!(traj.ntime(), 10);
        assert!(!traj.is_loading());
        assert_eq!(traj.time_value(9).unwrap(), 9.0);
    }

    #[test]
    fn loader_error_is_surfaced_after_valid_frames() {
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        traj.spawn_loader(FailingSource { remaining: 2 }).unwrap();
        let err = traj.finish_loading().unwrap_err();
        assert!(matches!(err, LoadError::Source(_)));
        assert_eq!(traj.ntime(), 2);
    }

    #[test]
    fn dropping_trajectory_stops_an_endless_loader() {
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        let endless = (0..).map(|i| frame(1, i as f64));
        traj.spawn_loader(endless).unwrap();
        traj.wait_frames(5).unwrap();
        drop(traj);
    }

    struct TrackedSource {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FrameSource for TrackedSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, LoadError> {
            Ok(Some(frame(1, 0.0)))
        }
    }

    impl Drop for TrackedSource {
        fn drop(&mut self) {
            self.log.lock().unwrap().push("source released");
        }
    }

    #[test]
    fn teardown_joins_loader_before_returning() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        traj.spawn_loader(TrackedSource { log: Arc::clone(&log) })
            .unwrap();
        traj.wait_frames(3).unwrap();
        assert!(log.lock().unwrap().is_empty());

        drop(traj);
        log.lock().unwrap().push("trajectory dropped");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["source released", "trajectory dropped"]
        );
    }

    #[test]
    fn clone_snapshots_frames_without_loader() {
        let mut traj = Trajectory::new(vec![1], vec![1]).unwrap();
        traj.spawn_loader((0..3).map(|i| frame(1, i as f64))).unwrap();
        traj.wait_frames(2).unwrap();
        let copy = traj.clone();
        assert!(copy.loader.is_none());
        assert!(copy.ntime() >= 2);
    }
}
