use super::error::ModelError;
use super::frame::Frame;
use crate::core::utils::geometry;

/// Per-frame arrays shared by every trajectory, whatever produced it.
///
/// Atom-indexed arrays are flattened with layout `[(t * natom + atom) * 3 + xyz]`.
/// The species table (`znucl`, `typat`) is fixed at construction; every array is
/// resized together so lengths always match `natom` and `ntime`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStore {
    pub(crate) natom: usize,
    pub(crate) ntime: usize,
    /// Atomic numbers of the species present, in species-index order.
    pub(crate) znucl: Vec<u32>,
    /// 1-based species index of every atom.
    pub(crate) typat: Vec<usize>,
    pub(crate) xcart: Vec<f64>,
    pub(crate) rprimd: Vec<f64>,
    pub(crate) stress: Vec<f64>,
    pub(crate) time: Vec<f64>,
    pub(crate) etotal: Vec<f64>,
}

impl FieldStore {
    /// Creates an empty store for a fixed species table.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSpecies`] if an atom refers to a species index
    /// outside `1..=znucl.len()`.
    pub fn new(znucl: Vec<u32>, typat: Vec<usize>) -> Result<Self, ModelError> {
        for (atom, &t) in typat.iter().enumerate() {
            if t == 0 || t > znucl.len() {
                return Err(ModelError::InvalidSpecies {
                    atom,
                    typat: t,
                    nspecies: znucl.len(),
                });
            }
        }
        Ok(Self {
            natom: typat.len(),
            znucl,
            typat,
            ..Default::default()
        })
    }

    #[inline]
    pub fn natom(&self) -> usize {
        self.natom
    }

    #[inline]
    pub fn ntime(&self) -> usize {
        self.ntime
    }

    pub fn znucl(&self) -> &[u32] {
        &self.znucl
    }

    pub fn typat(&self) -> &[usize] {
        &self.typat
    }

    pub fn nspecies(&self) -> usize {
        self.znucl.len()
    }

    /// Number of atoms in each species bucket; bucket 0 counts every atom.
    pub fn species_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.znucl.len() + 1];
        for &t in &self.typat {
            counts[t] += 1;
        }
        counts[0] = self.natom;
        counts
    }

    pub fn xcart(&self) -> &[f64] {
        &self.xcart
    }

    pub fn rprimd(&self) -> &[f64] {
        &self.rprimd
    }

    pub fn stress(&self) -> &[f64] {
        &self.stress
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn etotal(&self) -> &[f64] {
        &self.etotal
    }

    pub fn check_index(&self, index: usize) -> Result<(), ModelError> {
        if index >= self.ntime {
            return Err(ModelError::TimeOutOfRange {
                index,
                ntime: self.ntime,
            });
        }
        Ok(())
    }

    /// Validates a half-open time range `[tbegin, tend)`.
    pub fn check_times(&self, tbegin: usize, tend: usize) -> Result<(), ModelError> {
        if tbegin >= tend || tend > self.ntime {
            return Err(ModelError::InvalidTimeRange {
                tbegin,
                tend,
                ntime: self.ntime,
            });
        }
        Ok(())
    }

    pub fn volume(&self, index: usize) -> Result<f64, ModelError> {
        self.check_index(index)?;
        Ok(geometry::cell_volume(&self.rprimd[index * 9..(index + 1) * 9]))
    }

    /// Resizes every per-frame array to `ntime` frames, zero-filling new frames.
    pub(crate) fn resize(&mut self, ntime: usize) {
        self.xcart.resize(3 * self.natom * ntime, 0.0);
        self.rprimd.resize(9 * ntime, 0.0);
        self.stress.resize(6 * ntime, 0.0);
        self.time.resize(ntime, 0.0);
        self.etotal.resize(ntime, 0.0);
        self.ntime = ntime;
    }

    pub(crate) fn validate_frame(&self, frame: &Frame) -> Result<(), ModelError> {
        check_len("positions", 3 * self.natom, frame.positions.len())?;
        if let Some(Some(v)) = frame.md.as_ref().map(|md| md.velocities.as_ref()) {
            check_len("velocities", 3 * self.natom, v.len())?;
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, frame: &Frame) {
        self.xcart.extend_from_slice(&frame.positions);
        self.rprimd.extend_from_slice(&frame.rprimd);
        self.stress.extend_from_slice(&frame.stress);
        self.time.push(frame.time);
        self.etotal.push(frame.etotal);
        self.ntime += 1;
    }
}

fn check_len(field: &'static str, expected: usize, found: usize) -> Result<(), ModelError> {
    if expected != found {
        return Err(ModelError::InvalidFrame {
            field,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_frame(natom: usize, time: f64) -> Frame {
        Frame::new(
            vec![0.5; 3 * natom],
            [10.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0],
            time,
        )
    }

    #[test]
    fn new_rejects_species_index_outside_table() {
        let err = FieldStore::new(vec![14], vec![1, 2]).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidSpecies {
                atom: 1,
                typat: 2,
                nspecies: 1
            }
        );
        assert!(FieldStore::new(vec![14], vec![0]).is_err());
    }

    #[test]
    fn species_counts_put_every_atom_in_bucket_zero() {
        let store = FieldStore::new(vec![8, 1], vec![1, 2, 2]).unwrap();
        assert_eq!(store.species_counts(), vec![3, 1, 2]);
    }

    #[test]
    fn push_grows_all_arrays_together() {
        let mut store = FieldStore::new(vec![1], vec![1, 1]).unwrap();
        store.push(&cubic_frame(2, 0.0));
        store.push(&cubic_frame(2, 1.0));
        assert_eq!(store.ntime(), 2);
        assert_eq!(store.xcart().len(), 12);
        assert_eq!(store.rprimd().len(), 18);
        assert_eq!(store.stress().len(), 12);
        assert_eq!(store.time(), &[0.0, 1.0]);
        assert_eq!(store.etotal().len(), 2);
    }

    #[test]
    fn validate_frame_reports_wrong_position_count() {
        let store = FieldStore::new(vec![1], vec![1, 1]).unwrap();
        let err = store.validate_frame(&cubic_frame(3, 0.0)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidFrame {
                field: "positions",
                expected: 6,
                found: 9
            }
        ));
    }

    #[test]
    fn check_times_requires_non_empty_range_inside_trajectory() {
        let mut store = FieldStore::new(vec![1], vec![1]).unwrap();
        store.resize(4);
        assert!(store.check_times(0, 4).is_ok());
        assert!(store.check_times(2, 2).is_err());
        assert!(store.check_times(1, 5).is_err());
        assert!(store.check_index(3).is_ok());
        assert!(store.check_index(4).is_err());
    }

    #[test]
    fn volume_uses_frame_lattice() {
        let mut store = FieldStore::new(vec![1], vec![1]).unwrap();
        store.push(&cubic_frame(1, 0.0));
        assert!((store.volume(0).unwrap() - 1000.0).abs() < 1e-9);
        assert!(store.volume(1).is_err());
    }
}
