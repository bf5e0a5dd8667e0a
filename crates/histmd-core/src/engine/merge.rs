use super::config::MergeConfig;
use super::error::{EngineError, Result};
use crate::core::models::md::MdFields;
use crate::core::models::store::FieldStore;
use crate::core::models::trajectory::Trajectory;
use crate::core::utils::stats;
use std::fmt;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("No structural match: {0}")]
    NoMatch(String),
    #[error("Structures are incompatible: {0}")]
    Incompatible(String),
}

/// Maps the atoms of one trajectory onto those of another.
///
/// `reorder` returns `order` such that atom `i` of `reference` corresponds to
/// atom `order[i]` of `other`.
pub trait StructureMatcher: Send + Sync {
    fn reorder(
        &self,
        reference: &Trajectory,
        other: &Trajectory,
    ) -> std::result::Result<Vec<usize>, MatchError>;
}

#[derive(Clone, Copy)]
pub struct MergeOptions<'a> {
    pub matcher: Option<&'a dyn StructureMatcher>,
    /// Absolute tolerance on the time-step comparison, in atomic time units.
    pub time_step_tolerance: f64,
    /// Relative drift of mean temperature or pressure that triggers a warning.
    pub drift_threshold: f64,
}

impl Default for MergeOptions<'_> {
    fn default() -> Self {
        Self::from_config(&MergeConfig::default(), None)
    }
}

impl fmt::Debug for MergeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeOptions")
            .field("matcher", &self.matcher.is_some())
            .field("time_step_tolerance", &self.time_step_tolerance)
            .field("drift_threshold", &self.drift_threshold)
            .finish()
    }
}

impl<'a> MergeOptions<'a> {
    /// The matcher is only kept when the configuration asks for reordering.
    pub fn from_config(config: &MergeConfig, matcher: Option<&'a dyn StructureMatcher>) -> Self {
        Self {
            matcher: matcher.filter(|_| config.reorder_atoms),
            time_step_tolerance: config.time_step_tolerance,
            drift_threshold: config.drift_threshold,
        }
    }

    pub fn with_matcher(mut self, matcher: &'a dyn StructureMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeWarning {
    TimeStepMismatch { first: f64, second: f64 },
    TemperatureDrift { first: f64, second: f64 },
    PressureDrift { first: f64, second: f64 },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeStepMismatch { first, second } => write!(
                f,
                "Time steps differ between trajectories: {first} vs {second}"
            ),
            Self::TemperatureDrift { first, second } => write!(
                f,
                "Mean temperatures differ by more than the drift threshold: {first} K vs {second} K"
            ),
            Self::PressureDrift { first, second } => write!(
                f,
                "Mean pressures differ by more than the drift threshold: {first} GPa vs {second} GPa"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub frames_before: usize,
    pub frames_appended: usize,
    pub reordered: bool,
    pub warnings: Vec<MergeWarning>,
}

fn validate_permutation(order: &[usize], natom: usize) -> Result<()> {
    if order.len() != natom {
        return Err(EngineError::Internal(format!(
            "matcher returned {} indices for {natom} atoms",
            order.len()
        )));
    }
    let mut seen = vec![false; natom];
    for &i in order {
        if i >= natom || std::mem::replace(&mut seen[i], true) {
            return Err(EngineError::Internal(format!(
                "matcher returned an invalid permutation (index {i})"
            )));
        }
    }
    Ok(())
}

/// Appends `nframes` blocks of `natom` 3-vectors from `src` to `dst`,
/// picking atom `order[i]` of each source block for position `i`.
fn extend_atoms(dst: &mut Vec<f64>, src: &[f64], natom: usize, order: Option<&[usize]>) {
    let Some(order) = order else {
        dst.extend_from_slice(src);
        return;
    };
    dst.reserve(src.len());
    for block in src.chunks_exact(3 * natom) {
        for &j in order {
            dst.extend_from_slice(&block[3 * j..3 * j + 3]);
        }
    }
}

fn drifted(first: f64, second: f64, threshold: f64) -> bool {
    stats::relative_deviation(first, second).is_some_and(|d| d > threshold)
}

impl Trajectory {
    /// Appends every frame of `other` to this trajectory.
    ///
    /// Compatibility is checked and the optional atom permutation is computed
    /// before anything is modified, so a failed merge leaves `self` untouched.
    /// Non-fatal inconsistencies are logged and returned in the report.
    #[instrument(skip_all, name = "merge_trajectories")]
    pub fn merge(&mut self, other: &Trajectory, options: &MergeOptions) -> Result<MergeReport> {
        self.finish_loading()?;

        let adopt = self.ntime() == 0 && self.natom() == 0 && self.znucl().is_empty();
        let (natom, znucl, typat) = if adopt {
            (other.natom(), other.znucl(), other.typat())
        } else {
            (self.natom(), self.znucl(), self.typat())
        };
        if natom != other.natom() {
            return Err(EngineError::AtomCountMismatch {
                expected: natom,
                found: other.natom(),
            });
        }
        if znucl != other.znucl() {
            return Err(EngineError::SpeciesMismatch(format!(
                "species tables differ: {znucl:?} vs {:?}",
                other.znucl()
            )));
        }

        let mut report = MergeReport {
            frames_before: self.ntime(),
            frames_appended: other.ntime(),
            ..Default::default()
        };
        self.check_consistency(other, options, &mut report);

        let order = match options.matcher {
            Some(matcher) if !adopt && self.ntime() > 0 => {
                let order = matcher
                    .reorder(self, other)
                    .map_err(|e| EngineError::from(e).context("Merge aborted"))?;
                validate_permutation(&order, natom)?;
                let identity = order.iter().enumerate().all(|(i, &j)| i == j);
                (!identity).then_some(order)
            }
            _ => None,
        };
        let mismatch = (0..natom).find(|&i| {
            let j = order.as_ref().map_or(i, |o| o[i]);
            typat[i] != other.typat()[j]
        });
        if let Some(i) = mismatch {
            return Err(EngineError::SpeciesMismatch(format!(
                "atom {i} has a different species in the appended trajectory"
            )));
        }

        if adopt {
            self.store = FieldStore::new(other.znucl().to_vec(), other.typat().to_vec())?;
        }
        report.reordered = order.is_some();
        self.append_store(other, order.as_deref());
        self.append_md(other, order.as_deref(), report.frames_before);

        info!(
            "Merged {} frame(s); trajectory now has {} frame(s).",
            report.frames_appended,
            self.ntime()
        );
        Ok(report)
    }

    fn check_consistency(&self, other: &Trajectory, options: &MergeOptions, report: &mut MergeReport) {
        if let (Some(first), Some(second)) = (self.time_step(), other.time_step()) {
            if (first - second).abs() > options.time_step_tolerance {
                report
                    .warnings
                    .push(MergeWarning::TimeStepMismatch { first, second });
            }
        }

        if let (Some(a), Some(b)) = (self.md.as_ref(), other.md.as_ref()) {
            if self.ntime() > 0 && other.ntime() > 0 {
                let (t1, t2) = (stats::mean(&a.temperature), stats::mean(&b.temperature));
                if drifted(t1, t2, options.drift_threshold) {
                    report.warnings.push(MergeWarning::TemperatureDrift {
                        first: t1,
                        second: t2,
                    });
                }
                let (p1, p2) = (stats::mean(&a.pressure), stats::mean(&b.pressure));
                if drifted(p1, p2, options.drift_threshold) {
                    report.warnings.push(MergeWarning::PressureDrift {
                        first: p1,
                        second: p2,
                    });
                }
            }
        }

        for warning in &report.warnings {
            warn!("{warning}");
        }
    }

    fn append_store(&mut self, other: &Trajectory, order: Option<&[usize]>) {
        let natom = self.store.natom;
        let src = &other.store;
        let dst = &mut self.store;
        extend_atoms(&mut dst.xcart, &src.xcart, natom, order);
        dst.rprimd.extend_from_slice(&src.rprimd);
        dst.stress.extend_from_slice(&src.stress);
        dst.time.extend_from_slice(&src.time);
        dst.etotal.extend_from_slice(&src.etotal);
        dst.ntime += src.ntime;
    }

    /// `frames_before` is the frame count prior to [`Self::append_store`].
    fn append_md(&mut self, other: &Trajectory, order: Option<&[usize]>, frames_before: usize) {
        if self.md.is_none() && other.md.is_none() {
            return;
        }
        let natom = self.store.natom;
        let ntime = self.store.ntime;
        let self_velocities = self.has_velocities();
        let other_velocities = other.has_velocities();

        let md = self
            .md
            .get_or_insert_with(|| MdFields::zeroed(natom, frames_before, false));
        match other.md.as_ref() {
            Some(src) => {
                md.ekin.extend_from_slice(&src.ekin);
                md.temperature.extend_from_slice(&src.temperature);
                md.pressure.extend_from_slice(&src.pressure);
                md.entropy.extend_from_slice(&src.entropy);
                if md.thermostat == [0.0; 2] {
                    md.thermostat = src.thermostat;
                }
            }
            None => {
                md.ekin.resize(ntime, 0.0);
                md.temperature.resize(ntime, 0.0);
                md.pressure.resize(ntime, 0.0);
                md.entropy.resize(ntime, 0.0);
            }
        }

        match (self_velocities, other_velocities) {
            (_, true) => {
                if !self_velocities {
                    md.velocities = vec![0.0; 3 * natom * frames_before];
                }
                if let Some(src) = other.md.as_ref() {
                    extend_atoms(&mut md.velocities, &src.velocities, natom, order);
                }
            }
            (true, false) => md.velocities.resize(3 * natom * ntime, 0.0),
            (false, false) => {}
        }
    }
}
