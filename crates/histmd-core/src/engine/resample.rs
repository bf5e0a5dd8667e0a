use super::config::ResampleConfig;
use super::error::{EngineError, Result};
use crate::core::models::md::MdFields;
use crate::core::models::trajectory::Trajectory;
use tracing::{info, instrument};

/// Amplitudes this close to one duplicate segment endpoints, which are then
/// emitted only once.
const UNIT_AMPLITUDE_TOLERANCE: f64 = 1e-10;

/// Index layout of a resampled series.
#[derive(Debug, Clone, Copy)]
struct Schedule {
    ntime: usize,
    ninter: usize,
    stride: usize,
    alpha: f64,
    new_ntime: usize,
}

impl Schedule {
    fn new(ntime: usize, ninter: usize, amplitude: f64) -> Self {
        let dedup = (amplitude - 1.0).abs() < UNIT_AMPLITUDE_TOLERANCE;
        let mut new_ntime = ninter * (ntime - 1);
        if dedup {
            new_ntime -= ntime - 2;
        }
        Self {
            ntime,
            ninter,
            stride: if dedup { ninter - 1 } else { ninter },
            alpha: amplitude / (ninter - 1) as f64,
            new_ntime,
        }
    }

    /// Resamples a series of `width` values per frame.
    ///
    /// Segments are written from last to first so that, with unit amplitude,
    /// the shared endpoint of two segments ends up written by the earlier one.
    fn apply(&self, src: &[f64], width: usize) -> Vec<f64> {
        let mut out = vec![0.0; width * self.new_ntime];
        for last in (1..self.ntime).rev() {
            let first = last - 1;
            let (a, b) = (
                &src[last * width..(last + 1) * width],
                &src[first * width..(first + 1) * width],
            );
            for k in 0..self.ninter {
                let beta = k as f64 * self.alpha;
                let gamma = 1.0 - beta;
                let cur = first * self.stride + (self.ninter - 1 - k);
                for ((o, x), y) in out[cur * width..(cur + 1) * width].iter_mut().zip(a).zip(b) {
                    *o = gamma * x + beta * y;
                }
            }
        }
        out
    }
}

impl Trajectory {
    /// Replaces the trajectory with one holding `ninter` linearly interpolated
    /// frames per segment between consecutive frames.
    ///
    /// `amplitude` in `[0, 1]` is how far towards the previous frame the
    /// interpolation reaches. With unit amplitude consecutive segments share
    /// their endpoint and every original frame appears exactly once, at index
    /// `j * (ninter - 1)`. Every field, MD fields included, is resampled; the
    /// new arrays replace the old ones only once all are computed.
    #[instrument(skip_all, name = "interpolate", fields(ninter = ninter, amplitude = amplitude))]
    pub fn interpolate(&mut self, ninter: usize, amplitude: f64) -> Result<()> {
        self.finish_loading()?;
        if self.ntime() < 2 {
            return Err(EngineError::invalid(
                "ntime",
                format!("at least 2 frames are required, found {}", self.ntime()),
            ));
        }
        if ninter < 2 {
            return Err(EngineError::invalid(
                "ninter",
                format!("at least 2 points per segment are required, got {ninter}"),
            ));
        }
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(EngineError::invalid(
                "amplitude",
                format!("must lie in [0, 1], got {amplitude}"),
            ));
        }

        let schedule = Schedule::new(self.ntime(), ninter, amplitude);
        let n3 = 3 * self.natom();
        let store = &self.store;
        let xcart = schedule.apply(&store.xcart, n3);
        let rprimd = schedule.apply(&store.rprimd, 9);
        let stress = schedule.apply(&store.stress, 6);
        let time = schedule.apply(&store.time, 1);
        let etotal = schedule.apply(&store.etotal, 1);
        let md = self.md.as_ref().map(|md| MdFields {
            ekin: schedule.apply(&md.ekin, 1),
            velocities: if md.has_velocities() {
                schedule.apply(&md.velocities, n3)
            } else {
                Vec::new()
            },
            temperature: schedule.apply(&md.temperature, 1),
            pressure: schedule.apply(&md.pressure, 1),
            entropy: schedule.apply(&md.entropy, 1),
            thermostat: md.thermostat,
        });

        let store = &mut self.store;
        store.xcart = xcart;
        store.rprimd = rprimd;
        store.stress = stress;
        store.time = time;
        store.etotal = etotal;
        store.ntime = schedule.new_ntime;
        self.md = md;

        info!(
            "Resampled trajectory to {} frame(s).",
            schedule.new_ntime
        );
        Ok(())
    }

    /// [`Trajectory::interpolate`] with the settings of a `[resample]` table.
    pub fn resample(&mut self, config: &ResampleConfig) -> Result<()> {
        self.interpolate(config.ninter, config.amplitude)
    }
}
