use super::frame::FrameMd;

/// Molecular-dynamics quantities carried on top of the base [`FieldStore`].
///
/// `velocities` is either `3 * natom * ntime` long or empty; empty means the
/// velocities were never computed, which is not the same as all atoms at rest.
///
/// [`FieldStore`]: super::store::FieldStore
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MdFields {
    pub(crate) ekin: Vec<f64>,
    pub(crate) velocities: Vec<f64>,
    pub(crate) temperature: Vec<f64>,
    pub(crate) pressure: Vec<f64>,
    pub(crate) entropy: Vec<f64>,
    /// Thermostat temperature range of the run, in Kelvin.
    pub(crate) thermostat: [f64; 2],
}

impl MdFields {
    pub(crate) fn zeroed(natom: usize, ntime: usize, with_velocities: bool) -> Self {
        Self {
            ekin: vec![0.0; ntime],
            velocities: if with_velocities {
                vec![0.0; 3 * natom * ntime]
            } else {
                Vec::new()
            },
            temperature: vec![0.0; ntime],
            pressure: vec![0.0; ntime],
            entropy: vec![0.0; ntime],
            thermostat: [0.0; 2],
        }
    }

    #[inline]
    pub fn has_velocities(&self) -> bool {
        !self.velocities.is_empty()
    }

    pub fn ekin(&self) -> &[f64] {
        &self.ekin
    }

    pub fn velocities(&self) -> &[f64] {
        &self.velocities
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn entropy(&self) -> &[f64] {
        &self.entropy
    }

    pub fn thermostat(&self) -> [f64; 2] {
        self.thermostat
    }

    /// Resizes the scalar series, and the velocities when they are present.
    pub(crate) fn resize(&mut self, natom: usize, ntime: usize) {
        self.ekin.resize(ntime, 0.0);
        self.temperature.resize(ntime, 0.0);
        self.pressure.resize(ntime, 0.0);
        self.entropy.resize(ntime, 0.0);
        if self.has_velocities() {
            self.velocities.resize(3 * natom * ntime, 0.0);
        }
    }

    /// Allocates zeroed velocities if none were stored yet.
    pub(crate) fn ensure_velocities(&mut self, natom: usize, ntime: usize) {
        if !self.has_velocities() {
            self.velocities = vec![0.0; 3 * natom * ntime];
        }
    }

    /// Appends one frame worth of values; `ntime_before` is the frame count
    /// before this push.
    pub(crate) fn push(&mut self, natom: usize, ntime_before: usize, md: Option<&FrameMd>) {
        let default = FrameMd::default();
        let md = md.unwrap_or(&default);
        self.ekin.push(md.ekin);
        self.temperature.push(md.temperature);
        self.pressure.push(md.pressure);
        self.entropy.push(md.entropy);
        match (&md.velocities, self.has_velocities()) {
            (Some(v), true) => self.velocities.extend_from_slice(v),
            (Some(v), false) => {
                self.velocities = vec![0.0; 3 * natom * ntime_before];
                self.velocities.extend_from_slice(v);
            }
            (None, true) => self.velocities.resize(3 * natom * (ntime_before + 1), 0.0),
            (None, false) => {}
        }
    }
}
