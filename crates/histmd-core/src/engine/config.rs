use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct MergeConfig {
    /// Ask the structure matcher for an atom permutation before appending.
    pub reorder_atoms: bool,
    /// Absolute tolerance on the time-step comparison, in atomic time units.
    pub time_step_tolerance: f64,
    /// Relative drift of mean temperature or pressure that triggers a warning.
    pub drift_threshold: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            reorder_atoms: false,
            time_step_tolerance: 1e-6,
            drift_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ResampleConfig {
    pub ninter: usize,
    pub amplitude: f64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            ninter: 2,
            amplitude: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SpectralConfig {
    /// Gaussian smearing width in Kelvin. Zero disables smearing.
    pub smearing_kelvin: Option<f64>,
    /// Smearing width as a fraction of the mean temperature, used when
    /// `smearing_kelvin` is not set.
    pub smearing_fraction: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            smearing_kelvin: None,
            smearing_fraction: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ThermoConfig {
    /// Upper integration bound in THz.
    pub omega_max_thz: Option<f64>,
    pub temperature_points: usize,
    /// The sweep covers `(0, sweep_factor * T]` where `T` is the mean temperature.
    pub sweep_factor: f64,
}

impl Default for ThermoConfig {
    fn default() -> Self {
        Self {
            omega_max_thz: None,
            temperature_points: 1000,
            sweep_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct AnalysisConfig {
    pub merge: MergeConfig,
    pub resample: ResampleConfig,
    pub spectral: SpectralConfig,
    pub thermo: ThermoConfig,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(name: &'static str, reason: &str) -> ConfigError {
            ConfigError::InvalidValue {
                name,
                reason: reason.to_string(),
            }
        }

        if !(self.merge.time_step_tolerance >= 0.0) {
            return Err(invalid("merge.time-step-tolerance", "must be non-negative"));
        }
        if !(self.merge.drift_threshold > 0.0) {
            return Err(invalid("merge.drift-threshold", "must be positive"));
        }
        if self.resample.ninter < 2 {
            return Err(invalid("resample.ninter", "must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.resample.amplitude) {
            return Err(invalid("resample.amplitude", "must lie in [0, 1]"));
        }
        if let Some(kelvin) = self.spectral.smearing_kelvin {
            if !(kelvin >= 0.0 && kelvin.is_finite()) {
                return Err(invalid("spectral.smearing-kelvin", "must be non-negative"));
            }
        }
        if !(self.spectral.smearing_fraction >= 0.0) {
            return Err(invalid("spectral.smearing-fraction", "must be non-negative"));
        }
        if let Some(omega) = self.thermo.omega_max_thz {
            if !(omega > 0.0) {
                return Err(invalid("thermo.omega-max-thz", "must be positive"));
            }
        }
        if self.thermo.temperature_points == 0 {
            return Err(invalid("thermo.temperature-points", "must be at least 1"));
        }
        if !(self.thermo.sweep_factor > 0.0) {
            return Err(invalid("thermo.sweep-factor", "must be positive"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    reorder_atoms: Option<bool>,
    time_step_tolerance: Option<f64>,
    drift_threshold: Option<f64>,
    ninter: Option<usize>,
    amplitude: Option<f64>,
    smearing_kelvin: Option<f64>,
    smearing_fraction: Option<f64>,
    omega_max_thz: Option<f64>,
    temperature_points: Option<usize>,
    sweep_factor: Option<f64>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reorder_atoms(mut self, enabled: bool) -> Self {
        self.reorder_atoms = Some(enabled);
        self
    }
    pub fn time_step_tolerance(mut self, tolerance: f64) -> Self {
        self.time_step_tolerance = Some(tolerance);
        self
    }
    pub fn drift_threshold(mut self, threshold: f64) -> Self {
        self.drift_threshold = Some(threshold);
        self
    }
    pub fn ninter(mut self, ninter: usize) -> Self {
        self.ninter = Some(ninter);
        self
    }
    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = Some(amplitude);
        self
    }
    pub fn smearing_kelvin(mut self, kelvin: f64) -> Self {
        self.smearing_kelvin = Some(kelvin);
        self
    }
    pub fn smearing_fraction(mut self, fraction: f64) -> Self {
        self.smearing_fraction = Some(fraction);
        self
    }
    pub fn omega_max_thz(mut self, omega: f64) -> Self {
        self.omega_max_thz = Some(omega);
        self
    }
    pub fn temperature_points(mut self, n: usize) -> Self {
        self.temperature_points = Some(n);
        self
    }
    pub fn sweep_factor(mut self, factor: f64) -> Self {
        self.sweep_factor = Some(factor);
        self
    }

    /// Builds the configuration, filling unset values with their defaults.
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            merge: MergeConfig {
                reorder_atoms: self.reorder_atoms.unwrap_or(defaults.merge.reorder_atoms),
                time_step_tolerance: self
                    .time_step_tolerance
                    .unwrap_or(defaults.merge.time_step_tolerance),
                drift_threshold: self
                    .drift_threshold
                    .unwrap_or(defaults.merge.drift_threshold),
            },
            resample: ResampleConfig {
                ninter: self.ninter.unwrap_or(defaults.resample.ninter),
                amplitude: self.amplitude.unwrap_or(defaults.resample.amplitude),
            },
            spectral: SpectralConfig {
                smearing_kelvin: self.smearing_kelvin.or(defaults.spectral.smearing_kelvin),
                smearing_fraction: self
                    .smearing_fraction
                    .unwrap_or(defaults.spectral.smearing_fraction),
            },
            thermo: ThermoConfig {
                omega_max_thz: self.omega_max_thz.or(defaults.thermo.omega_max_thz),
                temperature_points: self
                    .temperature_points
                    .unwrap_or(defaults.thermo.temperature_points),
                sweep_factor: self.sweep_factor.unwrap_or(defaults.thermo.sweep_factor),
            },
        };
        config.validate()?;
        Ok(config)
    }
}
