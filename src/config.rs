use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Environment variable naming a TOML file read by [`AnalyzerConfig::from_env()`].
pub const CONFIG_ENV_VAR: &str = "SPEECH_PITCH_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parameters of the f0 extraction.
///
/// Every field is optional in the TOML form and falls back to its default.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// spacing between adjacent f0 estimates in milliseconds. (default: `5.0`)
    pub frame_period_ms: f64,

    /// lowest f0 searched in Hz. (default: `71.0`)
    pub f0_floor: f64,

    /// highest f0 searched in Hz. Clamped to the Nyquist frequency of each file. (default: `800.0`)
    pub f0_ceil: f64,

    /// analysis frame length in milliseconds. (default: `80.0`)
    pub frame_length_ms: f64,

    /// resolution of the pitch bins in semitones, `0` < `resolution` < `1`. (default: `0.1`)
    pub resolution: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            frame_period_ms: 5.0,
            f0_floor: 71.0,
            f0_ceil: 800.0,
            frame_length_ms: 80.0,
            resolution: 0.1,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Loads the file named by `SPEECH_PITCH_CONFIG`, or the defaults if it is unset or broken.
    pub fn from_env() -> Self {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_toml_file(&path).unwrap_or_else(|e| {
                warn!(path = ?path, error = %e, "falling back to default analyzer config");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.frame_period_ms > 0.) {
            return Err(ConfigError::Invalid(format!(
                "frame_period_ms must be positive, got {}",
                self.frame_period_ms
            )));
        }
        if !(0. < self.f0_floor && self.f0_floor < self.f0_ceil) {
            return Err(ConfigError::Invalid(format!(
                "0 < f0_floor < f0_ceil should be satisfied, got f0_floor={} f0_ceil={}",
                self.f0_floor, self.f0_ceil
            )));
        }
        if !(self.frame_length_ms > 0.) {
            return Err(ConfigError::Invalid(format!(
                "frame_length_ms must be positive, got {}",
                self.frame_length_ms
            )));
        }
        if !(0. < self.resolution && self.resolution < 1.) {
            return Err(ConfigError::Invalid(format!(
                "resolution should be in (0, 1), got {}",
                self.resolution
            )));
        }
        Ok(())
    }

    /// Converts a duration in milliseconds to samples at `sr`.
    pub(crate) fn ms_to_samples(sr: u32, ms: f64) -> usize {
        (sr as f64 * ms / 1000.).round() as usize
    }
}
