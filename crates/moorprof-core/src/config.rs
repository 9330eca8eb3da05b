// crates/moorprof-core/src/config.rs

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which current-meter transform variant applies. Selecting the wrong layout
/// would corrupt the whole run, so an unrecognized tag fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilerType {
    Coastal,
    Global,
}

impl ProfilerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfilerType::Coastal => "coastal",
            ProfilerType::Global => "global",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinConfig {
    pub width_dbar: f64,
    pub min_dbar: f64,
    pub max_dbar: f64,
    #[serde(default = "default_bin_min_samples")]
    pub min_samples: usize,
}

fn default_bin_min_samples() -> usize {
    1
}

impl BinConfig {
    /// Number of bin centers on the grid `min..=max` step `width`.
    pub fn bin_count(&self) -> usize {
        ((self.max_dbar - self.min_dbar) / self.width_dbar).floor() as usize + 1
    }
}

/// Per-instrument acquisition and rejection parameters. Thresholds default to
/// the -1 sentinel, which no real count or range falls below, i.e. disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    pub sample_rate_hz: f64,
    #[serde(default)]
    pub depth_offset_dbar: f64,
    #[serde(default = "default_disabled_count")]
    pub min_points: i64,
    #[serde(default = "default_disabled_range")]
    pub min_range: f64,
    pub bin: BinConfig,
}

fn default_disabled_count() -> i64 {
    -1
}

fn default_disabled_range() -> f64 {
    -1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentMeterConfig {
    #[serde(flatten)]
    pub instrument: InstrumentConfig,
    pub wag_radius_m: f64,
    #[serde(default)]
    pub correct_vel_y_for_wag: bool,
    #[serde(default)]
    pub correct_vel_u_for_dpdt: bool,
    #[serde(default)]
    pub correct_vel_xyz_for_pitch_and_roll: bool,
    #[serde(default)]
    pub correct_vel_beam_for_phase_ambiguity: bool,
    #[serde(default = "default_phase_ambiguity")]
    pub phase_ambiguity_velocity_m_s: f64,
}

fn default_phase_ambiguity() -> f64 {
    1.8
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentInfo {
    pub id: String,
    pub profile_count: u32,
    pub profiler_type: ProfilerType,
    #[serde(default)]
    pub magnetic_declination_deg: f64,
}

/// Read-only deployment configuration. Constructed once, then shared freely
/// across profile processing.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    pub deployment: DeploymentInfo,
    pub ctd: InstrumentConfig,
    pub engineering: InstrumentConfig,
    pub current_meter: CurrentMeterConfig,
}

impl DeploymentConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DeploymentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment.profile_count == 0 {
            return Err(ConfigError::Invalid(
                "deployment.profile_count must be at least 1".to_string(),
            ));
        }
        for (name, instrument) in [
            ("ctd", &self.ctd),
            ("engineering", &self.engineering),
            ("current_meter", &self.current_meter.instrument),
        ] {
            if instrument.sample_rate_hz <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.sample_rate_hz must be positive"
                )));
            }
            let bin = &instrument.bin;
            if bin.width_dbar <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.bin.width_dbar must be positive"
                )));
            }
            if bin.min_dbar >= bin.max_dbar {
                return Err(ConfigError::Invalid(format!(
                    "{name}.bin.min_dbar must be below {name}.bin.max_dbar"
                )));
            }
        }
        if self.current_meter.wag_radius_m < 0.0 {
            return Err(ConfigError::Invalid(
                "current_meter.wag_radius_m must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
