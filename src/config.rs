use chrono::Duration;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use thiserror::Error;

use crate::geometry::{ConeStrategy, PointingOffset};
use crate::predict::{FailurePolicy, GeoLocation, PredictError, ScanOptions, DEFAULT_STEP};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<PredictError> for ConfigError {
    fn from(err: PredictError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    #[serde(default)]
    pub aperture: Option<ApertureConfig>,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    #[serde(default = "default_tle_folder")]
    pub tle_folder: PathBuf,
    #[serde(default = "default_min_elevation")]
    pub default_min_elevation: f64,
    #[serde(default = "default_step", deserialize_with = "deserialize_duration")]
    pub step: Duration,
    #[serde(default = "default_horizon", deserialize_with = "deserialize_duration")]
    pub horizon: Duration,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            tle_folder: default_tle_folder(),
            default_min_elevation: default_min_elevation(),
            step: default_step(),
            horizon: default_horizon(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PredictConfig {
    pub fn horizon_hours(&self) -> f64 {
        self.horizon.num_milliseconds() as f64 / 3_600_000.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApertureConfig {
    pub azimuth_deg: Option<f64>,
    pub elevation_deg: Option<f64>,
    pub half_angle_deg: f64,
    #[serde(default)]
    pub strategy: ConeStrategy,
}

impl ApertureConfig {
    /// Pointing offset, or `None` for the zenith. Azimuth and elevation must
    /// be given together.
    pub fn offset(&self) -> Result<Option<PointingOffset>, ConfigError> {
        match (self.azimuth_deg, self.elevation_deg) {
            (Some(azimuth_deg), Some(elevation_deg)) => Ok(Some(PointingOffset {
                azimuth_deg,
                elevation_deg,
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::Invalid(
                "aperture needs both azimuth_deg and elevation_deg, or neither".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_tle_folder() -> PathBuf {
    PathBuf::from("tle")
}

fn default_min_elevation() -> f64 {
    10.0
}

fn default_step() -> Duration {
    DEFAULT_STEP
}

fn default_horizon() -> Duration {
    Duration::hours(24)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim())
        .map_err(serde::de::Error::custom)
        .and_then(|d| Duration::from_std(d).map_err(serde::de::Error::custom))
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn observer(&self) -> Result<GeoLocation, ConfigError> {
        let mut observer =
            GeoLocation::from_coordinates(&self.station.coordinates, Some(self.station.altitude_m))
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "invalid station coordinates: {}",
                        self.station.coordinates
                    ))
                })?;
        if let Some(accuracy_m) = self.station.accuracy_m {
            observer = observer.with_accuracy(accuracy_m);
        }
        observer.validate()?;
        Ok(observer)
    }

    /// Scan options from the `predict` and `aperture` sections.
    pub fn scan_options(&self, observer: &GeoLocation) -> Result<ScanOptions, ConfigError> {
        let mut options = ScanOptions::default()
            .with_min_elevation(self.predict.default_min_elevation)
            .with_step(self.predict.step)
            .with_failure_policy(self.predict.failure_policy);
        if let Some(aperture) = &self.aperture {
            let cone = observer.aperture(aperture.offset()?, aperture.half_angle_deg)?;
            options = options.with_aperture(cone, aperture.strategy);
        }
        options.validate()?;
        Ok(options)
    }
}
