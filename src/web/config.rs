use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::camera::CameraConfig;
use crate::orbit::GroundStation;

/// Longest track a caller may request, one day of minutes.
pub const MAX_TRACK_MINUTES: u32 = 1440;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub stations: Vec<StationConfig>,
    pub catalog: Option<CatalogConfig>,
    pub camera: Option<CameraConfig>,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
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
    "0.0.0.0:4000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub tle_folder: PathBuf,
    #[serde(default = "default_track_minutes")]
    pub track_minutes: u32,
    #[serde(
        default = "default_refresh_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub refresh_interval: Duration,
}

fn default_track_minutes() -> u32 {
    crate::orbit::TRACK_MINUTES
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(95 * 60)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: String,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

impl StationConfig {
    pub fn ground_station(&self) -> Option<GroundStation> {
        GroundStation::from_coordinates(&self.coordinates, Some(self.altitude_m))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ControlCamera,
    ReloadCatalog,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for station in &self.stations {
            if station.ground_station().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "station {} has invalid coordinates {:?}",
                    station.name, station.coordinates
                )));
            }
        }
        if let Some(catalog) = &self.catalog {
            if catalog.track_minutes == 0 || catalog.track_minutes > MAX_TRACK_MINUTES {
                return Err(ConfigError::Invalid(format!(
                    "track_minutes must be between 1 and {}",
                    MAX_TRACK_MINUTES
                )));
            }
            if catalog.refresh_interval.is_zero() {
                return Err(ConfigError::Invalid("refresh_interval must be positive".into()));
            }
        }
        Ok(())
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }

    /// A station by name, or the first configured one.
    pub fn station(&self, name: Option<&str>) -> Option<&StationConfig> {
        match name {
            Some(name) => self.stations.iter().find(|s| s.name == name),
            None => self.stations.first(),
        }
    }
}
