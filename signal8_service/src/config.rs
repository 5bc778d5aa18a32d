//! Classifier configuration.
//!
//! Thresholds default to the published Signal 8 criteria (63 km/h mean wind
//! at 4 of the 8 reference stations for 30 minutes) and can be overridden by
//! a TOML file and then by environment variables, in that order.
//!
//! ```toml
//! wind_threshold_kmh = 63.0
//! min_station_count = 4
//! min_persistence_intervals = 3
//! interval_minutes = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::stations::REFERENCE_STATION_COUNT;

/// Points at a TOML configuration file.
pub const ENV_CONFIG_PATH: &str = "SIGNAL8_CONFIG";
pub const ENV_WIND_THRESHOLD: &str = "SIGNAL8_WIND_THRESHOLD_KMH";
pub const ENV_MIN_STATIONS: &str = "SIGNAL8_MIN_STATIONS";
pub const ENV_MIN_PERSISTENCE: &str = "SIGNAL8_MIN_PERSISTENCE_INTERVALS";
pub const ENV_INTERVAL_MINUTES: &str = "SIGNAL8_INTERVAL_MINUTES";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A station meets the threshold when its 10-minute mean is at least this (km/h).
    pub wind_threshold_kmh: f64,
    /// Stations that must meet the threshold for an interval to qualify.
    pub min_station_count: usize,
    /// Consecutive qualifying intervals needed for Tier 1.
    pub min_persistence_intervals: usize,
    /// Width of one observation interval.
    pub interval_minutes: i64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            wind_threshold_kmh: 63.0,
            min_station_count: 4,
            min_persistence_intervals: 3,
            interval_minutes: 10,
        }
    }
}

impl ClassifierConfig {
    /// Minimum Tier 1 duration, e.g. 30 minutes with the defaults.
    pub fn min_persistence_minutes(&self) -> i64 {
        self.min_persistence_intervals as i64 * self.interval_minutes
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.wind_threshold_kmh.is_finite() || self.wind_threshold_kmh <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "wind_threshold_kmh must be positive, got {}",
                self.wind_threshold_kmh
            )));
        }
        if self.min_station_count == 0 || self.min_station_count > REFERENCE_STATION_COUNT {
            return Err(ConfigError::Invalid(format!(
                "min_station_count must be within 1..={}, got {}",
                REFERENCE_STATION_COUNT, self.min_station_count
            )));
        }
        if self.min_persistence_intervals == 0 {
            return Err(ConfigError::Invalid(
                "min_persistence_intervals must be at least 1".to_string(),
            ));
        }
        if self.interval_minutes <= 0 {
            return Err(ConfigError::Invalid(format!(
                "interval_minutes must be positive, got {}",
                self.interval_minutes
            )));
        }
        Ok(())
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Applies overrides from a key lookup, normally `std::env::var`.
    ///
    /// Taking the lookup as a parameter keeps this deterministic in tests
    /// without touching the process environment.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_WIND_THRESHOLD) {
            self.wind_threshold_kmh = parse_override(ENV_WIND_THRESHOLD, &v)?;
        }
        if let Some(v) = lookup(ENV_MIN_STATIONS) {
            self.min_station_count = parse_override(ENV_MIN_STATIONS, &v)?;
        }
        if let Some(v) = lookup(ENV_MIN_PERSISTENCE) {
            self.min_persistence_intervals = parse_override(ENV_MIN_PERSISTENCE, &v)?;
        }
        if let Some(v) = lookup(ENV_INTERVAL_MINUTES) {
            self.interval_minutes = parse_override(ENV_INTERVAL_MINUTES, &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Full resolution: defaults, then the TOML file (explicit path, else
    /// `SIGNAL8_CONFIG`), then environment overrides. A `.env` file in the
    /// working directory is loaded first if present.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path: Option<PathBuf> = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from));

        let base = match path {
            Some(p) => Self::load_from_file(&p)?,
            None => Self::default(),
        };
        base.apply_overrides(|key| std::env::var(key).ok())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has unparseable value '{}'", key, value)))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io(PathBuf, String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, msg) => {
                write!(f, "Failed to read config {}: {}", path.display(), msg)
            }
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
