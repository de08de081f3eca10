//! Configuration management for Chargeguard
//!
//! This module handles loading, validation, and management of the controller
//! configuration from YAML files. Configuration is read once at construction;
//! changing it means building a new controller.

use crate::dispatch::DispatchPolicy;
use crate::error::{ChargeGuardError, Result};
use crate::phase::{MAX_SAMPLE_CAPACITY, PhaseId};
use crate::sensor::SensorRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Phases, sensors and fuse rating
    pub controller: ControllerConfig,

    /// Sampling cadence and filter sizing
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Command throttling
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Status HTTP server
    #[serde(default)]
    pub web: WebConfig,
}

/// What is balanced and against which limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Display name of the controller
    #[serde(default = "default_name")]
    pub name: String,

    /// Phase to external current sensor mapping (1 to 3 entries)
    pub phases: BTreeMap<PhaseId, SensorRef>,

    /// Mains fuse rating in amperes. When set, the ceiling is the lower of
    /// this value and the charger's reported circuit rating.
    #[serde(default)]
    pub rated_current: Option<f64>,
}

fn default_name() -> String {
    "Charge controller".to_string()
}

/// Sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Tick period in milliseconds
    pub interval_ms: u64,

    /// Samples kept per phase
    pub buffer_capacity: usize,

    /// Samples averaged for the other-load estimate
    pub filter_window: usize,
}

/// Dispatch throttling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Resend unchanged limits after this many seconds
    pub reaffirm_interval_secs: u64,

    /// Charger-side TTL after which it falls back to its own default limit
    pub charger_ttl_secs: u64,

    /// Minimum per-phase increase (A) that counts as a new command.
    /// Decreases are always sent.
    pub min_change_amps: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional override for console output
    pub console_level: Option<String>,

    /// Optional override for the log file
    pub file_level: Option<String>,

    /// Path to log file (its directory is used for daily rotation)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the status API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "chargeguard.yaml",
            "/data/chargeguard.yaml",
            "/etc/chargeguard/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Load from an explicit path, or from the default locations
    pub fn load_with_override<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::load(),
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Tick period
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sampling.interval_ms)
    }

    /// Dispatch policy derived from the dispatch section
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy::new(
            tokio::time::Duration::from_secs(self.dispatch.reaffirm_interval_secs),
            self.dispatch.min_change_amps,
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.controller.phases.is_empty() {
            return Err(ChargeGuardError::NoSensors);
        }

        for (phase, sensor) in &self.controller.phases {
            if sensor.as_str().trim().is_empty() {
                return Err(ChargeGuardError::validation(
                    format!("controller.phases.{}", phase),
                    "Sensor reference cannot be empty".to_string(),
                ));
            }
        }

        if let Some(rated) = self.controller.rated_current
            && !(rated.is_finite() && rated > 0.0)
        {
            return Err(ChargeGuardError::validation(
                "controller.rated_current",
                "Must be positive",
            ));
        }

        if self.sampling.interval_ms == 0 {
            return Err(ChargeGuardError::validation(
                "sampling.interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.sampling.buffer_capacity == 0
            || self.sampling.buffer_capacity > MAX_SAMPLE_CAPACITY
        {
            return Err(ChargeGuardError::validation(
                "sampling.buffer_capacity".to_string(),
                format!("Must be between 1 and {}", MAX_SAMPLE_CAPACITY),
            ));
        }

        if self.sampling.filter_window == 0
            || self.sampling.filter_window > self.sampling.buffer_capacity
        {
            return Err(ChargeGuardError::validation(
                "sampling.filter_window",
                "Must be between 1 and sampling.buffer_capacity",
            ));
        }

        if self.dispatch.reaffirm_interval_secs == 0 {
            return Err(ChargeGuardError::validation(
                "dispatch.reaffirm_interval_secs",
                "Must be greater than 0",
            ));
        }

        if self.dispatch.reaffirm_interval_secs >= self.dispatch.charger_ttl_secs {
            return Err(ChargeGuardError::validation(
                "dispatch.reaffirm_interval_secs",
                "Must be shorter than dispatch.charger_ttl_secs",
            ));
        }

        if !(self.dispatch.min_change_amps.is_finite() && self.dispatch.min_change_amps >= 0.0) {
            return Err(ChargeGuardError::validation(
                "dispatch.min_change_amps",
                "Must be zero or positive",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(ChargeGuardError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)?;

        Ok(())
    }
}
