//! Scheduler configuration
//!
//! Parameters that shape the logical-channel accounting of a cell. Every
//! field has a default, so an empty YAML document yields a usable
//! configuration.
//!
//! # Example
//!
//! ```
//! use macsched_common::config::load_scheduler_config_from_str;
//! use macsched_common::SubcarrierSpacing;
//!
//! let config = load_scheduler_config_from_str("scs: 15khz\nmax_nof_ues: 64\n").unwrap();
//! assert_eq!(config.scs, SubcarrierSpacing::Khz15);
//! config.validate().unwrap();
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::logging::LogLevel;
use crate::types::{SubcarrierSpacing, MAX_NOF_DU_UES};

/// Default GBR averaging window (TS 23.501 Section 5.7.3.6).
pub const DEFAULT_GBR_AVERAGING_WINDOW_MS: u32 = 2000;

/// Longest GBR averaging window, in milliseconds (TS 38.413 Averaging Window).
pub const MAX_GBR_AVERAGING_WINDOW_MS: u32 = 4095;

/// Logging section of the scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level
    pub level: LogLevel,
    /// Optional `EnvFilter` directive string, takes precedence over `level`
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// Installs the global subscriber described by this section.
    pub fn init(&self) {
        match &self.filter {
            Some(filter) => crate::logging::init_logging_with_filter(filter),
            None => crate::logging::init_logging(self.level),
        }
    }
}

/// Per-cell scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Subcarrier spacing of the cell, fixes the slot duration
    pub scs: SubcarrierSpacing,
    /// Capacity of the per-cell UE table
    pub max_nof_ues: usize,
    /// Averaging window applied to GBR bearers that do not carry one
    pub default_gbr_averaging_window_ms: u32,
    /// Logging setup
    pub logging: LoggingConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scs: SubcarrierSpacing::default(),
            max_nof_ues: MAX_NOF_DU_UES,
            default_gbr_averaging_window_ms: DEFAULT_GBR_AVERAGING_WINDOW_MS,
            logging: LoggingConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Validates value ranges.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_nof_ues == 0 || self.max_nof_ues > MAX_NOF_DU_UES {
            return Err(Error::Config(format!(
                "max_nof_ues must be in 1..={MAX_NOF_DU_UES}, got {}",
                self.max_nof_ues
            )));
        }
        if self.default_gbr_averaging_window_ms == 0
            || self.default_gbr_averaging_window_ms > MAX_GBR_AVERAGING_WINDOW_MS
        {
            return Err(Error::Config(format!(
                "default_gbr_averaging_window_ms must be in 1..={MAX_GBR_AVERAGING_WINDOW_MS}, got {}",
                self.default_gbr_averaging_window_ms
            )));
        }
        Ok(())
    }

    /// Returns the number of slots spanned by `window_ms` milliseconds.
    pub fn window_slots(&self, window_ms: u32) -> u32 {
        window_ms.saturating_mul(self.scs.slots_per_subframe())
    }
}

/// Loads a scheduler configuration from a YAML file.
pub fn load_scheduler_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig, Error> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    load_scheduler_config_from_str(&contents)
}

/// Loads a scheduler configuration from a YAML string.
pub fn load_scheduler_config_from_str(yaml: &str) -> Result<SchedulerConfig, Error> {
    if yaml.trim().is_empty() {
        return Ok(SchedulerConfig::default());
    }
    let config: SchedulerConfig = serde_yaml::from_str(yaml)?;
    Ok(config)
}
