//! Common types and utilities for macsched
//!
//! This crate provides the identifiers, MAC subPDU sizing rules, scheduler
//! configuration and logging bootstrap shared by the configuration pools and
//! the logical-channel managers.

pub mod config;
pub mod error;
pub mod logging;
pub mod mac_sizes;
pub mod types;

pub use config::{
    load_scheduler_config, load_scheduler_config_from_str, LoggingConfig, SchedulerConfig,
    DEFAULT_GBR_AVERAGING_WINDOW_MS, MAX_GBR_AVERAGING_WINDOW_MS,
};
pub use error::Error;
pub use logging::{cell_span, init_logging, init_logging_with_filter, LogLevel};
pub use mac_sizes::{
    mac_sdu_payload_size, mac_sdu_required_bytes, mac_sdu_subheader_size,
    FIXED_SIZED_MAC_CE_SUBHEADER_SIZE, MAC_SDU_SUBHEADER_LENGTH_THRES,
    MAX_MAC_SDU_SUBHEADER_SIZE, MIN_MAC_SDU_SUBHEADER_SIZE, VARIABLE_SIZED_MAC_CE_SUBHEADER_SIZE,
};
pub use types::*;
