//! Error types for configuration pools

use macsched_common::{DuCellIndex, LcgId, Lcid};
use thiserror::Error;

/// Configuration errors.
///
/// These are raised while (re)configuring a cell or UE. They indicate a
/// malformed upstream configuration and are fatal for the request that
/// carried them; the per-slot hot path never sees them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The same LCID appears twice in a logical-channel set
    #[error("Duplicate logical channel {lcid}")]
    DuplicateLcid {
        /// Offending LCID
        lcid: Lcid,
    },

    /// Logical-channel priority outside 1-16
    #[error("Invalid priority {priority} for logical channel {lcid}")]
    InvalidPriority {
        /// Offending LCID
        lcid: Lcid,
        /// Configured priority
        priority: u8,
    },

    /// A GBR descriptor that cannot be tracked
    #[error("Invalid QoS for logical channel {lcid}: {reason}")]
    InvalidQos {
        /// Offending LCID
        lcid: Lcid,
        /// Reason
        reason: String,
    },

    /// SRB0 must live in LCG 0
    #[error("SRB0 mapped to {lcg_id}, expected LCG0")]
    InvalidSrb0Group {
        /// Configured group
        lcg_id: LcgId,
    },

    /// A cell index was configured twice
    #[error("Cell {cell_index} already configured")]
    DuplicateCell {
        /// Offending cell
        cell_index: DuCellIndex,
    },

    /// A cell index outside the DU's cell table or not configured
    #[error("Unknown cell {cell_index}")]
    UnknownCell {
        /// Offending cell
        cell_index: DuCellIndex,
    },

    /// CORESET configuration error
    #[error("Invalid CORESET {coreset_id}: {reason}")]
    InvalidCoreset {
        /// CORESET ID
        coreset_id: u8,
        /// Reason
        reason: String,
    },

    /// Search space configuration error
    #[error("Invalid search space {search_space_id}: {reason}")]
    InvalidSearchSpace {
        /// Search space ID
        search_space_id: u8,
        /// Reason
        reason: String,
    },

    /// BWP configuration error
    #[error("Invalid BWP: {0}")]
    InvalidBwp(String),

    /// A UE without a primary cell
    #[error("UE configuration has no serving cell")]
    NoServingCell,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
