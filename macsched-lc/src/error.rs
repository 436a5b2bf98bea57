//! Error types for the logical-channel system

use macsched_common::DuUeIndex;
use thiserror::Error;

/// Errors raised when admitting UEs into a per-cell logical-channel system.
///
/// Indications, queries and allocations never fail; only UE table
/// management does.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LcError {
    /// The UE is already registered
    #[error("UE {ue_index} already exists")]
    UeAlreadyExists {
        /// UE index
        ue_index: DuUeIndex,
    },

    /// The UE index does not fit the cell's UE table
    #[error("UE {ue_index} exceeds the UE table capacity of {capacity}")]
    UeIndexOutOfRange {
        /// UE index
        ue_index: DuUeIndex,
        /// Table capacity
        capacity: usize,
    },
}

/// Result type for logical-channel system operations
pub type LcResult<T> = Result<T, LcError>;
