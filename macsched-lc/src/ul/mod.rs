//! Uplink logical-channel accounting: BSR decoding and per-LCG estimates.

pub mod bsr;
pub mod manager;

pub use bsr::{
    buffer_size_index_to_bytes, BsrFormat, BsrReport, UlBsrIndication, LONG_BSR_MAX_BYTES,
    LONG_BSR_SATURATED_INDEX, SHORT_BSR_MAX_BYTES, SHORT_BSR_SATURATED_INDEX,
};
pub use manager::{ul_pending_bytes_estimate, UlLogicalChannelManager, RLC_HEADER_MARGIN};
