//! Downlink logical-channel accounting
//!
//! - [`mac_ce`]: DL MAC CE catalogue and subPDU descriptors
//! - [`bit_rate`]: GBR bit-rate windows
//! - [`manager`]: per-UE buffer state, CE queue, slices and TB allocation
//! - [`system`]: per-cell UE table

pub mod bit_rate;
pub mod mac_ce;
pub mod manager;
pub mod system;

pub use bit_rate::{BitRateSettings, BitRateTracker};
pub use mac_ce::{DlMsgLcInfo, DlSchLcid, MacCeInfo, MacCePayload, MacCeType, UE_CON_RES_ID_LEN};
pub use manager::{DlLogicalChannelManager, RLC_SEGMENTATION_OVERHEAD};
pub use system::DlLogicalChannelSystem;
