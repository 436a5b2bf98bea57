//! Logical-channel accounting for the MAC scheduler
//!
//! Answers, per UE and per slot, how many bytes are pending and what goes
//! into a transport block of a given size:
//!
//! - [`dl`]: RLC buffer state, MAC CE queue, RAN-slice attribution, GBR
//!   bit-rate tracking and subPDU allocation
//! - [`ul`]: per-LCG estimates driven by BSR and SR indications
//!
//! State is partitioned per cell and per UE and is only touched from the
//! cell's slot context, so nothing here locks.

pub mod dl;
pub mod error;
pub mod ul;

pub use dl::{
    DlLogicalChannelManager, DlLogicalChannelSystem, DlMsgLcInfo, DlSchLcid, MacCeInfo,
    MacCePayload, MacCeType,
};
pub use error::{LcError, LcResult};
pub use ul::{BsrFormat, BsrReport, UlBsrIndication, UlLogicalChannelManager};
