//! Configuration pools for the MAC scheduler
//!
//! Cell, BWP and logical-channel configuration objects are interned in
//! append-only pools and handed to the scheduler as [`ConfigPtr`] handles.
//! Identical configurations share storage and compare equal in O(1).

pub mod cell_config;
pub mod config_pool;
pub mod du_cell_group_config_pool;
pub mod error;
pub mod lc_config;

pub use cell_config::{
    BwpConfiguration, BwpDownlinkCommon, BwpDownlinkDedicated, BwpUplinkCommon,
    BwpUplinkDedicated, CellConfigRequest, CoresetConfiguration, CrbInterval, CyclicPrefix,
    McsTable, PdcchConfig, PdcchConfigCommon, PdschConfig, PdschTimeDomainResource, PucchConfig,
    PuschConfig, PuschTimeDomainResource, SearchSpaceConfiguration, SearchSpaceType,
    ServingCellConfig,
};
pub use config_pool::{ConfigObjectPool, ConfigPtr};
pub use du_cell_group_config_pool::{
    CellConfigPtrs, DuCellGroupConfigPool, UeCellConfigPtrs, UeConfigPtrs, UeCreationRequest,
    UeReconfigurationRequest,
};
pub use error::{ConfigError, ConfigResult};
pub use lc_config::{
    GbrQosInfo, LogicalChannelConfig, LogicalChannelConfigList, LogicalChannelConfigPool,
    QosConfig, MAX_LC_PRIORITY,
};
