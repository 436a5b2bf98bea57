//! Downlink MAC control elements (TS 38.321 Section 6.1.3)
//!
//! Catalogue of the DL-SCH MAC CEs the scheduler multiplexes, their LCIDs
//! (TS 38.321 Table 6.2.1-1) and payload sizes, plus the subPDU descriptor
//! handed to the transport-block builder.

use std::fmt;

use macsched_common::{mac_sdu_required_bytes, Lcid, FIXED_SIZED_MAC_CE_SUBHEADER_SIZE};
use serde::{Deserialize, Serialize};

/// Size of the UE Contention Resolution Identity payload.
pub const UE_CON_RES_ID_LEN: usize = 6;

/// DL-SCH MAC CE type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacCeType {
    /// Duplication Activation/Deactivation
    DuplicationActivation,
    /// SCell Activation/Deactivation, four octets
    SCellActivation4Octet,
    /// SCell Activation/Deactivation, one octet
    SCellActivation1Octet,
    /// Long DRX Command
    LongDrxCmd,
    /// DRX Command
    DrxCmd,
    /// Timing Advance Command
    TaCmd,
    /// UE Contention Resolution Identity
    ConResId,
}

impl MacCeType {
    /// Every CE type, in LCID order
    pub const ALL: [MacCeType; 7] = [
        MacCeType::DuplicationActivation,
        MacCeType::SCellActivation4Octet,
        MacCeType::SCellActivation1Octet,
        MacCeType::LongDrxCmd,
        MacCeType::DrxCmd,
        MacCeType::TaCmd,
        MacCeType::ConResId,
    ];

    /// DL-SCH LCID of the CE
    pub const fn lcid(self) -> u8 {
        match self {
            MacCeType::DuplicationActivation => 56,
            MacCeType::SCellActivation4Octet => 57,
            MacCeType::SCellActivation1Octet => 58,
            MacCeType::LongDrxCmd => 59,
            MacCeType::DrxCmd => 60,
            MacCeType::TaCmd => 61,
            MacCeType::ConResId => 62,
        }
    }

    /// Looks a CE type up by DL-SCH LCID.
    pub fn from_lcid(lcid: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ce| ce.lcid() == lcid)
    }

    /// Payload size in bytes
    pub const fn size(self) -> u32 {
        match self {
            MacCeType::DuplicationActivation => 1,
            MacCeType::SCellActivation4Octet => 4,
            MacCeType::SCellActivation1Octet => 1,
            MacCeType::LongDrxCmd | MacCeType::DrxCmd => 0,
            MacCeType::TaCmd => 1,
            MacCeType::ConResId => UE_CON_RES_ID_LEN as u32,
        }
    }

    /// Bytes the CE occupies in a transport block, subheader included.
    ///
    /// All supported DL CEs are fixed-size.
    pub const fn required_bytes(self) -> u32 {
        self.size() + FIXED_SIZED_MAC_CE_SUBHEADER_SIZE
    }
}

impl fmt::Display for MacCeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MacCeType::DuplicationActivation => "DUP_ACT",
            MacCeType::SCellActivation4Octet => "SCELL_ACT_4_OCTET",
            MacCeType::SCellActivation1Octet => "SCELL_ACT_1_OCTET",
            MacCeType::LongDrxCmd => "LONG_DRX_CMD",
            MacCeType::DrxCmd => "DRX_CMD",
            MacCeType::TaCmd => "TA_CMD",
            MacCeType::ConResId => "CON_RES_ID",
        };
        f.write_str(name)
    }
}

/// Payload of a DL MAC CE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacCePayload {
    /// No payload (DRX commands)
    Empty,
    /// Timing Advance Command
    TaCmd {
        /// Timing Advance Group
        tag_id: u8,
        /// 6-bit timing advance command
        ta_cmd: u8,
    },
    /// UE Contention Resolution Identity (first 48 bits of the CCCH SDU)
    ConResId([u8; UE_CON_RES_ID_LEN]),
    /// SCell activation bitmap
    SCellActivation(u32),
    /// DRB duplication activation bitmap
    Duplication(u8),
}

/// A MAC CE indication: a CE type and its latest payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacCeInfo {
    /// CE type
    pub ce_type: MacCeType,
    /// Payload
    pub payload: MacCePayload,
}

impl MacCeInfo {
    /// Timing Advance Command CE
    pub fn ta_cmd(tag_id: u8, ta_cmd: u8) -> Self {
        Self {
            ce_type: MacCeType::TaCmd,
            payload: MacCePayload::TaCmd { tag_id, ta_cmd },
        }
    }

    /// UE Contention Resolution Identity CE
    pub fn con_res_id(id: [u8; UE_CON_RES_ID_LEN]) -> Self {
        Self {
            ce_type: MacCeType::ConResId,
            payload: MacCePayload::ConResId(id),
        }
    }

    /// DRX Command CE
    pub fn drx_cmd() -> Self {
        Self {
            ce_type: MacCeType::DrxCmd,
            payload: MacCePayload::Empty,
        }
    }

    /// Long DRX Command CE
    pub fn long_drx_cmd() -> Self {
        Self {
            ce_type: MacCeType::LongDrxCmd,
            payload: MacCePayload::Empty,
        }
    }

    /// SCell Activation/Deactivation CE. The 4-octet format is used when
    /// any SCell index above 7 is addressed.
    pub fn scell_activation(bitmap: u32) -> Self {
        let ce_type = if bitmap > 0xff {
            MacCeType::SCellActivation4Octet
        } else {
            MacCeType::SCellActivation1Octet
        };
        Self {
            ce_type,
            payload: MacCePayload::SCellActivation(bitmap),
        }
    }

    /// Duplication Activation/Deactivation CE
    pub fn duplication(bitmap: u8) -> Self {
        Self {
            ce_type: MacCeType::DuplicationActivation,
            payload: MacCePayload::Duplication(bitmap),
        }
    }

    /// Returns true if the payload variant matches the CE type.
    pub fn is_consistent(&self) -> bool {
        matches!(
            (self.ce_type, self.payload),
            (MacCeType::TaCmd, MacCePayload::TaCmd { .. })
                | (MacCeType::ConResId, MacCePayload::ConResId(_))
                | (MacCeType::DrxCmd | MacCeType::LongDrxCmd, MacCePayload::Empty)
                | (MacCeType::SCellActivation1Octet, MacCePayload::SCellActivation(0..=0xff))
                | (MacCeType::SCellActivation4Octet, MacCePayload::SCellActivation(_))
                | (MacCeType::DuplicationActivation, MacCePayload::Duplication(_))
        )
    }
}

/// LCID field of a DL-SCH subPDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DlSchLcid {
    /// MAC SDU of a logical channel
    Sdu(Lcid),
    /// MAC CE
    Ce(MacCeType),
}

impl DlSchLcid {
    /// Raw 6-bit LCID value
    pub const fn value(self) -> u8 {
        match self {
            DlSchLcid::Sdu(lcid) => lcid.value(),
            DlSchLcid::Ce(ce) => ce.lcid(),
        }
    }
}

/// Descriptor of one scheduled DL subPDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlMsgLcInfo {
    /// Logical channel or CE carried
    pub lcid: DlSchLcid,
    /// Scheduled payload bytes, subheader excluded
    pub sched_bytes: u32,
    /// CE payload, set for CE subPDUs only
    pub ce_payload: Option<MacCePayload>,
}

impl DlMsgLcInfo {
    /// Bytes the subPDU takes in the transport block, subheader included.
    pub fn subpdu_bytes(&self) -> u32 {
        match self.lcid {
            DlSchLcid::Sdu(_) => mac_sdu_required_bytes(self.sched_bytes),
            DlSchLcid::Ce(ce) => ce.required_bytes(),
        }
    }
}
