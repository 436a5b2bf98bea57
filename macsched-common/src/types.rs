//! Core MAC scheduler identifiers: LCID, LCG-ID, RAN slice, DU UE/cell index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of UEs a DU cell can hold.
pub const MAX_NOF_DU_UES: usize = 1024;

/// Maximum number of cells a DU can serve.
pub const MAX_NOF_DU_CELLS: usize = 16;

/// Maximum number of RAN slices tracked per cell.
pub const MAX_NOF_RAN_SLICES: usize = 16;

/// Logical Channel Identifier (TS 38.321 Table 6.2.1-1, values 0-32).
///
/// LCIDs 0-3 are reserved for signalling radio bearers; data radio bearers
/// start at 4.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lcid(u8);

impl Lcid {
    /// SRB0, carried on CCCH
    pub const SRB0: Lcid = Lcid(0);
    /// SRB1
    pub const SRB1: Lcid = Lcid(1);
    /// SRB2
    pub const SRB2: Lcid = Lcid(2);
    /// SRB3
    pub const SRB3: Lcid = Lcid(3);
    /// First LCID usable by a DRB
    pub const MIN_DRB: Lcid = Lcid(4);
    /// Highest LCID addressable by a MAC SDU subheader
    pub const MAX: Lcid = Lcid(32);

    /// Number of distinct LCID values.
    pub const MAX_NOF_LCIDS: usize = 33;

    /// Creates an LCID, returning `None` if outside 0-32.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Creates the LCID for the given DRB index, counting from LCID 4.
    /// Returns `None` past LCID 32.
    pub const fn drb(drb_index: u8) -> Option<Self> {
        if drb_index <= Self::MAX.0 - Self::MIN_DRB.0 {
            Some(Self(Self::MIN_DRB.0 + drb_index))
        } else {
            None
        }
    }

    /// Returns the raw value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns the value as a table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true for SRB0-SRB3
    pub const fn is_srb(self) -> bool {
        self.0 < Self::MIN_DRB.0
    }

    /// Returns true for DRB LCIDs
    pub const fn is_drb(self) -> bool {
        !self.is_srb()
    }
}

impl fmt::Debug for Lcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lcid({})", self.0)
    }
}

impl fmt::Display for Lcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_srb() {
            write!(f, "SRB{}", self.0)
        } else {
            write!(f, "LCID{}", self.0)
        }
    }
}

impl TryFrom<u8> for Lcid {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl From<Lcid> for u8 {
    fn from(lcid: Lcid) -> u8 {
        lcid.0
    }
}

/// Logical Channel Group identifier (0-7).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LcgId(u8);

impl LcgId {
    /// Highest valid LCG-ID
    pub const MAX: LcgId = LcgId(7);

    /// Number of distinct LCG-ID values.
    pub const MAX_NOF_LCGS: usize = 8;

    /// Creates an LCG-ID, returning `None` if outside 0-7.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the raw value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns the value as a table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterates all valid LCG-IDs in ascending order.
    pub fn all() -> impl Iterator<Item = LcgId> {
        (0..=Self::MAX.0).map(LcgId)
    }
}

impl fmt::Debug for LcgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LcgId({})", self.0)
    }
}

impl fmt::Display for LcgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LCG{}", self.0)
    }
}

impl TryFrom<u8> for LcgId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl From<LcgId> for u8 {
    fn from(lcg_id: LcgId) -> u8 {
        lcg_id.0
    }
}

/// RAN slice identifier, local to a cell.
///
/// Slice 0 is reserved for signalling radio bearers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RanSliceId(pub u8);

impl RanSliceId {
    /// Returns the raw value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns the value as a table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Slice to which SRB traffic and unattributed MAC CEs are billed.
pub const SRB_RAN_SLICE_ID: RanSliceId = RanSliceId(0);

impl fmt::Debug for RanSliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RanSliceId({})", self.0)
    }
}

impl fmt::Display for RanSliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slice{}", self.0)
    }
}

/// Index of a UE within a DU.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuUeIndex(pub u16);

impl DuUeIndex {
    /// Returns the value as a table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DuUeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DuUeIndex({})", self.0)
    }
}

impl fmt::Display for DuUeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ue={}", self.0)
    }
}

/// Index of a cell within a DU.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuCellIndex(pub u8);

impl DuCellIndex {
    /// Returns the value as a table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DuCellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DuCellIndex({})", self.0)
    }
}

impl fmt::Display for DuCellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell={}", self.0)
    }
}

/// NR subcarrier spacing (numerology).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubcarrierSpacing {
    /// 15 kHz, numerology 0
    #[serde(rename = "15khz")]
    Khz15,
    /// 30 kHz, numerology 1
    #[default]
    #[serde(rename = "30khz")]
    Khz30,
    /// 60 kHz, numerology 2
    #[serde(rename = "60khz")]
    Khz60,
    /// 120 kHz, numerology 3
    #[serde(rename = "120khz")]
    Khz120,
    /// 240 kHz, numerology 4
    #[serde(rename = "240khz")]
    Khz240,
}

impl SubcarrierSpacing {
    /// Returns the numerology index (mu)
    pub const fn numerology(self) -> u8 {
        match self {
            SubcarrierSpacing::Khz15 => 0,
            SubcarrierSpacing::Khz30 => 1,
            SubcarrierSpacing::Khz60 => 2,
            SubcarrierSpacing::Khz120 => 3,
            SubcarrierSpacing::Khz240 => 4,
        }
    }

    /// Returns the number of slots in a 1 ms subframe
    pub const fn slots_per_subframe(self) -> u32 {
        1 << self.numerology()
    }

    /// Returns the number of slots per second
    pub const fn slots_per_second(self) -> u32 {
        self.slots_per_subframe() * 1000
    }
}

impl fmt::Display for SubcarrierSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}kHz", 15u32 << self.numerology())
    }
}
