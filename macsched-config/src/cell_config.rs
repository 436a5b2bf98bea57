//! Cell and BWP configuration objects (TS 38.331)
//!
//! The subset of `ServingCellConfigCommon` / `ServingCellConfig` the
//! scheduler consumes: bandwidth parts, CORESETs, search spaces and
//! time-domain resource lists. All types are plain values so they can be
//! interned by [`ConfigObjectPool`](crate::config_pool::ConfigObjectPool).

use macsched_common::{DuCellIndex, SubcarrierSpacing};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Maximum CORESET identifier (TS 38.331 `maxNrofControlResourceSets` - 1).
pub const MAX_CORESET_ID: u8 = 11;

/// Maximum search space identifier (TS 38.331 `maxNrofSearchSpaces` - 1).
pub const MAX_SEARCH_SPACE_ID: u8 = 39;

/// Maximum number of CRBs in a carrier.
pub const MAX_NOF_CRBS: u16 = 275;

/// Number of OFDM symbols in a slot with normal cyclic prefix.
pub const NOF_OFDM_SYMBOLS_PER_SLOT: u8 = 14;

/// Cyclic prefix type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CyclicPrefix {
    /// Normal CP
    #[default]
    Normal,
    /// Extended CP (60 kHz only)
    Extended,
}

/// Contiguous range of common resource blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrbInterval {
    /// First CRB
    pub start: u16,
    /// Number of CRBs
    pub length: u16,
}

impl CrbInterval {
    /// Creates a CRB interval.
    pub const fn new(start: u16, length: u16) -> Self {
        Self { start, length }
    }

    /// One past the last CRB
    pub const fn stop(&self) -> u16 {
        self.start.saturating_add(self.length)
    }
}

/// Generic BWP parameters shared by DL and UL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BwpConfiguration {
    /// Subcarrier spacing
    pub scs: SubcarrierSpacing,
    /// Cyclic prefix
    pub cp: CyclicPrefix,
    /// Location and bandwidth
    pub crbs: CrbInterval,
}

impl BwpConfiguration {
    fn validate(&self) -> ConfigResult<()> {
        if self.crbs.length == 0 || self.crbs.stop() > MAX_NOF_CRBS {
            return Err(ConfigError::InvalidBwp(format!(
                "CRBs [{}, {}) outside carrier",
                self.crbs.start,
                self.crbs.stop()
            )));
        }
        if self.cp == CyclicPrefix::Extended && self.scs != SubcarrierSpacing::Khz60 {
            return Err(ConfigError::InvalidBwp(format!(
                "extended CP not allowed with {}",
                self.scs
            )));
        }
        Ok(())
    }
}

/// CORESET configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoresetConfiguration {
    /// CORESET ID (0-11)
    pub id: u8,
    /// 45-bit frequency-domain bitmap, one bit per group of 6 RBs
    pub freq_domain_resources: u64,
    /// Duration in OFDM symbols (1-3)
    pub duration: u8,
    /// Interleaved CCE-to-REG mapping
    pub interleaved: bool,
    /// PDCCH DMRS scrambling identity
    pub pdcch_dmrs_scrambling_id: Option<u16>,
}

impl CoresetConfiguration {
    fn validate(&self) -> ConfigResult<()> {
        if self.id > MAX_CORESET_ID {
            return Err(ConfigError::InvalidCoreset {
                coreset_id: self.id,
                reason: "identifier out of range".to_string(),
            });
        }
        if !(1..=3).contains(&self.duration) {
            return Err(ConfigError::InvalidCoreset {
                coreset_id: self.id,
                reason: format!("duration {} not in 1..=3", self.duration),
            });
        }
        if self.freq_domain_resources == 0 || self.freq_domain_resources >> 45 != 0 {
            return Err(ConfigError::InvalidCoreset {
                coreset_id: self.id,
                reason: "frequency-domain bitmap must be a non-empty 45-bit value".to_string(),
            });
        }
        Ok(())
    }
}

/// Search space type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchSpaceType {
    /// Common search space (DCI formats 0_0 / 1_0)
    Common,
    /// UE-specific search space
    UeDedicated,
}

/// Search space configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchSpaceConfiguration {
    /// Search space ID (0-39)
    pub id: u8,
    /// CORESET the search space is mapped to
    pub coreset_id: u8,
    /// Common or UE-specific
    pub ss_type: SearchSpaceType,
    /// Monitoring periodicity in slots
    pub monitoring_slot_periodicity: u16,
    /// Monitoring offset in slots
    pub monitoring_slot_offset: u16,
    /// Number of consecutive monitored slots
    pub duration: u16,
    /// PDCCH candidates per aggregation level 1, 2, 4, 8, 16
    pub nof_candidates: [u8; 5],
}

impl SearchSpaceConfiguration {
    fn validate(&self, coresets: &[u8]) -> ConfigResult<()> {
        let invalid = |reason: String| ConfigError::InvalidSearchSpace {
            search_space_id: self.id,
            reason,
        };
        if self.id > MAX_SEARCH_SPACE_ID {
            return Err(invalid("identifier out of range".to_string()));
        }
        if !coresets.contains(&self.coreset_id) {
            return Err(invalid(format!("unknown CORESET {}", self.coreset_id)));
        }
        if self.monitoring_slot_periodicity == 0
            || self.monitoring_slot_offset >= self.monitoring_slot_periodicity
        {
            return Err(invalid(format!(
                "offset {} not within periodicity {}",
                self.monitoring_slot_offset, self.monitoring_slot_periodicity
            )));
        }
        if self.duration == 0 || self.duration > self.monitoring_slot_periodicity {
            return Err(invalid(format!("duration {}", self.duration)));
        }
        if self.nof_candidates.iter().all(|&n| n == 0) {
            return Err(invalid("no PDCCH candidates".to_string()));
        }
        Ok(())
    }
}

fn validate_pdcch(
    coresets: &[CoresetConfiguration],
    search_spaces: &[SearchSpaceConfiguration],
    extra_coresets: &[u8],
) -> ConfigResult<()> {
    let mut ids: Vec<u8> = extra_coresets.to_vec();
    for cs in coresets {
        cs.validate()?;
        if ids.contains(&cs.id) {
            return Err(ConfigError::InvalidCoreset {
                coreset_id: cs.id,
                reason: "duplicate identifier".to_string(),
            });
        }
        ids.push(cs.id);
    }
    let mut ss_ids = Vec::with_capacity(search_spaces.len());
    for ss in search_spaces {
        ss.validate(&ids)?;
        if ss_ids.contains(&ss.id) {
            return Err(ConfigError::InvalidSearchSpace {
                search_space_id: ss.id,
                reason: "duplicate identifier".to_string(),
            });
        }
        ss_ids.push(ss.id);
    }
    Ok(())
}

/// PDSCH time-domain resource allocation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PdschTimeDomainResource {
    /// Slot offset between PDCCH and PDSCH
    pub k0: u8,
    /// Mapping type A (slot-based) or B (mini-slot)
    pub mapping_type_a: bool,
    /// First OFDM symbol
    pub start_symbol: u8,
    /// Number of OFDM symbols
    pub length: u8,
}

/// PUSCH time-domain resource allocation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuschTimeDomainResource {
    /// Slot offset between PDCCH and PUSCH
    pub k2: u8,
    /// Mapping type A (slot-based) or B (mini-slot)
    pub mapping_type_a: bool,
    /// First OFDM symbol
    pub start_symbol: u8,
    /// Number of OFDM symbols
    pub length: u8,
}

fn validate_symbols(start_symbol: u8, length: u8) -> ConfigResult<()> {
    if length == 0 || u16::from(start_symbol) + u16::from(length) > u16::from(NOF_OFDM_SYMBOLS_PER_SLOT) {
        return Err(ConfigError::InvalidBwp(format!(
            "time-domain resource [{start_symbol}, +{length}) exceeds the slot"
        )));
    }
    Ok(())
}

/// Cell-wide PDCCH configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PdcchConfigCommon {
    /// CORESET#0, present when configured through the MIB
    pub coreset0: Option<CoresetConfiguration>,
    /// Additional common CORESET
    pub common_coreset: Option<CoresetConfiguration>,
    /// Common search spaces
    pub search_spaces: Vec<SearchSpaceConfiguration>,
    /// Search space used for random-access responses
    pub ra_search_space_id: u8,
}

impl PdcchConfigCommon {
    fn coreset_ids(&self) -> Vec<u8> {
        self.coreset0
            .iter()
            .chain(self.common_coreset.iter())
            .map(|cs| cs.id)
            .collect()
    }
}

/// Initial DL BWP common configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BwpDownlinkCommon {
    /// Generic parameters
    pub generic: BwpConfiguration,
    /// Common PDCCH configuration
    pub pdcch_common: PdcchConfigCommon,
    /// PDSCH time-domain allocation list
    pub pdsch_time_domain_resources: Vec<PdschTimeDomainResource>,
}

impl BwpDownlinkCommon {
    /// Checks ranges and cross-references.
    pub fn validate(&self) -> ConfigResult<()> {
        self.generic.validate()?;
        let common: Vec<CoresetConfiguration> = self
            .pdcch_common
            .coreset0
            .iter()
            .chain(self.pdcch_common.common_coreset.iter())
            .copied()
            .collect();
        validate_pdcch(&common, &self.pdcch_common.search_spaces, &[])?;
        if !self
            .pdcch_common
            .search_spaces
            .iter()
            .any(|ss| ss.id == self.pdcch_common.ra_search_space_id)
        {
            return Err(ConfigError::InvalidSearchSpace {
                search_space_id: self.pdcch_common.ra_search_space_id,
                reason: "RA search space not configured".to_string(),
            });
        }
        if self.pdsch_time_domain_resources.is_empty() {
            return Err(ConfigError::InvalidBwp(
                "empty PDSCH time-domain allocation list".to_string(),
            ));
        }
        for res in &self.pdsch_time_domain_resources {
            validate_symbols(res.start_symbol, res.length)?;
        }
        Ok(())
    }
}

/// Initial UL BWP common configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BwpUplinkCommon {
    /// Generic parameters
    pub generic: BwpConfiguration,
    /// PUSCH time-domain allocation list
    pub pusch_time_domain_resources: Vec<PuschTimeDomainResource>,
    /// Row of TS 38.213 Table 9.2.1-1 used before dedicated PUCCH
    pub pucch_resource_common: u8,
}

impl BwpUplinkCommon {
    /// Checks ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        self.generic.validate()?;
        if self.pucch_resource_common > 15 {
            return Err(ConfigError::InvalidBwp(format!(
                "pucch-ResourceCommon {} not in 0..=15",
                self.pucch_resource_common
            )));
        }
        if self.pusch_time_domain_resources.is_empty() {
            return Err(ConfigError::InvalidBwp(
                "empty PUSCH time-domain allocation list".to_string(),
            ));
        }
        for res in &self.pusch_time_domain_resources {
            validate_symbols(res.start_symbol, res.length)?;
        }
        Ok(())
    }
}

/// MCS table selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum McsTable {
    /// 64QAM table
    #[default]
    Qam64,
    /// 256QAM table
    Qam256,
    /// Low-spectral-efficiency 64QAM table
    Qam64LowSe,
}

/// UE-dedicated PDCCH configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PdcchConfig {
    /// Dedicated CORESETs
    pub coresets: Vec<CoresetConfiguration>,
    /// Dedicated search spaces
    pub search_spaces: Vec<SearchSpaceConfiguration>,
}

/// UE-dedicated PDSCH configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PdschConfig {
    /// MCS table
    pub mcs_table: McsTable,
    /// Additional DMRS positions (0-3)
    pub dmrs_additional_position: u8,
    /// Number of HARQ processes
    pub nof_harq_processes: u8,
}

/// Initial DL BWP, UE-dedicated part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BwpDownlinkDedicated {
    /// PDCCH configuration
    pub pdcch: Option<PdcchConfig>,
    /// PDSCH configuration
    pub pdsch: Option<PdschConfig>,
}

impl BwpDownlinkDedicated {
    /// Checks ranges and cross-references against the cell's common CORESETs.
    pub fn validate(&self, common: &BwpDownlinkCommon) -> ConfigResult<()> {
        if let Some(pdcch) = &self.pdcch {
            validate_pdcch(
                &pdcch.coresets,
                &pdcch.search_spaces,
                &common.pdcch_common.coreset_ids(),
            )?;
        }
        if let Some(pdsch) = &self.pdsch {
            if pdsch.dmrs_additional_position > 3 {
                return Err(ConfigError::InvalidBwp(format!(
                    "dmrs-AdditionalPosition {}",
                    pdsch.dmrs_additional_position
                )));
            }
            if !(1..=16).contains(&pdsch.nof_harq_processes) {
                return Err(ConfigError::InvalidBwp(format!(
                    "{} HARQ processes",
                    pdsch.nof_harq_processes
                )));
            }
        }
        Ok(())
    }
}

/// UE-dedicated PUCCH configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PucchConfig {
    /// Number of SR resources
    pub nof_sr_resources: u8,
    /// Number of HARQ-ACK resources
    pub nof_harq_resources: u8,
}

/// UE-dedicated PUSCH configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PuschConfig {
    /// MCS table
    pub mcs_table: McsTable,
    /// Transform precoding enabled
    pub transform_precoding: bool,
}

/// Initial UL BWP, UE-dedicated part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BwpUplinkDedicated {
    /// PUCCH configuration
    pub pucch: Option<PucchConfig>,
    /// PUSCH configuration
    pub pusch: Option<PuschConfig>,
}

/// Cell configuration request handed to the pool at cell setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellConfigRequest {
    /// Cell index within the DU
    pub cell_index: DuCellIndex,
    /// Physical cell identity
    pub pci: u16,
    /// Initial DL BWP
    pub dl_bwp_common: BwpDownlinkCommon,
    /// Initial UL BWP
    pub ul_bwp_common: BwpUplinkCommon,
}

/// Per-UE, per-cell dedicated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingCellConfig {
    /// Cell this configuration applies to
    pub cell_index: DuCellIndex,
    /// Initial DL BWP dedicated part
    pub init_dl_bwp: BwpDownlinkDedicated,
    /// Initial UL BWP dedicated part
    pub init_ul_bwp: Option<BwpUplinkDedicated>,
}
