//! Test fixtures and configuration helpers
//!
//! Builders for cell setup and UE creation requests with a typical bearer
//! layout: SRB1, SRB2, one non-GBR DRB and an optional GBR DRB.

use macsched_common::{DuCellIndex, DuUeIndex, LcgId, Lcid, SchedulerConfig, SubcarrierSpacing};
use macsched_config::{
    BwpConfiguration, BwpDownlinkCommon, BwpDownlinkDedicated, BwpUplinkCommon,
    BwpUplinkDedicated, CellConfigRequest, CoresetConfiguration, CrbInterval, CyclicPrefix,
    GbrQosInfo, LogicalChannelConfig, McsTable, PdcchConfig, PdcchConfigCommon, PdschConfig,
    PdschTimeDomainResource, PucchConfig, PuschTimeDomainResource, QosConfig,
    SearchSpaceConfiguration, SearchSpaceType, ServingCellConfig, UeCreationRequest,
};

/// Non-GBR DRB used by the fixtures
pub const DRB1: Lcid = Lcid::MIN_DRB;

/// GBR DRB used by the fixtures
pub const GBR_DRB: Lcid = match Lcid::drb(1) {
    Some(lcid) => lcid,
    None => panic!("DRB index out of range"),
};

/// LCG of [`DRB1`]
pub fn drb_lcg() -> LcgId {
    LcgId::new(1).unwrap_or_default()
}

/// LCG of [`GBR_DRB`]
pub fn gbr_lcg() -> LcgId {
    LcgId::new(2).unwrap_or_default()
}

/// Scheduler configuration used by the scenario tests
pub fn scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        scs: SubcarrierSpacing::Khz30,
        max_nof_ues: 32,
        default_gbr_averaging_window_ms: 100,
        ..Default::default()
    }
}

fn coreset(id: u8) -> CoresetConfiguration {
    CoresetConfiguration {
        id,
        freq_domain_resources: 0xff << 37,
        duration: 1,
        interleaved: false,
        pdcch_dmrs_scrambling_id: None,
    }
}

fn search_space(id: u8, coreset_id: u8, ss_type: SearchSpaceType) -> SearchSpaceConfiguration {
    SearchSpaceConfiguration {
        id,
        coreset_id,
        ss_type,
        monitoring_slot_periodicity: 1,
        monitoring_slot_offset: 0,
        duration: 1,
        nof_candidates: [0, 0, 2, 0, 0],
    }
}

/// Test cell configuration
#[derive(Debug, Clone)]
pub struct TestCellConfig {
    /// Cell index
    pub cell_index: DuCellIndex,
    /// Physical cell identity
    pub pci: u16,
    /// Carrier bandwidth in CRBs
    pub nof_crbs: u16,
}

impl Default for TestCellConfig {
    fn default() -> Self {
        Self {
            cell_index: DuCellIndex(0),
            pci: 1,
            nof_crbs: 51,
        }
    }
}

impl TestCellConfig {
    /// Set the cell index
    pub fn with_cell_index(mut self, cell_index: u8) -> Self {
        self.cell_index = DuCellIndex(cell_index);
        self.pci = 1 + u16::from(cell_index);
        self
    }

    /// Set the bandwidth
    pub fn with_nof_crbs(mut self, nof_crbs: u16) -> Self {
        self.nof_crbs = nof_crbs;
        self
    }

    /// Builds the cell setup request.
    pub fn request(&self) -> CellConfigRequest {
        let generic = BwpConfiguration {
            scs: SubcarrierSpacing::Khz30,
            cp: CyclicPrefix::Normal,
            crbs: CrbInterval::new(0, self.nof_crbs),
        };
        CellConfigRequest {
            cell_index: self.cell_index,
            pci: self.pci,
            dl_bwp_common: BwpDownlinkCommon {
                generic,
                pdcch_common: PdcchConfigCommon {
                    coreset0: Some(coreset(0)),
                    common_coreset: None,
                    search_spaces: vec![
                        search_space(0, 0, SearchSpaceType::Common),
                        search_space(1, 0, SearchSpaceType::Common),
                    ],
                    ra_search_space_id: 1,
                },
                pdsch_time_domain_resources: vec![PdschTimeDomainResource {
                    k0: 0,
                    mapping_type_a: true,
                    start_symbol: 2,
                    length: 12,
                }],
            },
            ul_bwp_common: BwpUplinkCommon {
                generic,
                pusch_time_domain_resources: vec![PuschTimeDomainResource {
                    k2: 4,
                    mapping_type_a: true,
                    start_symbol: 0,
                    length: 14,
                }],
                pucch_resource_common: 11,
            },
        }
    }
}

/// Test UE configuration
#[derive(Debug, Clone)]
pub struct TestUeConfig {
    /// UE index
    pub ue_index: DuUeIndex,
    /// Serving cell
    pub cell_index: DuCellIndex,
    /// Adds a GBR DRB on [`GBR_DRB`]
    pub with_gbr: bool,
}

impl Default for TestUeConfig {
    fn default() -> Self {
        Self {
            ue_index: DuUeIndex(0),
            cell_index: DuCellIndex(0),
            with_gbr: false,
        }
    }
}

impl TestUeConfig {
    /// Set the UE index
    pub fn with_ue_index(mut self, ue_index: u16) -> Self {
        self.ue_index = DuUeIndex(ue_index);
        self
    }

    /// Set the serving cell
    pub fn with_cell(mut self, cell_index: DuCellIndex) -> Self {
        self.cell_index = cell_index;
        self
    }

    /// Add the GBR bearer
    pub fn with_gbr(mut self) -> Self {
        self.with_gbr = true;
        self
    }

    /// Logical channels of the UE
    pub fn logical_channels(&self) -> Vec<LogicalChannelConfig> {
        let mut channels = vec![
            LogicalChannelConfig::new(Lcid::SRB1, LcgId::default(), 1),
            LogicalChannelConfig::new(Lcid::SRB2, LcgId::default(), 3),
            LogicalChannelConfig::new(DRB1, drb_lcg(), 9).with_qos(QosConfig::non_gbr(9)),
        ];
        if self.with_gbr {
            channels.push(gbr_channel());
        }
        channels
    }

    /// Builds the UE creation request.
    pub fn request(&self) -> UeCreationRequest {
        UeCreationRequest {
            ue_index: self.ue_index,
            cells: vec![ServingCellConfig {
                cell_index: self.cell_index,
                init_dl_bwp: BwpDownlinkDedicated {
                    pdcch: Some(PdcchConfig {
                        coresets: vec![coreset(1)],
                        search_spaces: vec![search_space(2, 1, SearchSpaceType::UeDedicated)],
                    }),
                    pdsch: Some(PdschConfig {
                        mcs_table: McsTable::Qam256,
                        dmrs_additional_position: 1,
                        nof_harq_processes: 16,
                    }),
                },
                init_ul_bwp: Some(BwpUplinkDedicated {
                    pucch: Some(PucchConfig {
                        nof_sr_resources: 1,
                        nof_harq_resources: 8,
                    }),
                    pusch: None,
                }),
            }],
            logical_channels: self.logical_channels(),
        }
    }
}

/// Conversational-voice GBR bearer (5QI 1) without its own averaging window.
pub fn gbr_channel() -> LogicalChannelConfig {
    LogicalChannelConfig::new(GBR_DRB, gbr_lcg(), 5).with_qos(QosConfig::gbr(
        1,
        GbrQosInfo {
            gbr_dl_bps: 128_000,
            gbr_ul_bps: 128_000,
            mbr_dl_bps: 256_000,
            mbr_ul_bps: 256_000,
        },
        None,
    ))
}

/// The GBR bearer reconfigured as non-GBR (5QI 9).
pub fn gbr_channel_downgraded() -> LogicalChannelConfig {
    LogicalChannelConfig::new(GBR_DRB, gbr_lcg(), 5).with_qos(QosConfig::non_gbr(9))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cell_request_is_valid() {
        let req = TestCellConfig::default().request();
        assert!(req.dl_bwp_common.validate().is_ok());
        assert!(req.ul_bwp_common.validate().is_ok());
    }

    #[test]
    fn test_ue_channels() {
        let ue = TestUeConfig::default();
        assert_eq!(ue.logical_channels().len(), 3);
        assert_eq!(ue.with_gbr().logical_channels().len(), 4);
        assert!(gbr_channel().is_gbr());
        assert!(!gbr_channel_downgraded().is_gbr());
    }
}
