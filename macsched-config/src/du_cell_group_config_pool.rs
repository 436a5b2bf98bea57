//! DU cell/group configuration pool
//!
//! Aggregates the configuration objects of all cells and UEs served by a DU.
//! Cell setup interns the common BWPs; UE creation and reconfiguration intern
//! the dedicated BWPs, the CORESET/search-space sets a UE may monitor and the
//! UE's logical-channel list. UEs with identical configurations therefore
//! hold identical handles, and the per-slot scheduler can detect a changed
//! configuration with a handle comparison.
//!
//! The pool is mutated only from the cell's control context during
//! (re)configuration. The handles it returns are read-only and may be shared
//! with per-cell workers.

use macsched_common::{DuCellIndex, DuUeIndex, MAX_NOF_DU_CELLS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cell_config::{
    BwpDownlinkCommon, BwpDownlinkDedicated, BwpUplinkCommon, BwpUplinkDedicated,
    CellConfigRequest, CoresetConfiguration, PdschTimeDomainResource, SearchSpaceConfiguration,
    ServingCellConfig,
};
use crate::config_pool::{ConfigObjectPool, ConfigPtr};
use crate::error::{ConfigError, ConfigResult};
use crate::lc_config::{LogicalChannelConfig, LogicalChannelConfigList, LogicalChannelConfigPool};

/// Handles to the common configuration of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellConfigPtrs {
    /// Cell index within the DU
    pub cell_index: DuCellIndex,
    /// Physical cell identity
    pub pci: u16,
    /// Initial DL BWP
    pub dl_bwp_common: ConfigPtr<BwpDownlinkCommon>,
    /// Initial UL BWP
    pub ul_bwp_common: ConfigPtr<BwpUplinkCommon>,
    /// PDSCH time-domain allocation list of the initial DL BWP
    pub pdsch_time_domain_list: ConfigPtr<Vec<PdschTimeDomainResource>>,
}

/// Handles to a UE's configuration in one serving cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeCellConfigPtrs {
    /// Common configuration of the cell
    pub cell: CellConfigPtrs,
    /// Dedicated part of the initial DL BWP
    pub dl_bwp_dedicated: ConfigPtr<BwpDownlinkDedicated>,
    /// Dedicated part of the initial UL BWP
    pub ul_bwp_dedicated: Option<ConfigPtr<BwpUplinkDedicated>>,
    /// Every CORESET the UE may monitor, common first, sorted by ID
    pub coresets: Vec<ConfigPtr<CoresetConfiguration>>,
    /// Every search space the UE may monitor, common first, sorted by ID
    pub search_spaces: Vec<ConfigPtr<SearchSpaceConfiguration>>,
}

impl UeCellConfigPtrs {
    /// Returns the CORESET with the given ID.
    pub fn coreset(&self, coreset_id: u8) -> Option<&ConfigPtr<CoresetConfiguration>> {
        self.coresets.iter().find(|cs| cs.id == coreset_id)
    }

    /// Returns the search space with the given ID.
    pub fn search_space(&self, ss_id: u8) -> Option<&ConfigPtr<SearchSpaceConfiguration>> {
        self.search_spaces.iter().find(|ss| ss.id == ss_id)
    }
}

/// Handles to the full configuration of a UE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeConfigPtrs {
    /// UE index within the DU
    pub ue_index: DuUeIndex,
    /// Serving cells, PCell first
    pub cells: Vec<UeCellConfigPtrs>,
    /// Logical channels
    pub logical_channels: ConfigPtr<LogicalChannelConfigList>,
}

impl UeConfigPtrs {
    /// Returns the primary cell configuration
    pub fn pcell(&self) -> &UeCellConfigPtrs {
        &self.cells[0]
    }

    /// Returns the configuration for `cell_index`, if it serves the UE.
    pub fn cell(&self, cell_index: DuCellIndex) -> Option<&UeCellConfigPtrs> {
        self.cells.iter().find(|c| c.cell.cell_index == cell_index)
    }
}

/// UE creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UeCreationRequest {
    /// UE index within the DU
    pub ue_index: DuUeIndex,
    /// Serving cells, PCell first
    pub cells: Vec<ServingCellConfig>,
    /// Logical channels (SRB0 may be omitted)
    pub logical_channels: Vec<LogicalChannelConfig>,
}

/// UE reconfiguration request. Omitted fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UeReconfigurationRequest {
    /// New serving cell set
    pub cells: Option<Vec<ServingCellConfig>>,
    /// New logical channel set
    pub logical_channels: Option<Vec<LogicalChannelConfig>>,
}

/// Configuration pool for the cells and UEs of a DU.
#[derive(Debug)]
pub struct DuCellGroupConfigPool {
    dl_bwp_common: ConfigObjectPool<BwpDownlinkCommon>,
    ul_bwp_common: ConfigObjectPool<BwpUplinkCommon>,
    pdsch_time_domain_lists: ConfigObjectPool<Vec<PdschTimeDomainResource>>,
    dl_bwp_dedicated: ConfigObjectPool<BwpDownlinkDedicated>,
    ul_bwp_dedicated: ConfigObjectPool<BwpUplinkDedicated>,
    coresets: ConfigObjectPool<CoresetConfiguration>,
    search_spaces: ConfigObjectPool<SearchSpaceConfiguration>,
    logical_channels: LogicalChannelConfigPool,
    cells: Vec<Option<CellConfigPtrs>>,
}

impl DuCellGroupConfigPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            dl_bwp_common: ConfigObjectPool::new(),
            ul_bwp_common: ConfigObjectPool::new(),
            pdsch_time_domain_lists: ConfigObjectPool::new(),
            dl_bwp_dedicated: ConfigObjectPool::new(),
            ul_bwp_dedicated: ConfigObjectPool::new(),
            coresets: ConfigObjectPool::new(),
            search_spaces: ConfigObjectPool::new(),
            logical_channels: LogicalChannelConfigPool::new(),
            cells: vec![None; MAX_NOF_DU_CELLS],
        }
    }

    /// Registers a cell and interns its common configuration.
    pub fn add_cell(&mut self, req: &CellConfigRequest) -> ConfigResult<CellConfigPtrs> {
        let slot = self
            .cells
            .get(req.cell_index.index())
            .ok_or(ConfigError::UnknownCell {
                cell_index: req.cell_index,
            })?;
        if slot.is_some() {
            return Err(ConfigError::DuplicateCell {
                cell_index: req.cell_index,
            });
        }
        req.dl_bwp_common.validate()?;
        req.ul_bwp_common.validate()?;

        let ptrs = CellConfigPtrs {
            cell_index: req.cell_index,
            pci: req.pci,
            dl_bwp_common: self.dl_bwp_common.create(&req.dl_bwp_common),
            ul_bwp_common: self.ul_bwp_common.create(&req.ul_bwp_common),
            pdsch_time_domain_list: self
                .pdsch_time_domain_lists
                .create(&req.dl_bwp_common.pdsch_time_domain_resources),
        };
        self.cells[req.cell_index.index()] = Some(ptrs.clone());

        info!(cell = req.cell_index.0, pci = req.pci, "Cell configuration added");
        Ok(ptrs)
    }

    /// Unregisters a cell. Interned objects stay in the pool.
    pub fn rem_cell(&mut self, cell_index: DuCellIndex) -> ConfigResult<()> {
        match self.cells.get_mut(cell_index.index()) {
            Some(slot @ Some(_)) => {
                *slot = None;
                info!(cell = cell_index.0, "Cell configuration removed");
                Ok(())
            }
            _ => Err(ConfigError::UnknownCell { cell_index }),
        }
    }

    /// Returns the common configuration of a registered cell.
    pub fn cell(&self, cell_index: DuCellIndex) -> Option<&CellConfigPtrs> {
        self.cells.get(cell_index.index()).and_then(Option::as_ref)
    }

    /// Interns the configuration of a new UE.
    pub fn add_ue(&mut self, req: &UeCreationRequest) -> ConfigResult<UeConfigPtrs> {
        let cells = self.create_ue_cells(&req.cells)?;
        let logical_channels = self.logical_channels.create(&req.logical_channels)?;

        debug!(
            ue = req.ue_index.0,
            nof_cells = cells.len(),
            nof_channels = logical_channels.len(),
            "UE configuration added"
        );
        Ok(UeConfigPtrs {
            ue_index: req.ue_index,
            cells,
            logical_channels,
        })
    }

    /// Interns a UE reconfiguration. Fields the request omits are inherited
    /// from `current`.
    pub fn reconf_ue(
        &mut self,
        current: &UeConfigPtrs,
        req: &UeReconfigurationRequest,
    ) -> ConfigResult<UeConfigPtrs> {
        let cells = match &req.cells {
            Some(cells) => self.create_ue_cells(cells)?,
            None => current.cells.clone(),
        };
        let logical_channels = match &req.logical_channels {
            Some(channels) => self.logical_channels.create(channels)?,
            None => current.logical_channels.clone(),
        };

        debug!(
            ue = current.ue_index.0,
            cells_changed = cells != current.cells,
            channels_changed = logical_channels != current.logical_channels,
            "UE configuration updated"
        );
        Ok(UeConfigPtrs {
            ue_index: current.ue_index,
            cells,
            logical_channels,
        })
    }

    fn create_ue_cells(&mut self, cells: &[ServingCellConfig]) -> ConfigResult<Vec<UeCellConfigPtrs>> {
        if cells.is_empty() {
            return Err(ConfigError::NoServingCell);
        }
        cells.iter().map(|cell| self.create_ue_cell(cell)).collect()
    }

    fn create_ue_cell(&mut self, cfg: &ServingCellConfig) -> ConfigResult<UeCellConfigPtrs> {
        let cell = self
            .cell(cfg.cell_index)
            .cloned()
            .ok_or(ConfigError::UnknownCell {
                cell_index: cfg.cell_index,
            })?;
        cfg.init_dl_bwp.validate(&cell.dl_bwp_common)?;

        let common = &cell.dl_bwp_common.pdcch_common;
        let mut coresets: Vec<CoresetConfiguration> = common
            .coreset0
            .iter()
            .chain(common.common_coreset.iter())
            .copied()
            .collect();
        let mut search_spaces = common.search_spaces.clone();
        if let Some(pdcch) = &cfg.init_dl_bwp.pdcch {
            coresets.extend(pdcch.coresets.iter().copied());
            search_spaces.extend(pdcch.search_spaces.iter().copied());
        }
        coresets.sort_by_key(|cs| cs.id);
        search_spaces.sort_by_key(|ss| ss.id);

        Ok(UeCellConfigPtrs {
            dl_bwp_dedicated: self.dl_bwp_dedicated.create(&cfg.init_dl_bwp),
            ul_bwp_dedicated: cfg
                .init_ul_bwp
                .as_ref()
                .map(|bwp| self.ul_bwp_dedicated.create(bwp)),
            coresets: coresets.iter().map(|cs| self.coresets.create(cs)).collect(),
            search_spaces: search_spaces
                .iter()
                .map(|ss| self.search_spaces.create(ss))
                .collect(),
            cell,
        })
    }

    /// Returns the logical-channel configuration pool
    pub fn logical_channels(&mut self) -> &mut LogicalChannelConfigPool {
        &mut self.logical_channels
    }

    /// Returns the number of distinct dedicated DL BWP configurations
    pub fn nof_dl_bwp_dedicated(&self) -> usize {
        self.dl_bwp_dedicated.len()
    }

    /// Returns the number of distinct common DL BWP configurations
    pub fn nof_dl_bwp_common(&self) -> usize {
        self.dl_bwp_common.len()
    }

    /// Returns the number of distinct search space configurations
    pub fn nof_search_spaces(&self) -> usize {
        self.search_spaces.len()
    }
}

impl Default for DuCellGroupConfigPool {
    fn default() -> Self {
        Self::new()
    }
}
