//! Per-cell downlink logical-channel system
//!
//! Owns the [`DlLogicalChannelManager`] of every UE of a cell in a table
//! sized once from [`SchedulerConfig::max_nof_ues`]. The cell's slot loop
//! calls [`DlLogicalChannelSystem::slot_indication`] once per slot.

use macsched_common::{DuUeIndex, SchedulerConfig};
use macsched_config::{ConfigPtr, LogicalChannelConfigList};
use tracing::{info, info_span, Span};

use super::bit_rate::BitRateSettings;
use super::manager::DlLogicalChannelManager;
use crate::error::{LcError, LcResult};

/// Downlink logical-channel state of all UEs of one cell.
#[derive(Debug)]
pub struct DlLogicalChannelSystem {
    span: Span,
    settings: BitRateSettings,
    ues: Vec<Option<DlLogicalChannelManager>>,
    nof_ues: usize,
}

impl DlLogicalChannelSystem {
    /// Creates an empty system logging under `span`.
    pub fn new(config: &SchedulerConfig, span: Span) -> Self {
        let mut ues = Vec::with_capacity(config.max_nof_ues);
        ues.resize_with(config.max_nof_ues, || None);
        Self {
            span,
            settings: BitRateSettings::from(config),
            ues,
            nof_ues: 0,
        }
    }

    /// Admits a UE with the given logical-channel configuration.
    pub fn add_ue(
        &mut self,
        ue_index: DuUeIndex,
        config: ConfigPtr<LogicalChannelConfigList>,
    ) -> LcResult<&mut DlLogicalChannelManager> {
        let capacity = self.ues.len();
        match self.ues.get(ue_index.index()) {
            None => return Err(LcError::UeIndexOutOfRange { ue_index, capacity }),
            Some(Some(_)) => return Err(LcError::UeAlreadyExists { ue_index }),
            Some(None) => {}
        }

        let span = info_span!(parent: &self.span, "ue", ue = ue_index.0);
        let manager = DlLogicalChannelManager::new(config, self.settings, span);
        self.nof_ues += 1;
        info!(parent: &self.span, ue = ue_index.0, nof_ues = self.nof_ues, "DL UE added");
        Ok(self.ues[ue_index.index()].insert(manager))
    }

    /// Releases a UE, returning its final state.
    pub fn remove_ue(&mut self, ue_index: DuUeIndex) -> Option<DlLogicalChannelManager> {
        let removed = self.ues.get_mut(ue_index.index())?.take()?;
        self.nof_ues -= 1;
        info!(parent: &self.span, ue = ue_index.0, nof_ues = self.nof_ues, "DL UE removed");
        Some(removed)
    }

    /// Returns the UE's manager
    pub fn ue(&self, ue_index: DuUeIndex) -> Option<&DlLogicalChannelManager> {
        self.ues.get(ue_index.index()).and_then(Option::as_ref)
    }

    /// Returns the UE's manager, mutably
    pub fn ue_mut(&mut self, ue_index: DuUeIndex) -> Option<&mut DlLogicalChannelManager> {
        self.ues.get_mut(ue_index.index()).and_then(Option::as_mut)
    }

    /// Returns true if the UE is registered
    pub fn contains(&self, ue_index: DuUeIndex) -> bool {
        self.ue(ue_index).is_some()
    }

    /// Number of registered UEs
    pub fn nof_ues(&self) -> usize {
        self.nof_ues
    }

    /// Iterates the registered UEs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (DuUeIndex, &DlLogicalChannelManager)> + '_ {
        self.ues.iter().enumerate().filter_map(|(idx, ue)| {
            ue.as_ref()
                .map(|ue| (DuUeIndex(idx as u16), ue))
        })
    }

    /// Advances every UE by one slot.
    pub fn slot_indication(&mut self) {
        for ue in self.ues.iter_mut().flatten() {
            ue.slot_indication();
        }
    }
}
