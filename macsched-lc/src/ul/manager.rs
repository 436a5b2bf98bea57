//! Per-UE uplink logical-channel manager
//!
//! The gNB only learns about UL buffers through BSRs, so the UL state is one
//! pending-byte estimate per LCG. An LCG accepts reports only while at least
//! one of its logical channels is configured and active.

use macsched_common::{mac_sdu_required_bytes, LcgId, Lcid};
use macsched_config::{ConfigPtr, LogicalChannelConfigList};
use tracing::{debug, trace, Span};

use super::bsr::{buffer_size_index_to_bytes, BsrFormat, UlBsrIndication, SHORT_BSR_MAX_BYTES};

/// RLC header bytes added to the estimate of every LCG other than LCG 0.
pub const RLC_HEADER_MARGIN: u32 = 3;

const MAX_NOF_LCIDS: usize = Lcid::MAX_NOF_LCIDS;
const MAX_NOF_LCGS: usize = LcgId::MAX_NOF_LCGS;

#[derive(Debug, Clone, Copy, Default)]
struct LcgContext {
    active: bool,
    buf_st: u32,
}

/// Converts a reported LCG buffer size to the bytes a grant must carry.
pub fn ul_pending_bytes_estimate(lcg_id: LcgId, reported_bytes: u32) -> u32 {
    if reported_bytes == 0 {
        return 0;
    }
    let margin = if lcg_id == LcgId::default() {
        0
    } else {
        RLC_HEADER_MARGIN
    };
    mac_sdu_required_bytes(reported_bytes).saturating_add(margin)
}

/// Uplink logical-channel state of one UE.
#[derive(Debug)]
pub struct UlLogicalChannelManager {
    span: Span,
    config: ConfigPtr<LogicalChannelConfigList>,
    channel_active: [bool; MAX_NOF_LCIDS],
    lcgs: [LcgContext; MAX_NOF_LCGS],
    sr_pending: bool,
}

impl UlLogicalChannelManager {
    /// Creates the manager for a newly admitted UE with every configured
    /// channel active.
    pub fn new(config: ConfigPtr<LogicalChannelConfigList>, span: Span) -> Self {
        let mut manager = Self {
            span,
            config: config.clone(),
            channel_active: [false; MAX_NOF_LCIDS],
            lcgs: [LcgContext::default(); MAX_NOF_LCGS],
            sr_pending: false,
        };
        manager.configure(config);
        manager
    }

    /// Replaces the logical-channel configuration. LCGs left without an
    /// active channel lose their estimate.
    pub fn configure(&mut self, config: ConfigPtr<LogicalChannelConfigList>) {
        self.channel_active = [false; MAX_NOF_LCIDS];
        for lcid in config.lcids() {
            self.channel_active[lcid.index()] = true;
        }
        self.config = config;
        self.update_lcg_activity();
        debug!(
            parent: &self.span,
            nof_channels = self.config.len(),
            nof_active_lcgs = self.lcgs.iter().filter(|lcg| lcg.active).count(),
            "UL logical channels configured"
        );
    }

    /// Deactivates every channel: estimates and the pending SR are dropped.
    pub fn deactivate(&mut self) {
        self.channel_active = [false; MAX_NOF_LCIDS];
        self.update_lcg_activity();
        self.sr_pending = false;
        debug!(parent: &self.span, "UL logical channels deactivated");
    }

    /// Suspends or resumes a single channel.
    pub fn set_status(&mut self, lcid: Lcid, active: bool) {
        if !self.config.contains(lcid) {
            debug!(parent: &self.span, %lcid, "Status change for unconfigured channel ignored");
            return;
        }
        self.channel_active[lcid.index()] = active;
        self.update_lcg_activity();
    }

    fn update_lcg_activity(&mut self) {
        for lcg_id in LcgId::all() {
            let active = self
                .config
                .iter()
                .any(|ch| ch.lcg_id == lcg_id && self.channel_active[ch.lcid.index()]);
            let lcg = &mut self.lcgs[lcg_id.index()];
            lcg.active = active;
            if !active {
                lcg.buf_st = 0;
            }
        }
    }

    /// Returns true if `lcg_id` has an active channel
    pub fn is_lcg_active(&self, lcg_id: LcgId) -> bool {
        self.lcgs[lcg_id.index()].active
    }

    /// Current logical-channel configuration
    pub fn config(&self) -> &ConfigPtr<LogicalChannelConfigList> {
        &self.config
    }

    /// Applies a BSR.
    ///
    /// Reports for inactive LCGs are ignored. A long BSR zeroes the active
    /// LCGs it does not report. A short BSR at the saturated index does not
    /// override an estimate already above the short-table maximum. Any BSR
    /// clears the pending SR.
    pub fn handle_bsr_indication(&mut self, bsr: &UlBsrIndication) {
        self.sr_pending = false;

        if bsr.format == BsrFormat::LongBsr {
            for lcg_id in LcgId::all() {
                if !bsr.reports.iter().any(|r| r.lcg_id == lcg_id) {
                    self.lcgs[lcg_id.index()].buf_st = 0;
                }
            }
        }

        for report in &bsr.reports {
            let lcg_index = report.lcg_id.index();
            let current = self.lcgs[lcg_index];
            if !current.active {
                debug!(parent: &self.span, lcg = %report.lcg_id, "BSR for inactive LCG ignored");
                continue;
            }
            let Some(bytes) = buffer_size_index_to_bytes(bsr.format, report.buffer_size_index)
            else {
                debug!(
                    parent: &self.span,
                    lcg = %report.lcg_id,
                    index = report.buffer_size_index,
                    "BSR with reserved buffer size index ignored"
                );
                continue;
            };
            if bsr.format.is_short()
                && report.buffer_size_index == bsr.format.saturated_index()
                && current.buf_st > SHORT_BSR_MAX_BYTES
            {
                trace!(
                    parent: &self.span,
                    lcg = %report.lcg_id,
                    pending = current.buf_st,
                    "Saturated short BSR keeps the current estimate"
                );
                continue;
            }
            let pending = ul_pending_bytes_estimate(report.lcg_id, bytes);
            self.lcgs[lcg_index].buf_st = pending;
            trace!(parent: &self.span, lcg = %report.lcg_id, pending, "BSR");
        }
    }

    /// Records a Scheduling Request. Ignored without active channels.
    pub fn handle_sr_indication(&mut self) {
        if self.lcgs.iter().any(|lcg| lcg.active) {
            self.sr_pending = true;
        } else {
            debug!(parent: &self.span, "SR for UE without active channels ignored");
        }
    }

    /// Returns true if an SR awaits a grant
    pub fn has_pending_sr(&self) -> bool {
        self.sr_pending
    }

    /// Clears the pending SR, typically once a grant has been sent.
    pub fn reset_sr_indication(&mut self) {
        self.sr_pending = false;
    }

    /// Lowers the estimate of `lcg_id` by the bytes just granted.
    pub fn handle_ul_grant(&mut self, lcg_id: LcgId, granted_bytes: u32) {
        let lcg = &mut self.lcgs[lcg_id.index()];
        lcg.buf_st = lcg.buf_st.saturating_sub(granted_bytes);
    }

    /// Pending bytes over all active LCGs.
    pub fn pending_bytes(&self) -> u32 {
        self.lcgs
            .iter()
            .filter(|lcg| lcg.active)
            .fold(0, |sum: u32, lcg| sum.saturating_add(lcg.buf_st))
    }

    /// Returns true if any active LCG has pending bytes
    pub fn has_pending_bytes(&self) -> bool {
        self.pending_bytes() > 0
    }

    /// Pending bytes of `lcg_id`; zero if the LCG is inactive.
    pub fn lcg_pending_bytes(&self, lcg_id: LcgId) -> u32 {
        let lcg = &self.lcgs[lcg_id.index()];
        if lcg.active {
            lcg.buf_st
        } else {
            0
        }
    }

    /// Returns true if `lcg_id` has pending bytes
    pub fn has_lcg_pending_bytes(&self, lcg_id: LcgId) -> bool {
        self.lcg_pending_bytes(lcg_id) > 0
    }
}
