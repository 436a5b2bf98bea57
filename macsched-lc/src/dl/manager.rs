//! Per-UE downlink logical-channel manager
//!
//! Tracks, for one UE, the RLC buffer state of every configured logical
//! channel, the MAC CEs waiting to be sent, the RAN slice each channel is
//! billed to and the bit rate achieved by GBR bearers. The scheduler queries
//! pending bytes to size grants and then builds the transport block by
//! calling, in order, [`allocate_ue_con_res_id_mac_ce`], [`allocate_mac_ce`]
//! and [`allocate_mac_sdu`] against the remaining budget.
//!
//! All storage is sized at configuration time; indications, queries and
//! allocations never allocate.
//!
//! [`allocate_ue_con_res_id_mac_ce`]: DlLogicalChannelManager::allocate_ue_con_res_id_mac_ce
//! [`allocate_mac_ce`]: DlLogicalChannelManager::allocate_mac_ce
//! [`allocate_mac_sdu`]: DlLogicalChannelManager::allocate_mac_sdu

use arrayvec::ArrayVec;
use macsched_common::{
    mac_sdu_payload_size, mac_sdu_required_bytes, Lcid, RanSliceId, MAX_MAC_SDU_SUBHEADER_SIZE,
    MIN_MAC_SDU_SUBHEADER_SIZE, SRB_RAN_SLICE_ID,
};
use macsched_config::{ConfigPtr, LogicalChannelConfig, LogicalChannelConfigList};
use tracing::{debug, trace, Span};

use super::bit_rate::{BitRateSettings, BitRateTracker};
use super::mac_ce::{DlMsgLcInfo, DlSchLcid, MacCeInfo, MacCePayload, MacCeType, UE_CON_RES_ID_LEN};

/// Bytes reserved for the RLC AM segment header (SO field included) when a
/// channel is only partially drained.
pub const RLC_SEGMENTATION_OVERHEAD: u32 = 4;

/// Distinct CE types that can wait in the queue (Contention Resolution is
/// tracked on its own).
const MAX_NOF_PENDING_CES: usize = MacCeType::ALL.len() - 1;

const MAX_NOF_LCIDS: usize = Lcid::MAX_NOF_LCIDS;

#[derive(Debug)]
struct ChannelContext {
    cfg: ConfigPtr<LogicalChannelConfig>,
    active: bool,
    /// RLC buffer occupancy as last reported, minus what was scheduled since
    buf_st: u32,
    slice_id: Option<RanSliceId>,
    bit_rate: Option<BitRateTracker>,
}

impl ChannelContext {
    fn lcid(&self) -> Lcid {
        self.cfg.lcid
    }

    fn pending_bytes(&self) -> u32 {
        if self.active {
            mac_sdu_required_bytes(self.buf_st)
        } else {
            0
        }
    }
}

/// Downlink logical-channel state of one UE.
#[derive(Debug)]
pub struct DlLogicalChannelManager {
    span: Span,
    settings: BitRateSettings,
    config: ConfigPtr<LogicalChannelConfigList>,
    /// Sorted by LCID
    channels: ArrayVec<ChannelContext, MAX_NOF_LCIDS>,
    lcid_to_pos: [Option<u8>; MAX_NOF_LCIDS],
    /// LCIDs sorted by (priority, LCID)
    prioritized: ArrayVec<Lcid, MAX_NOF_LCIDS>,
    pending_ces: ArrayVec<MacCeInfo, MAX_NOF_PENDING_CES>,
    pending_con_res_id: Option<[u8; UE_CON_RES_ID_LEN]>,
    fallback: bool,
    deactivated: bool,
}

impl DlLogicalChannelManager {
    /// Creates the manager for a newly admitted UE. Every configured channel
    /// starts active with an empty buffer.
    pub fn new(
        config: ConfigPtr<LogicalChannelConfigList>,
        settings: BitRateSettings,
        span: Span,
    ) -> Self {
        let mut manager = Self {
            span,
            settings,
            config: config.clone(),
            channels: ArrayVec::new(),
            lcid_to_pos: [None; MAX_NOF_LCIDS],
            prioritized: ArrayVec::new(),
            pending_ces: ArrayVec::new(),
            pending_con_res_id: None,
            fallback: false,
            deactivated: false,
        };
        manager.configure(config);
        manager
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Replaces the logical-channel configuration.
    ///
    /// Channels kept by LCID retain their buffer state, slice and bit-rate
    /// window; removed channels are dropped; every channel of the new list
    /// is active. Reactivates a deactivated UE.
    pub fn configure(&mut self, config: ConfigPtr<LogicalChannelConfigList>) {
        let mut previous = std::mem::take(&mut self.channels);
        self.lcid_to_pos = [None; MAX_NOF_LCIDS];

        for cfg in config.iter() {
            let prev = previous
                .iter()
                .position(|ch| ch.lcid() == cfg.lcid)
                .map(|pos| previous.swap_remove(pos));
            let (buf_st, slice_id, bit_rate) = match prev {
                Some(ch) => (ch.buf_st, ch.slice_id, ch.bit_rate),
                None => (0, None, None),
            };
            let bit_rate = match gbr_window_ms(cfg, &self.settings) {
                Some(window) if bit_rate.as_ref().map(BitRateTracker::window_ms) != Some(window) => {
                    Some(BitRateTracker::new(window, self.settings.slots_per_ms))
                }
                // Stale trackers of bearers that lost GBR are dropped on the next slot
                _ => bit_rate,
            };
            self.lcid_to_pos[cfg.lcid.index()] = Some(self.channels.len() as u8);
            self.channels.push(ChannelContext {
                cfg: cfg.clone(),
                active: true,
                buf_st,
                slice_id,
                bit_rate,
            });
        }

        self.prioritized = self.channels.iter().map(ChannelContext::lcid).collect();
        let channels = &self.channels;
        let lcid_to_pos = &self.lcid_to_pos;
        self.prioritized.sort_by_key(|lcid| {
            let priority = lcid_to_pos[lcid.index()]
                .map(|pos| channels[pos as usize].cfg.priority)
                .unwrap_or(u8::MAX);
            (priority, *lcid)
        });

        let changed = self.config != config;
        self.config = config;
        self.deactivated = false;
        debug!(
            parent: &self.span,
            nof_channels = self.channels.len(),
            changed,
            "DL logical channels configured"
        );
    }

    /// Deactivates every channel and drops queued CEs. Until the next
    /// [`configure`](Self::configure), pending-byte queries report zero and
    /// CE indications are rejected. Buffer states are kept.
    pub fn deactivate(&mut self) {
        for ch in &mut self.channels {
            ch.active = false;
        }
        self.pending_ces.clear();
        self.pending_con_res_id = None;
        self.deactivated = true;
        debug!(parent: &self.span, "DL logical channels deactivated");
    }

    /// Suspends or resumes a single channel. Ignored while the UE is
    /// deactivated.
    pub fn set_status(&mut self, lcid: Lcid, active: bool) {
        if self.deactivated {
            debug!(parent: &self.span, %lcid, active, "Status change for deactivated UE ignored");
            return;
        }
        match self.position(lcid) {
            Some(pos) => self.channels[pos].active = active,
            None => debug!(parent: &self.span, %lcid, "Status change for unconfigured channel ignored"),
        }
    }

    /// Returns true if `lcid` is configured and active
    pub fn is_active(&self, lcid: Lcid) -> bool {
        self.position(lcid).is_some_and(|pos| self.channels[pos].active)
    }

    /// Enters or leaves fallback mode.
    ///
    /// In fallback the UE aggregate covers SRB0 and SRB1 only; otherwise it
    /// covers every active channel except SRB0.
    pub fn set_fallback_state(&mut self, fallback: bool) {
        if self.fallback != fallback {
            debug!(parent: &self.span, fallback, "DL fallback state changed");
        }
        self.fallback = fallback;
    }

    /// Returns true in fallback mode
    pub fn is_in_fallback(&self) -> bool {
        self.fallback
    }

    /// Current logical-channel configuration
    pub fn config(&self) -> &ConfigPtr<LogicalChannelConfigList> {
        &self.config
    }

    // ------------------------------------------------------------------
    // Indications
    // ------------------------------------------------------------------

    /// Sets the RLC buffer occupancy of `lcid`. Reports are absolute.
    /// Ignored for unconfigured or inactive channels.
    pub fn handle_dl_buffer_status_indication(&mut self, lcid: Lcid, buffer_bytes: u32) {
        match self.position(lcid) {
            Some(pos) if self.channels[pos].active => {
                self.channels[pos].buf_st = buffer_bytes;
                trace!(parent: &self.span, %lcid, buffer_bytes, "DL buffer status");
            }
            _ => debug!(
                parent: &self.span,
                %lcid,
                buffer_bytes,
                "DL buffer status for inactive channel ignored"
            ),
        }
    }

    /// Queues a MAC CE, replacing any pending CE of the same type.
    ///
    /// Returns true if the CE is now pending.
    pub fn handle_mac_ce_indication(&mut self, ce: MacCeInfo) -> bool {
        if self.deactivated {
            debug!(parent: &self.span, ce = %ce.ce_type, "MAC CE for deactivated UE ignored");
            return false;
        }
        if !ce.is_consistent() {
            debug!(parent: &self.span, ce = %ce.ce_type, payload = ?ce.payload, "Malformed MAC CE ignored");
            return false;
        }

        if let MacCePayload::ConResId(id) = ce.payload {
            self.pending_con_res_id = Some(id);
        } else if let Some(pending) = self.pending_ces.iter_mut().find(|p| p.ce_type == ce.ce_type) {
            *pending = ce;
        } else if self.pending_ces.try_push(ce).is_err() {
            return false;
        }
        trace!(parent: &self.span, ce = %ce.ce_type, "MAC CE pending");
        true
    }

    /// Closes the current slot of every GBR bit-rate window.
    pub fn slot_indication(&mut self) {
        for ch in &mut self.channels {
            if ch.cfg.is_gbr() {
                if let Some(tracker) = ch.bit_rate.as_mut() {
                    tracker.slot_indication();
                }
            } else {
                ch.bit_rate = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Transport block building
    // ------------------------------------------------------------------

    /// Schedules the pending UE Contention Resolution Identity CE if it fits
    /// in `tb_budget`. Must run before [`allocate_mac_ce`](Self::allocate_mac_ce).
    pub fn allocate_ue_con_res_id_mac_ce(&mut self, tb_budget: u32) -> Option<DlMsgLcInfo> {
        let id = self.pending_con_res_id?;
        if MacCeType::ConResId.required_bytes() > tb_budget {
            return None;
        }
        self.pending_con_res_id = None;
        trace!(parent: &self.span, tb_budget, "CON_RES_ID scheduled");
        Some(DlMsgLcInfo {
            lcid: DlSchLcid::Ce(MacCeType::ConResId),
            sched_bytes: MacCeType::ConResId.size(),
            ce_payload: Some(MacCePayload::ConResId(id)),
        })
    }

    /// Schedules the oldest pending CE that fits in `tb_budget`, one per
    /// call.
    pub fn allocate_mac_ce(&mut self, tb_budget: u32) -> Option<DlMsgLcInfo> {
        let pos = self
            .pending_ces
            .iter()
            .position(|ce| ce.ce_type.required_bytes() <= tb_budget)?;
        let ce = self.pending_ces.remove(pos);
        trace!(parent: &self.span, ce = %ce.ce_type, tb_budget, "MAC CE scheduled");
        Some(DlMsgLcInfo {
            lcid: DlSchLcid::Ce(ce.ce_type),
            sched_bytes: ce.ce_type.size(),
            ce_payload: Some(ce.payload),
        })
    }

    /// Schedules one MAC SDU of at most `tb_budget` bytes, subheader
    /// included.
    ///
    /// With `lcid` set, that channel is served; otherwise the highest
    /// priority channel of the UE aggregate with pending bytes. Leftover
    /// budget is folded into the SDU when it is too small for another
    /// subheader or when nothing else is pending. A partially drained
    /// channel keeps [`RLC_SEGMENTATION_OVERHEAD`] extra bytes pending.
    pub fn allocate_mac_sdu(&mut self, tb_budget: u32, lcid: Option<Lcid>) -> Option<DlMsgLcInfo> {
        if tb_budget <= MIN_MAC_SDU_SUBHEADER_SIZE {
            return None;
        }
        let pos = match lcid {
            Some(lcid) => self.position(lcid).filter(|&pos| self.channels[pos].active)?,
            None => self.select_channel()?,
        };

        let lch_bytes = self.channels[pos].pending_bytes();
        if lch_bytes == 0 {
            return None;
        }
        let mut alloc_bytes = lch_bytes.min(tb_budget);
        let leftover = tb_budget - alloc_bytes;
        if leftover > 0 && (leftover <= MAX_MAC_SDU_SUBHEADER_SIZE || !self.has_other_pending(pos)) {
            alloc_bytes = tb_budget;
        }
        let sched_bytes = mac_sdu_payload_size(alloc_bytes);
        if sched_bytes == 0 {
            return None;
        }

        let (lcid, remaining) = {
            let ch = &mut self.channels[pos];
            ch.buf_st = if sched_bytes >= ch.buf_st {
                0
            } else {
                (ch.buf_st - sched_bytes).saturating_add(RLC_SEGMENTATION_OVERHEAD)
            };
            if let Some(tracker) = ch.bit_rate.as_mut() {
                tracker.add_bytes(sched_bytes);
            }
            (ch.lcid(), ch.buf_st)
        };
        trace!(parent: &self.span, %lcid, sched_bytes, remaining, "MAC SDU scheduled");
        Some(DlMsgLcInfo {
            lcid: DlSchLcid::Sdu(lcid),
            sched_bytes,
            ce_payload: None,
        })
    }

    fn select_channel(&self) -> Option<usize> {
        self.prioritized
            .iter()
            .filter(|&&lcid| self.in_aggregate(lcid))
            .filter_map(|&lcid| self.position(lcid))
            .find(|&pos| self.channels[pos].pending_bytes() > 0)
    }

    fn has_other_pending(&self, pos: usize) -> bool {
        self.has_pending_ces()
            || self
                .channels
                .iter()
                .enumerate()
                .any(|(i, ch)| i != pos && self.in_aggregate(ch.lcid()) && ch.pending_bytes() > 0)
    }

    // ------------------------------------------------------------------
    // Pending bytes
    // ------------------------------------------------------------------

    /// Bytes pending in the UE aggregate, subheaders included.
    pub fn pending_bytes(&self) -> u32 {
        self.aggregate()
            .fold(0, |sum: u32, ch| sum.saturating_add(ch.pending_bytes()))
    }

    /// Returns true if the UE aggregate has pending bytes
    pub fn has_pending_bytes(&self) -> bool {
        self.aggregate().any(|ch| ch.pending_bytes() > 0)
    }

    /// Aggregate pending bytes plus every pending CE.
    pub fn total_pending_bytes(&self) -> u32 {
        self.pending_bytes().saturating_add(self.pending_ce_bytes())
    }

    /// Bytes pending on `lcid`; zero if unconfigured or inactive.
    pub fn lcid_pending_bytes(&self, lcid: Lcid) -> u32 {
        self.position(lcid)
            .map_or(0, |pos| self.channels[pos].pending_bytes())
    }

    /// Returns true if `lcid` has pending bytes
    pub fn has_lcid_pending_bytes(&self, lcid: Lcid) -> bool {
        self.lcid_pending_bytes(lcid) > 0
    }

    /// Bytes billed to `slice_id`: the aggregate channels tagged with it,
    /// plus the pending CEs when the slice is their attribution target.
    pub fn slice_pending_bytes(&self, slice_id: RanSliceId) -> u32 {
        let sdu_bytes = self
            .aggregate()
            .filter(|ch| ch.slice_id == Some(slice_id))
            .fold(0, |sum: u32, ch| sum.saturating_add(ch.pending_bytes()));
        if self.pending_ce_slice() == Some(slice_id) {
            sdu_bytes.saturating_add(self.pending_ce_bytes())
        } else {
            sdu_bytes
        }
    }

    /// Returns true if `slice_id` has bytes billed to it
    pub fn has_slice_pending_bytes(&self, slice_id: RanSliceId) -> bool {
        self.slice_pending_bytes(slice_id) > 0
    }

    /// Slice the pending CEs are billed to.
    ///
    /// The non-SRB slice of the lowest-LCID aggregate channel with pending
    /// bytes wins; otherwise the SRB slice, provided some channel is tagged
    /// with it. `None` without pending CEs.
    pub fn pending_ce_slice(&self) -> Option<RanSliceId> {
        if !self.has_pending_ces() {
            return None;
        }
        self.aggregate()
            .filter(|ch| ch.pending_bytes() > 0)
            .find_map(|ch| ch.slice_id.filter(|&s| s != SRB_RAN_SLICE_ID))
            .or_else(|| {
                self.channels
                    .iter()
                    .any(|ch| ch.slice_id == Some(SRB_RAN_SLICE_ID))
                    .then_some(SRB_RAN_SLICE_ID)
            })
    }

    /// Bytes of every pending CE, Contention Resolution included.
    pub fn pending_ce_bytes(&self) -> u32 {
        self.pending_mac_ce_bytes() + self.pending_ue_con_res_id_ce_bytes()
    }

    /// Bytes of the pending CEs other than Contention Resolution.
    pub fn pending_mac_ce_bytes(&self) -> u32 {
        self.pending_ces
            .iter()
            .map(|ce| ce.ce_type.required_bytes())
            .sum()
    }

    /// Bytes of the pending Contention Resolution CE, if any.
    pub fn pending_ue_con_res_id_ce_bytes(&self) -> u32 {
        if self.pending_con_res_id.is_some() {
            MacCeType::ConResId.required_bytes()
        } else {
            0
        }
    }

    /// Returns true if any CE is pending, Contention Resolution included
    pub fn has_pending_ces(&self) -> bool {
        self.pending_con_res_id.is_some() || !self.pending_ces.is_empty()
    }

    /// Returns true if the Contention Resolution CE is pending
    pub fn is_con_res_id_pending(&self) -> bool {
        self.pending_con_res_id.is_some()
    }

    // ------------------------------------------------------------------
    // RAN slices
    // ------------------------------------------------------------------

    /// Bills `lcid` to `slice_id`. Buffer state is untouched.
    pub fn set_lcid_ran_slice(&mut self, lcid: Lcid, slice_id: RanSliceId) {
        match self.position(lcid) {
            Some(pos) => self.channels[pos].slice_id = Some(slice_id),
            None => debug!(parent: &self.span, %lcid, %slice_id, "Slice for unconfigured channel ignored"),
        }
    }

    /// Removes the slice of `lcid`.
    pub fn reset_lcid_ran_slice(&mut self, lcid: Lcid) {
        if let Some(pos) = self.position(lcid) {
            self.channels[pos].slice_id = None;
        }
    }

    /// Slice `lcid` is billed to
    pub fn lcid_ran_slice(&self, lcid: Lcid) -> Option<RanSliceId> {
        self.position(lcid).and_then(|pos| self.channels[pos].slice_id)
    }

    // ------------------------------------------------------------------
    // QoS
    // ------------------------------------------------------------------

    /// Average DL bit rate of a GBR channel in bits per second. Zero for
    /// non-GBR and unconfigured channels.
    pub fn average_bit_rate(&self, lcid: Lcid) -> u64 {
        self.position(lcid)
            .map(|pos| &self.channels[pos])
            .filter(|ch| ch.cfg.is_gbr())
            .and_then(|ch| ch.bit_rate.as_ref())
            .map_or(0, BitRateTracker::average_bit_rate)
    }

    fn position(&self, lcid: Lcid) -> Option<usize> {
        self.lcid_to_pos
            .get(lcid.index())
            .copied()
            .flatten()
            .map(usize::from)
    }

    fn in_aggregate(&self, lcid: Lcid) -> bool {
        if self.fallback {
            lcid == Lcid::SRB0 || lcid == Lcid::SRB1
        } else {
            lcid != Lcid::SRB0
        }
    }

    fn aggregate(&self) -> impl Iterator<Item = &ChannelContext> + '_ {
        self.channels
            .iter()
            .filter(move |ch| self.in_aggregate(ch.lcid()))
    }
}

fn gbr_window_ms(cfg: &LogicalChannelConfig, settings: &BitRateSettings) -> Option<u32> {
    let qos = cfg.qos.as_ref().filter(|qos| qos.is_gbr())?;
    Some(qos.averaging_window_ms.unwrap_or(settings.default_window_ms))
}
