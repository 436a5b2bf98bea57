//! Logical-channel configuration
//!
//! A UE's logical channels are described by [`LogicalChannelConfig`] entries
//! (TS 38.331 `LogicalChannelConfig` plus the bearer's QoS descriptor). The
//! scheduler consumes them as a [`LogicalChannelConfigList`]: sorted by LCID,
//! always containing SRB0, with constant-time LCID and LCG-ID lookups built
//! once at construction. Lists are interned by a
//! [`LogicalChannelConfigPool`], so UEs with the same bearer setup share one
//! list and one entry per channel.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use bitvec::prelude::*;
use macsched_common::{LcgId, Lcid, MAX_GBR_AVERAGING_WINDOW_MS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config_pool::{ConfigObjectPool, ConfigPtr};
use crate::error::{ConfigError, ConfigResult};

/// Highest logical-channel priority value (lowest priority).
pub const MAX_LC_PRIORITY: u8 = 16;

/// Guaranteed/maximum bit rates of a GBR QoS flow, in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GbrQosInfo {
    /// Guaranteed downlink bit rate
    pub gbr_dl_bps: u64,
    /// Guaranteed uplink bit rate
    pub gbr_ul_bps: u64,
    /// Maximum downlink bit rate
    pub mbr_dl_bps: u64,
    /// Maximum uplink bit rate
    pub mbr_ul_bps: u64,
}

/// QoS descriptor of the bearer carried by a logical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QosConfig {
    /// 5G QoS Identifier
    pub five_qi: u16,
    /// ARP priority level (1-15)
    pub arp_priority: u8,
    /// Averaging window for bit-rate tracking (None = scheduler default)
    #[serde(default)]
    pub averaging_window_ms: Option<u32>,
    /// Present iff the bearer is GBR
    #[serde(default)]
    pub gbr: Option<GbrQosInfo>,
}

impl QosConfig {
    /// Creates a non-GBR QoS descriptor.
    pub fn non_gbr(five_qi: u16) -> Self {
        Self {
            five_qi,
            arp_priority: 15,
            averaging_window_ms: None,
            gbr: None,
        }
    }

    /// Creates a GBR QoS descriptor.
    pub fn gbr(five_qi: u16, gbr: GbrQosInfo, averaging_window_ms: Option<u32>) -> Self {
        Self {
            five_qi,
            arp_priority: 15,
            averaging_window_ms,
            gbr: Some(gbr),
        }
    }

    /// Returns true for GBR bearers
    pub fn is_gbr(&self) -> bool {
        self.gbr.is_some()
    }
}

/// Configuration of one logical channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalChannelConfig {
    /// Logical channel identifier
    pub lcid: Lcid,
    /// Logical channel group used in BSR reporting
    #[serde(default)]
    pub lcg_id: LcgId,
    /// Priority (1 = highest, 16 = lowest)
    pub priority: u8,
    /// Prioritized bit rate in kbps (None = infinity)
    #[serde(default)]
    pub prioritized_bit_rate_kbps: Option<u32>,
    /// Bucket size duration in milliseconds
    #[serde(default = "default_bucket_size_duration_ms")]
    pub bucket_size_duration_ms: u16,
    /// Scheduling request configuration used by this channel
    #[serde(default)]
    pub sr_id: Option<u8>,
    /// QoS descriptor of the carried bearer
    #[serde(default)]
    pub qos: Option<QosConfig>,
}

fn default_bucket_size_duration_ms() -> u16 {
    1000
}

impl LogicalChannelConfig {
    /// Creates a channel with the given identity and priority and no QoS.
    pub fn new(lcid: Lcid, lcg_id: LcgId, priority: u8) -> Self {
        Self {
            lcid,
            lcg_id,
            priority,
            prioritized_bit_rate_kbps: None,
            bucket_size_duration_ms: default_bucket_size_duration_ms(),
            sr_id: Some(0),
            qos: None,
        }
    }

    /// Default SRB0 configuration (TS 38.331 Section 9.2.1).
    pub fn srb0() -> Self {
        Self::new(Lcid::SRB0, LcgId::default(), 1)
    }

    /// Attaches a QoS descriptor.
    pub fn with_qos(mut self, qos: QosConfig) -> Self {
        self.qos = Some(qos);
        self
    }

    /// Returns true if the carried bearer is GBR
    pub fn is_gbr(&self) -> bool {
        self.qos.as_ref().is_some_and(QosConfig::is_gbr)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.priority == 0 || self.priority > MAX_LC_PRIORITY {
            return Err(ConfigError::InvalidPriority {
                lcid: self.lcid,
                priority: self.priority,
            });
        }
        if self.lcid == Lcid::SRB0 && self.lcg_id != LcgId::default() {
            return Err(ConfigError::InvalidSrb0Group {
                lcg_id: self.lcg_id,
            });
        }
        if let Some(qos) = &self.qos {
            if let Some(window_ms) = qos.averaging_window_ms {
                if window_ms == 0 || window_ms > MAX_GBR_AVERAGING_WINDOW_MS {
                    return Err(ConfigError::InvalidQos {
                        lcid: self.lcid,
                        reason: format!(
                            "averaging window must be in 1..={MAX_GBR_AVERAGING_WINDOW_MS} ms, got {window_ms}"
                        ),
                    });
                }
            }
            if qos.is_gbr() && self.lcid.is_srb() {
                return Err(ConfigError::InvalidQos {
                    lcid: self.lcid,
                    reason: "signalling bearers cannot be GBR".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A UE's logical channels, sorted by LCID.
///
/// SRB0 is always present. `contains`, `contains_lcg` and indexing by LCID
/// are constant time.
pub struct LogicalChannelConfigList {
    channels: Vec<ConfigPtr<LogicalChannelConfig>>,
    /// LCID -> position in `channels`, sized to the highest LCID present
    lcid_to_index: Vec<Option<u8>>,
    /// LCG-ID presence, sized to the highest LCG-ID present
    lcgs: BitVec<u8, Lsb0>,
}

impl LogicalChannelConfigList {
    /// Builds a list from raw channel configurations, interning each entry in
    /// `lc_pool`. Adds a default SRB0 entry when absent.
    pub fn build(
        lc_pool: &mut ConfigObjectPool<LogicalChannelConfig>,
        configs: &[LogicalChannelConfig],
    ) -> ConfigResult<Self> {
        let srb0 = LogicalChannelConfig::srb0();
        let mut sorted: Vec<&LogicalChannelConfig> = configs.iter().collect();
        sorted.sort_by_key(|cfg| cfg.lcid);
        for pair in sorted.windows(2) {
            if pair[0].lcid == pair[1].lcid {
                return Err(ConfigError::DuplicateLcid { lcid: pair[0].lcid });
            }
        }
        for cfg in &sorted {
            cfg.validate()?;
        }

        if sorted.first().map(|cfg| cfg.lcid) != Some(Lcid::SRB0) {
            sorted.insert(0, &srb0);
        }

        let channels: Vec<ConfigPtr<LogicalChannelConfig>> =
            sorted.iter().map(|cfg| lc_pool.create(cfg)).collect();

        let max_lcid = channels.last().map_or(0, |ch| ch.lcid.index());
        let mut lcid_to_index = vec![None; max_lcid + 1];
        for (pos, ch) in channels.iter().enumerate() {
            lcid_to_index[ch.lcid.index()] = Some(pos as u8);
        }

        let max_lcg = channels.iter().map(|ch| ch.lcg_id.index()).max().unwrap_or(0);
        let mut lcgs = bitvec![u8, Lsb0; 0; max_lcg + 1];
        for ch in &channels {
            lcgs.set(ch.lcg_id.index(), true);
        }

        Ok(Self {
            channels,
            lcid_to_index,
            lcgs,
        })
    }

    /// Returns the number of channels, SRB0 included
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false: SRB0 is always present
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Iterates the channels in ascending LCID order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigPtr<LogicalChannelConfig>> {
        self.channels.iter()
    }

    /// Iterates the configured LCIDs in ascending order.
    pub fn lcids(&self) -> impl Iterator<Item = Lcid> + '_ {
        self.channels.iter().map(|ch| ch.lcid)
    }

    /// Returns true if `lcid` is configured
    pub fn contains(&self, lcid: Lcid) -> bool {
        self.position(lcid).is_some()
    }

    /// Returns true if at least one channel belongs to `lcg_id`
    pub fn contains_lcg(&self, lcg_id: LcgId) -> bool {
        self.lcgs.get(lcg_id.index()).is_some_and(|bit| *bit)
    }

    /// Returns the position of `lcid` in LCID order.
    pub fn position(&self, lcid: Lcid) -> Option<usize> {
        self.lcid_to_index
            .get(lcid.index())
            .copied()
            .flatten()
            .map(usize::from)
    }

    /// Returns the configuration of `lcid`, if configured.
    pub fn get(&self, lcid: Lcid) -> Option<&ConfigPtr<LogicalChannelConfig>> {
        self.position(lcid).map(|pos| &self.channels[pos])
    }
}

impl Index<Lcid> for LogicalChannelConfigList {
    type Output = LogicalChannelConfig;

    /// # Panics
    ///
    /// Panics if `lcid` is not configured.
    fn index(&self, lcid: Lcid) -> &LogicalChannelConfig {
        match self.position(lcid) {
            Some(pos) => &self.channels[pos],
            None => panic!("{lcid} is not configured for this UE"),
        }
    }
}

impl PartialEq for LogicalChannelConfigList {
    fn eq(&self, other: &Self) -> bool {
        self.channels == other.channels
    }
}

impl Eq for LogicalChannelConfigList {}

impl Hash for LogicalChannelConfigList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.channels.hash(state);
    }
}

impl fmt::Debug for LogicalChannelConfigList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.channels.iter().map(|ch| &**ch)).finish()
    }
}

/// Interning pool for logical-channel configurations and lists.
#[derive(Debug, Default)]
pub struct LogicalChannelConfigPool {
    channels: ConfigObjectPool<LogicalChannelConfig>,
    lists: ConfigObjectPool<LogicalChannelConfigList>,
}

impl LogicalChannelConfigPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds (or reuses) the list for the given channel set.
    pub fn create(
        &mut self,
        configs: &[LogicalChannelConfig],
    ) -> ConfigResult<ConfigPtr<LogicalChannelConfigList>> {
        let list = LogicalChannelConfigList::build(&mut self.channels, configs)?;
        let reused = self.lists.find(&list);
        let ptr = reused.clone().unwrap_or_else(|| self.lists.create_owned(list));
        debug!(
            nof_channels = ptr.len(),
            reused = reused.is_some(),
            "Logical channel list configured"
        );
        Ok(ptr)
    }

    /// Returns the number of distinct channel configurations
    pub fn nof_channel_configs(&self) -> usize {
        self.channels.len()
    }

    /// Returns the number of distinct lists
    pub fn nof_lists(&self) -> usize {
        self.lists.len()
    }
}
