//! Sliding-window bit-rate tracking for GBR bearers
//!
//! Bytes scheduled on a GBR logical channel are accumulated during a slot
//! and pushed into a ring of per-slot samples at the slot boundary. The ring
//! spans the bearer's averaging window (TS 23.501 Section 5.7.3.6), so the
//! average bit rate is the window sum scaled to one second. The ring is
//! allocated once at (re)configuration; pushing a sample never allocates.

use macsched_common::{SchedulerConfig, MAX_GBR_AVERAGING_WINDOW_MS};

/// Cell-wide parameters of GBR bit-rate tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRateSettings {
    /// Slots per millisecond, fixed by the subcarrier spacing
    pub slots_per_ms: u32,
    /// Window applied to GBR bearers that do not configure one
    pub default_window_ms: u32,
}

impl From<&SchedulerConfig> for BitRateSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            slots_per_ms: config.scs.slots_per_subframe(),
            default_window_ms: config.default_gbr_averaging_window_ms,
        }
    }
}

impl Default for BitRateSettings {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

/// Per-slot byte samples over one averaging window.
#[derive(Debug, Clone)]
pub struct BitRateTracker {
    samples: Box<[u32]>,
    next: usize,
    window_sum: u64,
    window_ms: u32,
    slot_bytes: u32,
}

impl BitRateTracker {
    /// Creates a tracker averaging over `window_ms` milliseconds of
    /// `slots_per_ms` slots each. The window is clamped to
    /// 1..=[`MAX_GBR_AVERAGING_WINDOW_MS`].
    pub fn new(window_ms: u32, slots_per_ms: u32) -> Self {
        let window_ms = window_ms.clamp(1, MAX_GBR_AVERAGING_WINDOW_MS);
        let len = (window_ms as usize) * (slots_per_ms.max(1) as usize);
        Self {
            samples: vec![0; len].into_boxed_slice(),
            next: 0,
            window_sum: 0,
            window_ms,
            slot_bytes: 0,
        }
    }

    /// Averaging window in milliseconds
    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Number of slots in the window
    pub fn window_slots(&self) -> usize {
        self.samples.len()
    }

    /// Records bytes scheduled in the current slot.
    pub fn add_bytes(&mut self, bytes: u32) {
        self.slot_bytes = self.slot_bytes.saturating_add(bytes);
    }

    /// Closes the current slot: its bytes enter the window and the oldest
    /// slot leaves it.
    pub fn slot_indication(&mut self) {
        let evicted = std::mem::replace(&mut self.samples[self.next], self.slot_bytes);
        self.window_sum = self.window_sum - u64::from(evicted) + u64::from(self.slot_bytes);
        self.slot_bytes = 0;
        self.next = (self.next + 1) % self.samples.len();
    }

    /// Average bit rate over the window, in bits per second.
    ///
    /// The sum is always divided by the full window, also while the window
    /// is still filling up after (re)configuration.
    pub fn average_bit_rate(&self) -> u64 {
        self.window_sum * 8 * 1000 / u64::from(self.window_ms)
    }
}
