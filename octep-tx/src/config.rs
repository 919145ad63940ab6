//! Queue configuration.

use crate::error::QueueError;
use crate::types::{sg_descs_per_pkt, FSZ_MAX, GSZ_MAX, PKIND_MAX};

/// Default descriptors per instruction queue.
pub const DEFAULT_NUM_DESCRIPTORS: u32 = 1024;

/// Largest supported ring.
pub const MAX_NUM_DESCRIPTORS: u32 = 1 << 16;

/// Default fragment limit beyond the head buffer.
pub const DEFAULT_MAX_FRAGMENTS: usize = 17;

/// Default number of instructions batched per doorbell write.
pub const DEFAULT_FILL_THRESHOLD: u32 = 8;

/// Default free slots required before a stopped queue restarts.
pub const DEFAULT_WAKE_THRESHOLD: u32 = 1;

/// Instruction queue configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Queue number, for diagnostics.
    pub queue_no: u32,
    /// Ring capacity; power of two.
    pub num_descriptors: u32,
    /// Fragments a packet may carry beyond its head buffer.
    pub max_fragments: usize,
    /// Instructions written before a doorbell write is forced.
    pub fill_threshold: u32,
    /// Admissible posts required to restart a stopped queue.
    pub wake_threshold: u32,
    /// Device kind tag reported by firmware.
    pub pkind: u8,
    /// Front data size reported by firmware, in 8-byte units.
    pub front_data_size: u8,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_no: 0,
            num_descriptors: DEFAULT_NUM_DESCRIPTORS,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            fill_threshold: DEFAULT_FILL_THRESHOLD,
            wake_threshold: DEFAULT_WAKE_THRESHOLD,
            pkind: 0,
            front_data_size: 0,
        }
    }
}

impl QueueConfig {
    /// Configuration for a ring of `capacity` slots accepting packets
    /// with up to `max_fragments` fragments beyond the head.
    ///
    /// The fill threshold is clamped so that small rings still batch.
    pub fn new(capacity: u32, max_fragments: usize) -> Self {
        let fill_threshold = DEFAULT_FILL_THRESHOLD.min(capacity.saturating_sub(1).max(1));
        Self {
            num_descriptors: capacity,
            max_fragments,
            fill_threshold,
            ..Self::default()
        }
    }

    pub fn with_queue_no(mut self, queue_no: u32) -> Self {
        self.queue_no = queue_no;
        self
    }

    pub fn with_fill_threshold(mut self, fill_threshold: u32) -> Self {
        self.fill_threshold = fill_threshold;
        self
    }

    pub fn with_wake_threshold(mut self, wake_threshold: u32) -> Self {
        self.wake_threshold = wake_threshold;
        self
    }

    /// Firmware-reported kind tag and front-data size.
    pub fn with_firmware_info(mut self, pkind: u8, front_data_size: u8) -> Self {
        self.pkind = pkind;
        self.front_data_size = front_data_size;
        self
    }

    /// Gather list records reserved per ring slot.
    pub fn sg_descs_per_pkt(&self) -> usize {
        sg_descs_per_pkt(self.max_fragments)
    }

    /// Front data length in bytes.
    pub fn front_data_bytes(&self) -> usize {
        self.front_data_size as usize * 8
    }

    /// Check every field against what the ring and the header can encode.
    pub fn validate(&self) -> Result<(), QueueError> {
        let n = self.num_descriptors;
        if n < 2 || n > MAX_NUM_DESCRIPTORS || !n.is_power_of_two() {
            return Err(QueueError::InvalidCapacity(n));
        }
        if self.max_fragments + 1 > GSZ_MAX as usize {
            return Err(QueueError::InvalidMaxFragments(self.max_fragments));
        }
        if self.fill_threshold == 0 || self.fill_threshold >= n {
            return Err(QueueError::InvalidFillThreshold(self.fill_threshold));
        }
        if self.wake_threshold == 0 || self.wake_threshold >= n {
            return Err(QueueError::InvalidWakeThreshold(self.wake_threshold));
        }
        if self.pkind > PKIND_MAX || self.front_data_size > FSZ_MAX {
            return Err(QueueError::InvalidFirmwareInfo);
        }
        Ok(())
    }
}
