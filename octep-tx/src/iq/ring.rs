//! Instruction ring and its index protocol.
//!
//! ```text
//!        flush_index      device_read_index      write_index
//!             |                   |                   |
//!   ... free  | consumed, awaiting | posted, not yet   | free ...
//!             |     reclaim       | fetched by device |
//! ```
//!
//! All indices wrap at the ring capacity. One slot always stays empty so
//! that `write_index == flush_index` means empty and never full.

use log::{trace, warn};

use crate::dma::{DmaOps, DmaRegion};
use crate::hw::barriers::{rmb, wmb};
use crate::hw::IqRegisters;
use crate::types::{TxDesc, TX_DESC_SIZE, TX_DESC_WORDS};

/// Occupancy of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqState {
    /// Nothing in flight.
    Empty,
    /// Some slots in flight, at least one post admissible.
    Active,
    /// `capacity - 1` slots in flight; posts refused until reclaim.
    Full,
}

/// Snapshot of the ring indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingIndices {
    pub write: u32,
    pub device_read: u32,
    pub flush: u32,
    pub fill_count: u32,
}

/// Outcome of a successful [`InstrRing::post`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posted {
    /// Slot the instruction was written to.
    pub slot: u32,
    /// The ring became full with this post.
    pub stop: bool,
}

pub struct InstrRing<D: DmaOps> {
    region: DmaRegion<D>,
    capacity: u32,
    mask: u32,
    write_index: u32,
    device_read_index: u32,
    flush_index: u32,
    fill_count: u32,
    fill_threshold: u32,
    /// Last value read from the instruction count register.
    pkt_in_done: u32,
}

impl<D: DmaOps> InstrRing<D> {
    /// Wrap a region of `capacity * TX_DESC_SIZE` bytes.
    ///
    /// `inst_cnt` is the current instruction count register value; only
    /// increments past it are treated as completions.
    pub fn new(region: DmaRegion<D>, capacity: u32, fill_threshold: u32, inst_cnt: u32) -> Self {
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(region.size() >= capacity as usize * TX_DESC_SIZE);
        Self {
            region,
            capacity,
            mask: capacity - 1,
            write_index: 0,
            device_read_index: 0,
            flush_index: 0,
            fill_count: 0,
            fill_threshold,
            pkt_in_done: inst_cnt,
        }
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn write_index(&self) -> u32 {
        self.write_index
    }

    #[inline]
    pub fn fill_count(&self) -> u32 {
        self.fill_count
    }

    pub fn bus_addr(&self) -> u64 {
        self.region.bus_base()
    }

    #[inline]
    fn distance(&self, from: u32, to: u32) -> u32 {
        to.wrapping_sub(from) & self.mask
    }

    /// Slots posted and not yet reclaimed.
    #[inline]
    pub fn pending(&self) -> u32 {
        self.distance(self.flush_index, self.write_index)
    }

    /// Posts admissible right now.
    #[inline]
    pub fn free_slots(&self) -> u32 {
        self.capacity - 1 - self.pending()
    }

    /// Slots the device has fetched that await reclaim.
    #[inline]
    pub fn reclaimable(&self) -> u32 {
        self.distance(self.flush_index, self.device_read_index)
    }

    pub fn state(&self) -> IqState {
        match self.pending() {
            0 => IqState::Empty,
            n if n == self.capacity - 1 => IqState::Full,
            _ => IqState::Active,
        }
    }

    pub fn indices(&self) -> RingIndices {
        RingIndices {
            write: self.write_index,
            device_read: self.device_read_index,
            flush: self.flush_index,
            fill_count: self.fill_count,
        }
    }

    /// Doorbell batch is due.
    #[inline]
    pub fn should_announce(&self) -> bool {
        self.fill_count >= self.fill_threshold
    }

    /// Write `desc` at the write index and advance it.
    ///
    /// The ring must not be full.
    pub fn post(&mut self, desc: &TxDesc) -> Posted {
        debug_assert_ne!(self.state(), IqState::Full);
        let slot = self.write_index;
        let base = slot as usize * TX_DESC_SIZE;
        for (i, word) in desc.to_words().iter().enumerate() {
            self.region.write_u64(base + i * 8, *word);
        }
        self.write_index = (self.write_index + 1) & self.mask;
        self.fill_count += 1;
        Posted {
            slot,
            stop: self.state() == IqState::Full,
        }
    }

    /// Decode the instruction stored at `slot`.
    pub fn read(&self, slot: u32) -> TxDesc {
        let base = (slot & self.mask) as usize * TX_DESC_SIZE;
        let mut words = [0u64; TX_DESC_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.region.read_u64(base + i * 8);
        }
        TxDesc::from_words(&words)
    }

    /// Publish the unannounced instructions through the doorbell.
    ///
    /// Returns the count written, 0 if there was nothing to announce.
    pub fn announce<R: IqRegisters + ?Sized>(&mut self, regs: &R) -> u32 {
        let count = self.fill_count;
        if count == 0 {
            return 0;
        }
        wmb();
        regs.ring_doorbell(count);
        self.fill_count = 0;
        trace!("doorbell: {} instructions, write_index {}", count, self.write_index);
        count
    }

    /// Advance the device read index from the instruction count register.
    ///
    /// Returns the number of newly fetched instructions.
    pub fn refresh_read_index<R: IqRegisters + ?Sized>(&mut self, regs: &R) -> u32 {
        let count = regs.instr_count();
        rmb();
        let mut delta = count.wrapping_sub(self.pkt_in_done);
        self.pkt_in_done = count;
        if delta == 0 {
            return 0;
        }
        let outstanding = self.distance(self.device_read_index, self.write_index);
        if delta > outstanding {
            warn!(
                "device reports {} fetched, only {} outstanding; clamping",
                delta, outstanding
            );
            delta = outstanding;
        }
        self.device_read_index = (self.device_read_index + delta) & self.mask;
        delta
    }

    /// Hand out the oldest fetched slot and advance the flush index past it.
    pub fn next_reclaimable(&mut self) -> Option<u32> {
        if self.flush_index == self.device_read_index {
            return None;
        }
        let slot = self.flush_index;
        self.flush_index = (self.flush_index + 1) & self.mask;
        Some(slot)
    }
}
