//! Scatter/gather list pool.
//!
//! One contiguous coherent block holding `records_per_pkt` records for
//! every ring slot. Slot `n`'s group starts at
//! `n * records_per_pkt * SG_DESC_SIZE` and is owned by whichever packet
//! occupies slot `n`.

use alloc::sync::Arc;

use super::mapping::DmaOps;
use super::region::DmaRegion;
use crate::error::DmaError;
use crate::types::repr_c::SG_PTR_OFFSET;
use crate::types::{SgListDesc, SG_DESC_SIZE, SG_ENTRIES_PER_DESC};

/// Gather records need only u64 alignment; round up to a cache line.
const SG_POOL_ALIGN: usize = 64;

pub struct SgPool<D: DmaOps> {
    region: DmaRegion<D>,
    slots: usize,
    records_per_pkt: usize,
}

impl<D: DmaOps> SgPool<D> {
    pub fn new(dma: Arc<D>, slots: usize, records_per_pkt: usize) -> Result<Self, DmaError> {
        let size = slots
            .checked_mul(records_per_pkt)
            .and_then(|n| n.checked_mul(SG_DESC_SIZE))
            .ok_or(DmaError::OutOfMemory)?;
        let region = DmaRegion::allocate(dma, size, SG_POOL_ALIGN)?;
        Ok(Self {
            region,
            slots,
            records_per_pkt,
        })
    }

    #[inline]
    pub fn records_per_pkt(&self) -> usize {
        self.records_per_pkt
    }

    /// Gather entries one slot can describe.
    #[inline]
    pub fn entries_per_pkt(&self) -> usize {
        self.records_per_pkt * SG_ENTRIES_PER_DESC
    }

    pub fn size(&self) -> usize {
        self.region.size()
    }

    #[inline]
    fn record_offset(&self, slot: usize, record: usize) -> usize {
        debug_assert!(slot < self.slots);
        debug_assert!(record < self.records_per_pkt);
        (slot * self.records_per_pkt + record) * SG_DESC_SIZE
    }

    /// Bus address of slot `slot`'s first record.
    pub fn group_bus_addr(&self, slot: usize) -> u64 {
        self.region.bus_at(self.record_offset(slot, 0))
    }

    /// Zero every record of a slot's group.
    pub fn clear(&self, slot: usize) {
        let off = self.record_offset(slot, 0);
        self.region.zero(off, self.records_per_pkt * SG_DESC_SIZE);
    }

    /// Write gather entry `index` of a slot's group.
    pub fn set_entry(&self, slot: usize, index: usize, len: u16, bus: u64) {
        let rec = self.record_offset(slot, index / SG_ENTRIES_PER_DESC);
        let lane = index % SG_ENTRIES_PER_DESC;
        self.region
            .write_bytes(rec + SgListDesc::len_index(lane) * 2, &len.to_le_bytes());
        self.region.write_u64(rec + SG_PTR_OFFSET + lane * 8, bus);
    }

    /// Read back record `record` of a slot's group.
    pub fn record(&self, slot: usize, record: usize) -> SgListDesc {
        let mut raw = [0u8; SG_DESC_SIZE];
        self.region
            .read_bytes(self.record_offset(slot, record), &mut raw);
        SgListDesc::from_bytes(&raw)
    }

    /// Read back gather entry `index` of a slot's group as `(len, bus)`.
    pub fn entry(&self, slot: usize, index: usize) -> (u16, u64) {
        self.record(slot, index / SG_ENTRIES_PER_DESC)
            .entry(index % SG_ENTRIES_PER_DESC)
    }
}
