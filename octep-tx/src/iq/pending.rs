//! Per-slot ownership of in-flight packets.
//!
//! Every ring slot has one entry. An entry holds a buffer only between
//! the post of its instruction and the reclaim of that slot.

use alloc::vec::Vec;

use crate::dma::{DmaMapping, DmaOps};
use crate::error::PendingError;

/// How a slot's packet was handed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxBufType {
    /// Slot not posted.
    #[default]
    None,
    /// `dptr` addresses the packet directly.
    Single,
    /// `dptr` addresses the slot's gather list.
    Gather,
}

struct PendingEntry<B> {
    buffer: Option<B>,
    mappings: Vec<DmaMapping>,
    kind: TxBufType,
    len: u32,
}

/// A buffer handed back by [`PendingTable::release`].
#[derive(Debug)]
pub struct Released<B> {
    pub buffer: B,
    pub kind: TxBufType,
    pub len: u32,
}

pub struct PendingTable<B> {
    entries: Vec<PendingEntry<B>>,
    in_flight: usize,
}

impl<B> PendingTable<B> {
    /// Table for `slots` ring slots, each able to hold `max_mappings`
    /// mappings without reallocating.
    pub fn new(slots: usize, max_mappings: usize) -> Self {
        let entries = (0..slots)
            .map(|_| PendingEntry {
                buffer: None,
                mappings: Vec::with_capacity(max_mappings),
                kind: TxBufType::None,
                len: 0,
            })
            .collect();
        Self {
            entries,
            in_flight: 0,
        }
    }

    pub fn slots(&self) -> usize {
        self.entries.len()
    }

    /// Slots currently holding a buffer.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_in_flight(&self, slot: u32) -> bool {
        self.entries
            .get(slot as usize)
            .map_or(false, |e| e.buffer.is_some())
    }

    pub fn kind(&self, slot: u32) -> TxBufType {
        self.entries
            .get(slot as usize)
            .map_or(TxBufType::None, |e| e.kind)
    }

    /// Take ownership of `buffer` for `slot`, moving the slot's mappings
    /// out of `mappings`.
    ///
    /// An occupied slot refuses the buffer and leaves `mappings` alone.
    pub fn record(
        &mut self,
        slot: u32,
        buffer: B,
        kind: TxBufType,
        len: u32,
        mappings: &mut Vec<DmaMapping>,
    ) -> Result<(), (PendingError, B)> {
        let Some(entry) = self.entries.get_mut(slot as usize) else {
            return Err((PendingError::NotInFlight(slot), buffer));
        };
        if entry.buffer.is_some() {
            return Err((PendingError::InFlight(slot), buffer));
        }
        debug_assert!(kind != TxBufType::None);
        entry.buffer = Some(buffer);
        entry.mappings.append(mappings);
        entry.kind = kind;
        entry.len = len;
        self.in_flight += 1;
        Ok(())
    }

    /// Unmap and hand back the buffer held by `slot`.
    pub fn release<D: DmaOps + ?Sized>(
        &mut self,
        slot: u32,
        dma: &D,
    ) -> Result<Released<B>, PendingError> {
        let entry = self
            .entries
            .get_mut(slot as usize)
            .ok_or(PendingError::NotInFlight(slot))?;
        let buffer = entry.buffer.take().ok_or(PendingError::NotInFlight(slot))?;
        for m in entry.mappings.drain(..) {
            dma.unmap_single(m);
        }
        let kind = core::mem::take(&mut entry.kind);
        let len = core::mem::take(&mut entry.len);
        self.in_flight -= 1;
        Ok(Released { buffer, kind, len })
    }

    /// Release every occupied slot, in slot order.
    pub fn drain_all<D: DmaOps + ?Sized>(&mut self, dma: &D) -> Vec<B> {
        let mut out = Vec::with_capacity(self.in_flight);
        for slot in 0..self.entries.len() as u32 {
            if let Ok(r) = self.release(slot, dma) {
                out.push(r.buffer);
            }
        }
        out
    }
}
