//! Scatter/gather list record (40 bytes).
//!
//! ```text
//! 63      48|47     32|31     16|15       0
//! -----------------------------------------
//! |  Len 0  |  Len 1  |  Len 2  |  Len 3  |
//! -----------------------------------------
//! |                Ptr 0                  |
//! |                Ptr 1                  |
//! |                Ptr 2                  |
//! |                Ptr 3                  |
//! -----------------------------------------
//! ```
//!
//! The four lengths share one little-endian 64-bit word with entry 0 in
//! the most significant half-word, so in memory `len[3]` holds entry 0's
//! length. `set_entry`/`entry` apply that mapping; `len`/`dma_ptr` are
//! the raw in-memory arrays.

use super::repr_c::{SG_DESC_SIZE, SG_PTR_OFFSET};

/// Buffers described by one record.
pub const SG_ENTRIES_PER_DESC: usize = 4;

/// Number of records needed to describe `entries` gather entries.
#[inline]
pub const fn sg_descs_for(entries: usize) -> usize {
    (entries + SG_ENTRIES_PER_DESC - 1) / SG_ENTRIES_PER_DESC
}

/// Records reserved per ring slot for packets of up to `max_frags`
/// fragments beyond the head.
#[inline]
pub const fn sg_descs_per_pkt(max_frags: usize) -> usize {
    sg_descs_for(max_frags + 1)
}

/// Decoded scatter/gather record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SgListDesc {
    /// Raw length array, in memory order.
    pub len: [u16; 4],
    /// Bus addresses, entry order.
    pub dma_ptr: [u64; 4],
}

impl SgListDesc {
    /// Memory index of the length belonging to gather entry `lane`.
    #[inline]
    pub const fn len_index(lane: usize) -> usize {
        SG_ENTRIES_PER_DESC - 1 - lane
    }

    /// Store entry `lane` (0..4).
    pub fn set_entry(&mut self, lane: usize, len: u16, addr: u64) {
        self.len[Self::len_index(lane)] = len;
        self.dma_ptr[lane] = addr;
    }

    /// Load entry `lane` as `(len, addr)`.
    pub fn entry(&self, lane: usize) -> (u16, u64) {
        (self.len[Self::len_index(lane)], self.dma_ptr[lane])
    }

    pub fn to_bytes(&self) -> [u8; SG_DESC_SIZE] {
        let mut out = [0u8; SG_DESC_SIZE];
        for (i, len) in self.len.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&len.to_le_bytes());
        }
        for (i, ptr) in self.dma_ptr.iter().enumerate() {
            let off = SG_PTR_OFFSET + i * 8;
            out[off..off + 8].copy_from_slice(&ptr.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8; SG_DESC_SIZE]) -> Self {
        let mut desc = Self::default();
        for i in 0..SG_ENTRIES_PER_DESC {
            desc.len[i] = u16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
            let off = SG_PTR_OFFSET + i * 8;
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[off..off + 8]);
            desc.dma_ptr[i] = u64::from_le_bytes(word);
        }
        desc
    }
}
