//! #[repr(C)] mirrors of the device-parsed records.
//!
//! CRITICAL: These structures MUST match the hardware layout exactly.
//! The device reads them straight out of DMA memory, so no implicit
//! padding is allowed. The codec in the sibling modules never transmutes
//! these types; they exist to pin sizes and field offsets at compile time.

use core::mem::{offset_of, size_of};

/// 64-byte instruction as laid out in the descriptor ring.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxDescHw {
    /// Bus address of the packet data or of a gather list.
    pub dptr: u64,
    /// Bit-packed instruction header.
    pub ih64: u64,
    /// Transmit metadata (front data).
    pub txm64: [u64; 2],
    /// Additional headers available in a 64-byte instruction.
    pub exhdr: [u64; 4],
}

/// One hardware gather list record: four lengths, then four pointers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SgListHw {
    pub len: [u16; 4],
    pub dma_ptr: [u64; 4],
}

/// Instruction size in bytes.
pub const TX_DESC_SIZE: usize = size_of::<TxDescHw>();

/// Gather list record size in bytes.
pub const SG_DESC_SIZE: usize = size_of::<SgListHw>();

/// Transmit metadata block size in bytes.
pub const TX_MDATA_SIZE: usize = 16;

pub(crate) const DPTR_OFFSET: usize = offset_of!(TxDescHw, dptr);
pub(crate) const IH_OFFSET: usize = offset_of!(TxDescHw, ih64);
pub(crate) const TXM_OFFSET: usize = offset_of!(TxDescHw, txm64);
pub(crate) const EXHDR_OFFSET: usize = offset_of!(TxDescHw, exhdr);
pub(crate) const SG_PTR_OFFSET: usize = offset_of!(SgListHw, dma_ptr);

const _: () = assert!(TX_DESC_SIZE == 64);
const _: () = assert!(SG_DESC_SIZE == 40);
const _: () = assert!(DPTR_OFFSET == 0);
const _: () = assert!(IH_OFFSET == 8);
const _: () = assert!(TXM_OFFSET == 16);
const _: () = assert!(EXHDR_OFFSET == 32);
const _: () = assert!(SG_PTR_OFFSET == 8);
