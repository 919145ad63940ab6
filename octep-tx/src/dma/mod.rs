//! DMA memory for the instruction queue.
//!
//! The queue never touches platform DMA directly: coherent ring memory and
//! streaming packet mappings go through a [`DmaOps`] backend.

pub mod mapping;
pub mod region;
pub mod identity;
pub mod sg_pool;

pub use mapping::{CoherentAlloc, DmaMapping, DmaOps};
pub use region::DmaRegion;
pub use identity::IdentityDma;
pub use sg_pool::SgPool;

/// Page size (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Align a value up to the given alignment.
#[inline]
pub const fn align_up(val: usize, align: usize) -> usize {
    (val + align - 1) & !(align - 1)
}
