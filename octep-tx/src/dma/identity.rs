//! Identity-mapped DMA backend.
//!
//! Bus addresses equal CPU addresses. Suitable for platforms without an
//! IOMMU and for host-side simulation of the device.

use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::mapping::{CoherentAlloc, DmaMapping, DmaOps};
use crate::error::DmaError;

/// Heap-backed DMA with live allocation and mapping counters.
#[derive(Debug, Default)]
pub struct IdentityDma {
    live_allocations: AtomicUsize,
    live_mappings: AtomicUsize,
}

impl IdentityDma {
    pub const fn new() -> Self {
        Self {
            live_allocations: AtomicUsize::new(0),
            live_mappings: AtomicUsize::new(0),
        }
    }

    /// Coherent blocks not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.live_allocations.load(Ordering::Acquire)
    }

    /// Streaming mappings not yet unmapped.
    pub fn live_mappings(&self) -> usize {
        self.live_mappings.load(Ordering::Acquire)
    }
}

impl DmaOps for IdentityDma {
    fn alloc_coherent(&self, size: usize, align: usize) -> Result<CoherentAlloc, DmaError> {
        if size == 0 {
            return Err(DmaError::ZeroLength);
        }
        let layout = Layout::from_size_align(size, align).map_err(|_| DmaError::InvalidAlignment)?;
        let ptr = NonNull::new(unsafe { alloc_zeroed(layout) }).ok_or(DmaError::OutOfMemory)?;
        self.live_allocations.fetch_add(1, Ordering::AcqRel);
        Ok(unsafe { CoherentAlloc::new(ptr, ptr.as_ptr() as u64, size, align) })
    }

    fn free_coherent(&self, alloc: CoherentAlloc) {
        // Layout was validated when the block was handed out.
        if let Ok(layout) = Layout::from_size_align(alloc.size(), alloc.align()) {
            unsafe { dealloc(alloc.cpu_ptr(), layout) };
            self.live_allocations.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn map_single(&self, buf: &[u8]) -> Result<DmaMapping, DmaError> {
        if buf.is_empty() {
            return Err(DmaError::ZeroLength);
        }
        self.live_mappings.fetch_add(1, Ordering::AcqRel);
        Ok(unsafe { DmaMapping::new(buf.as_ptr() as u64, buf.len()) })
    }

    fn unmap_single(&self, _mapping: DmaMapping) {
        self.live_mappings.fetch_sub(1, Ordering::AcqRel);
    }
}
