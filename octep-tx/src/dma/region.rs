//! Owned coherent DMA region.
//!
//! All CPU accesses are bounds-checked volatile operations; the device may
//! be reading the same memory concurrently.

use alloc::sync::Arc;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr;

use super::mapping::{CoherentAlloc, DmaOps};
use crate::error::DmaError;

/// Coherent memory freed back to its backend on drop.
pub struct DmaRegion<D: DmaOps> {
    dma: Arc<D>,
    alloc: ManuallyDrop<CoherentAlloc>,
}

impl<D: DmaOps> DmaRegion<D> {
    /// Allocate a zeroed region of `size` bytes.
    pub fn allocate(dma: Arc<D>, size: usize, align: usize) -> Result<Self, DmaError> {
        if size == 0 {
            return Err(DmaError::ZeroLength);
        }
        if align == 0 || !align.is_power_of_two() {
            return Err(DmaError::InvalidAlignment);
        }
        let alloc = dma.alloc_coherent(size, align)?;
        Ok(Self {
            dma,
            alloc: ManuallyDrop::new(alloc),
        })
    }

    /// Bus base address (what devices see).
    #[inline]
    pub fn bus_base(&self) -> u64 {
        self.alloc.bus_addr()
    }

    /// Bus address at offset.
    #[inline]
    pub fn bus_at(&self, offset: usize) -> u64 {
        self.alloc.bus_addr() + offset as u64
    }

    /// Total size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.alloc.size()
    }

    #[inline]
    fn check(&self, offset: usize, len: usize) {
        assert!(
            offset.checked_add(len).map_or(false, |end| end <= self.size()),
            "BUG: DMA access {:#x}+{:#x} outside region of {:#x}",
            offset,
            len,
            self.size()
        );
    }

    /// Store a little-endian u64 at an 8-byte aligned offset.
    pub fn write_u64(&self, offset: usize, value: u64) {
        self.check(offset, 8);
        debug_assert_eq!(offset % 8, 0);
        unsafe {
            let p = self.alloc.cpu_ptr().add(offset) as *mut u64;
            ptr::write_volatile(p, value.to_le());
        }
    }

    /// Load a little-endian u64 from an 8-byte aligned offset.
    pub fn read_u64(&self, offset: usize) -> u64 {
        self.check(offset, 8);
        debug_assert_eq!(offset % 8, 0);
        unsafe {
            let p = self.alloc.cpu_ptr().add(offset) as *const u64;
            u64::from_le(ptr::read_volatile(p))
        }
    }

    pub fn write_bytes(&self, offset: usize, data: &[u8]) {
        self.check(offset, data.len());
        let base = unsafe { self.alloc.cpu_ptr().add(offset) };
        for (i, b) in data.iter().enumerate() {
            unsafe { ptr::write_volatile(base.add(i), *b) };
        }
    }

    pub fn read_bytes(&self, offset: usize, out: &mut [u8]) {
        self.check(offset, out.len());
        let base = unsafe { self.alloc.cpu_ptr().add(offset) };
        for (i, b) in out.iter_mut().enumerate() {
            *b = unsafe { ptr::read_volatile(base.add(i)) };
        }
    }

    /// Zero `len` bytes starting at `offset`.
    pub fn zero(&self, offset: usize, len: usize) {
        self.check(offset, len);
        unsafe { ptr::write_bytes(self.alloc.cpu_ptr().add(offset), 0, len) };
    }
}

impl<D: DmaOps> Drop for DmaRegion<D> {
    fn drop(&mut self) {
        // Safety: `alloc` is never touched again after this.
        let alloc = unsafe { ManuallyDrop::take(&mut self.alloc) };
        self.dma.free_coherent(alloc);
    }
}

// Safety: the region is only accessed through volatile operations on
// memory it exclusively owns.
unsafe impl<D: DmaOps + Send + Sync> Send for DmaRegion<D> {}
unsafe impl<D: DmaOps + Send + Sync> Sync for DmaRegion<D> {}

impl<D: DmaOps> fmt::Debug for DmaRegion<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DmaRegion")
            .field("cpu_ptr", &self.alloc.cpu_ptr())
            .field("bus_addr", &format_args!("{:#x}", self.bus_base()))
            .field("size", &format_args!("{:#x}", self.size()))
            .finish()
    }
}
