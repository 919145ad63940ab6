//! DMA backend interface.

use core::fmt;
use core::ptr::NonNull;

use crate::error::DmaError;

/// Coherent memory block visible to both CPU and device.
pub struct CoherentAlloc {
    cpu: NonNull<u8>,
    bus: u64,
    size: usize,
    align: usize,
}

impl CoherentAlloc {
    /// # Safety
    /// - `cpu` must point to `size` writable bytes aligned to `align`
    /// - `bus` must be the device-visible address of the same memory
    pub unsafe fn new(cpu: NonNull<u8>, bus: u64, size: usize, align: usize) -> Self {
        Self { cpu, bus, size, align }
    }

    #[inline]
    pub fn cpu_ptr(&self) -> *mut u8 {
        self.cpu.as_ptr()
    }

    #[inline]
    pub fn bus_addr(&self) -> u64 {
        self.bus
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }
}

impl fmt::Debug for CoherentAlloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoherentAlloc")
            .field("cpu", &self.cpu)
            .field("bus", &format_args!("{:#x}", self.bus))
            .field("size", &format_args!("{:#x}", self.size))
            .finish()
    }
}

/// Streaming mapping of one packet segment.
///
/// Must be handed back to [`DmaOps::unmap_single`] exactly once.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct DmaMapping {
    bus: u64,
    len: usize,
}

impl DmaMapping {
    /// # Safety
    /// `bus` must be a live device mapping of `len` bytes.
    pub unsafe fn new(bus: u64, len: usize) -> Self {
        Self { bus, len }
    }

    #[inline]
    pub fn bus_addr(&self) -> u64 {
        self.bus
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Platform DMA services.
pub trait DmaOps {
    /// Allocate zeroed coherent memory.
    fn alloc_coherent(&self, size: usize, align: usize) -> Result<CoherentAlloc, DmaError>;

    /// Release memory from [`DmaOps::alloc_coherent`].
    fn free_coherent(&self, alloc: CoherentAlloc);

    /// Map a buffer for device reads.
    fn map_single(&self, buf: &[u8]) -> Result<DmaMapping, DmaError>;

    /// Tear down a mapping from [`DmaOps::map_single`].
    fn unmap_single(&self, mapping: DmaMapping);
}
