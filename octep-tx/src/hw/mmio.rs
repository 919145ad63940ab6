//! MMIO accessors.
//!
//! # Safety
//! - Address must be a valid, mapped MMIO address
//! - Address must be 4-byte aligned

/// Read 32-bit value from MMIO address.
///
/// # Safety
/// Address must be valid, aligned MMIO address.
#[inline]
pub unsafe fn read32(addr: *const u32) -> u32 {
    core::ptr::read_volatile(addr)
}

/// Write 32-bit value to MMIO address.
///
/// # Safety
/// Address must be valid, aligned MMIO address.
#[inline]
pub unsafe fn write32(addr: *mut u32, value: u32) {
    core::ptr::write_volatile(addr, value)
}
