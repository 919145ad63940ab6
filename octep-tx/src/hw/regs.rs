//! Instruction queue registers.

use alloc::sync::Arc;
use core::fmt;

use super::mmio;

/// The two registers the transmit path touches.
pub trait IqRegisters {
    /// Tell the device `count` new instructions are in the ring.
    fn ring_doorbell(&self, count: u32);

    /// Cumulative count of instructions the device has fetched.
    ///
    /// Wraps at `u32::MAX`.
    fn instr_count(&self) -> u32;
}

impl<T: IqRegisters + ?Sized> IqRegisters for &T {
    fn ring_doorbell(&self, count: u32) {
        (**self).ring_doorbell(count)
    }

    fn instr_count(&self) -> u32 {
        (**self).instr_count()
    }
}

impl<T: IqRegisters + ?Sized> IqRegisters for Arc<T> {
    fn ring_doorbell(&self, count: u32) {
        (**self).ring_doorbell(count)
    }

    fn instr_count(&self) -> u32 {
        (**self).instr_count()
    }
}

/// Memory-mapped doorbell and instruction count registers of one queue.
pub struct MmioIqRegisters {
    doorbell: *mut u32,
    inst_cnt: *const u32,
}

impl MmioIqRegisters {
    /// # Safety
    /// Both pointers must be mapped, 4-byte aligned MMIO registers of the
    /// same queue and stay valid for the lifetime of this value.
    pub unsafe fn new(doorbell: *mut u32, inst_cnt: *const u32) -> Self {
        Self { doorbell, inst_cnt }
    }

    /// # Safety
    /// See [`MmioIqRegisters::new`]; `bar` is the mapped BAR base.
    pub unsafe fn from_bar(bar: *mut u8, doorbell_off: usize, inst_cnt_off: usize) -> Self {
        Self::new(
            bar.add(doorbell_off) as *mut u32,
            bar.add(inst_cnt_off) as *const u32,
        )
    }
}

impl IqRegisters for MmioIqRegisters {
    fn ring_doorbell(&self, count: u32) {
        unsafe { mmio::write32(self.doorbell, count) }
    }

    fn instr_count(&self) -> u32 {
        unsafe { mmio::read32(self.inst_cnt) }
    }
}

impl fmt::Debug for MmioIqRegisters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmioIqRegisters")
            .field("doorbell", &format_args!("{:p}", self.doorbell))
            .field("inst_cnt", &format_args!("{:p}", self.inst_cnt))
            .finish()
    }
}

// Safety: registers are only accessed through volatile 32-bit operations,
// and the queue serializes doorbell writes under its lock.
unsafe impl Send for MmioIqRegisters {}
unsafe impl Sync for MmioIqRegisters {}
