//! Memory barriers.
//!
//! `wmb` orders descriptor stores before the doorbell write; `rmb` orders
//! the instruction count read before reads of completed state.

use core::sync::atomic::{fence, Ordering};

/// Store barrier.
#[inline]
pub fn wmb() {
    fence(Ordering::Release);
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("sfence", options(nostack, preserves_flags));
    }
}

/// Load barrier.
#[inline]
pub fn rmb() {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("lfence", options(nostack, preserves_flags));
    }
    fence(Ordering::Acquire);
}
