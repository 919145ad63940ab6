//! Device access: MMIO, memory barriers and the per-queue registers.

pub mod barriers;
pub mod mmio;
pub mod regs;

pub use regs::{IqRegisters, MmioIqRegisters};
