//! Octeon EP VF transmit path.
//!
//! Instruction queue driver core: descriptor codec, gather lists, the
//! instruction ring shared with the device, and the queue controller that
//! posts packets and reclaims them once the device has fetched them.
//!
//! Bus enumeration, interrupt setup and register mapping belong to the
//! surrounding driver. It hands each queue an [`IqRegisters`]
//! implementation and a [`DmaOps`] backend.
//!
//! # Usage
//!
//! ```ignore
//! use octep_tx::{QueueConfig, TxQueue, TxPacket, IdentityDma, MmioIqRegisters};
//!
//! let regs = unsafe { MmioIqRegisters::from_bar(bar, DBELL_OFF, CNT_OFF) };
//! let queue = TxQueue::create(QueueConfig::default(), regs, Arc::new(IdentityDma::new()))?;
//!
//! match queue.transmit(TxPacket::new(frame)) {
//!     Ok(acc) if acc.stop_queue => netif_stop(),
//!     Ok(_) => {}
//!     Err(e) => handle(e.into_packet()),
//! }
//! queue.flush();
//!
//! // From the completion interrupt:
//! let done = queue.reclaim();
//! if done.restarted {
//!     netif_wake();
//! }
//! ```

#![no_std]

extern crate alloc;

pub mod config;
pub mod dma;
pub mod error;
pub mod hw;
pub mod iq;
pub mod types;

#[cfg(feature = "smoltcp")]
pub mod stack;

pub use config::QueueConfig;
pub use dma::{DmaMapping, DmaOps, DmaRegion, IdentityDma};
pub use error::{DmaError, PendingError, QueueError, TxError};
pub use hw::{IqRegisters, MmioIqRegisters};
pub use iq::{
    FragmentedBuffer, IqState, IqStats, ReclaimResult, TxAccepted, TxBuffer, TxOffload, TxPacket,
    TxQueue,
};
pub use types::{IqSendStatus, OffloadFlags, TxDesc};

#[cfg(feature = "smoltcp")]
pub use stack::TxDeviceAdapter;
