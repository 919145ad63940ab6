//! smoltcp integration layer.
//!
//! [`TxDeviceAdapter`] exposes a transmit queue as a smoltcp `Device`.
//! Only the send side is wired up; `receive` never yields a frame.
//!
//! # Usage
//!
//! ```ignore
//! use octep_tx::stack::TxDeviceAdapter;
//!
//! let queue = TxQueue::create(QueueConfig::default(), regs, dma)?;
//! let mut device = TxDeviceAdapter::new(queue);
//! iface.poll(now, &mut device, &mut sockets);
//! ```

use alloc::vec;
use alloc::vec::Vec;

use log::debug;
use smoltcp::phy::{Checksum, Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use crate::dma::DmaOps;
use crate::hw::IqRegisters;
use crate::iq::{TxOffload, TxPacket, TxQueue};
use crate::types::OffloadFlags;

/// Ethernet frame size without FCS.
pub const MTU: usize = 1514;

/// Thin adapter that exposes a [`TxQueue`] to smoltcp.
pub struct TxDeviceAdapter<R: IqRegisters, D: DmaOps> {
    queue: TxQueue<R, D, Vec<u8>>,
    offload: TxOffload,
    tx_errors: u32,
}

impl<R: IqRegisters, D: DmaOps> TxDeviceAdapter<R, D> {
    pub fn new(queue: TxQueue<R, D, Vec<u8>>) -> Self {
        Self {
            queue,
            offload: TxOffload::none(),
            tx_errors: 0,
        }
    }

    /// Request `offload` on every frame. Checksum offloads are advertised
    /// to smoltcp so it leaves those fields to the device.
    pub fn with_offload(mut self, offload: TxOffload) -> Self {
        self.offload = offload;
        self
    }

    pub fn queue(&self) -> &TxQueue<R, D, Vec<u8>> {
        &self.queue
    }

    pub fn into_queue(self) -> TxQueue<R, D, Vec<u8>> {
        self.queue
    }

    /// Frames smoltcp produced that the queue refused.
    pub fn tx_errors(&self) -> u32 {
        self.tx_errors
    }

    fn send(&mut self, frame: Vec<u8>) {
        if let Err(e) = self.queue.transmit(TxPacket::with_offload(frame, self.offload)) {
            self.tx_errors += 1;
            debug!("IQ[{}]: frame not sent: {}", self.queue.queue_no(), e);
        }
        self.queue.flush();
    }
}

fn offload_checksum(flags: OffloadFlags, bit: OffloadFlags) -> Checksum {
    if flags.contains(bit) {
        Checksum::Rx
    } else {
        Checksum::Both
    }
}

impl<R: IqRegisters, D: DmaOps> Device for TxDeviceAdapter<R, D> {
    type RxToken<'a> = NoRxToken where Self: 'a;
    type TxToken<'a> = QueueTxToken<'a, R, D> where Self: 'a;

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = MTU;
        caps.medium = Medium::Ethernet;
        let flags = self.offload.flags;
        caps.checksum.ipv4 = offload_checksum(flags, OffloadFlags::IPV4_CKSUM);
        caps.checksum.udp = offload_checksum(flags, OffloadFlags::UDP_CKSUM);
        caps.checksum.tcp = offload_checksum(flags, OffloadFlags::TCP_CKSUM);
        caps
    }

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        None
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        // Completed frames are dropped here.
        let reclaimed = self.queue.reclaim();
        drop(reclaimed.buffers);
        if self.queue.free_slots() > 0 {
            Some(QueueTxToken { adapter: self })
        } else {
            None
        }
    }
}

/// Receive token that can never be constructed.
pub enum NoRxToken {}

impl RxToken for NoRxToken {
    fn consume<T, F>(self, _f: F) -> T
    where
        F: FnOnce(&mut [u8]) -> T,
    {
        match self {}
    }
}

pub struct QueueTxToken<'a, R: IqRegisters, D: DmaOps> {
    adapter: &'a mut TxDeviceAdapter<R, D>,
}

impl<'a, R: IqRegisters, D: DmaOps> TxToken for QueueTxToken<'a, R, D> {
    fn consume<T, F>(self, len: usize, f: F) -> T
    where
        F: FnOnce(&mut [u8]) -> T,
    {
        let mut frame = vec![0u8; len];
        let result = f(&mut frame);
        self.adapter.send(frame);
        result
    }
}
