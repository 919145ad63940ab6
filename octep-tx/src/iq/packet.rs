//! Outbound packets and offload requests.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::types::{OffloadFlags, TxMdata};

/// Ownership handle of an outbound packet: a head buffer followed by
/// zero or more fragments.
///
/// # Safety
/// The memory behind `head()` and `frag(i)` is handed to the device while
/// the handle sits in the queue. It must not move or change when the handle
/// itself is moved, so implementors must be heap-backed (or otherwise
/// address-stable) and must return the same slices on every call.
pub unsafe trait TxBuffer {
    /// First segment of the packet.
    fn head(&self) -> &[u8];

    /// Segments after the head.
    fn frag_count(&self) -> usize {
        0
    }

    /// Fragment `index` (`0..frag_count()`).
    fn frag(&self, _index: usize) -> &[u8] {
        &[]
    }

    /// Segment `index`, where 0 is the head.
    fn segment(&self, index: usize) -> &[u8] {
        if index == 0 {
            self.head()
        } else {
            self.frag(index - 1)
        }
    }

    /// Total packet length.
    fn len(&self) -> usize {
        (0..self.frag_count()).fold(self.head().len(), |acc, i| acc + self.frag(i).len())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

unsafe impl TxBuffer for Vec<u8> {
    fn head(&self) -> &[u8] {
        self
    }
}

unsafe impl TxBuffer for Box<[u8]> {
    fn head(&self) -> &[u8] {
        self
    }
}

/// Head buffer plus separately allocated fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentedBuffer {
    pub head: Vec<u8>,
    pub frags: Vec<Vec<u8>>,
}

impl FragmentedBuffer {
    pub fn new(head: Vec<u8>) -> Self {
        Self { head, frags: Vec::new() }
    }

    pub fn with_frags(head: Vec<u8>, frags: Vec<Vec<u8>>) -> Self {
        Self { head, frags }
    }

    pub fn push_frag(&mut self, frag: Vec<u8>) {
        self.frags.push(frag);
    }
}

unsafe impl TxBuffer for FragmentedBuffer {
    fn head(&self) -> &[u8] {
        &self.head
    }

    fn frag_count(&self) -> usize {
        self.frags.len()
    }

    fn frag(&self, index: usize) -> &[u8] {
        self.frags.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Offloads requested for one packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOffload {
    pub flags: OffloadFlags,
    pub gso_size: u16,
    pub gso_segs: u16,
}

impl TxOffload {
    /// No offloads.
    pub const fn none() -> Self {
        Self {
            flags: OffloadFlags::empty(),
            gso_size: 0,
            gso_segs: 0,
        }
    }

    /// IPv4, UDP and TCP checksum insertion.
    pub const fn checksum() -> Self {
        Self {
            flags: OffloadFlags::CKSUM,
            gso_size: 0,
            gso_segs: 0,
        }
    }

    /// Segmentation into `gso_segs` segments of `gso_size` bytes, with
    /// checksum insertion.
    pub const fn tso(gso_size: u16, gso_segs: u16) -> Self {
        Self {
            flags: OffloadFlags::CKSUM.union(OffloadFlags::TSO),
            gso_size,
            gso_segs,
        }
    }

    /// Segmentation needs its parameters and an L4 checksum; without
    /// segmentation the parameters must be zero.
    pub fn is_valid(&self) -> bool {
        if self.flags.is_tso() {
            self.gso_size > 0 && self.gso_segs > 0 && self.flags.has_l4_cksum()
        } else {
            self.gso_size == 0 && self.gso_segs == 0
        }
    }

    /// Metadata block carried in the instruction.
    pub const fn to_mdata(&self) -> TxMdata {
        TxMdata {
            ol_flags: self.flags,
            gso_size: self.gso_size,
            gso_segs: self.gso_segs,
        }
    }
}

/// A packet handed to [`TxQueue::transmit`](crate::iq::TxQueue::transmit).
#[derive(Debug)]
pub struct TxPacket<B> {
    pub buffer: B,
    pub offload: TxOffload,
}

impl<B> TxPacket<B> {
    pub fn new(buffer: B) -> Self {
        Self {
            buffer,
            offload: TxOffload::none(),
        }
    }

    pub fn with_offload(buffer: B, offload: TxOffload) -> Self {
        Self { buffer, offload }
    }

    pub fn into_buffer(self) -> B {
        self.buffer
    }
}
