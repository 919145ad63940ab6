//! Error types.

use core::fmt;

use crate::iq::packet::TxPacket;
use crate::types::OffloadFlags;

/// DMA backend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaError {
    /// Coherent memory exhausted.
    OutOfMemory,
    /// Streaming mapping could not be established.
    MappingFailed,
    /// Zero-length allocation or mapping.
    ZeroLength,
    /// Alignment is zero or not a power of two.
    InvalidAlignment,
}

impl fmt::Display for DmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "DMA memory exhausted"),
            Self::MappingFailed => write!(f, "DMA mapping failed"),
            Self::ZeroLength => write!(f, "Zero-length DMA request"),
            Self::InvalidAlignment => write!(f, "Invalid DMA alignment"),
        }
    }
}

/// Queue creation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Ring capacity must be a power of two in `2..=65536`.
    InvalidCapacity(u32),
    /// Gather list for this many fragments does not fit the header.
    InvalidMaxFragments(usize),
    /// Fill threshold must be non-zero and below the ring capacity.
    InvalidFillThreshold(u32),
    /// Wake threshold must be non-zero and below the ring capacity.
    InvalidWakeThreshold(u32),
    /// Device kind tag or front-data size exceeds its 6-bit field.
    InvalidFirmwareInfo,
    /// Ring or gather list memory could not be allocated.
    Dma(DmaError),
}

impl From<DmaError> for QueueError {
    fn from(err: DmaError) -> Self {
        QueueError::Dma(err)
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCapacity(n) => write!(f, "Invalid ring capacity: {}", n),
            Self::InvalidMaxFragments(n) => write!(f, "Invalid fragment limit: {}", n),
            Self::InvalidFillThreshold(n) => write!(f, "Invalid fill threshold: {}", n),
            Self::InvalidWakeThreshold(n) => write!(f, "Invalid wake threshold: {}", n),
            Self::InvalidFirmwareInfo => write!(f, "Firmware kind/front-data size out of range"),
            Self::Dma(e) => write!(f, "Queue memory: {}", e),
        }
    }
}

/// Pending-buffer table misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingError {
    /// Slot already holds an in-flight buffer.
    InFlight(u32),
    /// Slot holds nothing to release.
    NotInFlight(u32),
}

impl fmt::Display for PendingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InFlight(slot) => write!(f, "Slot {} already in flight", slot),
            Self::NotInFlight(slot) => write!(f, "Slot {} not in flight", slot),
        }
    }
}

/// Transmit errors.
///
/// Nothing here consumes the packet: every variant hands it back so the
/// caller can retry or dispose of it.
pub enum TxError<B> {
    /// Ring full; retry after the queue restarts.
    QueueFull(TxPacket<B>),
    /// More fragments than the queue was created for.
    TooManyFragments {
        count: usize,
        max: usize,
        packet: TxPacket<B>,
    },
    /// Packet or one of its segments exceeds the 16-bit length fields.
    FrameTooLarge { len: usize, packet: TxPacket<B> },
    /// Head or fragment `index` is empty.
    EmptySegment { index: usize, packet: TxPacket<B> },
    /// Offload request is inconsistent.
    InvalidOffload {
        flags: OffloadFlags,
        packet: TxPacket<B>,
    },
    /// A buffer could not be mapped for the device.
    MapFailed(TxPacket<B>),
    /// Slot bookkeeping refused the packet; queue state is unchanged.
    SlotInFlight { slot: u32, packet: TxPacket<B> },
}

impl<B> TxError<B> {
    /// Take the packet back.
    pub fn into_packet(self) -> TxPacket<B> {
        match self {
            Self::QueueFull(packet)
            | Self::MapFailed(packet)
            | Self::TooManyFragments { packet, .. }
            | Self::FrameTooLarge { packet, .. }
            | Self::EmptySegment { packet, .. }
            | Self::InvalidOffload { packet, .. }
            | Self::SlotInFlight { packet, .. } => packet,
        }
    }

    /// Admission failure; the packet may be retried unchanged.
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull(_))
    }

    /// Caller handed in a packet the queue can never accept.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::TooManyFragments { .. }
                | Self::FrameTooLarge { .. }
                | Self::EmptySegment { .. }
                | Self::InvalidOffload { .. }
        )
    }
}

impl<B> fmt::Debug for TxError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull(_) => f.write_str("QueueFull"),
            Self::TooManyFragments { count, max, .. } => f
                .debug_struct("TooManyFragments")
                .field("count", count)
                .field("max", max)
                .finish(),
            Self::FrameTooLarge { len, .. } => {
                f.debug_struct("FrameTooLarge").field("len", len).finish()
            }
            Self::EmptySegment { index, .. } => {
                f.debug_struct("EmptySegment").field("index", index).finish()
            }
            Self::InvalidOffload { flags, .. } => {
                f.debug_struct("InvalidOffload").field("flags", flags).finish()
            }
            Self::MapFailed(_) => f.write_str("MapFailed"),
            Self::SlotInFlight { slot, .. } => {
                f.debug_struct("SlotInFlight").field("slot", slot).finish()
            }
        }
    }
}

impl<B> fmt::Display for TxError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull(_) => write!(f, "Send failed, queue full"),
            Self::TooManyFragments { count, max, .. } => {
                write!(f, "Too many fragments: {} (max {})", count, max)
            }
            Self::FrameTooLarge { len, .. } => write!(f, "Frame too large: {} bytes", len),
            Self::EmptySegment { index, .. } => write!(f, "Empty packet segment {}", index),
            Self::InvalidOffload { flags, .. } => write!(f, "Invalid offload request: {:?}", flags),
            Self::MapFailed(_) => write!(f, "DMA mapping failed"),
            Self::SlotInFlight { slot, .. } => write!(f, "Slot {} already in flight", slot),
        }
    }
}
