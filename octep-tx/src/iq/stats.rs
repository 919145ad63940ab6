//! Per-queue statistics.

/// Counter snapshot for one instruction queue.
///
/// Counters only grow; they are reset when the queue is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IqStats {
    /// Instructions posted to the ring.
    pub instr_posted: u64,
    /// Instructions reclaimed after the device consumed them.
    pub instr_completed: u64,
    /// Packets refused (queue full or mapping failure).
    pub instr_dropped: u64,
    /// Payload bytes of completed packets.
    pub bytes_sent: u64,
    /// Completed packets that went out through a gather list.
    pub sgentry_sent: u64,
    /// Transmit attempts made while the ring was full.
    pub tx_busy: u64,
    /// Times a stopped queue was restarted.
    pub restart_cnt: u64,
    /// Doorbell register writes.
    pub doorbells: u64,
    /// Instructions the device reported as fetched.
    pub pkts_processed: u64,
}
