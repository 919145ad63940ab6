//! Transmit queue controller.
//!
//! Ties the ring, gather pool and pending table together behind one lock.
//! `transmit` posts, `reclaim` drains completions; both are non-blocking.
//! A full ring is reported to the caller as a stop signal, and the first
//! reclaim that frees room afterwards reports the matching restart.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace, warn};
use spin::Mutex;

use crate::config::QueueConfig;
use crate::dma::{align_up, DmaMapping, DmaOps, DmaRegion, SgPool, PAGE_SIZE};
use crate::error::{DmaError, QueueError, TxError};
use crate::hw::IqRegisters;
use crate::types::{sg_descs_for, InstrHdr, IqSendStatus, OffloadFlags, TxDesc, TLEN_MAX, TX_DESC_SIZE};

use super::packet::{TxBuffer, TxPacket};
use super::pending::{PendingTable, TxBufType};
use super::ring::{InstrRing, IqState, RingIndices};
use super::stats::IqStats;

/// A packet accepted onto the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxAccepted {
    /// Ring slot the instruction occupies.
    pub slot: u32,
    /// Instruction plus gather records used.
    pub slots_used: u32,
    /// The ring is now full; stop admitting packets until a restart.
    pub stop_queue: bool,
}

impl TxAccepted {
    pub fn status(&self) -> IqSendStatus {
        if self.stop_queue {
            IqSendStatus::Stop
        } else {
            IqSendStatus::Ok
        }
    }
}

/// Outcome of one reclaim pass.
#[derive(Debug)]
pub struct ReclaimResult<B> {
    /// Slots released in this pass.
    pub completed: u32,
    /// Bytes of the released packets.
    pub bytes: u64,
    /// The queue was stopped and may now admit packets again.
    pub restarted: bool,
    /// At least one post is admissible.
    pub space_available: bool,
    /// Released buffers, oldest first.
    pub buffers: Vec<B>,
}

/// Rejected before touching the queue.
enum Fault {
    TooManyFragments { count: usize, max: usize },
    FrameTooLarge { len: usize },
    EmptySegment { index: usize },
    InvalidOffload { flags: OffloadFlags },
}

impl Fault {
    fn into_error<B>(self, packet: TxPacket<B>) -> TxError<B> {
        match self {
            Fault::TooManyFragments { count, max } => TxError::TooManyFragments { count, max, packet },
            Fault::FrameTooLarge { len } => TxError::FrameTooLarge { len, packet },
            Fault::EmptySegment { index } => TxError::EmptySegment { index, packet },
            Fault::InvalidOffload { flags } => TxError::InvalidOffload { flags, packet },
        }
    }
}

struct IqInner<D: DmaOps, B> {
    ring: InstrRing<D>,
    sg: SgPool<D>,
    pending: PendingTable<B>,
    stats: IqStats,
    /// Mappings of the packet being posted.
    scratch: Vec<DmaMapping>,
}

/// One transmit instruction queue.
pub struct TxQueue<R: IqRegisters, D: DmaOps, B: TxBuffer> {
    q_no: u32,
    config: QueueConfig,
    regs: R,
    dma: Arc<D>,
    stopped: AtomicBool,
    inner: Mutex<IqInner<D, B>>,
}

impl<R: IqRegisters, D: DmaOps, B: TxBuffer> TxQueue<R, D, B> {
    /// Allocate the ring, gather pool and pending table.
    pub fn create(config: QueueConfig, regs: R, dma: Arc<D>) -> Result<Self, QueueError> {
        config.validate()?;
        let capacity = config.num_descriptors;
        let slots = capacity as usize;
        let sg_per_pkt = config.sg_descs_per_pkt();

        let ring_bytes = align_up(slots * TX_DESC_SIZE, PAGE_SIZE);
        let region = DmaRegion::allocate(dma.clone(), ring_bytes, PAGE_SIZE)?;
        let sg = SgPool::new(dma.clone(), slots, sg_per_pkt)?;
        let ring = InstrRing::new(region, capacity, config.fill_threshold, regs.instr_count());

        debug!(
            "IQ[{}]: {} descriptors at {:#x}, {} sg records/pkt at {:#x}",
            config.queue_no,
            capacity,
            ring.bus_addr(),
            sg_per_pkt,
            sg.group_bus_addr(0)
        );

        Ok(Self {
            q_no: config.queue_no,
            config,
            regs,
            dma,
            stopped: AtomicBool::new(false),
            inner: Mutex::new(IqInner {
                ring,
                sg,
                pending: PendingTable::new(slots, config.max_fragments + 1),
                stats: IqStats::default(),
                scratch: Vec::with_capacity(config.max_fragments + 1),
            }),
        })
    }

    pub fn queue_no(&self) -> u32 {
        self.q_no
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn capacity(&self) -> u32 {
        self.config.num_descriptors
    }

    /// Checks that need no queue state.
    fn check(&self, packet: &TxPacket<B>) -> Result<(), Fault> {
        let buffer = &packet.buffer;
        let count = buffer.frag_count();
        if count > self.config.max_fragments {
            return Err(Fault::TooManyFragments {
                count,
                max: self.config.max_fragments,
            });
        }
        for index in 0..=count {
            let len = buffer.segment(index).len();
            if len == 0 {
                return Err(Fault::EmptySegment { index });
            }
            if len > u16::MAX as usize {
                return Err(Fault::FrameTooLarge { len });
            }
        }
        let len = buffer.len() + self.config.front_data_bytes();
        if len > TLEN_MAX as usize {
            return Err(Fault::FrameTooLarge { len });
        }
        if !packet.offload.is_valid() {
            return Err(Fault::InvalidOffload {
                flags: packet.offload.flags,
            });
        }
        Ok(())
    }

    /// Map every segment of `buffer` into `scratch`; gathered packets also
    /// fill the slot's gather list. Returns the instruction's `dptr`.
    fn map_segments(
        dma: &D,
        sg: &SgPool<D>,
        slot: u32,
        buffer: &B,
        scratch: &mut Vec<DmaMapping>,
    ) -> Result<u64, DmaError> {
        let count = buffer.frag_count();
        if count == 0 {
            let m = dma.map_single(buffer.head())?;
            let dptr = m.bus_addr();
            scratch.push(m);
            return Ok(dptr);
        }
        sg.clear(slot as usize);
        for index in 0..=count {
            let seg = buffer.segment(index);
            let m = dma.map_single(seg)?;
            sg.set_entry(slot as usize, index, seg.len() as u16, m.bus_addr());
            scratch.push(m);
        }
        Ok(sg.group_bus_addr(slot as usize))
    }

    /// Post one packet.
    ///
    /// Malformed packets are refused before any state changes. A full ring
    /// refuses with [`TxError::QueueFull`]; retry after a reclaim reports
    /// `restarted`. The doorbell is written when the fill threshold is
    /// reached or the ring fills; call [`TxQueue::flush`] at the end of a
    /// batch.
    pub fn transmit(&self, packet: TxPacket<B>) -> Result<TxAccepted, TxError<B>> {
        if let Err(fault) = self.check(&packet) {
            return Err(fault.into_error(packet));
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if inner.ring.state() == IqState::Full {
            inner.stats.instr_dropped += 1;
            inner.stats.tx_busy += 1;
            self.stopped.store(true, Ordering::Release);
            return Err(TxError::QueueFull(packet));
        }

        let slot = inner.ring.write_index();
        let frags = packet.buffer.frag_count();
        let dptr = match Self::map_segments(&self.dma, &inner.sg, slot, &packet.buffer, &mut inner.scratch) {
            Ok(dptr) => dptr,
            Err(e) => {
                for m in inner.scratch.drain(..) {
                    self.dma.unmap_single(m);
                }
                inner.stats.instr_dropped += 1;
                warn!("IQ[{}]: dropping packet, {}", self.q_no, e);
                return Err(TxError::MapFailed(packet));
            }
        };

        let len = packet.buffer.len();
        let tlen = (len + self.config.front_data_bytes()) as u16;
        let (ih, kind, sg_records) = if frags == 0 {
            (
                InstrHdr::direct(tlen, self.config.pkind, self.config.front_data_size),
                TxBufType::Single,
                0,
            )
        } else {
            (
                InstrHdr::gathered(
                    tlen,
                    self.config.pkind,
                    self.config.front_data_size,
                    (frags + 1) as u16,
                ),
                TxBufType::Gather,
                sg_descs_for(frags + 1) as u32,
            )
        };
        let desc = TxDesc {
            dptr,
            ih,
            txm: packet.offload.to_mdata(),
            exhdr: [0; 4],
        };

        let TxPacket { buffer, offload } = packet;
        if let Err((e, buffer)) = inner
            .pending
            .record(slot, buffer, kind, len as u32, &mut inner.scratch)
        {
            for m in inner.scratch.drain(..) {
                self.dma.unmap_single(m);
            }
            warn!("IQ[{}]: {}", self.q_no, e);
            return Err(TxError::SlotInFlight {
                slot,
                packet: TxPacket { buffer, offload },
            });
        }

        let posted = inner.ring.post(&desc);
        inner.stats.instr_posted += 1;

        if posted.stop {
            self.stopped.store(true, Ordering::Release);
            debug!("IQ[{}]: ring full, stopping queue", self.q_no);
        }
        if posted.stop || inner.ring.should_announce() {
            inner.ring.announce(&self.regs);
            inner.stats.doorbells += 1;
        }

        Ok(TxAccepted {
            slot: posted.slot,
            slots_used: 1 + sg_records,
            stop_queue: posted.stop,
        })
    }

    /// Announce every instruction posted since the last doorbell write.
    pub fn flush(&self) -> u32 {
        let mut inner = self.inner.lock();
        let count = inner.ring.announce(&self.regs);
        if count > 0 {
            inner.stats.doorbells += 1;
        }
        count
    }

    /// Release every slot the device has fetched.
    pub fn reclaim(&self) -> ReclaimResult<B> {
        self.reclaim_budget(u32::MAX)
    }

    /// Release at most `budget` fetched slots. The rest stay queued for
    /// the next pass.
    pub fn reclaim_budget(&self, budget: u32) -> ReclaimResult<B> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let fetched = inner.ring.refresh_read_index(&self.regs);
        inner.stats.pkts_processed += fetched as u64;

        let mut visited = 0u32;
        let mut completed = 0u32;
        let mut bytes = 0u64;
        let mut buffers = Vec::new();
        while visited < budget {
            let Some(slot) = inner.ring.next_reclaimable() else {
                break;
            };
            visited += 1;
            // A slot with nothing recorded released no buffer and is not a completion.
            match inner.pending.release(slot, &*self.dma) {
                Ok(r) => {
                    completed += 1;
                    bytes += r.len as u64;
                    if r.kind == TxBufType::Gather {
                        inner.stats.sgentry_sent += 1;
                    }
                    buffers.push(r.buffer);
                }
                Err(e) => warn!("IQ[{}]: reclaim: {}", self.q_no, e),
            }
        }
        inner.stats.instr_completed += completed as u64;
        inner.stats.bytes_sent += bytes;

        let free = inner.ring.free_slots();
        let restarted = free >= self.config.wake_threshold
            && self
                .stopped
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok();
        if restarted {
            inner.stats.restart_cnt += 1;
            debug!("IQ[{}]: {} slots free, restarting queue", self.q_no, free);
        }
        if visited > 0 {
            trace!("IQ[{}]: reclaimed {} ({} bytes)", self.q_no, completed, bytes);
        }

        ReclaimResult {
            completed,
            bytes,
            restarted,
            space_available: free > 0,
            buffers,
        }
    }

    pub fn stats(&self) -> IqStats {
        self.inner.lock().stats
    }

    pub fn state(&self) -> IqState {
        self.inner.lock().ring.state()
    }

    pub fn indices(&self) -> RingIndices {
        self.inner.lock().ring.indices()
    }

    /// Slots posted and not yet reclaimed.
    pub fn in_flight(&self) -> u32 {
        self.inner.lock().ring.pending()
    }

    /// Posts admissible right now.
    pub fn free_slots(&self) -> u32 {
        self.inner.lock().ring.free_slots()
    }

    /// The queue signalled stop and has not been restarted yet.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Decode the instruction last written to `slot`.
    pub fn descriptor(&self, slot: u32) -> TxDesc {
        self.inner.lock().ring.read(slot)
    }

    /// Gather entry `index` of `slot` as `(len, bus)`.
    pub fn sg_entry(&self, slot: u32, index: usize) -> (u16, u64) {
        self.inner.lock().sg.entry(slot as usize, index)
    }

    /// How `slot`'s current packet was posted.
    pub fn buf_type(&self, slot: u32) -> TxBufType {
        self.inner.lock().pending.kind(slot)
    }

    fn free_pending(&self) -> Vec<B> {
        let mut inner = self.inner.lock();
        inner.pending.drain_all(&*self.dma)
    }

    /// Tear the queue down, returning every buffer still in flight.
    ///
    /// The device must have been told to stop fetching from this ring.
    pub fn destroy(self) -> Vec<B> {
        let buffers = self.free_pending();
        debug!(
            "IQ[{}]: destroyed, {} pending buffers returned",
            self.q_no,
            buffers.len()
        );
        buffers
    }
}

impl<R: IqRegisters, D: DmaOps, B: TxBuffer> Drop for TxQueue<R, D, B> {
    fn drop(&mut self) {
        let leftover = self.free_pending();
        if !leftover.is_empty() {
            warn!(
                "IQ[{}]: dropped with {} buffers in flight",
                self.q_no,
                leftover.len()
            );
        }
    }
}
