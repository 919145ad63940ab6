//! Simulated device and DMA backends for queue tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use octep_tx::dma::CoherentAlloc;
use octep_tx::{DmaError, DmaMapping, DmaOps, IdentityDma, IqRegisters, QueueConfig, TxBuffer, TxQueue};

/// Doorbell and instruction count registers of a simulated queue.
#[derive(Debug, Default)]
pub struct SimRegisters {
    /// Sum of all doorbell writes.
    pub announced: AtomicU32,
    /// Number of doorbell writes.
    pub doorbell_writes: AtomicU32,
    /// Cumulative fetched-instruction counter.
    pub inst_cnt: AtomicU32,
}

impl SimRegisters {
    pub fn starting_at(count: u32) -> Self {
        Self {
            inst_cnt: AtomicU32::new(count),
            ..Self::default()
        }
    }

    /// Device fetches `n` more instructions.
    pub fn complete(&self, n: u32) {
        self.inst_cnt.fetch_add(n, Ordering::SeqCst);
    }

    /// Device fetches everything announced so far.
    pub fn complete_announced(&self, already_done: u32) -> u32 {
        let n = self.announced() - already_done;
        self.complete(n);
        n
    }

    pub fn announced(&self) -> u32 {
        self.announced.load(Ordering::SeqCst)
    }

    pub fn doorbell_writes(&self) -> u32 {
        self.doorbell_writes.load(Ordering::SeqCst)
    }
}

impl IqRegisters for SimRegisters {
    fn ring_doorbell(&self, count: u32) {
        self.announced.fetch_add(count, Ordering::SeqCst);
        self.doorbell_writes.fetch_add(1, Ordering::SeqCst);
    }

    fn instr_count(&self) -> u32 {
        self.inst_cnt.load(Ordering::SeqCst)
    }
}

/// Identity DMA that refuses streaming mappings after a quota.
#[derive(Debug, Default)]
pub struct FailingDma {
    pub inner: IdentityDma,
    /// Mappings still allowed.
    pub quota: AtomicUsize,
}

impl FailingDma {
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: IdentityDma::new(),
            quota: AtomicUsize::new(quota),
        }
    }
}

impl DmaOps for FailingDma {
    fn alloc_coherent(&self, size: usize, align: usize) -> Result<CoherentAlloc, DmaError> {
        self.inner.alloc_coherent(size, align)
    }

    fn free_coherent(&self, alloc: CoherentAlloc) {
        self.inner.free_coherent(alloc)
    }

    fn map_single(&self, buf: &[u8]) -> Result<DmaMapping, DmaError> {
        let left = self.quota.load(Ordering::SeqCst);
        if left == 0 {
            return Err(DmaError::MappingFailed);
        }
        self.quota.store(left - 1, Ordering::SeqCst);
        self.inner.map_single(buf)
    }

    fn unmap_single(&self, mapping: DmaMapping) {
        self.inner.unmap_single(mapping)
    }
}

pub type SimQueue<B> = TxQueue<Arc<SimRegisters>, IdentityDma, B>;

pub struct Harness<B: TxBuffer> {
    pub queue: SimQueue<B>,
    pub regs: Arc<SimRegisters>,
    pub dma: Arc<IdentityDma>,
}

/// Queue of `capacity` slots on a fresh simulated device.
pub fn harness<B: TxBuffer>(capacity: u32, max_fragments: usize) -> Harness<B> {
    harness_with(QueueConfig::new(capacity, max_fragments), SimRegisters::default())
}

pub fn harness_with<B: TxBuffer>(config: QueueConfig, regs: SimRegisters) -> Harness<B> {
    let regs = Arc::new(regs);
    let dma = Arc::new(IdentityDma::new());
    let queue = TxQueue::create(config, regs.clone(), dma.clone()).unwrap();
    Harness { queue, regs, dma }
}

/// Ethernet-sized frame filled with `tag`.
pub fn frame(tag: u8, len: usize) -> Vec<u8> {
    vec![tag; len]
}
