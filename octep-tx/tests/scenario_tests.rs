//! End-to-end transmit scenarios on a simulated device

mod common;

use common::{frame, harness, FailingDma, SimRegisters};
use octep_tx::iq::TxBufType;
use octep_tx::types::{sg_descs_for, SgListDesc};
use octep_tx::{
    FragmentedBuffer, IqSendStatus, IqState, OffloadFlags, QueueConfig, TxError, TxOffload,
    TxPacket, TxQueue,
};
use std::sync::Arc;

// ============================================================================
// Scenario A: fill a small ring
// ============================================================================

#[test]
fn test_scenario_a_ring_full_and_reclaim() {
    let h = harness::<Vec<u8>>(8, 1);

    for i in 0..6u8 {
        let acc = h.queue.transmit(TxPacket::new(frame(i, 64))).unwrap();
        assert_eq!(acc.slots_used, 1);
        assert!(!acc.stop_queue);
    }
    let seventh = h.queue.transmit(TxPacket::new(frame(6, 64))).unwrap();
    assert!(seventh.stop_queue);
    assert_eq!(seventh.status(), IqSendStatus::Stop);
    assert_eq!(h.queue.state(), IqState::Full);
    assert!(h.queue.is_stopped());

    let err = h.queue.transmit(TxPacket::new(frame(7, 64))).unwrap_err();
    assert!(err.is_queue_full());
    assert_eq!(err.into_packet().buffer, frame(7, 64));
    let stats = h.queue.stats();
    assert_eq!(stats.instr_dropped, 1);
    assert_eq!(stats.tx_busy, 1);
    assert_eq!(stats.instr_posted, 7);

    // The ring filled, so everything was announced.
    assert_eq!(h.regs.announced(), 7);

    h.regs.complete(3);
    let done = h.queue.reclaim();
    assert_eq!(done.completed, 3);
    assert!(done.space_available);
    assert!(done.restarted);
    assert_eq!(done.buffers, vec![frame(0, 64), frame(1, 64), frame(2, 64)]);
    assert_eq!(h.queue.state(), IqState::Active);
    assert_eq!(h.queue.free_slots(), 3);
}

// ============================================================================
// Scenario B: gathered packet
// ============================================================================

#[test]
fn test_scenario_b_gather_records() {
    let h = harness::<FragmentedBuffer>(16, 6);
    let buf = FragmentedBuffer::with_frags(
        vec![0x11; 100],
        vec![vec![0x22; 200], vec![0x33; 300], vec![0x44; 400], vec![0x55; 500]],
    );
    let ptrs: Vec<u64> = std::iter::once(buf.head.as_ptr() as u64)
        .chain(buf.frags.iter().map(|f| f.as_ptr() as u64))
        .collect();

    let acc = h.queue.transmit(TxPacket::new(buf)).unwrap();
    assert_eq!(sg_descs_for(5), 2);
    assert_eq!(acc.slots_used, 3);

    let d = h.queue.descriptor(acc.slot);
    assert!(d.ih.gather);
    assert_eq!(d.ih.gsz, 5);
    assert_eq!(d.ih.tlen, 1500);
    assert_eq!(h.queue.buf_type(acc.slot), TxBufType::Gather);

    let lens = [100u16, 200, 300, 400, 500];
    for (i, (len, ptr)) in lens.iter().zip(&ptrs).enumerate() {
        assert_eq!(h.queue.sg_entry(acc.slot, i), (*len, *ptr), "entry {}", i);
    }
    // Remaining lanes of the second record are zero.
    for i in 5..8 {
        assert_eq!(h.queue.sg_entry(acc.slot, i), (0, 0));
    }
}

#[test]
fn test_gather_record_memory_layout() {
    let h = harness::<FragmentedBuffer>(4, 3);
    let buf = FragmentedBuffer::with_frags(vec![1; 10], vec![vec![2; 20]]);
    let acc = h.queue.transmit(TxPacket::new(buf)).unwrap();
    let d = h.queue.descriptor(acc.slot);

    // dptr is the bus address of the record; identity DMA makes it readable.
    let raw = unsafe { std::slice::from_raw_parts(d.dptr as *const u8, 40) };
    let rec = SgListDesc::from_bytes(raw.try_into().unwrap());
    // First length word: entry 0 in bits 63..48.
    let w0 = u64::from_le_bytes(raw[0..8].try_into().unwrap());
    assert_eq!(w0 >> 48, 10);
    assert_eq!((w0 >> 32) & 0xFFFF, 20);
    assert_eq!(rec.entry(1).0, 20);
}

// ============================================================================
// Scenario C: precondition violation
// ============================================================================

#[test]
fn test_scenario_c_too_many_fragments() {
    let h = harness::<FragmentedBuffer>(8, 2);
    h.queue
        .transmit(TxPacket::new(FragmentedBuffer::new(vec![0; 64])))
        .unwrap();
    let indices = h.queue.indices();
    let stats = h.queue.stats();
    let writes = h.regs.doorbell_writes();

    let buf = FragmentedBuffer::with_frags(vec![0; 64], vec![vec![1; 8]; 3]);
    let err = h.queue.transmit(TxPacket::new(buf)).unwrap_err();
    match &err {
        TxError::TooManyFragments { count, max, .. } => {
            assert_eq!((*count, *max), (3, 2));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(err.into_packet().buffer.frags.len(), 3);

    assert_eq!(h.queue.indices(), indices);
    assert_eq!(h.queue.stats(), stats);
    assert_eq!(h.regs.doorbell_writes(), writes);
    assert_eq!(h.dma.live_mappings(), 1);
}

// ============================================================================
// Mapping failure
// ============================================================================

#[test]
fn test_mapping_failure_rolls_back() {
    let regs = Arc::new(SimRegisters::default());
    let dma = Arc::new(FailingDma::with_quota(2));
    let queue: TxQueue<_, _, FragmentedBuffer> =
        TxQueue::create(QueueConfig::new(8, 4), regs.clone(), dma.clone()).unwrap();

    let buf = FragmentedBuffer::with_frags(vec![1; 10], vec![vec![2; 10], vec![3; 10]]);
    let err = queue.transmit(TxPacket::new(buf)).unwrap_err();
    assert!(matches!(err, TxError::MapFailed(_)));
    assert_eq!(err.into_packet().buffer.frags.len(), 2);

    assert_eq!(dma.inner.live_mappings(), 0);
    assert_eq!(queue.in_flight(), 0);
    assert_eq!(queue.indices().write, 0);
    let stats = queue.stats();
    assert_eq!(stats.instr_dropped, 1);
    assert_eq!(stats.instr_posted, 0);
    assert_eq!(stats.tx_busy, 0);
}

#[test]
fn test_single_buffer_mapping_failure() {
    let regs = Arc::new(SimRegisters::default());
    let dma = Arc::new(FailingDma::with_quota(0));
    let queue: TxQueue<_, _, Vec<u8>> =
        TxQueue::create(QueueConfig::new(8, 1), regs.clone(), dma.clone()).unwrap();

    let err = queue.transmit(TxPacket::new(frame(9, 64))).unwrap_err();
    assert!(matches!(err, TxError::MapFailed(_)));
    assert_eq!(err.into_packet().buffer, frame(9, 64));

    assert_eq!(dma.inner.live_mappings(), 0);
    assert_eq!(queue.indices().write, 0);
    assert_eq!(queue.state(), IqState::Empty);
    assert_eq!(regs.doorbell_writes(), 0);
    let stats = queue.stats();
    assert_eq!(stats.instr_dropped, 1);
    assert_eq!(stats.instr_posted, 0);

    // Mapping comes back and the same slot is used.
    dma.quota.store(1, std::sync::atomic::Ordering::SeqCst);
    let acc = queue.transmit(TxPacket::new(frame(9, 64))).unwrap();
    assert_eq!(acc.slot, 0);
}

// ============================================================================
// Offloads and front data
// ============================================================================

#[test]
fn test_tso_metadata_encoded() {
    let config = QueueConfig::new(8, 1).with_firmware_info(5, 2);
    let h = common::harness_with::<Vec<u8>>(config, SimRegisters::default());
    let acc = h
        .queue
        .transmit(TxPacket::with_offload(frame(0, 9000), TxOffload::tso(1448, 7)))
        .unwrap();
    let d = h.queue.descriptor(acc.slot);
    assert_eq!(d.ih.tlen, 9016);
    assert_eq!(d.ih.pkind, 5);
    assert_eq!(d.ih.fsz, 2);
    assert!(d.txm.ol_flags.contains(OffloadFlags::TCP_TSO));
    assert_eq!(d.txm.gso_size, 1448);
    assert_eq!(d.txm.gso_segs, 7);
    assert_eq!(d.exhdr, [0; 4]);
}

#[test]
fn test_frame_too_large_with_front_data() {
    let config = QueueConfig::new(8, 1).with_firmware_info(0, 1);
    let h = common::harness_with::<Vec<u8>>(config, SimRegisters::default());
    let err = h
        .queue
        .transmit(TxPacket::new(frame(0, 65_530)))
        .unwrap_err();
    assert!(matches!(err, TxError::FrameTooLarge { len: 65_538, .. }));
    assert_eq!(h.queue.stats().instr_dropped, 0);
}
