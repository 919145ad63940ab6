//! Stop/restart behaviour and completion accounting

mod common;

use common::{frame, harness, harness_with, SimRegisters};
use octep_tx::{IqState, QueueConfig, TxPacket};

#[test]
fn test_backpressure_round_trip() {
    let h = harness::<Vec<u8>>(8, 1);

    let mut posted = 0;
    loop {
        match h.queue.transmit(TxPacket::new(frame(posted as u8, 60))) {
            Ok(_) => posted += 1,
            Err(e) => {
                assert!(e.is_queue_full());
                break;
            }
        }
    }
    assert_eq!(posted, 7);

    h.regs.complete(posted);
    let done = h.queue.reclaim();
    assert_eq!(done.completed, posted);
    assert!(done.restarted);
    assert_eq!(h.queue.state(), IqState::Empty);

    // No second restart without another stop.
    let again = h.queue.reclaim();
    assert_eq!(again.completed, 0);
    assert!(!again.restarted);

    let mut reposted = 0;
    while h.queue.transmit(TxPacket::new(frame(0, 60))).is_ok() {
        reposted += 1;
    }
    assert_eq!(reposted, done.completed);

    let stats = h.queue.stats();
    assert_eq!(stats.restart_cnt, 1);
    assert_eq!(stats.instr_dropped, 2);
    assert_eq!(stats.tx_busy, 2);
}

#[test]
fn test_reclaim_without_completions_is_noop() {
    let h = harness::<Vec<u8>>(8, 1);
    h.queue.transmit(TxPacket::new(frame(1, 60))).unwrap();
    let before = h.queue.indices();

    for _ in 0..3 {
        let r = h.queue.reclaim();
        assert_eq!(r.completed, 0);
        assert!(r.buffers.is_empty());
        assert!(!r.restarted);
    }
    assert_eq!(h.queue.indices(), before);
    assert_eq!(h.queue.stats().instr_completed, 0);
}

#[test]
fn test_wake_threshold_delays_restart() {
    let config = QueueConfig::new(8, 1).with_wake_threshold(4);
    let h = harness_with::<Vec<u8>>(config, SimRegisters::default());
    for i in 0..7 {
        h.queue.transmit(TxPacket::new(frame(i, 60))).unwrap();
    }
    assert!(h.queue.is_stopped());

    h.regs.complete(2);
    let r = h.queue.reclaim();
    assert_eq!(r.completed, 2);
    assert!(r.space_available);
    assert!(!r.restarted);
    assert!(h.queue.is_stopped());

    h.regs.complete(2);
    let r = h.queue.reclaim();
    assert!(r.restarted);
    assert!(!h.queue.is_stopped());
    assert_eq!(h.queue.stats().restart_cnt, 1);
}

#[test]
fn test_completion_counter_wraps() {
    let regs = SimRegisters::starting_at(u32::MAX - 2);
    let h = harness_with::<Vec<u8>>(QueueConfig::new(16, 1), regs);
    for i in 0..6 {
        h.queue.transmit(TxPacket::new(frame(i, 100))).unwrap();
    }
    h.queue.flush();
    h.regs.complete(6);

    let r = h.queue.reclaim();
    assert_eq!(r.completed, 6);
    assert_eq!(r.bytes, 600);
    assert_eq!(h.queue.state(), IqState::Empty);
}

#[test]
fn test_budgeted_reclaim_carries_over() {
    let h = harness::<Vec<u8>>(16, 1);
    for i in 0..10 {
        h.queue.transmit(TxPacket::new(frame(i, 50))).unwrap();
    }
    h.queue.flush();
    h.regs.complete(10);

    let first = h.queue.reclaim_budget(4);
    assert_eq!(first.completed, 4);
    assert_eq!(first.buffers[0], frame(0, 50));
    let rest = h.queue.reclaim_budget(100);
    assert_eq!(rest.completed, 6);
    assert_eq!(rest.buffers[0], frame(4, 50));
    assert_eq!(h.queue.stats().pkts_processed, 10);
    assert_eq!(h.dma.live_mappings(), 0);
}

#[test]
fn test_flush_announces_partial_batch() {
    let h = harness::<Vec<u8>>(64, 1);
    for i in 0..5 {
        h.queue.transmit(TxPacket::new(frame(i, 60))).unwrap();
    }
    assert_eq!(h.regs.announced(), 0);
    assert_eq!(h.queue.indices().fill_count, 5);
    assert_eq!(h.queue.flush(), 5);
    assert_eq!(h.regs.announced(), 5);
    assert_eq!(h.regs.doorbell_writes(), 1);
}

#[test]
fn test_destroy_returns_in_flight_buffers() {
    let h = harness::<Vec<u8>>(8, 1);
    for i in 0..4 {
        h.queue.transmit(TxPacket::new(frame(i, 32))).unwrap();
    }
    h.regs.complete(1);
    h.queue.reclaim();

    let dma = h.dma.clone();
    let left = h.queue.destroy();
    assert_eq!(left, vec![frame(1, 32), frame(2, 32), frame(3, 32)]);
    assert_eq!(dma.live_mappings(), 0);
    assert_eq!(dma.live_allocations(), 0);
}
