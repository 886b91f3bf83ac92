//! Cross-handle tests of the bounded-buffer protocol.
//!
//! Producers and the consumer run in separate threads over separately
//! attached handles, which exercises the same named-object paths that
//! separate processes use.
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arcset_shm::{Edge, RingBuffer, RingConfig, RingError, Solution};

fn unique_config(tag: &str) -> RingConfig {
    RingConfig::with_prefix(&format!("art_{}_{tag}", std::process::id()))
}

fn tagged(producer: u16, sequence: u16) -> Solution {
    Solution::from_edges([Edge {
        from: producer,
        to: sequence,
    }])
    .unwrap()
}

#[test]
fn published_solution_round_trips() {
    let config = unique_config("round_trip");
    let ring: RingBuffer<4> = RingBuffer::create(config.clone()).unwrap();
    let producer: RingBuffer<4> = RingBuffer::attach(config).unwrap();

    let solution = tagged(1, 2);
    assert!(producer.publish(&solution).unwrap());
    assert_eq!(ring.take().unwrap(), solution);
}

#[test]
fn create_is_exclusive() {
    let config = unique_config("exclusive");
    let ring: RingBuffer<4> = RingBuffer::create(config.clone()).unwrap();

    match RingBuffer::<4>::create(config.clone()) {
        Err(RingError::Create { name, .. }) => assert_eq!(name, config.segment),
        other => panic!("expected creation to fail, got {:?}", other.map(|_| ())),
    }

    // The failed attempt must not have damaged the live ring.
    assert!(ring.publish(&tagged(0, 0)).unwrap());
    assert_eq!(ring.take().unwrap(), tagged(0, 0));
}

#[test]
fn attach_requires_a_creator() {
    let config = unique_config("orphan");
    match RingBuffer::<4>::attach(config) {
        Err(RingError::Attach { .. }) => {}
        other => panic!("expected attach to fail, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn names_are_released_when_the_owner_drops() {
    let config = unique_config("released");
    let ring: RingBuffer<4> = RingBuffer::create(config.clone()).unwrap();
    drop(ring);

    assert!(RingBuffer::<4>::attach(config).is_err());
}

#[test]
fn interrupt_is_visible_across_handles() {
    let config = unique_config("interrupt");
    let ring: RingBuffer<4> = RingBuffer::create(config.clone()).unwrap();
    let attached: RingBuffer<4> = RingBuffer::attach(config).unwrap();

    assert!(!attached.is_shutdown());
    ring.shutdown();
    assert!(attached.is_shutdown());
}

#[test]
fn no_solution_is_lost_or_duplicated() {
    const PRODUCERS: u16 = 4;
    const PER_PRODUCER: u16 = 50;

    let config = unique_config("permutation");
    let ring = Arc::new(RingBuffer::<4>::create(config.clone()).unwrap());

    let mut handles = Vec::new();
    for producer in 0..PRODUCERS {
        let config = config.clone();
        handles.push(thread::spawn(move || {
            let ring: RingBuffer<4> = RingBuffer::attach(config).unwrap();
            for sequence in 0..PER_PRODUCER {
                assert!(ring.publish(&tagged(producer, sequence)).unwrap());
            }
        }));
    }

    let mut seen = HashSet::new();
    for _ in 0..(PRODUCERS * PER_PRODUCER) {
        let solution = ring.take().unwrap();
        let tag = solution.edges()[0];
        assert!(seen.insert(tag), "solution {tag} delivered twice");
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(seen.len(), usize::from(PRODUCERS * PER_PRODUCER));
}

#[test]
fn shutdown_releases_a_producer_blocked_on_a_full_ring() {
    let config = unique_config("blocked");
    let ring = Arc::new(RingBuffer::<2>::create(config).unwrap());

    // Saturate the ring; the next publish has to wait for a free slot.
    assert!(ring.publish(&tagged(0, 0)).unwrap());
    assert!(ring.publish(&tagged(0, 1)).unwrap());

    let blocked = Arc::clone(&ring);
    let publisher = thread::spawn(move || blocked.publish(&tagged(0, 2)).unwrap());

    thread::sleep(Duration::from_millis(150));
    ring.shutdown();

    assert!(!publisher.join().unwrap(), "publish must give up on shutdown");
}
