//! Multi-producer stress: three producers push 100,000 sequential integers
//! each into a ring of `1 << 21` slots while one consumer drains it.

#![cfg(not(feature = "loom"))]

use ringq_rs::{
    BlockingCasRing, CasRing, Empty, Full, MutexRing, RingBuffer, UnpaddedCasRing,
    HIGH_THROUGHPUT_CONFIG,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const PRODUCERS: usize = 3;
const PER_PRODUCER: u64 = 100_000;
const TOTAL: u64 = PRODUCERS as u64 * PER_PRODUCER;

fn stress<R>(ring: R)
where
    R: RingBuffer<u64> + Send + Sync + 'static,
{
    ringq_rs::init_tracing();
    let ring = Arc::new(ring);
    assert_eq!(ring.capacity(), 1 << 21);
    let producers_done = Arc::new(AtomicBool::new(false));

    let consumer = {
        let ring = Arc::clone(&ring);
        let producers_done = Arc::clone(&producers_done);
        thread::spawn(move || {
            let mut counts = vec![0u32; PER_PRODUCER as usize];
            let mut received = 0u64;
            loop {
                match ring.dequeue() {
                    Ok(v) => {
                        counts[v as usize] += 1;
                        received += 1;
                    }
                    Err(Empty) if producers_done.load(Ordering::Acquire) && ring.is_empty() => {
                        break;
                    }
                    Err(Empty) => thread::yield_now(),
                }
            }
            (received, counts)
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let mut item = i;
                    while let Err(Full(back)) = ring.enqueue(item) {
                        item = back;
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    producers_done.store(true, Ordering::Release);

    let (received, counts) = consumer.join().unwrap();
    assert_eq!(received, TOTAL);
    // Every producer sends 0..PER_PRODUCER, so each value arrives once per producer.
    assert!(
        counts.iter().all(|&c| c == PRODUCERS as u32),
        "some value was lost or duplicated"
    );
    assert!(ring.is_empty());
}

#[test]
fn stress_mutex() {
    stress(MutexRing::<u64>::with_config(HIGH_THROUGHPUT_CONFIG).unwrap());
}

#[test]
fn stress_cas_padded() {
    stress(CasRing::<u64>::with_config(HIGH_THROUGHPUT_CONFIG).unwrap());
}

#[test]
fn stress_cas_unpadded() {
    stress(UnpaddedCasRing::<u64>::with_config(HIGH_THROUGHPUT_CONFIG).unwrap());
}

#[test]
fn stress_cas_blocking() {
    // Blocking `dequeue` never reports Empty, so the consumer takes exactly TOTAL.
    ringq_rs::init_tracing();
    let ring = Arc::new(BlockingCasRing::<u64>::with_config(HIGH_THROUGHPUT_CONFIG).unwrap());

    let consumer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut counts = vec![0u32; PER_PRODUCER as usize];
            for _ in 0..TOTAL {
                counts[ring.dequeue_blocking() as usize] += 1;
            }
            counts
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    ring.enqueue_blocking(i);
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    let counts = consumer.join().unwrap();
    assert!(counts.iter().all(|&c| c == PRODUCERS as u32));
    assert!(ring.is_empty());
}
