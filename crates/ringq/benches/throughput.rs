use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringq_rs::{
    split, BitmaskRing, BlockingCachedRing, BlockingCasRing, CachedRing, CasRing, Full, LocalRing,
    MutexRing, PaddedSpscRing, RingBuffer, SplitRing, UnpaddedCasRing, UnpaddedSpscRing,
};
use std::sync::Arc;
use std::thread;

const CAPACITY: usize = 1 << 12;
const MSG_PER_PRODUCER: u64 = 1_000_000;
const SINGLE_THREAD_OPS: u64 = 100_000;

fn boxed<R: RingBuffer<u64> + 'static>(ring: R) -> Box<dyn RingBuffer<u64>> {
    Box::new(ring)
}

/// Enqueue/dequeue pairs on one thread: raw per-operation cost.
fn bench_single_thread(c: &mut Criterion) {
    fn run(ring: &dyn RingBuffer<u64>) {
        for i in 0..SINGLE_THREAD_OPS {
            let _ = ring.enqueue(black_box(i));
            black_box(ring.dequeue().ok());
        }
    }

    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(SINGLE_THREAD_OPS));

    let rings = [
        ("modulo", boxed(LocalRing::<u64>::new(CAPACITY).unwrap())),
        ("bitmask", boxed(BitmaskRing::<u64>::new(CAPACITY).unwrap())),
        ("mutex", boxed(MutexRing::<u64>::new(CAPACITY).unwrap())),
        ("spsc", boxed(UnpaddedSpscRing::<u64>::new(CAPACITY).unwrap())),
        ("spsc_padded", boxed(PaddedSpscRing::<u64>::new(CAPACITY).unwrap())),
        ("spsc_cached", boxed(CachedRing::<u64>::new(CAPACITY).unwrap())),
        ("cas_unpadded", boxed(UnpaddedCasRing::<u64>::new(CAPACITY).unwrap())),
        ("cas", boxed(CasRing::<u64>::new(CAPACITY).unwrap())),
    ];
    for (name, ring) in &rings {
        group.bench_function(*name, |b| b.iter(|| run(ring.as_ref())));
    }

    group.finish();
}

fn spsc_round<R: SplitRing<u64> + 'static>(ring: R) {
    let (mut tx, mut rx) = split(ring);

    let producer = thread::spawn(move || {
        for i in 0..MSG_PER_PRODUCER {
            let mut item = i;
            while let Err(Full(back)) = tx.enqueue(item) {
                item = back;
                std::hint::spin_loop();
            }
        }
    });

    let mut count = 0u64;
    while count < MSG_PER_PRODUCER {
        if let Ok(v) = rx.dequeue() {
            black_box(v);
            count += 1;
        }
    }
    producer.join().unwrap();
}

/// One producer thread, one consumer thread.
fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSG_PER_PRODUCER));
    group.sample_size(10);

    group.bench_function("atomic", |b| {
        b.iter(|| spsc_round(UnpaddedSpscRing::<u64>::new(CAPACITY).unwrap()));
    });
    group.bench_function("atomic_padded", |b| {
        b.iter(|| spsc_round(PaddedSpscRing::<u64>::new(CAPACITY).unwrap()));
    });
    group.bench_function("index_cache", |b| {
        b.iter(|| spsc_round(CachedRing::<u64>::new(CAPACITY).unwrap()));
    });
    group.bench_function("index_cache_blocking", |b| {
        b.iter(|| spsc_round(BlockingCachedRing::<u64>::new(CAPACITY).unwrap()));
    });

    group.finish();
}

fn mpmc_round<R>(ring: R, num_producers: u64)
where
    R: RingBuffer<u64> + Send + Sync + 'static,
{
    let ring = Arc::new(ring);
    let total = num_producers * MSG_PER_PRODUCER;

    let handles: Vec<_> = (0..num_producers)
        .map(|_| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..MSG_PER_PRODUCER {
                    let mut item = i;
                    while let Err(Full(back)) = ring.enqueue(item) {
                        item = back;
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let mut count = 0u64;
    while count < total {
        match ring.dequeue() {
            Ok(v) => {
                black_box(v);
                count += 1;
            }
            Err(_) => std::hint::spin_loop(),
        }
    }
    for h in handles {
        h.join().unwrap();
    }
}

/// N producers, one consumer, all sharing the ring through `Arc`.
fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc");
    group.sample_size(10);

    for num_producers in [2u64, 4] {
        group.throughput(Throughput::Elements(num_producers * MSG_PER_PRODUCER));

        group.bench_with_input(
            BenchmarkId::new("mutex", format!("{num_producers}P_1C")),
            &num_producers,
            |b, &n| b.iter(|| mpmc_round(MutexRing::<u64>::new(CAPACITY).unwrap(), n)),
        );
        group.bench_with_input(
            BenchmarkId::new("cas_unpadded", format!("{num_producers}P_1C")),
            &num_producers,
            |b, &n| b.iter(|| mpmc_round(UnpaddedCasRing::<u64>::new(CAPACITY).unwrap(), n)),
        );
        group.bench_with_input(
            BenchmarkId::new("cas", format!("{num_producers}P_1C")),
            &num_producers,
            |b, &n| b.iter(|| mpmc_round(CasRing::<u64>::new(CAPACITY).unwrap(), n)),
        );
        group.bench_with_input(
            BenchmarkId::new("cas_blocking", format!("{num_producers}P_1C")),
            &num_producers,
            |b, &n| b.iter(|| mpmc_round(BlockingCasRing::<u64>::new(CAPACITY).unwrap(), n)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_spsc, bench_mpmc);
criterion_main!(benches);
