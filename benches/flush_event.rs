//! Benchmarks for the flush event hot paths.
//!
//! Run with: cargo bench
//! View results in: target/criterion/report/index.html

use std::sync::{Arc, Weak};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shuffle_flush::contracts::{ShuffleBuffer, ShufflePartitionedBlock};
use shuffle_flush::event::{FlushEvent, ValidityCheck};

struct NoopBuffer;

impl ShuffleBuffer for NoopBuffer {
    fn release_flushed(&self, _event_id: u64, _encoded_length: u64) {}
}

fn create_event(buffer: &Arc<NoopBuffer>, validity: Option<ValidityCheck>) -> FlushEvent {
    let weak: Weak<NoopBuffer> = Arc::downgrade(buffer);
    FlushEvent::new(
        1,
        "bench-app",
        0,
        0,
        0,
        1024,
        Vec::<ShufflePartitionedBlock>::new(),
        validity,
        weak,
    )
    .unwrap()
}

fn bench_increase_retry_times(c: &mut Criterion) {
    let buffer = Arc::new(NoopBuffer);
    let event = create_event(&buffer, None);

    c.bench_function("increase_retry_times", |b| {
        b.iter(|| event.increase_retry_times());
    });
}

fn bench_is_valid(c: &mut Criterion) {
    let buffer = Arc::new(NoopBuffer);
    let check: ValidityCheck = Arc::new(|| black_box(true));
    let event = create_event(&buffer, Some(check));

    c.bench_function("is_valid_with_check", |b| {
        b.iter(|| black_box(event.is_valid()));
    });
}

fn bench_cleanup_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("do_cleanup");

    for callbacks in [1, 8, 64].iter() {
        let buffer = Arc::new(NoopBuffer);
        let mut event = create_event(&buffer, None);
        for _ in 0..*callbacks {
            event.add_cleanup_callback(|| Ok(()));
        }

        group.throughput(Throughput::Elements(*callbacks as u64));
        group.bench_with_input(BenchmarkId::from_parameter(callbacks), callbacks, |b, _| {
            b.iter(|| black_box(event.do_cleanup()));
        });
    }

    group.finish();
}

criterion_group!(
    event_benches,
    bench_increase_retry_times,
    bench_is_valid,
    bench_cleanup_chain,
);

criterion_main!(event_benches);
