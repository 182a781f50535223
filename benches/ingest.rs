//! Ingest fast-path latency under concurrent producers.

use std::sync::Arc;
use std::thread;

use appendlog::{Level, LogSink, SinkConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for producers in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(producers), &producers, |b, &producers| {
            let dir = tempfile::tempdir().unwrap();
            let sink = Arc::new(
                LogSink::init(
                    dir.path(),
                    "bench",
                    Level::Trace,
                    SinkConfig {
                        cell_size_bytes: 8 * 1024 * 1024,
                        initial_ring_size: 4,
                        ..SinkConfig::default()
                    },
                )
                .unwrap(),
            );

            b.iter(|| {
                thread::scope(|scope| {
                    for id in 0..producers {
                        let sink = Arc::clone(&sink);
                        scope.spawn(move || {
                            sink.append(Level::Info, "ingest.rs", 1, "bench", format_args!("producer {id}\n"));
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);
