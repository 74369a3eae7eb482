//! Document proxy benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docproxy_bench::{document, AnyDocument};
use docproxy_codec::{FrameCodec, Salt};
use docproxy_core::{DocumentProxy, ProxyConfig};
use docproxy_storage::InMemoryBackend;
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;

fn proxy(config: ProxyConfig) -> DocumentProxy<AnyDocument, InMemoryBackend> {
    DocumentProxy::new(
        "bench.bin",
        AnyDocument,
        InMemoryBackend::new(),
        FrameCodec::new(Salt::new("bench-salt")),
        config,
    )
    .unwrap()
}

/// Benchmark a burst of persists coalesced into one write.
fn bench_persist_burst(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut group = c.benchmark_group("persist_burst");

    for burst in [1usize, 16, 256] {
        let proxy = proxy(ProxyConfig::new().coalesce_window(Duration::ZERO));
        group.bench_with_input(BenchmarkId::from_parameter(burst), &burst, |b, &burst| {
            b.iter(|| {
                runtime.block_on(async {
                    let pending: Vec<_> = (0..burst)
                        .map(|i| {
                            proxy.update(|doc| doc["counter"] = json!(i));
                            proxy.persist()
                        })
                        .collect();
                    for outcome in pending {
                        outcome.await.unwrap();
                    }
                });
            });
        });
    }

    group.finish();
}

/// Benchmark a full read: fetch, decode, verify.
fn bench_read(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut group = c.benchmark_group("read");

    for entries in [16usize, 1024] {
        let proxy = proxy(ProxyConfig::new());
        proxy.replace(document(entries));
        runtime.block_on(proxy.flush()).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(entries), &entries, |b, _| {
            b.iter(|| black_box(runtime.block_on(proxy.read()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_persist_burst, bench_read);

criterion_main!(benches);
