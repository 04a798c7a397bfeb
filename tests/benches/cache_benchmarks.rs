//! # MSP Identity Cache Benchmarks
//!
//! | Component | Operation | Target |
//! |-----------|-----------|--------|
//! | SecondChanceCache | hit / miss-with-eviction | < 1µs |
//! | CachedMsp | validate on a warm cache vs. provider | hit ≪ provider |
//! | AliasRegistry | submit + commit through the channel | > 100k records/s |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use msp_cache::{
    AliasRegistry, AliasRegistryConfig, CachedMsp, IdentityCacheConfig,
    MembershipServiceProvider, NoOpMetrics, PositionRecord, SecondChanceCache,
};
use msp_tests::fixtures::{serialized_identity, FakeX509Msp};
use rand::Rng;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Second-chance cache
// ============================================================================

fn bench_second_chance_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("second-chance-cache");
    group.measurement_time(Duration::from_secs(5));

    for capacity in [100usize, 1_000, 10_000] {
        let Some(cap) = NonZeroUsize::new(capacity) else {
            continue;
        };
        let cache: SecondChanceCache<u64, u64> = SecondChanceCache::new(cap);
        for key in 0..capacity as u64 {
            cache.add(key, key);
        }

        group.bench_with_input(BenchmarkId::new("get_hit", capacity), &cache, |b, cache| {
            let mut rng = rand::thread_rng();
            b.iter(|| black_box(cache.get(&rng.gen_range(0..capacity as u64))))
        });

        // Keys drawn from twice the capacity: roughly half the adds evict.
        group.bench_with_input(BenchmarkId::new("add_churn", capacity), &cache, |b, cache| {
            let mut rng = rand::thread_rng();
            b.iter(|| {
                let key = rng.gen_range(0..2 * capacity as u64);
                if cache.get(&key).is_none() {
                    black_box(cache.add(key, key));
                }
            })
        });
    }

    group.finish();
}

// ============================================================================
// Cached provider
// ============================================================================

fn bench_cached_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached-msp");

    let creators: Vec<Vec<u8>> = (0..64)
        .map(|n| serialized_identity("Org1MSP", &format!("client{}", n)))
        .collect();

    let provider = FakeX509Msp::new("Org1MSP");
    group.bench_function("provider_deserialize_validate", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let creator = &creators[rng.gen_range(0..creators.len())];
            let identity = provider.deserialize_identity(creator).ok()?;
            black_box(provider.validate(identity.as_ref()).ok())
        })
    });

    let cached = CachedMsp::new(FakeX509Msp::new("Org1MSP"), &IdentityCacheConfig::default())
        .expect("cache construction failed");
    group.bench_function("cached_deserialize_validate", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let creator = &creators[rng.gen_range(0..creators.len())];
            let identity = cached.deserialize_identity(creator).ok()?;
            black_box(identity.validate().ok())
        })
    });

    group.finish();
}

// ============================================================================
// Alias registry
// ============================================================================

fn bench_alias_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("alias-registry");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime construction failed");

    let batch = 1_000u64;
    let creators: Vec<Vec<u8>> = (0..batch)
        .map(|n| serialized_identity("Org1MSP", &format!("peer{}", n)))
        .collect();

    group.throughput(Throughput::Elements(batch));
    group.bench_function("submit_and_commit_1000", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let (registry, _consumer) =
                    AliasRegistry::spawn(&AliasRegistryConfig::default(), Arc::new(NoOpMetrics))
                        .ok()?;
                for (n, creator) in creators.iter().enumerate() {
                    registry
                        .submit_position(PositionRecord::new(creator, n as u64, 0, 0))
                        .await
                        .ok()?;
                }
                registry.flush().await.ok()?;
                black_box(Some(registry.len()))
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_second_chance_cache,
    bench_cached_validation,
    bench_alias_ingestion
);
criterion_main!(benches);
