//! Benchmarks for cache store and lookup paths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neuromem_cache::{CacheConfig, NeuralCache};
use neuromem_codec::{AutoencoderCodec, AutoencoderConfig, PassthroughCodec};

fn bench_store_passthrough(c: &mut Criterion) {
    let config = CacheConfig {
        capacity: 1024,
        train_steps: 1,
        ..Default::default()
    };
    let cache = NeuralCache::new(config, PassthroughCodec::new(1024)).unwrap();
    let payload = vec![7u8; 512];
    let mut key = 0u64;

    c.bench_function("store_passthrough_1k", |b| {
        b.iter(|| {
            key += 1;
            cache.store(key, payload.clone()).unwrap();
        })
    });
}

fn bench_store_autoencoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_autoencoder");
    group.sample_size(10);

    for steps in [1usize, 10] {
        let config = CacheConfig {
            capacity: 64,
            train_steps: steps,
            ..Default::default()
        };
        let codec = AutoencoderCodec::new(AutoencoderConfig {
            input_size: 256,
            encoding_size: 64,
            hidden_size: 128,
            seed: Some(1),
            ..Default::default()
        })
        .unwrap();
        let cache = NeuralCache::new(config, codec).unwrap();
        let mut key = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, _| {
            b.iter(|| {
                key += 1;
                cache.store(key, b"the quick brown fox".as_slice()).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_nearest_neighbor(c: &mut Criterion) {
    let config = CacheConfig {
        capacity: 4096,
        train_steps: 0,
        ..Default::default()
    };
    let cache = NeuralCache::new(config, PassthroughCodec::new(1024)).unwrap();
    for key in 0..4096u64 {
        cache.store(key, vec![(key % 251) as u8; 64]).unwrap();
    }

    c.bench_function("nearest_neighbor", |b| {
        b.iter(|| black_box(cache.nearest_neighbor(&2048)))
    });
}

criterion_group!(
    benches,
    bench_store_passthrough,
    bench_store_autoencoder,
    bench_nearest_neighbor
);
criterion_main!(benches);
