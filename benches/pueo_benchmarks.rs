//! Pueo Benchmarks
//!
//! Criterion benchmarks for the index hot paths: insertion, exact lookup,
//! fuzzy search at increasing edit distances, prefix and phrase search, and
//! parallel bulk loading.
//!
//! To run the benchmarks:
//! ```bash
//! cargo bench --features benchmarking
//! ```

use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput,
};
use pueo_lib::bench::{build_index, dictionary, phrases, tsv, WordGenerator};
use pueo_lib::config::LoaderSettings;
use pueo_lib::data_structures::PueoIndex;
use pueo_lib::ingest;
use std::time::Duration;

const SEED: u64 = 0x5EED;

/// Benchmark insertion of fresh keys.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    group.measurement_time(Duration::from_secs(3));

    for size in [1_000, 10_000].iter() {
        let keys = dictionary(*size, SEED);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &keys, |b, keys| {
            b.iter(|| {
                let index = PueoIndex::new();
                for (i, key) in keys.iter().enumerate() {
                    index.add(black_box(key), i).unwrap();
                }
                index
            });
        });
    }

    group.finish();
}

/// Benchmark exact lookups against a populated index.
fn bench_get(c: &mut Criterion) {
    let keys = dictionary(10_000, SEED);
    let index = build_index(&keys);

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("hit", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(index.get(key).unwrap());
            }
        });
    });
    group.bench_function("miss", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(index.contains(format!("{key}#")).unwrap());
            }
        });
    });
    group.finish();
}

/// Benchmark fuzzy search for typo'd queries at distances 0 to 2.
fn bench_search(c: &mut Criterion) {
    let keys = dictionary(20_000, SEED);
    let index = build_index(&keys);
    let mut generator = WordGenerator::new(SEED + 1);
    let queries: Vec<String> = keys
        .iter()
        .step_by(200)
        .map(|key| generator.typo(key))
        .collect();

    let mut group = c.benchmark_group("search");
    group.sampling_mode(SamplingMode::Flat);
    group.throughput(Throughput::Elements(queries.len() as u64));

    for distance in [0usize, 1, 2].iter() {
        group.bench_with_input(
            BenchmarkId::new("distance", distance),
            distance,
            |b, &distance| {
                b.iter(|| {
                    for query in &queries {
                        // Queries no longer than the distance are rejected
                        let _ = black_box(index.search(query, distance, 10, false));
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark prefix search with and without typos.
fn bench_prefix(c: &mut Criterion) {
    let keys = dictionary(20_000, SEED);
    let index = build_index(&keys);
    let prefixes: Vec<String> = keys
        .iter()
        .step_by(200)
        .map(|key| key.chars().take(3).collect())
        .collect();

    let mut group = c.benchmark_group("match_prefix");
    group.throughput(Throughput::Elements(prefixes.len() as u64));

    for distance in [0usize, 1].iter() {
        group.bench_with_input(
            BenchmarkId::new("distance", distance),
            distance,
            |b, &distance| {
                b.iter(|| {
                    for prefix in &prefixes {
                        black_box(index.match_prefix(prefix, distance, 25).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark multi-term phrase search with the fuzziness heuristic.
fn bench_phrase(c: &mut Criterion) {
    let keys = phrases(10_000, SEED);
    let index = build_index(&keys);
    let mut generator = WordGenerator::new(SEED + 2);
    let queries: Vec<String> = keys
        .iter()
        .step_by(100)
        .map(|phrase| {
            phrase
                .split(' ')
                .map(|term| generator.typo(term))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let mut group = c.benchmark_group("phrase");
    group.throughput(Throughput::Elements(queries.len() as u64));

    for heuristic in [false, true].iter() {
        group.bench_with_input(
            BenchmarkId::new("heuristic", heuristic),
            heuristic,
            |b, &heuristic| {
                b.iter(|| {
                    for query in &queries {
                        black_box(index.search(query, 2, 10, heuristic).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark parallel bulk loading at different worker counts.
fn bench_load(c: &mut Criterion) {
    let input = tsv(&dictionary(50_000, SEED));

    let mut group = c.benchmark_group("ingest");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(input.len() as u64));

    for workers in [1usize, 4, 8].iter() {
        let settings = LoaderSettings {
            worker_threads: *workers,
            ..LoaderSettings::default()
        };
        group.bench_with_input(BenchmarkId::new("workers", workers), &settings, |b, settings| {
            b.iter(|| {
                let index = PueoIndex::new();
                ingest::load_str(&index, black_box(&input), settings).unwrap();
                index
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add,
    bench_get,
    bench_search,
    bench_prefix,
    bench_phrase,
    bench_load
);
criterion_main!(benches);
