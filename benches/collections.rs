//! Criterion benchmarks for the two collection engines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use plinth::{HashMap, TrieOrderedMultimap};

fn bench_hash_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_map");
    for &size in &[1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("insert", size), &size, |b, &size| {
            b.iter(|| {
                let mut map = HashMap::new();
                for key in 0..size as u64 {
                    map.insert(black_box(key), key).unwrap();
                }
                map
            });
        });
        group.bench_with_input(BenchmarkId::new("lookup", size), &size, |b, &size| {
            let mut map = HashMap::new();
            for key in 0..size as u64 {
                map.insert(key, key).unwrap();
            }
            b.iter(|| {
                let mut hits = 0u64;
                for key in 0..size as u64 {
                    if map.get(&black_box(key)).is_some() {
                        hits += 1;
                    }
                }
                hits
            });
        });
    }
    group.finish();
}

fn bench_trie_multimap(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_multimap");
    for &size in &[1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("add", size), &size, |b, &size| {
            b.iter(|| {
                let mut map = TrieOrderedMultimap::<u32, u32>::new();
                for key in 0..size as u32 {
                    map.add(black_box(key.wrapping_mul(2_654_435_761)), key).unwrap();
                }
                map
            });
        });
        group.bench_with_input(BenchmarkId::new("ordered_walk", size), &size, |b, &size| {
            let mut map = TrieOrderedMultimap::<u32, u32>::new();
            for key in 0..size as u32 {
                map.add(key.wrapping_mul(2_654_435_761), key).unwrap();
            }
            b.iter(|| {
                let mut sum = 0u64;
                for (key, _) in &map {
                    sum = sum.wrapping_add(key as u64);
                }
                sum
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hash_map, bench_trie_multimap);
criterion_main!(benches);
