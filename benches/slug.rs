//! Slug 生成与校验性能基准测试

use std::collections::HashSet;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use linktracker::services::slug::{SlugGenerator, is_valid_slug, random_candidate};

// ============== random_candidate 基准测试 ==============

fn bench_random_candidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("slug/random_candidate");

    for length in [4, 6, 8, 12] {
        group.bench_with_input(BenchmarkId::new("length", length), &length, |b, &length| {
            b.iter(|| {
                let slug = random_candidate(length);
                assert_eq!(slug.len(), length);
            });
        });
    }

    group.finish();
}

// ============== is_valid_slug 基准测试 ==============

fn bench_is_valid_slug(c: &mut Criterion) {
    let mut group = c.benchmark_group("slug/is_valid_slug");

    group.bench_function("valid", |b| {
        b.iter(|| assert!(is_valid_slug("spring-26_Promo")));
    });

    group.bench_function("invalid", |b| {
        b.iter(|| assert!(!is_valid_slug("'; DROP TABLE--")));
    });

    group.finish();
}

// ============== SlugGenerator::generate 基准测试 ==============

fn bench_generate_with_collisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("slug/generate");

    // 已占用 slug 越多，重试越多
    for taken in [0usize, 1_000, 10_000] {
        let generator = SlugGenerator::new(3, 1000);
        let existing: HashSet<String> = (0..taken).map(|_| generator.candidate()).collect();

        group.bench_with_input(BenchmarkId::new("taken", taken), &existing, |b, existing| {
            b.iter(|| {
                generator
                    .generate(|candidate| !existing.contains(candidate))
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_random_candidate,
    bench_is_valid_slug,
    bench_generate_with_collisions
);
criterion_main!(benches);
