use bloom_registry::BloomFilter;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    for &(m, k) in &[(1000u32, 8u8), (1000, 16), (1000, 32), (2000, 8), (3000, 8)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("m{}_k{}", m, k)),
            &(m, k),
            |b, &(m, k)| {
                let mut filter = BloomFilter::new("bench", m, k).unwrap();
                let mut i = 0u64;
                b.iter(|| {
                    i += 1;
                    filter.add(black_box(&i.to_le_bytes())).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");
    for &(m, k) in &[(1000u32, 8u8), (1000, 16), (1000, 32), (2000, 8), (3000, 8)] {
        let mut filter = BloomFilter::new("bench", m, k).unwrap();
        for i in 0..100u64 {
            filter.add(&i.to_le_bytes()).unwrap();
        }
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("m{}_k{}", m, k)),
            &filter,
            |b, filter| {
                let mut i = 0u64;
                b.iter(|| {
                    i += 1;
                    black_box(filter.check(&i.to_le_bytes()).is_ok())
                });
            },
        );
    }
    group.finish();
}

fn bench_account_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("account_roundtrip");
    for &m in &[1000u32, 5000, 10_000] {
        let filter = BloomFilter::new("bench", m, 8).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(m), &filter, |b, filter| {
            b.iter(|| {
                let bytes = filter.to_bytes().unwrap();
                black_box(BloomFilter::from_bytes(&bytes).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_check, bench_account_roundtrip);
criterion_main!(benches);
