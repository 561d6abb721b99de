use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lembar::{types::element::ElementKind, utils::mock::TempStorage};

const ELEMENT_COUNTS: &[u64] = &[1_000, 10_000, 50_000];
const CACHE_CAPACITIES: &[usize] = &[3, 8, 32];
const PAGE_BYTE_CAPACITY: usize = 512;

fn benchmark_sequential_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_read");
    for &element_count in ELEMENT_COUNTS {
        group.throughput(Throughput::Elements(element_count));
        group.bench_with_input(
            BenchmarkId::from_parameter(element_count),
            &element_count,
            |b, &element_count| {
                let mut temp = TempStorage::with_prefix("bench_seq_read");
                let storage = temp
                    .open_storage(ElementKind::Int32, element_count, 3, PAGE_BYTE_CAPACITY)
                    .unwrap();
                for i in 0..element_count as i64 {
                    storage.write_element(i, i).unwrap();
                }
                b.iter(|| {
                    let mut sum = 0i64;
                    for i in 0..element_count as i64 {
                        sum += storage.read_element(black_box(i)).unwrap();
                    }
                    black_box(sum)
                });
            },
        );
    }
    group.finish();
}

fn benchmark_strided_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("strided_write");
    let element_count = 10_000u64;
    let elements_per_page = (PAGE_BYTE_CAPACITY / ElementKind::Int32.width()) as i64;
    for &cache_capacity in CACHE_CAPACITIES {
        group.throughput(Throughput::Elements(element_count / elements_per_page as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(cache_capacity),
            &cache_capacity,
            |b, &cache_capacity| {
                let mut temp = TempStorage::with_prefix("bench_strided_write");
                let storage = temp
                    .open_storage(
                        ElementKind::Int32,
                        element_count,
                        cache_capacity,
                        PAGE_BYTE_CAPACITY,
                    )
                    .unwrap();
                // One write per page keeps every access a potential miss,
                // exercising eviction and write-back.
                b.iter(|| {
                    let mut index = 0i64;
                    while (index as u64) < element_count {
                        storage.write_element(black_box(index), index).unwrap();
                        index += elements_per_page;
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_read,
    benchmark_strided_write
);
criterion_main!(benches);
