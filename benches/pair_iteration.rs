use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hva_kernel::{apply_with_either_defined, scale_into, FnPairInPlaceVisitor, VBuffer};

fn sparse_vec(length: usize, count: usize) -> VBuffer<f64> {
    let step = length / count.max(1);
    let indices: Vec<usize> = (0..count).map(|i| i * step).collect();
    let values: Vec<f64> = (0..count).map(|i| i as f64 + 1.0).collect();
    VBuffer::from_parts(length, count, values, Some(indices)).unwrap()
}

fn bench_apply_with_either_defined(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_with_either_defined");
    for &length in &[1_000usize, 100_000] {
        let density = length / 20;
        group.bench_with_input(BenchmarkId::new("sparse_sparse", length), &length, |b, _| {
            b.iter_batched(
                || (sparse_vec(length, density), sparse_vec(length, density)),
                |(mut dst, src)| {
                    apply_with_either_defined(
                        &mut dst,
                        black_box(&src),
                        &mut FnPairInPlaceVisitor(|_i, s, d: &mut f64| {
                            *d += s;
                            true
                        }),
                    )
                    .unwrap();
                    black_box(dst)
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_scale_into(c: &mut Criterion) {
    let mut group = c.benchmark_group("scale_into");
    for &length in &[1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::new("dense", length), &length, |b, _| {
            b.iter_batched(
                || VBuffer::<f64>::dense(length),
                |mut v| {
                    scale_into(&mut v, black_box(2.0));
                    black_box(v)
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_apply_with_either_defined, bench_scale_into);
criterion_main!(benches);
