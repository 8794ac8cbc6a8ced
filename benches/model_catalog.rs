use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pollux::catalog;

fn criterion_benchmark(criterion: &mut Criterion) {
    criterion.bench_function("catalog expansion", |bencher| {
        bencher.iter(|| catalog::catalog().len())
    });

    criterion.bench_function("resolve_variant search+maxthinking", |bencher| {
        bencher.iter(|| catalog::resolve_variant(black_box("gemini-2.5-pro-search-maxthinking")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
