use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use anasig::magnitude::{detect_kernel, reduce_magnitude_with, scalar_kernel};

fn bench_magnitude(c: &mut Criterion) {
    let mut group = c.benchmark_group("magnitude_f32");
    for &size in &[1024usize, 4096, 16384] {
        let real: Vec<f32> = (0..size).map(|i| (i as f32 * 0.01).sin()).collect();
        let imag: Vec<f32> = (0..size).map(|i| (i as f32 * 0.01).cos() * size as f32).collect();
        let mut out = vec![0.0f32; size];
        let scale = 1.0 / size as f32;
        for kernel in [scalar_kernel(), detect_kernel()] {
            group.bench_function(BenchmarkId::new(kernel.name(), size), |b| {
                b.iter(|| reduce_magnitude_with(kernel, &real, &imag, scale, &mut out).unwrap())
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_magnitude);
criterion_main!(benches);
