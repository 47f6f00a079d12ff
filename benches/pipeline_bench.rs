use centerframe::{
    CompositeRenderer, CompositionSettings, ContentBoundingBoxDetector, DetectOptions, PixelBuffer,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// White square image with a centered dark block covering a quarter of it
fn sample(size: u32) -> PixelBuffer {
    let mut data = PixelBuffer::filled(size, size, [255, 255, 255, 255]).into_raw();
    let (lo, hi) = (size / 4, size * 3 / 4);
    for y in lo..hi {
        for x in lo..hi {
            let i = ((y * size + x) * 4) as usize;
            data[i..i + 4].copy_from_slice(&[40, 80, 120, 255]);
        }
    }
    PixelBuffer::from_raw(size, size, data).unwrap()
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");
    let options = DetectOptions::default();
    for size in [256u32, 1024, 2048] {
        let buffer = sample(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &buffer, |b, buf| {
            b.iter(|| ContentBoundingBoxDetector::detect_with(black_box(buf), &options))
        });
    }
    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.sample_size(20);
    let settings = CompositionSettings::default();
    // 64 upscales; 2048 takes the prefilter path
    for size in [64u32, 512, 2048] {
        let content = sample(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &content, |b, content| {
            b.iter(|| CompositeRenderer::compose(black_box(content), &settings).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detect, bench_compose);
criterion_main!(benches);
