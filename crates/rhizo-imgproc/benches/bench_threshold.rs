use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rhizo_image::{Image, ImageSize};
use rhizo_imgproc::threshold::{otsu_threshold, threshold_local, LocalThresholdMethod};

fn create_test_image(width: usize, height: usize) -> Image<f32, 1> {
    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<f32> = (0..(width * height)).map(|_| rng.random()).collect();
    let size = ImageSize { width, height };
    Image::new(size, data).unwrap()
}

fn bench_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("Threshold");

    let (w, h) = (1024, 768);
    let src = create_test_image(w, h);

    for (name, method) in [
        ("local_gaussian", LocalThresholdMethod::Gaussian),
        ("local_mean", LocalThresholdMethod::Mean),
    ] {
        for block_size in [31, 101] {
            group.bench_with_input(
                BenchmarkId::new(name, format!("{w}x{h}_{block_size}")),
                &src,
                |b, src| {
                    let mut dst = Image::from_size_val(src.size(), false).unwrap();
                    b.iter(|| {
                        threshold_local(src, &mut dst, block_size, method, 0.05).unwrap();
                    })
                },
            );
        }
    }

    // the median is much slower, keep the block small
    group.bench_with_input(
        BenchmarkId::new("local_median", format!("{w}x{h}_15")),
        &src,
        |b, src| {
            let mut dst = Image::from_size_val(src.size(), false).unwrap();
            b.iter(|| {
                threshold_local(src, &mut dst, 15, LocalThresholdMethod::Median, 0.05).unwrap();
            })
        },
    );

    group.bench_with_input(BenchmarkId::new("otsu", format!("{w}x{h}")), &src, |b, src| {
        b.iter(|| std::hint::black_box(otsu_threshold(src)))
    });

    group.finish();
}

criterion_group!(benches, bench_threshold);
criterion_main!(benches);
