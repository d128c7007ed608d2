use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rhizo_image::{Image, ImageSize};
use rhizo_measure::config::{FrangiConfig, ThresholdParams, ThresholdingConfig};
use rhizo_measure::geometry_filters::LengthWidthParams;
use rhizo_measure::skeleton::{ObjectBundle, SkeletonParams};
use rhizo_measure::stage::Stage;
use rhizo_measure::{segment_frangi, segment_thresholding, Raster};

// dark random strokes on a light noisy background
fn create_test_raster(width: usize, height: usize) -> Raster {
    let mut rng = StdRng::seed_from_u64(7);
    let size = ImageSize { width, height };
    let mut data = (0..width * height)
        .map(|_| rng.random_range(0.8..1.0))
        .collect::<Vec<f32>>();

    for _ in 0..(width * height / 8192).max(1) {
        let (r0, c0) = (rng.random_range(0..height), rng.random_range(0..width));
        let (r1, c1) = (rng.random_range(0..height), rng.random_range(0..width));
        let steps = r0.abs_diff(r1).max(c0.abs_diff(c1)).max(1);
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let r = (r0 as f32 + t * (r1 as f32 - r0 as f32)) as usize;
            let c = (c0 as f32 + t * (c1 as f32 - c0 as f32)) as usize;
            for rr in r.saturating_sub(1)..(r + 2).min(height) {
                for cc in c.saturating_sub(1)..(c + 2).min(width) {
                    data[rr * width + cc] = 0.2;
                }
            }
        }
    }

    Raster::Mono(Image::new(size, data).unwrap())
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");

    let thresholding = ThresholdingConfig {
        thresholds: vec![ThresholdParams {
            block_size: 51,
            offset: 0.05,
            ..Default::default()
        }],
        length_width: Stage::Apply(LengthWidthParams::default()),
        ..Default::default()
    };
    let frangi = FrangiConfig::default();

    for (width, height) in [(256, 256), (512, 512)].iter() {
        group.throughput(Throughput::Elements((*width * *height) as u64));
        let parameter_string = format!("{width}x{height}");
        let raster = create_test_raster(*width, *height);

        let Raster::Mono(plane) = &raster else {
            unreachable!()
        };
        let objects = plane.map(|&v| v < 0.5);

        group.bench_with_input(
            BenchmarkId::new("object_bundle", &parameter_string),
            &objects,
            |b, m| b.iter(|| std::hint::black_box(ObjectBundle::from_mask(m, &SkeletonParams::default()))),
        );

        group.bench_with_input(
            BenchmarkId::new("thresholding", &parameter_string),
            &raster,
            |b, r| b.iter(|| std::hint::black_box(segment_thresholding(r, &thresholding, "bench"))),
        );

        group.bench_with_input(
            BenchmarkId::new("frangi", &parameter_string),
            &raster,
            |b, r| b.iter(|| std::hint::black_box(segment_frangi(r, &frangi, "bench"))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
