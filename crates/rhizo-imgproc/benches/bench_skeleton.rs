use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rhizo_image::{Image, ImageSize, Mask};
use rhizo_imgproc::distance_transform::distance_transform;
use rhizo_imgproc::label::{label, Connectivity};
use rhizo_imgproc::medial_axis::medial_axis;

// random thick line segments on an empty background
fn create_test_mask(width: usize, height: usize) -> Mask {
    let mut rng = StdRng::seed_from_u64(42);
    let size = ImageSize { width, height };
    let mut mask = Image::from_size_val(size, false).unwrap();
    for _ in 0..(width * height / 4096).max(1) {
        let (r0, c0) = (rng.random_range(0..height), rng.random_range(0..width));
        let (r1, c1) = (rng.random_range(0..height), rng.random_range(0..width));
        let half = rng.random_range(1..4) as isize;
        let steps = r0.abs_diff(r1).max(c0.abs_diff(c1)).max(1);
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let r = (r0 as f32 + t * (r1 as f32 - r0 as f32)) as isize;
            let c = (c0 as f32 + t * (c1 as f32 - c0 as f32)) as isize;
            for dr in -half..=half {
                for dc in -half..=half {
                    let (rr, cc) = (r + dr, c + dc);
                    if rr >= 0 && cc >= 0 && (rr as usize) < height && (cc as usize) < width {
                        mask.as_slice_mut()[rr as usize * width + cc as usize] = true;
                    }
                }
            }
        }
    }
    mask
}

fn bench_skeleton(c: &mut Criterion) {
    let mut group = c.benchmark_group("Skeleton");

    for (width, height) in [(256, 256), (512, 512), (1024, 1024)].iter() {
        group.throughput(Throughput::Elements((*width * *height) as u64));
        let parameter_string = format!("{width}x{height}");
        let mask = create_test_mask(*width, *height);

        group.bench_with_input(
            BenchmarkId::new("distance_transform", &parameter_string),
            &mask,
            |b, m| {
                let mut dst = Image::from_size_val(m.size(), 0.0f32).unwrap();
                b.iter(|| std::hint::black_box(distance_transform(m, &mut dst)))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("medial_axis", &parameter_string),
            &mask,
            |b, m| {
                let mut skeleton = Image::from_size_val(m.size(), false).unwrap();
                let mut distance = Image::from_size_val(m.size(), 0.0f32).unwrap();
                b.iter(|| std::hint::black_box(medial_axis(m, &mut skeleton, &mut distance)))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("label", &parameter_string),
            &mask,
            |b, m| b.iter(|| std::hint::black_box(label(m, Connectivity::Eight))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_skeleton);
criterion_main!(benches);
