use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use warptps_image::Image;
use warptps_imgproc::warp::{resample, resample_with_field};
use warptps_tps::{Point, TpsTransform};

fn transform_for(width: usize, height: usize) -> TpsTransform {
    let (w, h) = (width as f64 - 1.0, height as f64 - 1.0);
    let mut transform = TpsTransform::new();
    transform.add_corners((w, h), (w, h)).unwrap();
    for i in 1..4 {
        let s = [w * i as f64 / 4.0, h * i as f64 / 4.0];
        transform
            .add(Point::Xy(s), Point::Xy([s[0] + 6.0, s[1] - 4.0]))
            .unwrap();
    }
    transform
}

fn bench_warp_tps(c: &mut Criterion) {
    let mut group = c.benchmark_group("WarpTps");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image = Image::<u8, 3>::new(image_size, vec![0u8; width * height * 3]).unwrap();
        let output = Image::<u8, 3>::from_size_val(image_size, 0).unwrap();

        let mut transform = transform_for(*width, *height);
        let field = transform.field(*width, *height).unwrap().clone();

        group.bench_with_input(
            BenchmarkId::new("field", &parameter_string),
            &(&image, &output),
            |b, i| {
                let (src, mut dst) = (i.0, i.1.clone());
                b.iter(|| resample_with_field(black_box(src), black_box(&mut dst), &field, 0.5))
            },
        );

        let evaluator = transform.evaluator().unwrap();
        group.bench_with_input(
            BenchmarkId::new("direct", &parameter_string),
            &(&image, &output),
            |b, i| {
                let (src, mut dst) = (i.0, i.1.clone());
                b.iter(|| resample(black_box(src), black_box(&mut dst), &evaluator, 0.5))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_warp_tps);
criterion_main!(benches);
