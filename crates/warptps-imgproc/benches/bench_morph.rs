use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use warptps_image::Image;
use warptps_imgproc::morph::MorphEngine;
use warptps_tps::{Point, TpsParameters};

fn bench_morph(c: &mut Criterion) {
    let mut group = c.benchmark_group("Morph");

    for (width, height) in [(256, 224), (512, 448)].iter() {
        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image1 = Image::<u8, 3>::from_size_val(image_size, 50).unwrap();
        let image2 = Image::<u8, 3>::from_size_val(image_size, 200).unwrap();

        let (w, h) = (*width as f64 - 1.0, *height as f64 - 1.0);
        let l1 = vec![
            Point::Xy([0.0, 0.0]),
            Point::Xy([w, 0.0]),
            Point::Xy([0.0, h]),
            Point::Xy([w, h]),
            Point::Xy([w / 2.0, h / 2.0]),
        ];
        let mut l2 = l1.clone();
        l2[4] = Point::Xy([w / 2.0 + 10.0, h / 2.0 - 5.0]);

        let mut engine = MorphEngine::new(&l1, &l2, TpsParameters::default()).unwrap();
        engine.prepare(*width, *height).unwrap();

        group.bench_function(BenchmarkId::new("frame", &parameter_string), |b| {
            b.iter(|| engine.frame(black_box(&image1), black_box(&image2), 0.5))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_morph);
criterion_main!(benches);
