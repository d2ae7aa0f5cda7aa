use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};

use chroma_assay::calibration::{DataPoint, RegressionEngine};
use chroma_assay::color::{ciede2000, CieLab, MeanRgb};
use chroma_assay::{ColorConverter, MetricCatalog, MetricEvaluator, RegionSample, RegionSampler, RegionShape};

fn make_plate() -> RgbaImage {
    RgbaImage::from_fn(640, 480, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

fn make_regions(count: u32) -> Vec<RegionSample> {
    (0..count)
        .map(|i| {
            RegionSample::new(
                i,
                RegionShape::Circle {
                    x: f64::from(i % 8) * 70.0,
                    y: f64::from(i / 8) * 70.0,
                    radius: 30.0,
                },
            )
        })
        .collect()
}

fn bench_sampling(c: &mut Criterion) {
    let plate = make_plate();
    let sampler = RegionSampler::new();
    let shape = RegionShape::Circle { x: 100.0, y: 100.0, radius: 40.0 };
    c.bench_function("sample_circle_r40", |b| {
        b.iter(|| black_box(sampler.sample_color(black_box(&plate), black_box(&shape))))
    });
}

fn bench_conversion(c: &mut Criterion) {
    let converter = ColorConverter::new();
    let rgb = MeanRgb::new(182.4, 97.1, 43.8);
    c.bench_function("convert_all_spaces", |b| {
        b.iter(|| black_box(converter.convert_all(black_box(&rgb))))
    });
}

fn bench_ciede2000(c: &mut Criterion) {
    let reference = CieLab { l: 50.0, a: 2.6772, b: -79.7751 };
    let sample = CieLab { l: 50.0, a: 0.0, b: -82.7485 };
    c.bench_function("ciede2000", |b| {
        b.iter(|| black_box(ciede2000(black_box(&reference), black_box(&sample))))
    });
}

fn bench_evaluate_batch(c: &mut Criterion) {
    let plate = make_plate();
    let catalog = MetricCatalog::default_catalog().expect("embedded catalog is valid");
    let evaluator = MetricEvaluator::new(&catalog);
    let sampler = RegionSampler::new();
    let mut regions = make_regions(48);
    for region in regions.iter_mut() {
        sampler.process_region(&plate, region);
    }

    c.bench_function("evaluate_batch_48_regions", |b| {
        b.iter(|| {
            let mut batch = regions.clone();
            black_box(evaluator.evaluate_batch(&mut batch, Some(0)))
        })
    });
}

fn bench_regression(c: &mut Criterion) {
    let engine = RegressionEngine::default();
    let points: Vec<DataPoint> = (0..12)
        .map(|i| {
            let x = f64::from(i) * 0.25;
            DataPoint::new(x, 0.8 * x * x - 3.0 * x + 200.0 + (f64::from(i) * 1.7).sin())
        })
        .collect();
    c.bench_function("fit_linear_and_quadratic_12pts", |b| {
        b.iter(|| {
            let linear = engine.fit_linear(black_box(&points));
            let quadratic = engine.fit_quadratic(black_box(&points));
            black_box((linear, quadratic))
        })
    });
}

criterion_group!(
    metrics,
    bench_sampling,
    bench_conversion,
    bench_ciede2000,
    bench_evaluate_batch,
    bench_regression
);
criterion_main!(metrics);
