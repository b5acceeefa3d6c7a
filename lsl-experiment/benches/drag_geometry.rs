use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use lsl_core::{Point, Rect};
use lsl_experiment::{
    LayoutConfig, Viewport, ViewportGeometry, arrange_buckets, find_drop_bucket, radial_layout,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Radial layout for the bucket counts the sessions actually use.
pub fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("radial_layout");
    group
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));

    for count in [1usize, 2, 4, 12] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
            b.iter(|| radial_layout(black_box(Point::new(640.0, 280.0)), 240.0, n, 45.0));
        });
    }
    group.finish();
}

/// Release-time hit test against four buckets, hitting and missing.
pub fn bench_hit_test(c: &mut Criterion) {
    let geometry =
        ViewportGeometry::compute(Viewport::new(1440.0, 900.0), &LayoutConfig::default())
            .expect("geometry");
    let mut rng = StdRng::seed_from_u64(1);
    let arrangement = arrange_buckets(&geometry, 4, 45.0, true, &mut rng).expect("arrangement");
    let buckets = arrangement.bucket_rects();

    let last = buckets[3];
    let hit = Rect::centered_square(last.center().offset_by(8.0, 8.0), geometry.draggable_size);
    let miss = geometry.home_rect();

    let mut group = c.benchmark_group("find_drop_bucket");
    group.bench_function("last_bucket", |b| {
        b.iter(|| find_drop_bucket(black_box(&hit), buckets.iter().copied()));
    });
    group.bench_function("no_bucket", |b| {
        b.iter(|| find_drop_bucket(black_box(&miss), buckets.iter().copied()));
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .confidence_level(0.95)
        .noise_threshold(0.02)
        .significance_level(0.05);
    targets = bench_layout, bench_hit_test
}

criterion_main!(benches);
