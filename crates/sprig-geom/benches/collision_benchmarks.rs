//! Criterion benchmarks for the narrow-phase collision routines.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sprig_geom::prelude::*;

fn bench_rect_vs_rect(c: &mut Criterion) {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 3.0, 10.0, 10.0);
    c.bench_function("rect_vs_rect", |bench| {
        bench.iter(|| rect_vs_rect(black_box(&a), black_box(&b)))
    });
}

fn bench_circle_vs_circle(c: &mut Criterion) {
    let a = Circle::new(Vec2::new(0.0, 0.0), 4.0).unwrap();
    let b = Circle::new(Vec2::new(5.0, 1.0), 3.0).unwrap();
    c.bench_function("circle_vs_circle", |bench| {
        bench.iter(|| circle_vs_circle(black_box(&a), black_box(&b)))
    });
}

fn bench_polygon_vs_polygon(c: &mut Criterion) {
    let a = Circle::new(Vec2::ZERO, 5.0).unwrap().to_polygon(16).unwrap();
    let b = a.translated(Vec2::new(3.0, 2.0));
    let far = a.translated(Vec2::new(50.0, 0.0));

    let mut group = c.benchmark_group("polygon_vs_polygon");
    group.bench_function("overlapping_16gon", |bench| {
        bench.iter(|| polygon_vs_polygon(black_box(&a), black_box(&b)))
    });
    group.bench_function("separated_16gon", |bench| {
        bench.iter(|| polygon_vs_polygon(black_box(&a), black_box(&far)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rect_vs_rect,
    bench_circle_vs_circle,
    bench_polygon_vs_polygon
);
criterion_main!(benches);
