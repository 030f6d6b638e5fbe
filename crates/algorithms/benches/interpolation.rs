//! Benchmarks for grid construction and IDW interpolation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nitrogis_algorithms::interpolation::{idw, IdwParams, RegularGrid, SamplePoint};
use nitrogis_algorithms::vector::BoundingBox;

fn bbox() -> BoundingBox {
    BoundingBox::new(-92.9, 42.5, -86.8, 47.1)
}

/// Deterministic scatter of wells over the box
fn create_wells(n: usize) -> Vec<SamplePoint> {
    let bb = bbox();
    (0..n)
        .map(|i| {
            let fx = ((i * 7919) % 1000) as f64 / 1000.0;
            let fy = ((i * 104_729) % 1000) as f64 / 1000.0;
            let value = ((i * 31) % 150) as f64 / 10.0;
            SamplePoint::new(bb.min_x + fx * bb.width(), bb.min_y + fy * bb.height(), value)
        })
        .collect()
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");

    for cell in [0.1, 0.05, 0.02].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(cell), cell, |b, &cell| {
            b.iter(|| RegularGrid::new(black_box(bbox()), cell).iter().count())
        });
    }

    group.finish();
}

fn bench_idw(c: &mut Criterion) {
    let mut group = c.benchmark_group("idw");
    group.sample_size(20);
    let grid = RegularGrid::new(bbox(), 0.05);

    for n in [250, 1000, 4000].iter() {
        let wells = create_wells(*n);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| idw(black_box(&wells), &grid, &IdwParams::default()).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grid, bench_idw);
criterion_main!(benches);
