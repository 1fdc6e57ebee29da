use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridmdp::{GridWorldConfig, Point};

fn bench_classic_world(c: &mut Criterion) {
    c.bench_function("value_iteration_3x4_100", |b| {
        b.iter(|| {
            GridWorldConfig::default()
                .with_iterations(black_box(100))
                .solve()
                .unwrap()
        })
    });
}

fn bench_grid_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_iteration_square");
    for size in [8usize, 16, 32] {
        let last = size as i32 - 1;
        let config = GridWorldConfig::new(size, size, Point::new(0, last), Point::new(1, last))
            .with_obstacle(Point::new(1, 1))
            .with_iterations(50);
        group.bench_with_input(BenchmarkId::from_parameter(size), &config, |b, config| {
            b.iter(|| config.solve().unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classic_world, bench_grid_sizes);
criterion_main!(benches);
