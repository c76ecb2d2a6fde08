use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use glam::{DVec2, DVec3};
use mapcam::animation::FlightPath;
use mapcam::camera::{Camera, Constraints, Pose, Transform, UpAxis, Viewport};

fn transform() -> Transform {
    let mut t = Transform::new(
        Camera::perspective(36.87, 800.0 / 600.0, 0.1, 1000.0),
        Viewport::new(800.0, 600.0),
        UpAxis::Y,
        Constraints::default(),
    );
    t.set_pose(&Pose {
        center: DVec3::new(12.0, 0.0, -7.0),
        zoom: 4.0,
        bearing: 30.0,
        pitch: 45.0,
        ..Pose::default()
    });
    t
}

fn flight_path_benchmark(c: &mut Criterion) {
    c.bench_function("flight_path_new", |b| {
        b.iter(|| black_box(FlightPath::new(black_box(800.0), 12.5, 3200.0, 1.42)));
    });

    let path = FlightPath::new(800.0, 12.5, 3200.0, 1.42);
    let s = path.arc_length() * 0.5;
    c.bench_function("flight_path_sample", |b| {
        b.iter(|| {
            let s = black_box(s);
            black_box((path.progress(s), path.zoom_delta(s)))
        });
    });
}

fn projection_benchmark(c: &mut Criterion) {
    let t = transform();
    let mut group = c.benchmark_group("transform");
    let _ = group.bench_function("screen_to_world", |b| {
        b.iter(|| black_box(t.screen_to_world(black_box(DVec2::new(250.0, 410.0)))));
    });
    let _ = group.bench_function("world_to_screen", |b| {
        b.iter(|| black_box(t.world_to_screen(black_box(DVec3::new(14.0, 0.0, -3.0)))));
    });
    group.finish();
}

fn pose_update_benchmark(c: &mut Criterion) {
    let mut t = transform();
    let mut bearing = 0.0;
    c.bench_function("transform_set_bearing", |b| {
        b.iter(|| {
            bearing = (bearing + 1.0) % 360.0;
            t.set_bearing(black_box(bearing));
        });
    });
}

criterion_group!(
    benches,
    flight_path_benchmark,
    projection_benchmark,
    pose_update_benchmark
);
criterion_main!(benches);
