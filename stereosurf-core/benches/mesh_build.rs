/// Benchmarks for surface regeneration and per-frame stereo math.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Matrix4;
use stereosurf_core::{build_mesh, ShapeParameters, StereoCamera, Transform};

fn bench_surface_mesh(c: &mut Criterion) {
    c.bench_function("build_mesh_default", |b| {
        let params = ShapeParameters::default();
        b.iter(|| build_mesh(black_box(params)))
    });

    c.bench_function("build_mesh_twisted", |b| {
        let params = ShapeParameters::new(1.4, 0.6, 0.3, 0.9);
        b.iter(|| build_mesh(black_box(params)))
    });
}

fn bench_stereo_frame(c: &mut Criterion) {
    c.bench_function("stereo_eye_transforms", |b| {
        let camera = StereoCamera::default();
        let base = Transform::base_model_view(&Matrix4::identity());
        b.iter(|| {
            let left = black_box(&camera).apply_left_frustum().combined(&base);
            let right = black_box(&camera).apply_right_frustum().combined(&base);
            (left, right)
        })
    });
}

criterion_group!(benches, bench_surface_mesh, bench_stereo_frame);
criterion_main!(benches);
