// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::{Affine3A, Quat, Vec3};
use reticle_pointer::{
    CaptureRegistry, Intersector, Pointer, PointerOptions, RayOptions, SphereOptions,
};
use reticle_scene::{EventKinds, Scene, SceneNode, Shape, Transform};

// An n×n wall of listening cubes one unit apart, grouped in rows, at z = -5.
fn gen_wall(n: usize) -> Scene {
    let mut scene = Scene::new();
    for y in 0..n {
        let row = scene.insert(
            None,
            SceneNode {
                transform: Transform::from_translation(Vec3::new(0.0, y as f32, -5.0)),
                ..Default::default()
            },
        );
        scene.add_listener(row, EventKinds::all());
        for x in 0..n {
            let shape = if (x + y) % 2 == 0 {
                Shape::cuboid(Vec3::splat(0.8))
            } else {
                Shape::sphere(0.4)
            };
            scene.insert(
                Some(row),
                SceneNode {
                    transform: Transform::from_translation(Vec3::new(x as f32, 0.0, 0.0)),
                    shape: Some(shape),
                    ..Default::default()
                },
            );
        }
    }
    scene.commit();
    scene
}

fn aim_at_center(n: usize) -> Affine3A {
    let center = Vec3::new(n as f32 * 0.5, n as f32 * 0.5, -5.0);
    let origin = Vec3::new(0.0, 0.0, 2.0);
    Affine3A::from_rotation_translation(
        Quat::from_rotation_arc(Vec3::NEG_Z, (center - origin).normalize()),
        origin,
    )
}

fn bench_cast(c: &mut Criterion) {
    let mut group = c.benchmark_group("cast");
    for &n in &[16usize, 32, 64] {
        let scene = gen_wall(n);
        group.throughput(Throughput::Elements((n * n) as u64));

        let mut ray = Pointer::new(
            Intersector::ray(RayOptions::default()),
            PointerOptions::default(),
        );
        ray.set_space(Some(aim_at_center(n)));
        group.bench_function(format!("ray_n{}", n), |b| {
            b.iter(|| black_box(ray.cast(&scene)));
        });

        let mut grab = Pointer::new(
            Intersector::grab(SphereOptions { radius: 0.07 }),
            PointerOptions::default(),
        );
        grab.set_space(Some(Affine3A::from_translation(Vec3::new(
            n as f32 * 0.5,
            n as f32 * 0.5,
            -4.55,
        ))));
        group.bench_function(format!("grab_n{}", n), |b| {
            b.iter(|| black_box(grab.cast(&scene)));
        });
    }
    group.finish();
}

fn bench_move_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_events");
    let n = 32;
    let scene = gen_wall(n);
    let base = aim_at_center(n);
    group.bench_function("sweep_n32", |b| {
        b.iter_batched(
            || {
                let pointer = Pointer::new(
                    Intersector::ray(RayOptions::default()),
                    PointerOptions::default(),
                );
                (pointer, CaptureRegistry::new(), Vec::with_capacity(256))
            },
            |(mut pointer, mut captures, mut out)| {
                for step in 0..64_i32 {
                    let yaw = Quat::from_rotation_y((step as f32 - 32.0) * 0.01);
                    pointer.set_space(Some(base * Affine3A::from_quat(yaw)));
                    pointer.move_to(&scene, &mut captures, f64::from(step) / 60.0, &mut out);
                }
                black_box(out.len());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_cast, bench_move_events);
criterion_main!(benches);
