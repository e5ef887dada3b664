// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::{Affine3A, Quat, Vec3};
use reticle_handle::math::horn_fit;
use reticle_handle::{HandleOptions, HandleStore};
use reticle_pointer::{
    Button, CaptureRegistry, Intersector, Pointer, PointerOptions, RayOptions,
};
use reticle_scene::{EventKinds, Scene, SceneNode, Shape, Transform};

struct Rng(u64);
impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 32) as u32
    }
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() as f32) / (u32::MAX as f32)
    }
    fn point(&mut self) -> Vec3 {
        Vec3::new(self.next_f32(), self.next_f32(), self.next_f32()) * 2.0 - Vec3::ONE
    }
}

fn bench_horn_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("horn_fit");
    let rotation = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1);
    for &n in &[3usize, 10, 100] {
        let mut rng = Rng::new(0x5EED_0000 + n as u64);
        let from: Vec<Vec3> = (0..n).map(|_| rng.point()).collect();
        let to: Vec<Vec3> = from.iter().map(|p| rotation * *p).collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("points_{}", n), |b| {
            b.iter(|| black_box(horn_fit(black_box(&from), black_box(&to))));
        });
    }
    group.finish();
}

fn rig() -> (Scene, HandleStore, Pointer, CaptureRegistry) {
    let mut scene = Scene::new();
    let cube = scene.insert(
        None,
        SceneNode {
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
            shape: Some(Shape::cuboid(Vec3::ONE)),
            ..Default::default()
        },
    );
    scene.add_listener(cube, EventKinds::POINTER_DOWN);
    scene.commit();

    let mut store = HandleStore::new(HandleOptions {
        damping: 0.5,
        ..HandleOptions::default()
    });
    store.bind(&scene, cube);

    let mut captures = CaptureRegistry::new();
    let mut pointer = Pointer::new(
        Intersector::ray(RayOptions::default()),
        PointerOptions::default(),
    );
    let mut events = Vec::new();
    pointer.set_space(Some(Affine3A::IDENTITY));
    pointer.move_to(&scene, &mut captures, 0.0, &mut events);
    pointer.down(Button::Primary, &scene, &mut captures, 0.0, &mut events);
    for event in &events {
        store.on_event(event, &scene, &mut captures, &pointer);
    }
    (scene, store, pointer, captures)
}

fn bench_drag(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_drag");
    let frames = 120;
    group.throughput(Throughput::Elements(frames));
    group.bench_function("single_pointer_damped", |b| {
        b.iter_batched(
            rig,
            |(mut scene, mut store, mut pointer, mut captures)| {
                let mut events = Vec::with_capacity(8);
                for frame in 0..frames {
                    let time = frame as f64 / 60.0;
                    let yaw = Quat::from_rotation_y(frame as f32 * 0.002);
                    pointer.set_space(Some(Affine3A::from_rotation_translation(
                        yaw,
                        Vec3::new(frame as f32 * 0.001, 0.0, 0.0),
                    )));
                    pointer.move_to(&scene, &mut captures, time, &mut events);
                    events.clear();
                    black_box(store.update(time, &mut scene, &mut captures, &pointer));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_horn_fit, bench_drag);
criterion_main!(benches);
