// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag a cube with a damped, Y-locked handle.
//!
//! A ray pointer grabs the cube, sweeps to the right and up, then lets go. The handle
//! follows the sweep in x only and keeps settling for a few frames after release.
//!
//! Run:
//! - `cargo run -p reticle_demos --example handle_drag`

use glam::{Affine3A, Vec3};
use reticle_handle::{AxisFlags, AxisOptions, HandleOptions, HandleStore};
use reticle_pointer::{
    Button, CaptureRegistry, Intersector, Pointer, PointerEvent, PointerOptions, RayOptions,
};
use reticle_scene::{EventKinds, Scene, SceneNode, Shape, Transform};

fn main() {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let mut scene = Scene::new();
    let cube = scene.insert(
        None,
        SceneNode {
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
            shape: Some(Shape::cuboid(Vec3::splat(0.5))),
            ..Default::default()
        },
    );
    scene.add_listener(cube, EventKinds::POINTER_DOWN);
    scene.commit();

    let mut store = HandleStore::new(HandleOptions {
        translate: AxisOptions::only(AxisFlags::X | AxisFlags::Z).with_limit(0, -1.0, 1.0),
        damping: 0.6,
        ..HandleOptions::default()
    });
    store.bind(&scene, cube);
    store.subscribe_apply(|state| {
        if state.first || state.last {
            println!("  first={} last={}", state.first, state.last);
        }
    });

    let mut captures = CaptureRegistry::new();
    let mut pointer = Pointer::new(
        Intersector::ray(RayOptions::default()),
        PointerOptions::default(),
    );
    let mut events = Vec::new();

    pointer.set_space(Some(Affine3A::IDENTITY));
    pointer.move_to(&scene, &mut captures, 0.0, &mut events);
    pointer.down(Button::Primary, &scene, &mut captures, 0.0, &mut events);
    frame(&pointer, &mut store, &mut scene, &mut captures, &mut events, 0.0);

    for step in 1..=10_i32 {
        let time = f64::from(step) / 30.0;
        let offset = step as f32 * 0.05;
        pointer.set_space(Some(Affine3A::from_translation(Vec3::new(offset, offset, 0.0))));
        pointer.move_to(&scene, &mut captures, time, &mut events);
        frame(&pointer, &mut store, &mut scene, &mut captures, &mut events, time);
    }

    pointer.up(Button::Primary, &scene, &mut captures, 0.4, &mut events);
    let mut time = 0.4;
    for _ in 0..60 {
        frame(&pointer, &mut store, &mut scene, &mut captures, &mut events, time);
        if !store.is_active() {
            break;
        }
        time += 1.0 / 30.0;
    }
    log::info!("released, cube at {:?}", scene.local(cube).map(|n| n.transform.translation));
}

// One frame: forward this frame's events to the handle, then update it.
fn frame(
    pointer: &Pointer,
    store: &mut HandleStore,
    scene: &mut Scene,
    captures: &mut CaptureRegistry,
    events: &mut Vec<PointerEvent>,
    time: f64,
) {
    for event in events.drain(..) {
        store.on_event(&event, scene, captures, pointer);
    }
    if let Some(state) = store.update(time, scene, captures, pointer) {
        let t = state.current.translation;
        println!("t={time:.2} x={:.3} y={:.3} z={:.3}", t.x, t.y, t.z);
    }
}
