// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover, press and click on a small panel of buttons.
//!
//! A ray pointer sweeps across three buttons, clicks the middle one and moves away.
//! Every synthetic event is dispatched through capture → target → bubble.
//!
//! Run:
//! - `cargo run -p reticle_demos --example pointer_basics`

use glam::{Affine3A, Quat, Vec3};
use reticle_pointer::{
    Button, CaptureRegistry, Intersector, Listeners, Outcome, Pointer, PointerOptions,
    RayOptions,
};
use reticle_scene::{EventKinds, Scene, SceneNode, Shape, Transform};

fn main() {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let mut scene = Scene::new();
    let panel = scene.insert(
        None,
        SceneNode {
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
            ..Default::default()
        },
    );
    let mut listeners = Listeners::new();
    listeners.add_capture(&mut scene, panel, EventKinds::CLICK, |event, ctx| {
        println!("  panel saw {:?} in {:?}", event.kind, ctx.phase());
        Outcome::Continue
    });

    for (i, x) in [-0.3_f32, 0.0, 0.3].into_iter().enumerate() {
        let button = scene.insert(
            Some(panel),
            SceneNode {
                transform: Transform::from_translation(Vec3::new(x, 0.0, 0.0)),
                shape: Some(Shape::cuboid(Vec3::new(0.2, 0.1, 0.05))),
                ..Default::default()
            },
        );
        listeners.add(
            &mut scene,
            button,
            EventKinds::POINTER_ENTER | EventKinds::POINTER_LEAVE | EventKinds::CLICK,
            move |event, _| {
                println!("  button {i}: {:?}", event.kind);
                Outcome::Continue
            },
        );
    }
    scene.commit();

    let mut captures = CaptureRegistry::new();
    let mut pointer = Pointer::new(
        Intersector::ray(RayOptions::default()),
        PointerOptions::default(),
    );
    let mut events = Vec::new();

    let aim = |x: f32| {
        let dir = Vec3::new(x, 0.0, -2.0).normalize();
        Some(Affine3A::from_quat(Quat::from_rotation_arc(Vec3::NEG_Z, dir)))
    };

    let mut time = 0.0;
    for x in [-0.3_f32, 0.0] {
        println!("aim at x = {x}");
        pointer.set_space(aim(x));
        pointer.move_to(&scene, &mut captures, time, &mut events);
        time += 0.1;
    }
    println!("press");
    pointer.down(Button::Primary, &scene, &mut captures, time, &mut events);
    pointer.up(Button::Primary, &scene, &mut captures, time + 0.1, &mut events);
    println!("aim away");
    pointer.set_space(aim(2.0));
    pointer.move_to(&scene, &mut captures, time + 0.2, &mut events);

    for event in &events {
        let result = listeners.dispatch(&scene, &mut captures, event);
        log::debug!("{:?} on {:?}: {} listener(s)", event.kind, event.target, result.delivered);
    }
}
