// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! XR input sources driving combined pointers.
//!
//! A right-hand controller selects a far panel with its ray, while a tracked left hand
//! pokes a near button with its index fingertip. The hand then disconnects.
//!
//! Run:
//! - `cargo run -p reticle_demos --example xr_router`

use glam::{Affine3A, Vec3};
use reticle_pointer::{
    CaptureRegistry, Handedness, PointerEvent, XrInputEvent, XrInputKind, XrInputSource,
    XrPointerOptions, XrRouter,
};
use reticle_scene::{EventKinds, NodeId, Scene, SceneNode, Shape, Transform};

fn main() {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let mut scene = Scene::new();
    let panel = scene.insert(
        None,
        SceneNode {
            transform: Transform::from_translation(Vec3::new(0.5, 0.0, -3.0)),
            shape: Some(Shape::cuboid(Vec3::new(1.0, 1.0, 0.02))),
            ..Default::default()
        },
    );
    let button = scene.insert(
        None,
        SceneNode {
            transform: Transform::from_translation(Vec3::new(-0.3, 0.0, -0.4)),
            shape: Some(Shape::cuboid(Vec3::new(0.1, 0.1, 0.02))),
            ..Default::default()
        },
    );
    scene.add_listener(panel, EventKinds::all());
    scene.add_listener(button, EventKinds::all());
    scene.commit();

    let controller = |events: Vec<XrInputEvent>| XrInputSource {
        handle: 1,
        handedness: Handedness::Right,
        kind: XrInputKind::Controller { grip: None },
        target_ray: Some(Affine3A::from_translation(Vec3::new(0.5, 0.0, 0.0))),
        events,
    };
    let hand = |tip_z: f32| XrInputSource {
        handle: 2,
        handedness: Handedness::Left,
        kind: XrInputKind::Hand {
            index_tip: Some(Affine3A::from_translation(Vec3::new(-0.3, 0.0, tip_z))),
        },
        target_ray: None,
        events: Vec::new(),
    };

    let frames = [
        vec![controller(Vec::new()), hand(-0.25)],
        vec![controller(vec![XrInputEvent::SelectStart]), hand(-0.37)],
        vec![controller(vec![XrInputEvent::SelectEnd]), hand(-0.25)],
        vec![controller(Vec::new())],
    ];

    let mut router = XrRouter::new(XrPointerOptions::default());
    let mut captures = CaptureRegistry::new();
    let mut events = Vec::new();
    for (frame, sources) in frames.iter().enumerate() {
        let time = frame as f64 / 72.0;
        router.update(time, sources, &scene, &mut captures, &mut events);
        println!("frame {frame}:");
        for event in events.drain(..) {
            print_event(&event, panel);
        }
    }
    router.destroy(&scene, &mut captures, 1.0, &mut events);
    log::info!("destroyed router, {} closing events", events.len());
}

fn print_event(event: &PointerEvent, panel: NodeId) {
    let on = if event.target == panel { "panel" } else { "button" };
    println!(
        "  {:?} {:?} on {on} ({:?})",
        event.pointer_id, event.kind, event.pointer_type
    );
}
