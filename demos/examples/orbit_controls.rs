// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orbit, pan and pinch a virtual camera from screen input.
//!
//! A mouse left-drag orbits, a right-drag pans, the wheel zooms, and a two-finger
//! pinch dollies. The camera store logs every change it accepts.
//!
//! Run:
//! - `cargo run -p reticle_demos --example orbit_controls`

use kurbo::{Point, Size, Vec2};
use reticle_handle::screen::{CameraState, ControlOptions, ScreenCameraStore, ScreenControls};
use reticle_pointer::{Button, NativeDevice, NativeEvent, NativePointer};

fn main() {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let viewport = Size::new(800.0, 600.0);
    let mut camera = ScreenCameraStore::default();
    camera.subscribe(|state| {
        println!(
            "  yaw={:.3} pitch={:.3} distance={:.3} origin={:?}",
            state.yaw, state.pitch, state.distance, state.origin
        );
    });
    let mut controls = ScreenControls::new(ControlOptions::default());

    let mouse = |x: f64, y: f64| NativePointer {
        id: 0,
        device: NativeDevice::Mouse,
        position: Point::new(x, y),
    };
    let finger = |id: u32, x: f64| NativePointer {
        id,
        device: NativeDevice::Touch,
        position: Point::new(x, 300.0),
    };

    let script: Vec<(&str, Vec<NativeEvent>)> = vec![
        (
            "left drag",
            vec![
                NativeEvent::Down(mouse(400.0, 300.0), Button::Primary),
                NativeEvent::Move(mouse(450.0, 280.0)),
            ],
        ),
        ("release", vec![NativeEvent::Up(mouse(450.0, 280.0), Button::Primary)]),
        (
            "right drag",
            vec![
                NativeEvent::Down(mouse(400.0, 300.0), Button::Secondary),
                NativeEvent::Move(mouse(380.0, 300.0)),
            ],
        ),
        ("release", vec![NativeEvent::Up(mouse(380.0, 300.0), Button::Secondary)]),
        ("wheel", vec![NativeEvent::Wheel(mouse(400.0, 300.0), Vec2::new(0.0, 240.0))]),
        (
            "pinch",
            vec![
                NativeEvent::Down(finger(1, 300.0), Button::Primary),
                NativeEvent::Down(finger(2, 500.0), Button::Primary),
            ],
        ),
        (
            "spread",
            vec![
                NativeEvent::Move(finger(1, 200.0)),
                NativeEvent::Move(finger(2, 600.0)),
            ],
        ),
        (
            "lift",
            vec![
                NativeEvent::Up(finger(1, 200.0), Button::Primary),
                NativeEvent::Up(finger(2, 600.0), Button::Primary),
            ],
        ),
    ];

    for (label, events) in &script {
        println!("{label}:");
        for event in events {
            controls.handle(event);
        }
        for (kind, frame) in controls.update(&mut camera, viewport) {
            log::debug!("{kind:?} frame {frame:?}");
        }
    }

    let final_state: CameraState = *camera.state();
    log::info!("camera ends at {:?}", final_state.position());
}
