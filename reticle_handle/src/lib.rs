// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reticle Handle: manipulation handles and screen camera controls.
//!
//! ## Overview
//!
//! A [`HandleStore`] turns the pointers captured to one scene node into translate,
//! rotate and scale updates of that node. With one pointer the node follows the
//! pointer's intersection point and rotation; with two or more (and `multitouch`) it
//! follows their centroid, their pair vector or a least-squares rigid fit, and scales
//! with their spread. Per-axis locks, limits and damping are applied last.
//!
//! The [`screen`] controls run the same pipeline against a virtual camera target
//! (orbit, pan, zoom, map), fed by native screen events.
//!
//! Call router updates first, then [`HandleStore::update`], once per frame.
//!
//! ## Example
//!
//! ```
//! use glam::{Affine3A, Vec3};
//! use reticle_handle::{HandleOptions, HandleStore};
//! use reticle_pointer::{Button, CaptureRegistry, Intersector, Pointer, PointerOptions, RayOptions};
//! use reticle_scene::{EventKinds, Scene, SceneNode, Shape, Transform};
//!
//! let mut scene = Scene::new();
//! let cube = scene.insert(
//!     None,
//!     SceneNode {
//!         transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
//!         shape: Some(Shape::cuboid(Vec3::splat(0.5))),
//!         ..Default::default()
//!     },
//! );
//! scene.add_listener(cube, EventKinds::POINTER_DOWN);
//! scene.commit();
//!
//! let mut store = HandleStore::new(HandleOptions::default());
//! store.bind(&scene, cube);
//!
//! let mut captures = CaptureRegistry::new();
//! let mut pointer = Pointer::new(Intersector::ray(RayOptions::default()), PointerOptions::default());
//! let mut events = Vec::new();
//! pointer.set_space(Some(Affine3A::IDENTITY));
//! pointer.move_to(&scene, &mut captures, 0.0, &mut events);
//! pointer.down(Button::Primary, &scene, &mut captures, 0.0, &mut events);
//! for event in events.drain(..) {
//!     store.on_event(&event, &scene, &mut captures, &pointer);
//! }
//! let first = store.update(0.0, &mut scene, &mut captures, &pointer).unwrap();
//! assert!(first.first);
//!
//! // Drag the controller 0.25 to the right: the cube follows.
//! pointer.set_space(Some(Affine3A::from_translation(Vec3::new(0.25, 0.0, 0.0))));
//! pointer.move_to(&scene, &mut captures, 0.1, &mut events);
//! let state = store.update(0.1, &mut scene, &mut captures, &pointer).unwrap();
//! assert!((state.current.translation.x - 0.25).abs() < 1e-5);
//! ```

pub mod gesture;
pub mod math;
mod manipulation;
mod options;
pub mod screen;
mod store;
mod target;

pub use options::{AxisFlags, AxisOptions, HandleOptions};
pub use store::{HandlePointer, HandleState, HandleStore, Subscription};
pub use target::HandleTarget;
