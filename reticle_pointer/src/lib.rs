// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reticle Pointer: synthetic pointer events for 3D scenes.
//!
//! ## Overview
//!
//! This crate turns device poses into DOM-style pointer events on a
//! [`reticle_scene::Scene`]. It does not own the scene, the input devices or any
//! rendering; callers feed poses and button transitions in, and get an ordered list of
//! [`PointerEvent`]s out, ready to be dispatched to listeners.
//!
//! - [`intersector`]: ray, line, touch and grab hit testing with a total ranking
//!   (`pointer_events_order` first, then distance).
//! - [`pointer`]: one logical input: hover transitions, buttons, clicks, capture redirection.
//! - [`capture`]: the pointer → target capture registry.
//! - [`hover`]: over/out/enter/leave transitions between hovered paths.
//! - [`dispatch`]: capture → target → bubble propagation and listener execution.
//! - [`combined`]: arbitration between the pointers of one device.
//! - [`forward`] and [`xr`]: routers from native screen events and XR input sources.
//!
//! Routers run once per frame, before any handle update, and share one
//! [`CaptureRegistry`] passed by `&mut`.
//!
//! ## Example
//!
//! ```
//! use glam::{Affine3A, Vec3};
//! use reticle_pointer::{
//!     CaptureRegistry, Intersector, Listeners, Outcome, Pointer, PointerEventKind,
//!     PointerOptions, RayOptions,
//! };
//! use reticle_scene::{EventKinds, Scene, SceneNode, Shape, Transform};
//!
//! let mut scene = Scene::new();
//! let button = scene.insert(
//!     None,
//!     SceneNode {
//!         transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
//!         shape: Some(Shape::cuboid(Vec3::new(0.4, 0.2, 0.05))),
//!         ..Default::default()
//!     },
//! );
//! let mut listeners = Listeners::new();
//! listeners.add(&mut scene, button, EventKinds::CLICK, |_, _| Outcome::Continue);
//! scene.commit();
//!
//! let mut captures = CaptureRegistry::new();
//! let mut pointer = Pointer::new(Intersector::ray(RayOptions::default()), PointerOptions::default());
//! pointer.set_space(Some(Affine3A::IDENTITY));
//!
//! let mut events = Vec::new();
//! pointer.move_to(&scene, &mut captures, 0.0, &mut events);
//! pointer.down(reticle_pointer::Button::Primary, &scene, &mut captures, 0.1, &mut events);
//! pointer.up(reticle_pointer::Button::Primary, &scene, &mut captures, 0.2, &mut events);
//!
//! let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
//! assert_eq!(kinds.last(), Some(&PointerEventKind::Click));
//! let delivered: usize = events
//!     .iter()
//!     .map(|e| listeners.dispatch(&scene, &mut captures, e).delivered)
//!     .sum();
//! assert_eq!(delivered, 1);
//! ```

pub mod capture;
pub mod combined;
pub mod dispatch;
pub mod forward;
pub mod hover;
pub mod intersector;
mod lookup;
pub mod pointer;
pub mod types;
pub mod xr;

pub use capture::CaptureRegistry;
pub use combined::CombinedPointer;
pub use dispatch::{Dispatched, EventContext, Listeners, Outcome, Phase};
pub use forward::{
    ForwardOptions, ForwardedRouter, NativeDevice, NativeEvent, NativePointer, ScreenCamera,
};
pub use intersector::{
    HitRank, Intersector, IntersectorKind, LineOptions, RayOptions, SphereOptions,
};
pub use lookup::PointerLookup;
pub use pointer::{Pointer, PointerOptions, PointerSample};
pub use types::{
    Button, Buttons, Intersection, IntersectionDetails, PointerEvent, PointerEventKind, PointerId,
};
pub use xr::{Handedness, XrInputEvent, XrInputKind, XrInputSource, XrPointerOptions, XrRouter};
