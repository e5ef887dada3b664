// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reticle Scene: a glam-native 3D scene graph for pointer interaction.
//!
//! ## Overview
//!
//! The scene is the collaborator the pointer and handle crates run against.
//! It owns the node hierarchy and nothing else: no rendering, no assets, no physics.
//!
//! - Represents a hierarchy of nodes with local transforms, optional collision shapes and flags.
//! - Carries the pointer policy attributes ([`PointerEvents`], [`PointerEventsType`],
//!   `pointer_events_order`, [`NodeFlags::VOID`]) and resolves their inheritance.
//! - Records which nodes have listeners, since listening decides whether a hit node is a target.
//! - Caches world transforms, refreshed by [`Scene::commit`].
//!
//! ## Ownership
//!
//! Every node has exactly one parent (or is a root). [`Scene::reparent`] transfers it;
//! a node is never aliased under two parents. [`NodeId`]s are generational, so a handle
//! to a removed node stays stale even after its slot is reused.
//!
//! ## API overview
//!
//! - [`Scene`]: container managing nodes, listeners and world transforms.
//! - [`SceneNode`]: per-node local data.
//! - [`Shape`]: sphere or cuboid in local space, with ray and proximity queries.
//! - [`PointerPolicy`]: effective, inherited pointer attributes of a node.
//!
//! ### Minimal usage
//!
//! ```
//! use glam::Vec3;
//! use reticle_scene::{EventKinds, PointerType, Scene, SceneNode, Shape, Transform};
//!
//! let mut scene = Scene::new();
//! let panel = scene.insert(
//!     None,
//!     SceneNode {
//!         transform: Transform::from_translation(Vec3::new(0.0, 1.5, -2.0)),
//!         ..Default::default()
//!     },
//! );
//! let button = scene.insert(
//!     Some(panel),
//!     SceneNode {
//!         shape: Some(Shape::cuboid(Vec3::new(0.2, 0.1, 0.02))),
//!         ..Default::default()
//!     },
//! );
//! scene.add_listener(button, EventKinds::CLICK);
//! scene.commit();
//!
//! let world = scene.world_transform(button).unwrap();
//! assert_eq!(world.translation, Vec3::new(0.0, 1.5, -2.0).into());
//! assert!(scene.policy_of(button).unwrap().candidacy(PointerType::Ray).is_some());
//! assert_eq!(scene.path_to_root(button), vec![panel, button]);
//! ```

mod error;
mod scene;
mod shape;
mod types;

pub use error::SceneError;
pub use scene::{ListenerToken, Scene};
pub use shape::{LocalHit, Shape};
pub use types::{
    Candidacy, EventKinds, NodeFlags, NodeId, PointerEvents, PointerEventsType, PointerPolicy,
    PointerType, PointerTypes, SceneNode, Transform,
};

pub use glam;
