// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between a handle and whatever holds the transforms it drives.
//!
//! ```
//! use glam::{Affine3A, Vec3};
//! use reticle_handle::HandleTarget;
//! use reticle_scene::{NodeId, Scene, SceneNode, Transform};
//!
//! // Records every write before passing it on, as an undo stack would.
//! struct Recorded<'a> {
//!     scene: &'a mut Scene,
//!     writes: Vec<(NodeId, Transform)>,
//! }
//!
//! impl HandleTarget for Recorded<'_> {
//!     fn is_alive(&self, node: NodeId) -> bool {
//!         self.scene.is_alive(node)
//!     }
//!     fn transform(&self, node: NodeId) -> Option<Transform> {
//!         self.scene.transform(node)
//!     }
//!     fn parent_world_transform(&self, node: NodeId) -> Option<Affine3A> {
//!         self.scene.parent_world_transform(node)
//!     }
//!     fn apply(&mut self, node: NodeId, transform: Transform) {
//!         self.writes.push((node, transform));
//!         self.scene.set_transform(node, transform);
//!     }
//! }
//!
//! let mut scene = Scene::new();
//! let node = scene.insert(None, SceneNode::default());
//! let mut target = Recorded { scene: &mut scene, writes: Vec::new() };
//! target.apply(node, Transform::from_translation(Vec3::X));
//! assert_eq!(target.writes.len(), 1);
//! assert_eq!(scene.transform(node), Some(Transform::from_translation(Vec3::X)));
//! ```

use glam::Affine3A;
use reticle_scene::{NodeId, Scene, Transform};

/// Where a handle reads and writes the transform of its target.
///
/// [`Scene`] implements it directly; wrap a scene to intercept writes (for
/// networking or undo) before they land.
pub trait HandleTarget {
    /// Returns true if `node` still exists.
    fn is_alive(&self, node: NodeId) -> bool;

    /// Local transform of `node`.
    fn transform(&self, node: NodeId) -> Option<Transform>;

    /// World transform of the parent of `node` (identity for roots).
    fn parent_world_transform(&self, node: NodeId) -> Option<Affine3A>;

    /// Write the local transform of `node`.
    fn apply(&mut self, node: NodeId, transform: Transform);
}

impl HandleTarget for Scene {
    fn is_alive(&self, node: NodeId) -> bool {
        Self::is_alive(self, node)
    }

    fn transform(&self, node: NodeId) -> Option<Transform> {
        Self::transform(self, node)
    }

    fn parent_world_transform(&self, node: NodeId) -> Option<Affine3A> {
        Self::parent_world_transform(self, node)
    }

    fn apply(&mut self, node: NodeId, transform: Transform) {
        self.set_transform(node, transform);
    }
}
