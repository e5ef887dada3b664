// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer capture registry.
//!
//! ## Overview
//!
//! A capture binds every later `pointermove`/`pointerup`/`wheel`/`pointercancel`
//! of one pointer to a fixed target, regardless of hit testing, until it is
//! released. Each pointer has at most one capture target; capturing again
//! replaces the previous entry.
//!
//! Targets are held as generational [`NodeId`]s, so a removed node can never be
//! confused with a node that reuses its slot. Lookups through
//! [`CaptureRegistry::captured`] drop entries whose target is gone, and
//! [`CaptureRegistry::prune`] sweeps all of them at once.

use std::collections::BTreeMap;

use reticle_scene::{NodeId, PointerType, Scene};

use crate::types::PointerId;

/// Which node, if any, owns each pointer.
#[derive(Clone, Debug, Default)]
pub struct CaptureRegistry {
    entries: BTreeMap<PointerId, NodeId>,
}

impl CaptureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `pointer` to `target`, releasing any previous capture of that pointer.
    ///
    /// Rejected (returns false, previous capture kept) when `target` is not alive or
    /// its effective `pointer_events_type` does not accept `pointer_type`.
    pub fn capture(
        &mut self,
        scene: &Scene,
        pointer: PointerId,
        pointer_type: PointerType,
        target: NodeId,
    ) -> bool {
        let Some(policy) = scene.policy_of(target) else {
            log::warn!("capture of {pointer:?} rejected: {target:?} is not alive");
            return false;
        };
        if !policy.pointer_events_type.accepts(pointer_type) {
            log::warn!("capture of {pointer:?} rejected: {target:?} denies {pointer_type:?}");
            return false;
        }
        if let Some(previous) = self.entries.insert(pointer, target)
            && previous != target
        {
            log::debug!("{pointer:?} capture moved {previous:?} -> {target:?}");
        } else {
            log::debug!("{pointer:?} captured by {target:?}");
        }
        true
    }

    /// Release the capture of `pointer`. Idempotent.
    pub fn release(&mut self, pointer: PointerId) -> Option<NodeId> {
        let released = self.entries.remove(&pointer);
        if let Some(target) = released {
            log::debug!("{pointer:?} released from {target:?}");
        }
        released
    }

    /// Release the capture of `pointer` only if it is held by `target`.
    pub fn release_if(&mut self, pointer: PointerId, target: NodeId) -> bool {
        if self.entries.get(&pointer) == Some(&target) {
            self.release(pointer);
            true
        } else {
            false
        }
    }

    /// Capture target of `pointer`, without liveness checks.
    pub fn get(&self, pointer: PointerId) -> Option<NodeId> {
        self.entries.get(&pointer).copied()
    }

    /// Capture target of `pointer`, releasing the entry if the target was removed.
    pub fn captured(&mut self, scene: &Scene, pointer: PointerId) -> Option<NodeId> {
        let target = self.get(pointer)?;
        if scene.is_alive(target) {
            Some(target)
        } else {
            log::debug!("{pointer:?} capture dropped: {target:?} was removed");
            self.entries.remove(&pointer);
            None
        }
    }

    /// Pointers currently captured by `target`.
    pub fn pointers_captured_by(&self, target: NodeId) -> impl Iterator<Item = PointerId> + '_ {
        self.entries
            .iter()
            .filter(move |(_, t)| **t == target)
            .map(|(p, _)| *p)
    }

    /// Release every entry whose target is no longer alive. Returns the released pairs.
    pub fn prune(&mut self, scene: &Scene) -> Vec<(PointerId, NodeId)> {
        let dead: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, t)| !scene.is_alive(**t))
            .map(|(p, t)| (*p, *t))
            .collect();
        for (pointer, _) in &dead {
            self.entries.remove(pointer);
        }
        dead
    }

    /// Number of active captures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no pointer is captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reticle_scene::{PointerEventsType, PointerTypes, SceneNode};

    fn two_nodes() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let a = scene.insert(None, SceneNode::default());
        let b = scene.insert(None, SceneNode::default());
        (scene, a, b)
    }

    #[test]
    fn capture_replaces_previous_target() {
        let (scene, a, b) = two_nodes();
        let p = PointerId::from_raw(1);
        let mut reg = CaptureRegistry::new();
        assert!(reg.capture(&scene, p, PointerType::Ray, a));
        assert!(reg.capture(&scene, p, PointerType::Ray, b));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(p), Some(b));

        assert!(!reg.release_if(p, a));
        assert!(reg.release_if(p, b));
        assert_eq!(reg.get(p), None);
        assert_eq!(reg.release(p), None);
    }

    #[test]
    fn capture_rejects_denied_pointer_type() {
        let (mut scene, a, _) = two_nodes();
        scene.set_pointer_events_type(a, Some(PointerEventsType::Deny(PointerTypes::GRAB)));
        let mut reg = CaptureRegistry::new();
        assert!(!reg.capture(&scene, PointerId::from_raw(1), PointerType::Grab, a));
        assert!(reg.capture(&scene, PointerId::from_raw(1), PointerType::Ray, a));
    }

    #[test]
    fn removed_targets_are_dropped() {
        let (mut scene, a, b) = two_nodes();
        let p1 = PointerId::from_raw(1);
        let p2 = PointerId::from_raw(2);
        let mut reg = CaptureRegistry::new();
        reg.capture(&scene, p1, PointerType::Ray, a);
        reg.capture(&scene, p2, PointerType::Ray, b);
        scene.remove(a);
        // Slot reuse must not resurrect the capture.
        let _reused = scene.insert(None, SceneNode::default());
        assert_eq!(reg.captured(&scene, p1), None);
        assert!(reg.get(p1).is_none());

        scene.remove(b);
        assert_eq!(reg.prune(&scene), vec![(p2, b)]);
        assert!(reg.is_empty());
    }

    #[test]
    fn pointers_captured_by_target() {
        let (scene, a, b) = two_nodes();
        let mut reg = CaptureRegistry::new();
        reg.capture(&scene, PointerId::from_raw(3), PointerType::Touch, a);
        reg.capture(&scene, PointerId::from_raw(4), PointerType::Touch, b);
        reg.capture(&scene, PointerId::from_raw(5), PointerType::Touch, a);
        let ids: Vec<_> = reg.pointers_captured_by(a).map(PointerId::get).collect();
        assert_eq!(ids, vec![3, 5]);
    }
}
