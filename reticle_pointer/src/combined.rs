// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbitration between several pointers of one device.
//!
//! An XR controller carries a grab sphere and a ray; a hand carries a touch sphere,
//! a grab sphere and a pinch ray. Only one of them should talk to the scene at a
//! time. Every frame each ready child hit tests, and the winner by
//! ([`HitRank`], then child order) becomes the active child. The active child stays
//! locked while it holds buttons or a capture, and inactive children have their
//! hover cleared.

use reticle_scene::Scene;

use crate::capture::CaptureRegistry;
use crate::intersector::HitRank;
use crate::pointer::Pointer;
use crate::types::{Button, Intersection, PointerEvent};

/// A group of pointers of which at most one is active.
#[derive(Clone, Debug)]
pub struct CombinedPointer {
    children: Vec<Pointer>,
    active: Option<usize>,
}

impl CombinedPointer {
    /// Combine `children`. Earlier children win exact ties.
    pub fn new(children: Vec<Pointer>) -> Self {
        Self {
            children,
            active: None,
        }
    }

    /// All children.
    pub fn children(&self) -> &[Pointer] {
        &self.children
    }

    /// Mutable child, for example to update its space.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Pointer> {
        self.children.get_mut(index)
    }

    /// Index of the active child.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The active child.
    pub fn active(&self) -> Option<&Pointer> {
        self.children.get(self.active?)
    }

    fn locked(&self, captures: &CaptureRegistry) -> Option<usize> {
        let index = self.active?;
        let child = self.children.get(index)?;
        (!child.buttons().is_empty() || captures.get(child.id()).is_some()).then_some(index)
    }

    /// Pick the active child for this frame and move it.
    pub fn move_to(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if let Some(index) = self.locked(captures) {
            self.children[index].move_to(scene, captures, time, out);
            return;
        }

        let hits: Vec<Option<Intersection>> =
            self.children.iter_mut().map(|c| c.cast(scene)).collect();
        let mut best: Option<(usize, HitRank)> = None;
        for (index, hit) in hits.iter().enumerate() {
            let Some(hit) = hit else { continue };
            let rank = HitRank {
                order: hit.pointer_events_order,
                distance: hit.distance,
            };
            if best.is_none_or(|(_, b)| rank > b) {
                best = Some((index, rank));
            }
        }
        let winner = best
            .map(|(index, _)| index)
            .or_else(|| self.children.iter().position(Pointer::is_ready));
        if winner != self.active {
            log::trace!("combined pointer switched {:?} -> {winner:?}", self.active);
        }

        // Inactive children clear first so their leaves precede the winner's enters.
        for (index, child) in self.children.iter_mut().enumerate() {
            if Some(index) != winner {
                child.leave(scene, time, out);
            }
        }
        if let Some(index) = winner {
            let child = &mut self.children[index];
            child.apply_hit(hits[index], scene, captures, time, out);
            child.emit_move(scene, captures, time, out);
        }
        self.active = winner;
    }

    /// Press `button` on the active child.
    pub fn down(
        &mut self,
        button: Button,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if let Some(child) = self.active.and_then(|i| self.children.get_mut(i)) {
            child.down(button, scene, captures, time, out);
        }
    }

    /// Release `button` on every child holding it.
    pub fn up(
        &mut self,
        button: Button,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        for child in &mut self.children {
            child.up(button, scene, captures, time, out);
        }
    }

    /// Scroll on the active child.
    pub fn wheel(
        &mut self,
        delta: kurbo::Vec2,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if let Some(child) = self.active.and_then(|i| self.children.get_mut(i)) {
            child.wheel(delta, scene, captures, time, out);
        }
    }

    /// Cancel every child.
    pub fn cancel(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        for child in &mut self.children {
            child.cancel(scene, captures, time, out);
        }
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersector::{Intersector, RayOptions, SphereOptions};
    use crate::pointer::PointerOptions;
    use crate::types::{PointerEventKind, PointerId};
    use glam::{Affine3A, Vec3};
    use reticle_scene::{EventKinds, NodeId, SceneNode, Shape, Transform};

    fn ball(scene: &mut Scene, at: Vec3, order: Option<i32>) -> NodeId {
        let id = scene.insert(
            None,
            SceneNode {
                transform: Transform::from_translation(at),
                shape: Some(Shape::sphere(0.1)),
                pointer_events_order: order,
                ..Default::default()
            },
        );
        scene.add_listener(id, EventKinds::all());
        id
    }

    fn controller(space: Affine3A) -> CombinedPointer {
        let mut grab = Pointer::with_id(
            PointerId::from_raw(10),
            Intersector::grab(SphereOptions { radius: 0.07 }),
            PointerOptions::default(),
        );
        let mut ray = Pointer::with_id(
            PointerId::from_raw(11),
            Intersector::ray(RayOptions::default()),
            PointerOptions::default(),
        );
        grab.set_space(Some(space));
        ray.set_space(Some(space));
        CombinedPointer::new(vec![grab, ray])
    }

    #[test]
    fn nearest_child_wins_and_losers_stay_quiet() {
        let mut scene = Scene::new();
        // Beside the ray, within reach of the grab sphere.
        let close = ball(&mut scene, Vec3::new(0.12, 0.0, -0.05), None);
        scene.commit();
        let mut combined = controller(Affine3A::IDENTITY);
        let mut captures = CaptureRegistry::new();
        let mut out = Vec::new();
        combined.move_to(&scene, &mut captures, 0.0, &mut out);
        assert_eq!(combined.active_index(), Some(0));
        assert!(out.iter().all(|e| e.pointer_id == PointerId::from_raw(10)));
        assert_eq!(out.last().map(|e| (e.kind, e.target)), Some((PointerEventKind::Move, close)));
    }

    #[test]
    fn order_lets_the_ray_win_from_afar() {
        let mut scene = Scene::new();
        let _close = ball(&mut scene, Vec3::new(0.0, 0.0, -0.12), None);
        let far = ball(&mut scene, Vec3::new(0.0, 0.0, -5.0), Some(1));
        scene.commit();
        let mut combined = controller(Affine3A::IDENTITY);
        let mut captures = CaptureRegistry::new();
        let mut out = Vec::new();
        combined.move_to(&scene, &mut captures, 0.0, &mut out);
        assert_eq!(combined.active_index(), Some(1));
        assert_eq!(combined.active().unwrap().hit().unwrap().object, far);
    }

    #[test]
    fn pressed_child_stays_active() {
        let mut scene = Scene::new();
        let far = ball(&mut scene, Vec3::new(0.0, 0.0, -3.0), None);
        scene.commit();
        let mut combined = controller(Affine3A::IDENTITY);
        let mut captures = CaptureRegistry::new();
        let mut out = Vec::new();
        combined.move_to(&scene, &mut captures, 0.0, &mut out);
        assert_eq!(combined.active_index(), Some(1));
        combined.down(Button::Primary, &scene, &mut captures, 0.0, &mut out);

        // Moving the controller onto a ball would normally hand over to the grab sphere.
        let near = ball(&mut scene, Vec3::new(0.0, 0.0, -0.1), None);
        scene.commit();
        out.clear();
        combined.move_to(&scene, &mut captures, 0.1, &mut out);
        assert_eq!(combined.active_index(), Some(1));
        assert_ne!(combined.active().unwrap().hit().unwrap().object, far);
        assert_eq!(combined.active().unwrap().hit().unwrap().object, near);

        combined.up(Button::Primary, &scene, &mut captures, 0.2, &mut out);
        combined.move_to(&scene, &mut captures, 0.3, &mut out);
        assert_eq!(combined.active_index(), Some(0));
    }
}
