// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The handle store: pointer captures in, constrained transforms out.
//!
//! ## Lifecycle
//!
//! A store is bound to one node. A `pointerdown` on that node or a descendant
//! captures the pointer to the node and adds it to the gesture; `pointerup` and
//! `pointercancel` take it out. Once per frame, after the routers ran,
//! [`HandleStore::update`] turns the current pointer samples into a goal
//! transform, damps towards it and writes the result through [`HandleTarget`].
//!
//! Samples are taken in the parent space of the node. Each pointer keeps its
//! join-time sample, but deltas are measured from an anchor taken the last time the
//! pointer set changed, with the goal of that moment as reference. Joining or
//! leaving pointers therefore never make the transform jump.

use std::collections::BTreeSet;

use glam::Affine3A;
use reticle_pointer::{
    CaptureRegistry, Pointer, PointerEvent, PointerEventKind, PointerId, PointerLookup,
    PointerSample,
};
use reticle_scene::{NodeId, Scene, Transform};

use crate::gesture::Member;
use crate::manipulation::{self, Manipulation};
use crate::options::HandleOptions;
use crate::target::HandleTarget;

/// A pointer taking part in a handle gesture, sampled in the target's parent space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HandlePointer {
    /// Pointer id.
    pub id: PointerId,
    /// Sample when the pointer joined.
    pub join: PointerSample,
    /// Latest sample.
    pub current: PointerSample,
}

/// What one update did.
#[derive(Clone, Debug, PartialEq)]
pub struct HandleState {
    /// Transform of the target when the gesture started.
    pub initial: Transform,
    /// Transform applied this update.
    pub current: Transform,
    /// Undamped goal.
    pub goal: Transform,
    /// Change from the previously applied transform.
    pub delta: Transform,
    /// Pointers in the gesture, primary first.
    pub pointers: Vec<HandlePointer>,
    /// First update of the gesture.
    pub first: bool,
    /// Last update of the gesture.
    pub last: bool,
    /// Time passed to [`HandleStore::update`].
    pub time: f64,
}

/// Registration handle returned by the `subscribe_*` methods.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Subscription(pub(crate) u32);

type ApplyCallback = Box<dyn FnMut(&HandleState)>;
type HoverCallback = Box<dyn FnMut(bool)>;

/// Drives the transform of one node from the pointers captured to it.
pub struct HandleStore {
    options: HandleOptions,
    target: Option<NodeId>,
    manipulation: Manipulation<PointerId>,
    hovering: BTreeSet<PointerId>,
    apply_subscribers: Vec<(Subscription, ApplyCallback)>,
    hover_subscribers: Vec<(Subscription, HoverCallback)>,
    next_subscription: u32,
}

impl core::fmt::Debug for HandleStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandleStore")
            .field("options", &self.options)
            .field("target", &self.target)
            .field("manipulation", &self.manipulation)
            .field("hovering", &self.hovering)
            .field("apply_subscribers", &self.apply_subscribers.len())
            .field("hover_subscribers", &self.hover_subscribers.len())
            .field("next_subscription", &self.next_subscription)
            .finish()
    }
}

impl Default for HandleStore {
    fn default() -> Self {
        Self::new(HandleOptions::default())
    }
}

impl HandleStore {
    /// Create an unbound store.
    pub fn new(options: HandleOptions) -> Self {
        Self {
            options,
            target: None,
            manipulation: Manipulation::default(),
            hovering: BTreeSet::new(),
            apply_subscribers: Vec::new(),
            hover_subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current options.
    pub fn options(&self) -> &HandleOptions {
        &self.options
    }

    /// Replace the options; they take effect on the next update.
    pub fn set_options(&mut self, options: HandleOptions) {
        self.options = options;
    }

    /// Bound node.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Returns true while a gesture is active or settling.
    pub fn is_active(&self) -> bool {
        self.manipulation.is_active()
    }

    /// Returns true while at least one pointer hovers the bound node.
    pub fn is_hovered(&self) -> bool {
        !self.hovering.is_empty()
    }

    /// Bind to `node`. Fails if `node` is dead or the store is bound elsewhere.
    ///
    /// Binding does not make `node` interactive: presses reach the store only if
    /// `node` (or the descendant that was hit) listens for
    /// [`EventKinds::POINTER_DOWN`](reticle_scene::EventKinds::POINTER_DOWN). A node
    /// without listeners is a blocker and never dispatches `pointerdown`.
    pub fn bind(&mut self, scene: &impl HandleTarget, node: NodeId) -> bool {
        if !scene.is_alive(node) {
            log::warn!("cannot bind handle to dead node {node:?}");
            return false;
        }
        match self.target {
            Some(current) if current != node => {
                log::warn!("handle already bound to {current:?}; unbind first");
                false
            }
            _ => {
                self.target = Some(node);
                true
            }
        }
    }

    /// Unbind, releasing every capture. An ongoing gesture gets a final `last` update
    /// reported to the subscribers; nothing is applied.
    pub fn unbind(&mut self, captures: &mut CaptureRegistry, time: f64) -> Option<HandleState> {
        let node = self.target.take()?;
        self.terminate(node, captures, time)
    }

    /// Feed a dispatched pointer event.
    pub fn on_event<P: PointerLookup + ?Sized>(
        &mut self,
        event: &PointerEvent,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        pointers: &P,
    ) {
        let Some(node) = self.target else {
            return;
        };
        let id = event.pointer_id;
        match event.kind {
            PointerEventKind::Enter if event.target == node => {
                let was_hovered = self.is_hovered();
                self.hovering.insert(id);
                if !was_hovered {
                    self.notify_hover(true);
                }
            }
            PointerEventKind::Leave if event.target == node => {
                if self.hovering.remove(&id) && self.hovering.is_empty() {
                    self.notify_hover(false);
                }
            }
            PointerEventKind::Down => {
                let gesture = self.manipulation.gesture();
                if !self.options.enabled
                    || gesture.contains(id)
                    || !scene.is_ancestor_or_self(node, event.target)
                {
                    return;
                }
                if !self.options.multitouch && !gesture.members().is_empty() {
                    return;
                }
                let Some(sample) = local_sample(scene, node, pointers.pointer(id)) else {
                    return;
                };
                if captures.capture(scene, id, event.pointer_type, node) {
                    self.manipulation.gesture_mut().insert(id, sample);
                    log::debug!("{id:?} joined handle on {node:?}");
                }
            }
            PointerEventKind::Up | PointerEventKind::Cancel => {
                if self.manipulation.gesture_mut().remove(id) {
                    captures.release_if(id, node);
                    log::debug!("{id:?} left handle on {node:?}");
                }
            }
            _ => {}
        }
    }

    /// Advance one frame and write the new transform to `target`.
    ///
    /// Returns `None` while no gesture is running.
    pub fn update<T, P>(
        &mut self,
        time: f64,
        target: &mut T,
        captures: &mut CaptureRegistry,
        pointers: &P,
    ) -> Option<HandleState>
    where
        T: HandleTarget + ?Sized,
        P: PointerLookup + ?Sized,
    {
        let node = self.target?;
        if !target.is_alive(node) {
            log::debug!("handle target {node:?} removed");
            self.target = None;
            return self.terminate(node, captures, time);
        }

        let stale: Vec<PointerId> = self
            .manipulation
            .gesture()
            .members()
            .iter()
            .map(|m| m.key)
            .filter(|id| captures.get(*id) != Some(node) || pointers.pointer(*id).is_none())
            .collect();
        for id in stale {
            self.manipulation.gesture_mut().remove(id);
            captures.release_if(id, node);
            log::debug!("{id:?} dropped from handle on {node:?}");
        }
        let ids: Vec<PointerId> = self
            .manipulation
            .gesture()
            .members()
            .iter()
            .map(|m| m.key)
            .collect();
        if let Some(parent) = target.parent_world_transform(node) {
            for id in &ids {
                if let Some(sample) = pointers.pointer(*id).and_then(Pointer::sample) {
                    self.manipulation
                        .gesture_mut()
                        .update_sample(*id, to_local(parent, sample));
                }
            }
        }

        let Some(step) = self.manipulation.step(&self.options, || target.transform(node)) else {
            // Members remain only if the initial transform could not be read.
            for id in ids {
                captures.release_if(id, node);
            }
            return None;
        };
        let frame = step.frame;
        if frame.first {
            log::debug!("handle gesture on {node:?} started");
        }
        let motion = step.motion;
        target.apply(node, motion.applied);

        let state = HandleState {
            initial: motion.initial,
            current: motion.applied,
            goal: motion.goal,
            delta: manipulation::delta(&step.previous, &motion.applied),
            pointers: handle_pointers(self.manipulation.gesture().members()),
            first: frame.first,
            last: frame.last,
            time,
        };
        if frame.last {
            log::debug!("handle gesture on {node:?} ended");
        }
        self.notify_apply(&state);
        Some(state)
    }

    /// Call `callback` after every update that applied a transform.
    pub fn subscribe_apply(
        &mut self,
        callback: impl FnMut(&HandleState) + 'static,
    ) -> Subscription {
        let subscription = self.next_subscription();
        self.apply_subscribers.push((subscription, Box::new(callback)));
        subscription
    }

    /// Call `callback` when the bound node becomes hovered or stops being hovered.
    pub fn subscribe_hover(&mut self, callback: impl FnMut(bool) + 'static) -> Subscription {
        let subscription = self.next_subscription();
        self.hover_subscribers.push((subscription, Box::new(callback)));
        subscription
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.apply_subscribers.len() + self.hover_subscribers.len();
        self.apply_subscribers.retain(|(s, _)| *s != subscription);
        self.hover_subscribers.retain(|(s, _)| *s != subscription);
        before != self.apply_subscribers.len() + self.hover_subscribers.len()
    }

    fn next_subscription(&mut self) -> Subscription {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        subscription
    }

    fn notify_apply(&mut self, state: &HandleState) {
        for (_, callback) in &mut self.apply_subscribers {
            callback(state);
        }
    }

    fn notify_hover(&mut self, hovered: bool) {
        for (_, callback) in &mut self.hover_subscribers {
            callback(hovered);
        }
    }

    // Ends everything without touching the target.
    fn terminate(
        &mut self,
        node: NodeId,
        captures: &mut CaptureRegistry,
        time: f64,
    ) -> Option<HandleState> {
        let members = self.manipulation.gesture().members();
        for member in members {
            captures.release_if(member.key, node);
        }
        let pointers = handle_pointers(members);
        let motion = self.manipulation.terminate();
        if !self.hovering.is_empty() {
            self.hovering.clear();
            self.notify_hover(false);
        }
        let motion = motion?;
        let state = HandleState {
            initial: motion.initial,
            current: motion.applied,
            goal: motion.applied,
            delta: Transform::IDENTITY,
            pointers,
            first: false,
            last: true,
            time,
        };
        self.notify_apply(&state);
        Some(state)
    }
}

fn handle_pointers(members: &[Member<PointerId, PointerSample>]) -> Vec<HandlePointer> {
    members
        .iter()
        .map(|m| HandlePointer {
            id: m.key,
            join: m.join,
            current: m.current,
        })
        .collect()
}

fn local_sample(scene: &Scene, node: NodeId, pointer: Option<&Pointer>) -> Option<PointerSample> {
    let parent = scene.parent_world_transform(node)?;
    Some(to_local(parent, pointer?.sample()?))
}

fn to_local(parent: Affine3A, sample: PointerSample) -> PointerSample {
    let (_, parent_rotation, _) = parent.to_scale_rotation_translation();
    PointerSample {
        position: parent.inverse().transform_point3(sample.position),
        rotation: (parent_rotation.inverse() * sample.rotation).normalize(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{AxisFlags, AxisOptions};
    use glam::{Quat, Vec3};
    use reticle_pointer::{Button, Intersector, PointerOptions, RayOptions};
    use reticle_scene::{EventKinds, ListenerToken, SceneNode, Shape};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Rig {
        scene: Scene,
        node: NodeId,
        listener: Option<ListenerToken>,
        pointers: Vec<Pointer>,
        captures: CaptureRegistry,
        store: HandleStore,
    }

    impl Rig {
        fn new(options: HandleOptions) -> Self {
            let mut scene = Scene::new();
            let node = scene.insert(
                None,
                SceneNode {
                    transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
                    shape: Some(Shape::cuboid(Vec3::splat(1.0))),
                    ..Default::default()
                },
            );
            let listener = scene.add_listener(node, EventKinds::POINTER_DOWN);
            scene.commit();
            let pointers = (1..=3)
                .map(|raw| {
                    let mut pointer = Pointer::with_id(
                        PointerId::from_raw(raw),
                        Intersector::ray(RayOptions::default()),
                        PointerOptions::default(),
                    );
                    pointer.set_space(Some(Affine3A::IDENTITY));
                    pointer
                })
                .collect();
            let mut store = HandleStore::new(options);
            assert!(store.bind(&scene, node));
            Self {
                scene,
                node,
                listener,
                pointers,
                captures: CaptureRegistry::new(),
                store,
            }
        }

        fn feed(&mut self, events: Vec<PointerEvent>) {
            for event in &events {
                self.store
                    .on_event(event, &self.scene, &mut self.captures, &self.pointers);
            }
        }

        fn move_to(&mut self, at: Vec3, time: f64) {
            self.move_pointer(0, at, time);
        }

        fn press(&mut self, time: f64) {
            self.press_pointer(0, time);
        }

        fn release(&mut self, time: f64) {
            let mut events = Vec::new();
            self.pointers[0].up(Button::Primary, &self.scene, &mut self.captures, time, &mut events);
            self.feed(events);
        }

        fn move_pointer(&mut self, index: usize, at: Vec3, time: f64) {
            let mut events = Vec::new();
            let pointer = &mut self.pointers[index];
            pointer.set_space(Some(Affine3A::from_translation(at)));
            pointer.move_to(&self.scene, &mut self.captures, time, &mut events);
            self.feed(events);
        }

        fn press_pointer(&mut self, index: usize, time: f64) {
            let mut events = Vec::new();
            self.pointers[index].down(
                Button::Primary,
                &self.scene,
                &mut self.captures,
                time,
                &mut events,
            );
            self.feed(events);
        }

        fn update(&mut self, time: f64) -> Option<HandleState> {
            let state = self
                .store
                .update(time, &mut self.scene, &mut self.captures, &self.pointers);
            self.scene.commit();
            state
        }
    }

    // Device positions whose rays hit the front face of the cube (z = -1.5) at `point`.
    fn device_for(point: Vec3) -> Vec3 {
        Vec3::new(point.x, point.y, 0.0)
    }

    #[test]
    fn first_and_last_are_balanced() {
        let mut rig = Rig::new(HandleOptions::default());
        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        let mut states = Vec::new();
        states.extend(rig.update(0.0));
        rig.move_to(Vec3::new(0.3, 0.0, 0.0), 0.1);
        states.extend(rig.update(0.1));
        rig.release(0.2);
        states.extend(rig.update(0.2));
        assert!(rig.update(0.3).is_none());

        assert_eq!(states.len(), 3);
        assert_eq!(states.iter().filter(|s| s.first).count(), 1);
        assert_eq!(states.iter().filter(|s| s.last).count(), 1);
        assert!(states[0].first && states[2].last);
        assert!((states[2].current.translation.x - 0.3).abs() < 1e-5);
        assert!(rig.captures.is_empty());
    }

    #[test]
    fn drag_follows_the_captured_point() {
        let mut rig = Rig::new(HandleOptions::default());
        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        rig.update(0.0);
        rig.move_to(Vec3::new(0.5, -0.25, 0.0), 0.1);
        let state = rig.update(0.1).unwrap();
        let expected = Vec3::new(0.5, -0.25, -2.0);
        assert!((state.current.translation - expected).length() < 1e-5);
        assert_eq!(rig.scene.transform(rig.node), Some(state.current));
        assert_eq!(state.pointers.len(), 1);
        assert!((state.delta.translation - (expected - Vec3::new(0.0, 0.0, -2.0))).length() < 1e-5);
    }

    #[test]
    fn locked_axis_stays_exactly_zero() {
        let mut options = HandleOptions::default();
        options.translate = AxisOptions::only(AxisFlags::X | AxisFlags::Z);
        let mut rig = Rig::new(options);
        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        rig.update(0.0);
        rig.move_to(Vec3::new(0.5, 0.5, 0.0), 0.1);
        let state = rig.update(0.1).unwrap();
        assert_eq!(state.current.translation.y, 0.0);
        assert_eq!(state.delta.translation.y, 0.0);
        assert!((state.current.translation.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn damping_decays_geometrically() {
        let mut options = HandleOptions::default();
        options.damping = 0.5;
        let mut rig = Rig::new(options);
        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        rig.update(0.0);
        rig.move_to(Vec3::new(1.0, 0.0, 0.0), 0.1);
        let xs: Vec<f32> = (1..=3)
            .filter_map(|i| rig.update(f64::from(i) * 0.1))
            .map(|s| s.current.translation.x)
            .collect();
        for (x, expected) in xs.iter().zip([0.5, 0.75, 0.875]) {
            assert!((x - expected).abs() < 1e-4, "{xs:?}");
        }

        rig.release(0.4);
        let mut lasts = 0;
        let mut final_state = None;
        for i in 0..200 {
            let Some(state) = rig.update(0.5 + f64::from(i) * 0.01) else {
                break;
            };
            if state.last {
                lasts += 1;
                final_state = Some(state);
            }
        }
        assert_eq!(lasts, 1);
        let final_state = final_state.unwrap();
        assert_eq!(final_state.current, final_state.goal);
    }

    #[test]
    fn no_damping_passes_the_goal_through() {
        let mut rig = Rig::new(HandleOptions::default());
        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        rig.update(0.0);
        rig.move_to(Vec3::new(0.2, 0.1, 0.0), 0.1);
        let state = rig.update(0.1).unwrap();
        assert_eq!(state.current, state.goal);
    }

    #[test]
    fn removed_target_ends_with_a_synthetic_last() {
        let mut rig = Rig::new(HandleOptions::default());
        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        assert!(rig.update(0.0).is_some_and(|s| s.first));
        rig.scene.remove(rig.node);
        let state = rig.update(0.1).unwrap();
        assert!(state.last && !state.first);
        assert!(rig.captures.is_empty());
        assert_eq!(rig.store.target(), None);
        assert!(rig.update(0.2).is_none());
    }

    #[test]
    fn subscribers_and_hover() {
        let mut rig = Rig::new(HandleOptions::default());
        let hovered = Rc::new(RefCell::new(Vec::new()));
        let applied = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hovered);
        rig.store.subscribe_hover(move |on| h.borrow_mut().push(on));
        let a = Rc::clone(&applied);
        let apply = rig.store.subscribe_apply(move |_| *a.borrow_mut() += 1);

        rig.move_to(Vec3::ZERO, 0.0);
        assert!(rig.store.is_hovered());
        rig.press(0.0);
        rig.update(0.0);
        assert!(rig.store.unsubscribe(apply));
        assert!(!rig.store.unsubscribe(apply));
        rig.update(0.1);
        rig.move_to(Vec3::new(0.0, 5.0, 0.0), 0.2);
        assert_eq!(*applied.borrow(), 1);
        // Hover follows the true hit even while the pointer is captured.
        assert_eq!(*hovered.borrow(), vec![true, false]);
    }

    #[test]
    fn pinch_scales_turns_and_moves_at_once() {
        let mut rig = Rig::new(HandleOptions::default());
        rig.move_pointer(0, Vec3::new(-0.25, 0.0, 0.0), 0.0);
        rig.press_pointer(0, 0.0);
        rig.move_pointer(1, Vec3::new(0.25, 0.0, 0.0), 0.0);
        rig.press_pointer(1, 0.0);
        assert!(rig.update(0.0).is_some_and(|s| s.first && s.pointers.len() == 2));

        // Pair vector turns a quarter about Z, doubles, and its centroid moves.
        rig.move_pointer(0, Vec3::new(0.1, -0.3, 0.0), 0.1);
        rig.move_pointer(1, Vec3::new(0.1, 0.7, 0.0), 0.1);
        let state = rig.update(0.1).unwrap();
        let turn = Quat::from_rotation_z(core::f32::consts::FRAC_PI_2);
        assert!((state.current.rotation * Vec3::X - turn * Vec3::X).length() < 1e-4);
        assert!((state.current.scale - Vec3::splat(2.0)).length() < 1e-4);
        // The cube centre sits 0.5 behind the pivot and is pushed out by the factor.
        let expected = Vec3::new(0.1, 0.2, -2.5);
        assert!((state.current.translation - expected).length() < 1e-4, "{state:?}");
    }

    #[test]
    fn joining_pointer_keeps_its_own_join_sample() {
        let mut rig = Rig::new(HandleOptions::default());
        rig.move_pointer(0, Vec3::ZERO, 0.0);
        rig.press_pointer(0, 0.0);
        rig.update(0.0);
        rig.move_pointer(0, Vec3::new(0.2, 0.0, 0.0), 0.1);
        let before = rig.update(0.1).unwrap();

        rig.move_pointer(1, Vec3::new(0.3, 0.0, 0.0), 0.2);
        rig.press_pointer(1, 0.2);
        let joined = rig.update(0.2).unwrap();
        assert_eq!(joined.pointers.len(), 2);
        assert!((joined.pointers[0].join.position - Vec3::new(0.0, 0.0, -1.5)).length() < 1e-5);
        assert!((joined.pointers[1].join.position - Vec3::new(0.3, 0.0, -1.5)).length() < 1e-5);
        assert!((joined.current.translation - before.current.translation).length() < 1e-6);
        assert_eq!(joined.delta.translation, Vec3::ZERO);

        rig.move_pointer(0, Vec3::new(0.3, 0.0, 0.0), 0.3);
        rig.move_pointer(1, Vec3::new(0.4, 0.0, 0.0), 0.3);
        let state = rig.update(0.3).unwrap();
        assert!((state.current.translation - Vec3::new(0.3, 0.0, -2.0)).length() < 1e-5);
        assert!((state.current.scale - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn single_touch_ignores_a_second_pointer() {
        let mut options = HandleOptions::default();
        options.multitouch = false;
        let mut rig = Rig::new(options);
        rig.move_pointer(0, Vec3::ZERO, 0.0);
        rig.press_pointer(0, 0.0);
        rig.move_pointer(1, Vec3::new(0.25, 0.0, 0.0), 0.0);
        rig.press_pointer(1, 0.0);
        rig.update(0.0);
        assert_eq!(rig.captures.get(PointerId::from_raw(2)), None);

        rig.move_pointer(1, Vec3::new(1.0, 0.0, 0.0), 0.1);
        rig.move_pointer(0, Vec3::new(0.0, 0.2, 0.0), 0.1);
        let state = rig.update(0.1).unwrap();
        assert_eq!(state.pointers.len(), 1);
        assert!((state.current.translation - Vec3::new(0.0, 0.2, -2.0)).length() < 1e-5);
        assert_eq!(state.current.scale, Vec3::ONE);
    }

    #[test]
    fn locked_axis_holds_through_damping_and_settling() {
        let mut options = HandleOptions::default();
        options.translate = AxisOptions::only(AxisFlags::X | AxisFlags::Z);
        options.damping = 0.5;
        let mut rig = Rig::new(options);
        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        let mut states: Vec<HandleState> = rig.update(0.0).into_iter().collect();
        for i in 1..=4_u8 {
            let t = f64::from(i) * 0.1;
            let step = f32::from(i);
            rig.move_to(Vec3::new(0.2 * step, 0.3 * step, 0.0), t);
            states.extend(rig.update(t));
        }
        rig.release(0.5);
        for i in 0..100_i32 {
            let Some(state) = rig.update(0.6 + f64::from(i) * 0.01) else {
                break;
            };
            states.push(state);
        }
        assert!(states.last().is_some_and(|s| s.last));
        for state in &states {
            assert_eq!(state.current.translation.y, 0.0);
            assert_eq!(state.goal.translation.y, 0.0);
            assert_eq!(state.delta.translation.y, 0.0);
        }
        assert!((states.last().unwrap().current.translation.x - 0.8).abs() < 1e-3);
    }

    #[test]
    fn three_pointers_follow_a_rigid_fit() {
        let mut rig = Rig::new(HandleOptions::default());
        let points = [
            Vec3::new(-0.2, 0.0, -1.5),
            Vec3::new(0.2, 0.0, -1.5),
            Vec3::new(0.0, 0.2, -1.5),
        ];
        for (i, point) in points.iter().enumerate() {
            rig.move_pointer(i, device_for(*point), 0.0);
            rig.press_pointer(i, 0.0);
        }
        assert!(rig.update(0.0).is_some_and(|s| s.pointers.len() == 3));

        let turn = Quat::from_rotation_z(0.6);
        let centroid = points.iter().sum::<Vec3>() / 3.0;
        for (i, point) in points.iter().enumerate() {
            let moved = centroid + turn * (*point - centroid) + Vec3::new(0.05, -0.1, 0.0);
            rig.move_pointer(i, device_for(moved), 0.1);
        }
        let state = rig.update(0.1).unwrap();
        let rotation = state.current.rotation;
        assert!((rotation * Vec3::X - turn * Vec3::X).length() < 1e-3, "{state:?}");
        assert!((rotation * Vec3::Z - Vec3::Z).length() < 1e-3, "{state:?}");
        assert!((state.current.scale - Vec3::ONE).length() < 1e-4);
        let expected = centroid
            + turn * (Vec3::new(0.0, 0.0, -2.0) - centroid)
            + Vec3::new(0.05, -0.1, 0.0);
        assert!((state.current.translation - expected).length() < 1e-4, "{state:?}");
    }

    #[test]
    fn bound_node_without_listeners_never_starts() {
        let mut rig = Rig::new(HandleOptions::default());
        let token = rig.listener.take().unwrap();
        assert!(rig.scene.remove_listener(rig.node, token));
        rig.scene.commit();

        rig.move_to(Vec3::ZERO, 0.0);
        rig.press(0.0);
        assert!(rig.update(0.0).is_none());
        assert!(!rig.store.is_active());
        assert!(rig.captures.is_empty());

        rig.release(0.1);
        rig.scene.add_listener(rig.node, EventKinds::POINTER_DOWN);
        rig.scene.commit();
        rig.move_to(Vec3::ZERO, 0.2);
        rig.press(0.2);
        assert!(rig.update(0.2).is_some_and(|s| s.first));
    }
}
