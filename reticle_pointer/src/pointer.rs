// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One logical pointer: intersection state, buttons, capture and event synthesis.
//!
//! ## Event order
//!
//! Within one call the synthesized events are strictly ordered:
//! `Out`, `Leave` (inner→outer), `Over`, `Enter` (outer→inner), then `Move`,
//! then button events (`Down`, or `Up` followed by `Click`/`DoubleClick`/`ContextMenu`).
//!
//! ## Capture
//!
//! While the pointer is captured, move/down/up/wheel/cancel go to the capture target and
//! the reported intersection is re-derived from a device-space anchor taken when the
//! capture was first observed. Enter/leave keep following the geometric hit.
//! Releasing every button releases the capture.

use glam::{Affine3A, Quat, Vec3};
use reticle_scene::{NodeId, PointerType, Scene};

use crate::capture::CaptureRegistry;
use crate::hover::{HoverState, HoverTransition};
use crate::intersector::Intersector;
use crate::types::{Button, Buttons, Intersection, PointerEvent, PointerEventKind, PointerId};

/// Behavior knobs of a [`Pointer`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PointerOptions {
    /// Maximum travel of the intersection point (world units) between down and up
    /// for the release to count as a click.
    pub click_threshold: f32,
    /// Maximum time in seconds between two clicks on the same target for a `DoubleClick`.
    pub double_click_interval: f64,
    /// Capture the pressed target once a press travels past `click_threshold`.
    pub implicit_capture: bool,
}

impl Default for PointerOptions {
    fn default() -> Self {
        Self {
            click_threshold: 0.02,
            double_click_interval: 0.5,
            implicit_capture: false,
        }
    }
}

/// World-space pose a handle reads from a pointer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerSample {
    /// Intersection point (captured or hit tested).
    pub position: Vec3,
    /// Device rotation.
    pub rotation: Quat,
}

#[derive(Copy, Clone, Debug)]
struct Press {
    button: Button,
    target: Option<NodeId>,
    point: Option<Vec3>,
    travel: f32,
}

/// One logical input and its event lifecycle.
#[derive(Clone, Debug)]
pub struct Pointer {
    id: PointerId,
    intersector: Intersector,
    options: PointerOptions,
    enabled: bool,
    intersection: Option<Intersection>,
    intersection_space: Option<Affine3A>,
    hit: Option<Intersection>,
    hover: HoverState<NodeId>,
    buttons: Buttons,
    presses: Vec<Press>,
    last_click: Option<(NodeId, f64)>,
    anchor: Option<(NodeId, Vec3)>,
}

impl Pointer {
    /// Create a pointer with the next process-wide id.
    pub fn new(intersector: Intersector, options: PointerOptions) -> Self {
        Self::with_id(PointerId::next(), intersector, options)
    }

    /// Create a pointer with an explicit id.
    pub fn with_id(id: PointerId, intersector: Intersector, options: PointerOptions) -> Self {
        log::debug!("created {id:?} ({:?})", intersector.pointer_type());
        Self {
            id,
            intersector,
            options,
            enabled: true,
            intersection: None,
            intersection_space: None,
            hit: None,
            hover: HoverState::new(),
            buttons: Buttons::empty(),
            presses: Vec::new(),
            last_click: None,
            anchor: None,
        }
    }

    /// Pointer id.
    pub fn id(&self) -> PointerId {
        self.id
    }

    /// Pointer type.
    pub fn pointer_type(&self) -> PointerType {
        self.intersector.pointer_type()
    }

    /// The device intersector.
    pub fn intersector(&self) -> &Intersector {
        &self.intersector
    }

    /// Mutable device intersector.
    pub fn intersector_mut(&mut self) -> &mut Intersector {
        &mut self.intersector
    }

    /// Set the device space for the next intersection.
    pub fn set_space(&mut self, space: Option<Affine3A>) {
        self.intersector.set_space(space);
    }

    /// Options.
    pub fn options(&self) -> &PointerOptions {
        &self.options
    }

    /// Replace the options.
    pub fn set_options(&mut self, options: PointerOptions) {
        self.options = options;
    }

    /// Current intersection: the captured one while captured, otherwise the hit-tested one.
    pub fn intersection(&self) -> Option<&Intersection> {
        self.intersection.as_ref()
    }

    /// Geometric hit of the last pass, ignoring capture.
    pub fn hit(&self) -> Option<&Intersection> {
        self.hit.as_ref()
    }

    /// Deepest hovered node.
    pub fn hovered(&self) -> Option<NodeId> {
        self.hover.target()
    }

    /// Held buttons.
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    /// Returns true if the pointer takes part in hit testing.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true if the pointer is enabled and its pose resolvable.
    pub fn is_ready(&self) -> bool {
        self.enabled && self.intersector.is_ready()
    }

    /// World pose for handles: the current intersection point and the device rotation.
    pub fn sample(&self) -> Option<PointerSample> {
        let space = self.intersector.space()?;
        let position = self.intersection?.point;
        let (_, rotation, _) = space.to_scale_rotation_translation();
        Some(PointerSample { position, rotation })
    }

    /// Hit test the scene without synthesizing events.
    ///
    /// Returns `None` when the pointer is disabled or its pose is not resolvable.
    pub fn cast(&mut self, scene: &Scene) -> Option<Intersection> {
        if !self.is_ready() {
            return None;
        }
        let intersector = &mut self.intersector;
        intersector.start_intersection();
        if !intersector.prepare_intersection() {
            return None;
        }
        scene.visit(|id, node, policy| intersector.execute_intersection(scene, id, node, policy));
        intersector.finalize_intersection()
    }

    /// Re-run intersection and emit the hover transitions.
    pub fn intersect(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        let hit = self.cast(scene);
        self.apply_hit(hit, scene, captures, time, out);
    }

    /// Re-run intersection, emit the hover transitions and a `Move`.
    pub fn move_to(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        self.intersect(scene, captures, time, out);
        self.emit_move(scene, captures, time, out);
    }

    /// Adopt an intersection computed elsewhere (for example by a combined pointer).
    pub(crate) fn apply_hit(
        &mut self,
        hit: Option<Intersection>,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        self.intersection = match captures.captured(scene, self.id) {
            Some(target) => self.captured_intersection(scene, target, hit),
            None => {
                self.anchor = None;
                hit
            }
        };
        self.hit = hit;
        self.intersection_space = self.intersector.space();

        let path = hit.map_or_else(Vec::new, |h| scene.path_to_root(h.object));
        let transitions = self.hover.update_path(&path);
        self.emit_transitions(scene, transitions, time, out);
        self.track_presses(scene, captures);
    }

    pub(crate) fn emit_move(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if let Some(target) = self.event_target(scene, captures) {
            out.push(self.event(PointerEventKind::Move, target, None, time));
        }
    }

    /// Press `button` at the current intersection.
    pub fn down(
        &mut self,
        button: Button,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if !self.enabled || self.buttons.contains(button.as_flag()) {
            return;
        }
        self.buttons |= button.as_flag();
        self.presses.retain(|p| p.button != button);
        self.presses.push(Press {
            button,
            target: self.hit.map(|h| h.object),
            point: self.intersection.map(|i| i.point),
            travel: 0.0,
        });
        if let Some(target) = self.event_target(scene, captures) {
            out.push(self.event(PointerEventKind::Down, target, Some(button), time));
        }
    }

    /// Release `button`, emitting `Up` and, when it qualifies, a click.
    pub fn up(
        &mut self,
        button: Button,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if !self.buttons.contains(button.as_flag()) {
            return;
        }
        self.buttons.remove(button.as_flag());
        if let Some(target) = self.event_target(scene, captures) {
            out.push(self.event(PointerEventKind::Up, target, Some(button), time));
        }

        let press = self
            .presses
            .iter()
            .position(|p| p.button == button)
            .map(|i| self.presses.swap_remove(i));
        let clicked = press.and_then(|p| {
            let target = p.target?;
            let unchanged = self.hit.map(|h| h.object) == Some(target);
            (unchanged && p.travel <= self.options.click_threshold && scene.is_alive(target))
                .then_some(target)
        });
        if let Some(target) = clicked {
            match button {
                Button::Primary => {
                    out.push(self.event(PointerEventKind::Click, target, Some(button), time));
                    let double = self.last_click.is_some_and(|(last, at)| {
                        last == target && time - at <= self.options.double_click_interval
                    });
                    if double {
                        out.push(self.event(
                            PointerEventKind::DoubleClick,
                            target,
                            Some(button),
                            time,
                        ));
                        self.last_click = None;
                    } else {
                        self.last_click = Some((target, time));
                    }
                }
                Button::Secondary => {
                    out.push(self.event(PointerEventKind::ContextMenu, target, Some(button), time));
                }
                Button::Auxiliary => {}
            }
        }

        if self.buttons.is_empty() {
            captures.release(self.id);
            self.anchor = None;
        }
    }

    /// Emit a `Wheel` at the current intersection without re-running hit testing.
    pub fn wheel(
        &mut self,
        delta: kurbo::Vec2,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if let Some(target) = self.event_target(scene, captures) {
            let mut event = self.event(PointerEventKind::Wheel, target, None, time);
            event.wheel_delta = Some(delta);
            out.push(event);
        }
    }

    /// Device lost: `Cancel` if buttons are held, then out/leave, then release the capture.
    pub fn cancel(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if !self.buttons.is_empty()
            && let Some(target) = self.event_target(scene, captures)
        {
            out.push(self.event(PointerEventKind::Cancel, target, None, time));
        }
        self.buttons = Buttons::empty();
        self.presses.clear();
        self.leave(scene, time, out);
        captures.release(self.id);
        self.anchor = None;
        log::debug!("{:?} cancelled", self.id);
    }

    /// Clear the hover state (out/leave) without touching buttons or capture.
    pub fn leave(&mut self, scene: &Scene, time: f64, out: &mut Vec<PointerEvent>) {
        let transitions = self.hover.clear();
        self.emit_transitions(scene, transitions, time, out);
        self.intersection = None;
        self.hit = None;
    }

    /// Enable or disable the pointer. Disabling cancels it.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        if self.enabled && !enabled {
            self.cancel(scene, captures, time, out);
        }
        self.enabled = enabled;
    }

    // A new capture is anchored at the intersection the pointer had when the capture
    // was taken, expressed in the device space of that moment.
    fn captured_intersection(
        &mut self,
        scene: &Scene,
        target: NodeId,
        hit: Option<Intersection>,
    ) -> Option<Intersection> {
        let anchor = match self.anchor {
            Some((node, anchor)) if node == target => anchor,
            _ => {
                let anchor = match (self.intersection, self.intersection_space) {
                    (Some(previous), Some(space)) => {
                        Some(space.inverse().transform_point3(previous.point))
                            .filter(|a| a.is_finite())
                    }
                    _ => hit
                        .map(|h| h.point)
                        .or_else(|| self.intersector.origin())
                        .and_then(|p| self.intersector.device_anchor(p)),
                }?;
                self.anchor = Some((target, anchor));
                anchor
            }
        };
        let order = scene.policy_of(target).map_or(0, |p| p.order);
        self.intersector.intersect_captured(target, order, anchor)
    }

    fn track_presses(&mut self, scene: &Scene, captures: &mut CaptureRegistry) {
        let Some(current) = self.intersection.map(|i| i.point) else {
            return;
        };
        let threshold = self.options.click_threshold;
        let mut drag_target = None;
        for press in &mut self.presses {
            if let Some(start) = press.point {
                press.travel = press.travel.max(start.distance(current));
            }
            if press.travel > threshold {
                drag_target = drag_target.or(press.target);
            }
        }
        if self.options.implicit_capture
            && let Some(target) = drag_target
            && captures.get(self.id).is_none()
        {
            captures.capture(scene, self.id, self.pointer_type(), target);
        }
    }

    fn event_target(&self, scene: &Scene, captures: &mut CaptureRegistry) -> Option<NodeId> {
        captures
            .captured(scene, self.id)
            .or_else(|| self.intersection.map(|i| i.object))
            .filter(|t| scene.is_alive(*t))
    }

    fn emit_transitions(
        &self,
        scene: &Scene,
        transitions: Vec<HoverTransition<NodeId>>,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        for transition in transitions {
            let (kind, node) = match transition {
                HoverTransition::Out(n) => (PointerEventKind::Out, n),
                HoverTransition::Leave(n) => (PointerEventKind::Leave, n),
                HoverTransition::Over(n) => (PointerEventKind::Over, n),
                HoverTransition::Enter(n) => (PointerEventKind::Enter, n),
            };
            if scene.is_alive(node) {
                out.push(self.event(kind, node, None, time));
            }
        }
    }

    fn event(
        &self,
        kind: PointerEventKind,
        target: NodeId,
        button: Option<Button>,
        time: f64,
    ) -> PointerEvent {
        PointerEvent {
            kind,
            pointer_id: self.id,
            pointer_type: self.pointer_type(),
            target,
            intersection: self.intersection,
            button,
            buttons: self.buttons,
            wheel_delta: None,
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersector::RayOptions;
    use reticle_scene::{EventKinds, SceneNode, Shape, Transform};
    use PointerEventKind::*;

    struct Fixture {
        scene: Scene,
        captures: CaptureRegistry,
        pointer: Pointer,
        group: NodeId,
        a: NodeId,
        b: NodeId,
    }

    // A group at the origin holding two boxes side by side at z = -3.
    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let group = scene.insert(None, SceneNode::default());
        let boxed = |x: f32| SceneNode {
            transform: Transform::from_translation(Vec3::new(x, 0.0, -3.0)),
            shape: Some(Shape::cuboid(Vec3::splat(1.0))),
            ..Default::default()
        };
        let a = scene.insert(Some(group), boxed(0.0));
        let b = scene.insert(Some(group), boxed(2.0));
        scene.add_listener(group, EventKinds::all());
        scene.commit();
        let mut pointer = Pointer::with_id(
            PointerId::from_raw(1),
            Intersector::ray(RayOptions::default()),
            PointerOptions::default(),
        );
        pointer.set_space(Some(Affine3A::IDENTITY));
        Fixture {
            scene,
            captures: CaptureRegistry::new(),
            pointer,
            group,
            a,
            b,
        }
    }

    fn kinds(events: &[PointerEvent]) -> Vec<(PointerEventKind, NodeId)> {
        events.iter().map(|e| (e.kind, e.target)).collect()
    }

    impl Fixture {
        fn aim_at(&mut self, x: f32, z: f32) {
            self.pointer
                .set_space(Some(Affine3A::from_translation(Vec3::new(x, 0.0, z))));
        }

        fn frame(&mut self, time: f64) -> Vec<PointerEvent> {
            let mut out = Vec::new();
            self.pointer
                .move_to(&self.scene, &mut self.captures, time, &mut out);
            out
        }

        fn press(&mut self, button: Button, time: f64) -> Vec<PointerEvent> {
            let mut out = Vec::new();
            self.pointer
                .down(button, &self.scene, &mut self.captures, time, &mut out);
            out
        }

        fn release(&mut self, button: Button, time: f64) -> Vec<PointerEvent> {
            let mut out = Vec::new();
            self.pointer
                .up(button, &self.scene, &mut self.captures, time, &mut out);
            out
        }
    }

    #[test]
    fn approaching_while_pressed_moves_without_hover_churn() {
        let mut f = fixture();
        f.aim_at(0.0, -0.5);
        let first = f.frame(0.0);
        assert_eq!(
            kinds(&first),
            vec![(Over, f.a), (Enter, f.group), (Enter, f.a), (Move, f.a)]
        );
        assert!((f.pointer.intersection().unwrap().distance - 2.0).abs() < 1e-5);

        assert_eq!(kinds(&f.press(Button::Primary, 0.0)), vec![(Down, f.a)]);

        f.aim_at(0.0, -1.5);
        let second = f.frame(1.0 / 60.0);
        assert_eq!(kinds(&second), vec![(Move, f.a)]);
        assert!((f.pointer.intersection().unwrap().distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn moving_between_siblings_keeps_shared_ancestor() {
        let mut f = fixture();
        f.frame(0.0);
        f.aim_at(2.0, 0.0);
        assert_eq!(
            kinds(&f.frame(0.1)),
            vec![(Out, f.a), (Leave, f.a), (Over, f.b), (Enter, f.b), (Move, f.b)]
        );
    }

    #[test]
    fn click_and_double_click() {
        let mut f = fixture();
        f.frame(0.0);
        f.press(Button::Primary, 0.0);
        assert_eq!(
            kinds(&f.release(Button::Primary, 0.1)),
            vec![(Up, f.a), (Click, f.a)]
        );
        f.press(Button::Primary, 0.2);
        assert_eq!(
            kinds(&f.release(Button::Primary, 0.3)),
            vec![(Up, f.a), (Click, f.a), (DoubleClick, f.a)]
        );
        f.press(Button::Primary, 5.0);
        assert_eq!(
            kinds(&f.release(Button::Primary, 5.1)),
            vec![(Up, f.a), (Click, f.a)]
        );
    }

    #[test]
    fn secondary_click_is_context_menu() {
        let mut f = fixture();
        f.frame(0.0);
        f.press(Button::Secondary, 0.0);
        assert_eq!(
            kinds(&f.release(Button::Secondary, 0.1)),
            vec![(Up, f.a), (ContextMenu, f.a)]
        );
    }

    #[test]
    fn drag_past_threshold_suppresses_click() {
        let mut f = fixture();
        f.frame(0.0);
        f.press(Button::Primary, 0.0);
        f.aim_at(0.3, 0.0);
        f.frame(0.1);
        f.aim_at(0.0, 0.0);
        f.frame(0.2);
        assert_eq!(kinds(&f.release(Button::Primary, 0.3)), vec![(Up, f.a)]);
    }

    #[test]
    fn capture_redirects_moves_but_not_hover() {
        let mut f = fixture();
        f.frame(0.0);
        f.press(Button::Primary, 0.0);
        assert!(f.captures.capture(&f.scene, f.pointer.id(), PointerType::Ray, f.a));

        f.aim_at(2.0, 0.0);
        assert_eq!(
            kinds(&f.frame(0.1)),
            vec![(Out, f.a), (Leave, f.a), (Over, f.b), (Enter, f.b), (Move, f.a)]
        );
        let captured = f.pointer.intersection().unwrap();
        assert_eq!(captured.object, f.a);
        assert!((captured.point - Vec3::new(2.0, 0.0, -2.5)).length() < 1e-5);
        assert_eq!(f.pointer.hit().unwrap().object, f.b);

        // Released over `b`: `Up` goes to the capture owner, no click on either.
        assert_eq!(kinds(&f.release(Button::Primary, 0.2)), vec![(Up, f.a)]);
        assert!(f.captures.is_empty());
    }

    #[test]
    fn implicit_capture_after_drag() {
        let mut f = fixture();
        f.pointer.set_options(PointerOptions {
            implicit_capture: true,
            ..Default::default()
        });
        f.frame(0.0);
        f.press(Button::Primary, 0.0);
        f.aim_at(0.4, 0.0);
        f.frame(0.1);
        assert_eq!(f.captures.get(f.pointer.id()), Some(f.a));
    }

    #[test]
    fn cancel_emits_cancel_then_leaves_and_releases() {
        let mut f = fixture();
        f.frame(0.0);
        f.press(Button::Primary, 0.0);
        f.captures.capture(&f.scene, f.pointer.id(), PointerType::Ray, f.a);
        let mut out = Vec::new();
        f.pointer.cancel(&f.scene, &mut f.captures, 0.1, &mut out);
        assert_eq!(
            kinds(&out),
            vec![(Cancel, f.a), (Out, f.a), (Leave, f.a), (Leave, f.group)]
        );
        assert!(f.captures.is_empty());
        assert!(f.pointer.buttons().is_empty());
        assert!(f.pointer.intersection().is_none());
    }

    #[test]
    fn lost_pose_is_a_quiet_miss() {
        let mut f = fixture();
        f.frame(0.0);
        f.pointer.set_space(None);
        let events = f.frame(0.1);
        assert_eq!(kinds(&events), vec![(Out, f.a), (Leave, f.a), (Leave, f.group)]);
        assert!(f.pointer.intersection().is_none());
        assert!(f.pointer.sample().is_none());
    }

    #[test]
    fn removed_capture_target_falls_back_to_hit() {
        let mut f = fixture();
        f.frame(0.0);
        f.press(Button::Primary, 0.0);
        f.captures.capture(&f.scene, f.pointer.id(), PointerType::Ray, f.b);
        f.scene.remove(f.b);
        f.scene.commit();
        assert_eq!(kinds(&f.frame(0.1)), vec![(Move, f.a)]);
        assert!(f.captures.is_empty());
    }
}
