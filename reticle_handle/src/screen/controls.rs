// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen gestures to camera manipulations.
//!
//! Each control is a handle manipulation whose target is the camera
//! ([`CameraState::to_transform`]). Screen points are turned into pointer samples
//! against the camera state the control started from: a rotate sample carries the
//! yaw and pitch the drag asks for, a pan sample carries the origin it asks for.
//! Which transform components may change is handle configuration, so the layouts
//! differ only in the [`HandleOptions`] they run with.

use core::f32::consts::FRAC_PI_3;

use glam::{EulerRot, Quat, Vec3};
use kurbo::{Point, Size};
use reticle_pointer::{Buttons, NativeEvent, PointerSample};

use crate::gesture::GestureFrame;
use crate::manipulation::Manipulation;
use crate::options::{AxisFlags, AxisOptions, HandleOptions};
use crate::screen::camera::{CameraState, ScreenCameraStore};

/// Which gesture drives which control.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlLayout {
    /// Left drag rotates; right drag or two pointers pan in the camera plane.
    #[default]
    Orbit,
    /// Left drag pans on the ground plane; right drag or two pointers rotate.
    Map,
}

/// The control a gesture is driving.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ControlKind {
    /// Yaw and pitch.
    Rotate,
    /// Move the origin.
    Pan,
}

impl ControlLayout {
    fn primary(self) -> ControlKind {
        match self {
            Self::Orbit => ControlKind::Rotate,
            Self::Map => ControlKind::Pan,
        }
    }

    fn secondary(self) -> ControlKind {
        match self {
            Self::Orbit => ControlKind::Pan,
            Self::Map => ControlKind::Rotate,
        }
    }
}

/// Options of [`ScreenControls`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlOptions {
    /// Gesture to control mapping.
    pub layout: ControlLayout,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Multiplier on the pan that keeps the grabbed point under the pointer.
    pub pan_speed: f32,
    /// Exponential zoom per wheel pixel.
    pub zoom_speed: f32,
    /// Vertical field of view used to convert pixels to world units.
    pub fov_y: f32,
    /// Let two panning pointers pinch-zoom.
    pub pinch: bool,
    /// Damping of the camera motion, as [`HandleOptions::damping`].
    pub damping: f32,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            layout: ControlLayout::Orbit,
            rotate_speed: 0.005,
            pan_speed: 1.0,
            zoom_speed: 0.001,
            fov_y: FRAC_PI_3,
            pinch: true,
            damping: 0.0,
        }
    }
}

impl ControlOptions {
    /// Handle configuration `kind` runs with against the camera target.
    pub fn handle_options(&self, kind: ControlKind) -> HandleOptions {
        let (translate, rotate, scale, multitouch) = match kind {
            ControlKind::Rotate => (AxisOptions::NONE, AxisOptions::ALL, AxisOptions::NONE, false),
            ControlKind::Pan => (
                match self.layout {
                    ControlLayout::Orbit => AxisOptions::ALL,
                    // Ground plane.
                    ControlLayout::Map => AxisOptions::only(AxisFlags::X | AxisFlags::Z),
                },
                AxisOptions::NONE,
                if self.pinch {
                    AxisOptions::ALL
                } else {
                    AxisOptions::NONE
                },
                true,
            ),
        };
        HandleOptions {
            translate,
            rotate,
            scale,
            uniform_scale: true,
            multitouch,
            damping: self.damping,
            ..HandleOptions::default()
        }
    }
}

/// One pointer pressed and its buttons.
pub type PressedPointer = (u32, Buttons);

/// Exactly one pointer, holding the primary button.
pub fn filter_for_one_pointer_left_click(pointers: &[PressedPointer]) -> bool {
    matches!(pointers, [(_, buttons)] if buttons.contains(Buttons::PRIMARY))
}

/// Exactly one pointer holding the secondary button, or exactly two pointers.
pub fn filter_for_one_pointer_right_click_or_two_pointer(pointers: &[PressedPointer]) -> bool {
    match pointers {
        [(_, buttons)] => buttons.contains(Buttons::SECONDARY),
        [_, _] => true,
        _ => false,
    }
}

// Screen space to sample space, fixed when a control's gesture starts.
#[derive(Copy, Clone, Debug, Default)]
struct Basis {
    camera: CameraState,
    pitch_range: [f32; 2],
    viewport: Size,
}

#[derive(Clone, Debug)]
struct Control {
    kind: ControlKind,
    manipulation: Manipulation<u32>,
    basis: Basis,
    starts: Vec<(u32, Point)>,
}

impl Control {
    fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            manipulation: Manipulation::default(),
            basis: Basis::default(),
            starts: Vec::new(),
        }
    }

    fn sample(&self, id: u32, at: Point, options: &ControlOptions) -> PointerSample {
        let basis = &self.basis;
        let camera = &basis.camera;
        match self.kind {
            ControlKind::Rotate => {
                let start = self
                    .starts
                    .iter()
                    .find(|(s, _)| *s == id)
                    .map_or(at, |(_, p)| *p);
                let (dx, dy) = pixels(at.x - start.x, at.y - start.y);
                // Past +-90 degrees the Euler decomposition flips, so clamp here.
                let [min, max] = basis.pitch_range;
                let pitch = camera.pitch - dy * options.rotate_speed;
                PointerSample {
                    position: camera.origin,
                    rotation: Quat::from_euler(
                        EulerRot::YXZ,
                        camera.yaw - dx * options.rotate_speed,
                        if min <= max { pitch.clamp(min, max) } else { pitch },
                        0.0,
                    ),
                }
            }
            ControlKind::Pan => {
                let center = basis.viewport.to_rect().center();
                let (dx, dy) = pixels(at.x - center.x, at.y - center.y);
                let (height, _) = pixels(basis.viewport.height.max(1.0), 0.0);
                let per_pixel =
                    2.0 * camera.distance * (options.fov_y * 0.5).tan() / height * options.pan_speed;
                let (right, up) = match options.layout {
                    ControlLayout::Orbit => {
                        let rotation = camera.rotation();
                        (rotation * Vec3::X, rotation * Vec3::Y)
                    }
                    ControlLayout::Map => {
                        let heading = Quat::from_rotation_y(camera.yaw);
                        (heading * Vec3::X, heading * Vec3::NEG_Z)
                    }
                };
                // The world follows the pointer, so the origin moves against it.
                // Screen y grows downwards.
                PointerSample {
                    position: camera.origin - right * dx * per_pixel + up * dy * per_pixel,
                    rotation: camera.rotation(),
                }
            }
        }
    }

    // Bring the members in line with the pressed pointers.
    fn sync(
        &mut self,
        pressed: &[(u32, Buttons, Point)],
        camera: &ScreenCameraStore,
        viewport: Size,
        options: &ControlOptions,
    ) {
        if self.manipulation.gesture().members().is_empty() {
            self.basis = Basis {
                camera: *camera.state(),
                pitch_range: camera.limits().pitch,
                viewport,
            };
            self.starts.clear();
        }
        let gone: Vec<u32> = self
            .manipulation
            .gesture()
            .members()
            .iter()
            .map(|m| m.key)
            .filter(|key| pressed.iter().all(|(id, ..)| id != key))
            .collect();
        for key in gone {
            self.manipulation.gesture_mut().remove(key);
            self.starts.retain(|(id, _)| *id != key);
        }
        for (id, _, at) in pressed {
            if !self.starts.iter().any(|(s, _)| s == id) {
                self.starts.push((*id, *at));
            }
            let sample = self.sample(*id, *at, options);
            let gesture = self.manipulation.gesture_mut();
            if !gesture.update_sample(*id, sample) {
                gesture.insert(*id, sample);
            }
        }
    }

    fn release_all(&mut self) {
        let keys: Vec<u32> = self
            .manipulation
            .gesture()
            .members()
            .iter()
            .map(|m| m.key)
            .collect();
        for key in keys {
            self.manipulation.gesture_mut().remove(key);
        }
        self.starts.clear();
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Screen distances fit in f32."
)]
fn pixels(x: f64, y: f64) -> (f32, f32) {
    (x as f32, y as f32)
}

/// Orbit/pan/zoom/map camera controls fed by native screen events.
///
/// Pointer sets are matched against the filters in fixed order on every change, and
/// at most one control is live at a time. Switching controls cancels the previous
/// one, so it reports its `last` frame on the same update the new one reports
/// `first`. Wheel zoom is independent of gestures and composes with them.
#[derive(Clone, Debug)]
pub struct ScreenControls {
    options: ControlOptions,
    pressed: Vec<(u32, Buttons, Point)>,
    live: Option<ControlKind>,
    rotate: Control,
    pan: Control,
    wheel: f64,
}

impl Default for ScreenControls {
    fn default() -> Self {
        Self::new(ControlOptions::default())
    }
}

impl ScreenControls {
    /// Create controls.
    pub fn new(options: ControlOptions) -> Self {
        Self {
            options,
            pressed: Vec::new(),
            live: None,
            rotate: Control::new(ControlKind::Rotate),
            pan: Control::new(ControlKind::Pan),
            wheel: 0.0,
        }
    }

    /// Current options.
    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    /// Replace the options.
    pub fn set_options(&mut self, options: ControlOptions) {
        self.options = options;
    }

    /// The live control.
    pub fn live(&self) -> Option<ControlKind> {
        self.live
    }

    /// Returns true while a control is running or settling.
    pub fn is_active(&self) -> bool {
        self.rotate.manipulation.is_active() || self.pan.manipulation.is_active()
    }

    /// Feed one native event.
    pub fn handle(&mut self, event: &NativeEvent) {
        match *event {
            NativeEvent::Down(p, button) => {
                match self.pressed.iter_mut().find(|(id, ..)| *id == p.id) {
                    Some((_, buttons, position)) => {
                        *buttons |= button.as_flag();
                        *position = p.position;
                    }
                    None => self.pressed.push((p.id, button.as_flag(), p.position)),
                }
                self.reevaluate();
            }
            NativeEvent::Move(p) => {
                if let Some((_, _, position)) = self.pressed.iter_mut().find(|(id, ..)| *id == p.id) {
                    *position = p.position;
                }
            }
            NativeEvent::Up(p, button) => {
                if let Some((_, buttons, _)) = self.pressed.iter_mut().find(|(id, ..)| *id == p.id) {
                    buttons.remove(button.as_flag());
                }
                self.pressed.retain(|(_, buttons, _)| !buttons.is_empty());
                self.reevaluate();
            }
            NativeEvent::Wheel(_, delta) => self.wheel += delta.y,
            NativeEvent::Leave(p) => self.release(p.id),
            NativeEvent::Cancel { id } => self.release(id),
        }
    }

    fn release(&mut self, id: u32) {
        self.pressed.retain(|(pressed, ..)| *pressed != id);
        self.reevaluate();
    }

    fn reevaluate(&mut self) {
        let set: Vec<PressedPointer> = self.pressed.iter().map(|(id, b, _)| (*id, *b)).collect();
        let kind = if filter_for_one_pointer_left_click(&set) {
            Some(self.options.layout.primary())
        } else if filter_for_one_pointer_right_click_or_two_pointer(&set) {
            Some(self.options.layout.secondary())
        } else {
            None
        };
        if kind != self.live {
            log::debug!("screen control {:?} -> {kind:?}", self.live);
            self.live = kind;
        }
    }

    /// Apply wheel zoom and the controls to `camera`, once per frame.
    ///
    /// Returns the frame of every control that ran; a control that was switched
    /// away from comes before the live one.
    pub fn update(
        &mut self,
        camera: &mut ScreenCameraStore,
        viewport: Size,
    ) -> Vec<(ControlKind, GestureFrame)> {
        let wheel = core::mem::take(&mut self.wheel);
        if wheel != 0.0 {
            let (steps, _) = pixels(wheel, 0.0);
            let mut state = *camera.state();
            state.distance *= (steps * self.options.zoom_speed).exp();
            camera.set(state);
            let scale = Vec3::splat(camera.state().distance.recip());
            for control in [&mut self.rotate, &mut self.pan] {
                control.manipulation.rebase(|t| t.with_scale(scale));
            }
        }

        let live = self.live;
        let options = self.options;
        let pressed = &self.pressed;
        let mut order = [&mut self.rotate, &mut self.pan];
        order.sort_by_key(|control| Some(control.kind) == live);

        let mut frames = Vec::new();
        for control in order {
            if Some(control.kind) == live {
                control.sync(pressed, camera, viewport, &options);
            } else if live.is_some() && control.manipulation.is_active() {
                control.manipulation.cancel();
                control.starts.clear();
            } else {
                control.release_all();
            }

            let initial = camera.state().to_transform();
            let Some(step) = control
                .manipulation
                .step(&options.handle_options(control.kind), || Some(initial))
            else {
                continue;
            };
            if !step.frame.cancelled {
                camera.set(CameraState::from_transform(&step.motion.applied));
                let limits = *camera.limits();
                let current = *camera.state();
                control.manipulation.rebase(|t| {
                    limits
                        .apply(CameraState::from_transform(&t), &current)
                        .to_transform()
                });
            }
            frames.push((control.kind, step.frame));
        }
        frames
    }
}
