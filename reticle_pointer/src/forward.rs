// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forward native screen pointer events into the scene through a camera.
//!
//! ## Overview
//!
//! A [`ForwardedRouter`] receives pointer/wheel events in canvas pixels and keeps one
//! logical [`Pointer`] per native pointer id for its whole lifetime. Each event is
//! turned into a world ray through a [`ScreenCamera`].
//!
//! Moves are coalesced by default: only the latest position per pointer is kept and
//! intersected on the next [`ForwardedRouter::update`]. Presses, releases and wheel
//! events flush a pending move first so they act on the latest position.

use std::collections::BTreeMap;

use glam::{Affine3A, Mat4, Quat, Vec3};
use kurbo::{Point, Size};
use reticle_scene::{PointerType, Scene};

use crate::capture::CaptureRegistry;
use crate::intersector::{Intersector, RayOptions};
use crate::pointer::{Pointer, PointerOptions};
use crate::types::{Button, PointerEvent};

/// Projection of canvas pixels into world rays.
///
/// Clip space follows glam's `*_rh` projections (depth in `0..=1`).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenCamera {
    /// Camera → world transform.
    pub world_from_view: Affine3A,
    /// View → clip projection.
    pub clip_from_view: Mat4,
    /// Canvas size in pixels.
    pub viewport: Size,
}

impl ScreenCamera {
    /// A perspective camera.
    pub fn perspective(world_from_view: Affine3A, fov_y: f32, viewport: Size) -> Self {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Viewport sizes fit comfortably in f32."
        )]
        let aspect = (viewport.width / viewport.height.max(1.0)) as f32;
        Self {
            world_from_view,
            clip_from_view: Mat4::perspective_rh(fov_y, aspect.max(f32::EPSILON), 0.01, 1000.0),
            viewport,
        }
    }

    /// Pointer space for a canvas position: origin on the near plane, −Z along the ray.
    ///
    /// Returns `None` for an empty viewport or a degenerate projection.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Normalized device coordinates are in -1..=1."
    )]
    pub fn ray_space(&self, position: Point) -> Option<Affine3A> {
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return None;
        }
        let ndc_x = (2.0 * position.x / self.viewport.width - 1.0) as f32;
        let ndc_y = (1.0 - 2.0 * position.y / self.viewport.height) as f32;
        let view_from_clip = self.clip_from_view.inverse();
        let near = view_from_clip.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let further = view_from_clip.project_point3(Vec3::new(ndc_x, ndc_y, 0.5));
        let origin = self.world_from_view.transform_point3(near);
        let direction = (self.world_from_view.transform_point3(further) - origin).normalize_or_zero();
        if !origin.is_finite() || direction == Vec3::ZERO {
            return None;
        }
        Some(Affine3A::from_rotation_translation(
            Quat::from_rotation_arc(Vec3::NEG_Z, direction),
            origin,
        ))
    }
}

/// Kind of native device.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NativeDevice {
    /// Mouse.
    Mouse,
    /// Pen or stylus.
    Pen,
    /// Touch contact.
    Touch,
}

impl NativeDevice {
    /// Pointer type used for the logical pointer.
    pub const fn pointer_type(self) -> PointerType {
        match self {
            Self::Mouse | Self::Pen => PointerType::ScreenMouse,
            Self::Touch => PointerType::ScreenTouch,
        }
    }
}

/// Native pointer identity and position.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NativePointer {
    /// Native pointer id.
    pub id: u32,
    /// Device kind.
    pub device: NativeDevice,
    /// Canvas position in pixels.
    pub position: Point,
}

/// A native screen event.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NativeEvent {
    /// Pointer moved.
    Move(NativePointer),
    /// Button pressed.
    Down(NativePointer, Button),
    /// Button released.
    Up(NativePointer, Button),
    /// Wheel scrolled, delta in pixels.
    Wheel(NativePointer, kurbo::Vec2),
    /// Pointer left the canvas.
    Leave(NativePointer),
    /// Native pointer cancelled by the platform.
    Cancel {
        /// Native pointer id.
        id: u32,
    },
}

/// Options of a [`ForwardedRouter`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ForwardOptions {
    /// Keep only the latest move per pointer until [`ForwardedRouter::update`].
    pub coalesce_moves: bool,
    /// Re-intersect every pointer over the canvas on every update, for scenes or
    /// cameras that move under a resting cursor.
    pub intersect_every_frame: bool,
    /// Options of every created pointer.
    pub pointer: PointerOptions,
    /// Ray options of every created pointer.
    pub ray: RayOptions,
}

impl Default for ForwardOptions {
    fn default() -> Self {
        Self {
            coalesce_moves: true,
            intersect_every_frame: false,
            pointer: PointerOptions::default(),
            ray: RayOptions::default(),
        }
    }
}

#[derive(Clone, Debug)]
struct Forwarded {
    pointer: Pointer,
    position: Point,
    pending_move: bool,
    // Between the first event at a position and `Leave`, touch `Up` or `Cancel`.
    on_canvas: bool,
}

/// Native screen events → logical pointers.
#[derive(Clone, Debug)]
pub struct ForwardedRouter {
    camera: ScreenCamera,
    options: ForwardOptions,
    pointers: BTreeMap<u32, Forwarded>,
}

impl ForwardedRouter {
    /// Create a router projecting through `camera`.
    pub fn new(camera: ScreenCamera, options: ForwardOptions) -> Self {
        Self {
            camera,
            options,
            pointers: BTreeMap::new(),
        }
    }

    /// Current camera.
    pub fn camera(&self) -> &ScreenCamera {
        &self.camera
    }

    /// Replace the camera (for example after the camera controls moved it).
    pub fn set_camera(&mut self, camera: ScreenCamera) {
        self.camera = camera;
    }

    /// Logical pointer for a native id.
    pub fn native_pointer(&self, native_id: u32) -> Option<&Pointer> {
        self.pointers.get(&native_id).map(|f| &f.pointer)
    }

    /// Every logical pointer.
    pub fn pointers(&self) -> impl Iterator<Item = &Pointer> + '_ {
        self.pointers.values().map(|f| &f.pointer)
    }

    /// Feed one native event.
    pub fn handle(
        &mut self,
        event: NativeEvent,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        let native = match event {
            NativeEvent::Cancel { id } => {
                if let Some(f) = self.pointers.get_mut(&id) {
                    f.pending_move = false;
                    f.on_canvas = false;
                    f.pointer.cancel(scene, captures, time, out);
                }
                return;
            }
            NativeEvent::Move(p)
            | NativeEvent::Down(p, _)
            | NativeEvent::Up(p, _)
            | NativeEvent::Wheel(p, _)
            | NativeEvent::Leave(p) => p,
        };
        let camera = self.camera;
        let coalesce = self.options.coalesce_moves;
        let f = self.forwarded(native);
        let moved = f.position != native.position;
        f.position = native.position;
        f.on_canvas = true;
        match event {
            NativeEvent::Move(_) => {
                f.pending_move = true;
                if !coalesce {
                    f.sync(&camera, scene, captures, time, out);
                }
            }
            NativeEvent::Down(_, button) => {
                f.pending_move |= moved;
                f.sync(&camera, scene, captures, time, out);
                f.pointer.down(button, scene, captures, time, out);
            }
            NativeEvent::Up(_, button) => {
                f.pending_move |= moved;
                f.sync(&camera, scene, captures, time, out);
                f.pointer.up(button, scene, captures, time, out);
                if native.device == NativeDevice::Touch {
                    f.on_canvas = false;
                    f.pointer.leave(scene, time, out);
                }
            }
            NativeEvent::Wheel(_, delta) => {
                f.pending_move |= moved;
                f.sync(&camera, scene, captures, time, out);
                f.pointer.wheel(delta, scene, captures, time, out);
            }
            NativeEvent::Leave(_) => {
                f.pending_move = false;
                f.on_canvas = false;
                f.pointer.leave(scene, time, out);
            }
            NativeEvent::Cancel { .. } => {}
        }
    }

    /// Flush coalesced moves and, if configured, re-intersect every pointer.
    ///
    /// Call once per frame, before updating handles.
    pub fn update(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        for f in self.pointers.values_mut() {
            if f.pending_move {
                f.sync(&self.camera, scene, captures, time, out);
            } else if self.options.intersect_every_frame && f.on_canvas {
                f.pointer.set_space(self.camera.ray_space(f.position));
                f.pointer.intersect(scene, captures, time, out);
            }
        }
    }

    /// Cancel every pointer and release their captures.
    pub fn destroy(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        for (_, mut f) in core::mem::take(&mut self.pointers) {
            f.pointer.cancel(scene, captures, time, out);
        }
        log::debug!("forwarded router destroyed");
    }

    fn forwarded(&mut self, native: NativePointer) -> &mut Forwarded {
        let options = &self.options;
        self.pointers.entry(native.id).or_insert_with(|| {
            let intersector = Intersector::ray(options.ray.clone())
                .with_pointer_type(native.device.pointer_type());
            log::debug!("native pointer {} ({:?}) connected", native.id, native.device);
            Forwarded {
                pointer: Pointer::new(intersector, options.pointer),
                position: native.position,
                pending_move: false,
                on_canvas: false,
            }
        })
    }
}

impl Forwarded {
    // A pending move is delivered as a `Move`; otherwise the pointer is only re-intersected.
    fn sync(
        &mut self,
        camera: &ScreenCamera,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        self.pointer.set_space(camera.ray_space(self.position));
        if core::mem::take(&mut self.pending_move) {
            self.pointer.move_to(scene, captures, time, out);
        } else {
            self.pointer.intersect(scene, captures, time, out);
        }
    }
}
