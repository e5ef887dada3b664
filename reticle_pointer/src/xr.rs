// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route XR input sources into pointers, once per frame.
//!
//! ## Overview
//!
//! The session layer hands [`XrRouter::update`] the full list of connected input
//! sources every frame. A source seen for the first time gets a
//! [`CombinedPointer`]:
//!
//! - controller: grab sphere at the grip, then the target ray,
//! - hand: touch sphere at the index fingertip, grab sphere, then the pinch ray,
//! - screen (transient): a single screen-touch ray.
//!
//! `select` maps to [`Button::Primary`] and `squeeze` to [`Button::Secondary`].
//! A hand's touch pointer presses the primary button by proximity: while it is the
//! active child and its gap falls within `touch_down_radius`.
//!
//! A source missing from the list is disconnected in the same tick: its pointers
//! are cancelled and their captures released.

use std::collections::BTreeMap;

use glam::Affine3A;
use reticle_scene::{PointerType, Scene};

use crate::capture::CaptureRegistry;
use crate::combined::CombinedPointer;
use crate::intersector::{Intersector, RayOptions, SphereOptions};
use crate::pointer::{Pointer, PointerOptions};
use crate::types::{Button, Buttons, PointerEvent};

/// Which hand an input source is held in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Handedness {
    /// Not hand-bound.
    #[default]
    None,
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

/// Device shape of an input source and its extra poses.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum XrInputKind {
    /// Tracked controller.
    Controller {
        /// Grip pose, if tracked.
        grip: Option<Affine3A>,
    },
    /// Tracked hand.
    Hand {
        /// Index fingertip pose, if tracked.
        index_tip: Option<Affine3A>,
    },
    /// Transient screen input (a tap on a handheld AR session).
    Screen,
}

/// Button transitions of an input source since the last frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XrInputEvent {
    /// Primary action started.
    SelectStart,
    /// Primary action ended.
    SelectEnd,
    /// Squeeze started.
    SqueezeStart,
    /// Squeeze ended.
    SqueezeEnd,
}

/// One connected input source as reported by the session.
#[derive(Clone, Debug, PartialEq)]
pub struct XrInputSource {
    /// Stable identity of the source while it stays connected.
    pub handle: u64,
    /// Handedness.
    pub handedness: Handedness,
    /// Device shape.
    pub kind: XrInputKind,
    /// Target ray pose, if tracked.
    pub target_ray: Option<Affine3A>,
    /// Button transitions this frame, in order.
    pub events: Vec<XrInputEvent>,
}

/// Options of the pointers an [`XrRouter`] creates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct XrPointerOptions {
    /// Ray options of controller, pinch and screen rays.
    pub ray: RayOptions,
    /// Radius of grab spheres.
    pub grab_radius: f32,
    /// Radius within which a fingertip touch pointer hovers.
    pub touch_radius: f32,
    /// Gap within which a fingertip touch pointer presses.
    pub touch_down_radius: f32,
    /// Options of every created pointer.
    pub pointer: PointerOptions,
}

impl Default for XrPointerOptions {
    fn default() -> Self {
        Self {
            ray: RayOptions::default(),
            grab_radius: 0.07,
            touch_radius: 0.1,
            touch_down_radius: 0.03,
            pointer: PointerOptions::default(),
        }
    }
}

#[derive(Clone, Debug)]
struct XrDevice {
    pointer: CombinedPointer,
    touch: Option<usize>,
    touch_pressed: bool,
}

impl XrDevice {
    fn new(source: &XrInputSource, options: &XrPointerOptions) -> Self {
        let ray = |pointer_type| {
            Pointer::new(
                Intersector::ray(options.ray.clone()).with_pointer_type(pointer_type),
                options.pointer,
            )
        };
        let grab = || {
            Pointer::new(
                Intersector::grab(SphereOptions {
                    radius: options.grab_radius,
                }),
                options.pointer,
            )
        };
        let (children, touch) = match source.kind {
            XrInputKind::Controller { .. } => (vec![grab(), ray(PointerType::Ray)], None),
            XrInputKind::Hand { .. } => {
                let touch = Pointer::new(
                    Intersector::touch(SphereOptions {
                        radius: options.touch_radius,
                    }),
                    options.pointer,
                );
                (vec![touch, grab(), ray(PointerType::Ray)], Some(0))
            }
            XrInputKind::Screen => (vec![ray(PointerType::ScreenTouch)], None),
        };
        Self {
            pointer: CombinedPointer::new(children),
            touch,
            touch_pressed: false,
        }
    }

    // Child spaces follow the child layout chosen in `new`.
    fn set_spaces(&mut self, source: &XrInputSource) {
        let spaces: Vec<Option<Affine3A>> = match source.kind {
            XrInputKind::Controller { grip } => vec![grip.or(source.target_ray), source.target_ray],
            XrInputKind::Hand { index_tip } => vec![index_tip, index_tip, source.target_ray],
            XrInputKind::Screen => vec![source.target_ray],
        };
        for (index, space) in spaces.into_iter().enumerate() {
            if let Some(child) = self.pointer.child_mut(index) {
                child.set_space(space);
            }
        }
    }

    fn touch_within(&self, radius: f32) -> bool {
        let Some(index) = self.touch else {
            return false;
        };
        self.pointer.active_index() == Some(index)
            && self
                .pointer
                .active()
                .and_then(Pointer::hit)
                .is_some_and(|hit| hit.distance <= radius)
    }
}

/// XR input sources → combined pointers.
#[derive(Clone, Debug, Default)]
pub struct XrRouter {
    options: XrPointerOptions,
    devices: BTreeMap<u64, XrDevice>,
}

impl XrRouter {
    /// Create a router.
    pub fn new(options: XrPointerOptions) -> Self {
        Self {
            options,
            devices: BTreeMap::new(),
        }
    }

    /// Options used for newly connected sources.
    pub fn options(&self) -> &XrPointerOptions {
        &self.options
    }

    /// Combined pointer of a connected source.
    pub fn device(&self, handle: u64) -> Option<&CombinedPointer> {
        self.devices.get(&handle).map(|d| &d.pointer)
    }

    /// Every pointer of every connected source.
    pub fn pointers(&self) -> impl Iterator<Item = &Pointer> + '_ {
        self.devices.values().flat_map(|d| d.pointer.children())
    }

    /// Process this frame's input-source list.
    pub fn update(
        &mut self,
        time: f64,
        sources: &[XrInputSource],
        scene: &Scene,
        captures: &mut CaptureRegistry,
        out: &mut Vec<PointerEvent>,
    ) {
        let gone: Vec<u64> = self
            .devices
            .keys()
            .copied()
            .filter(|handle| sources.iter().all(|s| s.handle != *handle))
            .collect();
        for handle in gone {
            if let Some(mut device) = self.devices.remove(&handle) {
                device.pointer.cancel(scene, captures, time, out);
                log::debug!("xr source {handle} disconnected");
            }
        }

        for source in sources {
            let options = &self.options;
            let device = self.devices.entry(source.handle).or_insert_with(|| {
                log::debug!(
                    "xr source {} connected ({:?}, {:?})",
                    source.handle,
                    source.kind,
                    source.handedness
                );
                XrDevice::new(source, options)
            });
            device.set_spaces(source);
            device.pointer.move_to(scene, captures, time, out);

            for event in &source.events {
                let (button, pressed) = match event {
                    XrInputEvent::SelectStart => (Button::Primary, true),
                    XrInputEvent::SelectEnd => (Button::Primary, false),
                    XrInputEvent::SqueezeStart => (Button::Secondary, true),
                    XrInputEvent::SqueezeEnd => (Button::Secondary, false),
                };
                if pressed {
                    device.pointer.down(button, scene, captures, time, out);
                } else {
                    device.pointer.up(button, scene, captures, time, out);
                }
            }

            let touching = device.touch_within(self.options.touch_down_radius);
            if touching && !device.touch_pressed {
                device.pointer.down(Button::Primary, scene, captures, time, out);
                device.touch_pressed = true;
            } else if !touching && device.touch_pressed {
                device.pointer.up(Button::Primary, scene, captures, time, out);
                device.touch_pressed = false;
            }
            if device.touch_pressed
                && device
                    .pointer
                    .active()
                    .is_none_or(|p| !p.buttons().contains(Buttons::PRIMARY))
            {
                device.touch_pressed = false;
            }
        }
    }

    /// Cancel every pointer and forget every source.
    pub fn destroy(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        time: f64,
        out: &mut Vec<PointerEvent>,
    ) {
        for (_, mut device) in core::mem::take(&mut self.devices) {
            device.pointer.cancel(scene, captures, time, out);
        }
        log::debug!("xr router destroyed");
    }
}
