// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::f32::consts::FRAC_PI_2;

use glam::{Affine3A, EulerRot, Quat, Vec3};
use kurbo::Size;
use reticle_pointer::ScreenCamera;
use reticle_scene::Transform;

use crate::store::Subscription;

/// Virtual camera target: the camera sits `distance` behind `origin`, turned by
/// `yaw` (about +Y) and `pitch` (about the turned +X).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraState {
    /// Point the camera looks at.
    pub origin: Vec3,
    /// Distance from `origin` to the camera.
    pub distance: f32,
    /// Yaw in radians.
    pub yaw: f32,
    /// Pitch in radians; negative looks down.
    pub pitch: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            distance: 5.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl CameraState {
    /// Camera orientation.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Camera position.
    pub fn position(&self) -> Vec3 {
        self.origin + self.rotation() * Vec3::Z * self.distance
    }

    /// Camera → world transform.
    pub fn world_from_view(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rotation(), self.position())
    }

    /// The camera as a handle target: translation is `origin`, rotation is yaw then
    /// pitch, and the uniform scale is `1 / distance`, so spreading pointers apart
    /// brings the camera closer.
    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.origin,
            rotation: self.rotation(),
            scale: Vec3::splat(self.distance.recip()),
        }
    }

    /// Inverse of [`to_transform`](Self::to_transform). Roll is dropped.
    pub fn from_transform(transform: &Transform) -> Self {
        let (yaw, pitch, _) = transform.rotation.to_euler(EulerRot::YXZ);
        Self {
            origin: transform.translation,
            distance: transform.scale.x.recip(),
            yaw,
            pitch,
        }
    }

    /// Perspective [`ScreenCamera`] for forwarding screen events through this camera.
    pub fn screen_camera(&self, fov_y: f32, viewport: Size) -> ScreenCamera {
        ScreenCamera::perspective(self.world_from_view(), fov_y, viewport)
    }
}

/// Bounds a [`ScreenCameraStore`] keeps its state within.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CameraLimits {
    /// Distance range.
    pub distance: [f32; 2],
    /// Pitch range in radians.
    pub pitch: [f32; 2],
    /// Optional yaw range in radians.
    pub yaw: Option<[f32; 2]>,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            distance: [0.1, 1000.0],
            pitch: [-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01],
            yaw: None,
        }
    }
}

impl CameraLimits {
    /// Clamp `state` into the limits. Non-finite components keep `fallback`'s value.
    pub fn apply(&self, state: CameraState, fallback: &CameraState) -> CameraState {
        let clamp = |value: f32, [min, max]: [f32; 2], fallback: f32| {
            if !value.is_finite() {
                fallback
            } else if min <= max {
                value.clamp(min, max)
            } else {
                value
            }
        };
        CameraState {
            origin: if state.origin.is_finite() {
                state.origin
            } else {
                fallback.origin
            },
            distance: clamp(state.distance, self.distance, fallback.distance),
            pitch: clamp(state.pitch, self.pitch, fallback.pitch),
            yaw: match self.yaw {
                Some(range) => clamp(state.yaw, range, fallback.yaw),
                None if state.yaw.is_finite() => state.yaw,
                None => fallback.yaw,
            },
        }
    }
}

type CameraCallback = Box<dyn FnMut(&CameraState)>;

/// Owns the camera state, its limits and the observers of its changes.
pub struct ScreenCameraStore {
    state: CameraState,
    limits: CameraLimits,
    subscribers: Vec<(Subscription, CameraCallback)>,
    next_subscription: u32,
}

impl core::fmt::Debug for ScreenCameraStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScreenCameraStore")
            .field("state", &self.state)
            .field("limits", &self.limits)
            .field("subscribers", &self.subscribers.len())
            .field("next_subscription", &self.next_subscription)
            .finish()
    }
}

impl Default for ScreenCameraStore {
    fn default() -> Self {
        Self::new(CameraState::default(), CameraLimits::default())
    }
}

impl ScreenCameraStore {
    /// Create a store; `state` is clamped into `limits`.
    pub fn new(state: CameraState, limits: CameraLimits) -> Self {
        Self {
            state: limits.apply(state, &CameraState::default()),
            limits,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Current limits.
    pub fn limits(&self) -> &CameraLimits {
        &self.limits
    }

    /// Replace the limits and re-clamp the state.
    pub fn set_limits(&mut self, limits: CameraLimits) {
        self.limits = limits;
        self.set(self.state);
    }

    /// Set the state (clamped). Subscribers run only if it changed.
    pub fn set(&mut self, state: CameraState) {
        let state = self.limits.apply(state, &self.state);
        if state == self.state {
            return;
        }
        self.state = state;
        log::trace!("camera state {state:?}");
        for (_, callback) in &mut self.subscribers {
            callback(&state);
        }
    }

    /// Call `callback` after every change.
    pub fn subscribe(&mut self, callback: impl FnMut(&CameraState) + 'static) -> Subscription {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((subscription, Box::new(callback)));
        subscription
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != subscription);
        before != self.subscribers.len()
    }
}
