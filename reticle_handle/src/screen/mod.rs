// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen camera controls: orbit, pan, zoom and map layouts.
//!
//! [`ScreenControls`] consumes the same native events as a
//! [`ForwardedRouter`](reticle_pointer::ForwardedRouter) and drives a
//! [`ScreenCameraStore`]. Each control is the handle pipeline run against the
//! camera as a virtual target, so it damps and reports `first` and `last` exactly
//! like a handle does.

mod camera;
mod controls;

pub use camera::{CameraLimits, CameraState, ScreenCameraStore};
pub use controls::{
    ControlKind, ControlLayout, ControlOptions, PressedPointer, ScreenControls,
    filter_for_one_pointer_left_click, filter_for_one_pointer_right_click_or_two_pointer,
};
