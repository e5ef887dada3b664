// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: pointer ids, buttons, intersections and synthesized events.

use core::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;
use reticle_scene::{EventKinds, NodeId, PointerType};

static NEXT_POINTER_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a logical pointer.
///
/// Ids come from a process-wide monotonic counter starting at `1`; an id is
/// never handed out twice during the life of the process. Tests and embedders
/// that need deterministic ids can inject one with [`PointerId::from_raw`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointerId(u32);

impl PointerId {
    /// Allocate the next process-wide id.
    pub fn next() -> Self {
        Self(NEXT_POINTER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an explicit id. The counter is not advanced.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// A single pointer button.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Button {
    /// Left mouse button, touch contact, XR select.
    Primary,
    /// Right mouse button, XR squeeze.
    Secondary,
    /// Middle mouse button.
    Auxiliary,
}

impl Button {
    /// The single-bit set containing this button.
    pub const fn as_flag(self) -> Buttons {
        match self {
            Self::Primary => Buttons::PRIMARY,
            Self::Secondary => Buttons::SECONDARY,
            Self::Auxiliary => Buttons::AUXILIARY,
        }
    }
}

bitflags::bitflags! {
    /// Set of pressed buttons.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Buttons: u8 {
        /// [`Button::Primary`].
        const PRIMARY   = 0b001;
        /// [`Button::Secondary`].
        const SECONDARY = 0b010;
        /// [`Button::Auxiliary`].
        const AUXILIARY = 0b100;
    }
}

/// Cast-specific detail of an [`Intersection`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IntersectionDetails {
    /// Hit by a straight ray.
    Ray {
        /// Normalized world direction of the ray.
        direction: Vec3,
    },
    /// Hit by one segment of a polyline.
    Line {
        /// Index of the segment that hit (segment `i` joins points `i` and `i + 1`).
        segment: usize,
    },
    /// Found by a touch or grab sphere.
    Sphere {
        /// World radius of the sphere.
        radius: f32,
    },
    /// Re-derived for a captured target rather than found by hit testing.
    Captured,
}

/// The winning hit of one intersection pass.
///
/// A per-frame snapshot: the pointer replaces it on every pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Intersection {
    /// Distance from the pointer origin; for spheres, the gap to the surface.
    pub distance: f32,
    /// World-space point.
    pub point: Vec3,
    /// World-space surface normal, when the shape defines one at `point`.
    pub normal: Option<Vec3>,
    /// Node that was hit.
    pub object: NodeId,
    /// Face index for polyhedral shapes.
    pub face: Option<u32>,
    /// Effective `pointer_events_order` of `object`.
    pub pointer_events_order: i32,
    /// World-space pointer origin the distance is measured from.
    pub origin: Vec3,
    /// Cast-specific detail.
    pub details: IntersectionDetails,
}

/// Kind of a synthesized pointer event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerEventKind {
    /// `pointerdown`.
    Down,
    /// `pointerup`.
    Up,
    /// `pointermove`.
    Move,
    /// `pointerenter`; does not bubble.
    Enter,
    /// `pointerleave`; does not bubble.
    Leave,
    /// `pointerover`.
    Over,
    /// `pointerout`.
    Out,
    /// `click`.
    Click,
    /// `dblclick`.
    DoubleClick,
    /// `contextmenu`.
    ContextMenu,
    /// `wheel`.
    Wheel,
    /// `pointercancel`.
    Cancel,
}

impl PointerEventKind {
    /// Returns true if the event propagates through capture and bubble phases.
    pub const fn bubbles(self) -> bool {
        !matches!(self, Self::Enter | Self::Leave)
    }

    /// The listener flag matching this kind.
    pub const fn as_flag(self) -> EventKinds {
        match self {
            Self::Down => EventKinds::POINTER_DOWN,
            Self::Up => EventKinds::POINTER_UP,
            Self::Move => EventKinds::POINTER_MOVE,
            Self::Enter => EventKinds::POINTER_ENTER,
            Self::Leave => EventKinds::POINTER_LEAVE,
            Self::Over => EventKinds::POINTER_OVER,
            Self::Out => EventKinds::POINTER_OUT,
            Self::Click => EventKinds::CLICK,
            Self::DoubleClick => EventKinds::DOUBLE_CLICK,
            Self::ContextMenu => EventKinds::CONTEXT_MENU,
            Self::Wheel => EventKinds::WHEEL,
            Self::Cancel => EventKinds::POINTER_CANCEL,
        }
    }
}

/// A synthesized event addressed to one scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Kind of event.
    pub kind: PointerEventKind,
    /// Pointer that produced the event.
    pub pointer_id: PointerId,
    /// Type of that pointer.
    pub pointer_type: PointerType,
    /// Node the event is addressed to.
    pub target: NodeId,
    /// Pointer intersection at the time of the event (captured or hit tested).
    pub intersection: Option<Intersection>,
    /// Button that changed, for down/up/click events.
    pub button: Option<Button>,
    /// Buttons held after the event.
    pub buttons: Buttons,
    /// Scroll delta in pixels, for wheel events.
    pub wheel_delta: Option<kurbo::Vec2>,
    /// Frame time in seconds.
    pub time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_ids_are_monotonic() {
        let a = PointerId::next();
        let b = PointerId::next();
        assert!(b.get() > a.get());
        assert_eq!(PointerId::from_raw(7).get(), 7);
    }

    #[test]
    fn enter_and_leave_do_not_bubble() {
        assert!(!PointerEventKind::Enter.bubbles());
        assert!(!PointerEventKind::Leave.bubbles());
        assert!(PointerEventKind::Over.bubbles());
        assert_eq!(PointerEventKind::Click.as_flag(), EventKinds::CLICK);
    }
}
