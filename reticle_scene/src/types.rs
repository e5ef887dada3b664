// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, transforms and pointer policies.

use glam::{Affine3A, Quat, Vec3};

use crate::shape::Shape;

/// Identifier for a node in the scene.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Because stale ids never alias a live node, holders (pointer captures, handles)
/// can keep a `NodeId` as a weak reference and check [`Scene::is_alive`](crate::Scene::is_alive)
/// before use.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot generation of this handle.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct NodeFlags: u8 {
        /// Node is visible. Invisible nodes are skipped together with their subtree.
        const VISIBLE = 0b0000_0001;
        /// Node is a void object: it never becomes a pointer target and never
        /// occludes, but its descendants are still visited.
        const VOID    = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Kind of device a pointer models.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointerType {
    /// Straight ray (XR controller or hand pinch ray).
    Ray,
    /// Polyline cast (curved teleport-style pointer).
    Line,
    /// Fingertip touch sphere.
    Touch,
    /// Grab sphere around a controller grip or pinch point.
    Grab,
    /// Screen mouse projected through a camera.
    ScreenMouse,
    /// Screen touch projected through a camera.
    ScreenTouch,
}

impl PointerType {
    /// The single-bit set containing this type.
    pub const fn as_flag(self) -> PointerTypes {
        match self {
            Self::Ray => PointerTypes::RAY,
            Self::Line => PointerTypes::LINE,
            Self::Touch => PointerTypes::TOUCH,
            Self::Grab => PointerTypes::GRAB,
            Self::ScreenMouse => PointerTypes::SCREEN_MOUSE,
            Self::ScreenTouch => PointerTypes::SCREEN_TOUCH,
        }
    }
}

bitflags::bitflags! {
    /// A set of [`PointerType`]s, used by [`PointerEventsType`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PointerTypes: u8 {
        /// [`PointerType::Ray`].
        const RAY          = 0b0000_0001;
        /// [`PointerType::Line`].
        const LINE         = 0b0000_0010;
        /// [`PointerType::Touch`].
        const TOUCH        = 0b0000_0100;
        /// [`PointerType::Grab`].
        const GRAB         = 0b0000_1000;
        /// [`PointerType::ScreenMouse`].
        const SCREEN_MOUSE = 0b0001_0000;
        /// [`PointerType::ScreenTouch`].
        const SCREEN_TOUCH = 0b0010_0000;
    }
}

/// Whether, and how, a node takes part in pointer hit testing.
///
/// Unset values are inherited from the nearest ancestor that sets one; the
/// scene root default is [`PointerEvents::Listener`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointerEvents {
    /// Target if the node or an ancestor has listeners. Without listeners the
    /// geometry still occludes what lies behind it.
    #[default]
    Listener,
    /// Target if the node or an ancestor has listeners. Without listeners the
    /// geometry is transparent to pointers.
    ListenerAndPassthrough,
    /// Never a target and transparent to pointers.
    None,
}

/// Which pointer types a node accepts. Inherited like [`PointerEvents`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointerEventsType {
    /// Every pointer type.
    #[default]
    All,
    /// Only the listed types.
    Allow(PointerTypes),
    /// Every type except the listed ones.
    Deny(PointerTypes),
}

impl PointerEventsType {
    /// Returns true if pointers of `kind` may interact with the node.
    pub fn accepts(self, kind: PointerType) -> bool {
        match self {
            Self::All => true,
            Self::Allow(set) => set.contains(kind.as_flag()),
            Self::Deny(set) => !set.contains(kind.as_flag()),
        }
    }
}

bitflags::bitflags! {
    /// Pointer event kinds a node listens to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EventKinds: u16 {
        /// `pointerdown`.
        const POINTER_DOWN   = 1 << 0;
        /// `pointerup`.
        const POINTER_UP     = 1 << 1;
        /// `pointermove`.
        const POINTER_MOVE   = 1 << 2;
        /// `pointerenter`.
        const POINTER_ENTER  = 1 << 3;
        /// `pointerleave`.
        const POINTER_LEAVE  = 1 << 4;
        /// `pointerover`.
        const POINTER_OVER   = 1 << 5;
        /// `pointerout`.
        const POINTER_OUT    = 1 << 6;
        /// `click`.
        const CLICK          = 1 << 7;
        /// `dblclick`.
        const DOUBLE_CLICK   = 1 << 8;
        /// `contextmenu`.
        const CONTEXT_MENU   = 1 << 9;
        /// `wheel`.
        const WHEEL          = 1 << 10;
        /// `pointercancel`.
        const POINTER_CANCEL = 1 << 11;
    }
}

/// Decomposed local transform (translation, rotation, scale).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// Translation relative to the parent.
    pub translation: Vec3,
    /// Rotation relative to the parent.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// A pure translation.
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Returns this transform with `rotation` replaced.
    pub const fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns this transform with `scale` replaced.
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Compose into an affine matrix (scale, then rotate, then translate).
    pub fn to_affine(self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose an affine matrix. Shear is not representable and is discarded.
    pub fn from_affine(affine: Affine3A) -> Self {
        let (scale, rotation, translation) = affine.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Returns true if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Local data for a node.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    /// Transform relative to the parent.
    pub transform: Transform,
    /// Optional collision shape in local space. Nodes without a shape are
    /// never hit but still pass their policy on to descendants.
    pub shape: Option<Shape>,
    /// Pointer participation; `None` inherits from the parent.
    pub pointer_events: Option<PointerEvents>,
    /// Accepted pointer types; `None` inherits from the parent.
    pub pointer_events_type: Option<PointerEventsType>,
    /// Priority over distance when ranking hits; `None` inherits from the parent.
    pub pointer_events_order: Option<i32>,
    /// Visibility and void flags.
    pub flags: NodeFlags,
}

/// How a hit on a node is treated by an intersector.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Candidacy {
    /// The node may become the pointer target.
    Target,
    /// The node occludes, but a winning blocker yields no target.
    Blocker,
}

/// Effective pointer policy of a node after inheritance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PointerPolicy {
    /// Effective [`PointerEvents`].
    pub pointer_events: PointerEvents,
    /// Effective [`PointerEventsType`].
    pub pointer_events_type: PointerEventsType,
    /// Effective order; higher always wins over distance.
    pub order: i32,
    /// True if the node or one of its ancestors has listeners.
    pub listening: bool,
}

impl PointerPolicy {
    /// Policy in effect above the scene roots.
    pub const ROOT: Self = Self {
        pointer_events: PointerEvents::Listener,
        pointer_events_type: PointerEventsType::All,
        order: 0,
        listening: false,
    };

    /// Resolve the policy of a child node from its parent's policy.
    pub fn inherit(self, node: &SceneNode, listeners: EventKinds) -> Self {
        Self {
            pointer_events: node.pointer_events.unwrap_or(self.pointer_events),
            pointer_events_type: node.pointer_events_type.unwrap_or(self.pointer_events_type),
            order: node.pointer_events_order.unwrap_or(self.order),
            listening: self.listening || !listeners.is_empty(),
        }
    }

    /// How a pointer of `kind` treats a hit under this policy.
    ///
    /// Returns `None` when the node is transparent for that pointer.
    pub fn candidacy(&self, kind: PointerType) -> Option<Candidacy> {
        if !self.pointer_events_type.accepts(kind) {
            return None;
        }
        match (self.pointer_events, self.listening) {
            (PointerEvents::None, _) => None,
            (PointerEvents::Listener | PointerEvents::ListenerAndPassthrough, true) => {
                Some(Candidacy::Target)
            }
            (PointerEvents::Listener, false) => Some(Candidacy::Blocker),
            (PointerEvents::ListenerAndPassthrough, false) => None,
        }
    }
}

impl Default for PointerPolicy {
    fn default() -> Self {
        Self::ROOT
    }
}
