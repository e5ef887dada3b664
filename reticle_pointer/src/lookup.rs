// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::combined::CombinedPointer;
use crate::forward::ForwardedRouter;
use crate::pointer::Pointer;
use crate::types::PointerId;
use crate::xr::XrRouter;

/// Find a live pointer by id.
///
/// Handle stores read pointer samples through this trait, so any owner of pointers
/// (a router, a slice, a pair of routers) can feed them.
pub trait PointerLookup {
    /// The pointer with `id`, if this owner has it.
    fn pointer(&self, id: PointerId) -> Option<&Pointer>;
}

impl PointerLookup for Pointer {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        (self.id() == id).then_some(self)
    }
}

impl PointerLookup for [Pointer] {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.iter().find(|p| p.id() == id)
    }
}

impl PointerLookup for Vec<Pointer> {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.as_slice().pointer(id)
    }
}

impl PointerLookup for CombinedPointer {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.children().pointer(id)
    }
}

impl PointerLookup for ForwardedRouter {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers().find(|p| p.id() == id)
    }
}

impl PointerLookup for XrRouter {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers().find(|p| p.id() == id)
    }
}

impl<T: PointerLookup + ?Sized> PointerLookup for &T {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        (**self).pointer(id)
    }
}

impl<A: PointerLookup, B: PointerLookup> PointerLookup for (A, B) {
    fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.0.pointer(id).or_else(|| self.1.pointer(id))
    }
}
