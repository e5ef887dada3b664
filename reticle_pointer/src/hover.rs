// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover tracking: turn a change of hovered path into over/out/enter/leave transitions.
//!
//! ## Ordering
//!
//! For a change from path `old` to path `new` (both root→target) the
//! transitions come out as:
//!
//! 1) `Out(old target)` if the deepest node changed,
//! 2) `Leave` for each node of `old` below the common ancestor, inner→outer,
//! 3) `Over(new target)` if the deepest node changed,
//! 4) `Enter` for each node of `new` below the common ancestor, outer→inner.
//!
//! ```
//! use reticle_pointer::hover::{HoverState, HoverTransition};
//! let mut h: HoverState<u32> = HoverState::new();
//! assert_eq!(
//!     h.update_path(&[1, 2]),
//!     vec![HoverTransition::Over(2), HoverTransition::Enter(1), HoverTransition::Enter(2)]
//! );
//! assert_eq!(
//!     h.update_path(&[1, 3]),
//!     vec![
//!         HoverTransition::Out(2),
//!         HoverTransition::Leave(2),
//!         HoverTransition::Over(3),
//!         HoverTransition::Enter(3),
//!     ]
//! );
//! ```

/// One hover transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoverTransition<K> {
    /// The previous deepest node lost the pointer (bubbles).
    Out(K),
    /// The pointer left this node and its subtree.
    Leave(K),
    /// The new deepest node gained the pointer (bubbles).
    Over(K),
    /// The pointer entered this node.
    Enter(K),
}

/// The currently hovered root→target path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverState<K> {
    path: Vec<K>,
}

impl<K> Default for HoverState<K> {
    fn default() -> Self {
        Self { path: Vec::new() }
    }
}

impl<K: Copy + Eq> HoverState<K> {
    /// Create a state with nothing hovered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hovered root→target path.
    pub fn path(&self) -> &[K] {
        &self.path
    }

    /// Deepest hovered node.
    pub fn target(&self) -> Option<K> {
        self.path.last().copied()
    }

    /// Forget the hovered path, returning `Out` followed by the leaves.
    pub fn clear(&mut self) -> Vec<HoverTransition<K>> {
        self.update_path(&[])
    }

    /// Move to `new_path` and return the transitions in dispatch order.
    pub fn update_path(&mut self, new_path: &[K]) -> Vec<HoverTransition<K>> {
        let shared = self
            .path
            .iter()
            .zip(new_path)
            .take_while(|(a, b)| a == b)
            .count();
        let old_target = self.target();
        let new_target = new_path.last().copied();
        let retarget = old_target != new_target;

        let mut out = Vec::new();
        if retarget && let Some(t) = old_target {
            out.push(HoverTransition::Out(t));
        }
        out.extend(self.path[shared..].iter().rev().map(|&k| HoverTransition::Leave(k)));
        if retarget && let Some(t) = new_target {
            out.push(HoverTransition::Over(t));
        }
        out.extend(new_path[shared..].iter().map(|&k| HoverTransition::Enter(k)));

        self.path.clear();
        self.path.extend_from_slice(new_path);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HoverTransition::*;

    #[test]
    fn unchanged_path_is_silent() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update_path(&[7, 8]);
        assert!(h.update_path(&[7, 8]).is_empty());
    }

    #[test]
    fn moving_to_a_descendant_enters_without_leaving() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update_path(&[1, 2]);
        assert_eq!(h.update_path(&[1, 2, 3]), vec![Out(2), Over(3), Enter(3)]);
        assert_eq!(h.target(), Some(3));
    }

    #[test]
    fn deep_branch_change_leaves_inner_first() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update_path(&[1, 2, 3, 4, 5]);
        assert_eq!(
            h.update_path(&[1, 2, 3, 9, 10]),
            vec![Out(5), Leave(5), Leave(4), Over(10), Enter(9), Enter(10)]
        );
    }

    #[test]
    fn clear_leaves_everything() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update_path(&[1, 2]);
        assert_eq!(h.clear(), vec![Out(2), Leave(2), Leave(1)]);
        assert!(h.path().is_empty());
        assert!(h.clear().is_empty());
    }
}
