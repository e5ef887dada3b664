// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generic gesture lifecycle shared by handles and camera controls.
//!
//! A gesture is a set of members (pointers) with a join-time and a current sample
//! each. It moves through `Idle → Active → (Settling) → Idle`:
//!
//! - the first member joining starts it; the next [`Gesture::advance`] reports `first`,
//! - while members remain, every advance reports an active frame,
//! - once the last member leaves it settles until the caller reports it settled, and
//!   that advance reports `last`.
//!
//! `first` and `last` are reported exactly once per gesture, including when it is
//! cut short by [`Gesture::cancel`]. Members inserted after a cancel belong to a new
//! gesture: the next advance reports the cancelled `last`, the one after that `first`.

/// Lifecycle phase of a [`Gesture`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GesturePhase {
    /// No gesture.
    #[default]
    Idle,
    /// At least one member.
    Active,
    /// Every member left; the driven value is still converging.
    Settling,
}

/// What an [`Gesture::advance`] call reports.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct GestureFrame {
    /// First frame of the gesture.
    pub first: bool,
    /// Last frame of the gesture.
    pub last: bool,
    /// Members joined or left since the previous frame.
    pub membership_changed: bool,
    /// The gesture was cut short by [`Gesture::cancel`]; always paired with `last`.
    pub cancelled: bool,
}

/// One member of a gesture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Member<K, S> {
    /// Member key.
    pub key: K,
    /// Sample when it joined.
    pub join: S,
    /// Latest sample.
    pub current: S,
}

/// Gesture lifecycle over members keyed by `K` carrying samples `S`.
#[derive(Clone, Debug)]
pub struct Gesture<K, S> {
    members: Vec<Member<K, S>>,
    phase: GesturePhase,
    started: bool,
    changed: bool,
    cancelled: bool,
}

impl<K, S> Default for Gesture<K, S> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            phase: GesturePhase::Idle,
            started: false,
            changed: false,
            cancelled: false,
        }
    }
}

impl<K: Copy + Eq, S: Copy> Gesture<K, S> {
    /// Create an idle gesture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Members in join order; the first one is the primary member.
    pub fn members(&self) -> &[Member<K, S>] {
        &self.members
    }

    /// Returns true if `key` is a member.
    pub fn contains(&self, key: K) -> bool {
        self.members.iter().any(|m| m.key == key)
    }

    /// Add a member. Returns false if it already was one.
    pub fn insert(&mut self, key: K, sample: S) -> bool {
        if self.contains(key) {
            return false;
        }
        self.members.push(Member {
            key,
            join: sample,
            current: sample,
        });
        self.changed = true;
        if !self.cancelled {
            self.phase = GesturePhase::Active;
        }
        true
    }

    /// Remove a member. Returns false if it was not one.
    pub fn remove(&mut self, key: K) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.key != key);
        if self.members.len() == before {
            return false;
        }
        self.changed = true;
        if self.members.is_empty() && !self.started {
            // Joined and left between two frames: nothing was ever reported.
            self.reset();
        }
        true
    }

    /// Update the current sample of a member.
    pub fn update_sample(&mut self, key: K, sample: S) -> bool {
        match self.members.iter_mut().find(|m| m.key == key) {
            Some(member) => {
                member.current = sample;
                true
            }
            None => false,
        }
    }

    /// Returns true if a cancelled `last` is waiting to be reported.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// End the gesture now; the next advance reports `last` if it had started.
    pub fn cancel(&mut self) {
        self.members.clear();
        if self.started {
            self.cancelled = true;
            self.phase = GesturePhase::Settling;
        } else {
            self.reset();
        }
    }

    /// Step one frame. `settled` tells whether the driven value reached its goal.
    ///
    /// Returns `None` while idle.
    pub fn advance(&mut self, settled: bool) -> Option<GestureFrame> {
        if self.cancelled {
            // Close the cut gesture; members that joined since start the next one.
            self.cancelled = false;
            self.started = false;
            if self.members.is_empty() {
                self.reset();
            } else {
                self.changed = true;
                self.phase = GesturePhase::Active;
            }
            return Some(GestureFrame {
                first: false,
                last: true,
                membership_changed: true,
                cancelled: true,
            });
        }
        let membership_changed = core::mem::take(&mut self.changed);
        match self.phase {
            GesturePhase::Idle => None,
            GesturePhase::Active | GesturePhase::Settling if !self.members.is_empty() => {
                let first = !self.started;
                self.started = true;
                self.phase = GesturePhase::Active;
                Some(GestureFrame {
                    first,
                    last: false,
                    membership_changed,
                    cancelled: false,
                })
            }
            GesturePhase::Active | GesturePhase::Settling => {
                let last = settled;
                if last {
                    self.reset();
                } else {
                    self.phase = GesturePhase::Settling;
                }
                Some(GestureFrame {
                    first: false,
                    last,
                    membership_changed,
                    cancelled: false,
                })
            }
        }
    }

    fn reset(&mut self) {
        self.members.clear();
        self.phase = GesturePhase::Idle;
        self.started = false;
        self.changed = false;
        self.cancelled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(g: &mut Gesture<u32, f32>, settled: bool, n: usize) -> Vec<GestureFrame> {
        (0..n).filter_map(|_| g.advance(settled)).collect()
    }

    #[test]
    fn first_and_last_once() {
        let mut g: Gesture<u32, f32> = Gesture::new();
        assert!(g.advance(true).is_none());
        g.insert(1, 0.0);
        g.insert(2, 0.0);
        let active = frames(&mut g, true, 3);
        assert_eq!(active.iter().filter(|f| f.first).count(), 1);
        assert!(active[0].membership_changed);
        assert!(!active[1].membership_changed);

        g.remove(1);
        assert!(g.advance(true).is_some_and(|f| f.membership_changed && !f.last));
        g.remove(2);
        let tail = frames(&mut g, false, 2);
        assert!(tail.iter().all(|f| !f.last));
        assert_eq!(g.phase(), GesturePhase::Settling);
        assert!(g.advance(true).is_some_and(|f| f.last));
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert!(g.advance(true).is_none());
    }

    #[test]
    fn rejoin_while_settling_continues_the_gesture() {
        let mut g: Gesture<u32, f32> = Gesture::new();
        g.insert(1, 0.0);
        assert!(g.advance(true).is_some_and(|f| f.first));
        g.remove(1);
        assert!(g.advance(false).is_some_and(|f| !f.last));
        g.insert(3, 1.0);
        assert!(g.advance(false).is_some_and(|f| !f.first && !f.last));
    }

    #[test]
    fn cancel_reports_last_even_unsettled() {
        let mut g: Gesture<u32, f32> = Gesture::new();
        g.insert(1, 0.0);
        let _ = g.advance(true);
        g.cancel();
        assert!(g.advance(false).is_some_and(|f| f.last && f.cancelled));
        assert!(g.advance(false).is_none());
    }

    #[test]
    fn rejoin_after_cancel_starts_a_new_gesture() {
        let mut g: Gesture<u32, f32> = Gesture::new();
        g.insert(1, 0.0);
        assert!(g.advance(true).is_some_and(|f| f.first));
        g.cancel();
        g.insert(1, 4.0);
        g.insert(2, 5.0);
        assert!(g.is_cancelled());
        let closing = g.advance(false).unwrap();
        assert!(closing.last && closing.cancelled && !closing.first);
        assert_eq!(g.members().len(), 2);
        let opening = g.advance(false).unwrap();
        assert!(opening.first && !opening.last && opening.membership_changed);
        assert_eq!(g.members()[0].join, 4.0);
        g.remove(1);
        g.remove(2);
        assert!(g.advance(true).is_some_and(|f| f.last && !f.cancelled));
        assert!(g.advance(true).is_none());
    }

    #[test]
    fn cancel_before_start_reports_nothing() {
        let mut g: Gesture<u32, f32> = Gesture::new();
        g.insert(1, 0.0);
        g.cancel();
        g.insert(2, 1.0);
        assert!(g.advance(true).is_some_and(|f| f.first && !f.last));
    }

    #[test]
    fn unreported_gesture_is_dropped() {
        let mut g: Gesture<u32, f32> = Gesture::new();
        g.insert(1, 0.0);
        g.remove(1);
        assert!(g.advance(true).is_none());
    }

    #[test]
    fn samples_keep_join_time() {
        let mut g: Gesture<u32, f32> = Gesture::new();
        g.insert(1, 0.5);
        g.update_sample(1, 2.0);
        assert_eq!(g.members()[0].join, 0.5);
        assert_eq!(g.members()[0].current, 2.0);
        assert!(!g.update_sample(9, 1.0));
    }
}
