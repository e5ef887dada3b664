// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer samples to a damped, constrained [`Transform`].
//!
//! This is the part of a handle that does not know what it drives: the
//! [`HandleStore`](crate::HandleStore) runs it against a scene node and the
//! [`screen`](crate::screen) controls run it against a virtual camera target.

use glam::{Quat, Vec3};
use reticle_pointer::PointerSample;
use reticle_scene::Transform;

use crate::gesture::{Gesture, GestureFrame, GesturePhase, Member};
use crate::math;
use crate::options::{AxisFlags, HandleOptions};

#[derive(Clone, Debug)]
pub(crate) struct Anchor<K> {
    pub(crate) transform: Transform,
    pub(crate) samples: Vec<(K, PointerSample)>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Motion {
    pub(crate) initial: Transform,
    pub(crate) applied: Transform,
    pub(crate) goal: Transform,
}

/// Result of one [`Manipulation::step`].
#[derive(Copy, Clone, Debug)]
pub(crate) struct Step {
    pub(crate) frame: GestureFrame,
    /// Transform applied by the previous step.
    pub(crate) previous: Transform,
    pub(crate) motion: Motion,
}

/// Gesture, anchor and damped motion of one driven transform.
#[derive(Clone, Debug)]
pub(crate) struct Manipulation<K> {
    gesture: Gesture<K, PointerSample>,
    anchor: Option<Anchor<K>>,
    motion: Option<Motion>,
}

impl<K> Default for Manipulation<K> {
    fn default() -> Self {
        Self {
            gesture: Gesture::default(),
            anchor: None,
            motion: None,
        }
    }
}

impl<K: Copy + Eq> Manipulation<K> {
    pub(crate) fn gesture(&self) -> &Gesture<K, PointerSample> {
        &self.gesture
    }

    pub(crate) fn gesture_mut(&mut self) -> &mut Gesture<K, PointerSample> {
        &mut self.gesture
    }

    pub(crate) fn is_active(&self) -> bool {
        self.gesture.phase() != GesturePhase::Idle || self.gesture.is_cancelled()
    }

    /// Advance one frame. `initial` is read on the first frame of a gesture; if it
    /// yields nothing the gesture is dropped unreported.
    ///
    /// A cancelled gesture reports its `last` step without moving.
    pub(crate) fn step(
        &mut self,
        options: &HandleOptions,
        initial: impl FnOnce() -> Option<Transform>,
    ) -> Option<Step> {
        let damping = options.effective_damping();
        let settled = damping == 0.0
            || self
                .motion
                .is_none_or(|m| residual(&m.applied, &m.goal) < options.settle_epsilon);
        let frame = self.gesture.advance(settled)?;

        if frame.cancelled {
            self.anchor = None;
            let motion = self.motion.take()?;
            return Some(Step {
                frame,
                previous: motion.applied,
                motion: Motion {
                    goal: motion.applied,
                    ..motion
                },
            });
        }
        if frame.first {
            let Some(initial) = initial() else {
                self.terminate();
                return None;
            };
            self.motion = Some(Motion {
                initial,
                applied: initial,
                goal: initial,
            });
            self.anchor = None;
        }
        let mut motion = self.motion?;

        let members = self.gesture.members();
        if let Some(goal) = self
            .anchor
            .as_ref()
            .and_then(|anchor| solve(anchor, members, options))
        {
            motion.goal = goal;
        }
        if frame.membership_changed || self.anchor.is_none() {
            self.anchor = Some(Anchor {
                transform: motion.goal,
                samples: members.iter().map(|m| (m.key, m.current)).collect(),
            });
        }

        let previous = motion.applied;
        motion.applied = if damping == 0.0 || (frame.last && settled) {
            motion.goal
        } else {
            approach(&motion.applied, &motion.goal, 1.0 - damping)
        };
        if frame.last {
            self.motion = None;
            self.anchor = None;
        } else {
            self.motion = Some(motion);
        }
        Some(Step {
            frame,
            previous,
            motion,
        })
    }

    /// Rewrite the applied, goal and anchor transforms in place, for when the driven
    /// value was changed by something other than this manipulation.
    pub(crate) fn rebase(&mut self, edit: impl Fn(Transform) -> Transform) {
        if let Some(motion) = &mut self.motion {
            motion.applied = edit(motion.applied);
            motion.goal = edit(motion.goal);
        }
        if let Some(anchor) = &mut self.anchor {
            anchor.transform = edit(anchor.transform);
        }
    }

    /// End the gesture; the next step reports its `last`.
    pub(crate) fn cancel(&mut self) {
        self.gesture.cancel();
    }

    /// Drop everything at once. Returns the motion of a gesture that had started.
    pub(crate) fn terminate(&mut self) -> Option<Motion> {
        self.gesture = Gesture::new();
        self.anchor = None;
        self.motion.take()
    }
}

/// Goal transform from the anchor and the members still present in it.
pub(crate) fn solve<K: Copy + Eq>(
    anchor: &Anchor<K>,
    members: &[Member<K, PointerSample>],
    options: &HandleOptions,
) -> Option<Transform> {
    let pairs: Vec<(PointerSample, PointerSample)> = anchor
        .samples
        .iter()
        .filter_map(|(id, from)| {
            members
                .iter()
                .find(|m| m.key == *id)
                .map(|m| (*from, m.current))
        })
        .collect();
    let (from, to) = *pairs.first()?;
    let reference = anchor.transform;

    let (rotation, factor, pivot_from, pivot_to) = if options.multitouch && pairs.len() >= 2 {
        let from: Vec<Vec3> = pairs.iter().map(|(a, _)| a.position).collect();
        let to: Vec<Vec3> = pairs.iter().map(|(_, b)| b.position).collect();
        let rotation = if pairs.len() == 2 {
            math::shortest_arc(from[1] - from[0], to[1] - to[0])
        } else {
            math::horn_fit(&from, &to)
        };
        let spread = math::rms_spread(&from);
        let factor = if spread > f32::EPSILON {
            math::rms_spread(&to) / spread
        } else {
            1.0
        };
        (rotation, factor, math::centroid(&from), math::centroid(&to))
    } else {
        (to.rotation * from.rotation.inverse(), 1.0, from.position, to.position)
    };
    Some(constrain(&reference, rotation, factor, pivot_from, pivot_to, options))
}

/// Apply a rigid motion plus uniform `factor` about a pivot to `reference`, then
/// the axis locks and limits.
fn constrain(
    reference: &Transform,
    rotation: Quat,
    factor: f32,
    pivot_from: Vec3,
    pivot_to: Vec3,
    options: &HandleOptions,
) -> Transform {
    // Locks act on the object's own axes.
    let local = reference.rotation.inverse() * rotation * reference.rotation;
    let local = math::restrict_rotation(local.normalize(), options.rotate.axes);
    let rotation = (reference.rotation * local * reference.rotation.inverse()).normalize();
    let goal_rotation = math::clamp_euler(
        (reference.rotation * local).normalize(),
        &options.rotate.limits,
    );

    let factor = if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    };
    let axes = options.scale.axes;
    let scale = if options.uniform_scale {
        if axes == AxisFlags::all() {
            Vec3::splat(factor)
        } else {
            Vec3::ONE
        }
    } else {
        Vec3::from_array(core::array::from_fn(|i| {
            if axes.contains(AxisFlags::axis(i)) {
                factor
            } else {
                1.0
            }
        }))
    };
    let goal_scale = options.scale.clamp(reference.scale * scale);
    let pivot_factor = if scale.x == scale.y && scale.y == scale.z {
        scale.x
    } else {
        1.0
    };

    let moved = pivot_to + rotation * ((reference.translation - pivot_from) * pivot_factor);
    let mut translation = reference.translation;
    for i in 0..3 {
        if options.translate.axes.contains(AxisFlags::axis(i)) {
            translation[i] = moved[i];
        }
    }
    Transform {
        translation: options.translate.clamp(translation),
        rotation: goal_rotation,
        scale: goal_scale,
    }
}

pub(crate) fn approach(from: &Transform, to: &Transform, k: f32) -> Transform {
    Transform {
        translation: from.translation + (to.translation - from.translation) * k,
        rotation: if from.rotation == to.rotation {
            to.rotation
        } else {
            from.rotation.slerp(to.rotation, k)
        },
        scale: from.scale + (to.scale - from.scale) * k,
    }
}

pub(crate) fn residual(a: &Transform, b: &Transform) -> f32 {
    // The vector part of the relative rotation resolves small angles that a dot
    // product rounds away.
    let turn = 2.0 * (a.rotation.inverse() * b.rotation).xyz().length().min(1.0).asin();
    (a.translation - b.translation)
        .length()
        .max(turn)
        .max((a.scale - b.scale).abs().max_element())
}

/// Change from `previous` to `current`; scale is a ratio.
pub(crate) fn delta(previous: &Transform, current: &Transform) -> Transform {
    let ratio = current.scale / previous.scale;
    Transform {
        translation: current.translation - previous.translation,
        rotation: (current.rotation * previous.rotation.inverse()).normalize(),
        scale: Vec3::select(ratio.is_finite_mask(), ratio, Vec3::ONE),
    }
}
