// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local-space collision shapes and their ray / proximity queries.

use glam::Vec3;

/// Collision shape of a node, expressed in the node's local space.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// Sphere centered at the local origin.
    Sphere {
        /// Radius in local units.
        radius: f32,
    },
    /// Axis-aligned box centered at the local origin.
    Cuboid {
        /// Half the box size along each local axis.
        half_extents: Vec3,
    },
}

/// A ray hit in local space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalHit {
    /// Ray parameter: the hit is at `origin + dir * t`.
    pub t: f32,
    /// Hit point.
    pub point: Vec3,
    /// Outward surface normal (unit length).
    pub normal: Vec3,
    /// Face index for polyhedral shapes (`axis * 2`, plus one for the negative side).
    pub face: Option<u32>,
}

impl Shape {
    /// A sphere of the given radius.
    pub const fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// A box of the given full size.
    pub fn cuboid(size: Vec3) -> Self {
        Self::Cuboid {
            half_extents: size * 0.5,
        }
    }

    /// Cast a ray given in local space.
    ///
    /// `dir` does not need to be normalized; the returned `t` is expressed in
    /// multiples of it so that callers can cast a world ray transformed into
    /// local space and read the world distance directly from `t`.
    /// A ray starting inside the shape reports the exit point.
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3) -> Option<LocalHit> {
        match *self {
            Self::Sphere { radius } => cast_sphere(radius, origin, dir),
            Self::Cuboid { half_extents } => cast_cuboid(half_extents, origin, dir),
        }
    }

    /// Closest point of the solid shape to `p`. Points inside map to themselves.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        match *self {
            Self::Sphere { radius } => {
                let len = p.length();
                if len <= radius { p } else { p * (radius / len) }
            }
            Self::Cuboid { half_extents } => p.clamp(-half_extents, half_extents),
        }
    }

    /// Returns true if `p` lies inside or on the shape.
    pub fn contains(&self, p: Vec3) -> bool {
        self.closest_point(p) == p
    }
}

fn cast_sphere(radius: f32, origin: Vec3, dir: Vec3) -> Option<LocalHit> {
    let a = dir.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let half_b = origin.dot(dir);
    let c = origin.length_squared() - radius * radius;
    let disc = half_b * half_b - a * c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = (-half_b - root) / a;
    let far = (-half_b + root) / a;
    let t = if near >= 0.0 {
        near
    } else if far >= 0.0 {
        far
    } else {
        return None;
    };
    let point = origin + dir * t;
    Some(LocalHit {
        t,
        point,
        normal: point.normalize_or(Vec3::Y),
        face: None,
    })
}

fn cast_cuboid(half: Vec3, origin: Vec3, dir: Vec3) -> Option<LocalHit> {
    if dir.length_squared() <= f32::EPSILON {
        return None;
    }
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    let mut near_axis = 0;
    let mut far_axis = 0;
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let h = half[axis];
        if d.abs() <= f32::EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let t0 = (-h - o) / d;
        let t1 = (h - o) / d;
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        if lo > t_near {
            t_near = lo;
            near_axis = axis;
        }
        if hi < t_far {
            t_far = hi;
            far_axis = axis;
        }
    }
    if t_far < t_near.max(0.0) {
        return None;
    }
    // Outside: entry face normal opposes the ray. Inside: exit face normal follows it.
    let (t, axis, sign) = if t_near >= 0.0 {
        (t_near, near_axis, -dir[near_axis].signum())
    } else {
        (t_far, far_axis, dir[far_axis].signum())
    };
    let mut normal = Vec3::ZERO;
    normal[axis] = sign;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "axis is always in 0..3."
    )]
    let face = axis as u32 * 2 + u32::from(sign < 0.0);
    Some(LocalHit {
        t,
        point: origin + dir * t,
        normal,
        face: Some(face),
    })
}
