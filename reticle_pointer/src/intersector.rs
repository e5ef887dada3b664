// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device-specific hit testing.
//!
//! ## Overview
//!
//! An [`Intersector`] owns the cast geometry of one device, expressed in the
//! device's space (a world transform supplied every frame with
//! [`Intersector::set_space`]). One pass looks like:
//!
//! 1) [`start_intersection`](Intersector::start_intersection) clears transient state.
//! 2) [`prepare_intersection`](Intersector::prepare_intersection) derives world cast parameters;
//!    it fails (no intersection this frame) when the space is missing or not finite.
//! 3) [`execute_intersection`](Intersector::execute_intersection) runs once per candidate node
//!    in scene order and keeps the best hit so far.
//! 4) [`finalize_intersection`](Intersector::finalize_intersection) returns the winner.
//!
//! ## Ranking
//!
//! Hits are ranked by [`HitRank`]: a strictly higher `pointer_events_order` always wins,
//! equal order falls back to the nearest distance, and exact ties keep the last candidate.
//! A winning *blocker* (a node that occludes but has no listeners) produces no intersection.

use glam::{Affine3A, Mat3, Vec3};
use reticle_scene::{
    Candidacy, NodeFlags, NodeId, PointerPolicy, PointerType, Scene, SceneNode, Shape,
};

use crate::types::{Intersection, IntersectionDetails};

/// Ranking key of a hit. Greater is better.
///
/// Precondition: `distance` should be finite; NaN distances compare equal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitRank {
    /// Effective `pointer_events_order`; higher wins regardless of distance.
    pub order: i32,
    /// Distance from the pointer origin; lower wins among equal order.
    pub distance: f32,
}

impl Eq for HitRank {}

impl Ord for HitRank {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.order.cmp(&other.order).then_with(|| {
            other
                .distance
                .partial_cmp(&self.distance)
                .unwrap_or(core::cmp::Ordering::Equal)
        })
    }
}

impl PartialOrd for HitRank {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(Ord::cmp(self, other))
    }
}

/// Options of a straight ray.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RayOptions {
    /// Ray direction in device space.
    pub direction: Vec3,
    /// Hits nearer than this are ignored.
    pub min_distance: f32,
    /// Hits farther than this are ignored.
    pub max_distance: f32,
}

impl Default for RayOptions {
    fn default() -> Self {
        Self {
            direction: Vec3::NEG_Z,
            min_distance: 0.0,
            max_distance: f32::MAX,
        }
    }
}

/// Options of a polyline cast.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LineOptions {
    /// Polyline points in device space; at least two.
    pub points: Vec<Vec3>,
    /// Hits nearer than this (measured along the line) are ignored.
    pub min_distance: f32,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            points: vec![Vec3::ZERO, Vec3::NEG_Z],
            min_distance: 0.0,
        }
    }
}

/// Options of a touch or grab sphere.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SphereOptions {
    /// World radius around the device origin.
    pub radius: f32,
}

/// Cast geometry of an intersector.
#[derive(Clone, Debug, PartialEq)]
pub enum IntersectorKind {
    /// Straight ray.
    Ray(RayOptions),
    /// Polyline.
    Line(LineOptions),
    /// Fingertip sphere.
    Touch(SphereOptions),
    /// Grab sphere.
    Grab(SphereOptions),
}

#[derive(Clone, Debug)]
enum Prepared {
    Ray {
        origin: Vec3,
        direction: Vec3,
        min_distance: f32,
        max_distance: f32,
    },
    Line {
        points: Vec<Vec3>,
        min_distance: f32,
    },
    Sphere {
        center: Vec3,
        radius: f32,
    },
}

#[derive(Copy, Clone, Debug)]
struct Candidate {
    rank: HitRank,
    candidacy: Candidacy,
    hit: Intersection,
}

/// Hit-testing strategy of one device.
#[derive(Clone, Debug)]
pub struct Intersector {
    kind: IntersectorKind,
    pointer_type: PointerType,
    space: Option<Affine3A>,
    prepared: Option<Prepared>,
    best: Option<Candidate>,
}

impl Intersector {
    fn with_kind(kind: IntersectorKind, pointer_type: PointerType) -> Self {
        Self {
            kind,
            pointer_type,
            space: None,
            prepared: None,
            best: None,
        }
    }

    /// A ray intersector reporting [`PointerType::Ray`].
    pub fn ray(options: RayOptions) -> Self {
        Self::with_kind(IntersectorKind::Ray(options), PointerType::Ray)
    }

    /// A polyline intersector reporting [`PointerType::Line`].
    pub fn line(options: LineOptions) -> Self {
        Self::with_kind(IntersectorKind::Line(options), PointerType::Line)
    }

    /// A fingertip sphere reporting [`PointerType::Touch`].
    pub fn touch(options: SphereOptions) -> Self {
        Self::with_kind(IntersectorKind::Touch(options), PointerType::Touch)
    }

    /// A grab sphere reporting [`PointerType::Grab`].
    pub fn grab(options: SphereOptions) -> Self {
        Self::with_kind(IntersectorKind::Grab(options), PointerType::Grab)
    }

    /// Override the pointer type used for policy filtering (for example screen rays).
    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }

    /// Cast geometry.
    pub fn kind(&self) -> &IntersectorKind {
        &self.kind
    }

    /// Mutable cast geometry, for example to bend a line every frame.
    pub fn kind_mut(&mut self) -> &mut IntersectorKind {
        &mut self.kind
    }

    /// Pointer type used for policy filtering.
    pub fn pointer_type(&self) -> PointerType {
        self.pointer_type
    }

    /// Set the device space (device → world). `None` means the pose is not tracked.
    pub fn set_space(&mut self, space: Option<Affine3A>) {
        self.space = space;
    }

    /// Current device space.
    pub fn space(&self) -> Option<Affine3A> {
        self.space
    }

    /// Returns true if the device pose is resolvable this frame.
    pub fn is_ready(&self) -> bool {
        self.space.is_some_and(|s| s.is_finite())
    }

    /// World-space origin of the device.
    pub fn origin(&self) -> Option<Vec3> {
        self.space
            .filter(Affine3A::is_finite)
            .map(|s| s.translation.into())
    }

    /// Reset transient state before a pass.
    pub fn start_intersection(&mut self) {
        self.prepared = None;
        self.best = None;
    }

    /// Compute world cast parameters from the device space.
    ///
    /// Returns false (and leaves the pass empty) if the space is not resolvable.
    pub fn prepare_intersection(&mut self) -> bool {
        self.prepared = None;
        let Some(space) = self.space.filter(Affine3A::is_finite) else {
            return false;
        };
        let origin: Vec3 = space.translation.into();
        self.prepared = match &self.kind {
            IntersectorKind::Ray(options) => {
                let direction = space.transform_vector3(options.direction).normalize_or_zero();
                if direction == Vec3::ZERO {
                    return false;
                }
                Some(Prepared::Ray {
                    origin,
                    direction,
                    min_distance: options.min_distance,
                    max_distance: options.max_distance,
                })
            }
            IntersectorKind::Line(options) => {
                if options.points.len() < 2 {
                    return false;
                }
                let points = options
                    .points
                    .iter()
                    .map(|p| space.transform_point3(*p))
                    .collect();
                Some(Prepared::Line {
                    points,
                    min_distance: options.min_distance,
                })
            }
            IntersectorKind::Touch(options) | IntersectorKind::Grab(options) => {
                Some(Prepared::Sphere {
                    center: origin,
                    radius: options.radius,
                })
            }
        };
        true
    }

    /// Test one node and keep it if it outranks the best hit so far.
    pub fn execute_intersection(
        &mut self,
        scene: &Scene,
        node: NodeId,
        local: &SceneNode,
        policy: &PointerPolicy,
    ) {
        if local.flags.contains(NodeFlags::VOID) {
            return;
        }
        let Some(shape) = local.shape else {
            return;
        };
        let Some(candidacy) = policy.candidacy(self.pointer_type) else {
            return;
        };
        let Some(prepared) = &self.prepared else {
            return;
        };
        let Some(world) = scene.world_transform(node) else {
            return;
        };
        let inverse = world.inverse();
        if !inverse.is_finite() {
            return;
        }
        let Some(hit) = cast(prepared, &shape, &world, &inverse, node, policy.order) else {
            return;
        };
        let rank = HitRank {
            order: policy.order,
            distance: hit.distance,
        };
        if self.best.is_none_or(|b| rank >= b.rank) {
            self.best = Some(Candidate {
                rank,
                candidacy,
                hit,
            });
        }
    }

    /// Return the winning intersection and clear all pass state.
    pub fn finalize_intersection(&mut self) -> Option<Intersection> {
        self.prepared = None;
        let best = self.best.take()?;
        match best.candidacy {
            Candidacy::Target => Some(best.hit),
            Candidacy::Blocker => None,
        }
    }

    /// Express a world point in device space, for anchoring a capture.
    pub fn device_anchor(&self, world_point: Vec3) -> Option<Vec3> {
        let space = self.space.filter(Affine3A::is_finite)?;
        let local = space.inverse().transform_point3(world_point);
        local.is_finite().then_some(local)
    }

    /// Re-derive the intersection of a captured `target` from a device-space anchor.
    ///
    /// The anchor moves rigidly with the device, so a captured ray keeps the
    /// distance it had when the capture started.
    pub fn intersect_captured(
        &self,
        target: NodeId,
        order: i32,
        anchor: Vec3,
    ) -> Option<Intersection> {
        let space = self.space.filter(Affine3A::is_finite)?;
        let origin: Vec3 = space.translation.into();
        let point = space.transform_point3(anchor);
        Some(Intersection {
            distance: point.distance(origin),
            point,
            normal: None,
            object: target,
            face: None,
            pointer_events_order: order,
            origin,
            details: IntersectionDetails::Captured,
        })
    }
}

fn world_normal(inverse: &Affine3A, local: Vec3) -> Vec3 {
    (Mat3::from(inverse.matrix3).transpose() * local).normalize_or(local)
}

fn cast(
    prepared: &Prepared,
    shape: &Shape,
    world: &Affine3A,
    inverse: &Affine3A,
    object: NodeId,
    order: i32,
) -> Option<Intersection> {
    match prepared {
        Prepared::Ray {
            origin,
            direction,
            min_distance,
            max_distance,
        } => {
            let local = shape.cast_ray(
                inverse.transform_point3(*origin),
                inverse.transform_vector3(*direction),
            )?;
            if local.t < *min_distance || local.t > *max_distance {
                return None;
            }
            Some(Intersection {
                distance: local.t,
                point: *origin + *direction * local.t,
                normal: Some(world_normal(inverse, local.normal)),
                object,
                face: local.face,
                pointer_events_order: order,
                origin: *origin,
                details: IntersectionDetails::Ray {
                    direction: *direction,
                },
            })
        }
        Prepared::Line {
            points,
            min_distance,
        } => {
            let mut travelled = 0.0;
            for (segment, pair) in points.windows(2).enumerate() {
                let (a, b) = (pair[0], pair[1]);
                let span = b - a;
                let length = span.length();
                if length <= f32::EPSILON {
                    continue;
                }
                let hit = shape
                    .cast_ray(inverse.transform_point3(a), inverse.transform_vector3(span))
                    .filter(|h| h.t <= 1.0)
                    .filter(|h| travelled + h.t * length >= *min_distance);
                if let Some(local) = hit {
                    return Some(Intersection {
                        distance: travelled + local.t * length,
                        point: a + span * local.t,
                        normal: Some(world_normal(inverse, local.normal)),
                        object,
                        face: local.face,
                        pointer_events_order: order,
                        origin: points[0],
                        details: IntersectionDetails::Line { segment },
                    });
                }
                travelled += length;
            }
            None
        }
        Prepared::Sphere { center, radius } => {
            let closest = shape.closest_point(inverse.transform_point3(*center));
            let point = world.transform_point3(closest);
            let gap = point.distance(*center);
            if gap.is_nan() || gap > *radius {
                return None;
            }
            let normal = (gap > f32::EPSILON).then(|| (*center - point) / gap);
            Some(Intersection {
                distance: gap,
                point,
                normal,
                object,
                face: None,
                pointer_events_order: order,
                origin: *center,
                details: IntersectionDetails::Sphere { radius: *radius },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use reticle_scene::{EventKinds, PointerEvents, Transform};

    fn sphere_at(scene: &mut Scene, z: f32, order: Option<i32>) -> NodeId {
        let id = scene.insert(
            None,
            SceneNode {
                transform: Transform::from_translation(Vec3::new(0.0, 0.0, z)),
                shape: Some(Shape::sphere(0.5)),
                pointer_events_order: order,
                ..Default::default()
            },
        );
        scene.add_listener(id, EventKinds::CLICK);
        id
    }

    fn run(intersector: &mut Intersector, scene: &Scene) -> Option<Intersection> {
        intersector.start_intersection();
        if !intersector.prepare_intersection() {
            return None;
        }
        scene.visit(|id, node, policy| intersector.execute_intersection(scene, id, node, policy));
        intersector.finalize_intersection()
    }

    fn ray_from_origin() -> Intersector {
        let mut ray = Intersector::ray(RayOptions::default());
        ray.set_space(Some(Affine3A::IDENTITY));
        ray
    }

    #[test]
    fn rank_orders_by_order_then_distance() {
        let near = HitRank { order: 0, distance: 1.0 };
        let far = HitRank { order: 0, distance: 5.0 };
        let far_high = HitRank { order: 1, distance: 50.0 };
        assert!(near > far);
        assert!(far_high > near);
    }

    #[test]
    fn nearest_wins_among_equal_order() {
        let mut scene = Scene::new();
        let _far = sphere_at(&mut scene, -5.0, None);
        let near = sphere_at(&mut scene, -2.0, None);
        scene.commit();
        let hit = run(&mut ray_from_origin(), &scene).unwrap();
        assert_eq!(hit.object, near);
        assert!((hit.distance - 1.5).abs() < 1e-5);
        assert!((hit.normal.unwrap() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn higher_order_beats_distance() {
        let mut scene = Scene::new();
        let far = sphere_at(&mut scene, -9.0, Some(1));
        let _near = sphere_at(&mut scene, -2.0, None);
        scene.commit();
        assert_eq!(run(&mut ray_from_origin(), &scene).unwrap().object, far);
    }

    #[test]
    fn exact_tie_keeps_last_candidate() {
        let mut scene = Scene::new();
        let _first = sphere_at(&mut scene, -3.0, None);
        let second = sphere_at(&mut scene, -3.0, None);
        scene.commit();
        assert_eq!(run(&mut ray_from_origin(), &scene).unwrap().object, second);
    }

    #[test]
    fn blocker_without_listeners_hides_target_behind() {
        let mut scene = Scene::new();
        let _behind = sphere_at(&mut scene, -5.0, None);
        let wall = scene.insert(
            None,
            SceneNode {
                transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
                shape: Some(Shape::cuboid(Vec3::new(4.0, 4.0, 0.1))),
                ..Default::default()
            },
        );
        scene.commit();
        assert!(run(&mut ray_from_origin(), &scene).is_none());

        scene.set_pointer_events(wall, Some(PointerEvents::ListenerAndPassthrough));
        assert!(run(&mut ray_from_origin(), &scene).is_some());
    }

    #[test]
    fn void_nodes_neither_hit_nor_block() {
        let mut scene = Scene::new();
        let behind = sphere_at(&mut scene, -5.0, None);
        let void = sphere_at(&mut scene, -2.0, None);
        scene.set_flags(void, NodeFlags::VISIBLE | NodeFlags::VOID);
        scene.commit();
        assert_eq!(run(&mut ray_from_origin(), &scene).unwrap().object, behind);
    }

    #[test]
    fn unresolvable_space_is_not_ready() {
        let mut scene = Scene::new();
        sphere_at(&mut scene, -2.0, None);
        scene.commit();
        let mut ray = Intersector::ray(RayOptions::default());
        assert!(!ray.is_ready());
        assert!(run(&mut ray, &scene).is_none());
        ray.set_space(Some(Affine3A::from_translation(Vec3::new(f32::NAN, 0.0, 0.0))));
        assert!(!ray.is_ready());
        assert!(run(&mut ray, &scene).is_none());
    }

    #[test]
    fn max_distance_limits_ray() {
        let mut scene = Scene::new();
        sphere_at(&mut scene, -5.0, None);
        scene.commit();
        let mut ray = Intersector::ray(RayOptions {
            max_distance: 3.0,
            ..Default::default()
        });
        ray.set_space(Some(Affine3A::IDENTITY));
        assert!(run(&mut ray, &scene).is_none());
    }

    #[test]
    fn line_measures_distance_along_segments() {
        let mut scene = Scene::new();
        let target = sphere_at(&mut scene, 0.0, None);
        scene.set_transform(target, Transform::from_translation(Vec3::new(2.0, -2.0, 0.0)));
        scene.commit();
        let mut line = Intersector::line(LineOptions {
            points: vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, -4.0, 0.0)],
            min_distance: 0.0,
        });
        line.set_space(Some(Affine3A::IDENTITY));
        let hit = run(&mut line, &scene).unwrap();
        assert_eq!(hit.details, IntersectionDetails::Line { segment: 1 });
        assert!((hit.distance - 3.5).abs() < 1e-5);
    }

    #[test]
    fn grab_sphere_reports_gap() {
        let mut scene = Scene::new();
        let target = sphere_at(&mut scene, -0.55, None);
        scene.commit();
        let mut grab = Intersector::grab(SphereOptions { radius: 0.1 });
        grab.set_space(Some(Affine3A::IDENTITY));
        let hit = run(&mut grab, &scene).unwrap();
        assert_eq!(hit.object, target);
        assert!((hit.distance - 0.05).abs() < 1e-5);

        grab.set_space(Some(Affine3A::from_translation(Vec3::new(0.0, 0.0, 1.0))));
        assert!(run(&mut grab, &scene).is_none());
    }

    #[test]
    fn captured_anchor_follows_device() {
        let mut ray = ray_from_origin();
        let anchor = ray.device_anchor(Vec3::new(0.0, 0.0, -2.0)).unwrap();
        ray.set_space(Some(Affine3A::from_rotation_translation(
            Quat::from_rotation_y(core::f32::consts::FRAC_PI_2),
            Vec3::new(1.0, 0.0, 0.0),
        )));
        let mut scene = Scene::new();
        let node = scene.insert(None, SceneNode::default());
        let hit = ray.intersect_captured(node, 0, anchor).unwrap();
        assert!((hit.point - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert_eq!(hit.details, IntersectionDetails::Captured);
    }
}
