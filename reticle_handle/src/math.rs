// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rotation fitting and restriction helpers.

use glam::{DMat4, DVec4, EulerRot, Quat, Vec3};

use crate::options::AxisFlags;

/// Smallest rotation taking direction `from` to direction `to`.
///
/// Degenerate (zero-length) inputs give the identity.
pub fn shortest_arc(from: Vec3, to: Vec3) -> Quat {
    let (Some(from), Some(to)) = (from.try_normalize(), to.try_normalize()) else {
        return Quat::IDENTITY;
    };
    Quat::from_rotation_arc(from, to)
}

/// Mean of `points`, or zero for an empty slice.
pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::ZERO;
    }
    #[allow(
        clippy::cast_precision_loss,
        reason = "Pointer counts are tiny."
    )]
    let n = points.len() as f32;
    points.iter().copied().sum::<Vec3>() / n
}

/// Root mean square distance of `points` from their centroid.
pub fn rms_spread(points: &[Vec3]) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    let c = centroid(points);
    #[allow(
        clippy::cast_precision_loss,
        reason = "Pointer counts are tiny."
    )]
    let n = points.len() as f32;
    (points.iter().map(|p| p.distance_squared(c)).sum::<f32>() / n).sqrt()
}

/// Least-squares rotation taking `from` onto `to` (Horn's quaternion method).
///
/// Both point sets are centered first. The rotation is the dominant eigenvector of
/// Horn's 4×4 matrix, found by repeated squaring after shifting the spectrum to be
/// non-negative. Mismatched lengths or a non-finite result give the identity.
pub fn horn_fit(from: &[Vec3], to: &[Vec3]) -> Quat {
    if from.len() != to.len() || from.is_empty() {
        return Quat::IDENTITY;
    }
    let ca = centroid(from).as_dvec3();
    let cb = centroid(to).as_dvec3();
    let mut s = [[0.0_f64; 3]; 3];
    for (a, b) in from.iter().zip(to) {
        let a = a.as_dvec3() - ca;
        let b = b.as_dvec3() - cb;
        let (a, b) = (a.to_array(), b.to_array());
        for i in 0..3 {
            for j in 0..3 {
                s[i][j] += a[i] * b[j];
            }
        }
    }
    let [[sxx, sxy, sxz], [syx, syy, syz], [szx, szy, szz]] = s;
    // Columns of a symmetric matrix, ordered (w, x, y, z).
    let n = DMat4::from_cols(
        DVec4::new(sxx + syy + szz, syz - szy, szx - sxz, sxy - syx),
        DVec4::new(syz - szy, sxx - syy - szz, sxy + syx, szx + sxz),
        DVec4::new(szx - sxz, sxy + syx, -sxx + syy - szz, syz + szy),
        DVec4::new(sxy - syx, szx + sxz, syz + szy, -sxx - syy + szz),
    );
    let shift = frobenius(&n);
    if !(shift.is_finite() && shift > f64::EPSILON) {
        return Quat::IDENTITY;
    }
    let mut p = n + DMat4::from_diagonal(DVec4::splat(shift));
    for _ in 0..32 {
        p = p * p;
        let scale = frobenius(&p);
        if !(scale.is_finite() && scale > 0.0) {
            return Quat::IDENTITY;
        }
        p = p * (1.0 / scale);
    }
    let column = [p.x_axis, p.y_axis, p.z_axis, p.w_axis]
        .into_iter()
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
        .unwrap_or(DVec4::X);
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Quaternion components are in -1..=1."
    )]
    let q = Quat::from_xyzw(
        column.y as f32,
        column.z as f32,
        column.w as f32,
        column.x as f32,
    );
    normalize_or_identity(q)
}

/// Unit quaternion along `q`, or identity when `q` is zero or not finite.
fn normalize_or_identity(q: Quat) -> Quat {
    let length_squared = q.length_squared();
    if length_squared.is_finite() && length_squared > f32::EPSILON {
        q.normalize()
    } else {
        Quat::IDENTITY
    }
}

fn frobenius(m: &DMat4) -> f64 {
    m.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Keep only the rotation about the enabled local axes.
///
/// One axis keeps the twist about it; two axes zero the third XYZ Euler angle.
pub fn restrict_rotation(rotation: Quat, axes: AxisFlags) -> Quat {
    if axes == AxisFlags::all() {
        return rotation;
    }
    if axes.is_empty() {
        return Quat::IDENTITY;
    }
    let single = [AxisFlags::X, AxisFlags::Y, AxisFlags::Z]
        .iter()
        .position(|a| *a == axes);
    if let Some(index) = single {
        let axis = Vec3::AXES[index];
        let projected = axis * rotation.xyz().dot(axis);
        let twist = Quat::from_xyzw(projected.x, projected.y, projected.z, rotation.w);
        return normalize_or_identity(twist);
    }
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Quat::from_euler(
        EulerRot::XYZ,
        if axes.contains(AxisFlags::X) { x } else { 0.0 },
        if axes.contains(AxisFlags::Y) { y } else { 0.0 },
        if axes.contains(AxisFlags::Z) { z } else { 0.0 },
    )
}

/// Clamp the XYZ Euler angles of `rotation` to `limits` (radians).
pub fn clamp_euler(rotation: Quat, limits: &[Option<[f32; 2]>; 3]) -> Quat {
    if limits.iter().all(Option::is_none) {
        return rotation;
    }
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    let mut angles = [x, y, z];
    for (angle, limit) in angles.iter_mut().zip(limits) {
        if let Some([min, max]) = *limit
            && min <= max
        {
            *angle = angle.clamp(min, max);
        }
    }
    Quat::from_euler(EulerRot::XYZ, angles[0], angles[1], angles[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    #[test]
    fn horn_recovers_a_known_rotation() {
        let rotation = Quat::from_euler(EulerRot::XYZ, 0.3, -0.7, 1.1);
        let from = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 1.5),
            Vec3::new(-1.0, -1.0, 0.5),
        ];
        let to: Vec<Vec3> = from
            .iter()
            .map(|p| rotation * *p + Vec3::new(3.0, -1.0, 2.0))
            .collect();
        let fit = horn_fit(&from, &to);
        assert!(fit.angle_between(rotation) < 1e-3, "{fit:?} vs {rotation:?}");
    }

    #[test]
    fn horn_quarter_turn_about_z() {
        let from = [Vec3::X, Vec3::Y, Vec3::NEG_X];
        let to = [Vec3::Y, Vec3::NEG_X, Vec3::NEG_Y];
        let fit = horn_fit(&from, &to);
        assert!((fit * Vec3::X - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn horn_degenerate_is_identity() {
        assert_eq!(horn_fit(&[Vec3::ONE; 3], &[Vec3::ONE; 3]), Quat::IDENTITY);
        assert_eq!(horn_fit(&[Vec3::ONE], &[]), Quat::IDENTITY);
    }

    #[test]
    fn spread_and_arc() {
        let points = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        assert_eq!(rms_spread(&points), 1.0);
        let q = shortest_arc(Vec3::X, Vec3::Y);
        assert!((q * Vec3::X - Vec3::Y).length() < 1e-5);
        assert_eq!(shortest_arc(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);
    }

    #[test]
    fn single_axis_keeps_the_twist() {
        let yaw = Quat::from_rotation_y(0.8);
        let tilt = Quat::from_rotation_x(0.3);
        let restricted = restrict_rotation(yaw * tilt, AxisFlags::Y);
        let (_, angle) = restricted.to_axis_angle();
        assert!(restricted.xyz().normalize().dot(Vec3::Y).abs() > 0.999);
        assert!((angle - 0.8).abs() < 0.05);
        assert_eq!(restrict_rotation(yaw, AxisFlags::empty()), Quat::IDENTITY);
    }

    #[test]
    fn perpendicular_half_turn_has_no_twist() {
        let flipped = Quat::from_rotation_x(core::f32::consts::PI);
        assert_eq!(restrict_rotation(flipped, AxisFlags::Y), Quat::IDENTITY);
        assert_eq!(normalize_or_identity(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)), Quat::IDENTITY);
        assert_eq!(normalize_or_identity(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0)), Quat::IDENTITY);
        let half = normalize_or_identity(Quat::from_xyzw(0.0, 2.0, 0.0, 2.0));
        assert!(half.angle_between(Quat::from_rotation_y(FRAC_PI_2)) < 1e-5);
    }

    #[test]
    fn euler_clamp_limits_one_axis() {
        let q = Quat::from_rotation_z(FRAC_PI_2);
        let clamped = clamp_euler(q, &[None, None, Some([-0.5, 0.5])]);
        assert!(clamped.angle_between(Quat::from_rotation_z(0.5)) < 1e-4);
    }
}
