// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handle configuration.
//!
//! Options are plain data and are re-read on every update, so changing them in the
//! middle of a gesture takes effect on the next frame.

bitflags::bitflags! {
    /// A set of local axes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AxisFlags: u8 {
        /// X axis.
        const X = 0b001;
        /// Y axis.
        const Y = 0b010;
        /// Z axis.
        const Z = 0b100;
    }
}

impl AxisFlags {
    /// Flag of axis `index` (0 = X, 1 = Y, 2 = Z).
    pub const fn axis(index: usize) -> Self {
        match index {
            0 => Self::X,
            1 => Self::Y,
            _ => Self::Z,
        }
    }
}

/// Enabled axes and optional per-axis `[min, max]` limits of one transform component.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AxisOptions {
    /// Axes the component may change along.
    pub axes: AxisFlags,
    /// Limits per axis. For rotation these are XYZ Euler angles in radians.
    pub limits: [Option<[f32; 2]>; 3],
}

impl AxisOptions {
    /// Every axis free, no limits.
    pub const ALL: Self = Self {
        axes: AxisFlags::all(),
        limits: [None; 3],
    };

    /// Component disabled.
    pub const NONE: Self = Self {
        axes: AxisFlags::empty(),
        limits: [None; 3],
    };

    /// Only `axes` enabled.
    pub const fn only(axes: AxisFlags) -> Self {
        Self {
            axes,
            limits: [None; 3],
        }
    }

    /// Limit axis `index` to `[min, max]`.
    pub const fn with_limit(mut self, index: usize, min: f32, max: f32) -> Self {
        if index < 3 {
            self.limits[index] = Some([min, max]);
        }
        self
    }

    /// Clamp a vector to the limits of its axes.
    pub fn clamp(&self, mut v: glam::Vec3) -> glam::Vec3 {
        for (i, limit) in self.limits.iter().enumerate() {
            if let Some([min, max]) = *limit
                && min <= max
            {
                v[i] = v[i].clamp(min, max);
            }
        }
        v
    }
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self::ALL
    }
}

/// Configuration of a [`HandleStore`](crate::HandleStore).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandleOptions {
    /// Translation axes and limits (parent-local units).
    pub translate: AxisOptions,
    /// Rotation axes (object-local) and Euler limits.
    pub rotate: AxisOptions,
    /// Scale axes and limits.
    pub scale: AxisOptions,
    /// Scale all axes by the same factor. Only applies when every scale axis is enabled.
    pub uniform_scale: bool,
    /// Let two or more pointers translate, rotate and scale together.
    pub multitouch: bool,
    /// Fraction of the remaining distance kept each update, in `[0, 1)`.
    pub damping: f32,
    /// Residual below which a released handle stops settling.
    pub settle_epsilon: f32,
    /// Disabled handles ignore new presses.
    pub enabled: bool,
}

impl HandleOptions {
    /// Damping clamped to `[0, 0.999]`; NaN counts as no damping.
    pub fn effective_damping(&self) -> f32 {
        if self.damping.is_nan() {
            0.0
        } else {
            self.damping.clamp(0.0, 0.999)
        }
    }
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            translate: AxisOptions::ALL,
            rotate: AxisOptions::ALL,
            scale: AxisOptions::ALL,
            uniform_scale: true,
            multitouch: true,
            damping: 0.0,
            settle_epsilon: 1e-4,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn damping_is_sanitized() {
        let mut options = HandleOptions::default();
        options.damping = f32::NAN;
        assert_eq!(options.effective_damping(), 0.0);
        options.damping = 1.0;
        assert!(options.effective_damping() < 1.0);
        options.damping = -3.0;
        assert_eq!(options.effective_damping(), 0.0);
    }

    #[test]
    fn limits_clamp_only_their_axis() {
        let options = AxisOptions::ALL.with_limit(1, 0.0, 1.0);
        assert_eq!(
            options.clamp(Vec3::new(-5.0, -5.0, 5.0)),
            Vec3::new(-5.0, 0.0, 5.0)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_from_json() {
        let options: HandleOptions = serde_json::from_str(
            r#"{ "translate": { "axes": "X | Z" }, "rotate": { "axes": "" }, "damping": 0.8 }"#,
        )
        .unwrap();
        assert_eq!(options.translate.axes, AxisFlags::X | AxisFlags::Z);
        assert!(options.rotate.axes.is_empty());
        assert_eq!(options.damping, 0.8);
        assert!(options.multitouch);
    }
}
