use std::f64::consts::TAU;

use glam::{Mat4, Quat, Vec3};

use super::error::{RenderError, RenderResult};

/// Rotation about an axis followed by a translation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    /// Unit rotation axis.
    pub axis: Vec3,
    /// Radians.
    pub angle: f32,
    pub translation: Vec3,
}

impl Transform {
    /// `translate · rotate`: the object spins in place, then moves.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(Quat::from_axis_angle(self.axis, self.angle), self.translation)
    }
}

/// Constant-speed rotation: one full turn every `period` seconds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spin {
    axis: Vec3,
    period: f64,
    translation: Vec3,
}

impl Spin {
    /// Fails when `axis` has no direction or `period` is not a positive number of seconds.
    pub fn new(axis: Vec3, period: f64) -> RenderResult<Self> {
        let axis = axis
            .try_normalize()
            .ok_or_else(|| RenderError::invalid(format!("rotation axis {axis} has no direction")))?;
        if !(period.is_finite() && period > 0.0) {
            return Err(RenderError::invalid(format!("spin period {period} must be positive")));
        }
        Ok(Self { axis, period, translation: Vec3::ZERO })
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Radians after `elapsed` seconds. Not wrapped.
    pub fn angle_at(&self, elapsed: f64) -> f64 {
        elapsed * TAU / self.period
    }

    pub fn transform_at(&self, elapsed: f64) -> Transform {
        Transform {
            axis: self.axis,
            angle: self.angle_at(elapsed) as f32,
            translation: self.translation,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn angle_grows_linearly_with_time() {
        let spin = Spin::new(Vec3::Y, 6.0).unwrap();
        for (t1, t2) in [(0.0, 1.5), (2.0, 2.001), (100.0, 4000.25)] {
            let delta = spin.angle_at(t2) - spin.angle_at(t1);
            assert_relative_eq!(delta, TAU / 6.0 * (t2 - t1), max_relative = 1e-12);
        }
        assert!(spin.angle_at(7.0) > spin.angle_at(6.9));
    }

    #[test]
    fn full_period_is_one_turn() {
        let spin = Spin::new(Vec3::new(1.0, 1.0, 0.0), 8.0).unwrap();
        assert_relative_eq!(spin.angle_at(8.0), TAU);
        assert_relative_eq!(spin.axis().length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_angle_world_is_pure_translation() {
        let t = Vec3::new(-2.0, 1.0, 0.0);
        let spin = Spin::new(Vec3::Y, 6.0).unwrap().with_translation(t);
        let world = spin.transform_at(0.0).world_matrix();
        assert!(world.abs_diff_eq(Mat4::from_translation(t), 1e-6));
    }

    #[test]
    fn rotation_happens_before_translation() {
        let spin = Spin::new(Vec3::Z, 4.0).unwrap().with_translation(Vec3::new(5.0, 0.0, 0.0));
        // Quarter turn: +X maps to +Y, then shifts by 5 along X.
        let p = spin.transform_at(1.0).world_matrix().transform_point3(Vec3::X);
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Spin::new(Vec3::ZERO, 1.0).is_err());
        assert!(Spin::new(Vec3::Y, 0.0).is_err());
        assert!(Spin::new(Vec3::Y, f64::INFINITY).is_err());
    }
}
