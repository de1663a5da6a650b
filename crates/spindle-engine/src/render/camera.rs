use glam::{Mat4, Vec3};

use super::error::{RenderError, RenderResult};

/// Right-handed view matrix looking from `eye` at `target`.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> RenderResult<Mat4> {
    if !(eye.is_finite() && target.is_finite() && up.is_finite()) {
        return Err(RenderError::invalid("look_at vectors must be finite"));
    }
    let forward = target - eye;
    if forward.length_squared() <= f32::EPSILON {
        return Err(RenderError::invalid("eye and target coincide"));
    }
    if forward.cross(up).length_squared() <= f32::EPSILON * forward.length_squared() {
        return Err(RenderError::invalid("up is zero or parallel to the view direction"));
    }
    Ok(Mat4::look_at_rh(eye, target, up))
}

/// Right-handed perspective projection with a `0..1` depth range.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> RenderResult<Mat4> {
    if ![fov_y, aspect, near, far].iter().all(|v| v.is_finite()) {
        return Err(RenderError::invalid("perspective parameters must be finite"));
    }
    if fov_y <= 0.0 || fov_y >= std::f32::consts::PI {
        return Err(RenderError::invalid(format!("fov_y {fov_y} outside (0, pi)")));
    }
    if aspect <= 0.0 {
        return Err(RenderError::invalid(format!("aspect {aspect} must be positive")));
    }
    if near <= 0.0 {
        return Err(RenderError::invalid(format!("near {near} must be positive")));
    }
    if far <= near {
        return Err(RenderError::invalid(format!("far {far} must exceed near {near}")));
    }
    Ok(Mat4::perspective_rh(fov_y, aspect, near, far))
}

/// Camera placement and lens.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    /// Eight units down -Z looking at the origin, 45° lens.
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -8.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Validated view and projection matrices.
///
/// The view is fixed for the camera's lifetime. Only the aspect ratio can
/// change; doing so marks the projection dirty until [`take_dirty`](Self::take_dirty).
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    view: Mat4,
    projection: Mat4,
    dirty: bool,
}

impl Camera {
    pub fn new(config: CameraConfig) -> RenderResult<Self> {
        let view = look_at(config.eye, config.target, config.up)?;
        let projection = perspective(config.fov_y, config.aspect, config.near, config.far)?;
        Ok(Self { config, view, projection, dirty: true })
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Rebuilds the projection for a new aspect ratio.
    ///
    /// Invalid ratios (minimized window) are rejected and leave the camera unchanged.
    pub fn set_aspect(&mut self, aspect: f32) -> RenderResult<()> {
        if aspect == self.config.aspect {
            return Ok(());
        }
        let c = &self.config;
        self.projection = perspective(c.fov_y, aspect, c.near, c.far)?;
        self.config.aspect = aspect;
        self.dirty = true;
        Ok(())
    }

    /// Returns whether the matrices changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn perspective_rejects_bad_planes_and_fov() {
        let fov = 45f32.to_radians();
        assert!(perspective(fov, 1.0, 0.0, 10.0).is_err());
        assert!(perspective(fov, 1.0, -1.0, 10.0).is_err());
        assert!(perspective(fov, 1.0, 1.0, 1.0).is_err());
        assert!(perspective(fov, 1.0, 2.0, 1.0).is_err());
        assert!(perspective(0.0, 1.0, 0.1, 10.0).is_err());
        assert!(perspective(-fov, 1.0, 0.1, 10.0).is_err());
        assert!(perspective(fov, 0.0, 0.1, 10.0).is_err());
        assert!(perspective(fov, f32::NAN, 0.1, 10.0).is_err());
        assert!(perspective(fov, 1.0, 0.1, 10.0).is_ok());
    }

    #[test]
    fn look_at_rejects_degenerate_frames() {
        assert!(look_at(Vec3::ONE, Vec3::ONE, Vec3::Y).is_err());
        assert!(look_at(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO, Vec3::Y).is_err());
        assert!(look_at(Vec3::Z, Vec3::ZERO, Vec3::ZERO).is_err());
    }

    #[test]
    fn default_camera_maps_target_to_view_axis() {
        let camera = Camera::new(CameraConfig::default()).unwrap();
        // Target is 8 units in front of the eye: view space -Z.
        let p = camera.view().transform_point3(Vec3::ZERO);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, -8.0, epsilon = 1e-5);

        let clip = camera.projection() * p.extend(1.0);
        let depth = clip.z / clip.w;
        assert!((0.0..1.0).contains(&depth), "depth {depth}");
    }

    #[test]
    fn set_aspect_marks_dirty_once() {
        let mut camera = Camera::new(CameraConfig::default()).unwrap();
        assert!(camera.take_dirty());
        assert!(!camera.take_dirty());

        camera.set_aspect(2.0).unwrap();
        assert!(camera.take_dirty());
        assert_relative_eq!(camera.projection().x_axis.x * 2.0, camera.projection().y_axis.y);

        assert!(camera.set_aspect(0.0).is_err());
        assert!(!camera.take_dirty());
        assert_eq!(camera.config().aspect, 2.0);
    }
}
