use crate::{CoreResult, Mat4, Vec3, error::aspect_ratio, vec3};

/// Vertical field of view of the viewer, in degrees.
pub const FOV_Y_DEG: f32 = 20.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;

/// Simple perspective camera (right-handed).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new_perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_rad: f32,
        z_near: f32,
        z_far: f32,
        aspect: f32,
    ) -> Self {
        Self {
            eye,
            target,
            up,
            fov_y_rad,
            z_near,
            z_far,
            aspect,
        }
    }

    /// Fixed viewer camera: eye at (0, 2, 6) looking at the origin, 20° fov.
    pub fn viewer_default(width: u32, height: u32) -> CoreResult<Self> {
        Ok(Self::new_perspective(
            vec3(0.0, 2.0, 6.0),
            Vec3::ZERO,
            Vec3::Y,
            FOV_Y_DEG.to_radians(),
            Z_NEAR,
            Z_FAR,
            aspect_ratio(width, height)?,
        ))
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Depth maps to z ∈ [0,1], as wgpu expects.
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_maps_eye_to_origin() {
        let cam = Camera::viewer_default(1280, 720).unwrap();
        let eye_in_view = cam.view().transform_point3(cam.eye);
        assert!(eye_in_view.length() < 1e-5);
    }

    #[test]
    fn target_lies_straight_ahead() {
        let cam = Camera::viewer_default(1280, 720).unwrap();
        let p = cam.view().transform_point3(cam.target);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!(p.z < 0.0);
    }

    #[test]
    fn resize_changes_only_projection() {
        let cam = Camera::viewer_default(1280, 720).unwrap();
        let wide = cam.with_aspect(aspect_ratio(1920, 600).unwrap());
        assert_eq!(cam.view(), wide.view());
        assert_ne!(cam.proj(), wide.proj());
        assert!((wide.aspect - 3.2).abs() < 1e-6);
    }

    #[test]
    fn zero_height_camera_fails() {
        assert!(Camera::viewer_default(1280, 0).is_err());
    }
}
