//! Core types: math re-exports, camera, turntable animation, shared errors.

pub use glam::{Mat4, Vec3, vec3};

pub mod camera;
pub mod error;
pub mod transform;

pub use error::{CoreError, CoreResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turntable_at_rest_is_pure_translation() {
        let t = transform::Turntable::new(vec3(0.0, -5.0, -10.0), 0.3);
        assert_eq!(t.matrix_at(0.0), Mat4::from_translation(vec3(0.0, -5.0, -10.0)));
    }

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::viewer_default(1280, 720).expect("camera");
        let pv = cam.proj() * cam.view();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }
}
