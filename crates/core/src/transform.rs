use crate::{Mat4, Vec3, vec3};

/// Model animation: spin about the local Y axis, then place the model in the scene.
#[derive(Clone, Copy, Debug)]
pub struct Turntable {
    pub translation: Vec3,
    /// Radians per second.
    pub angular_speed: f32,
}

impl Turntable {
    #[inline]
    pub const fn new(translation: Vec3, angular_speed: f32) -> Self {
        Self {
            translation,
            angular_speed,
        }
    }

    /// Build matrix = T * Ry(speed * t) (column-major Mat4 per glam).
    #[inline]
    pub fn matrix_at(&self, seconds: f32) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_rotation_y(self.angular_speed * seconds)
    }
}

impl Default for Turntable {
    /// Model placed at (0, -5, -10), turning at 0.3 rad/s.
    fn default() -> Self {
        Self::new(vec3(0.0, -5.0, -10.0), 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_is_constant_over_time() {
        let t = Turntable::default();
        for secs in [0.0, 1.5, 10.0, 123.4] {
            let m = t.matrix_at(secs).to_cols_array();
            assert!((m[12] - 0.0).abs() < 1e-6);
            assert!((m[13] + 5.0).abs() < 1e-6);
            assert!((m[14] + 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn rotation_is_applied_before_translation() {
        let t = Turntable::default();
        // Quarter turn: after pi/2 rad, +X maps to -Z before translating.
        let secs = std::f32::consts::FRAC_PI_2 / t.angular_speed;
        let p = t.matrix_at(secs).transform_point3(Vec3::X);
        assert!((p - vec3(0.0, -5.0, -11.0)).length() < 1e-4);
    }

    #[test]
    fn y_axis_is_fixed() {
        let t = Turntable::default();
        let p = t.matrix_at(7.0).transform_vector3(Vec3::Y);
        assert!((p - Vec3::Y).length() < 1e-5);
    }
}
