use crate::{DMat4, DVec3, Point3};
use serde::{Deserialize, Serialize};

/// Translation plus Euler rotation (degrees) applied in X, Y, Z order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3,
    pub rotation_degrees: DVec3,
}

impl Pose {
    pub fn new(position: Point3, rotation_degrees: DVec3) -> Self {
        Self {
            position,
            rotation_degrees,
        }
    }

    pub fn at(position: Point3) -> Self {
        Self::new(position, DVec3::ZERO)
    }

    /// Compose the pose starting from identity: translate, then rotate
    /// about X, Y and Z in that order.
    pub fn to_mat4(&self) -> DMat4 {
        let r = self.rotation_degrees;
        DMat4::from_translation(self.position)
            * DMat4::from_rotation_x(r.x.to_radians())
            * DMat4::from_rotation_y(r.y.to_radians())
            * DMat4::from_rotation_z(r.z.to_radians())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Point3::ZERO)
    }
}

/// Right-handed perspective projection with OpenGL clip depth (-1..1).
pub fn perspective(fov_y_degrees: f64, aspect: f64, near: f64, far: f64) -> DMat4 {
    DMat4::perspective_rh_gl(fov_y_degrees.to_radians(), aspect, near, far)
}

/// Pack a matrix as column-major f32, the layout `uniformMatrix4fv` expects
/// with transpose disabled.
pub fn to_uniform(mat: &DMat4) -> [f32; 16] {
    mat.to_cols_array().map(|v| v as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::dvec3;

    #[test]
    fn test_identity_pose() {
        let m = Pose::default().to_mat4();
        assert!(m.abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn test_translation_applied_before_rotation() {
        // The translation column is unaffected by the rotation that follows it.
        let pose = Pose::new(dvec3(1.0, 2.0, 3.0), dvec3(30.0, 60.0, 90.0));
        let m = pose.to_mat4();
        let origin = m.transform_point3(DVec3::ZERO);
        assert!((origin - dvec3(1.0, 2.0, 3.0)).length() < 1e-12);
    }

    #[test]
    fn test_rotation_order_is_x_then_y_then_z() {
        let pose = Pose::new(DVec3::ZERO, dvec3(90.0, 90.0, 0.0));
        let m = pose.to_mat4();
        // Rx(90) * Ry(90) applied to +X: Ry takes +X to -Z, Rx takes -Z to +Y.
        let v = m.transform_vector3(DVec3::X);
        assert!((v - DVec3::Y).length() < 1e-12, "got {:?}", v);
    }

    #[test]
    fn test_perspective_uses_degrees() {
        let p = perspective(90.0, 1.0, 0.1, 1000.0);
        // tan(45deg) = 1, so the focal terms are exactly 1.
        assert_abs_diff_eq!(p.x_axis.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y_axis.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.z_axis.w, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_to_uniform_is_column_major() {
        let m = DMat4::from_translation(dvec3(4.0, 5.0, 6.0));
        let cols = to_uniform(&m);
        assert_eq!(&cols[12..15], &[4.0, 5.0, 6.0]);
        assert_eq!(cols[15], 1.0);
    }
}
