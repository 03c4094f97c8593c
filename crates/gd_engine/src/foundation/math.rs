//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics and game development.
//! All conventions are right-handed and Y-up, with -Z as the forward axis.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Local axis a transform treats as "forward"
pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Local axis a transform treats as "right"
pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Local axis a transform treats as "up"
pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Position, rotation and scale relative to some parent frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Translation
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Pose {
    /// Create a new identity pose
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a pose with only a translation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a pose with translation and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Set the translation (builder style)
    pub fn translate_to(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self
    }

    /// Offset the translation in the parent frame
    pub fn translate_by(&mut self, delta: Vec3) -> &mut Self {
        self.position += delta;
        self
    }

    /// Apply an incremental XYZ Euler rotation in the pose's own frame
    pub fn rotate_euler_by(&mut self, angles: Vec3) -> &mut Self {
        self.rotation *= quat_from_euler(angles);
        self
    }

    /// Set the scale
    pub fn scale_to(&mut self, scale: Vec3) -> &mut Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix (T * R * S)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose a TRS matrix back into a pose
    ///
    /// Shear introduced by non-uniform scale under rotation cannot be
    /// represented and is dropped.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        // Degenerate axes leave the rotation undefined
        if scale_x <= f32::EPSILON || scale_y <= f32::EPSILON || scale_z <= f32::EPSILON {
            return Self { position, rotation: Quat::identity(), scale };
        }

        let rotation_matrix = Mat3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Compose `self` (parent) with `child`
    pub fn combine(&self, child: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }
}

/// Build a rotation from XYZ Euler angles in radians (roll, pitch, yaw)
pub fn quat_from_euler(angles: Vec3) -> Quat {
    Quat::from_euler_angles(angles.x, angles.y, angles.z)
}

/// Right-handed perspective projection with a -Z view direction
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    nalgebra::Perspective3::new(aspect, fov_y, near, far).to_homogeneous()
}

/// Math utility functions
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians.to_degrees()
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_pose_matrix_roundtrip() {
        let pose = Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
            scale: Vec3::new(2.0, 1.5, 0.8),
        };

        let rebuilt = Pose::from_matrix(&pose.to_matrix());

        assert_relative_eq!(rebuilt.position, pose.position, epsilon = 1e-5);
        assert_relative_eq!(rebuilt.scale, pose.scale, epsilon = 1e-5);
        // Quaternions might flip sign but represent same rotation
        let dot = pose.rotation.coords.dot(&rebuilt.rotation.coords);
        assert!(dot.abs() > 0.999, "rotation mismatch: dot = {dot}");
    }

    #[test]
    fn test_combine_matches_matrix_product() {
        let parent = Pose::from_position_rotation(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2),
        );
        let child = Pose::from_position(Vec3::new(0.0, 0.0, 1.0));

        let combined = parent.combine(&child);

        // (0,0,1) rotated 90 degrees about Y lands on (1,0,0), then offset by the parent
        assert_relative_eq!(combined.position, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(
            combined.to_matrix(),
            parent.to_matrix() * child.to_matrix(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_degenerate_scale_decomposes_without_nan() {
        let mut pose = Pose::identity();
        pose.scale_to(Vec3::new(0.0, 1.0, 1.0));
        let rebuilt = Pose::from_matrix(&pose.to_matrix());
        assert!(rebuilt.rotation.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_basis_axes_are_right_handed() {
        assert_relative_eq!(RIGHT.cross(&UP), -FORWARD, epsilon = 1e-6);
    }
}
