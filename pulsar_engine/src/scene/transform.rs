/// Transform component - translation, scale and Tait-Bryan rotation

use glam::{Mat4, Vec3};

/// Object-to-world transform
///
/// Rotation is expressed as Tait-Bryan angles in radians, applied in
/// Y (yaw), X (pitch), Z (roll) order. The composed matrix is
/// `translate * Ry * Rx * Rz * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    /// Compose the 4x4 object-to-world matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
