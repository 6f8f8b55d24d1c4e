// Copyright @yucwang 2026

use crate::math::constants::{Float, Matrix4f, Quaternionf, UnitQuaternionf, Vector3f};
use crate::math::transform::Transform;

pub const MAX_FOV: Float = 360.0;

/// Pose a panorama is rendered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub position: Vector3f,
    pub rotation: UnitQuaternionf,
    fov: Float,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            position: Vector3f::zeros(),
            rotation: UnitQuaternionf::identity(),
            fov: MAX_FOV,
        }
    }
}

impl Viewpoint {
    pub fn new(position: Vector3f, rotation: UnitQuaternionf, fov: Float) -> Self {
        let mut viewpoint = Self { position, rotation, fov: MAX_FOV };
        viewpoint.set_fov(fov);
        viewpoint
    }

    /// Builds a viewpoint from a raw record. `rotation` is stored `[x, y, z, w]`.
    pub fn from_components(position: [Float; 3], rotation: [Float; 4], fov: Float) -> Self {
        let q = Quaternionf::new(rotation[3], rotation[0], rotation[1], rotation[2]);
        let rotation = if q.norm() > 0.0 {
            UnitQuaternionf::from_quaternion(q)
        } else {
            UnitQuaternionf::identity()
        };
        Self::new(Vector3f::new(position[0], position[1], position[2]), rotation, fov)
    }

    pub fn position_components(&self) -> [Float; 3] {
        [self.position.x, self.position.y, self.position.z]
    }

    pub fn rotation_components(&self) -> [Float; 4] {
        let q = self.rotation.quaternion();
        [q.i, q.j, q.k, q.w]
    }

    /// Roll, pitch and yaw in radians.
    pub fn rotation_euler(&self) -> Vector3f {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        Vector3f::new(roll, pitch, yaw)
    }

    pub fn fov(&self) -> Float {
        self.fov
    }

    pub fn set_fov(&mut self, fov: Float) {
        self.fov = if fov.is_nan() { MAX_FOV } else { fov.clamp(0.0, MAX_FOV) };
    }

    pub fn set_transform(&mut self, position: Vector3f, rotation: UnitQuaternionf) {
        self.position = position;
        self.rotation = rotation;
    }

    pub fn to_world(&self) -> Transform {
        Transform::trs(&self.position, &self.rotation, &Vector3f::new(1.0, 1.0, 1.0))
    }

    pub fn trs_matrix(&self) -> Matrix4f {
        *self.to_world().matrix()
    }

    /// Rotates a local direction into world space.
    pub fn transform_direction(&self, local: &Vector3f) -> Vector3f {
        self.rotation.transform_vector(local)
    }
}
