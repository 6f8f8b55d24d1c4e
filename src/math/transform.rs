// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Matrix4f, UnitQuaternionf, Vector3f, Vector4f, DEG_TO_RAD };
use super::ray::Ray3f;

use std::ops;

/// Affine transform with its cached inverse.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl ops::Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform { matrix: self.matrix * rhs.matrix,
                    inv_matrix: rhs.inv_matrix * self.inv_matrix }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix: matrix,
               inv_matrix: matrix.try_inverse().unwrap_or(Matrix4f::identity())}
    }

    pub fn translate(offset: &Vector3f) -> Self {
        Self::new(Matrix4f::new_translation(offset))
    }

    pub fn scale(factors: &Vector3f) -> Self {
        Self::new(Matrix4f::new_nonuniform_scaling(factors))
    }

    pub fn rotate(axis: &Vector3f, angle_deg: Float) -> Self {
        if axis.norm() <= 0.0 {
            return Self::default();
        }
        let rotation = UnitQuaternionf::from_axis_angle(&nalgebra::Unit::new_normalize(*axis),
                                                        angle_deg * DEG_TO_RAD);
        Self::new(rotation.to_homogeneous())
    }

    /// Translation * rotation * scale.
    pub fn trs(position: &Vector3f, rotation: &UnitQuaternionf, scale: &Vector3f) -> Self {
        Self::translate(position) * Self::new(rotation.to_homogeneous()) * Self::scale(scale)
    }

    pub fn matrix(&self) -> &Matrix4f {
        &self.matrix
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        Self::project_point(&self.matrix, p)
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        self.matrix.fixed_slice::<3, 3>(0, 0) * v
    }

    /// Maps the ray without renormalizing, so hit parameters carry over unchanged.
    pub fn apply_ray(&self, ray: &Ray3f) -> Ray3f {
        Ray3f::with_raw_dir(self.apply_point(ray.origin()),
                            self.apply_vector(ray.dir()),
                            ray.min_t, ray.max_t)
    }

    pub fn inv_apply_point(&self, p: Vector3f) -> Vector3f {
        Self::project_point(&self.inv_matrix, p)
    }

    pub fn inv_apply_vector(&self, v: Vector3f) -> Vector3f {
        self.inv_matrix.fixed_slice::<3, 3>(0, 0) * v
    }

    pub fn inv_apply_ray(&self, ray: &Ray3f) -> Ray3f {
        Ray3f::with_raw_dir(self.inv_apply_point(ray.origin()),
                            self.inv_apply_vector(ray.dir()),
                            ray.min_t, ray.max_t)
    }

    fn project_point(matrix: &Matrix4f, p: Vector3f) -> Vector3f {
        let h = matrix * Vector4f::new(p.x, p.y, p.z, 1.0);
        Vector3f::new(h.x / h.w, h.y / h.w, h.z / h.w)
    }
}
