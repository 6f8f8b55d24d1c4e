// Copyright @yucwang 2026

use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{EPSILON, Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

/// The `[-1, 1]^3` cube placed by `to_world`.
pub struct Cube {
    to_world: Transform,
}

impl Cube {
    pub fn new(to_world: Transform) -> Self {
        Self { to_world }
    }

    // Slab test that also resolves rays starting inside the box.
    fn intersect_local(&self, ray: &Ray3f) -> Option<Float> {
        let ray_local = self.to_world.inv_apply_ray(ray);
        let o = ray_local.origin();
        let d = ray_local.dir();

        let mut t_near = Float::NEG_INFINITY;
        let mut t_far = Float::INFINITY;

        for axis in 0..3 {
            let dir = d[axis];
            if dir.abs() < EPSILON * EPSILON {
                if o[axis] < -1.0 || o[axis] > 1.0 {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (-1.0 - o[axis]) * inv;
            let mut t1 = (1.0 - o[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_far < t_near {
                return None;
            }
        }

        if ray_local.test_segment(t_near) {
            Some(t_near)
        } else if ray_local.test_segment(t_far) {
            Some(t_far)
        } else {
            None
        }
    }
}

impl Shape for Cube {
    fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::default();
        for corner in 0..8 {
            let local = Vector3f::new(
                if corner & 1 == 0 { -1.0 } else { 1.0 },
                if corner & 2 == 0 { -1.0 } else { 1.0 },
                if corner & 4 == 0 { -1.0 } else { 1.0 },
            );
            bbox.expand_by_point(&self.to_world.apply_point(local));
        }
        bbox
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float> {
        self.intersect_local(ray)
    }

    fn describe(&self) -> String {
        String::from("Cube")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled_cube(half: Float) -> Cube {
        Cube::new(Transform::scale(&Vector3f::new(half, half, half)))
    }

    #[test]
    fn test_ray_from_inside_hits_far_wall() {
        let cube = scaled_cube(2.0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, -1.0, 0.0), None, Some(8.0));
        let t = cube.ray_intersection(&ray).expect("expected hit");
        assert!((t - 2.0).abs() < 1e-5);

        let diagonal = Ray3f::new(Vector3f::zeros(), Vector3f::new(1.0, 1.0, 1.0), None, Some(8.0));
        let t = cube.ray_intersection(&diagonal).expect("expected hit");
        assert!((t - 2.0 * (3.0 as Float).sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_ray_from_outside_hits_near_wall() {
        let cube = Cube::new(Transform::translate(&Vector3f::new(0.0, 0.0, 5.0)));
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!((cube.ray_intersection(&ray).unwrap() - 4.0).abs() < 1e-5);

        let away = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(cube.ray_intersection(&away).is_none());

        let short = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, Some(3.0));
        assert!(cube.ray_intersection(&short).is_none());
    }

    #[test]
    fn test_bounding_box() {
        let cube = Cube::new(Transform::translate(&Vector3f::new(1.0, 0.0, 0.0))
            * Transform::scale(&Vector3f::new(2.0, 1.0, 1.0)));
        let bbox = cube.bounding_box();
        assert!((bbox.p_min - Vector3f::new(-1.0, -1.0, -1.0)).norm() < 1e-6);
        assert!((bbox.p_max - Vector3f::new(3.0, 1.0, 1.0)).norm() < 1e-6);
    }
}
