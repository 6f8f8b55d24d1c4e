// Copyright @yucwang 2023

use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{ EPSILON, Float, Vector3f };
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    p0: Vector3f,
    p1: Vector3f,
    p2: Vector3f
}

impl Shape for Triangle {
    fn bounding_box(&self) -> AABB {
        let mut bound = AABB::new(self.p0, self.p1);
        bound.expand_by_point(&self.p2);

        bound
    }

    // Moller-Trumbore, both faces count as hits.
    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float> {
        let edge0 = self.p1 - self.p0;
        let edge1 = self.p2 - self.p0;
        let dir = ray.dir();

        let p_vec = dir.cross(&edge1);
        let det = edge0.dot(&p_vec);
        if det.abs() < EPSILON * EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let t_vec = ray.origin() - self.p0;
        let u = t_vec.dot(&p_vec) * inv_det;
        if u < 0.0 || u > 1.0 {
            return None;
        }

        let q_vec = t_vec.cross(&edge0);
        let v = dir.dot(&q_vec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge1.dot(&q_vec) * inv_det;
        if ray.test_segment(t) {
            Some(t)
        } else {
            None
        }
    }

    fn describe(&self) -> String {
        String::from("Triangle")
    }
}

impl Triangle {
    pub fn new(new_p0: Vector3f, new_p1: Vector3f, new_p2: Vector3f) -> Self {
        Triangle {
            p0: new_p0,
            p1: new_p1,
            p2: new_p2,
        }
    }

    pub fn vertices(&self) -> (Vector3f, Vector3f, Vector3f) {
        (self.p0, self.p1, self.p2)
    }

    pub fn geometric_normal(&self) -> Vector3f {
        (self.p1 - self.p0).cross(&(self.p2 - self.p0)).normalize()
    }

    pub fn surface_area(&self) -> Float {
        0.5 * (self.p1 - self.p0).cross(&(self.p2 - self.p0)).norm()
    }

    pub fn apply_transform(&mut self, transform: &Transform) {
        self.p0 = transform.apply_point(self.p0);
        self.p1 = transform.apply_point(self.p1);
        self.p2 = transform.apply_point(self.p2);
    }
}
