// Copyright @yucwang 2026

use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{EPSILON, Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

/// The `[-1, 1]^2` quad in the local `z = 0` plane, placed by `to_world`.
pub struct Rectangle {
    to_world: Transform,
}

impl Rectangle {
    pub fn new(to_world: Transform) -> Self {
        Self { to_world }
    }
}

impl Shape for Rectangle {
    fn bounding_box(&self) -> AABB {
        let corners = [
            Vector3f::new(-1.0, -1.0, 0.0),
            Vector3f::new(-1.0,  1.0, 0.0),
            Vector3f::new( 1.0, -1.0, 0.0),
            Vector3f::new( 1.0,  1.0, 0.0),
        ];
        let world: Vec<Vector3f> = corners.iter().map(|c| self.to_world.apply_point(*c)).collect();
        // Pad so the box never collapses to a plane.
        let bbox = AABB::from_points(&world);
        let pad = Vector3f::new(EPSILON, EPSILON, EPSILON);
        AABB::new(bbox.p_min - pad, bbox.p_max + pad)
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float> {
        let ray_local = self.to_world.inv_apply_ray(ray);
        let dir = ray_local.dir();
        if dir.z.abs() < EPSILON * EPSILON {
            return None;
        }

        let t = -ray_local.origin().z / dir.z;
        if !ray_local.test_segment(t) {
            return None;
        }
        let p_local = ray_local.at(t);
        if p_local.x.abs() > 1.0 || p_local.y.abs() > 1.0 {
            return None;
        }
        Some(t)
    }

    fn describe(&self) -> String {
        String::from("Rectangle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_hit_and_miss() {
        let rect = Rectangle::new(Transform::translate(&Vector3f::new(0.0, 0.0, -3.0))
            * Transform::scale(&Vector3f::new(2.0, 2.0, 1.0)));
        let hit = Ray3f::new(Vector3f::new(1.5, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!((rect.ray_intersection(&hit).unwrap() - 3.0).abs() < 1e-5);

        let miss = Ray3f::new(Vector3f::new(2.5, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(rect.ray_intersection(&miss).is_none());

        let parallel = Ray3f::new(Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), None, None);
        assert!(rect.ray_intersection(&parallel).is_none());
    }

    #[test]
    fn test_rotated_rectangle_as_floor() {
        let floor = Rectangle::new(Transform::translate(&Vector3f::new(0.0, -1.5, 0.0))
            * Transform::rotate(&Vector3f::new(1.0, 0.0, 0.0), 90.0));
        let down = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, -1.0, 0.0), None, None);
        assert!((floor.ray_intersection(&down).unwrap() - 1.5).abs() < 1e-5);
        let bbox = floor.bounding_box();
        assert!((bbox.p_min.y + 1.5).abs() < 1e-3 && (bbox.p_max.y + 1.5).abs() < 1e-3);
    }
}
