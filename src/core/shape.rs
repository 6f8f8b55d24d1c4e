// Copyright @yucwang 2023

use crate::math::aabb::AABB;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;

pub trait Shape: Send + Sync {
    fn bounding_box(&self) -> AABB;

    /// Ray parameter of the closest hit inside `[ray.min_t, ray.max_t]`.
    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float>;

    fn describe(&self) -> String {
        String::from("Shape")
    }
}
