// Copyright @yucwang 2023

use super::triangle::Triangle;

use crate::core::shape::Shape;
use crate::core::bvh::BVH;
use crate::io::obj_utils;
use crate::io::obj_utils::ObjLoadError;
use crate::math::aabb::AABB;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

use std::path::Path;
use std::vec::Vec;

/// Triangle soup with its own BVH.
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
    bounds: AABB,
    bvh: Option<BVH>,
}

impl TriangleMesh {
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut mesh = Self { triangles, bounds: AABB::default(), bvh: None };
        mesh.build_bvh();
        mesh
    }

    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self, ObjLoadError> {
        let obj_set = obj_utils::load_obj_from_file(path.as_ref())?;
        let triangles = obj_utils::triangles_from_obj(&obj_set);
        log::info!("Loaded {} triangles from {}.", triangles.len(), path.as_ref().display());
        Ok(Self::from_triangles(triangles))
    }

    pub fn apply_transform(&mut self, transform: &Transform) {
        for tri in &mut self.triangles {
            tri.apply_transform(transform);
        }
        self.build_bvh();
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    fn build_bvh(&mut self) {
        if self.triangles.is_empty() {
            self.bvh = None;
            self.bounds = AABB::default();
            return;
        }

        let prim_bounds: Vec<AABB> = self.triangles.iter().map(|t| t.bounding_box()).collect();
        let bvh = BVH::new(prim_bounds);
        self.bounds = bvh.bounds();
        self.bvh = Some(bvh);
    }
}

impl Shape for TriangleMesh {
    fn bounding_box(&self) -> AABB {
        self.bounds
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float> {
        let bvh = self.bvh.as_ref()?;
        bvh.ray_intersection(ray, |prim_idx, ray| self.triangles[prim_idx].ray_intersection(ray))
            .map(|(_, t)| t)
    }

    fn describe(&self) -> String {
        format!("TriangleMesh ({} triangles)", self.triangles.len())
    }
}
