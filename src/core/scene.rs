// Copyright @yucwang 2026

use crate::core::bvh::BVH;
use crate::core::intersector::RayIntersector;
use crate::core::layer::{LayerTable, RayMask};
use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub layer: u8,
    pub name: Option<String>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>) -> Self {
        Self { shape, layer: 0, name: None }
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }
}

/// Layered collection of shapes answering nearest-hit queries.
pub struct Scene {
    objects: Vec<SceneObject>,
    layers: LayerTable,
    scene_bounds: AABB,
    base_dir: PathBuf,
    bvh: Option<BVH>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            layers: LayerTable::new(),
            scene_bounds: AABB::default(),
            base_dir: PathBuf::new(),
            bvh: None,
        }
    }

    pub fn with_objects(objects: Vec<SceneObject>) -> Self {
        let mut scene = Self::new();
        scene.objects = objects;
        scene.build_bvh();
        scene
    }

    /// Adding an object invalidates the acceleration structure until the
    /// next `build_bvh`; queries fall back to a linear scan meanwhile.
    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
        self.bvh = None;
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn layers(&self) -> &LayerTable {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerTable {
        &mut self.layers
    }

    pub fn scene_bounds(&self) -> &AABB {
        &self.scene_bounds
    }

    pub fn set_base_dir(&mut self, base_dir: PathBuf) {
        self.base_dir = base_dir;
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn build_bvh(&mut self) {
        let mut prim_bounds = Vec::with_capacity(self.objects.len());
        let mut scene_bounds = AABB::default();
        for obj in &self.objects {
            let bounds = obj.shape.bounding_box();
            prim_bounds.push(bounds);
            scene_bounds.expand_by_aabb(&bounds);
        }

        self.bvh = Some(BVH::new(prim_bounds));
        self.scene_bounds = scene_bounds;
        log::debug!("Built scene BVH over {} objects.", self.objects.len());
    }

    /// Closest hit among objects whose layer is in `mask`, as `(object index, t)`.
    pub fn ray_intersection(&self, ray: &Ray3f, mask: RayMask) -> Option<(usize, Float)> {
        if mask.is_empty() {
            return None;
        }

        let hit_object = |idx: usize, ray: &Ray3f| {
            let object = &self.objects[idx];
            if mask.contains_layer(object.layer) {
                object.shape.ray_intersection(ray)
            } else {
                None
            }
        };

        match self.bvh.as_ref() {
            Some(bvh) => bvh.ray_intersection(ray, hit_object),
            None => {
                let mut segment = *ray;
                let mut closest = None;
                for idx in 0..self.objects.len() {
                    if let Some(t) = hit_object(idx, &segment) {
                        if segment.update(t) {
                            closest = Some((idx, t));
                        }
                    }
                }
                closest
            }
        }
    }
}

impl RayIntersector for Scene {
    fn cast(&self, origin: &Vector3f, direction: &Vector3f, max_distance: Float, mask: RayMask) -> Option<Float> {
        let ray = Ray3f::with_raw_dir(*origin, *direction, 0.0, max_distance);
        self.ray_intersection(&ray, mask).map(|(_, t)| t)
    }
}
