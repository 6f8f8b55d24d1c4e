// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

const SAH_BUCKETS: usize = 12;

#[derive(Clone)]
struct BVHNode {
    bounds: AABB,
    left: Option<usize>,
    right: Option<usize>,
    start: usize,
    count: usize,
}

impl BVHNode {
    fn leaf(bounds: AABB, start: usize, count: usize) -> Self {
        Self { bounds, left: None, right: None, start, count }
    }

    fn interior(bounds: AABB, left: usize, right: usize) -> Self {
        Self { bounds, left: Some(left), right: Some(right), start: 0, count: 0 }
    }

    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// Bounding volume hierarchy over primitive bounds. Primitive intersection
/// is delegated to the caller.
pub struct BVH {
    nodes: Vec<BVHNode>,
    indices: Vec<usize>,
    prim_bounds: Vec<AABB>,
    prim_centroids: Vec<Vector3f>,
    max_leaf_size: usize,
}

impl BVH {
    pub fn new(prim_bounds: Vec<AABB>) -> Self {
        Self::with_max_leaf_size(prim_bounds, 4)
    }

    pub fn with_max_leaf_size(prim_bounds: Vec<AABB>, max_leaf_size: usize) -> Self {
        let prim_centroids = prim_bounds.iter().map(|b| b.center()).collect();
        let mut bvh = Self {
            indices: (0..prim_bounds.len()).collect(),
            nodes: Vec::new(),
            prim_bounds,
            prim_centroids,
            max_leaf_size: max_leaf_size.max(1),
        };

        if !bvh.indices.is_empty() {
            let (bounds, centroid_bounds) = bvh.compute_bounds(0, bvh.indices.len());
            bvh.build(0, bvh.indices.len(), bounds, centroid_bounds);
        }

        bvh
    }

    pub fn len(&self) -> usize {
        self.prim_bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prim_bounds.is_empty()
    }

    pub fn bounds(&self) -> AABB {
        self.nodes.first().map(|n| n.bounds).unwrap_or_default()
    }

    /// Closest hit along `ray`. `hit_fn` returns the hit parameter of one
    /// primitive; the segment passed to it shrinks as closer hits are found.
    pub fn ray_intersection<F>(&self, ray: &Ray3f, mut hit_fn: F) -> Option<(usize, Float)>
    where
        F: FnMut(usize, &Ray3f) -> Option<Float>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut segment = *ray;
        let mut closest: Option<(usize, Float)> = None;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(&segment) {
                continue;
            }

            if node.is_leaf() {
                for i in 0..node.count {
                    let prim_idx = self.indices[node.start + i];
                    if let Some(t) = hit_fn(prim_idx, &segment) {
                        if segment.update(t) {
                            closest = Some((prim_idx, t));
                        }
                    }
                }
            } else {
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }

        closest
    }

    fn build(&mut self, start: usize, end: usize, bounds: AABB, centroid_bounds: AABB) -> usize {
        let count = end - start;
        if count <= self.max_leaf_size {
            let node_idx = self.nodes.len();
            self.nodes.push(BVHNode::leaf(bounds, start, count));
            return node_idx;
        }

        let axis = centroid_bounds.max_extent() as usize;
        let axis_min = centroid_bounds.p_min[axis];
        let axis_max = centroid_bounds.p_max[axis];
        if (axis_max - axis_min).abs() < 1e-6 {
            // Degenerate centroid bounds.
            let node_idx = self.nodes.len();
            self.nodes.push(BVHNode::leaf(bounds, start, count));
            return node_idx;
        }

        let bucket_of = |c: Float| -> usize {
            let b = ((c - axis_min) / (axis_max - axis_min) * SAH_BUCKETS as Float) as usize;
            b.min(SAH_BUCKETS - 1)
        };

        let mut buckets = vec![(0usize, AABB::default()); SAH_BUCKETS];
        for i in start..end {
            let idx = self.indices[i];
            let b = bucket_of(self.prim_centroids[idx][axis]);
            buckets[b].0 += 1;
            buckets[b].1.expand_by_aabb(&self.prim_bounds[idx]);
        }

        let area = bounds.surface_area().max(1e-6);
        let mut min_cost = Float::MAX;
        let mut min_split = 0usize;
        for split in 0..(SAH_BUCKETS - 1) {
            let (mut b0, mut b1) = (AABB::default(), AABB::default());
            let (mut count0, mut count1) = (0usize, 0usize);
            for (b, (n, bnd)) in buckets.iter().enumerate() {
                if b <= split {
                    count0 += n;
                    b0.expand_by_aabb(bnd);
                } else {
                    count1 += n;
                    b1.expand_by_aabb(bnd);
                }
            }
            let cost0 = if count0 > 0 { count0 as Float * b0.surface_area() } else { 0.0 };
            let cost1 = if count1 > 0 { count1 as Float * b1.surface_area() } else { 0.0 };
            let cost = 1.0 + (cost0 + cost1) / area;
            if cost < min_cost {
                min_cost = cost;
                min_split = split;
            }
        }

        if min_cost >= count as Float {
            let node_idx = self.nodes.len();
            self.nodes.push(BVHNode::leaf(bounds, start, count));
            return node_idx;
        }

        let mut mid = start;
        for i in start..end {
            let idx = self.indices[i];
            if bucket_of(self.prim_centroids[idx][axis]) <= min_split {
                self.indices.swap(i, mid);
                mid += 1;
            }
        }

        if mid == start || mid == end {
            let node_idx = self.nodes.len();
            self.nodes.push(BVHNode::leaf(bounds, start, count));
            return node_idx;
        }

        let (left_bounds, left_centroids) = self.compute_bounds(start, mid);
        let (right_bounds, right_centroids) = self.compute_bounds(mid, end);
        let node_idx = self.nodes.len();
        self.nodes.push(BVHNode::leaf(bounds, 0, 0));
        let left = self.build(start, mid, left_bounds, left_centroids);
        let right = self.build(mid, end, right_bounds, right_centroids);
        self.nodes[node_idx] = BVHNode::interior(bounds, left, right);
        node_idx
    }

    fn compute_bounds(&self, start: usize, end: usize) -> (AABB, AABB) {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for i in start..end {
            let idx = self.indices[i];
            bounds.expand_by_aabb(&self.prim_bounds[idx]);
            centroid_bounds.expand_by_point(&self.prim_centroids[idx]);
        }
        (bounds, centroid_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::BVH;
    use crate::core::shape::Shape;
    use crate::math::constants::{Float, Vector3f};
    use crate::math::ray::Ray3f;
    use crate::shapes::triangle::Triangle;

    fn build_triangles() -> Vec<Triangle> {
        let mut tris = Vec::new();
        for i in 0..32 {
            let x = (i % 8) as Float * 2.0;
            let z = -((i / 8) as Float);
            let p0 = Vector3f::new(x, 0.0, z);
            let p1 = Vector3f::new(x + 0.5, 0.0, z);
            let p2 = Vector3f::new(x, 0.5, z);
            tris.push(Triangle::new(p0, p1, p2));
        }
        tris
    }

    #[test]
    fn test_bvh_vs_naive_triangles() {
        let triangles = build_triangles();
        let bvh = BVH::new(triangles.iter().map(|t| t.bounding_box()).collect());
        assert_eq!(bvh.len(), 32);

        for i in 0..8 {
            let origin = Vector3f::new(i as Float * 2.0 + 0.1, 0.1, 1.0);
            let ray = Ray3f::new(origin, Vector3f::new(0.0, 0.0, -1.0), None, None);

            let bvh_hit = bvh.ray_intersection(&ray, |prim_idx, ray| triangles[prim_idx].ray_intersection(ray));

            let naive_t = triangles.iter()
                .filter_map(|tri| tri.ray_intersection(&ray))
                .fold(None, |acc: Option<Float>, t| Some(acc.map_or(t, |cur| cur.min(t))));

            let (idx, bvh_t) = bvh_hit.expect("BVH miss");
            let naive_t = naive_t.expect("Naive miss");
            assert!((bvh_t - naive_t).abs() < 1e-5);
            assert!((bvh_t - 1.0).abs() < 1e-5);
            assert_eq!(idx, i);
        }

        let miss_ray = Ray3f::new(Vector3f::new(100.0, 100.0, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(bvh.ray_intersection(&miss_ray, |prim_idx, ray| triangles[prim_idx].ray_intersection(ray)).is_none());
    }

    #[test]
    fn test_bvh_respects_max_t() {
        let triangles = build_triangles();
        let bvh = BVH::new(triangles.iter().map(|t| t.bounding_box()).collect());
        let ray = Ray3f::new(Vector3f::new(0.1, 0.1, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, Some(0.5));
        assert!(bvh.ray_intersection(&ray, |prim_idx, ray| triangles[prim_idx].ray_intersection(ray)).is_none());
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = BVH::new(Vec::new());
        assert!(bvh.is_empty());
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(bvh.ray_intersection(&ray, |_, _| Some(1.0)).is_none());
    }
}
