// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f, FLOAT_MAX};

/// A half-open ray segment `origin + t * dir` with `t` in `[min_t, max_t]`.
#[derive(Debug, Clone, Copy)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f,
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Self { origin: o, dir: d.normalize(),
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(FLOAT_MAX) }
    }

    /// Builds a ray without normalizing `d`, so that `t` keeps the
    /// parametrization of the ray it was derived from.
    pub fn with_raw_dir(o: Vector3f, d: Vector3f, min_t: Float, max_t: Float) -> Self {
        Self { origin: o, dir: d, min_t, max_t }
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    /// Shrinks the segment to end at `t` if `t` lies inside it.
    pub fn update(&mut self, t: Float) -> bool {
        if !self.test_segment(t) {
            false
        } else {
            self.max_t = t;
            true
        }
    }

    pub fn test_segment(&self, t: Float) -> bool {
        t >= self.min_t && t <= self.max_t
    }
}

#[cfg(test)]
mod tests {
    use super::Vector3f;
    use super::Ray3f;

    #[test]
    fn test_ray3f() {
        let o = Vector3f::new(0.0, 0.0, 0.0);
        let d = Vector3f::new(1.0, 0.0, 1.0);
        let mut ray = Ray3f::new(o, d, None, None);
        assert_eq!(o, ray.origin());

        let v1 = ray.at(2.0);
        assert!((v1[0] - std::f32::consts::SQRT_2).abs() < 1e-5);
        assert!(v1[1].abs() < 1e-6);
        assert!((v1[2] - std::f32::consts::SQRT_2).abs() < 1e-5);

        assert!(ray.update(100.0));
        assert!(!ray.update(105.0));
        assert_eq!(ray.max_t, 100.0);
    }

    #[test]
    fn test_raw_dir_keeps_parametrization() {
        let ray = Ray3f::with_raw_dir(Vector3f::zeros(), Vector3f::new(0.0, 2.0, 0.0), 0.0, 3.0);
        assert_eq!(ray.at(1.5), Vector3f::new(0.0, 3.0, 0.0));
        assert!(ray.test_segment(3.0));
        assert!(!ray.test_segment(3.5));
    }
}
