// Copyright @yucwang 2026

use crate::core::error::MappingError;
use crate::math::constants::{Float, HALF_PI, PI, TWO_PI, Vector3f};

/// Unit direction for horizontal angle `phi` in `[0, 2pi)` and polar angle
/// `theta` in `[0, pi]`, in a Y-up frame. `theta = 0` points down and
/// `phi = pi` points along +Z.
pub fn direction_from_angles(phi: Float, theta: Float) -> Vector3f {
    let phi = -(phi + HALF_PI);
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vector3f::new(phi.cos() * sin_theta, -cos_theta, phi.sin() * sin_theta)
}

/// Equirectangular grid of local-space directions, row-major with y = 0 at
/// the bottom.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    directions: Vec<Vector3f>,
}

impl SampleGrid {
    pub fn build(width: usize, height: usize) -> Result<Self, MappingError> {
        if width == 0 || height == 0 {
            return Err(MappingError::InvalidResolution { width, height });
        }

        let mut directions = Vec::with_capacity(width * height);
        for y in 0..height {
            let theta = y as Float / height as Float * PI;
            for x in 0..width {
                let phi = x as Float / width as Float * TWO_PI;
                directions.push(direction_from_angles(phi, theta));
            }
        }

        Ok(Self { width, height, directions })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn matches(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    pub fn direction(&self, x: usize, y: usize) -> &Vector3f {
        &self.directions[y * self.width + x]
    }

    pub fn directions(&self) -> &[Vector3f] {
        &self.directions
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}
