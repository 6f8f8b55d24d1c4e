// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector4f };

use std::ops;
use std::vec::Vec;

/// Row-major pixel grid addressed as `(x, y)`, with `y = 0` the bottom row.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap<T> {
    data: Vec<T>,
    height: usize,
    width: usize
}

/// Grayscale depth intensities in `[0, 1]`.
pub type DepthImage = Bitmap<Float>;

/// RGBA panorama pixels, alpha in the last component.
pub type TargetImage = Bitmap<Vector4f>;

impl<T> ops::Index<(usize, usize)> for Bitmap<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &T {
        assert!(index.0 < self.width && index.1 < self.height,
                "pixel ({}, {}) out of {}x{} bitmap", index.0, index.1, self.width, self.height);
        &self.data[index.0 + self.width * index.1]
    }
}

impl<T> ops::IndexMut<(usize, usize)> for Bitmap<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut T {
        assert!(index.0 < self.width && index.1 < self.height,
                "pixel ({}, {}) out of {}x{} bitmap", index.0, index.1, self.width, self.height);
        &mut self.data[index.0 + self.width * index.1]
    }
}

impl<T: Clone + Default> Bitmap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Clone> Bitmap<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self { data: vec![value; width * height],
               width,
               height }
    }

    /// Copy with the row order reversed, for file formats stored top-down.
    pub fn flipped_vertically(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks(self.width.max(1)).rev() {
            data.extend_from_slice(row);
        }
        Self { data, width: self.width, height: self.height }
    }
}

impl<T> Bitmap<T> {
    /// Wraps an existing row-major buffer; `None` when the length does not match.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self { data, width, height })
    }

    pub fn from_fn<F: FnMut(usize, usize) -> T>(width: usize, height: usize, mut f: F) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { data, width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pixels(&self) -> &[T] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<T> {
        self.data
    }
}
