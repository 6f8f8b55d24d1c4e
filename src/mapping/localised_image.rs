// Copyright @yucwang 2026

use crate::math::bitmap::TargetImage;
use crate::sensors::viewpoint::Viewpoint;

use std::path::PathBuf;

/// A panorama tied to the pose it was captured from.
#[derive(Debug, Clone)]
pub struct LocalisedImage {
    pub id: String,
    pub image: Option<TargetImage>,
    pub viewpoint: Viewpoint,
    pub source_path: Option<PathBuf>,
}

impl LocalisedImage {
    pub fn new(id: &str, viewpoint: Viewpoint) -> Self {
        Self { id: id.to_string(), image: None, viewpoint, source_path: None }
    }

    pub fn with_image(mut self, image: TargetImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_source_path(mut self, path: PathBuf) -> Self {
        self.source_path = Some(path);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalisedImageList {
    images: Vec<LocalisedImage>,
}

impl LocalisedImageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `image`, replacing any entry with the same id.
    pub fn push(&mut self, image: LocalisedImage) {
        match self.images.iter_mut().find(|i| i.id == image.id) {
            Some(existing) => *existing = image,
            None => self.images.push(image),
        }
    }

    pub fn get(&self, id: &str) -> Option<&LocalisedImage> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut LocalisedImage> {
        self.images.iter_mut().find(|i| i.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.id.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocalisedImage> {
        self.images.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, LocalisedImage> {
        self.images.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
