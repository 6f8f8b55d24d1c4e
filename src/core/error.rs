// Copyright @yucwang 2026

use crate::math::constants::Float;

use std::fmt;

/// Failures raised by the depth mapping pipeline. All of them are local to
/// the operation that produced them.
#[derive(Debug)]
pub enum MappingError {
    /// `max_range` was zero, negative or not finite.
    InvalidRange(Float),
    InvalidResolution { width: usize, height: usize },
    /// A composite or viewpoint sync had nothing to act on.
    MissingTarget(String),
    EmptySourceSet,
    /// Workers finished without delivering every row block.
    RenderIncomplete { completed: usize, expected: usize },
    UnsupportedFormat(String),
    Io(std::io::Error),
    Image(image::ImageError),
    Exr(exr::error::Error),
}

impl From<std::io::Error> for MappingError {
    fn from(err: std::io::Error) -> Self {
        MappingError::Io(err)
    }
}

impl From<image::ImageError> for MappingError {
    fn from(err: image::ImageError) -> Self {
        MappingError::Image(err)
    }
}

impl From<exr::error::Error> for MappingError {
    fn from(err: exr::error::Error) -> Self {
        MappingError::Exr(err)
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::InvalidRange(range) => write!(f, "max range must be positive, got {}", range),
            MappingError::InvalidResolution { width, height } =>
                write!(f, "resolution must be at least 1x1, got {}x{}", width, height),
            MappingError::MissingTarget(what) => write!(f, "missing target: {}", what),
            MappingError::EmptySourceSet => write!(f, "no source images to process"),
            MappingError::RenderIncomplete { completed, expected } =>
                write!(f, "render finished {} of {} row blocks", completed, expected),
            MappingError::UnsupportedFormat(ext) => write!(f, "unsupported image format: {}", ext),
            MappingError::Io(err) => write!(f, "io error: {}", err),
            MappingError::Image(err) => write!(f, "image error: {}", err),
            MappingError::Exr(err) => write!(f, "exr error: {}", err),
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingError::Io(err) => Some(err),
            MappingError::Image(err) => Some(err),
            MappingError::Exr(err) => Some(err),
            _ => None,
        }
    }
}
