// Copyright @yucwang 2026

use crate::core::error::MappingError;
use crate::math::constants::Float;

/// Maps hit distances to grayscale intensities: `1 - d / max_range`,
/// black for misses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthEncoder {
    max_range: Float,
    inv_max_range: Float,
}

impl DepthEncoder {
    pub fn new(max_range: Float) -> Result<Self, MappingError> {
        if !(max_range > 0.0) || !max_range.is_finite() {
            return Err(MappingError::InvalidRange(max_range));
        }
        Ok(Self { max_range, inv_max_range: 1.0 / max_range })
    }

    pub fn max_range(&self) -> Float {
        self.max_range
    }

    pub fn encode(&self, hit: Option<Float>) -> Float {
        match hit {
            Some(distance) => (1.0 - distance * self.inv_max_range).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

/// One-shot form of [`DepthEncoder::encode`] that validates `max_range`.
pub fn encode_depth(hit: Option<Float>, max_range: Float) -> Result<Float, MappingError> {
    Ok(DepthEncoder::new(max_range)?.encode(hit))
}
