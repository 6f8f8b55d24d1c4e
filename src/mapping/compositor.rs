// Copyright @yucwang 2026

use crate::core::error::MappingError;
use crate::math::bitmap::{DepthImage, TargetImage};

use super::localised_image::LocalisedImage;

/// Maps `value` from `[low1, high1)` onto `[low2, high2)`, floored to a
/// pixel index and clamped to the destination range.
pub fn lerp_index(value: usize, low1: usize, high1: usize, low2: usize, high2: usize) -> usize {
    if high1 <= low1 || high2 <= low2 {
        return low2;
    }
    let scaled = low2 as f64
        + (value as f64 - low1 as f64) * (high2 - low2) as f64 / (high1 - low1) as f64;
    (scaled.floor().max(low2 as f64) as usize).min(high2 - 1)
}

/// Writes the depth intensities of `source` into the alpha channel of
/// `target`, nearest-neighbour resampled. Colour channels are untouched.
pub fn composite_depth_alpha(source: &DepthImage, target: &mut TargetImage) -> Result<(), MappingError> {
    if source.is_empty() {
        return Err(MappingError::EmptySourceSet);
    }

    let (src_w, src_h) = (source.width(), source.height());
    let (dst_w, dst_h) = (target.width(), target.height());
    let columns: Vec<usize> = (0..dst_w).map(|tx| lerp_index(tx, 0, dst_w, 0, src_w)).collect();

    for ty in 0..dst_h {
        let sy = lerp_index(ty, 0, dst_h, 0, src_h);
        for (tx, sx) in columns.iter().enumerate() {
            target[(tx, ty)].w = source[(*sx, sy)];
        }
    }
    Ok(())
}

/// Composites into a localised image's panorama. Both the image record and
/// its pixel buffer must be present.
pub fn composite_into(source: &DepthImage, target: Option<&mut LocalisedImage>) -> Result<(), MappingError> {
    let target = target.ok_or_else(|| MappingError::MissingTarget("no target image".to_string()))?;
    let id = target.id.clone();
    let pixels = target.image.as_mut()
        .ok_or_else(|| MappingError::MissingTarget(format!("image '{}' has no pixels loaded", id)))?;
    composite_depth_alpha(source, pixels)?;
    log::debug!("Composited {}x{} depth into '{}'.", source.width(), source.height(), id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::{Float, Vector4f};
    use crate::sensors::viewpoint::Viewpoint;

    fn panorama(width: usize, height: usize) -> TargetImage {
        TargetImage::from_fn(width, height, |x, y| Vector4f::new(x as Float * 0.1, y as Float * 0.2, 0.3, 1.0))
    }

    #[test]
    fn test_upscale_by_two_fills_blocks() {
        let source = DepthImage::from_fn(3, 3, |x, y| (y * 3 + x) as Float / 10.0);
        let mut target = panorama(6, 6);
        let before = target.clone();
        composite_depth_alpha(&source, &mut target).unwrap();

        for j in 0..3 {
            for i in 0..3 {
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    assert_eq!(target[(2 * i + dx, 2 * j + dy)].w, source[(i, j)]);
                }
            }
        }
        for (after, before) in target.pixels().iter().zip(before.pixels()) {
            assert_eq!((after.x, after.y, after.z), (before.x, before.y, before.z));
        }
    }

    #[test]
    fn test_non_integer_ratios_are_pinned() {
        let three_to_five: Vec<usize> = (0..5).map(|t| lerp_index(t, 0, 5, 0, 3)).collect();
        assert_eq!(three_to_five, vec![0, 0, 1, 1, 2]);
        let four_to_six: Vec<usize> = (0..6).map(|t| lerp_index(t, 0, 6, 0, 4)).collect();
        assert_eq!(four_to_six, vec![0, 0, 1, 2, 2, 3]);
        // Downscale skips source columns.
        let five_to_two: Vec<usize> = (0..2).map(|t| lerp_index(t, 0, 2, 0, 5)).collect();
        assert_eq!(five_to_two, vec![0, 2]);
    }

    #[test]
    fn test_composite_with_mismatched_aspect() {
        let source = DepthImage::from_fn(3, 2, |x, y| (x + 10 * y) as Float);
        let mut target = panorama(5, 3);
        composite_depth_alpha(&source, &mut target).unwrap();
        // Columns 0,0,1,1,2 and rows 0,0,1.
        assert_eq!(target[(1, 1)].w, 0.0);
        assert_eq!(target[(3, 1)].w, 1.0);
        assert_eq!(target[(4, 2)].w, 12.0);
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let mut target = panorama(2, 2);
        let result = composite_depth_alpha(&DepthImage::new(0, 0), &mut target);
        assert!(matches!(result, Err(MappingError::EmptySourceSet)));
        assert_eq!(target, panorama(2, 2));
    }

    #[test]
    fn test_missing_targets() {
        let source = DepthImage::filled(2, 2, 0.5);
        assert!(matches!(composite_into(&source, None), Err(MappingError::MissingTarget(_))));

        let mut unloaded = LocalisedImage::new("hall", Viewpoint::default());
        assert!(matches!(composite_into(&source, Some(&mut unloaded)), Err(MappingError::MissingTarget(_))));

        let mut loaded = LocalisedImage::new("hall", Viewpoint::default()).with_image(panorama(4, 4));
        composite_into(&source, Some(&mut loaded)).unwrap();
        assert!(loaded.image.as_ref().unwrap().pixels().iter().all(|p| p.w == 0.5));
    }
}
