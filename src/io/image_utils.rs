// Copyright @yucwang 2026

use crate::core::error::MappingError;
use crate::math::bitmap::{Bitmap, DepthImage, TargetImage};
use crate::math::constants::{Float, Vector4f};

use exr::prelude::*;
use image::codecs::jpeg::JpegEncoder;
use image::io::Reader as ImageReader;
use image::{ColorType, GenericImageView, Rgba, RgbaImage};

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEPTH_EXTENSION: &str = "jpg";
pub const DEPTH_JPEG_QUALITY: u8 = 75;

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn to_byte(v: Float) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes `image` as an 8-bit grayscale JPEG at `path` with `.jpg` appended.
pub fn save_depth_image<P: AsRef<Path>>(image: &DepthImage, path: P) -> std::result::Result<PathBuf, MappingError> {
    let (width, height) = (image.width(), image.height());
    if image.is_empty() {
        return Err(MappingError::InvalidResolution { width, height });
    }

    let mut file_name: OsString = path.as_ref().as_os_str().to_owned();
    file_name.push(".");
    file_name.push(DEPTH_EXTENSION);
    let file_path = PathBuf::from(file_name);
    log::info!("Writing depth map to: {}.", file_path.display());

    let bytes: Vec<u8> = image.flipped_vertically().pixels().iter().map(|v| to_byte(*v)).collect();
    let mut writer = BufWriter::new(File::create(&file_path)?);
    JpegEncoder::new_with_quality(&mut writer, DEPTH_JPEG_QUALITY)
        .encode(&bytes, width as u32, height as u32, ColorType::L8)?;
    writer.flush()?;
    Ok(file_path)
}

struct RgbaPixels {
    width: usize,
    height: usize,
    data: Vec<Vector4f>,
}

fn read_exr(path: &Path) -> std::result::Result<TargetImage, MappingError> {
    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _| RgbaPixels {
                width: resolution.width(),
                height: resolution.height(),
                data: vec![Vector4f::zeros(); resolution.width() * resolution.height()],
            },
            |image, position, (r, g, b, a): (f32, f32, f32, f32)| {
                let idx = position.y() * image.width + position.x();
                image.data[idx] = Vector4f::new(r, g, b, a);
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_file(path)?;

    let pixels = image.layer_data.channel_data.pixels;
    let top_down = Bitmap::from_vec(pixels.width, pixels.height, pixels.data)
        .ok_or(MappingError::InvalidResolution { width: pixels.width, height: pixels.height })?;
    Ok(top_down.flipped_vertically())
}

fn read_ldr(path: &Path) -> std::result::Result<TargetImage, MappingError> {
    let img = ImageReader::open(path)?.decode()?;
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba32f();
    let (width, height) = (width as usize, height as usize);

    // Files are stored top row first.
    Ok(Bitmap::from_fn(width, height, |x, y| {
        let p = rgba.get_pixel(x as u32, (height - 1 - y) as u32);
        Vector4f::new(p[0], p[1], p[2], p[3])
    }))
}

/// Loads a panorama as float RGBA. EXR is read as-is; other formats are
/// normalized to `[0, 1]`.
pub fn load_target_image<P: AsRef<Path>>(path: P) -> std::result::Result<TargetImage, MappingError> {
    let path = path.as_ref();
    log::info!("Loading panorama from: {}.", path.display());
    match extension_of(path).as_str() {
        "exr" => read_exr(path),
        _ => read_ldr(path),
    }
}

/// Writes a panorama with its alpha channel. EXR keeps float values; PNG,
/// TGA and TIFF are quantized to 8 bits.
pub fn save_target_image<P: AsRef<Path>>(image: &TargetImage, path: P) -> std::result::Result<(), MappingError> {
    let path = path.as_ref();
    let (width, height) = (image.width(), image.height());
    if image.is_empty() {
        return Err(MappingError::InvalidResolution { width, height });
    }

    let ext = extension_of(path);
    log::info!("Writing panorama to: {}.", path.display());
    match ext.as_str() {
        "exr" => {
            write_rgba_file(path, width, height, |x, y| {
                let p = image[(x, height - 1 - y)];
                (p.x, p.y, p.z, p.w)
            })?;
            Ok(())
        }
        "png" | "tga" | "tif" | "tiff" => {
            let out = RgbaImage::from_fn(width as u32, height as u32, |x, y| {
                let p = image[(x as usize, height - 1 - y as usize)];
                Rgba([to_byte(p.x), to_byte(p.y), to_byte(p.z), to_byte(p.w)])
            });
            out.save(path)?;
            Ok(())
        }
        _ => Err(MappingError::UnsupportedFormat(ext)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("panodepth_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_depth_jpeg_appends_extension_and_keeps_orientation() {
        // Bright top half, black bottom half.
        let image = DepthImage::from_fn(16, 16, |_, y| if y >= 8 { 1.0 } else { 0.0 });
        let stem = temp_path("depth");
        let written = save_depth_image(&image, &stem).unwrap();
        assert_eq!(written.extension().and_then(|s| s.to_str()), Some("jpg"));

        let loaded = load_target_image(&written).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (16, 16));
        assert!(loaded[(2, 1)].x < 0.1);
        assert!(loaded[(2, 14)].x > 0.9);
        assert!((loaded[(2, 14)].w - 1.0).abs() < 1e-6);
        let _ = std::fs::remove_file(written);
    }

    #[test]
    fn test_png_round_trip_keeps_alpha() {
        let image = TargetImage::from_fn(3, 2, |x, y| {
            Vector4f::new(x as Float / 2.0, y as Float, 0.2, if y == 0 { 0.0 } else { 1.0 })
        });
        let path = temp_path("pano.png");
        save_target_image(&image, &path).unwrap();
        let loaded = load_target_image(&path).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                assert!((loaded[(x, y)] - image[(x, y)]).norm() < 1.0 / 255.0);
            }
        }
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_exr_round_trip_is_exact() {
        let image = TargetImage::from_fn(4, 3, |x, y| Vector4f::new(x as Float * 1.5, y as Float, 7.25, 0.5));
        let path = temp_path("pano.exr");
        save_target_image(&image, &path).unwrap();
        assert_eq!(load_target_image(&path).unwrap(), image);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_formats_without_alpha_are_rejected() {
        let image = TargetImage::filled(2, 2, Vector4f::zeros());
        let result = save_target_image(&image, temp_path("pano.jpg"));
        assert!(matches!(result, Err(MappingError::UnsupportedFormat(ref ext)) if ext == "jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_depth_write_to_full_disk_is_io_error() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        let stem = temp_path("full_disk");
        let mut link = stem.clone().into_os_string();
        link.push(".jpg");
        let link = PathBuf::from(link);
        let _ = std::fs::remove_file(&link);
        std::os::unix::fs::symlink("/dev/full", &link).unwrap();

        let result = save_depth_image(&DepthImage::filled(4, 4, 0.5), &stem);
        let _ = std::fs::remove_file(&link);
        assert!(matches!(result, Err(MappingError::Io(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_target_image(temp_path("does_not_exist.png"));
        assert!(matches!(result, Err(MappingError::Io(_))));
    }
}
