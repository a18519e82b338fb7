//! Image file loading
//!
//! Decodes still images into OpenCV Mats in BGR order so file input and
//! camera input look the same to the processing stages.
//!
//! ## Supported Formats
//!
//! Standard formats (via `image` crate):
//! - JPEG, PNG, GIF, WebP, TIFF, BMP, TGA, PNM, QOI
//!
//! Apple formats (via `libheif-rs`, `heif` feature):
//! - HEIC, HEIF

use crate::error::{Result, ScanError};
use opencv::core::Mat;
use std::path::Path;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    /// First frame only
    Gif,
    WebP,
    Tiff,
    Bmp,
    Tga,
    /// PBM, PGM, PPM
    Pnm,
    Qoi,
    /// HEIC/HEIF (Apple)
    Heic,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::WebP),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            "bmp" => Some(ImageFormat::Bmp),
            "tga" => Some(ImageFormat::Tga),
            "pbm" | "pgm" | "ppm" | "pnm" => Some(ImageFormat::Pnm),
            "qoi" => Some(ImageFormat::Qoi),
            "heic" | "heif" => Some(ImageFormat::Heic),
            _ => None,
        }
    }

    /// Check if format requires libheif
    pub fn requires_heif(&self) -> bool {
        matches!(self, ImageFormat::Heic)
    }
}

/// Load an image from disk as a BGR Mat
///
/// # Errors
///
/// Returns `CaptureError` if the extension is unknown, the file cannot be
/// opened, or decoding fails.
pub fn load_image(path: &Path) -> Result<Mat> {
    let format = ImageFormat::from_extension(path).ok_or_else(|| ScanError::CaptureError {
        message: format!("Unknown image format for file: {}", path.display()),
        source: None,
    })?;

    if format.requires_heif() {
        load_heic(path)
    } else {
        load_standard(path)
    }
}

/// Load image using the `image` crate (standard formats)
fn load_standard(path: &Path) -> Result<Mat> {
    use image::ImageReader;

    let reader = ImageReader::open(path).map_err(|e| {
        ScanError::capture(format!("Failed to open image file: {}", path.display()), e)
    })?;

    let img = reader.decode().map_err(|e| {
        ScanError::capture(format!("Failed to decode image: {}", path.display()), e)
    })?;

    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    rgb_to_bgr_mat(&rgb_img.into_raw(), width as i32, height as i32)
}

#[cfg(feature = "heif")]
fn load_heic(path: &Path) -> Result<Mat> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();

    let path_str = path.to_str().ok_or_else(|| ScanError::CaptureError {
        message: format!("Invalid file path encoding: {}", path.display()),
        source: None,
    })?;

    let ctx = HeifContext::read_from_file(path_str).map_err(|e| {
        ScanError::capture(format!("Failed to read HEIC file: {}", path.display()), e)
    })?;

    let handle = ctx
        .primary_image_handle()
        .map_err(|e| ScanError::capture("Failed to get primary image handle", e))?;

    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| ScanError::capture("Failed to decode HEIC image", e))?;

    let planes = image.planes();
    let rgb_plane = planes.interleaved.ok_or_else(|| ScanError::CaptureError {
        message: "HEIC image has no interleaved RGB data".to_string(),
        source: None,
    })?;

    let width = handle.width() as i32;
    let height = handle.height() as i32;
    let stride = rgb_plane.stride as usize;
    let data = rgb_plane.data;

    // Rows may be padded past width * 3
    let expected_row_bytes = (width * 3) as usize;
    let rgb_data: Vec<u8> = if stride == expected_row_bytes {
        data.to_vec()
    } else {
        let mut packed = Vec::with_capacity(expected_row_bytes * height as usize);
        for row in 0..height as usize {
            let row_start = row * stride;
            packed.extend_from_slice(&data[row_start..row_start + expected_row_bytes]);
        }
        packed
    };

    rgb_to_bgr_mat(&rgb_data, width, height)
}

#[cfg(not(feature = "heif"))]
fn load_heic(path: &Path) -> Result<Mat> {
    Err(ScanError::CaptureError {
        message: format!(
            "HEIC support not compiled in (enable the `heif` feature): {}",
            path.display()
        ),
        source: None,
    })
}

/// Convert a packed RGB byte buffer to an OpenCV BGR Mat
fn rgb_to_bgr_mat(rgb_data: &[u8], width: i32, height: i32) -> Result<Mat> {
    use opencv::core::{Vec3b, VecN, CV_8UC3};
    use opencv::prelude::*;

    let expected = (width as usize) * (height as usize) * 3;
    if width <= 0 || height <= 0 || rgb_data.len() != expected {
        return Err(ScanError::InvalidImage {
            rows: height,
            cols: width,
            channels: 3,
        });
    }

    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, opencv::core::Scalar::all(0.0))
        .map_err(|e| ScanError::opencv("Mat allocation", e))?;

    for (i, rgb) in rgb_data.chunks_exact(3).enumerate() {
        let y = i as i32 / width;
        let x = i as i32 % width;
        let pixel = mat
            .at_2d_mut::<Vec3b>(y, x)
            .map_err(|e| ScanError::opencv("pixel access", e))?;
        *pixel = VecN([rgb[2], rgb[1], rgb[0]]);
    }

    Ok(mat)
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &[
        "jpg", "jpeg", "png", "gif", "webp", "tiff", "tif", "bmp", "tga", "pbm", "pgm", "ppm",
        "pnm", "qoi", "heic", "heif",
    ]
}

/// Check if a file extension is supported
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.to_lowercase();
    supported_extensions().contains(&ext_lower.as_str())
}
