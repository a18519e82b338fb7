//! # Leaf Scan
//!
//! A Rust crate for spotting rust-colored disease on plant leaves in
//! camera captures.
//!
//! This library provides:
//! - Camera and still-file image sources
//! - Orientation normalization and CLAHE contrast enhancement
//! - HSV color-range detection with contour extraction and coverage percentage
//! - Region and percentage annotation
//! - Sensor telemetry and persistence of images and records
//!
//! ## Example
//!
//! ```rust,no_run
//! use leaf_scan::{analyze_image, PipelineConfig};
//! use std::path::Path;
//!
//! let result = analyze_image(Path::new("leaf.jpg"), &PipelineConfig::default())?;
//! println!("{:.2}% of the leaf matches", result.percentage);
//! # Ok::<(), leaf_scan::ScanError>(())
//! ```

use std::path::Path;

pub mod annotate;
pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod enhance;
pub mod error;
pub mod image_loader;
pub mod naming;
pub mod orientation;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod telemetry;

pub use annotate::{AnnotationStyle, Annotator};
pub use config::{DetectionConfig, PipelineConfig};
pub use detection::{ColorRegionDetector, HsvRange};
pub use enhance::ContrastEnhancer;
pub use error::{Result, ScanError};
pub use pipeline::{CapturePipeline, CaptureReport, DetectionResult, ImageProcessor};
pub use telemetry::Status;

/// Run enhancement, detection and annotation on an image file
///
/// The file is processed as stored; no rotation is applied.
///
/// # Errors
///
/// Returns `CaptureError` if the file cannot be decoded, `ConfigError` for
/// an invalid configuration, and processing errors from the stages.
pub fn analyze_image(image_path: &Path, config: &PipelineConfig) -> Result<DetectionResult> {
    config.validate()?;
    let image = image_loader::load_image(image_path)?;
    ImageProcessor::from_config(config)?.process(&image)
}
