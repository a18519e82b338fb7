//! Configuration structures for the leaf_scan capture pipeline.
//!
//! Every tunable of the pipeline lives here, grouped by stage. The defaults
//! reproduce the field deployment exactly; a JSON file can override any of
//! them.
//!
//! # Configuration Loading
//!
//! ```no_run
//! use leaf_scan::PipelineConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = PipelineConfig::from_json_file(Path::new("leaf-scan.json"))?;
//!
//! // Or use defaults
//! let config = PipelineConfig::default();
//! # Ok::<(), leaf_scan::ScanError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`CameraConfig`]: device, resolution and mounting rotation
//! - [`EnhancementConfig`]: CLAHE parameters
//! - [`DetectionConfig`]: HSV ranges, noise filter, annotation, status threshold
//! - [`StorageConfig`]: blob containers and table name
//! - [`SensorConfig`]: BME280 location

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::annotate::AnnotationStyle;
use crate::constants;
use crate::detection::HsvRange;
use crate::{Result, ScanError};

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub camera: CameraConfig,

    pub enhancement: EnhancementConfig,

    pub detection: DetectionConfig,

    pub storage: StorageConfig,

    pub sensor: SensorConfig,
}

/// Camera acquisition parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Video device index passed to OpenCV
    pub device_index: i32,

    /// Requested frame width in pixels
    pub width: i32,

    /// Requested frame height in pixels
    pub height: i32,

    /// Rotation applied to every raw frame (0 or 180)
    pub rotation_degrees: i32,

    /// Frames read and dropped before the captured frame
    #[serde(default)]
    pub warmup_frames: u32,
}

/// Contrast enhancement (CLAHE) parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementConfig {
    /// Contrast clip limit
    pub clip_limit: f64,

    /// Number of tiles along each image side
    pub tile_grid: i32,
}

/// Color detection and annotation parameters.
///
/// A pixel matches when it falls inside any of `ranges`. Regions smaller
/// than `min_region_area` are ignored for annotation; the coverage
/// percentage always counts every matching pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Target HSV ranges, OR-combined
    pub ranges: Vec<HsvRange>,

    /// Noise filter in px²; `None` keeps every region
    pub min_region_area: Option<f64>,

    /// How detected regions are drawn
    pub style: AnnotationStyle,

    /// Coverage percentage above which a capture is positive
    pub positive_threshold: f64,

    pub annotation: AnnotationConfig,
}

/// Annotation colors and label text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Bounding box and label color (hex)
    pub box_color: String,

    /// Contour outline color (hex)
    pub outline_color: String,

    /// Percentage overlay color (hex)
    pub text_color: String,

    /// Text drawn above each bounding box
    pub region_label: String,
}

/// Persistence targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the local store
    pub root: PathBuf,

    /// Container receiving rotated raw captures
    pub raw_container: String,

    /// Container receiving annotated captures
    pub processed_container: String,

    /// Table receiving telemetry records
    pub table: String,

    /// Partition key written with every record
    pub partition_key: String,

    /// JPEG encoder quality (0-100)
    pub jpeg_quality: i32,
}

/// Environmental sensor location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// IIO sysfs directory exposing the BME280 channels
    pub iio_device_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            enhancement: EnhancementConfig::default(),
            detection: DetectionConfig::yellow_orange(),
            storage: StorageConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: constants::camera::WIDTH,
            height: constants::camera::HEIGHT,
            rotation_degrees: constants::camera::ROTATION_DEGREES,
            warmup_frames: constants::camera::WARMUP_FRAMES,
        }
    }
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            clip_limit: constants::clahe::CLIP_LIMIT,
            tile_grid: constants::clahe::TILE_GRID,
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            box_color: constants::annotation::BOX_COLOR_HEX.to_string(),
            outline_color: constants::annotation::OUTLINE_COLOR_HEX.to_string(),
            text_color: constants::annotation::TEXT_COLOR_HEX.to_string(),
            region_label: constants::annotation::REGION_LABEL.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(constants::storage::ROOT_DIR),
            raw_container: constants::storage::RAW_CONTAINER.to_string(),
            processed_container: constants::storage::PROCESSED_CONTAINER.to_string(),
            table: constants::storage::TABLE.to_string(),
            partition_key: constants::storage::PARTITION_KEY.to_string(),
            jpeg_quality: constants::storage::JPEG_QUALITY,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            iio_device_dir: PathBuf::from(constants::sensor::IIO_DEVICE_DIR),
        }
    }
}

impl DetectionConfig {
    /// Single rust range with a 100 px² noise filter, drawn as labeled boxes
    pub fn leaf_rust() -> Self {
        Self {
            ranges: vec![HsvRange::new(
                constants::hsv::RUST_LOWER,
                constants::hsv::RUST_UPPER,
            )],
            min_region_area: Some(constants::thresholds::MIN_REGION_AREA),
            style: AnnotationStyle::BoundingBox,
            positive_threshold: constants::thresholds::POSITIVE_PERCENTAGE,
            annotation: AnnotationConfig::default(),
        }
    }

    /// Yellow and orange ranges, every region outlined
    pub fn yellow_orange() -> Self {
        Self {
            ranges: vec![
                HsvRange::new(constants::hsv::YELLOW_LOWER, constants::hsv::YELLOW_UPPER),
                HsvRange::new(constants::hsv::ORANGE_LOWER, constants::hsv::ORANGE_UPPER),
            ],
            min_region_area: None,
            style: AnnotationStyle::Outline,
            positive_threshold: constants::thresholds::POSITIVE_PERCENTAGE,
            annotation: AnnotationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::config(format!("Failed to read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ScanError::config(format!("Failed to parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json).map_err(|e| {
            ScanError::config(format!("Failed to write {}", path.display()), e)
        })?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| ScanError::ConfigError {
            message,
            source: None,
        };

        if !matches!(self.camera.rotation_degrees, 0 | 180) {
            return Err(invalid(format!(
                "camera.rotation_degrees must be 0 or 180, got {}",
                self.camera.rotation_degrees
            )));
        }
        if self.camera.width <= 0 || self.camera.height <= 0 {
            return Err(invalid(format!(
                "camera resolution must be positive, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        if !(self.enhancement.clip_limit > 0.0) {
            return Err(invalid(format!(
                "enhancement.clip_limit must be positive, got {}",
                self.enhancement.clip_limit
            )));
        }
        if self.enhancement.tile_grid <= 0 {
            return Err(invalid(format!(
                "enhancement.tile_grid must be positive, got {}",
                self.enhancement.tile_grid
            )));
        }
        if !(0..=100).contains(&self.storage.jpeg_quality) {
            return Err(invalid(format!(
                "storage.jpeg_quality must be within 0-100, got {}",
                self.storage.jpeg_quality
            )));
        }

        self.detection.validate()
    }
}

impl DetectionConfig {
    /// Check ranges and thresholds
    pub fn validate(&self) -> Result<()> {
        if self.ranges.is_empty() {
            return Err(ScanError::ConfigError {
                message: "detection.ranges must contain at least one range".to_string(),
                source: None,
            });
        }
        for range in &self.ranges {
            range.validate()?;
        }
        if let Some(area) = self.min_region_area {
            if !(area >= 0.0) {
                return Err(ScanError::ConfigError {
                    message: format!("detection.min_region_area must be non-negative, got {}", area),
                    source: None,
                });
            }
        }
        if !(0.0..=100.0).contains(&self.positive_threshold) {
            return Err(ScanError::ConfigError {
                message: format!(
                    "detection.positive_threshold must be within 0-100, got {}",
                    self.positive_threshold
                ),
                source: None,
            });
        }
        Ok(())
    }
}
