//! Default parameters for capture, enhancement and detection
//!
//! These are the values the field deployment was run with. Every one of them
//! is exposed through [`crate::config::PipelineConfig`]; the constants only
//! provide the defaults.

/// Camera acquisition defaults
pub mod camera {
    /// Capture width in pixels
    pub const WIDTH: i32 = 1024;

    /// Capture height in pixels
    pub const HEIGHT: i32 = 768;

    /// The camera is mounted upside down
    pub const ROTATION_DEGREES: i32 = 180;

    /// Frames discarded after opening the device so exposure can settle
    pub const WARMUP_FRAMES: u32 = 5;
}

/// Contrast Limited Adaptive Histogram Equalization parameters
pub mod clahe {
    /// Contrast clip limit
    pub const CLIP_LIMIT: f64 = 2.0;

    /// Tiles per image side
    pub const TILE_GRID: i32 = 8;
}

/// HSV target ranges in OpenCV 8-bit scale (H 0-179, S/V 0-255)
pub mod hsv {
    /// Rust pustules on leaves
    pub const RUST_LOWER: [u8; 3] = [0, 150, 150];
    pub const RUST_UPPER: [u8; 3] = [30, 255, 255];

    /// Yellow discoloration
    pub const YELLOW_LOWER: [u8; 3] = [15, 90, 90];
    pub const YELLOW_UPPER: [u8; 3] = [55, 255, 255];

    /// Orange discoloration
    pub const ORANGE_LOWER: [u8; 3] = [5, 100, 100];
    pub const ORANGE_UPPER: [u8; 3] = [22, 255, 255];

    /// Largest hue value in the 8-bit representation
    pub const MAX_HUE: u8 = 179;
}

/// Detection thresholds
pub mod thresholds {
    /// Regions smaller than this (px²) are treated as noise by the box variant
    pub const MIN_REGION_AREA: f64 = 100.0;

    /// Coverage percentage above which a capture is classified positive
    pub const POSITIVE_PERCENTAGE: f64 = 5.0;
}

/// Annotation appearance
pub mod annotation {
    /// Box color for bounding-box annotation
    pub const BOX_COLOR_HEX: &str = "#00FF00";

    /// Line color for contour outlines
    pub const OUTLINE_COLOR_HEX: &str = "#0000FF";

    /// Percentage overlay color
    pub const TEXT_COLOR_HEX: &str = "#FFFFFF";

    pub const BOX_THICKNESS: i32 = 2;
    pub const OUTLINE_THICKNESS: i32 = 4;

    /// Label drawn above each bounding box
    pub const REGION_LABEL: &str = "Rust";
    pub const LABEL_FONT_SCALE: f64 = 0.5;
    pub const LABEL_OFFSET_Y: i32 = 10;

    /// Overlay anchor: x from the left edge, y from the bottom edge
    pub const OVERLAY_X: i32 = 50;
    pub const OVERLAY_BOTTOM_MARGIN: i32 = 20;
    pub const OVERLAY_FONT_SCALE: f64 = 1.0;
    pub const OVERLAY_THICKNESS: i32 = 2;
}

/// Persistence defaults
pub mod storage {
    pub const ROOT_DIR: &str = "515";
    pub const RAW_CONTAINER: &str = "mile3raw";
    pub const PROCESSED_CONTAINER: &str = "mile3processed";
    pub const TABLE: &str = "mile3";
    pub const PARTITION_KEY: &str = "ImageInfo";
    pub const JPEG_QUALITY: i32 = 95;
}

/// Sensor defaults
pub mod sensor {
    /// IIO sysfs directory of the BME280 on the first I2C bus
    pub const IIO_DEVICE_DIR: &str = "/sys/bus/iio/devices/iio:device0";
}
