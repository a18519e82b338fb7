//! Color notation and conversion module
//!
//! This module converts between the hex/sRGB notation used in configuration
//! files and the BGR / 8-bit HSV conventions used by the OpenCV stages.

pub mod conversion;

pub use conversion::ColorConverter;
