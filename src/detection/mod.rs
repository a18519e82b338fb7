//! Target color detection module
//!
//! This module thresholds images in HSV space and turns the resulting mask
//! into regions and a coverage percentage.

pub mod hsv;
pub mod regions;

pub use hsv::HsvRange;
pub use regions::{coverage_percentage, ColorRegionDetector, Detection, Region};
