//! Color region detection in HSV space
//!
//! Implements target-color detection that:
//! - Thresholds the image against one or more HSV ranges and OR-combines them
//! - Extracts outer contours of the combined mask (nested contours ignored)
//! - Drops regions below an optional noise area
//! - Reports the fraction of the image covered by matching pixels
//!
//! Thresholding happens on hue and saturation rather than raw BGR because
//! both stay comparatively stable across outdoor lighting changes.

use log::debug;
use opencv::{
    core::{self, Mat, Point, Rect, Vector},
    imgproc::{
        bounding_rect, contour_area, cvt_color_def, find_contours, CHAIN_APPROX_SIMPLE,
        COLOR_BGR2HSV, COLOR_BGRA2BGR, RETR_EXTERNAL,
    },
    prelude::*,
};

use super::HsvRange;
use crate::config::DetectionConfig;
use crate::{Result, ScanError};

type VectorOfPoint = Vector<Point>;

/// One connected group of matching pixels
#[derive(Debug, Clone)]
pub struct Region {
    /// Outer boundary as traced in the mask
    pub contour: VectorOfPoint,
    /// Axis-aligned bounding rectangle of the contour
    pub bounding_rect: Rect,
    /// Area enclosed by the contour in px²
    pub area: f64,
}

/// Detector output before annotation
#[derive(Debug, Clone)]
pub struct Detection {
    /// Combined binary mask (255 = target color)
    pub mask: Mat,
    /// Regions that passed the area filter, in contour order
    pub regions: Vec<Region>,
    /// Matching pixels as a percentage of the image, rounded to 2 decimals
    pub percentage: f64,
}

/// Detector implementing multi-range HSV thresholding with contour extraction
#[derive(Debug, Clone)]
pub struct ColorRegionDetector {
    ranges: Vec<HsvRange>,
    min_region_area: Option<f64>,
}

impl ColorRegionDetector {
    /// Create a detector for the given ranges
    ///
    /// `min_region_area` of `None` keeps every extracted region.
    pub fn new(ranges: Vec<HsvRange>, min_region_area: Option<f64>) -> Self {
        Self {
            ranges,
            min_region_area,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.ranges.clone(), config.min_region_area)
    }

    pub fn ranges(&self) -> &[HsvRange] {
        &self.ranges
    }

    /// Detect target-colored regions in a BGR image
    ///
    /// # Errors
    ///
    /// Returns `InvalidImage` for empty images or fewer than three channels,
    /// `ProcessingError` when no ranges are configured, and `OpenCvError`
    /// when an OpenCV call fails.
    pub fn detect(&self, image: &Mat) -> Result<Detection> {
        // Step 1-3: HSV threshold per range, OR-combined
        let mask = self.mask(image)?;

        // Step 4: outer contours only
        let mut contours = Vector::<VectorOfPoint>::new();
        find_contours(
            &mask,
            &mut contours,
            RETR_EXTERNAL,
            CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .map_err(|e| ScanError::opencv("find_contours", e))?;

        // Step 5-6: noise filter and bounding rectangles
        let mut regions = Vec::with_capacity(contours.len());
        for contour in contours.iter() {
            let area = contour_area(&contour, false)
                .map_err(|e| ScanError::opencv("contour_area", e))?;

            if let Some(min_area) = self.min_region_area {
                if area < min_area {
                    continue;
                }
            }

            let rect = bounding_rect(&contour).map_err(|e| ScanError::opencv("bounding_rect", e))?;
            regions.push(Region {
                contour,
                bounding_rect: rect,
                area,
            });
        }

        // Step 7: coverage from the mask, never from region areas
        let percentage = coverage_percentage(&mask)?;

        debug!(
            "Detected {} region(s) of {} contour(s), {:.2}% coverage",
            regions.len(),
            contours.len(),
            percentage
        );

        Ok(Detection {
            mask,
            regions,
            percentage,
        })
    }

    /// Build the combined binary mask for a BGR image
    pub fn mask(&self, image: &Mat) -> Result<Mat> {
        validate_image(image)?;

        if self.ranges.is_empty() {
            return Err(ScanError::processing("No HSV ranges configured"));
        }

        let mut converted = Mat::default();
        let bgr = if image.channels() == 4 {
            cvt_color_def(image, &mut converted, COLOR_BGRA2BGR)
                .map_err(|e| ScanError::opencv("cvt_color BGRA->BGR", e))?;
            &converted
        } else {
            image
        };

        let mut hsv = Mat::default();
        cvt_color_def(bgr, &mut hsv, COLOR_BGR2HSV)
            .map_err(|e| ScanError::opencv("cvt_color BGR->HSV", e))?;

        let mut combined: Option<Mat> = None;
        for range in &self.ranges {
            let mut range_mask = Mat::default();
            core::in_range(
                &hsv,
                &range.lower_scalar(),
                &range.upper_scalar(),
                &mut range_mask,
            )
            .map_err(|e| ScanError::opencv("in_range", e))?;

            combined = Some(match combined {
                None => range_mask,
                Some(previous) => {
                    let mut merged = Mat::default();
                    core::bitwise_or(&previous, &range_mask, &mut merged, &Mat::default())
                        .map_err(|e| ScanError::opencv("bitwise_or", e))?;
                    merged
                }
            });
        }

        combined.ok_or_else(|| ScanError::processing("Mask combination produced no output"))
    }
}

/// Percentage of set pixels in a single-channel mask, rounded to 2 decimals
pub fn coverage_percentage(mask: &Mat) -> Result<f64> {
    let total = mask.rows() as f64 * mask.cols() as f64;
    if total == 0.0 {
        return Err(ScanError::InvalidImage {
            rows: mask.rows(),
            cols: mask.cols(),
            channels: mask.channels(),
        });
    }

    let set = core::count_non_zero(mask).map_err(|e| ScanError::opencv("count_non_zero", e))?;
    Ok(round_hundredths(set as f64 / total * 100.0))
}

/// Round to two decimal places
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reject empty images and images with fewer than three 8-bit channels
pub fn validate_image(image: &Mat) -> Result<()> {
    let (rows, cols, channels) = (image.rows(), image.cols(), image.channels());
    if image.empty() || rows <= 0 || cols <= 0 || channels < 3 {
        return Err(ScanError::InvalidImage {
            rows,
            cols,
            channels,
        });
    }
    if image.depth() != core::CV_8U {
        return Err(ScanError::processing(format!(
            "Expected an 8-bit image, got depth {}",
            image.depth()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, Vec3b, VecN, CV_8UC1, CV_8UC3, CV_8UC4};

    fn solid(rows: i32, cols: i32, bgr: (f64, f64, f64)) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::new(bgr.0, bgr.1, bgr.2, 0.0))
            .unwrap()
    }

    fn rust_detector() -> ColorRegionDetector {
        ColorRegionDetector::new(vec![HsvRange::new([0, 150, 150], [30, 255, 255])], Some(100.0))
    }

    #[test]
    fn test_uniform_target_color_covers_everything() {
        // BGR (0, 100, 255) is an orange with hue ~12, full saturation and value
        let image = solid(100, 100, (0.0, 100.0, 255.0));
        let detection = rust_detector().detect(&image).unwrap();

        assert_eq!(detection.percentage, 100.0);
        assert_eq!(detection.regions.len(), 1);
        assert_eq!(detection.regions[0].bounding_rect, Rect::new(0, 0, 100, 100));
        assert!(detection.regions[0].area <= 100.0 * 100.0);
    }

    #[test]
    fn test_no_target_pixels() {
        let image = solid(100, 100, (128.0, 128.0, 128.0));
        let detection = rust_detector().detect(&image).unwrap();

        assert_eq!(detection.percentage, 0.0);
        assert!(detection.regions.is_empty());
    }

    #[test]
    fn test_small_regions_are_filtered_but_still_counted() {
        let mut image = solid(100, 100, (128.0, 128.0, 128.0));
        // 5x5 orange patch: area 16 px² after contour tracing
        for y in 10..15 {
            for x in 10..15 {
                *image.at_2d_mut::<Vec3b>(y, x).unwrap() = VecN([0, 100, 255]);
            }
        }

        let filtered = rust_detector().detect(&image).unwrap();
        assert!(filtered.regions.is_empty());
        assert_eq!(filtered.percentage, 0.25);

        let unfiltered = ColorRegionDetector::new(rust_detector().ranges().to_vec(), None)
            .detect(&image)
            .unwrap();
        assert_eq!(unfiltered.regions.len(), 1);
        assert_eq!(unfiltered.regions[0].bounding_rect, Rect::new(10, 10, 5, 5));
    }

    fn with_patch(side: i32) -> Mat {
        let mut image = solid(60, 60, (128.0, 128.0, 128.0));
        for y in 20..20 + side {
            for x in 20..20 + side {
                *image.at_2d_mut::<Vec3b>(y, x).unwrap() = VecN([0, 100, 255]);
            }
        }
        image
    }

    #[test]
    fn test_region_at_min_area_is_kept() {
        // 11x11 patch traces corner to corner: (11 - 1)² = 100 px²
        let at_limit = rust_detector().detect(&with_patch(11)).unwrap();
        assert_eq!(at_limit.regions.len(), 1);
        assert_eq!(at_limit.regions[0].area, 100.0);
        assert_eq!(at_limit.regions[0].bounding_rect, Rect::new(20, 20, 11, 11));

        // 10x10 patch traces to 81 px²
        let below = rust_detector().detect(&with_patch(10)).unwrap();
        assert!(below.regions.is_empty());
        assert!(below.percentage > 0.0);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        // Pure red is exactly H=0, S=255, V=255
        let image = solid(10, 10, (0.0, 0.0, 255.0));
        let exact = ColorRegionDetector::new(vec![HsvRange::new([0, 255, 255], [0, 255, 255])], None);
        assert_eq!(exact.detect(&image).unwrap().percentage, 100.0);
    }

    #[test]
    fn test_bgra_input_is_accepted() {
        let image =
            Mat::new_rows_cols_with_default(40, 40, CV_8UC4, Scalar::new(0.0, 100.0, 255.0, 255.0))
                .unwrap();
        let detection = rust_detector().detect(&image).unwrap();

        assert_eq!(detection.percentage, 100.0);
        assert_eq!(detection.regions.len(), 1);
        assert_eq!(detection.mask.channels(), 1);
        assert_eq!(detection.mask.rows(), 40);
    }

    #[test]
    fn test_ranges_are_or_combined() {
        let mut image = solid(20, 40, (128.0, 128.0, 128.0));
        // Left half pure blue (hue 120), right half orange (hue ~12)
        for y in 0..20 {
            for x in 0..20 {
                *image.at_2d_mut::<Vec3b>(y, x).unwrap() = VecN([255, 0, 0]);
            }
            for x in 20..40 {
                *image.at_2d_mut::<Vec3b>(y, x).unwrap() = VecN([0, 100, 255]);
            }
        }

        let orange_only = rust_detector().detect(&image).unwrap();
        assert_eq!(orange_only.percentage, 50.0);

        let both = ColorRegionDetector::new(
            vec![
                HsvRange::new([0, 150, 150], [30, 255, 255]),
                HsvRange::new([110, 150, 150], [130, 255, 255]),
            ],
            None,
        )
        .detect(&image)
        .unwrap();
        assert_eq!(both.percentage, 100.0);
        assert_eq!(both.regions.len(), 1);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let mut image = solid(60, 60, (40.0, 80.0, 40.0));
        for y in 5..25 {
            for x in 30..50 {
                *image.at_2d_mut::<Vec3b>(y, x).unwrap() = VecN([0, 100, 255]);
            }
        }
        let detector = rust_detector();
        let first = detector.detect(&image).unwrap();
        let second = detector.detect(&image).unwrap();

        assert_eq!(first.percentage, second.percentage);
        assert_eq!(first.regions.len(), second.regions.len());
        for (a, b) in first.regions.iter().zip(&second.regions) {
            assert_eq!(a.bounding_rect, b.bounding_rect);
            assert_eq!(a.area, b.area);
        }
    }

    #[test]
    fn test_invalid_images() {
        let detector = rust_detector();

        let empty = Mat::default();
        assert!(matches!(detector.detect(&empty), Err(ScanError::InvalidImage { .. })));

        let gray = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(0.0)).unwrap();
        assert!(matches!(
            detector.detect(&gray),
            Err(ScanError::InvalidImage { channels: 1, .. })
        ));
    }

    #[test]
    fn test_coverage_bounds() {
        let empty_mask = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(0.0)).unwrap();
        assert_eq!(coverage_percentage(&empty_mask).unwrap(), 0.0);

        let full_mask = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(255.0)).unwrap();
        assert_eq!(coverage_percentage(&full_mask).unwrap(), 100.0);

        let mut partial = empty_mask.clone();
        *partial.at_2d_mut::<u8>(0, 0).unwrap() = 255;
        let pct = coverage_percentage(&partial).unwrap();
        assert!(pct > 0.0 && pct < 100.0);
        assert_eq!(pct, 1.0);
    }

    #[test]
    fn test_round_hundredths() {
        assert_eq!(round_hundredths(33.333333), 33.33);
        assert_eq!(round_hundredths(66.666666), 66.67);
        assert_eq!(round_hundredths(0.0), 0.0);
    }
}
