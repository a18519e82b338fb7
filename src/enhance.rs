//! Local contrast enhancement on the lightness channel
//!
//! Applies CLAHE (Contrast Limited Adaptive Histogram Equalization) to the
//! L* channel of CIE Lab and leaves a*/b* untouched, so hue and chroma of
//! the scene survive the enhancement.

use opencv::{
    core::{self, Mat, Size, Vector},
    imgproc::{self, cvt_color_def, COLOR_BGR2Lab, COLOR_Lab2BGR},
    prelude::*,
};

use crate::config::EnhancementConfig;
use crate::constants::clahe::{CLIP_LIMIT, TILE_GRID};
use crate::detection::regions::validate_image;
use crate::{Result, ScanError};

/// CLAHE-based contrast enhancer
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastEnhancer {
    clip_limit: f64,
    tile_grid: i32,
}

impl Default for ContrastEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContrastEnhancer {
    /// Clip limit 2.0 on an 8x8 tile grid
    pub fn new() -> Self {
        Self {
            clip_limit: CLIP_LIMIT,
            tile_grid: TILE_GRID,
        }
    }

    pub fn with_params(clip_limit: f64, tile_grid: i32) -> Self {
        Self {
            clip_limit,
            tile_grid,
        }
    }

    pub fn from_config(config: &EnhancementConfig) -> Self {
        Self::with_params(config.clip_limit, config.tile_grid)
    }

    /// Enhance a BGR image, returning a new BGR image of the same size
    ///
    /// # Errors
    ///
    /// Returns `InvalidImage` for empty or non-color input and `OpenCvError`
    /// when a conversion fails.
    pub fn enhance(&self, image: &Mat) -> Result<Mat> {
        validate_image(image)?;

        let mut lab = Mat::default();
        cvt_color_def(image, &mut lab, COLOR_BGR2Lab)
            .map_err(|e| ScanError::opencv("cvt_color BGR->Lab", e))?;

        let equalized = self.equalize_lab(&lab)?;

        let mut bgr = Mat::default();
        cvt_color_def(&equalized, &mut bgr, COLOR_Lab2BGR)
            .map_err(|e| ScanError::opencv("cvt_color Lab->BGR", e))?;

        Ok(bgr)
    }

    /// Equalize the L* channel of an 8-bit Lab image
    ///
    /// The a* and b* planes of the result are copied from the input
    /// unchanged.
    pub fn equalize_lab(&self, lab: &Mat) -> Result<Mat> {
        let mut channels = Vector::<Mat>::new();
        core::split(lab, &mut channels).map_err(|e| ScanError::opencv("split Lab", e))?;

        if channels.len() != 3 {
            return Err(ScanError::processing(format!(
                "Expected 3 Lab channels, got {}",
                channels.len()
            )));
        }

        let lightness = channels
            .get(0)
            .map_err(|e| ScanError::opencv("L* channel access", e))?;

        let mut clahe = imgproc::create_clahe(self.clip_limit, Size::new(self.tile_grid, self.tile_grid))
            .map_err(|e| ScanError::opencv("create_clahe", e))?;

        let mut equalized = Mat::default();
        clahe
            .apply(&lightness, &mut equalized)
            .map_err(|e| ScanError::opencv("CLAHE apply", e))?;

        channels
            .set(0, equalized)
            .map_err(|e| ScanError::opencv("L* channel replace", e))?;

        let mut merged = Mat::default();
        core::merge(&channels, &mut merged).map_err(|e| ScanError::opencv("merge Lab", e))?;

        Ok(merged)
    }
}
