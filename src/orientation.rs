//! Orientation normalization for the upside-down camera mount

use opencv::{
    core::{self, Mat},
    prelude::*,
};

use crate::{Result, ScanError};

/// Rotate an image by a whole number of degrees
///
/// Only the identity (0) and a half turn (180) are supported; a half turn
/// reverses both rows and columns. The input is never modified.
///
/// # Errors
///
/// Returns `UnsupportedRotation` for any other angle.
pub fn rotate(image: &Mat, angle: i32) -> Result<Mat> {
    match angle {
        0 => image
            .try_clone()
            .map_err(|e| ScanError::opencv("clone", e)),
        180 => {
            let mut rotated = Mat::default();
            core::rotate(image, &mut rotated, core::ROTATE_180)
                .map_err(|e| ScanError::opencv("rotate 180", e))?;
            Ok(rotated)
        }
        other => Err(ScanError::UnsupportedRotation { angle: other }),
    }
}
