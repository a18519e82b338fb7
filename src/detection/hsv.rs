//! Target color ranges in OpenCV's 8-bit HSV scale

use opencv::core::Scalar;
use serde::{Deserialize, Serialize};

use crate::constants::hsv::MAX_HUE;
use crate::{Result, ScanError};

/// Inclusive per-channel bounds `[H, S, V]`.
///
/// Hue runs 0-179 (degrees halved), saturation and value 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn lower_scalar(&self) -> Scalar {
        to_scalar(self.lower)
    }

    pub fn upper_scalar(&self) -> Scalar {
        to_scalar(self.upper)
    }

    /// Check bound ordering and the hue ceiling
    pub fn validate(&self) -> Result<()> {
        if (0..3).any(|c| self.lower[c] > self.upper[c]) {
            return Err(ScanError::ConfigError {
                message: format!(
                    "HSV range lower bound {:?} exceeds upper bound {:?}",
                    self.lower, self.upper
                ),
                source: None,
            });
        }
        if self.upper[0] > MAX_HUE {
            return Err(ScanError::ConfigError {
                message: format!(
                    "HSV range hue {} exceeds {} (hue is stored halved)",
                    self.upper[0], MAX_HUE
                ),
                source: None,
            });
        }
        Ok(())
    }
}

fn to_scalar(channels: [u8; 3]) -> Scalar {
    Scalar::new(channels[0] as f64, channels[1] as f64, channels[2] as f64, 0.0)
}
