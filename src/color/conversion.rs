//! Color conversion utilities
//!
//! Bridges the hex notation used in configuration files and the BGR
//! `Scalar` colors OpenCV draws with, going through `palette::Srgb`.

use opencv::core::Scalar;
use palette::Srgb;
use crate::{ScanError, Result};

/// Color converter between palette types and OpenCV conventions
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorConverter;

impl ColorConverter {
    pub fn new() -> Self {
        Self
    }

    /// Parse hexadecimal color string to sRGB
    ///
    /// # Arguments
    ///
    /// * `hex` - Hex color string (e.g., "#FF0000" or "FF0000")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the string is not six hex digits
    pub fn hex_to_srgb(&self, hex: &str) -> Result<Srgb> {
        let digits = hex.trim_start_matches('#');
        // Byte slicing below needs single-byte characters
        if !digits.is_ascii() || digits.len() != 6 {
            return Err(ScanError::ConfigError {
                message: format!(
                    "Invalid hex color '{}': expected 6 hex digits, got {} characters",
                    hex,
                    digits.chars().count()
                ),
                source: None,
            });
        }

        let channel = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|e| ScanError::config(format!("Invalid {} value in '{}'", name, hex), e))
        };

        let r = channel(0..2, "red")?;
        let g = channel(2..4, "green")?;
        let b = channel(4..6, "blue")?;

        Ok(Srgb::new(r, g, b).into_format())
    }

    /// Convert sRGB to an OpenCV drawing color (BGR order)
    pub fn srgb_to_bgr_scalar(&self, srgb: Srgb) -> Scalar {
        let rgb: Srgb<u8> = srgb.into_format();
        Scalar::new(rgb.blue as f64, rgb.green as f64, rgb.red as f64, 0.0)
    }

    /// Parse a hex string straight into an OpenCV drawing color
    pub fn hex_to_bgr_scalar(&self, hex: &str) -> Result<Scalar> {
        Ok(self.srgb_to_bgr_scalar(self.hex_to_srgb(hex)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_srgb() {
        let converter = ColorConverter::new();

        let red = converter.hex_to_srgb("#FF0000").unwrap();
        assert!((red.red - 1.0).abs() < 0.01);
        assert!(red.green < 0.01);
        assert!(red.blue < 0.01);

        let green = converter.hex_to_srgb("00FF00").unwrap(); // Test without #
        assert!(green.red < 0.01);
        assert!((green.green - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_hex_to_srgb_invalid() {
        let converter = ColorConverter::new();

        assert!(converter.hex_to_srgb("#FF").is_err()); // Too short
        assert!(converter.hex_to_srgb("#GGGGGG").is_err()); // Invalid chars
    }

    #[test]
    fn test_hex_to_srgb_non_ascii() {
        let converter = ColorConverter::new();

        // Six bytes but only four characters
        let result = converter.hex_to_srgb("#a\u{e9}\u{e9}b");
        assert!(matches!(result, Err(ScanError::ConfigError { .. })));
        assert!(converter.hex_to_bgr_scalar("\u{ff10}\u{ff10}").is_err());
    }

    #[test]
    fn test_scalar_is_bgr_ordered() {
        let converter = ColorConverter::new();
        let blue = converter.hex_to_bgr_scalar("#0000FF").unwrap();
        assert_eq!(blue[0], 255.0);
        assert_eq!(blue[1], 0.0);
        assert_eq!(blue[2], 0.0);

        let green = converter.hex_to_bgr_scalar("#00FF00").unwrap();
        assert_eq!(green[1], 255.0);
    }
}
