//! Ambient sensor readings
//!
//! The BME280 on the field unit is bound to the kernel's IIO driver, which
//! exposes processed values as sysfs attributes:
//! - `in_temp_input` in milli-degrees Celsius
//! - `in_pressure_input` in kilopascal
//! - `in_humidityrelative_input` in milli-percent relative humidity

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::SensorConfig;
use crate::detection::regions::round_hundredths;
use crate::{Result, ScanError};

/// One set of environmental readings, each rounded to 2 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature_c: f64,
    pub temperature_f: f64,
    /// Hectopascal
    pub pressure: f64,
    /// Percent relative humidity
    pub humidity: f64,
}

impl SensorReading {
    /// Build a reading from unrounded values
    ///
    /// Fahrenheit is derived from the unrounded Celsius value before both are
    /// rounded.
    pub fn from_raw(temperature_c: f64, pressure_hpa: f64, humidity: f64) -> Self {
        Self {
            temperature_c: round_hundredths(temperature_c),
            temperature_f: round_hundredths(temperature_c * 9.0 / 5.0 + 32.0),
            pressure: round_hundredths(pressure_hpa),
            humidity: round_hundredths(humidity),
        }
    }
}

/// Source of ambient readings
pub trait TelemetryReader {
    /// Take one reading
    ///
    /// # Errors
    ///
    /// Returns `SensorReadError` when the sensor cannot be reached.
    fn read(&mut self) -> Result<SensorReading>;
}

/// BME280 read through the Linux IIO sysfs interface
#[derive(Debug, Clone)]
pub struct IioBme280 {
    device_dir: PathBuf,
}

impl IioBme280 {
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }

    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(config.iio_device_dir.clone())
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    fn read_attribute(&self, name: &str) -> Result<f64> {
        let path = self.device_dir.join(name);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ScanError::sensor(format!("Failed to read {}", path.display()), e))?;
        text.trim()
            .parse::<f64>()
            .map_err(|e| ScanError::sensor(format!("Invalid value in {}", path.display()), e))
    }
}

impl TelemetryReader for IioBme280 {
    fn read(&mut self) -> Result<SensorReading> {
        let temperature_c = self.read_attribute("in_temp_input")? / 1000.0;
        let pressure_hpa = self.read_attribute("in_pressure_input")? * 10.0;
        let humidity = self.read_attribute("in_humidityrelative_input")? / 1000.0;

        debug!(
            "BME280 raw: {:.3} C, {:.3} hPa, {:.3} %RH",
            temperature_c, pressure_hpa, humidity
        );

        Ok(SensorReading::from_raw(temperature_c, pressure_hpa, humidity))
    }
}
