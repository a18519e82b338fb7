//! Capture classification and the persisted telemetry row

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detection::regions::round_hundredths;
use crate::naming::{timestamp_from_filename, CaptureNames};
use crate::telemetry::SensorReading;
use crate::Result;

/// Format of the `Date` column
pub const RECORD_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Binary classification of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Positive,
    Negative,
}

impl Status {
    /// Positive when `percentage` is strictly above `threshold`
    pub fn classify(percentage: f64, threshold: f64) -> Self {
        if percentage > threshold {
            Status::Positive
        } else {
            Status::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Positive => "positive",
            Status::Negative => "negative",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the telemetry table. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TelemetryRecord {
    pub partition_key: String,
    /// Raw image filename
    pub row_key: String,
    pub raw_image_name: String,
    pub processed_image_name: String,
    pub percentage: f64,
    pub status: Status,
    pub temperature_c: f64,
    pub temperature_f: f64,
    pub pressure: f64,
    pub humidity: f64,
    /// Capture time parsed back out of the raw filename
    pub date: String,
    /// Time the row was built (RFC 3339)
    pub timestamp: String,
}

impl TelemetryRecord {
    /// Assemble a row for one capture
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError` if the raw filename carries no timestamp.
    pub fn new(
        partition_key: impl Into<String>,
        names: &CaptureNames,
        percentage: f64,
        status: Status,
        reading: &SensorReading,
        written_at: DateTime<Local>,
    ) -> Result<Self> {
        let captured = timestamp_from_filename(&names.raw)?;

        Ok(Self {
            partition_key: partition_key.into(),
            row_key: names.raw.clone(),
            raw_image_name: names.raw.clone(),
            processed_image_name: names.processed.clone(),
            percentage: round_hundredths(percentage),
            status,
            temperature_c: round_hundredths(reading.temperature_c),
            temperature_f: round_hundredths(reading.temperature_f),
            pressure: round_hundredths(reading.pressure),
            humidity: round_hundredths(reading.humidity),
            date: captured.format(RECORD_DATE_FORMAT).to_string(),
            timestamp: written_at.to_rfc3339(),
        })
    }
}
