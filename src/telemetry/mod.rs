//! Sensor telemetry and capture records
//!
//! This module reads ambient conditions, classifies a capture from its
//! coverage percentage and assembles the row persisted for each capture.

pub mod record;
pub mod sensor;

pub use record::{Status, TelemetryRecord};
pub use sensor::{IioBme280, SensorReading, TelemetryReader};
