//! Capture filenames and the timestamp embedded in them
//!
//! Raw and processed images of one capture share a timestamp:
//! `image_<YYYYMMDD-HHMMSS>-1.jpg` and `image_<YYYYMMDD-HHMMSS>-2.jpg`.

use chrono::NaiveDateTime;

use crate::{Result, ScanError};

/// `chrono` format of the timestamp segment
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Filenames for one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureNames {
    pub raw: String,
    pub processed: String,
}

impl CaptureNames {
    /// Names for a capture started at `started`
    pub fn at(started: NaiveDateTime) -> Self {
        let stamp = started.format(FILENAME_TIMESTAMP_FORMAT);
        Self {
            raw: format!("image_{}-1.jpg", stamp),
            processed: format!("image_{}-2.jpg", stamp),
        }
    }
}

/// Recover the capture time from a capture filename
///
/// Takes the part after the first `_`, keeps its first two `-` separated
/// segments and parses them as `YYYYMMDD-HHMMSS`.
///
/// # Errors
///
/// Returns `ProcessingError` when the name does not carry a timestamp.
pub fn timestamp_from_filename(filename: &str) -> Result<NaiveDateTime> {
    let tail = filename.split('_').nth(1).ok_or_else(|| {
        ScanError::processing(format!("No timestamp segment in filename '{}'", filename))
    })?;

    let stamp = tail.split('-').take(2).collect::<Vec<_>>().join("-");

    NaiveDateTime::parse_from_str(&stamp, FILENAME_TIMESTAMP_FORMAT).map_err(|e| {
        ScanError::processing(format!(
            "Invalid timestamp '{}' in filename '{}': {}",
            stamp, filename, e
        ))
    })
}
