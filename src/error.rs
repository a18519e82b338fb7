//! Error types for the leaf_scan library

use thiserror::Error;

/// Result type alias for leaf_scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Failures that abort a capture cycle
///
/// None of these are recovered mid-run: the stage that fails logs the error
/// and returns it, and the caller terminates the cycle.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Camera or image file could not deliver a frame
    #[error("Capture failed: {message}")]
    CaptureError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Environmental sensor could not be read
    #[error("Sensor read failed: {message}")]
    SensorReadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Contrast enhancement, detection or annotation failed
    #[error("Processing error: {message}")]
    ProcessingError { message: String },

    /// Blob or table write failed
    #[error("Upload failed: {message}")]
    UploadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Only 0 and 180 degree rotations are supported
    #[error("Unsupported rotation: {angle} degrees (only 0 and 180 are supported)")]
    UnsupportedRotation { angle: i32 },

    /// Image is empty or has fewer than three channels
    #[error("Invalid image: {rows}x{cols} with {channels} channel(s)")]
    InvalidImage { rows: i32, cols: i32, channels: i32 },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCvError {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },
}

impl ScanError {
    /// Create a capture error with context
    pub fn capture<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CaptureError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a sensor read error with context
    pub fn sensor<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SensorReadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upload error with context
    pub fn upload<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::UploadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a processing error without an underlying cause
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    /// Create an OpenCV error with context
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCvError {
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Whether this failure belongs to the image-processing stages
    ///
    /// OpenCV failures only happen inside enhancement, detection and
    /// annotation, so they are counted as processing failures too.
    pub fn is_processing(&self) -> bool {
        matches!(
            self,
            ScanError::ProcessingError { .. }
                | ScanError::OpenCvError { .. }
                | ScanError::InvalidImage { .. }
                | ScanError::UnsupportedRotation { .. }
        )
    }

    /// Short stage label used in log lines
    pub fn stage(&self) -> &'static str {
        if self.is_processing() {
            return "processing";
        }
        match self {
            ScanError::CaptureError { .. } => "capture",
            ScanError::SensorReadError { .. } => "sensor",
            ScanError::UploadError { .. } => "upload",
            _ => "config",
        }
    }
}
