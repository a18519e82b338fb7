//! Image sources: camera capture and still files

use log::{debug, info};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::{Path, PathBuf};

use crate::config::CameraConfig;
use crate::image_loader::{is_supported_extension, load_image, supported_extensions};
use crate::{Result, ScanError};

/// Supplies one BGR image per call
pub trait ImageSource {
    /// Produce one raw image
    ///
    /// # Errors
    ///
    /// Returns `CaptureError` when no frame can be obtained.
    fn capture(&mut self) -> Result<Mat>;
}

/// Camera attached through OpenCV's video I/O
pub struct CameraSource {
    capture: VideoCapture,
    warmup_frames: u32,
}

impl CameraSource {
    /// Open the camera and request the configured resolution
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let capture = VideoCapture::new(config.device_index, videoio::CAP_ANY).map_err(|e| {
            ScanError::capture(format!("Failed to open camera {}", config.device_index), e)
        })?;

        let opened = capture
            .is_opened()
            .map_err(|e| ScanError::capture("Failed to query camera state", e))?;
        if !opened {
            return Err(ScanError::CaptureError {
                message: format!("Camera {} could not be opened", config.device_index),
                source: None,
            });
        }

        let mut source = Self {
            capture,
            warmup_frames: config.warmup_frames,
        };
        source.set_property(videoio::CAP_PROP_FRAME_WIDTH, config.width as f64)?;
        source.set_property(videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64)?;

        info!(
            "Camera {} opened at requested {}x{}",
            config.device_index, config.width, config.height
        );
        Ok(source)
    }

    fn set_property(&mut self, property: i32, value: f64) -> Result<()> {
        let accepted = self
            .capture
            .set(property, value)
            .map_err(|e| ScanError::capture(format!("Failed to set camera property {}", property), e))?;
        if !accepted {
            debug!("Camera ignored property {} = {}", property, value);
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|e| ScanError::capture("Failed to read camera frame", e))?;
        if !grabbed || frame.empty() {
            return Err(ScanError::CaptureError {
                message: "Camera returned an empty frame".to_string(),
                source: None,
            });
        }
        Ok(frame)
    }
}

impl ImageSource for CameraSource {
    fn capture(&mut self) -> Result<Mat> {
        for _ in 0..self.warmup_frames {
            self.read_frame()?;
        }
        let frame = self.read_frame()?;
        debug!("Captured {}x{} frame", frame.cols(), frame.rows());
        Ok(frame)
    }
}

/// Still image on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Like `new`, but rejects files whose extension no decoder handles
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !is_supported_extension(ext) {
            return Err(ScanError::CaptureError {
                message: format!(
                    "Unsupported image file {} (expected one of: {})",
                    path.display(),
                    supported_extensions().join(", ")
                ),
                source: None,
            });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileSource {
    fn capture(&mut self) -> Result<Mat> {
        let image = load_image(&self.path)?;
        debug!(
            "Loaded {} ({}x{})",
            self.path.display(),
            image.cols(),
            image.rows()
        );
        Ok(image)
    }
}
