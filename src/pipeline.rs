//! Single-pass capture pipeline
//!
//! capture → rotate → enhance → detect → annotate → upload images →
//! read sensor → insert record. Each stage runs to completion before the
//! next starts. The first failure is logged with its stage and returned;
//! nothing is retried.

use chrono::{Local, NaiveDateTime};
use log::{error, info};
use opencv::{core::Mat, prelude::*};

use crate::annotate::Annotator;
use crate::config::PipelineConfig;
use crate::detection::{ColorRegionDetector, Region};
use crate::enhance::ContrastEnhancer;
use crate::naming::CaptureNames;
use crate::orientation::rotate;
use crate::source::ImageSource;
use crate::storage::{encode_for_upload, PersistenceSink};
use crate::telemetry::{SensorReading, Status, TelemetryReader, TelemetryRecord};
use crate::Result;

/// Annotated image plus its coverage percentage
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub image: Mat,
    /// Percentage of pixels matching a target range, 2 decimals
    pub percentage: f64,
    pub regions: Vec<Region>,
}

/// Outcome of one completed capture cycle
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub names: CaptureNames,
    pub percentage: f64,
    pub status: Status,
    pub reading: SensorReading,
    pub record: TelemetryRecord,
}

/// Image processing stages shared by the camera and file entry points
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    enhancer: ContrastEnhancer,
    detector: ColorRegionDetector,
    annotator: Annotator,
}

impl ImageProcessor {
    pub fn new(enhancer: ContrastEnhancer, detector: ColorRegionDetector, annotator: Annotator) -> Self {
        Self {
            enhancer,
            detector,
            annotator,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(
            ContrastEnhancer::from_config(&config.enhancement),
            ColorRegionDetector::from_config(&config.detection),
            Annotator::from_config(&config.detection)?,
        ))
    }

    /// Enhance, detect and annotate; `image` is left untouched
    pub fn process(&self, image: &Mat) -> Result<DetectionResult> {
        let enhanced = self
            .enhancer
            .enhance(image)
            .inspect_err(|e| error!("Error applying CLAHE: {}", e))?;

        let detection = self
            .detector
            .detect(&enhanced)
            .inspect_err(|e| error!("Error detecting colors: {}", e))?;

        let annotated = self
            .annotator
            .annotate(&enhanced, &detection)
            .inspect_err(|e| error!("Error annotating image: {}", e))?;

        Ok(DetectionResult {
            image: annotated,
            percentage: detection.percentage,
            regions: detection.regions,
        })
    }
}

/// Camera-to-storage pipeline with its collaborators
pub struct CapturePipeline {
    config: PipelineConfig,
    processor: ImageProcessor,
    source: Box<dyn ImageSource>,
    sensor: Box<dyn TelemetryReader>,
    sink: Box<dyn PersistenceSink>,
}

impl CapturePipeline {
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn ImageSource>,
        sensor: Box<dyn TelemetryReader>,
        sink: Box<dyn PersistenceSink>,
    ) -> Result<Self> {
        config.validate()?;
        let processor = ImageProcessor::from_config(&config)?;
        Ok(Self {
            config,
            processor,
            source,
            sensor,
            sink,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enhance, detect and annotate without capturing or persisting
    pub fn process_image(&self, image: &Mat) -> Result<DetectionResult> {
        self.processor.process(image)
    }

    /// Run one capture cycle stamped with the current local time
    pub fn run_once(&mut self) -> Result<CaptureReport> {
        let started = Local::now().naive_local();
        self.run_at(started)
            .inspect_err(|e| error!("Error capturing and processing image ({}): {}", e.stage(), e))
    }

    /// Run one capture cycle whose filenames carry `started`
    pub fn run_at(&mut self, started: NaiveDateTime) -> Result<CaptureReport> {
        let raw = self
            .source
            .capture()
            .inspect_err(|e| error!("Error capturing image: {}", e))?;

        let rotated = rotate(&raw, self.config.camera.rotation_degrees)
            .inspect_err(|e| error!("Error rotating image: {}", e))?;

        let result = self.processor.process(&rotated)?;
        let names = CaptureNames::at(started);
        let storage = &self.config.storage;

        let raw_bytes = encode_for_upload(&rotated, &names.raw, storage.jpeg_quality)
            .inspect_err(|e| error!("Error encoding image: {}", e))?;
        let processed_bytes = encode_for_upload(&result.image, &names.processed, storage.jpeg_quality)
            .inspect_err(|e| error!("Error encoding image: {}", e))?;

        self.sink
            .upload_blob(&storage.raw_container, &names.raw, &raw_bytes)
            .inspect_err(|e| error!("Error uploading blob: {}", e))?;
        self.sink
            .upload_blob(&storage.processed_container, &names.processed, &processed_bytes)
            .inspect_err(|e| error!("Error uploading blob: {}", e))?;

        let reading = self
            .sensor
            .read()
            .inspect_err(|e| error!("Error reading sensor data: {}", e))?;

        let status = Status::classify(result.percentage, self.config.detection.positive_threshold);
        let record = TelemetryRecord::new(
            storage.partition_key.clone(),
            &names,
            result.percentage,
            status,
            &reading,
            Local::now(),
        )
        .inspect_err(|e| error!("Error extracting datetime from filename: {}", e))?;

        self.sink
            .insert_record(&storage.table, &record)
            .inspect_err(|e| error!("Error saving to table: {}", e))?;

        info!(
            "Processed {}: {:.2}% target color ({}), {}x{}",
            names.processed,
            result.percentage,
            status,
            rotated.cols(),
            rotated.rows()
        );

        Ok(CaptureReport {
            names,
            percentage: result.percentage,
            status,
            reading,
            record,
        })
    }
}
