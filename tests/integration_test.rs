//! Integration tests for the capture pipeline and the still-image path
//!
//! Camera, sensor and storage are replaced by in-memory doubles so the
//! full capture cycle runs on synthetic frames.

use chrono::{NaiveDate, NaiveDateTime};
use leaf_scan::detection::ColorRegionDetector;
use leaf_scan::naming::{timestamp_from_filename, CaptureNames};
use leaf_scan::orientation::rotate;
use leaf_scan::source::ImageSource;
use leaf_scan::storage::{LocalStore, PersistenceSink};
use leaf_scan::telemetry::{SensorReading, TelemetryReader, TelemetryRecord};
use leaf_scan::{
    analyze_image, CapturePipeline, ContrastEnhancer, DetectionConfig, PipelineConfig, Result,
    ScanError, Status,
};
use opencv::core::{Mat, Scalar, Vec3b, VecN, CV_8UC3};
use opencv::prelude::*;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

// ============================================================================
// Test doubles
// ============================================================================

struct StillFrame(Mat);

impl ImageSource for StillFrame {
    fn capture(&mut self) -> Result<Mat> {
        Ok(self.0.try_clone().unwrap())
    }
}

struct FixedSensor(Option<SensorReading>);

impl TelemetryReader for FixedSensor {
    fn read(&mut self) -> Result<SensorReading> {
        self.0.ok_or_else(|| ScanError::SensorReadError {
            message: "sensor not connected".to_string(),
            source: None,
        })
    }
}

#[derive(Default)]
struct Recorded {
    blobs: Vec<(String, String, Vec<u8>)>,
    rows: Vec<(String, TelemetryRecord)>,
}

#[derive(Clone, Default)]
struct MemorySink(Rc<RefCell<Recorded>>);

impl PersistenceSink for MemorySink {
    fn upload_blob(&mut self, container: &str, filename: &str, content: &[u8]) -> Result<()> {
        self.0
            .borrow_mut()
            .blobs
            .push((container.to_string(), filename.to_string(), content.to_vec()));
        Ok(())
    }

    fn insert_record(&mut self, table: &str, record: &TelemetryRecord) -> Result<()> {
        self.0.borrow_mut().rows.push((table.to_string(), record.clone()));
        Ok(())
    }
}

fn uniform(rows: i32, cols: i32, bgr: [f64; 3]) -> Mat {
    Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::new(bgr[0], bgr[1], bgr[2], 0.0))
        .unwrap()
}

fn started() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 28)
        .unwrap()
        .and_hms_opt(15, 30, 0)
        .unwrap()
}

fn reading() -> SensorReading {
    SensorReading::from_raw(21.5, 1013.25, 45.0)
}

fn pipeline_with(config: PipelineConfig, frame: Mat, sensor: FixedSensor) -> (CapturePipeline, MemorySink) {
    let sink = MemorySink::default();
    let pipeline = CapturePipeline::new(
        config,
        Box::new(StillFrame(frame)),
        Box::new(sensor),
        Box::new(sink.clone()),
    )
    .unwrap();
    (pipeline, sink)
}

// ============================================================================
// Capture pipeline
// ============================================================================

#[test]
fn test_capture_cycle_persists_images_and_record() {
    let frame = uniform(120, 160, [128.0, 128.0, 128.0]);
    let (mut pipeline, sink) = pipeline_with(PipelineConfig::default(), frame, FixedSensor(Some(reading())));

    let report = pipeline.run_at(started()).unwrap();

    assert_eq!(report.names.raw, "image_20240528-153000-1.jpg");
    assert_eq!(report.names.processed, "image_20240528-153000-2.jpg");
    // Grey has no saturation, nothing matches
    assert_eq!(report.percentage, 0.0);
    assert_eq!(report.status, Status::Negative);

    let recorded = sink.0.borrow();
    assert_eq!(recorded.blobs.len(), 2);
    assert_eq!(recorded.blobs[0].0, "mile3raw");
    assert_eq!(recorded.blobs[0].1, report.names.raw);
    assert_eq!(recorded.blobs[1].0, "mile3processed");
    assert_eq!(recorded.blobs[1].1, report.names.processed);
    for (_, _, bytes) in &recorded.blobs {
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    assert_eq!(recorded.rows.len(), 1);
    let (table, record) = &recorded.rows[0];
    assert_eq!(table, "mile3");
    assert_eq!(record.partition_key, "ImageInfo");
    assert_eq!(record.row_key, report.names.raw);
    assert_eq!(record.raw_image_name, report.names.raw);
    assert_eq!(record.processed_image_name, report.names.processed);
    assert_eq!(record.date, "2024/05/28 15:30:00");
    assert_eq!(record.status, Status::Negative);
    assert_eq!(record.temperature_c, 21.5);
    assert_eq!(record.temperature_f, 70.7);
    assert_eq!(record.pressure, 1013.25);
    assert_eq!(record.humidity, 45.0);
}

#[test]
fn test_capture_percentage_matches_stages() {
    // Left half orange, right half grey
    let mut frame = uniform(60, 80, [128.0, 128.0, 128.0]);
    for y in 0..60 {
        for x in 0..40 {
            *frame.at_2d_mut::<Vec3b>(y, x).unwrap() = VecN([0, 100, 255]);
        }
    }

    let config = PipelineConfig::default();
    let rotated = rotate(&frame, config.camera.rotation_degrees).unwrap();
    let enhanced = ContrastEnhancer::from_config(&config.enhancement)
        .enhance(&rotated)
        .unwrap();
    let expected = ColorRegionDetector::from_config(&config.detection)
        .detect(&enhanced)
        .unwrap()
        .percentage;

    let (mut pipeline, sink) = pipeline_with(config, frame, FixedSensor(Some(reading())));
    let report = pipeline.run_at(started()).unwrap();

    assert_eq!(report.percentage, expected);
    assert_eq!(report.status, Status::classify(expected, 5.0));
    assert_eq!(sink.0.borrow().rows[0].1.percentage, expected);
    assert!((0.0..=100.0).contains(&report.percentage));
}

#[test]
fn test_sensor_failure_stops_before_record() {
    let frame = uniform(40, 40, [128.0, 128.0, 128.0]);
    let (mut pipeline, sink) = pipeline_with(PipelineConfig::default(), frame, FixedSensor(None));

    let err = pipeline.run_at(started()).unwrap_err();
    assert!(matches!(err, ScanError::SensorReadError { .. }));
    assert_eq!(err.stage(), "sensor");

    // Images go up before the sensor is read
    let recorded = sink.0.borrow();
    assert_eq!(recorded.blobs.len(), 2);
    assert!(recorded.rows.is_empty());
}

#[test]
fn test_unsupported_rotation_is_rejected() {
    let mut config = PipelineConfig::default();
    config.camera.rotation_degrees = 90;
    let result = CapturePipeline::new(
        config,
        Box::new(StillFrame(uniform(10, 10, [0.0, 0.0, 0.0]))),
        Box::new(FixedSensor(Some(reading()))),
        Box::new(MemorySink::default()),
    );
    assert!(matches!(result, Err(ScanError::ConfigError { .. })));

    let frame = uniform(10, 10, [0.0, 0.0, 0.0]);
    assert!(matches!(
        rotate(&frame, 90),
        Err(ScanError::UnsupportedRotation { angle: 90 })
    ));
}

#[test]
fn test_capture_to_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.storage.root = dir.path().to_path_buf();

    let sink = LocalStore::from_config(&config.storage).unwrap();
    let mut pipeline = CapturePipeline::new(
        config,
        Box::new(StillFrame(uniform(32, 48, [90.0, 90.0, 90.0]))),
        Box::new(FixedSensor(Some(reading()))),
        Box::new(sink),
    )
    .unwrap();

    let report = pipeline.run_at(started()).unwrap();

    assert!(dir.path().join("mile3raw").join(&report.names.raw).is_file());
    assert!(dir.path().join("mile3processed").join(&report.names.processed).is_file());

    let rows = std::fs::read_to_string(dir.path().join("mile3.jsonl")).unwrap();
    let row: serde_json::Value = serde_json::from_str(rows.lines().next().unwrap()).unwrap();
    assert_eq!(row["RowKey"], "image_20240528-153000-1.jpg");
    assert_eq!(row["Status"], "negative");
    assert_eq!(row["Date"], "2024/05/28 15:30:00");
}

// ============================================================================
// Detection properties
// ============================================================================

#[test]
fn test_uniform_in_range_image_is_one_full_region() {
    // BGR (0,100,255) is H≈12, S=255, V=255: inside the orange range
    let image = uniform(100, 100, [0.0, 100.0, 255.0]);
    let detector = ColorRegionDetector::from_config(&DetectionConfig::yellow_orange());

    let detection = detector.detect(&image).unwrap();
    assert_eq!(detection.percentage, 100.0);
    assert_eq!(detection.regions.len(), 1);
    assert!(detection.regions[0].area <= 100.0 * 100.0);
}

#[test]
fn test_no_in_range_pixels() {
    let image = uniform(100, 100, [255.0, 0.0, 0.0]);
    let detector = ColorRegionDetector::from_config(&DetectionConfig::leaf_rust());

    let detection = detector.detect(&image).unwrap();
    assert_eq!(detection.percentage, 0.0);
    assert!(detection.regions.is_empty());
}

#[test]
fn test_process_image_keeps_dimensions() {
    let frame = uniform(50, 70, [0.0, 100.0, 255.0]);
    let (pipeline, _) = pipeline_with(PipelineConfig::default(), uniform(1, 1, [0.0; 3]), FixedSensor(None));

    let result = pipeline.process_image(&frame).unwrap();
    assert_eq!(result.image.rows(), 50);
    assert_eq!(result.image.cols(), 70);
    assert!((0.0..=100.0).contains(&result.percentage));
}

#[test]
fn test_rotate_twice_is_identity() {
    let mut image = uniform(5, 7, [0.0, 0.0, 0.0]);
    *image.at_2d_mut::<Vec3b>(0, 0).unwrap() = VecN([1, 2, 3]);
    *image.at_2d_mut::<Vec3b>(4, 6).unwrap() = VecN([9, 8, 7]);

    let once = rotate(&image, 180).unwrap();
    assert_eq!(once.at_2d::<Vec3b>(4, 6).unwrap().0, [1, 2, 3]);

    let twice = rotate(&once, 180).unwrap();
    assert_eq!(twice.data_bytes().unwrap(), image.data_bytes().unwrap());
}

// ============================================================================
// Classification and naming
// ============================================================================

#[test]
fn test_status_boundaries() {
    assert_eq!(Status::classify(5.0, 5.0), Status::Negative);
    assert_eq!(Status::classify(5.01, 5.0), Status::Positive);
    assert_eq!(Status::classify(0.0, 5.0), Status::Negative);
    assert_eq!(Status::classify(100.0, 5.0), Status::Positive);
}

#[test]
fn test_filename_timestamp_round_trip() {
    let names = CaptureNames::at(started());
    assert_eq!(timestamp_from_filename(&names.raw).unwrap(), started());
    assert_eq!(timestamp_from_filename(&names.processed).unwrap(), started());
    assert!(matches!(
        timestamp_from_filename("photo.jpg"),
        Err(ScanError::ProcessingError { .. })
    ));
}

// ============================================================================
// Still-image path
// ============================================================================

#[test]
fn test_analyze_image_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaf.png");
    image::RgbImage::from_pixel(40, 30, image::Rgb([128, 128, 128]))
        .save(&path)
        .unwrap();

    let result = analyze_image(&path, &PipelineConfig::default()).unwrap();
    assert_eq!(result.percentage, 0.0);
    assert!(result.regions.is_empty());
    assert_eq!(result.image.cols(), 40);
    assert_eq!(result.image.rows(), 30);
}

#[test]
fn test_analyze_image_file_not_found() {
    let result = analyze_image(Path::new("nonexistent_leaf.jpg"), &PipelineConfig::default());
    assert!(matches!(result, Err(ScanError::CaptureError { .. })));
}
