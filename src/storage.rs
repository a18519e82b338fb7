//! Persistence of capture images and telemetry rows
//!
//! Blobs are written under `<root>/<container>/<name>`, table rows are
//! appended as JSON Lines to `<root>/<table>.jsonl`. Writes are
//! fire-and-forget: nothing is read back and re-running a capture with the
//! same filename appends a second row.

use log::info;
use opencv::{
    core::{Mat, Vector},
    imgcodecs,
};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::telemetry::TelemetryRecord;
use crate::{Result, ScanError};

/// Destination for capture images and telemetry rows
pub trait PersistenceSink {
    /// Store `content` as `filename` inside `container`
    fn upload_blob(&mut self, container: &str, filename: &str, content: &[u8]) -> Result<()>;

    /// Append one row to `table`
    fn insert_record(&mut self, table: &str, record: &TelemetryRecord) -> Result<()>;
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`, creating it and the given containers
    pub fn open(root: impl Into<PathBuf>, containers: &[&str]) -> Result<Self> {
        let store = Self { root: root.into() };
        for container in containers {
            let dir = store.container_dir(container);
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|e| {
                    ScanError::upload(format!("Failed to create container {}", dir.display()), e)
                })?;
                info!("Created container {}", dir.display());
            }
        }
        Ok(store)
    }

    /// Open the store described by the storage config
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::open(
            config.root.clone(),
            &[config.raw_container.as_str(), config.processed_container.as_str()],
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn container_dir(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", table))
    }
}

impl PersistenceSink for LocalStore {
    fn upload_blob(&mut self, container: &str, filename: &str, content: &[u8]) -> Result<()> {
        let dir = self.container_dir(container);
        fs::create_dir_all(&dir).map_err(|e| {
            ScanError::upload(format!("Failed to create container {}", dir.display()), e)
        })?;

        let path = dir.join(filename);
        fs::write(&path, content)
            .map_err(|e| ScanError::upload(format!("Failed to write blob {}", path.display()), e))?;

        info!("Uploaded {} to container {}", filename, container);
        Ok(())
    }

    fn insert_record(&mut self, table: &str, record: &TelemetryRecord) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| ScanError::upload("Failed to serialize telemetry record", e))?;

        fs::create_dir_all(&self.root).map_err(|e| {
            ScanError::upload(format!("Failed to create store {}", self.root.display()), e)
        })?;

        let path = self.table_path(table);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ScanError::upload(format!("Failed to open table {}", path.display()), e))?;
        writeln!(file, "{}", line)
            .map_err(|e| ScanError::upload(format!("Failed to append to {}", path.display()), e))?;

        info!("Data saved to table {}: {}", table, line);
        Ok(())
    }
}

/// Encode a BGR image as JPEG bytes
pub fn encode_jpeg(image: &Mat, quality: i32) -> Result<Vec<u8>> {
    let mut buffer = Vector::<u8>::new();
    let params = Vector::<i32>::from_slice(&[imgcodecs::IMWRITE_JPEG_QUALITY, quality]);

    let encoded = imgcodecs::imencode(".jpg", image, &mut buffer, &params)
        .map_err(|e| ScanError::opencv("imencode jpg", e))?;
    if !encoded {
        return Err(ScanError::processing("JPEG encoder rejected the image"));
    }

    Ok(buffer.to_vec())
}

/// Encode an image that is about to be stored as `filename`
///
/// Encoder failures are reported as `UploadError` so they carry the
/// persistence stage rather than the processing one.
pub fn encode_for_upload(image: &Mat, filename: &str, quality: i32) -> Result<Vec<u8>> {
    encode_jpeg(image, quality)
        .map_err(|e| ScanError::upload(format!("Failed to encode {}", filename), e))
}
