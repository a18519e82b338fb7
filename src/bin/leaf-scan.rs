//! leaf-scan: capture or analyze leaf images for rust-colored regions

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process;

use leaf_scan::source::{CameraSource, FileSource, ImageSource};
use leaf_scan::storage::{encode_for_upload, LocalStore};
use leaf_scan::telemetry::IioBme280;
use leaf_scan::{
    CapturePipeline, DetectionConfig, ImageProcessor, PipelineConfig, Result, ScanError, Status,
};

#[derive(Parser)]
#[command(name = "leaf-scan")]
#[command(about = "Detect rust-colored regions on plant leaves")]
#[command(version)]
struct Cli {
    /// Write log output to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one frame, process it and persist images and telemetry
    Capture {
        /// Pipeline configuration (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run detection on a still image
    Detect {
        /// Path to the input image
        image: PathBuf,

        /// Path for the annotated JPEG (default: <stem>_detected.jpg)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Pipeline configuration (JSON); overrides --preset
        #[arg(long)]
        config: Option<PathBuf>,

        /// Detection preset
        #[arg(long, value_enum, default_value_t = Preset::LeafRust)]
        preset: Preset,

        /// Rotate the image by this many degrees before processing
        #[arg(long, default_value_t = 0)]
        rotate: i32,
    },
    /// Write the default configuration to a JSON file
    Config {
        /// Output path
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    LeafRust,
    YellowOrange,
}

impl Preset {
    fn detection(self) -> DetectionConfig {
        match self {
            Preset::LeafRust => DetectionConfig::leaf_rust(),
            Preset::YellowOrange => DetectionConfig::yellow_orange(),
        }
    }
}

#[derive(Serialize)]
struct DetectSummary {
    image: PathBuf,
    output: PathBuf,
    percentage: f64,
    status: Status,
    regions: usize,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let result = match cli.command {
        Commands::Capture { config } => run_capture(config.as_deref()),
        Commands::Detect {
            image,
            out,
            config,
            preset,
            rotate,
        } => run_detect(&image, out, config.as_deref(), preset, rotate),
        Commands::Config { output } => PipelineConfig::default().to_json_file(&output),
    };

    if let Err(e) = result {
        error!("{} failed: {}", e.stage(), e);
        process::exit(1);
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    // RUST_LOG still wins over the default level
    builder.parse_default_env();

    if let Some(path) = log_file {
        let file = File::create(path).map_err(|e| {
            ScanError::config(format!("Failed to create log file {}", path.display()), e)
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            PipelineConfig::from_json_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn run_capture(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;

    let source = CameraSource::open(&config.camera)?;
    let sensor = IioBme280::from_config(&config.sensor);
    let sink = LocalStore::from_config(&config.storage)?;

    let mut pipeline = CapturePipeline::new(config, Box::new(source), Box::new(sensor), Box::new(sink))?;
    let report = pipeline.run_once()?;

    info!(
        "Capture complete: {} / {} ({:.2}%, {})",
        report.names.raw, report.names.processed, report.percentage, report.status
    );
    Ok(())
}

fn run_detect(
    image_path: &Path,
    out: Option<PathBuf>,
    config_path: Option<&Path>,
    preset: Preset,
    rotate: i32,
) -> Result<()> {
    let config = match config_path {
        Some(_) => load_config(config_path)?,
        None => PipelineConfig {
            detection: preset.detection(),
            ..PipelineConfig::default()
        },
    };
    config.validate()?;

    info!("Loading image: {}", image_path.display());
    let image = FileSource::open(image_path)?.capture()?;
    let image = leaf_scan::orientation::rotate(&image, rotate)?;

    let result = ImageProcessor::from_config(&config)?.process(&image)?;

    let output = out.unwrap_or_else(|| default_output_path(image_path));
    let bytes = encode_for_upload(
        &result.image,
        &output.display().to_string(),
        config.storage.jpeg_quality,
    )?;
    fs::write(&output, bytes).map_err(|e| {
        ScanError::upload(format!("Failed to write {}", output.display()), e)
    })?;
    info!("Detection result saved to {}", output.display());

    let summary = DetectSummary {
        image: image_path.to_path_buf(),
        output,
        percentage: result.percentage,
        status: Status::classify(result.percentage, config.detection.positive_threshold),
        regions: result.regions.len(),
    };
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| ScanError::processing(format!("Failed to serialize summary: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// `<dir>/<stem>_detected.jpg` next to the input
fn default_output_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    image_path.with_file_name(format!("{}_detected.jpg", stem))
}
