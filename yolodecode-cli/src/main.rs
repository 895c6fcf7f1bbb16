use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use yolodecode::io::{frame_size_of, save_mask};
use yolodecode::{
    ClassTable, Detection, FrameSize, InputSize, Layout, MaskActivation, MaskConfig,
    ObjectnessMode, Pipeline, PipelineConfig, RawOutput, RawTensor, StorageOrder,
};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "YoloDecode CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for the decode stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum LayoutConfig {
    #[default]
    BoxFirst,
    ScoreInline,
}

impl From<LayoutConfig> for Layout {
    fn from(value: LayoutConfig) -> Self {
        match value {
            LayoutConfig::BoxFirst => Layout::BoxFirst,
            LayoutConfig::ScoreInline => Layout::ScoreInline,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum StorageOrderConfig {
    #[default]
    Auto,
    DetectionMajor,
    ChannelMajor,
}

impl From<StorageOrderConfig> for StorageOrder {
    fn from(value: StorageOrderConfig) -> Self {
        match value {
            StorageOrderConfig::Auto => StorageOrder::Auto,
            StorageOrderConfig::DetectionMajor => StorageOrder::DetectionMajor,
            StorageOrderConfig::ChannelMajor => StorageOrder::ChannelMajor,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum ObjectnessConfig {
    #[default]
    Ignore,
    Multiply,
}

impl From<ObjectnessConfig> for ObjectnessMode {
    fn from(value: ObjectnessConfig) -> Self {
        match value {
            ObjectnessConfig::Ignore => ObjectnessMode::Ignore,
            ObjectnessConfig::Multiply => ObjectnessMode::Multiply,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum ActivationConfig {
    #[default]
    MinMax,
    Sigmoid,
}

impl From<ActivationConfig> for MaskActivation {
    fn from(value: ActivationConfig) -> Self {
        match value {
            ActivationConfig::MinMax => MaskActivation::MinMax,
            ActivationConfig::Sigmoid => MaskActivation::Sigmoid,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MaskConfigJson {
    enabled: bool,
    threshold: f32,
    activation: ActivationConfig,
    crop_to_box: bool,
}

impl Default for MaskConfigJson {
    fn default() -> Self {
        let cfg = MaskConfig::default();
        Self {
            enabled: cfg.enabled,
            threshold: cfg.threshold,
            activation: ActivationConfig::MinMax,
            crop_to_box: cfg.crop_to_box,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PipelineConfigJson {
    input_width: usize,
    input_height: usize,
    layout: LayoutConfig,
    storage_order: StorageOrderConfig,
    num_classes: Option<usize>,
    score_threshold: f32,
    nms_iou_threshold: f32,
    letterbox: bool,
    class_agnostic: bool,
    max_detections: Option<usize>,
    objectness: ObjectnessConfig,
    parallel: bool,
    mask: MaskConfigJson,
}

impl Default for PipelineConfigJson {
    fn default() -> Self {
        let cfg = PipelineConfig::default();
        Self {
            input_width: cfg.input_size.width,
            input_height: cfg.input_size.height,
            layout: LayoutConfig::BoxFirst,
            storage_order: StorageOrderConfig::Auto,
            num_classes: cfg.num_classes,
            score_threshold: cfg.score_threshold,
            nms_iou_threshold: cfg.nms_iou_threshold,
            letterbox: cfg.letterbox,
            class_agnostic: cfg.class_agnostic,
            max_detections: cfg.max_detections,
            objectness: ObjectnessConfig::Ignore,
            parallel: cfg.parallel,
            mask: MaskConfigJson::default(),
        }
    }
}

impl From<&PipelineConfigJson> for PipelineConfig {
    fn from(value: &PipelineConfigJson) -> Self {
        PipelineConfig {
            input_size: InputSize::new(value.input_width, value.input_height),
            layout: value.layout.into(),
            storage_order: value.storage_order.into(),
            num_classes: value.num_classes,
            score_threshold: value.score_threshold,
            nms_iou_threshold: value.nms_iou_threshold,
            letterbox: value.letterbox,
            class_agnostic: value.class_agnostic,
            max_detections: value.max_detections,
            objectness: value.objectness.into(),
            parallel: value.parallel,
            mask: MaskConfig {
                enabled: value.mask.enabled,
                threshold: value.mask.threshold,
                activation: value.mask.activation.into(),
                crop_to_box: value.mask.crop_to_box,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TensorFile {
    path: PathBuf,
    shape: Vec<usize>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct FrameJson {
    width: usize,
    height: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    /// Raw little-endian f32 output tensors in the runner's output order.
    tensors: Vec<TensorFile>,
    classes: Vec<String>,
    class_file: Option<PathBuf>,
    frame: Option<FrameJson>,
    frame_image: Option<PathBuf>,
    output_path: Option<PathBuf>,
    mask_dir: Option<PathBuf>,
    pipeline: PipelineConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tensors: Vec::new(),
            classes: Vec::new(),
            class_file: None,
            frame: None,
            frame_image: None,
            output_path: None,
            mask_dir: None,
            pipeline: PipelineConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BoxRecord {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    class_id: usize,
    class_name: String,
    confidence: f32,
    bbox: BoxRecord,
    color: [u8; 3],
    mask_foreground: Option<usize>,
    mask_path: Option<String>,
}

impl DetectionRecord {
    fn new(det: &Detection, mask_path: Option<String>) -> Self {
        Self {
            class_id: det.class_id,
            class_name: det.class_name.clone(),
            confidence: det.confidence,
            bbox: BoxRecord {
                x: det.bbox.x,
                y: det.bbox.y,
                width: det.bbox.width,
                height: det.bbox.height,
            },
            color: [det.color.r, det.color.g, det.color.b],
            mask_foreground: det.mask.as_ref().map(|mask| mask.foreground_count()),
            mask_path,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    frame_width: usize,
    frame_height: usize,
    detections: Vec<DetectionRecord>,
}

fn read_f32_file(path: &Path) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(format!("{} is not a whole number of f32 values", path.display()).into());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("yolodecode=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.tensors.is_empty() {
        return Err("at least one tensor must be listed in the config".into());
    }

    let classes = match &config.class_file {
        Some(path) => ClassTable::from_lines(&fs::read_to_string(path)?),
        None => ClassTable::new(config.classes.iter().cloned()),
    };
    if classes.is_empty() {
        return Err("classes or class_file must name at least one class".into());
    }

    let frame = match (config.frame, &config.frame_image) {
        (Some(frame), _) => FrameSize::new(frame.width, frame.height),
        (None, Some(path)) => frame_size_of(path)?,
        (None, None) => return Err("frame or frame_image must be set in the config".into()),
    };

    let pipeline_cfg = PipelineConfig::from(&config.pipeline);
    let pipeline = Pipeline::new(classes, pipeline_cfg)?;

    let buffers = config
        .tensors
        .iter()
        .map(|tensor| read_f32_file(&tensor.path))
        .collect::<Result<Vec<_>, _>>()?;
    let tensors = config
        .tensors
        .iter()
        .zip(buffers.iter())
        .map(|(tensor, data)| RawTensor::new(data, &tensor.shape))
        .collect::<Result<Vec<_>, _>>()?;
    let output = RawOutput::from_tensors(&tensors, pipeline_cfg.layout)?;

    let detections = pipeline.run(&output, frame)?;
    info!(count = detections.len(), "decoded frame");

    if let Some(dir) = &config.mask_dir {
        fs::create_dir_all(dir)?;
    }
    let mut records = Vec::with_capacity(detections.len());
    for (idx, det) in detections.iter().enumerate() {
        let mask_path = match (&config.mask_dir, &det.mask) {
            (Some(dir), Some(mask)) => {
                let path = dir.join(format!("mask_{idx:03}_{}.png", det.class_id));
                save_mask(mask, &path)?;
                Some(path.display().to_string())
            }
            (Some(_), None) => {
                warn!(index = idx, "detection has no mask to write");
                None
            }
            _ => None,
        };
        records.push(DetectionRecord::new(det, mask_path));
    }

    let output = Output {
        frame_width: frame.width,
        frame_height: frame.height,
        detections: records,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
