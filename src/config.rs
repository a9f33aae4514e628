//! Pipeline configuration.
//!
//! Settings come from three layers, later layers winning: built-in defaults,
//! an optional TOML file (`PEDSCAN_CONFIG` or `--config`), and `PEDSCAN_*`
//! environment variables. Everything is validated up front: a bad threshold
//! is a configuration error surfaced before the first frame, never a
//! mid-stream surprise.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::detect::{HogConfig, SweepParams};
use crate::error::PipelineError;
use crate::postprocess::{ReductionParams, ShapeLimits};
use crate::preprocess::PreprocessSettings;
use crate::sampler::SamplerSettings;
use crate::throughput::DEFAULT_WINDOW_CAPACITY;

pub const CONFIG_ENV: &str = "PEDSCAN_CONFIG";

// ---------------------------------------------------------------------------
// File schema: every field optional, defaults supplied in From conversions.
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    detection: Option<DetectionSection>,
    preprocess: Option<PreprocessSection>,
    output: Option<OutputSection>,
    throughput: Option<ThroughputSection>,
}

#[derive(Debug, Default, Deserialize)]
struct DetectionSection {
    backend: Option<String>,
    confidence_threshold: Option<f32>,
    overlap_threshold: Option<f32>,
    hit_threshold: Option<f32>,
    min_size: Option<[f32; 2]>,
    max_size: Option<[f32; 2]>,
    min_aspect: Option<f32>,
    max_aspect: Option<f32>,
    multi_pass: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PreprocessSection {
    target_width: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSection {
    save_annotated: Option<bool>,
    output_dir: Option<PathBuf>,
    sample_interval: Option<u64>,
    high_confidence_threshold: Option<f32>,
    enable_report: Option<bool>,
    enable_sampling: Option<bool>,
    save_raw_samples: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ThroughputSection {
    window: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct DetectionSettings {
    /// Backend registry tag.
    pub backend: String,
    pub confidence_threshold: f32,
    pub overlap_threshold: f32,
    pub hit_threshold: f32,
    pub min_size: (f32, f32),
    pub max_size: (f32, f32),
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub multi_pass: bool,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        let shape = ShapeLimits::default();
        Self {
            backend: "hog".to_string(),
            confidence_threshold: 0.5,
            overlap_threshold: 0.4,
            hit_threshold: 0.1,
            min_size: shape.min_size,
            max_size: shape.max_size,
            min_aspect: shape.min_aspect,
            max_aspect: shape.max_aspect,
            multi_pass: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputSettings {
    pub save_annotated: bool,
    pub output_dir: PathBuf,
    pub sample_interval: u64,
    pub high_confidence_threshold: f32,
    pub enable_report: bool,
    pub enable_sampling: bool,
    pub save_raw_samples: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            save_annotated: false,
            output_dir: PathBuf::from("output"),
            sample_interval: 10,
            high_confidence_threshold: 0.85,
            enable_report: true,
            enable_sampling: true,
            save_raw_samples: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PipelineConfig {
    pub detection: DetectionSettings,
    pub target_width: u32,
    pub output: OutputSettings,
    pub throughput_window: usize,
}

impl PipelineConfig {
    /// Load configuration: defaults, then the TOML file named by
    /// `PEDSCAN_CONFIG` (if set) or `path` (if given), then env overrides.
    /// Validates before returning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let file_path = env_path.as_deref().or(path);
        let file_cfg = match file_path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        let mut cfg = Self::default();
        if let Some(det) = file.detection {
            let d = &mut cfg.detection;
            if let Some(v) = det.backend {
                d.backend = v;
            }
            if let Some(v) = det.confidence_threshold {
                d.confidence_threshold = v;
            }
            if let Some(v) = det.overlap_threshold {
                d.overlap_threshold = v;
            }
            if let Some(v) = det.hit_threshold {
                d.hit_threshold = v;
            }
            if let Some([w, h]) = det.min_size {
                d.min_size = (w, h);
            }
            if let Some([w, h]) = det.max_size {
                d.max_size = (w, h);
            }
            if let Some(v) = det.min_aspect {
                d.min_aspect = v;
            }
            if let Some(v) = det.max_aspect {
                d.max_aspect = v;
            }
            if let Some(v) = det.multi_pass {
                d.multi_pass = v;
            }
        }
        if let Some(pre) = file.preprocess {
            if let Some(v) = pre.target_width {
                cfg.target_width = v;
            }
        }
        if let Some(out) = file.output {
            let o = &mut cfg.output;
            if let Some(v) = out.save_annotated {
                o.save_annotated = v;
            }
            if let Some(v) = out.output_dir {
                o.output_dir = v;
            }
            if let Some(v) = out.sample_interval {
                o.sample_interval = v;
            }
            if let Some(v) = out.high_confidence_threshold {
                o.high_confidence_threshold = v;
            }
            if let Some(v) = out.enable_report {
                o.enable_report = v;
            }
            if let Some(v) = out.enable_sampling {
                o.enable_sampling = v;
            }
            if let Some(v) = out.save_raw_samples {
                o.save_raw_samples = v;
            }
        }
        if let Some(tp) = file.throughput {
            if let Some(v) = tp.window {
                cfg.throughput_window = v;
            }
        }
        cfg
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_parse::<f32>("PEDSCAN_CONFIDENCE_THRESHOLD")? {
            self.detection.confidence_threshold = v;
        }
        if let Some(v) = env_parse::<f32>("PEDSCAN_OVERLAP_THRESHOLD")? {
            self.detection.overlap_threshold = v;
        }
        if let Some(v) = env_parse::<u32>("PEDSCAN_TARGET_WIDTH")? {
            self.target_width = v;
        }
        if let Some(v) = env_parse::<usize>("PEDSCAN_THROUGHPUT_WINDOW")? {
            self.throughput_window = v;
        }
        if let Ok(dir) = std::env::var("PEDSCAN_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output.output_dir = PathBuf::from(dir);
            }
        }
        Ok(())
    }

    /// Reject invalid settings before any frame is processed. Values outside
    /// their documented range are an error, never silently clamped.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let unit = |name: &str, v: f32| -> Result<(), PipelineError> {
            if !(0.0..=1.0).contains(&v) || !v.is_finite() {
                return Err(PipelineError::Configuration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, v
                )));
            }
            Ok(())
        };
        unit("confidence_threshold", self.detection.confidence_threshold)?;
        unit("overlap_threshold", self.detection.overlap_threshold)?;
        unit(
            "high_confidence_threshold",
            self.output.high_confidence_threshold,
        )?;

        if self.throughput_window == 0 {
            return Err(PipelineError::Configuration(
                "throughput window must be a positive integer".to_string(),
            ));
        }
        if self.target_width == 0 {
            return Err(PipelineError::Configuration(
                "target_width must be a positive integer".to_string(),
            ));
        }
        if self.detection.min_size.0 > self.detection.max_size.0
            || self.detection.min_size.1 > self.detection.max_size.1
        {
            return Err(PipelineError::Configuration(
                "min_size must not exceed max_size".to_string(),
            ));
        }
        if self.detection.min_aspect > self.detection.max_aspect {
            return Err(PipelineError::Configuration(
                "min_aspect must not exceed max_aspect".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reduction_params(&self) -> ReductionParams {
        ReductionParams {
            confidence_threshold: self.detection.confidence_threshold,
            overlap_threshold: self.detection.overlap_threshold,
            shape: ShapeLimits {
                min_size: self.detection.min_size,
                max_size: self.detection.max_size,
                min_aspect: self.detection.min_aspect,
                max_aspect: self.detection.max_aspect,
            },
        }
    }

    pub fn preprocess_settings(&self) -> PreprocessSettings {
        PreprocessSettings {
            target_width: self.target_width,
        }
    }

    pub fn hog_config(&self) -> HogConfig {
        let sweep = SweepParams {
            hit_threshold: self.detection.hit_threshold,
            ..SweepParams::default()
        };
        HogConfig {
            window: (64, 128),
            sweep,
            second_sweep: self.detection.multi_pass.then(|| SweepParams {
                stride: 4,
                scale_step: 1.15,
                hit_threshold: self.detection.hit_threshold * 0.5,
            }),
        }
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            output_dir: self.output.output_dir.join("samples"),
            sample_interval: self.output.sample_interval,
            high_confidence: self.output.high_confidence_threshold,
            save_raw: self.output.save_raw_samples,
        }
    }

    /// Serialized snapshot for the run report.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionSettings::default(),
            target_width: 640,
            output: OutputSettings::default(),
            throughput_window: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value: {}", key, raw)),
        _ => Ok(None),
    }
}
