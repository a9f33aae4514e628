//! End-of-run detection report.
//!
//! Collects per-frame statistics while the pipeline runs and writes a JSON
//! summary when it finishes: frame and detection counts, confidence and FPS
//! distributions, the busiest frames, and the configuration that produced
//! them.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

const TOP_FRAME_COUNT: usize = 5;

/// Statistics for a single processed frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameStats {
    pub frame_number: u64,
    pub detection_count: usize,
    pub confidences: Vec<f32>,
    pub fps: f64,
}

/// The serialized report.
#[derive(Debug, Default, Serialize)]
pub struct DetectionReport {
    pub video_source: String,
    pub video_resolution: String,
    /// Nominal source rate (e.g. a camera's configured interval), distinct
    /// from the measured processing fps below.
    pub source_frame_rate: Option<f64>,
    pub total_video_frames: u64,

    pub total_processed_frames: u64,
    pub frames_with_detections: u64,
    pub frames_without_detections: u64,
    pub total_detections: u64,

    pub avg_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,

    pub avg_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub total_processing_time_sec: f64,

    pub top_detection_frames: Vec<FrameStats>,
    pub config_summary: serde_json::Value,
}

/// Two-phase collector: record frames while running, generate once at end.
pub struct ReportGenerator {
    output_dir: PathBuf,
    frames: Vec<FrameStats>,
    started_at: Instant,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create report dir {}", output_dir.display()))?;
        Ok(Self {
            output_dir,
            frames: Vec::new(),
            started_at: Instant::now(),
        })
    }

    /// Reset the wall-clock baseline; call right before the first frame.
    pub fn start(&mut self) {
        self.started_at = Instant::now();
    }

    pub fn record_frame(&mut self, frame_number: u64, confidences: Vec<f32>, fps: f64) {
        self.frames.push(FrameStats {
            frame_number,
            detection_count: confidences.len(),
            confidences,
            fps,
        });
    }

    /// Build the report and write it as `detection_report.json`.
    pub fn generate(
        &self,
        video_source: &str,
        video_resolution: Option<(u32, u32)>,
        source_frame_rate: Option<f64>,
        total_video_frames: Option<u64>,
        config_summary: serde_json::Value,
    ) -> Result<PathBuf> {
        let report = self.build(
            video_source,
            video_resolution,
            source_frame_rate,
            total_video_frames,
            config_summary,
        );
        let path = self.output_dir.join("detection_report.json");
        let json = serde_json::to_string_pretty(&report).context("serialize report")?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        log::info!(
            "report written: {} ({} frames, {} detections)",
            path.display(),
            report.total_processed_frames,
            report.total_detections
        );
        Ok(path)
    }

    fn build(
        &self,
        video_source: &str,
        video_resolution: Option<(u32, u32)>,
        source_frame_rate: Option<f64>,
        total_video_frames: Option<u64>,
        config_summary: serde_json::Value,
    ) -> DetectionReport {
        let all_confidences: Vec<f64> = self
            .frames
            .iter()
            .flat_map(|f| f.confidences.iter().map(|&c| f64::from(c)))
            .collect();
        let all_fps: Vec<f64> = self
            .frames
            .iter()
            .filter(|f| f.fps > 0.0)
            .map(|f| f.fps)
            .collect();

        let frames_with = self
            .frames
            .iter()
            .filter(|f| f.detection_count > 0)
            .count() as u64;

        let mut busiest: Vec<FrameStats> = self.frames.clone();
        busiest.sort_by(|a, b| b.detection_count.cmp(&a.detection_count));
        busiest.truncate(TOP_FRAME_COUNT);

        DetectionReport {
            video_source: video_source.to_string(),
            video_resolution: video_resolution
                .map(|(w, h)| format!("{}x{}", w, h))
                .unwrap_or_default(),
            source_frame_rate,
            total_video_frames: total_video_frames.unwrap_or(0),
            total_processed_frames: self.frames.len() as u64,
            frames_with_detections: frames_with,
            frames_without_detections: self.frames.len() as u64 - frames_with,
            total_detections: all_confidences.len() as u64,
            avg_confidence: mean(&all_confidences),
            min_confidence: min(&all_confidences),
            max_confidence: max(&all_confidences),
            avg_fps: mean(&all_fps),
            min_fps: min(&all_fps),
            max_fps: max(&all_fps),
            total_processing_time_sec: self.started_at.elapsed().as_secs_f64(),
            top_detection_frames: busiest,
            config_summary,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
