//! Frame sampling: save detection-bearing frames to disk for review.
//!
//! Two save triggers:
//! 1. A detection at or above the high-confidence threshold saves the frame
//!    immediately.
//! 2. Otherwise every Nth detection-bearing frame is saved periodically.
//!
//! Saved files are named `frame_{number:06}_{count}det.jpg`. Optionally the
//! un-annotated original is written alongside under `raw/`, for re-analysis
//! or training data.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::detect::result::BBox;
use crate::frame::Frame;
use crate::sink::draw_detections;

#[derive(Clone, Debug)]
pub struct SamplerSettings {
    pub output_dir: PathBuf,
    /// Save every Nth detection-bearing frame. Minimum 1.
    pub sample_interval: u64,
    /// Save immediately when a detection reaches this confidence.
    /// 0 disables the immediate trigger.
    pub high_confidence: f32,
    /// Also save the un-annotated frame under `raw/`.
    pub save_raw: bool,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output/samples"),
            sample_interval: 10,
            high_confidence: 0.85,
            save_raw: false,
        }
    }
}

pub struct FrameSampler {
    settings: SamplerSettings,
    frames_with_detections: u64,
    total_saved: u64,
}

impl FrameSampler {
    pub fn new(mut settings: SamplerSettings) -> Result<Self> {
        settings.sample_interval = settings.sample_interval.max(1);
        fs::create_dir_all(&settings.output_dir).with_context(|| {
            format!(
                "failed to create sample dir {}",
                settings.output_dir.display()
            )
        })?;
        if settings.save_raw {
            fs::create_dir_all(settings.output_dir.join("raw"))
                .context("failed to create raw sample dir")?;
        }
        log::info!(
            "frame sampler writing to {} (interval {}, raw: {})",
            settings.output_dir.display(),
            settings.sample_interval,
            settings.save_raw
        );
        Ok(Self {
            settings,
            frames_with_detections: 0,
            total_saved: 0,
        })
    }

    /// Consider one frame for sampling. Frames without detections are never
    /// saved.
    pub fn process(&mut self, frame_number: u64, frame: &Frame, detections: &[BBox]) -> Result<()> {
        if detections.is_empty() {
            return Ok(());
        }
        self.frames_with_detections += 1;

        let max_conf = detections
            .iter()
            .map(|d| d.confidence)
            .fold(0.0f32, f32::max);
        let high_confidence =
            self.settings.high_confidence > 0.0 && max_conf >= self.settings.high_confidence;
        let periodic = self.frames_with_detections % self.settings.sample_interval == 0;

        if high_confidence || periodic {
            self.save(frame_number, frame, detections)?;
        }
        Ok(())
    }

    fn save(&mut self, frame_number: u64, frame: &Frame, detections: &[BBox]) -> Result<()> {
        let filename = format!("frame_{:06}_{}det.jpg", frame_number, detections.len());

        let mut annotated = frame.to_image();
        draw_detections(&mut annotated, detections, self.settings.high_confidence);
        let path = self.settings.output_dir.join(&filename);
        annotated
            .save(&path)
            .with_context(|| format!("failed to write sample {}", path.display()))?;

        if self.settings.save_raw {
            let raw_path = self.settings.output_dir.join("raw").join(&filename);
            frame
                .to_image()
                .save(&raw_path)
                .with_context(|| format!("failed to write raw sample {}", raw_path.display()))?;
        }

        self.total_saved += 1;
        Ok(())
    }

    pub fn total_saved(&self) -> u64 {
        self.total_saved
    }

    pub fn frames_with_detections(&self) -> u64 {
        self.frames_with_detections
    }
}
