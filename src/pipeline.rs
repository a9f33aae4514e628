//! The per-frame reduction pipeline.
//!
//! [`Pipeline`] wires a frame source, a detector backend and a sink together
//! and drives them through a single run: acquire, preprocess, detect, reduce,
//! emit. The run is a one-shot state machine (`Idle` until `run`, then
//! `Running`, ending in `Stopped` or `Failed`); resources are released
//! exactly once on every terminal path, including the failing ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::detect::DetectorBackend;
use crate::error::PipelineError;
use crate::ingest::FrameSource;
use crate::postprocess::{reduce, ReductionParams};
use crate::preprocess::Preprocessor;
use crate::report::ReportGenerator;
use crate::sampler::FrameSampler;
use crate::sink::Sink;
use crate::throughput::ThroughputTracker;
use crate::ui::RunProgress;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
    Failed,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub detections_total: u64,
    pub final_rate: Option<f64>,
    pub state: PipelineState,
}

pub struct Pipeline {
    source: Box<dyn FrameSource>,
    backend: Box<dyn DetectorBackend>,
    sink: Box<dyn Sink>,
    preprocessor: Preprocessor,
    params: ReductionParams,
    throughput: ThroughputTracker,
    reporter: Option<ReportGenerator>,
    sampler: Option<FrameSampler>,
    progress: Option<RunProgress>,
    cancel: Arc<AtomicBool>,
    state: PipelineState,
    resources_open: bool,
}

impl Pipeline {
    /// Validates the configuration up front; a bad threshold never reaches
    /// the frame loop.
    pub fn new(
        source: Box<dyn FrameSource>,
        backend: Box<dyn DetectorBackend>,
        sink: Box<dyn Sink>,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            source,
            backend,
            sink,
            preprocessor: Preprocessor::new(config.preprocess_settings()),
            params: config.reduction_params(),
            throughput: ThroughputTracker::new(config.throughput_window),
            reporter: None,
            sampler: None,
            progress: None,
            cancel: Arc::new(AtomicBool::new(false)),
            state: PipelineState::Idle,
            resources_open: false,
        })
    }

    pub fn with_reporter(mut self, reporter: ReportGenerator) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_sampler(mut self, sampler: FrameSampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn with_progress(mut self, progress: RunProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Handle that requests a graceful stop; honored at the next frame
    /// boundary, never mid-frame.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Total frame count of the underlying source, when it is finite and
    /// known up front. Drives the progress bar length.
    pub fn total_frames(&self) -> Option<u64> {
        self.source.total_frames()
    }

    /// Drive the pipeline until the source is exhausted, cancellation is
    /// requested, or a collaborator fails. Consumes the run: a second call
    /// is an error.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::Configuration(
                "pipeline has already run".to_string(),
            ));
        }

        // A source that cannot open leaves the pipeline Idle: nothing was
        // acquired, nothing needs releasing.
        self.source.open().map_err(PipelineError::Source)?;
        self.resources_open = true;

        if let Err(e) = self.backend.warm_up() {
            return self.fail(PipelineError::Detector(e));
        }

        self.state = PipelineState::Running;
        log::info!(
            "pipeline running: source={}, backend={}",
            self.source.describe(),
            self.backend.name()
        );
        if let Some(reporter) = &mut self.reporter {
            reporter.start();
        }

        let mut frames: u64 = 0;
        let mut detections: u64 = 0;

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                log::info!("cancellation requested, stopping after {} frames", frames);
                break;
            }

            let started = Instant::now();
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                // End of stream is a normal outcome, not an error.
                Ok(None) => break,
                Err(e) => return self.fail(PipelineError::Source(e)),
            };

            let (processed, scale) = self.preprocessor.process(&frame);
            let candidates = match self.backend.detect(&processed) {
                Ok(c) => c,
                Err(e) => return self.fail(PipelineError::Detector(e)),
            };
            let kept = reduce(candidates, &self.params, scale);

            self.throughput.record(started.elapsed());
            let rate = self.throughput.current_rate();

            if let Err(e) = self.sink.emit(&frame, &kept, rate) {
                return self.fail(PipelineError::Sink(e));
            }

            frames += 1;
            detections += kept.len() as u64;

            if let Some(sampler) = &mut self.sampler {
                if let Err(e) = sampler.process(frames, &frame, &kept) {
                    log::warn!("frame sampler error on frame {}: {:#}", frames, e);
                }
            }
            if let Some(reporter) = &mut self.reporter {
                let confidences: Vec<f32> = kept.iter().map(|b| b.confidence).collect();
                reporter.record_frame(frames, confidences, rate.unwrap_or(0.0));
            }
            if let Some(progress) = &self.progress {
                progress.tick(kept.len(), rate);
            }
        }

        let final_rate = self.throughput.current_rate();
        self.release_resources();
        self.state = PipelineState::Stopped;
        if let Some(progress) = &self.progress {
            progress.finish();
        }
        log::info!(
            "pipeline stopped: {} frames, {} detections, rate {}",
            frames,
            detections,
            final_rate
                .map(|r| format!("{:.1} fps", r))
                .unwrap_or_else(|| "n/a".to_string())
        );

        Ok(RunSummary {
            frames_processed: frames,
            detections_total: detections,
            final_rate,
            state: self.state,
        })
    }

    /// Write the run report, if a reporter was attached. Call after `run`.
    pub fn write_report(
        &self,
        config_summary: serde_json::Value,
    ) -> anyhow::Result<Option<std::path::PathBuf>> {
        match &self.reporter {
            Some(reporter) => reporter
                .generate(
                    &self.source.describe(),
                    self.source.frame_size(),
                    self.source.frame_rate(),
                    self.source.total_frames(),
                    config_summary,
                )
                .map(Some),
            None => Ok(None),
        }
    }

    /// A collaborator failed mid-run: release resources, mark Failed, and
    /// surface the original error.
    fn fail(&mut self, err: PipelineError) -> Result<RunSummary, PipelineError> {
        self.release_resources();
        self.state = PipelineState::Failed;
        if let Some(progress) = &self.progress {
            progress.finish();
        }
        log::error!("pipeline failed: {}", err);
        Err(err)
    }

    // Close the source and sink exactly once, on whichever terminal path
    // gets here first. Close errors are logged, not propagated: they must
    // never mask the outcome of the run.
    fn release_resources(&mut self) {
        if !self.resources_open {
            return;
        }
        self.resources_open = false;
        self.source.close();
        if let Err(e) = self.sink.close() {
            log::warn!("error closing sink: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BBox, StubBackend};
    use crate::ingest::{create_source, SourceKind};
    use crate::sink::NullSink;

    fn synthetic_pipeline(frames: u64) -> Pipeline {
        let source = create_source(SourceKind::Synthetic { frames }).unwrap();
        let backend = Box::new(StubBackend::repeating(vec![BBox {
            x: 10.0,
            y: 10.0,
            w: 60.0,
            h: 120.0,
            confidence: 0.9,
        }]));
        Pipeline::new(
            source,
            backend,
            Box::new(NullSink),
            &PipelineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn runs_to_end_of_stream() {
        let mut pipeline = synthetic_pipeline(4);
        let summary = pipeline.run().unwrap();
        assert_eq!(summary.frames_processed, 4);
        assert_eq!(summary.state, PipelineState::Stopped);
        assert_eq!(pipeline.state(), PipelineState::Stopped);
    }

    #[test]
    fn second_run_is_rejected() {
        let mut pipeline = synthetic_pipeline(1);
        pipeline.run().unwrap();
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn pre_cancelled_run_stops_without_processing() {
        let mut pipeline = synthetic_pipeline(100);
        pipeline.cancel_flag().store(true, Ordering::SeqCst);
        let summary = pipeline.run().unwrap();
        assert_eq!(summary.frames_processed, 0);
        assert_eq!(summary.state, PipelineState::Stopped);
    }

    #[test]
    fn invalid_config_never_constructs() {
        let mut cfg = PipelineConfig::default();
        cfg.detection.overlap_threshold = 2.0;
        let source = create_source(SourceKind::Synthetic { frames: 1 }).unwrap();
        let backend = Box::new(StubBackend::empty());
        // Pipeline is not Debug, so inspect the Err side directly.
        let err = Pipeline::new(source, backend, Box::new(NullSink), &cfg)
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
