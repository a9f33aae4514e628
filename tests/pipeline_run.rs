use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use pedscan::config::PipelineConfig;
use pedscan::detect::{BBox, StubBackend};
use pedscan::frame::Frame;
use pedscan::ingest::{create_source, FrameSource, SourceKind};
use pedscan::pipeline::{Pipeline, PipelineState};
use pedscan::report::ReportGenerator;
use pedscan::sink::Sink;
use pedscan::PipelineError;

#[derive(Clone, Default)]
struct Counters {
    frames: Arc<AtomicU64>,
    detections: Arc<AtomicU64>,
    closes: Arc<AtomicU64>,
}

/// Sink that records what it sees; optionally fails after N frames.
struct CountingSink {
    counters: Counters,
    fail_after: Option<u64>,
}

impl CountingSink {
    fn new(counters: Counters) -> Self {
        Self {
            counters,
            fail_after: None,
        }
    }

    fn failing_after(counters: Counters, frames: u64) -> Self {
        Self {
            counters,
            fail_after: Some(frames),
        }
    }
}

impl Sink for CountingSink {
    fn emit(&mut self, _frame: &Frame, detections: &[BBox], _rate: Option<f64>) -> Result<()> {
        let seen = self.counters.frames.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters
            .detections
            .fetch_add(detections.len() as u64, Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if seen > limit {
                return Err(anyhow!("disk full"));
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Source double that yields flat frames and counts its closes.
struct CountingSource {
    remaining: u64,
    closes: Arc<AtomicU64>,
    opened: bool,
}

impl CountingSource {
    fn new(frames: u64, closes: Arc<AtomicU64>) -> Self {
        Self {
            remaining: frames,
            closes,
            opened: false,
        }
    }
}

impl FrameSource for CountingSource {
    fn open(&mut self) -> Result<()> {
        self.opened = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.opened || self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(Frame::from_rgb8(vec![80u8; 64 * 48 * 3], 64, 48)?))
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.opened = false;
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(12.5)
    }

    fn describe(&self) -> String {
        "counting://test".to_string()
    }
}

fn person_box() -> BBox {
    BBox {
        x: 20.0,
        y: 30.0,
        w: 60.0,
        h: 120.0,
        confidence: 0.9,
    }
}

#[test]
fn stops_cleanly_at_end_of_stream() {
    let counters = Counters::default();
    let source_closes = Arc::new(AtomicU64::new(0));
    let source = Box::new(CountingSource::new(6, source_closes.clone()));
    let backend = Box::new(StubBackend::repeating(vec![person_box()]));
    let sink = Box::new(CountingSink::new(counters.clone()));

    let mut pipeline =
        Pipeline::new(source, backend, sink, &PipelineConfig::default()).unwrap();
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.state, PipelineState::Stopped);
    assert_eq!(summary.frames_processed, 6);
    assert_eq!(counters.frames.load(Ordering::SeqCst), 6);
    assert_eq!(counters.detections.load(Ordering::SeqCst), 6);
    // Source and sink each released exactly once on the Stopped path.
    assert_eq!(source_closes.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn sink_failure_marks_run_failed_and_still_releases_resources() {
    let counters = Counters::default();
    let source_closes = Arc::new(AtomicU64::new(0));
    let source = Box::new(CountingSource::new(10, source_closes.clone()));
    let backend = Box::new(StubBackend::repeating(vec![person_box()]));
    let sink = Box::new(CountingSink::failing_after(counters.clone(), 3));

    let mut pipeline =
        Pipeline::new(source, backend, sink, &PipelineConfig::default()).unwrap();
    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, PipelineError::Sink(_)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    // Source and sink each released exactly once on the Failed path too.
    assert_eq!(source_closes.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn reduction_runs_between_detector_and_sink() {
    // Two near-duplicates plus one low-confidence candidate; the sink must
    // see exactly one surviving box per frame.
    let counters = Counters::default();
    let script = vec![vec![
        BBox {
            x: 20.0,
            y: 30.0,
            w: 60.0,
            h: 120.0,
            confidence: 0.9,
        },
        BBox {
            x: 24.0,
            y: 32.0,
            w: 60.0,
            h: 120.0,
            confidence: 0.7,
        },
        BBox {
            x: 300.0,
            y: 40.0,
            w: 60.0,
            h: 120.0,
            confidence: 0.2,
        },
    ]];
    let source = create_source(SourceKind::Synthetic { frames: 5 }).unwrap();
    let backend = Box::new(StubBackend::new(script));
    let sink = Box::new(CountingSink::new(counters.clone()));

    let mut pipeline =
        Pipeline::new(source, backend, sink, &PipelineConfig::default()).unwrap();
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.frames_processed, 5);
    assert_eq!(summary.detections_total, 5);
    assert_eq!(counters.detections.load(Ordering::SeqCst), 5);
}

#[test]
fn cancellation_is_honored_at_the_frame_boundary() {
    let counters = Counters::default();
    let source = create_source(SourceKind::Synthetic { frames: 10_000 }).unwrap();
    let backend = Box::new(StubBackend::empty());
    let sink = Box::new(CountingSink::new(counters.clone()));

    let mut pipeline =
        Pipeline::new(source, backend, sink, &PipelineConfig::default()).unwrap();
    let cancel: Arc<AtomicBool> = pipeline.cancel_flag();
    cancel.store(true, Ordering::SeqCst);

    let summary = pipeline.run().unwrap();
    assert_eq!(summary.state, PipelineState::Stopped);
    assert_eq!(summary.frames_processed, 0);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_input_directory_leaves_no_resources_behind() {
    let err = create_source(SourceKind::File {
        path: "/nonexistent/pedscan-frames".into(),
    });
    assert!(err.is_err());
}

#[test]
fn report_is_written_after_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = Box::new(CountingSource::new(3, Arc::new(AtomicU64::new(0))));
    let backend = Box::new(StubBackend::repeating(vec![person_box()]));
    let sink = Box::new(CountingSink::new(Counters::default()));

    let config = PipelineConfig::default();
    let mut pipeline = Pipeline::new(source, backend, sink, &config)
        .unwrap()
        .with_reporter(ReportGenerator::new(dir.path()).unwrap());
    pipeline.run().unwrap();

    let path = pipeline.write_report(config.summary()).unwrap().unwrap();
    assert!(path.exists());
    let raw = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["total_processed_frames"], 3);
    assert_eq!(json["total_detections"], 3);
    // The source's nominal rate flows through to the report.
    assert_eq!(json["source_frame_rate"], 12.5);
}
