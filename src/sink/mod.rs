//! Output sinks: where annotated frames and detections go.
//!
//! A sink receives the original (pre-resize) frame, the reduced detection
//! list in original-frame space, and the current throughput figure. Sinks
//! own their output resource; `close` is idempotent and the orchestrator
//! calls it exactly once per run.

mod annotate;

pub use annotate::{draw_detections, AnnotatingSink};

use anyhow::Result;

use crate::detect::BBox;
use crate::frame::Frame;

pub trait Sink: Send {
    /// Consume one frame's result. A failure here is fatal to the run.
    fn emit(&mut self, frame: &Frame, detections: &[BBox], rate: Option<f64>) -> Result<()>;

    /// Release the output resource. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Sink that discards everything. Used when no output was requested and in
/// orchestrator tests.
#[derive(Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn emit(&mut self, _frame: &Frame, _detections: &[BBox], _rate: Option<f64>) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
