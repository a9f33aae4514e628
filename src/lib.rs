//! pedscan: a per-frame pedestrian detection reduction pipeline.
//!
//! Raw detector output is noisy: overlapping candidates around the same
//! person, low-confidence speculation, boxes in the coordinate space of a
//! downscaled working frame. This crate turns that raw output into a clean
//! per-frame result through a fixed reduction sequence: confidence
//! filtering, non-maximum suppression, coordinate back-projection to the
//! original frame, and shape plausibility checks.
//!
//! The moving parts are pluggable. [`ingest::FrameSource`] produces frames
//! (image-sequence directories, a synthetic generator, optionally a V4L2
//! camera behind the `ingest-v4l2` feature), [`detect::DetectorBackend`]
//! produces raw candidates, and [`sink::Sink`] consumes the reduced result.
//! [`pipeline::Pipeline`] drives one run across a source, tracking
//! throughput over a bounded window and releasing resources exactly once
//! however the run ends.

pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod report;
pub mod sampler;
pub mod sink;
pub mod throughput;
pub mod ui;

pub use config::PipelineConfig;
pub use detect::{BBox, DetectionResult, DetectorBackend};
pub use error::PipelineError;
pub use frame::Frame;
pub use pipeline::{Pipeline, PipelineState, RunSummary};
