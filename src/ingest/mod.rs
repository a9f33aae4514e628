//! Frame acquisition sources.
//!
//! This module provides the sources the pipeline can read frames from:
//! - Local image sequences (numbered frames in a directory)
//! - Synthetic frames (`synthetic` tag, deterministic, for tests and demos)
//! - V4L2 cameras (feature: ingest-v4l2)
//!
//! A source yields owned `Frame`s one at a time. End of stream is a normal
//! condition reported as `Ok(None)`, never an error. `close` must be safe to
//! call more than once; the orchestrator guarantees it calls it exactly once
//! per run, but a source cannot rely on that for memory safety.

mod file;
mod synthetic;
#[cfg(feature = "ingest-v4l2")]
mod v4l2;

pub use file::FileSource;
pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

/// A stream of frames.
pub trait FrameSource: Send {
    /// Open the underlying resource. Called once, before the first frame.
    fn open(&mut self) -> Result<()>;

    /// Produce the next frame, or `Ok(None)` at normal end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying resource. Idempotent.
    fn close(&mut self);

    /// Nominal frame rate of the source, when known.
    fn frame_rate(&self) -> Option<f64> {
        None
    }

    /// Source resolution (width, height), when known after `open`.
    fn frame_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Total frame count, when the source is finite and knows it.
    fn total_frames(&self) -> Option<u64> {
        None
    }

    /// Human-readable description for logs and reports.
    fn describe(&self) -> String;
}

/// Source selector tag, as it appears in configuration and on the CLI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Image-sequence directory.
    File { path: PathBuf },
    /// Deterministic generated frames.
    Synthetic { frames: u64 },
    /// Live V4L2 camera (requires the ingest-v4l2 feature).
    Camera { index: u32 },
}

/// Build a source from its configuration tag.
pub fn create_source(kind: SourceKind) -> Result<Box<dyn FrameSource>> {
    match kind {
        SourceKind::File { path } => Ok(Box::new(FileSource::new(path)?)),
        SourceKind::Synthetic { frames } => Ok(Box::new(SyntheticSource::new(frames))),
        #[cfg(feature = "ingest-v4l2")]
        SourceKind::Camera { index } => Ok(Box::new(V4l2Source::new(index))),
        #[cfg(not(feature = "ingest-v4l2"))]
        SourceKind::Camera { .. } => Err(anyhow!(
            "camera ingestion requires the ingest-v4l2 feature"
        )),
    }
}
