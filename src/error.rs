//! Pipeline error taxonomy.
//!
//! Four failure classes, none retried: configuration problems surface before
//! the loop ever starts, collaborator failures terminate the run into
//! `Failed`. A normal end of stream is not an error; sources report it as
//! `Ok(None)`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid threshold, capacity or other setting. Raised before any frame
    /// is processed, never mid-stream.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Frame source failed to open or decode. Fatal.
    #[error("frame source error: {0}")]
    Source(#[source] anyhow::Error),

    /// Detector backend failed. Fatal.
    #[error("detector error: {0}")]
    Detector(#[source] anyhow::Error),

    /// Output could not be written. Fatal.
    #[error("output sink error: {0}")]
    Sink(#[source] anyhow::Error),
}
