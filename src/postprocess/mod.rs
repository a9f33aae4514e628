//! Detection reduction: filters, overlap suppression, back-projection.
//!
//! Every stage here is a pure, total function: empty inputs produce empty
//! outputs, malformed boxes are dropped rather than raised, and the same
//! input always produces the same output.

mod filter;
mod nms;
mod remap;

pub use filter::{filter_by_confidence, filter_by_shape, ShapeLimits};
pub use nms::suppress;
pub use remap::{remap, ScaleFactor};

use crate::detect::result::{BBox, DetectionResult};

/// Reduction parameters, validated by configuration before any frame runs.
#[derive(Clone, Copy, Debug)]
pub struct ReductionParams {
    /// Minimum confidence, in [0, 1]. Inclusive boundary.
    pub confidence_threshold: f32,
    /// IoU above which the lower-confidence box of a pair is suppressed,
    /// in [0, 1].
    pub overlap_threshold: f32,
    /// Size/aspect plausibility bounds, expressed in original-frame pixels.
    pub shape: ShapeLimits,
}

impl Default for ReductionParams {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            overlap_threshold: 0.4,
            shape: ShapeLimits::default(),
        }
    }
}

/// Per-frame reduction: confidence filter, shape filter, NMS, then
/// back-projection to original-frame space.
///
/// The shape filter runs before suppression so an implausible box can never
/// suppress a plausible overlapping neighbor. Its limits are configured in
/// original-frame pixels and projected into processed space per frame.
pub fn reduce(candidates: Vec<BBox>, params: &ReductionParams, scale: ScaleFactor) -> DetectionResult {
    let surviving = filter_by_confidence(candidates, params.confidence_threshold);
    let plausible = filter_by_shape(surviving, &params.shape.for_processed_space(scale));
    let kept = suppress(plausible, params.overlap_threshold);
    remap(kept, scale)
}
