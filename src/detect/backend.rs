//! Detector backend trait.

use anyhow::Result;

use crate::detect::result::BBox;
use crate::frame::Frame;

/// A candidate detector: given a processed frame, propose zero or more scored
/// boxes in processed-frame coordinates.
///
/// Backends are opaque to the reduction pipeline. The contract is:
/// - returned boxes are in the coordinate space of the frame passed in;
/// - confidences are in [0, 1];
/// - the frame is not retained after `detect` returns;
/// - `detect` is a pure function of its input frame.
pub trait DetectorBackend: Send {
    /// Backend identifier, used as the registry key.
    fn name(&self) -> &'static str;

    /// Propose candidate boxes for one frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BBox>>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
