//! Frame preprocessing: resize to the detector's working width.
//!
//! The preprocessor produces the processed frame the detector sees and the
//! `ScaleFactor` the remapper uses to place boxes back onto the original
//! frame. The factor is recomputed from each frame's actual dimensions, so a
//! stream whose frame size changes mid-flight still back-projects correctly.

use image::imageops::{self, FilterType};

use crate::frame::Frame;
use crate::postprocess::ScaleFactor;

#[derive(Clone, Copy, Debug)]
pub struct PreprocessSettings {
    /// Working width in pixels. Height follows the source aspect ratio.
    pub target_width: u32,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self { target_width: 640 }
    }
}

pub struct Preprocessor {
    settings: PreprocessSettings,
}

impl Preprocessor {
    pub fn new(settings: PreprocessSettings) -> Self {
        Self { settings }
    }

    /// Resize `frame` to the working width, preserving aspect ratio.
    ///
    /// Returns the processed frame together with the per-axis scale factor
    /// `original / processed` for this frame. Frames already at or below the
    /// working width pass through untouched with an identity scale.
    pub fn process(&self, frame: &Frame) -> (Frame, ScaleFactor) {
        let (orig_w, orig_h) = (frame.width(), frame.height());
        if orig_w <= self.settings.target_width {
            return (frame.clone(), ScaleFactor::IDENTITY);
        }

        let target_w = self.settings.target_width;
        let target_h =
            ((f64::from(orig_h) * f64::from(target_w) / f64::from(orig_w)).round() as u32).max(1);

        let resized = imageops::resize(&frame.to_image(), target_w, target_h, FilterType::Triangle);
        let processed = Frame::from_image(resized);

        // between() cannot fail here: both processed dimensions are >= 1.
        let scale = ScaleFactor::between((orig_w, orig_h), (target_w, target_h))
            .unwrap_or(ScaleFactor::IDENTITY);
        (processed, scale)
    }
}
