//! Candidate filters: confidence floor and shape plausibility.
//!
//! Both filters preserve input order, have no side effects, and drop rather
//! than raise: a malformed box (zero or negative extent) is removed here so
//! the suppressor only ever sees well-formed geometry.

use crate::detect::result::BBox;
use crate::postprocess::remap::ScaleFactor;

/// Keep every well-formed candidate whose confidence is at or above
/// `threshold` (the boundary is inclusive: confidence exactly equal to the
/// threshold passes). Degenerate boxes are dropped regardless of confidence.
///
/// `threshold` is validated to lie in [0, 1] by configuration before any
/// frame is processed; this function does not clamp.
pub fn filter_by_confidence(candidates: Vec<BBox>, threshold: f32) -> Vec<BBox> {
    candidates
        .into_iter()
        .filter(|b| !b.is_degenerate() && b.confidence >= threshold)
        .collect()
}

/// Size and aspect bounds for plausible pedestrian boxes.
#[derive(Clone, Copy, Debug)]
pub struct ShapeLimits {
    /// Minimum (width, height) in pixels. Smaller boxes are usually noise.
    pub min_size: (f32, f32),
    /// Maximum (width, height) in pixels. Larger boxes usually span several
    /// people or background structure.
    pub max_size: (f32, f32),
    /// Minimum height/width ratio. Pedestrians are upright.
    pub min_aspect: f32,
    /// Maximum height/width ratio.
    pub max_aspect: f32,
}

impl ShapeLimits {
    /// Project limits configured in original-frame pixels onto a processed
    /// frame. Sizes divide by the per-axis factor; the aspect bounds pick up
    /// the axis ratio, since height/width changes under a non-uniform resize.
    pub fn for_processed_space(&self, scale: ScaleFactor) -> ShapeLimits {
        let (sx, sy) = (scale.x as f32, scale.y as f32);
        ShapeLimits {
            min_size: (self.min_size.0 / sx, self.min_size.1 / sy),
            max_size: (self.max_size.0 / sx, self.max_size.1 / sy),
            min_aspect: self.min_aspect * sx / sy,
            max_aspect: self.max_aspect * sx / sy,
        }
    }
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self {
            min_size: (40.0, 80.0),
            max_size: (200.0, 400.0),
            min_aspect: 1.3,
            max_aspect: 3.5,
        }
    }
}

/// Keep candidates whose dimensions and aspect ratio fall within `limits`.
/// Order preserved.
pub fn filter_by_shape(candidates: Vec<BBox>, limits: &ShapeLimits) -> Vec<BBox> {
    candidates
        .into_iter()
        .filter(|b| {
            b.w >= limits.min_size.0
                && b.h >= limits.min_size.1
                && b.w <= limits.max_size.0
                && b.h <= limits.max_size.1
                && b.aspect_ratio() >= limits.min_aspect
                && b.aspect_ratio() <= limits.max_aspect
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> Vec<BBox> {
        vec![
            BBox::new(0.0, 0.0, 50.0, 100.0, 0.9),
            BBox::new(10.0, 10.0, 50.0, 100.0, 0.5),
            BBox::new(20.0, 20.0, 50.0, 100.0, 0.2),
        ]
    }

    #[test]
    fn keeps_subsequence_in_input_order() {
        let kept = filter_by_confidence(boxes(), 0.4);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.5);
    }

    #[test]
    fn boundary_confidence_passes() {
        let kept = filter_by_confidence(boxes(), 0.5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].confidence, 0.5);
    }

    #[test]
    fn degenerate_boxes_are_dropped_not_raised() {
        let candidates = vec![
            BBox::new(0.0, 0.0, 0.0, 100.0, 0.99),
            BBox::new(0.0, 0.0, 50.0, -1.0, 0.99),
            BBox::new(0.0, 0.0, 50.0, 100.0, 0.99),
        ];
        let kept = filter_by_confidence(candidates, 0.0);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(filter_by_confidence(Vec::new(), 0.5).is_empty());
        assert!(filter_by_shape(Vec::new(), &ShapeLimits::default()).is_empty());
    }

    #[test]
    fn limits_project_into_processed_space() {
        let limits = ShapeLimits::default();
        // 2x uniform downscale: pixel bounds halve, aspect bounds unchanged.
        let projected = limits.for_processed_space(ScaleFactor::new(2.0, 2.0).unwrap());
        assert_eq!(projected.min_size, (20.0, 40.0));
        assert_eq!(projected.max_size, (100.0, 200.0));
        assert_eq!(projected.min_aspect, limits.min_aspect);

        // Non-uniform resize skews the height/width ratio.
        let skewed = limits.for_processed_space(ScaleFactor::new(2.0, 1.0).unwrap());
        assert_eq!(skewed.min_aspect, limits.min_aspect * 2.0);
        assert_eq!(skewed.max_aspect, limits.max_aspect * 2.0);
    }

    #[test]
    fn shape_filter_drops_out_of_band_boxes() {
        let candidates = vec![
            BBox::new(0.0, 0.0, 50.0, 100.0, 0.9),  // plausible
            BBox::new(0.0, 0.0, 10.0, 20.0, 0.9),   // too small
            BBox::new(0.0, 0.0, 300.0, 500.0, 0.9), // too large
            BBox::new(0.0, 0.0, 100.0, 100.0, 0.9), // too square
        ];
        let kept = filter_by_shape(candidates, &ShapeLimits::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].w, 50.0);
    }
}
