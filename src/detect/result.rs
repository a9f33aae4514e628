//! Detection result types.

/// Axis-aligned bounding box with a confidence score.
///
/// Coordinates are pixels with origin at top-left. Whether a box lives in
/// processed-frame space or original-frame space is positional: backends emit
/// processed-space boxes, `postprocess::remap` converts them to
/// original-frame space, and nothing downstream of the remapper ever sees a
/// processed-space box again.
///
/// Boxes are never mutated in place; every pipeline stage returns new values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    /// Left edge, pixels.
    pub x: f32,
    /// Top edge, pixels.
    pub y: f32,
    /// Width, pixels. Non-negative for well-formed boxes.
    pub w: f32,
    /// Height, pixels. Non-negative for well-formed boxes.
    pub h: f32,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            confidence,
        }
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// A degenerate box has no extent on at least one axis. Degenerate boxes
    /// are dropped by the confidence filter and never reach NMS.
    pub fn is_degenerate(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Height-over-width ratio, used by the shape filter. Returns 0 for
    /// boxes with zero width.
    pub fn aspect_ratio(&self) -> f32 {
        if self.w <= 0.0 {
            return 0.0;
        }
        self.h / self.w
    }

    /// Intersection-over-Union with another box, in [0, 1].
    ///
    /// Defined as 0 when the union area is zero, so a degenerate box can
    /// never cause another box to be suppressed.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix = (self.x + self.w).min(other.x + other.w) - self.x.max(other.x);
        let iy = (self.y + self.h).min(other.y + other.h) - self.y.max(other.y);
        if ix <= 0.0 || iy <= 0.0 {
            return 0.0;
        }
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Boxes surviving reduction for one frame, in original-frame space.
///
/// Created fresh each frame and discarded after the sink consumes it.
pub type DetectionResult = Vec<BBox>;
