//! Coordinate back-projection from processed-frame to original-frame space.

use anyhow::{anyhow, Result};

use crate::detect::result::BBox;

/// Per-axis ratio `original_dimension / processed_dimension`.
///
/// Recomputed from the current frame's resize every frame (frame sizes may
/// change mid-stream, e.g. the trailing frame of a file) and consumed exactly
/// once by `remap`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactor {
    /// Identity scale: processed frame is the original frame.
    pub const IDENTITY: ScaleFactor = ScaleFactor { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Result<Self> {
        if !(x > 0.0 && x.is_finite() && y > 0.0 && y.is_finite()) {
            return Err(anyhow!("scale factors must be positive and finite"));
        }
        Ok(Self { x, y })
    }

    /// Ratio between an original and a processed frame size.
    pub fn between(original: (u32, u32), processed: (u32, u32)) -> Result<Self> {
        if processed.0 == 0 || processed.1 == 0 {
            return Err(anyhow!("processed frame dimensions must be non-zero"));
        }
        Self::new(
            f64::from(original.0) / f64::from(processed.0),
            f64::from(original.1) / f64::from(processed.1),
        )
    }
}

/// Rescale boxes from processed-frame space to original-frame space.
///
/// Each coordinate is multiplied by its axis factor and rounded
/// half-away-from-zero to the nearest integer pixel (`f64::round`), so the
/// same input always remaps to the same output. Confidence is unchanged.
pub fn remap(boxes: Vec<BBox>, scale: ScaleFactor) -> Vec<BBox> {
    boxes
        .into_iter()
        .map(|b| BBox {
            x: round_px(f64::from(b.x) * scale.x),
            y: round_px(f64::from(b.y) * scale.y),
            w: round_px(f64::from(b.w) * scale.x),
            h: round_px(f64::from(b.h) * scale.y),
            confidence: b.confidence,
        })
        .collect()
}

fn round_px(v: f64) -> f32 {
    // f64::round is round-half-away-from-zero.
    v.round() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_two_x_scale_is_exact() {
        // 320x240 processed from 640x480 original.
        let scale = ScaleFactor::between((640, 480), (320, 240)).unwrap();
        let mapped = remap(vec![BBox::new(10.0, 10.0, 20.0, 20.0, 0.7)], scale);
        assert_eq!(mapped, vec![BBox::new(20.0, 20.0, 40.0, 40.0, 0.7)]);
    }

    #[test]
    fn non_uniform_axes_scale_independently() {
        let scale = ScaleFactor::new(2.0, 3.0).unwrap();
        let mapped = remap(vec![BBox::new(5.0, 5.0, 10.0, 10.0, 0.5)], scale);
        assert_eq!(mapped, vec![BBox::new(10.0, 15.0, 20.0, 30.0, 0.5)]);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        let scale = ScaleFactor::new(1.5, 1.5).unwrap();
        // 1 * 1.5 = 1.5 rounds to 2, 3 * 1.5 = 4.5 rounds to 5.
        let mapped = remap(vec![BBox::new(1.0, 3.0, 1.0, 3.0, 0.5)], scale);
        assert_eq!(mapped, vec![BBox::new(2.0, 5.0, 2.0, 5.0, 0.5)]);
    }

    #[test]
    fn inverse_scale_recovers_coordinates_within_half_pixel() {
        let forward = ScaleFactor::new(640.0 / 417.0, 480.0 / 313.0).unwrap();
        let inverse = ScaleFactor::new(417.0 / 640.0, 313.0 / 480.0).unwrap();
        let original = vec![BBox::new(33.0, 57.0, 91.0, 188.0, 0.8)];
        let round_trip = remap(remap(original.clone(), forward), inverse);
        for (a, b) in original.iter().zip(&round_trip) {
            assert!((a.x - b.x).abs() <= 1.0);
            assert!((a.y - b.y).abs() <= 1.0);
            assert!((a.w - b.w).abs() <= 1.0);
            assert!((a.h - b.h).abs() <= 1.0);
        }
    }

    #[test]
    fn zero_or_negative_scale_is_rejected() {
        assert!(ScaleFactor::new(0.0, 1.0).is_err());
        assert!(ScaleFactor::new(1.0, -2.0).is_err());
        assert!(ScaleFactor::between((640, 480), (0, 240)).is_err());
    }
}
