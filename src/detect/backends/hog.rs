//! Sliding-window gradient backend.
//!
//! A self-contained stand-in for the classic HOG + linear SVM pedestrian
//! detector: it scans an image pyramid with a fixed-aspect window and scores
//! each window by its gradient-energy profile (pedestrians put edge energy on
//! the silhouette flanks, background clutter spreads it evenly). Scores are
//! squashed through a logistic into [0, 1] so the reduction pipeline sees the
//! calibrated confidence range it expects.
//!
//! The reduction pipeline treats this backend as opaque: it only relies on
//! the `DetectorBackend` contract, never on the scoring internals.

use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::BBox;
use crate::frame::Frame;

/// Parameters for one detection sweep over the pyramid.
#[derive(Clone, Copy, Debug)]
pub struct SweepParams {
    /// Sliding-window step in pixels, both axes.
    pub stride: u32,
    /// Pyramid growth factor per level, must be > 1.0.
    pub scale_step: f32,
    /// Raw-score floor below which a window is discarded before calibration.
    pub hit_threshold: f32,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            stride: 8,
            scale_step: 1.25,
            hit_threshold: 0.1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HogConfig {
    /// Base detection window, width x height. 64x128 matches the canonical
    /// pedestrian window aspect.
    pub window: (u32, u32),
    pub sweep: SweepParams,
    /// Optional denser second sweep for crowded scenes; duplicates between
    /// the two sweeps are removed later by NMS.
    pub second_sweep: Option<SweepParams>,
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            window: (64, 128),
            sweep: SweepParams::default(),
            second_sweep: None,
        }
    }
}

pub struct HogBackend {
    config: HogConfig,
}

impl HogBackend {
    pub fn new(config: HogConfig) -> Self {
        Self { config }
    }

    fn sweep(&self, grad: &GradientMap, params: &SweepParams) -> Vec<BBox> {
        let (base_w, base_h) = self.config.window;
        let mut out = Vec::new();
        let stride = params.stride.max(1);

        // Window pyramid: grow the window instead of shrinking the image so
        // the gradient map is computed once per frame.
        let mut scale = 1.0f32;
        loop {
            let win_w = (base_w as f32 * scale).round() as u32;
            let win_h = (base_h as f32 * scale).round() as u32;
            if win_w > grad.width || win_h > grad.height {
                break;
            }

            let mut y = 0;
            while y + win_h <= grad.height {
                let mut x = 0;
                while x + win_w <= grad.width {
                    let raw = grad.flank_score(x, y, win_w, win_h);
                    if raw >= params.hit_threshold {
                        out.push(BBox::new(
                            x as f32,
                            y as f32,
                            win_w as f32,
                            win_h as f32,
                            calibrate(raw),
                        ));
                    }
                    x += stride;
                }
                y += stride;
            }

            scale *= params.scale_step.max(1.01);
        }
        out
    }
}

impl DetectorBackend for HogBackend {
    fn name(&self) -> &'static str {
        "hog"
    }

    fn warm_up(&mut self) -> Result<()> {
        log::info!(
            "hog backend ready: window {}x{}, stride {}, scale step {:.2}, second sweep: {}",
            self.config.window.0,
            self.config.window.1,
            self.config.sweep.stride,
            self.config.sweep.scale_step,
            self.config.second_sweep.is_some(),
        );
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<BBox>> {
        let grad = GradientMap::from_frame(frame);

        let mut candidates = self.sweep(&grad, &self.config.sweep);
        if let Some(second) = self.config.second_sweep {
            // Merged as-is; overlapping re-detections fall to NMS downstream.
            candidates.extend(self.sweep(&grad, &second));
        }
        Ok(candidates)
    }
}

/// Squash a raw flank score into a [0, 1] confidence.
fn calibrate(raw: f32) -> f32 {
    1.0 / (1.0 + (-4.0 * raw).exp())
}

/// Per-frame gradient magnitude with an integral image for O(1) region sums.
struct GradientMap {
    width: u32,
    height: u32,
    /// Summed-area table, (width + 1) x (height + 1).
    integral: Vec<f64>,
}

impl GradientMap {
    fn from_frame(frame: &Frame) -> Self {
        let width = frame.width();
        let height = frame.height();
        let luma = frame.to_luma();
        let w = width as usize;
        let h = height as usize;

        // Central-difference gradient magnitude, zero on the border.
        let mut magnitude = vec![0.0f64; w * h];
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let gx = f64::from(luma[y * w + x + 1]) - f64::from(luma[y * w + x - 1]);
                let gy = f64::from(luma[(y + 1) * w + x]) - f64::from(luma[(y - 1) * w + x]);
                magnitude[y * w + x] = (gx * gx + gy * gy).sqrt();
            }
        }

        let mut integral = vec![0.0f64; (w + 1) * (h + 1)];
        for y in 0..h {
            let mut row = 0.0;
            for x in 0..w {
                row += magnitude[y * w + x];
                integral[(y + 1) * (w + 1) + x + 1] = integral[y * (w + 1) + x + 1] + row;
            }
        }

        Self {
            width,
            height,
            integral,
        }
    }

    /// Sum of gradient magnitude over a rectangle.
    fn region_sum(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let stride = self.width as usize + 1;
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        self.integral[y1 * stride + x1] + self.integral[y0 * stride + x0]
            - self.integral[y0 * stride + x1]
            - self.integral[y1 * stride + x0]
    }

    /// Silhouette score for a window: edge energy concentrated on the left
    /// and right thirds against the window mean, normalized to intensity
    /// units so it is comparable across window sizes.
    fn flank_score(&self, x: u32, y: u32, w: u32, h: u32) -> f32 {
        let third = (w / 3).max(1);
        let flank_area = f64::from(2 * third * h);
        let total_area = f64::from(w * h);
        if flank_area <= 0.0 || total_area <= 0.0 {
            return 0.0;
        }

        let left = self.region_sum(x, y, third, h);
        let right = self.region_sum(x + w - third, y, third, h);
        let whole = self.region_sum(x, y, w, h);

        let flank_mean = (left + right) / flank_area;
        let window_mean = whole / total_area;
        // Positive when the flanks carry more edge energy than the window as
        // a whole; ~0 for flat or uniformly textured regions.
        ((flank_mean - window_mean) / 255.0) as f32
    }
}
