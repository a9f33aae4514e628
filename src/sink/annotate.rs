//! Annotated-frame writer.
//!
//! Draws detection boxes onto a copy of the original frame and writes the
//! result as a numbered JPEG sequence. Boxes at or above the
//! high-confidence threshold are drawn green, the rest orange, so suspect
//! detections stand out when reviewing output.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::Sink;
use crate::detect::result::BBox;
use crate::frame::Frame;

const COLOR_HIGH: Rgb<u8> = Rgb([0, 220, 0]);
const COLOR_LOW: Rgb<u8> = Rgb([255, 170, 0]);
const BOX_THICKNESS: i32 = 2;

/// Draw detections onto `image`, color-coded by confidence.
pub fn draw_detections(image: &mut RgbImage, detections: &[BBox], high_confidence: f32) {
    let (iw, ih) = image.dimensions();
    for det in detections {
        if det.is_degenerate() {
            continue;
        }
        let color = if det.confidence >= high_confidence {
            COLOR_HIGH
        } else {
            COLOR_LOW
        };
        // Clamp to the frame so remapped boxes touching the border still draw.
        let x = det.x.max(0.0) as i32;
        let y = det.y.max(0.0) as i32;
        let w = (det.w as u32).min(iw.saturating_sub(x as u32)).max(1);
        let h = (det.h as u32).min(ih.saturating_sub(y as u32)).max(1);
        for t in 0..BOX_THICKNESS {
            let (rw, rh) = (w.saturating_sub(2 * t as u32), h.saturating_sub(2 * t as u32));
            if rw == 0 || rh == 0 {
                break;
            }
            draw_hollow_rect_mut(image, Rect::at(x + t, y + t).of_size(rw, rh), color);
        }
    }
}

/// Sink writing annotated JPEG frames to a directory.
pub struct AnnotatingSink {
    output_dir: PathBuf,
    high_confidence: f32,
    frame_index: u64,
    closed: bool,
}

impl AnnotatingSink {
    /// Create the output directory eagerly so a bad path fails before the
    /// pipeline leaves `Idle`.
    pub fn new(output_dir: impl Into<PathBuf>, high_confidence: f32) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;
        log::info!("annotating sink writing to {}", output_dir.display());
        Ok(Self {
            output_dir,
            high_confidence,
            frame_index: 0,
            closed: false,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frame_index
    }
}

impl Sink for AnnotatingSink {
    fn emit(&mut self, frame: &Frame, detections: &[BBox], rate: Option<f64>) -> Result<()> {
        self.frame_index += 1;
        let mut image = frame.to_image();
        draw_detections(&mut image, detections, self.high_confidence);

        let path = self
            .output_dir
            .join(format!("out_{:06}.jpg", self.frame_index));
        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;

        if let Some(fps) = rate {
            log::debug!(
                "frame {}: {} detections, {:.1} fps",
                self.frame_index,
                detections.len(),
                fps
            );
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            log::info!(
                "annotating sink closed after {} frames ({})",
                self.frame_index,
                self.output_dir.display()
            );
            self.closed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_numbered_jpegs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut sink = AnnotatingSink::new(dir.path(), 0.8).expect("sink");
        let frame = Frame::from_rgb8(vec![60u8; 64 * 48 * 3], 64, 48).unwrap();
        let dets = vec![BBox::new(5.0, 5.0, 20.0, 30.0, 0.9)];
        sink.emit(&frame, &dets, Some(12.0)).expect("emit");
        sink.emit(&frame, &[], None).expect("emit");
        sink.close().expect("close");
        sink.close().expect("close twice");

        assert!(dir.path().join("out_000001.jpg").exists());
        assert!(dir.path().join("out_000002.jpg").exists());
        assert_eq!(sink.frames_written(), 2);
    }

    #[test]
    fn drawing_ignores_degenerate_boxes() {
        let mut image = RgbImage::new(32, 32);
        draw_detections(&mut image, &[BBox::new(4.0, 4.0, 0.0, 10.0, 0.9)], 0.5);
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
