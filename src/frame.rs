//! Owned frame buffers.
//!
//! A `Frame` is an opaque RGB8 pixel buffer with known dimensions. Frames are
//! exclusively owned by whichever pipeline stage currently holds them: the
//! orchestrator hands a borrowed frame to one collaborator at a time and no
//! stage retains it after returning.

use anyhow::{anyhow, Result};
use image::RgbImage;

/// One video frame, RGB8, row-major, top-left origin.
#[derive(Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    /// RGB8 pixel data, `width * height * 3` bytes.
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame from raw RGB8 bytes. Length must match the dimensions.
    pub fn from_rgb8(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer length {} does not match {}x{} RGB8 ({} bytes)",
                data.len(),
                width,
                height,
                expected
            ));
        }
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgb8(&self) -> &[u8] {
        &self.data
    }

    /// Copy into an `image::RgbImage` for resize/encode operations.
    pub fn to_image(&self) -> RgbImage {
        // Length was validated at construction, from_raw cannot fail here.
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Luma view of the frame (ITU-R BT.601 weights), one byte per pixel.
    ///
    /// Detector backends work on intensity gradients and do not need color.
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|px| {
                let y =
                    0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
                y.round().min(255.0) as u8
            })
            .collect()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
