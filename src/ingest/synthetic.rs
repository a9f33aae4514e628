//! Synthetic frame source for tests and demos.
//!
//! Generates a fixed number of 640x480 frames containing a pair of bright
//! vertical bars drifting across a noisy background, so the gradient backend
//! has something to find without any media on disk.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FrameSource;
use crate::frame::Frame;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

pub struct SyntheticSource {
    total: u64,
    produced: u64,
    rng: StdRng,
    opened: bool,
}

impl SyntheticSource {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            produced: 0,
            // Fixed seed: runs are reproducible frame for frame.
            rng: StdRng::seed_from_u64(0x9ed5_ca11),
            opened: false,
        }
    }

    fn render(&mut self, index: u64) -> Frame {
        let mut data = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
        for px in data.chunks_exact_mut(3) {
            let v = 40 + self.rng.gen_range(0..12);
            px.fill(v);
        }

        // A walking pair of bars, 50 px apart, drifting 2 px per frame.
        let left = (60 + (index * 2) % u64::from(WIDTH - 130)) as u32;
        for bar in [left, left + 50] {
            for y in HEIGHT / 4..(HEIGHT * 3 / 4) {
                for x in bar..(bar + 3).min(WIDTH) {
                    let i = ((y * WIDTH + x) * 3) as usize;
                    data[i..i + 3].fill(230);
                }
            }
        }

        // Length matches WIDTH*HEIGHT*3 by construction.
        Frame::from_rgb8(data, WIDTH, HEIGHT).expect("synthetic frame dimensions")
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self) -> Result<()> {
        log::info!("synthetic source opened ({} frames)", self.total);
        self.opened = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.opened || self.produced >= self.total {
            return Ok(None);
        }
        let frame = self.render(self.produced);
        self.produced += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        Some((WIDTH, HEIGHT))
    }

    fn total_frames(&self) -> Option<u64> {
        Some(self.total)
    }

    fn describe(&self) -> String {
        format!("synthetic://{}", self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_exactly_the_requested_frame_count() {
        let mut source = SyntheticSource::new(3);
        source.open().unwrap();
        let mut count = 0;
        while source.next_frame().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        // Stays ended on further reads.
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn unopened_source_yields_no_frames() {
        let mut source = SyntheticSource::new(3);
        assert!(source.next_frame().unwrap().is_none());
    }
}
