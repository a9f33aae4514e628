//! Stub backend for tests: replays a scripted sequence of candidate lists.

use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::BBox;
use crate::frame::Frame;

/// Deterministic backend that returns pre-scripted candidates, cycling
/// through the script one entry per frame. An empty script detects nothing.
pub struct StubBackend {
    script: Vec<Vec<BBox>>,
    cursor: usize,
}

impl StubBackend {
    pub fn new(script: Vec<Vec<BBox>>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Backend that never proposes a candidate.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Backend that returns the same candidates for every frame.
    pub fn repeating(candidates: Vec<BBox>) -> Self {
        Self::new(vec![candidates])
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BBox>> {
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.script[self.cursor % self.script.len()].clone();
        self.cursor += 1;
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_cycles_per_frame() {
        let frame = Frame::from_rgb8(vec![0u8; 4 * 4 * 3], 4, 4).unwrap();
        let mut backend = StubBackend::new(vec![
            vec![BBox::new(0.0, 0.0, 10.0, 20.0, 0.9)],
            vec![],
        ]);
        assert_eq!(backend.detect(&frame).unwrap().len(), 1);
        assert_eq!(backend.detect(&frame).unwrap().len(), 0);
        assert_eq!(backend.detect(&frame).unwrap().len(), 1);
    }
}
