//! Bounded-memory throughput tracking.
//!
//! Keeps a fixed-capacity window of per-frame processing times and reports a
//! smoothed frames-per-second figure. Memory is O(capacity) no matter how
//! long the stream runs.

use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// Moving-average throughput tracker.
#[derive(Clone, Debug)]
pub struct ThroughputTracker {
    window: VecDeque<Duration>,
    capacity: usize,
}

impl ThroughputTracker {
    /// `capacity` must be positive; configuration validates this before the
    /// pipeline starts.
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record one frame's processing time, evicting the oldest sample once
    /// the window is full.
    pub fn record(&mut self, sample: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    /// Window-average frames per second, or `None` before the first sample.
    pub fn current_rate(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let total: Duration = self.window.iter().sum();
        let secs = total.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        Some(self.window.len() as f64 / secs)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for ThroughputTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
