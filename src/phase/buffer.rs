use std::collections::VecDeque;

/// Upper bound for any sample buffer (one hour at a 5 s interval)
pub const MAX_SAMPLE_CAPACITY: usize = 720;

/// Default capacity: 60 x 5 seconds => 5 minutes of samples
pub const DEFAULT_SAMPLE_CAPACITY: usize = 60;

/// Fixed-capacity ring of net-current samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleBuffer {
    /// Capacity is clamped to `1..=MAX_SAMPLE_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_SAMPLE_CAPACITY);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        self.samples.iter().copied()
    }

    /// Mean of the newest `window` samples (or of all of them when fewer
    /// are held). `None` when empty or `window` is zero.
    pub fn tail_mean(&self, window: usize) -> Option<f64> {
        let n = window.min(self.samples.len());
        if n == 0 {
            return None;
        }
        let sum: f64 = self.samples.iter().rev().take(n).sum();
        Some(sum / n as f64)
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAPACITY)
    }
}
