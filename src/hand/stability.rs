//! Pose stability window
//!
//! Fixed-capacity ring buffer of flattened poses that reports whether the
//! hand has been statistically still for the whole window. Never reports
//! stable while warming up, so a freshly reset window cannot trigger a
//! classification from stale history.

use crate::hand::{KeypointFrame, FLAT_LEN};
use ringbuf::{traits::*, HeapRb};

/// Ring buffer of recent poses with a variance-based stillness test
pub struct StabilityWindow {
    window: HeapRb<[f32; FLAT_LEN]>,
    threshold: f32,
}

impl StabilityWindow {
    /// Create a window holding `capacity` poses with the given mean-variance
    /// threshold
    pub fn new(capacity: usize, threshold: f32) -> Self {
        Self {
            window: HeapRb::new(capacity),
            threshold,
        }
    }

    /// Push a pose, evicting the oldest beyond capacity
    pub fn add(&mut self, frame: &KeypointFrame) {
        self.window.push_overwrite(frame.flattened());
    }

    /// True iff the window is full and the mean per-dimension variance of
    /// the buffered poses is below the threshold
    pub fn is_stable(&self) -> bool {
        let n = self.window.occupied_len();
        if n < self.window.capacity().get() {
            return false;
        }
        let mut sum = [0.0f64; FLAT_LEN];
        let mut sum_sq = [0.0f64; FLAT_LEN];
        for pose in self.window.iter() {
            for (d, v) in pose.iter().enumerate() {
                let v = *v as f64;
                sum[d] += v;
                sum_sq[d] += v * v;
            }
        }
        let n = n as f64;
        let total_variance: f64 = (0..FLAT_LEN)
            .map(|d| {
                let mean = sum[d] / n;
                sum_sq[d] / n - mean * mean
            })
            .sum();
        (total_variance / FLAT_LEN as f64) < self.threshold as f64
    }

    /// Number of poses currently buffered
    pub fn len(&self) -> usize {
        self.window.occupied_len()
    }

    /// Check if the window holds no poses
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Clear the window; called on hand loss and around tone sessions
    pub fn reset(&mut self) {
        self.window.clear();
    }
}
