//! Motion heuristics for gesture gating
//!
//! Two independent signals over the incoming pose stream:
//!
//! - a hysteresis flag over a windowed energy metric, which only flips when
//!   a full run of samples sits on one side of the threshold, and
//! - a coarser cumulative-displacement test over a representative point,
//!   which is what actually gates tone-session start and stop.
//!
//! The two are deliberately kept separate and separately tunable; the
//! controller consumes only [`MotionSignals::is_moving`] while the
//! hysteresis flag is exposed for observers.

use crate::config::SessionConfig;
use crate::hand::KeypointFrame;
use ringbuf::{traits::*, HeapRb};
use tracing::debug;

/// Motion state derived from recent keypoint frames
pub struct MotionSignals {
    prev: Option<KeypointFrame>,
    energies: HeapRb<f32>,
    positions: HeapRb<(f32, f32)>,
    motion_threshold: f32,
    movement_threshold: f32,
    run_length: usize,
    gesture_active: bool,
}

impl MotionSignals {
    /// Create motion signals with the capacities and thresholds of `config`
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            prev: None,
            energies: HeapRb::new(config.energy_history),
            positions: HeapRb::new(config.position_history),
            motion_threshold: config.motion_threshold,
            movement_threshold: config.movement_threshold,
            run_length: config.motion_run_length,
            gesture_active: false,
        }
    }

    /// Mean per-point Euclidean displacement between two frames
    pub fn energy(curr: &KeypointFrame, prev: &KeypointFrame) -> f32 {
        let total: f32 = curr
            .points()
            .iter()
            .zip(prev.points().iter())
            .map(|(c, p)| {
                let dx = c[0] - p[0];
                let dy = c[1] - p[1];
                let dz = c[2] - p[2];
                (dx * dx + dy * dy + dz * dz).sqrt()
            })
            .sum();
        total / curr.points().len() as f32
    }

    /// Feed one frame: records energy, position, and updates the hysteresis
    /// flag
    pub fn update(&mut self, frame: &KeypointFrame) {
        let energy = match &self.prev {
            Some(prev) => Self::energy(frame, prev),
            None => 0.0,
        };
        self.energies.push_overwrite(energy);
        self.prev = Some(frame.clone());
        self.positions.push_overwrite(frame.tip_midpoint());
        self.update_gesture_flag();
    }

    /// Record only the representative point, leaving the energy history
    /// untouched; used while a cooldown suppresses full processing
    pub fn track_position(&mut self, frame: &KeypointFrame) {
        self.positions.push_overwrite(frame.tip_midpoint());
    }

    fn update_gesture_flag(&mut self) {
        let n = self.energies.occupied_len();
        if n < self.run_length {
            return;
        }
        let recent: Vec<f32> = self.energies.iter().copied().collect();
        let tail = &recent[n - self.run_length..];
        if !self.gesture_active && tail.iter().all(|e| *e > self.motion_threshold) {
            self.gesture_active = true;
            debug!("gesture start: energy run above threshold");
        } else if self.gesture_active && tail.iter().all(|e| *e < self.motion_threshold) {
            self.gesture_active = false;
            debug!("gesture end: energy run below threshold");
        }
    }

    /// Hysteresis flag over the energy history
    pub fn gesture_active(&self) -> bool {
        self.gesture_active
    }

    /// True iff the representative point travelled more than the movement
    /// threshold across the buffered positions
    pub fn is_moving(&self) -> bool {
        let points: Vec<(f32, f32)> = self.positions.iter().copied().collect();
        if points.len() < 2 {
            return false;
        }
        let total: f32 = points
            .windows(2)
            .map(|w| {
                let dx = w[1].0 - w[0].0;
                let dy = w[1].1 - w[0].1;
                (dx * dx + dy * dy).sqrt()
            })
            .sum();
        total > self.movement_threshold
    }

    /// Clear the position history; called when a tone session finalizes
    pub fn clear_positions(&mut self) {
        self.positions.clear();
    }

    /// Clear all histories and flags
    pub fn reset(&mut self) {
        self.prev = None;
        self.energies.clear();
        self.positions.clear();
        self.gesture_active = false;
    }
}
