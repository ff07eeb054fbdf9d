//! Configuration for the gesture session and frame pipeline

use crate::{Result, SignflowError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the per-frame gesture session controller
///
/// Defaults reproduce the tuned thresholds of the recognition pipeline;
/// every value can be overridden with the `with_*` builders.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of pose samples the stability window holds before it can report
    pub stability_window: usize,

    /// Mean per-dimension variance below which the pose counts as still
    pub stability_threshold: f32,

    /// Capacity of the motion-energy history
    pub energy_history: usize,

    /// Per-frame energy above/below which the hysteresis run counts
    pub motion_threshold: f32,

    /// Consecutive energy samples required to flip the hysteresis flag
    pub motion_run_length: usize,

    /// Capacity of the representative-point position history
    pub position_history: usize,

    /// Summed consecutive displacement that counts as "hand moving"
    pub movement_threshold: f32,

    /// Delay after first detection before recognition starts
    pub warmup_delay: Duration,

    /// How long the moving condition must hold before a tone session starts
    pub tone_start_hold: Duration,

    /// Delay between tone-session start and the first buffered sample
    pub tone_start_delay: Duration,

    /// Total collection window for one tone gesture
    pub tone_window: Duration,

    /// Number of keypoint frames a tone classification consumes
    pub tone_frame_count: usize,

    /// Gestures shorter than this are discarded as noise
    pub tone_min_duration: Duration,

    /// Minimum confidence for a tone label to be applied
    pub tone_confidence_threshold: f32,

    /// Confidence a character prediction must exceed to be accepted
    pub char_confidence_threshold: f32,

    /// Number of recent character predictions used for majority debouncing
    pub prediction_history: usize,

    /// Cooldown after an accepted character before the next action
    pub char_cooldown: Duration,

    /// Cooldown after a successfully applied tone
    pub tone_applied_cooldown: Duration,

    /// Cooldown after a low-confidence or failed tone classification
    pub tone_retry_cooldown: Duration,

    /// Cooldown after a too-short gesture was discarded
    pub tone_discard_cooldown: Duration,

    /// Hand absence after which the session resets and an open word finalizes
    pub no_hand_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stability_window: 12,
            stability_threshold: 0.025,
            energy_history: 15,
            motion_threshold: 0.03,
            motion_run_length: 7,
            position_history: 10,
            movement_threshold: 0.03,
            warmup_delay: Duration::from_millis(300),
            tone_start_hold: Duration::from_millis(200),
            tone_start_delay: Duration::from_millis(200),
            tone_window: Duration::from_millis(1500),
            tone_frame_count: 30,
            tone_min_duration: Duration::from_millis(1200),
            tone_confidence_threshold: 0.8,
            char_confidence_threshold: 0.98,
            prediction_history: 25,
            char_cooldown: Duration::from_millis(300),
            tone_applied_cooldown: Duration::from_millis(700),
            tone_retry_cooldown: Duration::from_millis(300),
            tone_discard_cooldown: Duration::from_millis(500),
            no_hand_timeout: Duration::from_millis(1000),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stability window capacity
    pub fn with_stability_window(mut self, capacity: usize) -> Self {
        self.stability_window = capacity;
        self
    }

    /// Set the stability variance threshold
    pub fn with_stability_threshold(mut self, threshold: f32) -> Self {
        self.stability_threshold = threshold;
        self
    }

    /// Set the hysteresis energy threshold
    pub fn with_motion_threshold(mut self, threshold: f32) -> Self {
        self.motion_threshold = threshold;
        self
    }

    /// Set the cumulative displacement threshold
    pub fn with_movement_threshold(mut self, threshold: f32) -> Self {
        self.movement_threshold = threshold;
        self
    }

    /// Set the minimum confidence for tone application
    pub fn with_tone_confidence_threshold(mut self, threshold: f32) -> Self {
        self.tone_confidence_threshold = threshold;
        self
    }

    /// Set the confidence gate for character acceptance
    pub fn with_char_confidence_threshold(mut self, threshold: f32) -> Self {
        self.char_confidence_threshold = threshold;
        self
    }

    /// Set the tone collection window
    pub fn with_tone_window(mut self, window: Duration) -> Self {
        self.tone_window = window;
        self
    }

    /// Set the minimum gesture duration
    pub fn with_tone_min_duration(mut self, duration: Duration) -> Self {
        self.tone_min_duration = duration;
        self
    }

    /// Set the hand-absence timeout
    pub fn with_no_hand_timeout(mut self, timeout: Duration) -> Self {
        self.no_hand_timeout = timeout;
        self
    }

    /// Interval between buffered tone samples (window / target frame count)
    pub fn sample_interval(&self) -> Duration {
        self.tone_window / self.tone_frame_count as u32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stability_window == 0
            || self.energy_history == 0
            || self.position_history == 0
            || self.prediction_history == 0
        {
            return Err(SignflowError::ConfigError(
                "window capacities must be non-zero".to_string(),
            ));
        }
        if self.motion_run_length == 0 || self.motion_run_length > self.energy_history {
            return Err(SignflowError::ConfigError(format!(
                "motion run length {} must be in 1..={}",
                self.motion_run_length, self.energy_history
            )));
        }
        if self.tone_frame_count == 0 {
            return Err(SignflowError::ConfigError(
                "tone frame count must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tone_confidence_threshold)
            || !(0.0..=1.0).contains(&self.char_confidence_threshold)
        {
            return Err(SignflowError::ConfigError(
                "confidence thresholds must be within 0.0..=1.0".to_string(),
            ));
        }
        if self.tone_min_duration > self.tone_window {
            return Err(SignflowError::ConfigError(
                "minimum gesture duration cannot exceed the collection window".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the frame pipeline worker
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Session controller configuration
    pub session: SessionConfig,

    /// Capacity of the frame/command channel
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            channel_capacity: 64,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session configuration
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set the channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_sample_interval() {
        let config = SessionConfig::default();
        // 1.5s over 30 frames = 50ms per sample
        assert_eq!(config.sample_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SessionConfig::default().with_stability_window(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_run_length_exceeding_history_rejected() {
        let mut config = SessionConfig::default();
        config.motion_run_length = config.energy_history + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_confidence_range_checked() {
        let config = SessionConfig::default().with_tone_confidence_threshold(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_duration_bounded_by_window() {
        let config = SessionConfig::default()
            .with_tone_window(Duration::from_millis(800))
            .with_tone_min_duration(Duration::from_millis(1200));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::new()
            .with_motion_threshold(0.05)
            .with_no_hand_timeout(Duration::from_secs(2));
        assert_eq!(config.motion_threshold, 0.05);
        assert_eq!(config.no_hand_timeout, Duration::from_secs(2));
    }
}
