//! Session states for the per-frame gesture controller
//!
//! The states replace the scattered mode flags and cooldown booleans of a
//! naive implementation: a tone session exists exactly while the state is
//! one of the tone variants, and every timer lives inside the state that
//! uses it, so invalid combinations cannot be represented.

use crate::hand::KeypointFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Discrete states of the gesture session, evaluated once per frame
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    /// No hand currently tracked
    #[default]
    NoHand,
    /// Hand detected, debouncing before recognition starts
    Warmup { detected_at: Instant },
    /// Recognizing: watching for a still pose or a deliberate movement
    AwaitCharacter,
    /// Movement confirmed, waiting briefly before sampling begins
    TonePendingStart {
        started_at: Instant,
        seed: KeypointFrame,
    },
    /// Sampling keypoint frames for the tone classifier
    ToneCollecting {
        started_at: Instant,
        last_sample_at: Instant,
        frames: Vec<KeypointFrame>,
    },
    /// Tone session finalized, waiting before detection re-enables
    PostToneCooldown { until: Instant },
    /// Character accepted, waiting before the next action
    PostCharCooldown { until: Instant },
}

impl SessionState {
    /// Whether a tone session is currently active
    pub fn is_tone_session(&self) -> bool {
        matches!(
            self,
            SessionState::TonePendingStart { .. } | SessionState::ToneCollecting { .. }
        )
    }

    /// Short label for logs and status displays
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::NoHand => "no-hand",
            SessionState::Warmup { .. } => "warmup",
            SessionState::AwaitCharacter => "await-character",
            SessionState::TonePendingStart { .. } => "tone-pending-start",
            SessionState::ToneCollecting { .. } => "tone-collecting",
            SessionState::PostToneCooldown { .. } => "post-tone-cooldown",
            SessionState::PostCharCooldown { .. } => "post-char-cooldown",
        }
    }

    /// Coarse recognition mode shown to observers
    pub fn mode(&self) -> RecognitionMode {
        if self.is_tone_session() {
            RecognitionMode::Tone
        } else {
            RecognitionMode::Character
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the session is currently trying to recognize
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionMode {
    /// Classifying a held static shape
    #[default]
    Character,
    /// Collecting a tone gesture
    Tone,
}

impl fmt::Display for RecognitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionMode::Character => write!(f, "character"),
            RecognitionMode::Tone => write!(f, "tone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::LANDMARK_COUNT;

    #[test]
    fn test_default_state() {
        assert_eq!(SessionState::default(), SessionState::NoHand);
    }

    #[test]
    fn test_tone_session_detection() {
        let now = Instant::now();
        let seed = KeypointFrame::new([[0.0; 3]; LANDMARK_COUNT]);
        assert!(!SessionState::NoHand.is_tone_session());
        assert!(!SessionState::AwaitCharacter.is_tone_session());
        assert!(SessionState::TonePendingStart {
            started_at: now,
            seed: seed.clone(),
        }
        .is_tone_session());
        assert!(SessionState::ToneCollecting {
            started_at: now,
            last_sample_at: now,
            frames: vec![seed],
        }
        .is_tone_session());
        assert!(!SessionState::PostToneCooldown { until: now }.is_tone_session());
    }

    #[test]
    fn test_mode_labels() {
        let now = Instant::now();
        assert_eq!(SessionState::AwaitCharacter.mode(), RecognitionMode::Character);
        assert_eq!(
            SessionState::ToneCollecting {
                started_at: now,
                last_sample_at: now,
                frames: Vec::new(),
            }
            .mode(),
            RecognitionMode::Tone
        );
        assert_eq!(RecognitionMode::Tone.to_string(), "tone");
    }

    #[test]
    fn test_state_labels_unique() {
        let now = Instant::now();
        let labels = [
            SessionState::NoHand.label(),
            SessionState::Warmup { detected_at: now }.label(),
            SessionState::AwaitCharacter.label(),
            SessionState::PostToneCooldown { until: now }.label(),
            SessionState::PostCharCooldown { until: now }.label(),
        ];
        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
    }
}
