//! Status snapshots for external observers
//!
//! The pipeline publishes one immutable [`StatusSnapshot`] after each
//! completed frame into a single-slot [`SharedStatus`] mailbox. Observers
//! always read the most recently completed frame's result; intermediate
//! frames may be silently missed under load. There is no queue and no
//! back-pressure.

use crate::compose::Tone;
use crate::session::RecognitionMode;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable per-frame status record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Instantaneous frames per second of the pipeline
    pub fps: f32,
    /// What the session is currently recognizing
    pub mode: RecognitionMode,
    /// Trailing character of the open word
    pub current_char: Option<char>,
    /// Most recent tone classifier label
    pub tone: Option<Tone>,
    /// Confidence of the most recent tone classification
    pub tone_confidence: f32,
    /// Composed text projected for display
    pub display_text: String,
    /// Confidence a tone needs to be applied
    pub tone_threshold: f32,
}

/// Thread-safe single-slot, latest-value status hand-off
///
/// `publish` overwrites the slot; `snapshot` clones the latest value. Cheap
/// to clone and share with any number of readers.
#[derive(Clone, Default)]
pub struct SharedStatus {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl SharedStatus {
    /// Create a slot holding the default snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with the latest completed frame's status
    pub fn publish(&self, snapshot: StatusSnapshot) {
        *self.inner.write() = snapshot;
    }

    /// Clone the most recently published snapshot
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().clone()
    }
}
