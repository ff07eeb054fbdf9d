//! Classifier seams for the external shape and tone models
//!
//! The actual models (a CNN over image crops, a sequence model over
//! keypoint frames) live outside this crate; adapters implement the two
//! traits here. Failures are reported as values, never panics, so the
//! controller can treat any failed call as "no result this frame".

use crate::compose::Tone;
use crate::hand::{CropRegion, KeypointFrame};
use crate::Result;
use tracing::warn;

/// Padding in pixels added around the hand bounding box before cropping
pub const CROP_PADDING: u32 = 20;

/// Side length of the square canvas the crop is letterboxed onto
pub const CANVAS_SIZE: u32 = 300;

/// Output of one shape classification: raw per-class scores, the argmax
/// index, and its softmax confidence
#[derive(Clone, Debug)]
pub struct ShapePrediction {
    pub scores: Vec<f32>,
    pub index: usize,
    pub confidence: f32,
}

/// Output of one tone classification
///
/// `tone` is `None` when the model is unloaded or produced no usable label;
/// confidence is 0.0 in that case.
#[derive(Clone, Debug, PartialEq)]
pub struct TonePrediction {
    pub tone: Option<Tone>,
    pub confidence: f32,
}

impl TonePrediction {
    /// The "no result" prediction
    pub fn none() -> Self {
        Self {
            tone: None,
            confidence: 0.0,
        }
    }
}

impl Default for TonePrediction {
    fn default() -> Self {
        Self::none()
    }
}

/// Static hand-shape classifier over a camera-frame crop
///
/// The adapter owns the current camera frame; the controller only decides
/// which region of it to classify.
pub trait ShapeClassifier: Send {
    fn classify(&mut self, crop: &CropRegion) -> Result<ShapePrediction>;
}

/// Tone-gesture classifier over a fixed-length keypoint sequence
///
/// Callers pad the sequence to the configured frame count by repeating the
/// last frame before invoking this.
pub trait ToneClassifier: Send {
    fn classify(&mut self, frames: &[KeypointFrame]) -> Result<TonePrediction>;

    /// False when the underlying model failed to load and predictions are
    /// permanently disabled
    fn is_available(&self) -> bool {
        true
    }
}

/// Stand-in used when the tone model artifact is missing or failed to load
///
/// Tone prediction degrades gracefully: every call succeeds with no label,
/// and the condition is logged once at construction.
pub struct DisabledToneClassifier;

impl DisabledToneClassifier {
    pub fn new(reason: &str) -> Self {
        warn!(reason, "tone classifier disabled; tone predictions will return no label");
        Self
    }
}

impl ToneClassifier for DisabledToneClassifier {
    fn classify(&mut self, _frames: &[KeypointFrame]) -> Result<TonePrediction> {
        Ok(TonePrediction::none())
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Placement of a crop resized aspect-preserving onto the square canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Letterbox {
    pub width: u32,
    pub height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
}

impl Letterbox {
    /// Scale a crop to fill the canvas along its longer side and center it
    /// along the shorter one. Returns `None` for degenerate crops.
    pub fn fit(crop_width: u32, crop_height: u32, canvas: u32) -> Option<Self> {
        if crop_width == 0 || crop_height == 0 || canvas == 0 {
            return None;
        }
        if crop_height > crop_width {
            let k = canvas as f32 / crop_height as f32;
            let width = ((k * crop_width as f32).round() as u32).min(canvas);
            Some(Self {
                width,
                height: canvas,
                x_offset: (canvas - width) / 2,
                y_offset: 0,
            })
        } else {
            let k = canvas as f32 / crop_width as f32;
            let height = ((k * crop_height as f32).round() as u32).min(canvas);
            Some(Self {
                width: canvas,
                height,
                x_offset: 0,
                y_offset: (canvas - height) / 2,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_tall_crop() {
        let lb = Letterbox::fit(100, 200, CANVAS_SIZE).unwrap();
        assert_eq!(lb.height, 300);
        assert_eq!(lb.width, 150);
        assert_eq!(lb.x_offset, 75);
        assert_eq!(lb.y_offset, 0);
    }

    #[test]
    fn test_letterbox_wide_crop() {
        let lb = Letterbox::fit(200, 100, CANVAS_SIZE).unwrap();
        assert_eq!(lb.width, 300);
        assert_eq!(lb.height, 150);
        assert_eq!(lb.y_offset, 75);
        assert_eq!(lb.x_offset, 0);
    }

    #[test]
    fn test_letterbox_square_fills_canvas() {
        let lb = Letterbox::fit(120, 120, CANVAS_SIZE).unwrap();
        assert_eq!(lb.width, 300);
        assert_eq!(lb.height, 300);
        assert_eq!((lb.x_offset, lb.y_offset), (0, 0));
    }

    #[test]
    fn test_letterbox_degenerate() {
        assert!(Letterbox::fit(0, 100, CANVAS_SIZE).is_none());
        assert!(Letterbox::fit(100, 0, CANVAS_SIZE).is_none());
    }

    #[test]
    fn test_disabled_tone_classifier() {
        let mut tone = DisabledToneClassifier::new("model file missing");
        assert!(!tone.is_available());
        let prediction = tone.classify(&[]).unwrap();
        assert_eq!(prediction, TonePrediction::none());
    }
}
