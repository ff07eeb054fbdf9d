//! Hand observation types shared across the frame pipeline
//!
//! A tracker adapter produces at most one [`HandObservation`] per frame:
//! 21 normalized landmark points plus a pixel bounding box. Everything
//! downstream (stability, motion, tone buffering, crop geometry) works on
//! these types.

pub mod motion;
pub mod stability;

pub use motion::MotionSignals;
pub use stability::StabilityWindow;

use std::time::Instant;
use tracing::warn;

/// Number of landmark points per detected hand
pub const LANDMARK_COUNT: usize = 21;

/// Length of a flattened keypoint frame (21 points × x, y, z)
pub const FLAT_LEN: usize = LANDMARK_COUNT * 3;

/// Wrist landmark index
pub const WRIST: usize = 0;

/// Index fingertip landmark index
pub const INDEX_TIP: usize = 8;

/// Pinky fingertip landmark index
pub const PINKY_TIP: usize = 20;

/// One frame's hand landmarks, image-normalized to [0, 1]
///
/// Immutable once captured; cloned into the tone buffer as needed.
#[derive(Clone, Debug, PartialEq)]
pub struct KeypointFrame {
    points: [[f32; 3]; LANDMARK_COUNT],
}

impl KeypointFrame {
    /// Create a frame from exactly 21 points
    pub fn new(points: [[f32; 3]; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Create a frame from a tracker landmark list
    ///
    /// Trackers occasionally emit a malformed point count; the list is
    /// truncated or zero-padded to 21 and the correction is logged.
    pub fn from_landmarks(landmarks: &[[f32; 3]]) -> Self {
        if landmarks.len() != LANDMARK_COUNT {
            warn!(
                count = landmarks.len(),
                expected = LANDMARK_COUNT,
                "unexpected landmark count, padding/truncating"
            );
        }
        let mut points = [[0.0f32; 3]; LANDMARK_COUNT];
        for (dst, src) in points.iter_mut().zip(landmarks.iter()) {
            *dst = *src;
        }
        Self { points }
    }

    /// All landmark points
    pub fn points(&self) -> &[[f32; 3]; LANDMARK_COUNT] {
        &self.points
    }

    /// A single landmark point
    pub fn point(&self, index: usize) -> [f32; 3] {
        self.points[index]
    }

    /// The frame flattened to `[x0, y0, z0, x1, ...]`
    pub fn flattened(&self) -> [f32; FLAT_LEN] {
        let mut flat = [0.0f32; FLAT_LEN];
        for (i, p) in self.points.iter().enumerate() {
            flat[i * 3] = p[0];
            flat[i * 3 + 1] = p[1];
            flat[i * 3 + 2] = p[2];
        }
        flat
    }

    /// Representative 2D point for movement tracking: the midpoint of the
    /// index and pinky fingertips.
    pub fn tip_midpoint(&self) -> (f32, f32) {
        let index = self.points[INDEX_TIP];
        let pinky = self.points[PINKY_TIP];
        ((index[0] + pinky[0]) / 2.0, (index[1] + pinky[1]) / 2.0)
    }
}

/// Axis-aligned pixel rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Tight bounding box of the landmarks in pixel space, for tracker
    /// adapters that do not report one themselves.
    pub fn from_keypoints(keypoints: &KeypointFrame, frame_width: u32, frame_height: u32) -> Self {
        let (mut x_min, mut y_min) = (f32::MAX, f32::MAX);
        let (mut x_max, mut y_max) = (f32::MIN, f32::MIN);
        for p in keypoints.points() {
            x_min = x_min.min(p[0]);
            y_min = y_min.min(p[1]);
            x_max = x_max.max(p[0]);
            y_max = y_max.max(p[1]);
        }
        let x = (x_min.clamp(0.0, 1.0) * frame_width as f32) as u32;
        let y = (y_min.clamp(0.0, 1.0) * frame_height as f32) as u32;
        let x2 = (x_max.clamp(0.0, 1.0) * frame_width as f32) as u32;
        let y2 = (y_max.clamp(0.0, 1.0) * frame_height as f32) as u32;
        Self {
            x,
            y,
            width: x2.saturating_sub(x),
            height: y2.saturating_sub(y),
        }
    }
}

/// Pixel region of the camera frame handed to the shape classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Expand a hand bounding box by `padding` pixels on every side, clamped
    /// to the frame. Returns `None` when the clamped region is degenerate.
    pub fn around(
        bbox: PixelRect,
        frame_width: u32,
        frame_height: u32,
        padding: u32,
    ) -> Option<Self> {
        let x1 = bbox.x.saturating_sub(padding);
        let y1 = bbox.y.saturating_sub(padding);
        let x2 = (bbox.x + bbox.width + padding).min(frame_width);
        let y2 = (bbox.y + bbox.height + padding).min(frame_height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }
}

/// One detected hand: landmarks plus pixel bounding box
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub keypoints: KeypointFrame,
    pub bbox: PixelRect,
}

impl HandObservation {
    pub fn new(keypoints: KeypointFrame, bbox: PixelRect) -> Self {
        Self { keypoints, bbox }
    }
}

/// Per-frame input to the session controller
///
/// `hand` is `None` when the tracker found no hand in the frame.
#[derive(Clone, Debug)]
pub struct FrameInput {
    pub at: Instant,
    pub frame_width: u32,
    pub frame_height: u32,
    pub hand: Option<HandObservation>,
}

impl FrameInput {
    /// Frame with a detected hand
    pub fn with_hand(
        at: Instant,
        frame_width: u32,
        frame_height: u32,
        hand: HandObservation,
    ) -> Self {
        Self {
            at,
            frame_width,
            frame_height,
            hand: Some(hand),
        }
    }

    /// Frame in which no hand was detected
    pub fn empty(at: Instant, frame_width: u32, frame_height: u32) -> Self {
        Self {
            at,
            frame_width,
            frame_height,
            hand: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(v: f32) -> KeypointFrame {
        KeypointFrame::new([[v; 3]; LANDMARK_COUNT])
    }

    #[test]
    fn test_from_landmarks_pads_short_list() {
        let frame = KeypointFrame::from_landmarks(&[[0.5, 0.5, 0.0]; 10]);
        assert_eq!(frame.point(9), [0.5, 0.5, 0.0]);
        assert_eq!(frame.point(10), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_landmarks_truncates_long_list() {
        let frame = KeypointFrame::from_landmarks(&[[0.25, 0.75, 0.0]; 30]);
        assert_eq!(frame.point(LANDMARK_COUNT - 1), [0.25, 0.75, 0.0]);
    }

    #[test]
    fn test_flattened_layout() {
        let mut points = [[0.0f32; 3]; LANDMARK_COUNT];
        points[1] = [0.1, 0.2, 0.3];
        let flat = KeypointFrame::new(points).flattened();
        assert_eq!(flat[3], 0.1);
        assert_eq!(flat[4], 0.2);
        assert_eq!(flat[5], 0.3);
    }

    #[test]
    fn test_tip_midpoint() {
        let mut points = [[0.0f32; 3]; LANDMARK_COUNT];
        points[INDEX_TIP] = [0.2, 0.4, 0.0];
        points[PINKY_TIP] = [0.6, 0.8, 0.0];
        let (x, y) = KeypointFrame::new(points).tip_midpoint();
        assert!((x - 0.4).abs() < 1e-6);
        assert!((y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_bbox_from_keypoints() {
        let mut points = [[0.5f32; 3]; LANDMARK_COUNT];
        points[0] = [0.25, 0.25, 0.0];
        points[1] = [0.75, 0.5, 0.0];
        let bbox = PixelRect::from_keypoints(&KeypointFrame::new(points), 640, 480);
        assert_eq!(bbox.x, 160);
        assert_eq!(bbox.y, 120);
        assert_eq!(bbox.width, 320);
        assert_eq!(bbox.height, 120);
    }

    #[test]
    fn test_crop_region_padding_and_clamp() {
        let bbox = PixelRect {
            x: 10,
            y: 10,
            width: 100,
            height: 100,
        };
        let crop = CropRegion::around(bbox, 640, 480, 20).unwrap();
        assert_eq!(crop.x, 0);
        assert_eq!(crop.y, 0);
        assert_eq!(crop.width, 130);
        assert_eq!(crop.height, 130);

        // Near the far edge the region clamps to the frame
        let bbox = PixelRect {
            x: 600,
            y: 440,
            width: 100,
            height: 100,
        };
        let crop = CropRegion::around(bbox, 640, 480, 20).unwrap();
        assert_eq!(crop.x + crop.width, 640);
        assert_eq!(crop.y + crop.height, 480);
    }

    #[test]
    fn test_degenerate_crop_rejected() {
        let bbox = PixelRect {
            x: 700,
            y: 10,
            width: 10,
            height: 10,
        };
        assert!(CropRegion::around(bbox, 640, 480, 0).is_none());
    }

    #[test]
    fn test_uniform_frame_midpoint() {
        let (x, y) = uniform(0.5).tip_midpoint();
        assert_eq!((x, y), (0.5, 0.5));
    }
}
