//! Per-frame gesture session controller
//!
//! Arbitrates, frame by frame, between character recognition (hand holding
//! a still shape) and tone collection (hand performing a deliberate
//! gesture), under warmup, debounce, and cooldown timers. The controller is
//! the single writer of all session and text state; classifier failures are
//! caught at the call site and treated as "no result this frame".

use crate::classify::{ShapeClassifier, ToneClassifier, TonePrediction, CROP_PADDING};
use crate::compose::{shape_label, ComposeRules, TextComposer};
use crate::config::SessionConfig;
use crate::hand::{CropRegion, FrameInput, HandObservation, KeypointFrame, MotionSignals, StabilityWindow};
use crate::session::state::SessionState;
use crate::status::StatusSnapshot;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Top-level state machine driving recognition and composition
pub struct GestureSessionController {
    config: SessionConfig,
    state: SessionState,
    stability: StabilityWindow,
    motion: MotionSignals,
    composer: TextComposer,
    shape: Box<dyn ShapeClassifier>,
    tone: Box<dyn ToneClassifier>,
    /// Blocks tone re-detection until the next accepted character
    tone_just_applied: bool,
    /// When the moving condition started holding, for start debouncing
    motion_hold_since: Option<Instant>,
    last_hand_seen: Option<Instant>,
    /// Last time the open word was extended by an accepted character
    last_word_activity: Option<Instant>,
    /// Most recent tone classifier output, retained for observers
    last_tone: TonePrediction,
}

impl GestureSessionController {
    /// Create a controller with the built-in Vietnamese rule tables
    pub fn new(
        config: SessionConfig,
        shape: Box<dyn ShapeClassifier>,
        tone: Box<dyn ToneClassifier>,
    ) -> Result<Self> {
        Self::with_rules(config, Arc::new(ComposeRules::vietnamese()), shape, tone)
    }

    /// Create a controller over an existing shared rule table
    pub fn with_rules(
        config: SessionConfig,
        rules: Arc<ComposeRules>,
        shape: Box<dyn ShapeClassifier>,
        tone: Box<dyn ToneClassifier>,
    ) -> Result<Self> {
        config.validate()?;
        let stability = StabilityWindow::new(config.stability_window, config.stability_threshold);
        let motion = MotionSignals::new(&config);
        let composer = TextComposer::new(
            rules,
            config.prediction_history,
            config.char_confidence_threshold,
        );
        Ok(Self {
            config,
            state: SessionState::NoHand,
            stability,
            motion,
            composer,
            shape,
            tone,
            tone_just_applied: false,
            motion_hold_since: None,
            last_hand_seen: None,
            last_word_activity: None,
            last_tone: TonePrediction::none(),
        })
    }

    /// Process one frame of tracker output
    pub fn process_frame(&mut self, input: &FrameInput) {
        match &input.hand {
            Some(hand) => self.on_hand_frame(input, hand),
            None => self.on_empty_frame(input.at),
        }
    }

    fn on_hand_frame(&mut self, input: &FrameInput, hand: &HandObservation) {
        let now = input.at;
        self.last_hand_seen = Some(now);
        let state = std::mem::take(&mut self.state);
        self.state = match state {
            SessionState::NoHand => {
                debug!("hand detected, warming up");
                SessionState::Warmup { detected_at: now }
            }
            SessionState::Warmup { detected_at } => {
                if now.duration_since(detected_at) >= self.config.warmup_delay {
                    debug!("warmup complete, recognition started");
                    SessionState::AwaitCharacter
                } else {
                    SessionState::Warmup { detected_at }
                }
            }
            SessionState::AwaitCharacter => self.await_character(input, hand, now),
            SessionState::TonePendingStart { started_at, seed } => {
                self.motion.update(&hand.keypoints);
                if now.duration_since(started_at) >= self.config.tone_start_delay {
                    debug!("tone collection started");
                    SessionState::ToneCollecting {
                        started_at,
                        last_sample_at: now,
                        frames: vec![seed],
                    }
                } else {
                    SessionState::TonePendingStart { started_at, seed }
                }
            }
            SessionState::ToneCollecting {
                started_at,
                last_sample_at,
                frames,
            } => self.collect_tone(hand, now, started_at, last_sample_at, frames),
            SessionState::PostToneCooldown { until } => {
                // Keep tracking the representative point so movement right
                // after the cooldown is judged on fresh history
                self.motion.track_position(&hand.keypoints);
                self.motion_hold_since = None;
                if now >= until {
                    SessionState::AwaitCharacter
                } else {
                    SessionState::PostToneCooldown { until }
                }
            }
            SessionState::PostCharCooldown { until } => {
                self.stability.add(&hand.keypoints);
                self.motion.update(&hand.keypoints);
                self.motion_hold_since = None;
                if now >= until {
                    SessionState::AwaitCharacter
                } else {
                    SessionState::PostCharCooldown { until }
                }
            }
        };
    }

    fn await_character(
        &mut self,
        input: &FrameInput,
        hand: &HandObservation,
        now: Instant,
    ) -> SessionState {
        self.stability.add(&hand.keypoints);
        self.motion.update(&hand.keypoints);

        if self.motion.is_moving() && !self.tone_just_applied {
            match self.motion_hold_since {
                None => self.motion_hold_since = Some(now),
                Some(since) if now.duration_since(since) >= self.config.tone_start_hold => {
                    self.motion_hold_since = None;
                    self.stability.reset();
                    info!("tone session started");
                    return SessionState::TonePendingStart {
                        started_at: now,
                        seed: hand.keypoints.clone(),
                    };
                }
                Some(_) => {}
            }
        } else {
            self.motion_hold_since = None;
        }

        if self.stability.is_stable() {
            if let Some(crop) = CropRegion::around(
                hand.bbox,
                input.frame_width,
                input.frame_height,
                CROP_PADDING,
            ) {
                match self.shape.classify(&crop) {
                    Ok(prediction) => {
                        if let Some(label) = shape_label(prediction.index) {
                            if self
                                .composer
                                .process_character(label, prediction.confidence)
                            {
                                debug!(
                                    label,
                                    confidence = prediction.confidence,
                                    "character accepted"
                                );
                                self.tone_just_applied = false;
                                self.last_word_activity = Some(now);
                                return SessionState::PostCharCooldown {
                                    until: now + self.config.char_cooldown,
                                };
                            }
                        } else {
                            warn!(
                                index = prediction.index,
                                "shape classifier returned unknown class index"
                            );
                        }
                    }
                    Err(e) => warn!(error = %e, "shape classifier failed, no result this frame"),
                }
            }
        }
        SessionState::AwaitCharacter
    }

    fn collect_tone(
        &mut self,
        hand: &HandObservation,
        now: Instant,
        started_at: Instant,
        mut last_sample_at: Instant,
        mut frames: Vec<KeypointFrame>,
    ) -> SessionState {
        self.motion.update(&hand.keypoints);
        let moving = self.motion.is_moving();

        if moving
            && frames.len() < self.config.tone_frame_count
            && now.duration_since(last_sample_at) >= self.config.sample_interval()
        {
            frames.push(hand.keypoints.clone());
            last_sample_at = now;
        }

        let elapsed = now.duration_since(started_at);
        if frames.len() >= self.config.tone_frame_count
            || elapsed >= self.config.tone_window
            || !moving
        {
            if !moving {
                debug!("hand still, stopping tone collection");
            }
            self.finalize_tone(now, started_at, frames)
        } else {
            SessionState::ToneCollecting {
                started_at,
                last_sample_at,
                frames,
            }
        }
    }

    fn finalize_tone(
        &mut self,
        now: Instant,
        started_at: Instant,
        mut frames: Vec<KeypointFrame>,
    ) -> SessionState {
        self.stability.reset();
        self.motion.clear_positions();

        let elapsed = now.duration_since(started_at);
        if elapsed < self.config.tone_min_duration {
            info!(?elapsed, "gesture too short, discarding tone session");
            return SessionState::PostToneCooldown {
                until: now + self.config.tone_discard_cooldown,
            };
        }

        if let Some(last) = frames.last().cloned() {
            while frames.len() < self.config.tone_frame_count {
                frames.push(last.clone());
            }
        }

        match self.tone.classify(&frames) {
            Ok(prediction) => {
                self.last_tone = prediction.clone();
                match prediction.tone {
                    Some(tone)
                        if prediction.confidence >= self.config.tone_confidence_threshold =>
                    {
                        let applied = self.composer.apply_tone(tone);
                        info!(
                            %tone,
                            confidence = prediction.confidence,
                            applied,
                            "tone recognized"
                        );
                        self.tone_just_applied = true;
                        SessionState::PostToneCooldown {
                            until: now + self.config.tone_applied_cooldown,
                        }
                    }
                    _ => {
                        // Retry allowed: the lock stays clear
                        info!(
                            confidence = prediction.confidence,
                            "tone confidence below threshold"
                        );
                        SessionState::PostToneCooldown {
                            until: now + self.config.tone_retry_cooldown,
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "tone classifier failed, no result this frame");
                self.last_tone = TonePrediction::none();
                SessionState::PostToneCooldown {
                    until: now + self.config.tone_retry_cooldown,
                }
            }
        }
    }

    fn on_empty_frame(&mut self, now: Instant) {
        self.motion_hold_since = None;
        if let Some(seen) = self.last_hand_seen {
            if self.state != SessionState::NoHand
                && now.duration_since(seen) >= self.config.no_hand_timeout
            {
                info!("hand lost, resetting session");
                self.reset();
            }
        }
        if let Some(active) = self.last_word_activity {
            if self.composer.has_word()
                && now.duration_since(active) >= self.config.no_hand_timeout
            {
                info!("finalizing word after inactivity");
                self.composer.finalize_word();
            }
        }
    }

    /// Reset session state: windows, histories, tone session, and locks.
    /// Composed text is preserved.
    pub fn reset(&mut self) {
        self.state = SessionState::NoHand;
        self.stability.reset();
        self.motion.reset();
        self.tone_just_applied = false;
        self.motion_hold_since = None;
        self.last_hand_seen = None;
    }

    /// Status record for the observer, built after a frame completes
    pub fn snapshot(&mut self, fps: f32) -> StatusSnapshot {
        StatusSnapshot {
            fps,
            mode: self.state.mode(),
            current_char: self.composer.trailing_char(),
            tone: self.last_tone.tone,
            tone_confidence: self.last_tone.confidence,
            display_text: self.composer.display_text().to_string(),
            tone_threshold: self.config.tone_confidence_threshold,
        }
    }

    /// Current session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Motion signals, for observers interested in the hysteresis flag
    pub fn motion(&self) -> &MotionSignals {
        &self.motion
    }

    /// The text composer
    pub fn composer(&self) -> &TextComposer {
        &self.composer
    }

    /// Finalize the open word into the sentence
    pub fn finalize_word(&mut self) {
        self.composer.finalize_word();
    }

    /// Delete the last composed character
    pub fn delete_last(&mut self) -> bool {
        self.composer.delete_last()
    }

    /// Clear all composed text
    pub fn clear_text(&mut self) {
        self.composer.clear_text();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ShapePrediction;
    use crate::hand::{HandObservation, KeypointFrame, PixelRect, LANDMARK_COUNT};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedShape {
        index: usize,
        confidence: f32,
        calls: Arc<AtomicUsize>,
    }

    impl ShapeClassifier for ScriptedShape {
        fn classify(&mut self, _crop: &CropRegion) -> Result<ShapePrediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ShapePrediction {
                scores: vec![0.0; 26],
                index: self.index,
                confidence: self.confidence,
            })
        }
    }

    struct ScriptedTone {
        result: TonePrediction,
        calls: Arc<AtomicUsize>,
    }

    impl ToneClassifier for ScriptedTone {
        fn classify(&mut self, _frames: &[KeypointFrame]) -> Result<TonePrediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    fn controller_with(
        shape_index: usize,
        shape_confidence: f32,
    ) -> (GestureSessionController, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let shape_calls = Arc::new(AtomicUsize::new(0));
        let tone_calls = Arc::new(AtomicUsize::new(0));
        let shape = Box::new(ScriptedShape {
            index: shape_index,
            confidence: shape_confidence,
            calls: shape_calls.clone(),
        });
        let tone = Box::new(ScriptedTone {
            result: TonePrediction::none(),
            calls: tone_calls.clone(),
        });
        let controller =
            GestureSessionController::new(SessionConfig::default(), shape, tone).unwrap();
        (controller, shape_calls, tone_calls)
    }

    fn hand_at(v: f32) -> HandObservation {
        HandObservation::new(
            KeypointFrame::new([[v; 3]; LANDMARK_COUNT]),
            PixelRect {
                x: 100,
                y: 100,
                width: 200,
                height: 200,
            },
        )
    }

    fn frame(at: Instant, hand: Option<HandObservation>) -> FrameInput {
        FrameInput {
            at,
            frame_width: 640,
            frame_height: 480,
            hand,
        }
    }

    #[test]
    fn test_warmup_debounces_detection() {
        let (mut c, _, _) = controller_with(0, 0.99);
        let t0 = Instant::now();
        c.process_frame(&frame(t0, Some(hand_at(0.5))));
        assert!(matches!(c.state(), SessionState::Warmup { .. }));
        c.process_frame(&frame(t0 + Duration::from_millis(100), Some(hand_at(0.5))));
        assert!(matches!(c.state(), SessionState::Warmup { .. }));
        c.process_frame(&frame(t0 + Duration::from_millis(320), Some(hand_at(0.5))));
        assert_eq!(*c.state(), SessionState::AwaitCharacter);
    }

    #[test]
    fn test_stable_hand_accepts_character() {
        let (mut c, shape_calls, _) = controller_with(0, 0.99);
        let t0 = Instant::now();
        let mut t = t0;
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        t += Duration::from_millis(320);
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        assert_eq!(*c.state(), SessionState::AwaitCharacter);
        // Fill the stability window with an unchanged pose
        for _ in 0..12 {
            t += Duration::from_millis(33);
            c.process_frame(&frame(t, Some(hand_at(0.5))));
        }
        assert_eq!(shape_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.composer().current_word(), "A");
        assert!(matches!(c.state(), SessionState::PostCharCooldown { .. }));
    }

    #[test]
    fn test_char_cooldown_blocks_then_releases() {
        let (mut c, shape_calls, _) = controller_with(0, 0.99);
        let t0 = Instant::now();
        let mut t = t0;
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        t += Duration::from_millis(320);
        for _ in 0..13 {
            c.process_frame(&frame(t, Some(hand_at(0.5))));
            t += Duration::from_millis(33);
        }
        assert_eq!(shape_calls.load(Ordering::SeqCst), 1);
        // Within the cooldown no further classification happens
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        assert_eq!(shape_calls.load(Ordering::SeqCst), 1);
        // After the cooldown the stable pose classifies again (and the
        // repeated sign is absorbed without growing the word)
        t += Duration::from_millis(320);
        for _ in 0..13 {
            c.process_frame(&frame(t, Some(hand_at(0.5))));
            t += Duration::from_millis(33);
        }
        assert!(shape_calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(c.composer().current_word(), "A");
    }

    #[test]
    fn test_unknown_class_index_ignored() {
        let (mut c, shape_calls, _) = controller_with(99, 0.99);
        let t0 = Instant::now();
        let mut t = t0;
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        t += Duration::from_millis(320);
        for _ in 0..14 {
            c.process_frame(&frame(t, Some(hand_at(0.5))));
            t += Duration::from_millis(33);
        }
        assert!(shape_calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(c.composer().current_word(), "");
        assert_eq!(*c.state(), SessionState::AwaitCharacter);
    }

    #[test]
    fn test_failing_shape_classifier_continues() {
        struct FailingShape;
        impl ShapeClassifier for FailingShape {
            fn classify(&mut self, _crop: &CropRegion) -> Result<ShapePrediction> {
                Err(crate::SignflowError::ClassifierError("inference failed".into()))
            }
        }
        let tone = Box::new(ScriptedTone {
            result: TonePrediction::none(),
            calls: Arc::new(AtomicUsize::new(0)),
        });
        let mut c = GestureSessionController::new(
            SessionConfig::default(),
            Box::new(FailingShape),
            tone,
        )
        .unwrap();
        let t0 = Instant::now();
        let mut t = t0;
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        t += Duration::from_millis(320);
        for _ in 0..14 {
            c.process_frame(&frame(t, Some(hand_at(0.5))));
            t += Duration::from_millis(33);
        }
        // Errors are swallowed; the session keeps running
        assert_eq!(*c.state(), SessionState::AwaitCharacter);
        assert_eq!(c.composer().current_word(), "");
    }

    #[test]
    fn test_hand_loss_resets_after_timeout() {
        let (mut c, _, _) = controller_with(0, 0.99);
        let t0 = Instant::now();
        c.process_frame(&frame(t0, Some(hand_at(0.5))));
        assert!(matches!(c.state(), SessionState::Warmup { .. }));
        // Brief absence does not reset
        c.process_frame(&frame(t0 + Duration::from_millis(500), None));
        assert!(matches!(c.state(), SessionState::Warmup { .. }));
        c.process_frame(&frame(t0 + Duration::from_millis(1100), None));
        assert_eq!(*c.state(), SessionState::NoHand);
    }

    #[test]
    fn test_word_finalized_once_after_inactivity() {
        let (mut c, _, _) = controller_with(0, 0.99);
        let t0 = Instant::now();
        let mut t = t0;
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        t += Duration::from_millis(320);
        for _ in 0..13 {
            c.process_frame(&frame(t, Some(hand_at(0.5))));
            t += Duration::from_millis(33);
        }
        assert_eq!(c.composer().current_word(), "A");
        // Hand disappears; after the timeout the word finalizes exactly once
        t += Duration::from_millis(1100);
        c.process_frame(&frame(t, None));
        assert_eq!(c.composer().sentence(), "A ");
        assert!(!c.composer().has_word());
        for _ in 0..5 {
            t += Duration::from_millis(33);
            c.process_frame(&frame(t, None));
        }
        assert_eq!(c.composer().sentence(), "A ");
    }

    #[test]
    fn test_snapshot_reflects_composer() {
        let (mut c, _, _) = controller_with(0, 0.99);
        let t0 = Instant::now();
        let mut t = t0;
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        t += Duration::from_millis(320);
        for _ in 0..13 {
            c.process_frame(&frame(t, Some(hand_at(0.5))));
            t += Duration::from_millis(33);
        }
        let snapshot = c.snapshot(30.0);
        assert_eq!(snapshot.current_char, Some('A'));
        assert_eq!(snapshot.display_text, "A");
        assert_eq!(snapshot.fps, 30.0);
        assert_eq!(snapshot.tone_threshold, 0.8);
    }

    #[test]
    fn test_text_commands_pass_through() {
        let (mut c, _, _) = controller_with(0, 0.99);
        let t0 = Instant::now();
        let mut t = t0;
        c.process_frame(&frame(t, Some(hand_at(0.5))));
        t += Duration::from_millis(320);
        for _ in 0..13 {
            c.process_frame(&frame(t, Some(hand_at(0.5))));
            t += Duration::from_millis(33);
        }
        c.finalize_word();
        assert_eq!(c.composer().sentence(), "A ");
        assert!(c.delete_last());
        c.clear_text();
        assert_eq!(c.composer().sentence(), "");
    }
}
