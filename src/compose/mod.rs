//! Rule-driven text composition
//!
//! Holds the in-progress word and the finalized sentence, and applies the
//! orthographic tables in [`rules`] to a stream of accepted classifier
//! labels. Composition is a pure function of the current word, the rule
//! tables, and the input label; nothing here looks at the clock.

pub mod rules;

pub use rules::{shape_label, ComposeRules, Tone, SHAPE_CLASSES};

use ringbuf::{traits::*, HeapRb};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Composer for diacritic-correct words and sentences
///
/// The word changes only through the operations here; the sentence grows
/// only via [`TextComposer::finalize_word`] and shrinks only via
/// [`TextComposer::delete_last`].
pub struct TextComposer {
    rules: Arc<ComposeRules>,
    sentence: String,
    word: String,
    history: HeapRb<String>,
    min_confidence: f32,
    display_cache: String,
    full_cache: String,
    cache_dirty: bool,
}

impl TextComposer {
    /// Create a composer over the given rule tables
    ///
    /// `history_capacity` bounds the majority-vote debounce window;
    /// `min_confidence` is the confidence a prediction must exceed.
    pub fn new(rules: Arc<ComposeRules>, history_capacity: usize, min_confidence: f32) -> Self {
        Self {
            rules,
            sentence: String::new(),
            word: String::new(),
            history: HeapRb::new(history_capacity),
            min_confidence,
            display_cache: String::new(),
            full_cache: String::new(),
            cache_dirty: true,
        }
    }

    /// Majority label over the buffered classifier outputs; ties resolve to
    /// the label seen earliest in the window
    fn most_frequent(&self) -> Option<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in self.history.iter() {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        let max = counts.values().copied().max()?;
        self.history
            .iter()
            .map(|l| l.as_str())
            .find(|l| counts[l] == max)
    }

    /// Feed one raw classifier output
    ///
    /// The label is recorded in the debounce history and accepted only if it
    /// matches the window majority with confidence above the gate. Accepted
    /// labels run through the composition rules; returns true iff the label
    /// was accepted (the word may still be unchanged, e.g. for a repeated
    /// sign).
    pub fn process_character(&mut self, raw: &str, confidence: f32) -> bool {
        self.history.push_overwrite(raw.to_string());
        let is_majority = self.most_frequent() == Some(raw);
        if !is_majority || confidence <= self.min_confidence {
            return false;
        }
        self.compose(raw)
    }

    fn compose(&mut self, raw: &str) -> bool {
        let is_modifier = self.rules.is_modifier(raw);
        let mapped = self
            .rules
            .display_token(raw)
            .or_else(|| single_char(raw));

        let Some(last) = self.word.chars().last() else {
            // A bare modifier cannot start a word
            if is_modifier {
                debug!(raw, "modifier rejected at word start");
                return false;
            }
            let Some(c) = mapped else {
                return false;
            };
            self.word.push(c);
            self.mark_dirty();
            return true;
        };

        // Repeated frames of the same sign are absorbed without growing the
        // word
        if let Some(c) = mapped {
            if self.rules.base_of(c) == self.rules.base_of(last) {
                return true;
            }
        }

        if is_modifier && !self.rules.modifier_allowed_after(raw, last) {
            debug!(raw, %last, "modifier has no valid predecessor");
            return false;
        }

        if self.rules.is_blocked(last, raw) {
            debug!(raw, %last, "label blocked by trailing character");
            return false;
        }

        if let Some(composed) = self.rules.replacement(raw, last) {
            self.word.pop();
            self.word.push(composed);
            self.mark_dirty();
            return true;
        }

        match mapped {
            Some(c) => {
                self.word.push(c);
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    /// Apply a tone mark to the last character of the word
    ///
    /// The lookup is keyed by the character's base vowel, so a new tone
    /// replaces a previously applied one rather than stacking. Returns true
    /// iff the word changed or already carried the requested tone.
    pub fn apply_tone(&mut self, tone: Tone) -> bool {
        let Some(last) = self.word.chars().last() else {
            return false;
        };
        let base = self.rules.base_of(last);
        let Some(toned) = self.rules.toned(base, tone) else {
            return false;
        };
        if toned != last {
            self.word.pop();
            self.word.push(toned);
            self.mark_dirty();
        }
        true
    }

    /// Append the open word plus separator to the sentence and clear it
    pub fn finalize_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        self.sentence.push_str(&self.word);
        self.sentence.push(' ');
        self.word.clear();
        self.mark_dirty();
    }

    /// Delete the last character of the word, or of the sentence when the
    /// word is empty (preserving a single trailing separator)
    pub fn delete_last(&mut self) -> bool {
        if self.word.pop().is_some() {
            self.mark_dirty();
            return true;
        }
        if self.sentence.is_empty() {
            return false;
        }
        let mut trimmed: String = self.sentence.trim_end().to_string();
        if trimmed.pop().is_some() {
            trimmed.push(' ');
            self.sentence = trimmed;
        } else {
            self.sentence.clear();
        }
        self.mark_dirty();
        true
    }

    /// Reset word and sentence to empty
    pub fn clear_text(&mut self) {
        self.word.clear();
        self.sentence.clear();
        self.mark_dirty();
    }

    /// Whether a word is currently open
    pub fn has_word(&self) -> bool {
        !self.word.is_empty()
    }

    /// The in-progress word
    pub fn current_word(&self) -> &str {
        &self.word
    }

    /// The finalized sentence
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    /// Last character of the open word, if any
    pub fn trailing_char(&self) -> Option<char> {
        self.word.chars().last()
    }

    /// Text projected through the presentation remap, trimmed for display
    pub fn display_text(&mut self) -> &str {
        self.refresh_caches();
        &self.display_cache
    }

    /// Sentence plus open word, unprojected
    pub fn full_text(&mut self) -> &str {
        self.refresh_caches();
        &self.full_cache
    }

    fn refresh_caches(&mut self) {
        if !self.cache_dirty {
            return;
        }
        self.full_cache.clear();
        self.full_cache.push_str(&self.sentence);
        self.full_cache.push_str(&self.word);
        self.display_cache = self
            .full_cache
            .chars()
            .map(|c| self.rules.present(c))
            .collect::<String>()
            .trim()
            .to_string();
        self.cache_dirty = false;
    }

    fn mark_dirty(&mut self) {
        self.cache_dirty = true;
    }
}
