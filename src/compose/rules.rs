//! Orthographic rule tables for Vietnamese sign composition
//!
//! The tables are built once into an immutable [`ComposeRules`] and shared
//! by reference (`Arc`) with the composer; nothing here mutates at runtime.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Labels the shape classifier can emit, indexed by its argmax output
pub const SHAPE_CLASSES: [&str; 26] = [
    "A", "B", "C", "D", "DD", "E", "G", "H", "I", "K", "L", "M", "Mu", "Munguoc", "N", "O", "P",
    "Q", "R", "Rau", "S", "T", "U", "V", "X", "Y",
];

/// Label for a shape-class index, `None` when the index is out of range
pub fn shape_label(index: usize) -> Option<&'static str> {
    SHAPE_CLASSES.get(index).copied()
}

/// The five Vietnamese tone marks recognized from motion gestures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Sac,
    Huyen,
    Hoi,
    Nga,
    Nang,
}

impl Tone {
    pub const ALL: [Tone; 5] = [Tone::Sac, Tone::Huyen, Tone::Hoi, Tone::Nga, Tone::Nang];

    /// The label the tone classifier uses for this tone
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Sac => "sac",
            Tone::Huyen => "huyen",
            Tone::Hoi => "hoi",
            Tone::Nga => "nga",
            Tone::Nang => "nang",
        }
    }

    /// Parse a classifier label
    pub fn from_label(label: &str) -> Option<Tone> {
        Tone::ALL.iter().copied().find(|t| t.as_str() == label)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable composition rule tables
///
/// - `display`: multi-letter raw tokens mapped to their composed glyph
/// - `replace`: trigger label -> (trailing character -> composed character);
///   covers the diacritic modifiers and the D digraph promotion
/// - `block`: composed character -> raw labels rejected while it is trailing
/// - `allowed_before`: modifier label -> trailing characters it may follow
/// - `tone`: base vowel -> tone mark -> toned character
/// - `base`: composed character -> its canonical base form
pub struct ComposeRules {
    display: HashMap<&'static str, char>,
    replace: HashMap<&'static str, HashMap<char, char>>,
    block: HashMap<char, HashSet<&'static str>>,
    allowed_before: HashMap<&'static str, HashSet<char>>,
    tone: HashMap<char, HashMap<Tone, char>>,
    base: HashMap<char, char>,
}

impl ComposeRules {
    /// Build the rule set for the Vietnamese alphabet
    pub fn vietnamese() -> Self {
        let display: HashMap<&'static str, char> = [
            ("EE", 'Ê'),
            ("AA", 'Â'),
            ("OW", 'Ơ'),
            ("AW", 'Ă'),
            ("UW", 'Ư'),
            ("OO", 'Ô'),
            ("DD", 'Đ'),
        ]
        .into_iter()
        .collect();

        let replace: HashMap<&'static str, HashMap<char, char>> = [
            ("Mu", vec![('A', 'Â'), ('O', 'Ô'), ('E', 'Ê')]),
            ("Munguoc", vec![('A', 'Ă')]),
            ("Rau", vec![('O', 'Ơ'), ('U', 'Ư')]),
            ("DD", vec![('D', 'Đ')]),
        ]
        .into_iter()
        .map(|(k, pairs)| (k, pairs.into_iter().collect()))
        .collect();

        let block: HashMap<char, HashSet<&'static str>> = [
            ('Â', vec!["A", "Mu"]),
            ('Ê', vec!["E", "Mu"]),
            ('Ơ', vec!["O", "Rau"]),
            ('Ă', vec!["A", "Munguoc"]),
            ('Ư', vec!["U", "Rau"]),
            ('Ô', vec!["O", "Mu"]),
            ('Đ', vec!["D", "DD"]),
        ]
        .into_iter()
        .map(|(k, labels)| (k, labels.into_iter().collect()))
        .collect();

        let allowed_before: HashMap<&'static str, HashSet<char>> = [
            ("Mu", vec!['A', 'E', 'O']),
            ("Munguoc", vec!['A']),
            ("Rau", vec!['U', 'O']),
        ]
        .into_iter()
        .map(|(k, chars)| (k, chars.into_iter().collect()))
        .collect();

        let tone_rows: [(char, [char; 5]); 12] = [
            ('A', ['Á', 'À', 'Ả', 'Ã', 'Ạ']),
            ('E', ['É', 'È', 'Ẻ', 'Ẽ', 'Ẹ']),
            ('O', ['Ó', 'Ò', 'Ỏ', 'Õ', 'Ọ']),
            ('I', ['Í', 'Ì', 'Ỉ', 'Ĩ', 'Ị']),
            ('U', ['Ú', 'Ù', 'Ủ', 'Ũ', 'Ụ']),
            ('Y', ['Ý', 'Ỳ', 'Ỷ', 'Ỹ', 'Ỵ']),
            ('Â', ['Ấ', 'Ầ', 'Ẩ', 'Ẫ', 'Ậ']),
            ('Ê', ['Ế', 'Ề', 'Ể', 'Ễ', 'Ệ']),
            ('Ô', ['Ố', 'Ồ', 'Ổ', 'Ỗ', 'Ộ']),
            ('Ă', ['Ắ', 'Ằ', 'Ẳ', 'Ẵ', 'Ặ']),
            ('Ơ', ['Ớ', 'Ờ', 'Ở', 'Ỡ', 'Ợ']),
            ('Ư', ['Ứ', 'Ừ', 'Ử', 'Ữ', 'Ự']),
        ];

        let mut tone: HashMap<char, HashMap<Tone, char>> = HashMap::new();
        let mut base: HashMap<char, char> = HashMap::new();
        for (vowel, toned) in tone_rows {
            let row: HashMap<Tone, char> =
                Tone::ALL.iter().copied().zip(toned.into_iter()).collect();
            for c in toned {
                base.insert(c, vowel);
            }
            base.insert(vowel, vowel);
            tone.insert(vowel, row);
        }

        Self {
            display,
            replace,
            block,
            allowed_before,
            tone,
            base,
        }
    }

    /// Composed glyph for a raw multi-letter token, if any
    pub fn display_token(&self, raw: &str) -> Option<char> {
        self.display.get(raw).copied()
    }

    /// Whether the raw label is a diacritic modifier rather than a letter
    pub fn is_modifier(&self, raw: &str) -> bool {
        self.allowed_before.contains_key(raw)
    }

    /// Whether a modifier may follow the given trailing character
    pub fn modifier_allowed_after(&self, raw: &str, last: char) -> bool {
        self.allowed_before
            .get(raw)
            .map(|set| set.contains(&last))
            .unwrap_or(false)
    }

    /// Composed character replacing `last` when `raw` triggers a rewrite
    pub fn replacement(&self, raw: &str, last: char) -> Option<char> {
        self.replace.get(raw).and_then(|m| m.get(&last)).copied()
    }

    /// Whether `raw` is rejected while `last` is the trailing character
    pub fn is_blocked(&self, last: char, raw: &str) -> bool {
        self.block
            .get(&last)
            .map(|set| set.contains(raw))
            .unwrap_or(false)
    }

    /// Canonical base form of a composed character (identity for plain ones)
    pub fn base_of(&self, c: char) -> char {
        self.base.get(&c).copied().unwrap_or(c)
    }

    /// Toned character for a base vowel, if the vowel carries tone marks
    pub fn toned(&self, base: char, tone: Tone) -> Option<char> {
        self.tone.get(&base).and_then(|row| row.get(&tone)).copied()
    }

    /// Presentation remap applied when projecting text for display
    pub fn present(&self, c: char) -> char {
        let mut buf = [0u8; 4];
        let s: &str = c.encode_utf8(&mut buf);
        self.display.get(s).copied().unwrap_or(c)
    }
}
