//! Note names and the equal-tempered base frequency table.
//!
//! Frequencies are tabulated for the reference octave (4) and scaled by
//! powers of two for other octaves. Enharmonic spellings share a single
//! table value, so `b#4` and `c4` produce bit-identical frequencies.

use serde::{Deserialize, Serialize};

/// Octave the note table is tabulated for.
pub const REFERENCE_OCTAVE: i32 = 4;

/// Accidental following a note letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    Sharp,
    Flat,
}

impl Accidental {
    pub fn symbol(self) -> char {
        match self {
            Accidental::Sharp => '#',
            Accidental::Flat => 'b',
        }
    }
}

/// A note letter plus optional accidental, normalized to lowercase.
///
/// Letters run `a` through `h`; `h` is the German spelling of B natural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteToken {
    letter: char,
    accidental: Option<Accidental>,
}

impl NoteToken {
    /// Parse a token such as `"C#"`, `"eb"` or `"HB"`.
    ///
    /// Returns `None` unless the whole string is a single letter `a`-`h`
    /// (any case) optionally followed by `#` or `b`/`B`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        let letter = chars.next()?.to_ascii_lowercase();
        if !('a'..='h').contains(&letter) {
            return None;
        }
        let accidental = match chars.next() {
            None => None,
            Some('#') => Some(Accidental::Sharp),
            Some('b') | Some('B') => Some(Accidental::Flat),
            Some(_) => return None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self { letter, accidental })
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn accidental(&self) -> Option<Accidental> {
        self.accidental
    }

    /// Normalized table key, e.g. `"c#"`.
    pub fn key(&self) -> String {
        match self.accidental {
            Some(acc) => format!("{}{}", self.letter, acc.symbol()),
            None => self.letter.to_string(),
        }
    }

    /// Frequency of this token in the reference octave.
    pub fn base_frequency(&self) -> Option<f32> {
        base_frequency(&self.key())
    }
}

impl std::fmt::Display for NoteToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Octave-4 frequencies in Hertz, keyed by normalized token.
/// See http://www.phy.mtu.edu/~suits/notefreqs.html for the full chart.
const NOTE_TABLE: [(&str, f32); 24] = [
    ("b#", 261.626),
    ("h#", 261.626),
    ("c", 261.626),
    ("c#", 277.183),
    ("db", 277.183),
    ("d", 293.665),
    ("d#", 311.127),
    ("eb", 311.127),
    ("e", 329.628),
    ("fb", 329.628),
    ("e#", 349.228),
    ("f", 349.228),
    ("f#", 369.994),
    ("gb", 369.994),
    ("g", 391.995),
    ("g#", 415.305),
    ("ab", 415.305),
    ("a", 440.0),
    ("a#", 466.164),
    ("bb", 466.164),
    ("hb", 466.164),
    ("b", 493.883),
    ("h", 493.883),
    ("cb", 493.883),
];

/// Look up the reference-octave frequency of a normalized token.
///
/// Matching is case-insensitive; `None` means the token is not in the table.
pub fn base_frequency(token: &str) -> Option<f32> {
    let key = token.trim().to_ascii_lowercase();
    NOTE_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, hz)| hz)
}

/// Frequency of `token` in `octave`: `table[token] * 2^(octave - 4)`.
///
/// Computed in double precision and narrowed once, so scaling by whole
/// octaves stays exact.
pub fn frequency(token: &NoteToken, octave: i32) -> Option<f32> {
    let base = token.base_frequency()?;
    let scale = 2f64.powi(octave.saturating_sub(REFERENCE_OCTAVE));
    Some((base as f64 * scale) as f32)
}

/// How a caller identified the pitch of a note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoteSpecifier {
    NoteName { token: NoteToken, octave: i32 },
    Frequency { hertz: f32 },
}

impl NoteSpecifier {
    /// Resolve to Hertz. `None` for a token missing from the table.
    pub fn hertz(&self) -> Option<f32> {
        match *self {
            NoteSpecifier::NoteName { ref token, octave } => frequency(token, octave),
            NoteSpecifier::Frequency { hertz } => Some(hertz),
        }
    }
}

impl std::fmt::Display for NoteSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteSpecifier::NoteName { token, octave } => write!(f, "note {} octave {}", token, octave),
            NoteSpecifier::Frequency { hertz } => write!(f, "{} Hz", hertz),
        }
    }
}
