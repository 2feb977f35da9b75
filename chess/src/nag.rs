//! Numeric Annotation Glyphs that carry a move-quality judgement.

use serde::Serialize;

/// How a renderer should classify an annotated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NagClass {
    Good,
    Mistake,
    Brilliant,
    Blunder,
    Interesting,
    Dubious,
}

/// The six move-assessment NAGs (`$1` to `$6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Nag {
    Good = 1,
    Mistake = 2,
    Brilliant = 3,
    Blunder = 4,
    Interesting = 5,
    Dubious = 6,
}

impl Nag {
    pub const ALL: [Nag; 6] = [
        Self::Good,
        Self::Mistake,
        Self::Brilliant,
        Self::Blunder,
        Self::Interesting,
        Self::Dubious,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|nag| nag.code() == code)
    }

    /// Map a move-suffix glyph (`!`, `?!`, ...) to its NAG.
    pub fn from_glyph(glyph: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|nag| nag.glyph() == glyph)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Good => "!",
            Self::Mistake => "?",
            Self::Brilliant => "!!",
            Self::Blunder => "??",
            Self::Interesting => "!?",
            Self::Dubious => "?!",
        }
    }

    pub fn class(self) -> NagClass {
        match self {
            Self::Good => NagClass::Good,
            Self::Mistake => NagClass::Mistake,
            Self::Brilliant => NagClass::Brilliant,
            Self::Blunder => NagClass::Blunder,
            Self::Interesting => NagClass::Interesting,
            Self::Dubious => NagClass::Dubious,
        }
    }
}

impl std::fmt::Display for Nag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.glyph())
    }
}
