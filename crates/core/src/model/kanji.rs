use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::KanjiId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KanjiError {
    #[error("kanji symbol cannot be empty")]
    EmptySymbol,

    #[error("kanji meaning cannot be empty")]
    EmptyMeaning,

    #[error("stroke count must be > 0")]
    InvalidStrokeCount,

    #[error("unknown JLPT level: {0}")]
    UnknownLevel(String),
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// JLPT proficiency tier, ordered from the easiest (`N5`) to the hardest (`N1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl JlptLevel {
    /// All levels in ascending difficulty.
    pub const ALL: [JlptLevel; 5] = [
        JlptLevel::N5,
        JlptLevel::N4,
        JlptLevel::N3,
        JlptLevel::N2,
        JlptLevel::N1,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JlptLevel::N5 => "N5",
            JlptLevel::N4 => "N4",
            JlptLevel::N3 => "N3",
            JlptLevel::N2 => "N2",
            JlptLevel::N1 => "N1",
        }
    }
}

impl fmt::Display for JlptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JlptLevel {
    type Err = KanjiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N5" => Ok(Self::N5),
            "N4" => Ok(Self::N4),
            "N3" => Ok(Self::N3),
            "N2" => Ok(Self::N2),
            "N1" => Ok(Self::N1),
            _ => Err(KanjiError::UnknownLevel(s.to_string())),
        }
    }
}

//
// ─── STROKE DIFFICULTY ─────────────────────────────────────────────────────────
//

/// Coarse writing difficulty derived from the stroke count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrokeDifficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl StrokeDifficulty {
    #[must_use]
    pub fn from_strokes(stroke_count: u32) -> Self {
        match stroke_count {
            0..=3 => Self::Easy,
            4..=6 => Self::Medium,
            7..=10 => Self::Hard,
            _ => Self::VeryHard,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::VeryHard => "very hard",
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated kanji entry as it comes from a catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct KanjiDraft {
    pub symbol: String,
    pub meaning: String,
    #[serde(default)]
    pub reading: Option<String>,
    pub stroke_count: u32,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl KanjiDraft {
    #[must_use]
    pub fn new(symbol: impl Into<String>, meaning: impl Into<String>, stroke_count: u32) -> Self {
        Self {
            symbol: symbol.into(),
            meaning: meaning.into(),
            stroke_count,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reading(mut self, reading: impl Into<String>) -> Self {
        self.reading = Some(reading.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and normalize the draft, assigning the given id.
    ///
    /// # Errors
    ///
    /// Returns `KanjiError` if the symbol or meaning is blank, the stroke
    /// count is zero, or the level label is not one of N5..N1.
    pub fn validate(self, id: KanjiId) -> Result<KanjiRecord, KanjiError> {
        let symbol = self.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(KanjiError::EmptySymbol);
        }
        let meaning = self.meaning.trim().to_string();
        if meaning.is_empty() {
            return Err(KanjiError::EmptyMeaning);
        }
        if self.stroke_count == 0 {
            return Err(KanjiError::InvalidStrokeCount);
        }
        let level = normalize_optional(self.level)
            .map(|raw| raw.parse::<JlptLevel>())
            .transpose()?;
        let examples = self
            .examples
            .into_iter()
            .filter_map(|ex| normalize_optional(Some(ex)))
            .collect();

        Ok(KanjiRecord {
            id,
            symbol,
            meaning,
            reading: normalize_optional(self.reading),
            stroke_count: self.stroke_count,
            level,
            examples,
        })
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Immutable catalog entry for a single kanji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanjiRecord {
    id: KanjiId,
    symbol: String,
    meaning: String,
    reading: Option<String>,
    stroke_count: u32,
    level: Option<JlptLevel>,
    examples: Vec<String>,
}

impl KanjiRecord {
    #[must_use]
    pub fn id(&self) -> KanjiId {
        self.id
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn reading(&self) -> Option<&str> {
        self.reading.as_deref()
    }

    /// The reading when known, otherwise the meaning.
    ///
    /// Reading-type quiz answers are always built from this value.
    #[must_use]
    pub fn display_reading(&self) -> &str {
        self.reading.as_deref().unwrap_or(&self.meaning)
    }

    #[must_use]
    pub fn stroke_count(&self) -> u32 {
        self.stroke_count
    }

    #[must_use]
    pub fn stroke_difficulty(&self) -> StrokeDifficulty {
        StrokeDifficulty::from_strokes(self.stroke_count)
    }

    #[must_use]
    pub fn level(&self) -> Option<JlptLevel> {
        self.level
    }

    #[must_use]
    pub fn examples(&self) -> &[String] {
        &self.examples
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
