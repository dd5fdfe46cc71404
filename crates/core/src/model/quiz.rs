use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::model::ids::KanjiId;
use crate::model::kanji::JlptLevel;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("unknown quiz mode: {0}")]
    UnknownMode(String),

    #[error("unknown quiz difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── MODE / DIFFICULTY ─────────────────────────────────────────────────────────
//

/// Which side of the kanji a quiz asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Meaning,
    Reading,
    /// Coin flip between meaning and reading for every question.
    Mixed,
}

impl FromStr for QuizMode {
    type Err = QuizSettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meaning" => Ok(Self::Meaning),
            "reading" => Ok(Self::Reading),
            "mixed" => Ok(Self::Mixed),
            _ => Err(QuizSettingsError::UnknownMode(s.to_string())),
        }
    }
}

/// Coarse filter bucket mapping onto catalog levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl QuizDifficulty {
    #[must_use]
    pub fn levels(self) -> &'static [JlptLevel] {
        match self {
            Self::Easy => &[JlptLevel::N5],
            Self::Medium => &[JlptLevel::N4, JlptLevel::N3],
            Self::Hard => &[JlptLevel::N2, JlptLevel::N1],
        }
    }
}

impl FromStr for QuizDifficulty {
    type Err = QuizSettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(QuizSettingsError::UnknownDifficulty(s.to_string())),
        }
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Meaning,
    Reading,
}

impl QuestionType {
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Meaning => "What does this kanji mean?",
            Self::Reading => "How is this kanji read?",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meaning => f.write_str("meaning"),
            Self::Reading => f.write_str("reading"),
        }
    }
}

/// One multiple-choice question about a catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub kanji_id: KanjiId,
    pub question_type: QuestionType,
    pub prompt: String,
    /// What the learner is shown: the glyph for meaning questions, the gloss for reading ones.
    pub subject: String,
    pub correct_answer: String,
    pub options: Vec<String>,
}

impl QuizQuestion {
    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        self.correct_answer == selected
    }
}

//
// ─── SETTINGS / RULES ──────────────────────────────────────────────────────────
//

/// Question counts offered by the setup screen.
pub const QUESTION_COUNT_CHOICES: [usize; 4] = [5, 10, 15, 20];

/// What the learner picked before starting a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    pub mode: QuizMode,
    pub difficulty: QuizDifficulty,
    pub question_count: usize,
}

impl QuizSettings {
    #[must_use]
    pub fn new(mode: QuizMode, difficulty: QuizDifficulty, question_count: usize) -> Self {
        Self {
            mode,
            difficulty,
            question_count,
        }
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self::new(QuizMode::Meaning, QuizDifficulty::Easy, QUESTION_COUNT_CHOICES[0])
    }
}

/// Fixed timing and crediting rules for a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizRules {
    pub time_budget_secs: u32,
    /// How long a graded answer stays on screen before the quiz moves on.
    pub reveal_delay: Duration,
    /// Practice minutes credited per completed quiz, regardless of elapsed time.
    pub practice_credit_minutes: u32,
}

impl QuizRules {
    #[must_use]
    pub fn with_time_budget(mut self, secs: u32) -> Self {
        self.time_budget_secs = secs;
        self
    }
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            time_budget_secs: 60,
            reveal_delay: Duration::from_millis(1500),
            practice_credit_minutes: 1,
        }
    }
}
