use std::fmt;

use crate::model::progress::fraction_of;

/// Qualitative verdict for a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QuizGrade {
    TryAgain,
    Fair,
    Good,
    Excellent,
}

impl fmt::Display for QuizGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent!",
            Self::Good => "Good!",
            Self::Fair => "Not bad",
            Self::TryAgain => "Try again",
        };
        f.write_str(label)
    }
}

/// Why a quiz session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    AllAnswered,
    TimeUp,
    /// The quiz had no questions to begin with.
    Empty,
}

/// Score card for a completed quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizResult {
    score: usize,
    total: usize,
    elapsed_secs: u32,
}

impl QuizResult {
    #[must_use]
    pub fn new(score: usize, total: usize, elapsed_secs: u32) -> Self {
        Self {
            score: score.min(total),
            total,
            elapsed_secs,
        }
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Share of correct answers; `0.0` for an empty quiz.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        fraction_of(self.score, self.total)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).floor() as u32
    }

    #[must_use]
    pub fn grade(&self) -> QuizGrade {
        match self.fraction() {
            f if f >= 0.9 => QuizGrade::Excellent,
            f if f >= 0.7 => QuizGrade::Good,
            f if f >= 0.5 => QuizGrade::Fair,
            _ => QuizGrade::TryAgain,
        }
    }

    /// One to five stars.
    #[must_use]
    pub fn stars(&self) -> u8 {
        match self.fraction() {
            f if f >= 0.9 => 5,
            f if f >= 0.7 => 4,
            f if f >= 0.5 => 3,
            f if f >= 0.3 => 2,
            _ => 1,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds_per_question(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.elapsed_secs) / self.total as f64
        }
    }
}
