use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;

use crate::model::ids::KanjiId;

//
// ─── MASTERY ───────────────────────────────────────────────────────────────────
//

/// Qualitative label for the overall learned fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MasteryLabel {
    Beginner,
    Apprentice,
    Adept,
    Master,
    Sensei,
}

impl MasteryLabel {
    /// Map a learned fraction onto the five tiers.
    ///
    /// Only an exact `1.0` reaches `Sensei`; anything outside `[0, 1]` is
    /// treated as `Beginner`.
    #[must_use]
    pub fn from_fraction(fraction: f64) -> Self {
        match fraction {
            f if (0.0..0.25).contains(&f) => Self::Beginner,
            f if (0.25..0.5).contains(&f) => Self::Apprentice,
            f if (0.5..0.75).contains(&f) => Self::Adept,
            f if (0.75..1.0).contains(&f) => Self::Master,
            f if f == 1.0 => Self::Sensei,
            _ => Self::Beginner,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Apprentice => "Apprentice",
            Self::Adept => "Adept",
            Self::Master => "Master",
            Self::Sensei => "Sensei",
        }
    }
}

impl fmt::Display for MasteryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `part / whole`, or `0.0` when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fraction_of(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

//
// ─── PROGRESS STATE ────────────────────────────────────────────────────────────
//

/// Durable per-user study progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    learned: HashSet<KanjiId>,
    practice_streak: u32,
    total_practice_minutes: u32,
    last_practice_day: Option<NaiveDate>,
}

impl ProgressState {
    /// Rehydrate progress from persisted values.
    #[must_use]
    pub fn from_persisted(
        learned: HashSet<KanjiId>,
        practice_streak: u32,
        total_practice_minutes: u32,
        last_practice_day: Option<NaiveDate>,
    ) -> Self {
        Self {
            learned,
            practice_streak,
            total_practice_minutes,
            last_practice_day,
        }
    }

    #[must_use]
    pub fn learned(&self) -> &HashSet<KanjiId> {
        &self.learned
    }

    #[must_use]
    pub fn is_learned(&self, id: KanjiId) -> bool {
        self.learned.contains(&id)
    }

    #[must_use]
    pub fn learned_count(&self) -> usize {
        self.learned.len()
    }

    #[must_use]
    pub fn practice_streak(&self) -> u32 {
        self.practice_streak
    }

    #[must_use]
    pub fn total_practice_minutes(&self) -> u32 {
        self.total_practice_minutes
    }

    #[must_use]
    pub fn last_practice_day(&self) -> Option<NaiveDate> {
        self.last_practice_day
    }

    /// Returns true if the id was not learned before.
    pub fn mark_learned(&mut self, id: KanjiId) -> bool {
        self.learned.insert(id)
    }

    /// Returns true if the id was learned before.
    pub fn mark_unlearned(&mut self, id: KanjiId) -> bool {
        self.learned.remove(&id)
    }

    pub fn add_practice_minutes(&mut self, minutes: u32) {
        self.total_practice_minutes = self.total_practice_minutes.saturating_add(minutes);
    }

    /// Update the streak for a practice on `today`.
    ///
    /// Returns true if the streak or the last practice day changed.
    pub fn record_practice_day(&mut self, today: NaiveDate) -> bool {
        let next_streak = match self.last_practice_day {
            Some(last) if last == today => return false,
            Some(last) if last.succ_opt() == Some(today) => self.practice_streak.saturating_add(1),
            _ => 1,
        };
        self.practice_streak = next_streak;
        self.last_practice_day = Some(today);
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
