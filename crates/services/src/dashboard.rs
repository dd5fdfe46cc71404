use kanji_core::model::{JlptLevel, MasteryLabel, fraction_of};

use crate::progress_service::ProgressService;

/// Days of practice the streak bar fills up to.
pub const STREAK_GOAL_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: JlptLevel,
    pub learned: usize,
    pub total: usize,
    pub fraction: f64,
}

/// Read-only numbers for the home and progress screens.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressOverview {
    pub learned: usize,
    pub total: usize,
    pub fraction: f64,
    pub mastery: MasteryLabel,
    pub practice_streak: u32,
    pub total_practice_minutes: u32,
    pub review_count: usize,
    pub levels: Vec<LevelProgress>,
}

impl ProgressOverview {
    #[must_use]
    pub fn collect(progress: &ProgressService) -> Self {
        let total = progress.catalog_size();
        let learned = progress.learned_count().min(total);
        let levels = JlptLevel::ALL
            .iter()
            .map(|&level| {
                let (learned, total) = progress.level_counts(level);
                LevelProgress {
                    level,
                    learned,
                    total,
                    fraction: fraction_of(learned, total),
                }
            })
            .collect();

        Self {
            learned,
            total,
            fraction: fraction_of(learned, total),
            mastery: progress.mastery_label(),
            practice_streak: progress.practice_streak(),
            total_practice_minutes: progress.total_practice_minutes(),
            review_count: progress.review_count(),
            levels,
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u32 {
        (self.fraction * 100.0).floor() as u32
    }

    /// Streak progress toward [`STREAK_GOAL_DAYS`], capped at 1.
    #[must_use]
    pub fn streak_goal_fraction(&self) -> f64 {
        (f64::from(self.practice_streak) / f64::from(STREAK_GOAL_DAYS)).min(1.0)
    }

    /// Levels that have at least one record in the catalog.
    pub fn populated_levels(&self) -> impl Iterator<Item = &LevelProgress> {
        self.levels.iter().filter(|row| row.total > 0)
    }
}
