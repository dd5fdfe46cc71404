mod catalog;
mod ids;
mod kanji;
mod progress;
mod quiz;
mod result;

pub use ids::{KanjiId, ParseIdError};

pub use catalog::{Catalog, CatalogError};
pub use kanji::{JlptLevel, KanjiDraft, KanjiError, KanjiRecord, StrokeDifficulty};
pub use progress::{MasteryLabel, ProgressState, fraction_of};
pub use quiz::{
    QUESTION_COUNT_CHOICES, QuestionType, QuizDifficulty, QuizMode, QuizQuestion, QuizRules,
    QuizSettings, QuizSettingsError,
};
pub use result::{CompletionReason, QuizGrade, QuizResult};
