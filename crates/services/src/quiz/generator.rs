use std::sync::Arc;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use kanji_core::model::{
    Catalog, KanjiRecord, QuestionType, QuizDifficulty, QuizMode, QuizQuestion, QuizSettings,
};

/// Wrong options drawn per question, at most.
pub const MAX_DISTRACTORS: usize = 3;

/// Builds multiple-choice questions over a shared catalog.
#[derive(Debug, Clone)]
pub struct QuizGenerator {
    catalog: Arc<Catalog>,
}

impl QuizGenerator {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Records eligible for a difficulty tier.
    ///
    /// Falls back to the whole catalog when no record matches the tier.
    #[must_use]
    pub fn candidates(&self, difficulty: QuizDifficulty) -> Vec<&KanjiRecord> {
        let filtered = self.catalog.in_levels(difficulty.levels());
        if filtered.is_empty() {
            self.catalog.iter().collect()
        } else {
            filtered
        }
    }

    /// Generate up to `settings.question_count` questions.
    ///
    /// The count is bounded by the candidate pool size. Kanji are drawn with
    /// replacement, so one kanji may be asked about more than once.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        settings: &QuizSettings,
        rng: &mut R,
    ) -> Vec<QuizQuestion> {
        let pool = self.candidates(settings.difficulty);
        let count = settings.question_count.min(pool.len());

        let mut questions = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(&target) = pool.choose(rng) else {
                break;
            };
            questions.push(build_question(target, &pool, settings.mode, rng));
        }
        questions
    }
}

fn build_question<R: Rng + ?Sized>(
    target: &KanjiRecord,
    pool: &[&KanjiRecord],
    mode: QuizMode,
    rng: &mut R,
) -> QuizQuestion {
    let others: Vec<&KanjiRecord> = pool
        .iter()
        .copied()
        .filter(|record| record.id() != target.id())
        .collect();
    let distractors: Vec<&KanjiRecord> = others
        .choose_multiple(rng, MAX_DISTRACTORS)
        .copied()
        .collect();

    let question_type = match mode {
        QuizMode::Meaning => QuestionType::Meaning,
        QuizMode::Reading => QuestionType::Reading,
        QuizMode::Mixed => {
            if rng.random_bool(0.5) {
                QuestionType::Meaning
            } else {
                QuestionType::Reading
            }
        }
    };

    let (subject, correct_answer) = match question_type {
        QuestionType::Meaning => (target.symbol(), target.meaning()),
        QuestionType::Reading => (target.meaning(), target.display_reading()),
    };

    let mut options = Vec::with_capacity(distractors.len() + 1);
    options.push(correct_answer.to_string());
    options.extend(
        distractors
            .iter()
            .map(|record| answer_text(record, question_type).to_string()),
    );
    options.shuffle(rng);

    QuizQuestion {
        kanji_id: target.id(),
        question_type,
        prompt: question_type.prompt().to_string(),
        subject: subject.to_string(),
        correct_answer: correct_answer.to_string(),
        options,
    }
}

fn answer_text(record: &KanjiRecord, question_type: QuestionType) -> &str {
    match question_type {
        QuestionType::Meaning => record.meaning(),
        QuestionType::Reading => record.display_reading(),
    }
}
