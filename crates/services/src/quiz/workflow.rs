use std::sync::Arc;

use tracing::{debug, info};

use kanji_core::model::{QuizQuestion, QuizRules, QuizSettings};

use super::generator::QuizGenerator;
use super::session::{AnswerReveal, QuizCompletion, QuizSession};
use crate::error::QuizError;
use crate::progress_service::ProgressService;

/// Orchestrates quiz sessions against the shared progress store.
///
/// Correct answers mark the kanji learned; every completion credits
/// practice time and counts the day toward the streak, once.
#[derive(Clone)]
pub struct QuizLoopService {
    generator: QuizGenerator,
    progress: Arc<ProgressService>,
    rules: QuizRules,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(progress: Arc<ProgressService>) -> Self {
        Self {
            generator: QuizGenerator::new(Arc::clone(progress.catalog())),
            progress,
            rules: QuizRules::default(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: QuizRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn rules(&self) -> QuizRules {
        self.rules
    }

    #[must_use]
    pub fn generator(&self) -> &QuizGenerator {
        &self.generator
    }

    #[must_use]
    pub fn progress(&self) -> &Arc<ProgressService> {
        &self.progress
    }

    /// An idle session carrying these settings and the service rules.
    #[must_use]
    pub fn new_session(&self, settings: QuizSettings) -> QuizSession {
        QuizSession::new(settings, self.rules)
    }

    /// Generate questions for the session settings and start it.
    pub async fn start(&self, session: &mut QuizSession) -> Option<QuizCompletion> {
        let questions = self
            .generator
            .generate(session.settings(), &mut rand::rng());
        self.start_with(session, questions).await
    }

    /// Start the session with a prepared question list.
    pub async fn start_with(
        &self,
        session: &mut QuizSession,
        questions: Vec<QuizQuestion>,
    ) -> Option<QuizCompletion> {
        let settings = session.settings();
        info!(
            mode = ?settings.mode,
            difficulty = ?settings.difficulty,
            requested = settings.question_count,
            generated = questions.len(),
            "quiz started"
        );
        let completion = session.start(questions);
        self.finish(completion).await
    }

    /// Regenerate questions with the same settings and start over.
    pub async fn restart(&self, session: &mut QuizSession) -> Option<QuizCompletion> {
        self.start(session).await
    }

    /// Grade an answer; a correct one marks the kanji learned.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the session does not accept an answer right now.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        selected: &str,
    ) -> Result<AnswerReveal, QuizError> {
        let kanji_id = session
            .current_question()
            .map(|question| question.kanji_id)
            .ok_or(QuizError::NotInProgress)?;
        let reveal = session.submit_answer(selected)?.clone();
        debug!(%kanji_id, correct = reveal.is_correct, "answer graded");

        if reveal.is_correct {
            self.progress.mark_learned(kanji_id).await;
        }
        Ok(reveal)
    }

    /// Move past the answered question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if no answer is pending.
    pub async fn advance(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<QuizCompletion>, QuizError> {
        let completion = session.advance()?;
        Ok(self.finish(completion).await)
    }

    /// One second of the countdown.
    pub async fn tick(&self, session: &mut QuizSession) -> Option<QuizCompletion> {
        let completion = session.tick();
        if completion.is_some() {
            debug!("quiz timer reached zero");
        }
        self.finish(completion).await
    }

    async fn finish(&self, completion: Option<QuizCompletion>) -> Option<QuizCompletion> {
        let completion = completion?;
        info!(
            score = completion.result.score(),
            total = completion.result.total(),
            reason = ?completion.reason,
            "quiz completed"
        );
        self.progress
            .add_practice_minutes(self.rules.practice_credit_minutes)
            .await;
        self.progress.record_practice_day().await;
        Some(completion)
    }
}
