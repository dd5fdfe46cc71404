use kanji_core::model::{CompletionReason, QuizQuestion, QuizResult, QuizRules, QuizSettings};

use crate::error::QuizError;

//
// ─── PHASE / OUTCOMES ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    InProgress,
    Completed,
}

/// The graded answer shown until the quiz moves to the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReveal {
    pub selected: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Emitted once when a started quiz completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizCompletion {
    pub result: QuizResult,
    pub reason: CompletionReason,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timed multiple-choice quiz state machine.
///
/// Pure state: no I/O and no timers. Callers feed it ticks, answers and
/// advances and react to the returned completion.
#[derive(Debug, Clone)]
pub struct QuizSession {
    settings: QuizSettings,
    rules: QuizRules,
    questions: Vec<QuizQuestion>,
    current: usize,
    score: usize,
    remaining_secs: u32,
    phase: QuizPhase,
    reveal: Option<AnswerReveal>,
    completion: Option<QuizCompletion>,
}

impl QuizSession {
    #[must_use]
    pub fn new(settings: QuizSettings, rules: QuizRules) -> Self {
        Self {
            settings,
            rules,
            questions: Vec::new(),
            current: 0,
            score: 0,
            remaining_secs: rules.time_budget_secs,
            phase: QuizPhase::Idle,
            reveal: None,
            completion: None,
        }
    }

    /// Begin (or begin again) with a fresh question list.
    ///
    /// An empty list completes immediately and returns the completion.
    pub fn start(&mut self, questions: Vec<QuizQuestion>) -> Option<QuizCompletion> {
        self.questions = questions;
        self.current = 0;
        self.score = 0;
        self.remaining_secs = self.rules.time_budget_secs;
        self.reveal = None;
        self.completion = None;
        self.phase = QuizPhase::InProgress;

        if self.questions.is_empty() {
            return self.complete(CompletionReason::Empty);
        }
        None
    }

    /// One second of the countdown. Returns the completion when time runs out.
    pub fn tick(&mut self) -> Option<QuizCompletion> {
        if self.phase != QuizPhase::InProgress {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.complete(CompletionReason::TimeUp);
        }
        None
    }

    /// Grade `selected` against the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` outside a running quiz and
    /// `QuizError::AnswerPending` if the current question was already answered.
    pub fn submit_answer(&mut self, selected: &str) -> Result<&AnswerReveal, QuizError> {
        if self.phase != QuizPhase::InProgress {
            return Err(QuizError::NotInProgress);
        }
        if self.reveal.is_some() {
            return Err(QuizError::AnswerPending);
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(QuizError::NotInProgress)?;

        let is_correct = question.is_correct(selected);
        if is_correct {
            self.score += 1;
        }
        Ok(self.reveal.insert(AnswerReveal {
            selected: selected.to_string(),
            correct_answer: question.correct_answer.clone(),
            is_correct,
        }))
    }

    /// Move past the answered question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` outside a running quiz and
    /// `QuizError::NoPendingAnswer` if the current question has not been answered.
    pub fn advance(&mut self) -> Result<Option<QuizCompletion>, QuizError> {
        if self.phase != QuizPhase::InProgress {
            return Err(QuizError::NotInProgress);
        }
        if self.reveal.is_none() {
            return Err(QuizError::NoPendingAnswer);
        }

        self.current += 1;
        if self.current >= self.questions.len() {
            return Ok(self.complete(CompletionReason::AllAnswered));
        }
        self.reveal = None;
        Ok(None)
    }

    fn complete(&mut self, reason: CompletionReason) -> Option<QuizCompletion> {
        if self.phase != QuizPhase::InProgress {
            return None;
        }
        self.phase = QuizPhase::Completed;
        let completion = QuizCompletion {
            result: QuizResult::new(self.score, self.questions.len(), self.elapsed_secs()),
            reason,
        };
        self.completion = Some(completion);
        Some(completion)
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn rules(&self) -> &QuizRules {
        &self.rules
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Zero-based cursor; equals `question_count()` once every question is answered.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question on screen, if the quiz is running.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.phase == QuizPhase::InProgress {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.rules.time_budget_secs.saturating_sub(self.remaining_secs)
    }

    #[must_use]
    pub fn reveal(&self) -> Option<&AnswerReveal> {
        self.reveal.as_ref()
    }

    #[must_use]
    pub fn completion(&self) -> Option<&QuizCompletion> {
        self.completion.as_ref()
    }
}
