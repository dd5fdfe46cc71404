#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod flashcards;
pub mod progress_service;
pub mod quiz;

pub use kanji_core::Clock;

pub use app_services::AppServices;
pub use dashboard::{LevelProgress, ProgressOverview, STREAK_GOAL_DAYS};
pub use error::{AppServicesError, ProgressError, QuizError};
pub use flashcards::{FlashcardDeck, FlashcardFilter};
pub use progress_service::ProgressService;
pub use quiz::{
    AnswerReveal, QuizCommand, QuizCompletion, QuizGenerator, QuizLoopService, QuizPhase,
    QuizRunner, QuizRunnerHandle, QuizSession, QuizSnapshot,
};
