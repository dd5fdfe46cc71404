mod generator;
mod runner;
mod session;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use generator::{MAX_DISTRACTORS, QuizGenerator};
pub use runner::{QuizCommand, QuizRunner, QuizRunnerHandle, QuizSnapshot};
pub use session::{AnswerReveal, QuizCompletion, QuizPhase, QuizSession};
pub use workflow::QuizLoopService;
