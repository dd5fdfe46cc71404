use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior, Sleep};
use tracing::debug;

use kanji_core::model::QuizQuestion;

use super::session::{AnswerReveal, QuizCompletion, QuizPhase, QuizSession};
use super::workflow::QuizLoopService;
use crate::error::QuizError;

const TICK_PERIOD: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 16;

/// User intents forwarded to a running quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizCommand {
    Answer(String),
    Advance,
    Restart,
    Stop,
}

/// What a view needs to render the quiz at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSnapshot {
    pub phase: QuizPhase,
    pub question: Option<QuizQuestion>,
    pub index: usize,
    pub total: usize,
    pub score: usize,
    pub remaining_secs: u32,
    pub reveal: Option<AnswerReveal>,
    pub completion: Option<QuizCompletion>,
    /// Why the last command or auto-advance was rejected. Kept until the next command arrives.
    pub rejected: Option<QuizError>,
}

impl QuizSnapshot {
    fn of(session: &QuizSession, rejected: Option<QuizError>) -> Self {
        Self {
            phase: session.phase(),
            question: session.current_question().cloned(),
            index: session.current_index(),
            total: session.question_count(),
            score: session.score(),
            remaining_secs: session.remaining_secs(),
            reveal: session.reveal().cloned(),
            completion: session.completion().copied(),
            rejected,
        }
    }
}

/// Drives a quiz session on its own task.
///
/// Timer ticks, commands and the delayed auto-advance are handled one at a
/// time, so they never interleave on the session.
pub struct QuizRunner;

impl QuizRunner {
    /// Spawn the runner task. An idle session is started first.
    #[must_use]
    pub fn spawn(service: Arc<QuizLoopService>, session: QuizSession) -> QuizRunnerHandle {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots, snapshot_rx) = watch::channel(QuizSnapshot::of(&session, None));
        let task = tokio::spawn(run(service, session, command_rx, snapshots));

        QuizRunnerHandle {
            commands,
            snapshots: snapshot_rx,
            task: Some(task),
        }
    }
}

/// Owner of a running quiz. Dropping it aborts the task.
pub struct QuizRunnerHandle {
    commands: mpsc::Sender<QuizCommand>,
    snapshots: watch::Receiver<QuizSnapshot>,
    task: Option<JoinHandle<QuizSession>>,
}

impl QuizRunnerHandle {
    /// Forward a command. Returns false if the runner has already stopped.
    pub async fn send(&self, command: QuizCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn answer(&self, selected: impl Into<String>) -> bool {
        self.send(QuizCommand::Answer(selected.into())).await
    }

    pub async fn advance(&self) -> bool {
        self.send(QuizCommand::Advance).await
    }

    pub async fn restart(&self) -> bool {
        self.send(QuizCommand::Restart).await
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QuizSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the runner and hand back the session.
    ///
    /// Returns `None` if the task panicked or was already gone.
    pub async fn stop(mut self) -> Option<QuizSession> {
        let _ = self.commands.send(QuizCommand::Stop).await;
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Drop for QuizRunnerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    service: Arc<QuizLoopService>,
    mut session: QuizSession,
    mut commands: mpsc::Receiver<QuizCommand>,
    snapshots: watch::Sender<QuizSnapshot>,
) -> QuizSession {
    if session.phase() == QuizPhase::Idle {
        service.start(&mut session).await;
    }
    snapshots.send_replace(QuizSnapshot::of(&session, None));

    let reveal_delay = session.rules().reveal_delay;
    let mut ticker = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut auto_advance: Option<Pin<Box<Sleep>>> = None;

    let mut rejected = None;
    loop {
        tokio::select! {
            command = commands.recv() => {
                rejected = None;
                match command {
                    None | Some(QuizCommand::Stop) => break,
                    Some(QuizCommand::Answer(selected)) => {
                        match service.submit_answer(&mut session, &selected).await {
                            Ok(_) => auto_advance = Some(Box::pin(time::sleep(reveal_delay))),
                            Err(err) => rejected = Some(err),
                        }
                    }
                    Some(QuizCommand::Advance) => {
                        auto_advance = None;
                        if let Err(err) = service.advance(&mut session).await {
                            rejected = Some(err);
                        }
                    }
                    Some(QuizCommand::Restart) => {
                        auto_advance = None;
                        service.restart(&mut session).await;
                        ticker.reset();
                    }
                }
            }
            _ = ticker.tick(), if session.phase() == QuizPhase::InProgress => {
                service.tick(&mut session).await;
            }
            () = reveal_elapsed(&mut auto_advance) => {
                auto_advance = None;
                debug!("auto-advancing after reveal");
                if let Err(err) = service.advance(&mut session).await {
                    rejected = Some(err);
                }
            }
        }

        if session.is_completed() {
            auto_advance = None;
        }
        snapshots.send_replace(QuizSnapshot::of(&session, rejected));
    }

    session
}

/// Resolves when the armed auto-advance elapses; never resolves when disarmed.
async fn reveal_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending::<()>().await,
    }
}
