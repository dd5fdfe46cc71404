use std::io;
use std::sync::Arc;

use kanji_core::model::{CompletionReason, QuizSettings};
use services::{
    FlashcardDeck, QuizCommand, QuizCompletion, QuizError, QuizLoopService, QuizPhase, QuizRunner,
    QuizSnapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

//
// ─── FLASHCARDS ────────────────────────────────────────────────────────────────
//

fn show_card(deck: &FlashcardDeck) {
    let Some(card) = deck.current() else {
        return;
    };
    println!();
    println!("[{}/{}]  {}", deck.position(), deck.len(), card.symbol());
    if deck.is_revealed() {
        println!("  meaning: {}", card.meaning());
        println!("  reading: {}", card.display_reading());
        for example in card.examples() {
            println!("  - {example}");
        }
    }
}

pub async fn flashcards(mut deck: FlashcardDeck) -> io::Result<()> {
    if deck.is_empty() {
        println!("No cards to study.");
        return Ok(());
    }
    println!("Enter = flip, n = next, p = previous, l = learned, q = quit");
    show_card(&deck);

    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" | "f" => deck.reveal(),
            "n" => deck.next(),
            "p" => deck.previous(),
            "l" => {
                deck.mark_current_learned().await;
            }
            "q" => break,
            other => {
                println!("unknown input: {other}");
                continue;
            }
        }
        if deck.is_empty() {
            println!("Every card in this deck is learned.");
            break;
        }
        show_card(&deck);
    }
    Ok(())
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Tracks what has been printed so each screen shows up once.
#[derive(Default)]
struct QuizView {
    shown: Option<(usize, bool)>,
    rejected: Option<QuizError>,
    finished: bool,
}

impl QuizView {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn render(&mut self, snapshot: &QuizSnapshot) {
        if snapshot.rejected != self.rejected {
            self.rejected = snapshot.rejected;
            if let Some(err) = snapshot.rejected {
                println!("  ({err})");
            }
        }

        match snapshot.phase {
            QuizPhase::Idle => {}
            QuizPhase::InProgress => {
                let key = (snapshot.index, snapshot.reveal.is_some());
                if self.shown == Some(key) {
                    return;
                }
                self.shown = Some(key);
                self.finished = false;
                match (&snapshot.reveal, &snapshot.question) {
                    (Some(reveal), _) if reveal.is_correct => println!("  Correct!"),
                    (Some(reveal), _) => println!("  Wrong. Answer: {}", reveal.correct_answer),
                    (None, Some(question)) => {
                        println!();
                        println!(
                            "Question {}/{}  ({}s left)",
                            snapshot.index + 1,
                            snapshot.total,
                            snapshot.remaining_secs
                        );
                        println!("{}  {}", question.subject, question.prompt);
                        for (i, option) in question.options.iter().enumerate() {
                            println!("  {}. {option}", i + 1);
                        }
                    }
                    (None, None) => {}
                }
            }
            QuizPhase::Completed => {
                if self.finished {
                    return;
                }
                self.finished = true;
                self.shown = None;
                if let Some(completion) = snapshot.completion {
                    print_completion(&completion);
                }
            }
        }
    }
}

fn print_completion(completion: &QuizCompletion) {
    let result = completion.result;
    println!();
    match completion.reason {
        CompletionReason::TimeUp => println!("Time's up!"),
        CompletionReason::Empty => println!("No kanji available for this quiz."),
        CompletionReason::AllAnswered => {}
    }
    let stars = usize::from(result.stars());
    println!(
        "{}  {}/{} ({}%)  {}{}",
        result.grade(),
        result.score(),
        result.total(),
        result.percent(),
        "★".repeat(stars),
        "☆".repeat(5 - stars)
    );
    println!(
        "{}s total, {:.1}s per question",
        result.elapsed_secs(),
        result.seconds_per_question()
    );
    println!("r = try again, q = quit");
}

enum QuizInput {
    Send(QuizCommand),
    Quit,
}

fn parse_quiz_input(line: &str, snapshot: &QuizSnapshot) -> QuizInput {
    match line.trim() {
        "q" => QuizInput::Quit,
        "n" => QuizInput::Send(QuizCommand::Advance),
        "r" => QuizInput::Send(QuizCommand::Restart),
        other => {
            let by_number = other
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| snapshot.question.as_ref()?.options.get(i).cloned());
            QuizInput::Send(QuizCommand::Answer(
                by_number.unwrap_or_else(|| other.to_string()),
            ))
        }
    }
}

pub async fn quiz(quiz: Arc<QuizLoopService>, settings: QuizSettings) -> io::Result<()> {
    let handle = QuizRunner::spawn(Arc::clone(&quiz), quiz.new_session(settings));
    let mut snapshots = handle.subscribe();
    let mut current = handle.snapshot();
    let mut view = QuizView::default();
    let mut lines = BufReader::new(stdin()).lines();
    println!("Answer with an option number or its text. n = next, r = restart, q = quit");

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                current = snapshots.borrow_and_update().clone();
                view.render(&current);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_quiz_input(&line, &current) {
                    QuizInput::Quit => break,
                    QuizInput::Send(command) => {
                        if command == QuizCommand::Restart {
                            view.reset();
                        }
                        if !handle.send(command).await {
                            break;
                        }
                    }
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}
