use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kanji_core::model::{
    JlptLevel, KanjiRecord, QUESTION_COUNT_CHOICES, QuizDifficulty, QuizMode, QuizRules,
    QuizSettings,
};
use services::{AppServices, Clock, FlashcardFilter, QuizLoopService, STREAK_GOAL_DAYS};
use tracing_subscriber::EnvFilter;

mod interactive;

const DEFAULT_DB_URL: &str = "sqlite://kanji.sqlite3";

#[derive(Debug)]
enum CliError {
    InvalidDbUrl { raw: String },
    UnknownKanji { symbol: String },
    ResetNotConfirmed,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            CliError::UnknownKanji { symbol } => write!(f, "no kanji {symbol} in the catalog"),
            CliError::ResetNotConfirmed => {
                write!(f, "reset erases all progress; pass --yes to confirm")
            }
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Parser)]
#[command(name = "kanji")]
#[command(about = "Study kanji with flashcards, quizzes and a review list", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite database holding study progress
    #[arg(long, env = "KANJI_DB_URL", default_value = DEFAULT_DB_URL, global = true)]
    db: String,

    /// JSON catalog to study instead of the built-in N5 list
    #[arg(long, env = "KANJI_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show learned counts, mastery and streak (default)
    Stats,
    /// List catalog entries
    List {
        /// Only show one JLPT level (N5..N1)
        #[arg(long)]
        level: Option<JlptLevel>,
    },
    /// List learned kanji
    Review,
    /// Mark a kanji as learned
    Learn { symbol: String },
    /// Mark a kanji as not learned
    Unlearn { symbol: String },
    /// Forget all progress
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Walk through flashcards
    Flashcards {
        /// Include kanji that are already learned
        #[arg(long)]
        all: bool,
    },
    /// Take a timed multiple-choice quiz
    Quiz {
        /// meaning, reading or mixed
        #[arg(long, default_value = "meaning")]
        mode: QuizMode,
        /// easy, medium or hard
        #[arg(long, default_value = "easy")]
        difficulty: QuizDifficulty,
        /// Number of questions (5, 10, 15 or 20)
        #[arg(long, default_value_t = QUESTION_COUNT_CHOICES[0], value_parser = parse_count)]
        count: usize,
        /// Time budget in seconds
        #[arg(long)]
        seconds: Option<u32>,
    },
}

fn parse_count(raw: &str) -> Result<usize, String> {
    let count: usize = raw.trim().parse().map_err(|_| format!("not a number: {raw}"))?;
    if QUESTION_COUNT_CHOICES.contains(&count) {
        Ok(count)
    } else {
        Err(format!("count must be one of {QUESTION_COUNT_CHOICES:?}"))
    }
}

fn normalize_sqlite_url(raw: &str) -> Result<String, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidDbUrl {
            raw: raw.to_string(),
        });
    }
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_string());
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| CliError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(CliError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn find_kanji(services: &AppServices, symbol: &str) -> Result<KanjiRecord, CliError> {
    services
        .catalog()
        .find_by_symbol(symbol)
        .cloned()
        .ok_or_else(|| CliError::UnknownKanji {
            symbol: symbol.to_string(),
        })
}

fn print_record(record: &KanjiRecord, learned: bool) {
    let mark = if learned { "✓" } else { " " };
    let level = record.level().map_or("--", JlptLevel::as_str);
    println!(
        "[{mark}] {}  {level}  {} ({})  {} strokes, {}",
        record.symbol(),
        record.meaning(),
        record.display_reading(),
        record.stroke_count(),
        record.stroke_difficulty().label()
    );
}

fn print_stats(services: &AppServices) {
    let overview = services.overview();
    println!(
        "Learned {}/{} kanji ({}%), mastery: {}",
        overview.learned,
        overview.total,
        overview.percent(),
        overview.mastery
    );
    println!(
        "Practice streak: {} day(s) ({:.0}% of a {}-day goal), total practice: {} min",
        overview.practice_streak,
        overview.streak_goal_fraction() * 100.0,
        STREAK_GOAL_DAYS,
        overview.total_practice_minutes
    );
    println!("Ready for review: {}", overview.review_count);
    for row in overview.populated_levels() {
        println!(
            "  {}: {}/{} ({:.0}%)",
            row.level,
            row.learned,
            row.total,
            row.fraction * 100.0
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let catalog_json = match &cli.catalog {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let catalog = AppServices::catalog_from_source(catalog_json.as_deref())?;

    let db_url = normalize_sqlite_url(&cli.db)?;
    prepare_sqlite_file(&db_url)?;
    tracing::info!(db = %db_url, catalog = catalog.len(), "opening study data");
    let services = AppServices::new_sqlite(&db_url, catalog, Clock::default()).await?;
    let progress = services.progress();

    match cli.command.unwrap_or(Command::Stats) {
        Command::Stats => print_stats(&services),
        Command::List { level } => {
            let catalog = services.catalog();
            let records: Vec<&KanjiRecord> = match level {
                Some(level) => catalog.by_level(level),
                None => catalog.iter().collect(),
            };
            for record in records {
                print_record(record, progress.is_learned(record.id()));
            }
        }
        Command::Review => {
            let review = progress.kanji_for_review();
            if review.is_empty() {
                println!("Nothing to review yet. Learn some kanji first.");
            }
            for record in &review {
                print_record(record, true);
            }
        }
        Command::Learn { symbol } => {
            let record = find_kanji(&services, &symbol)?;
            if progress.mark_learned(record.id()).await {
                println!("Marked {} as learned.", record.symbol());
            } else {
                println!("{} is already learned.", record.symbol());
            }
        }
        Command::Unlearn { symbol } => {
            let record = find_kanji(&services, &symbol)?;
            if progress.mark_unlearned(record.id()).await {
                println!("Marked {} as not learned.", record.symbol());
            } else {
                println!("{} was not learned.", record.symbol());
            }
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(CliError::ResetNotConfirmed.into());
            }
            progress.reset_progress().await;
            println!("Progress reset.");
        }
        Command::Flashcards { all } => {
            let filter = if all {
                FlashcardFilter::All
            } else {
                FlashcardFilter::Unlearned
            };
            interactive::flashcards(services.flashcards(filter)).await?;
        }
        Command::Quiz {
            mode,
            difficulty,
            count,
            seconds,
        } => {
            let rules = seconds.map_or_else(QuizRules::default, |secs| {
                QuizRules::default().with_time_budget(secs)
            });
            let quiz = Arc::new(QuizLoopService::new(Arc::clone(&progress)).with_rules(rules));
            let settings = QuizSettings::new(mode, difficulty, count);
            interactive::quiz(quiz, settings).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_absolute_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:").unwrap(), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/kanji.sqlite3").unwrap(),
            "sqlite:///tmp/kanji.sqlite3"
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/kanji.sqlite3").unwrap();
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/kanji.sqlite3"));
    }

    #[test]
    fn blank_url_is_rejected() {
        assert!(matches!(
            normalize_sqlite_url("  "),
            Err(CliError::InvalidDbUrl { .. })
        ));
    }

    #[test]
    fn count_must_be_a_setup_choice() {
        assert_eq!(parse_count("10"), Ok(10));
        assert!(parse_count("7").is_err());
        assert!(parse_count("ten").is_err());
    }

    #[test]
    fn cli_parses_quiz_options() {
        let cli = Cli::try_parse_from([
            "kanji", "quiz", "--mode", "mixed", "--difficulty", "hard", "--count", "15",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Quiz {
                mode,
                difficulty,
                count,
                seconds,
            }) => {
                assert_eq!(mode, QuizMode::Mixed);
                assert_eq!(difficulty, QuizDifficulty::Hard);
                assert_eq!(count, 15);
                assert_eq!(seconds, None);
            }
            _ => panic!("expected quiz command"),
        }
    }
}
