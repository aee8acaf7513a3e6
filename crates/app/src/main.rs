use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use quiz_core::model::{QuizId, UserId};
use services::{AppServices, AuthProvider, Clock, StaticIdentity};
use storage::sqlite::SqliteRepository;
use thiserror::Error;

mod config;
mod seed;
mod telemetry;

use config::{AppConfig, Overrides};

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid database url: {raw}")]
    InvalidDbUrl { raw: String },
    #[error("no user configured; pass --user or set QUIZ_USER")]
    MissingUser,
    #[error("invalid user id: {raw}")]
    InvalidUser { raw: String },
}

#[derive(Parser, Debug)]
#[command(name = "quiz", version, about = "Take quizzes and track your points")]
struct Cli {
    /// TOML config file
    #[arg(long, env = "QUIZ_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database url or path
    #[arg(long = "db", env = "QUIZ_DB_URL", global = true)]
    db_url: Option<String>,

    /// Signed-in user id
    #[arg(long, env = "QUIZ_USER", global = true)]
    user: Option<String>,

    /// Refuse to submit while questions are unanswered
    #[arg(long, global = true)]
    require_all_answered: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the demo quizzes
    Seed,
    /// List available quizzes
    Quizzes {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Take a quiz and submit the answers
    Take {
        quiz_id: QuizId,
        /// Answer for a question, as INDEX=VALUE (zero-based index)
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(usize, String)>,
    },
    /// Show points, history, and recent results
    Profile {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

fn parse_answer(raw: &str) -> Result<(usize, String), String> {
    let (index, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=VALUE, got {raw:?}"))?;
    let index = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid question index: {index:?}"))?;
    Ok((index, value.to_string()))
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

fn identity(cfg: &AppConfig) -> Result<StaticIdentity, CliError> {
    match cfg.user.as_deref() {
        None => Ok(StaticIdentity::anonymous()),
        Some(raw) => raw
            .parse::<UserId>()
            .map(StaticIdentity::signed_in)
            .map_err(|_| CliError::InvalidUser {
                raw: raw.to_string(),
            }),
    }
}

async fn take_quiz(
    app: &AppServices,
    quiz_id: &QuizId,
    answers: Vec<(usize, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = app.sessions();
    let mut session = sessions.start(quiz_id).await?;
    let mut pending: BTreeMap<usize, String> = answers.into_iter().collect();

    println!("{}", session.quiz().topic());
    loop {
        let progress = session.progress();
        if let Some(question) = session.current_question() {
            println!();
            println!(
                "Question {} of {}: {}",
                progress.index + 1,
                progress.total,
                question.prompt()
            );
            for option in question.options() {
                println!("  - {option}");
            }
        }
        if let Some(value) = pending.remove(&progress.index) {
            session.answer_current(value)?;
        }
        match session.selected_answer() {
            Some(answer) => println!("Answer: {answer}"),
            None => println!("Answer: (none)"),
        }
        if !session.go_next()? {
            break;
        }
    }

    // Anything left names a question the quiz does not have.
    for (index, value) in pending {
        session.record_answer(index, value)?;
    }

    let outcome = sessions.submit(&mut session).await?;
    println!();
    println!("Score: {} / {}", outcome.score, outcome.total_points);
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    telemetry::init_tracing();

    let cfg = AppConfig::load(cli.config.as_deref())?.with_overrides(Overrides {
        database_url: cli.db_url,
        user: cli.user,
        require_all_answered: cli.require_all_answered,
    });
    let db_url = normalize_sqlite_url(cfg.database_url.clone());

    // Open + migrate SQLite in the binary glue so services stay storage-agnostic.
    prepare_sqlite_file(&db_url)?;

    if let Command::Seed = cli.command {
        let repo = SqliteRepository::connect(&db_url).await?;
        repo.migrate().await?;
        let summary = seed::seed_demo_content(&repo).await?;
        println!(
            "Seeded {} quizzes and {} questions into {db_url}",
            summary.quizzes, summary.questions
        );
        return Ok(());
    }

    let auth = identity(&cfg)?;
    let user = auth.current_identity();
    let app = AppServices::new_sqlite(
        &db_url,
        Clock::system(),
        Arc::new(auth),
        cfg.require_all_answered,
    )
    .await?;

    match cli.command {
        Command::Seed => Ok(()),
        Command::Quizzes { limit } => {
            let quizzes = app.catalog().list_quizzes(limit).await?;
            if quizzes.is_empty() {
                println!("No quizzes yet. Run `quiz seed` first.");
            }
            for quiz in quizzes {
                let points = quiz
                    .total_points
                    .map_or_else(String::new, |p| format!(", {p} points"));
                println!(
                    "{}  {} ({} questions{points})",
                    quiz.id, quiz.topic, quiz.question_count
                );
            }
            Ok(())
        }
        Command::Take { quiz_id, answers } => take_quiz(&app, &quiz_id, answers).await,
        Command::Profile { limit } => {
            let user = user.ok_or(CliError::MissingUser)?;
            let profiles = app.profiles();
            let profile = profiles.profile(&user).await?;
            println!("{}: {} points", profile.user_id, profile.points);
            for entry in &profile.history {
                println!(
                    "  {}  {}  {}",
                    entry.submitted_at.format("%Y-%m-%d %H:%M"),
                    entry.quiz_id,
                    entry.score
                );
            }

            let results = profiles.recent_results(&user, limit).await?;
            if !results.is_empty() {
                println!("Recent results:");
            }
            for stored in results {
                println!(
                    "  #{}  {}  score {} ({} answered)",
                    stored.id,
                    stored.record.quiz_id,
                    stored.record.score,
                    stored.record.answers.len()
                );
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_splits_on_first_equals() {
        assert_eq!(parse_answer("1=a=b").unwrap(), (1, "a=b".to_string()));
        assert_eq!(parse_answer("0=").unwrap(), (0, String::new()));
        assert!(parse_answer("x=1").is_err());
        assert!(parse_answer("no-separator").is_err());
    }

    #[test]
    fn relative_paths_become_absolute_sqlite_urls() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/q.sqlite3".into()),
            "sqlite:///tmp/q.sqlite3"
        );
        assert_eq!(normalize_sqlite_url("/tmp/q.sqlite3".into()), "sqlite:///tmp/q.sqlite3");
        assert!(normalize_sqlite_url("q.sqlite3".into()).starts_with("sqlite:///"));
    }

    #[test]
    fn cli_parses_take_with_answers() {
        let cli = Cli::try_parse_from([
            "quiz",
            "take",
            "quiz-finance-basics",
            "--answer",
            "0=32",
            "--answer",
            "1=121",
            "--user",
            "student",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("student"));
        match cli.command {
            Command::Take { quiz_id, answers } => {
                assert_eq!(quiz_id, QuizId::new("quiz-finance-basics"));
                assert_eq!(answers, vec![(0, "32".into()), (1, "121".into())]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn blank_user_is_rejected() {
        let cfg = AppConfig {
            user: Some(" ".into()),
            ..AppConfig::default()
        };
        assert!(matches!(identity(&cfg), Err(CliError::InvalidUser { .. })));
    }
}
