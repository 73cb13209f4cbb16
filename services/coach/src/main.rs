mod config;
mod prompt_loader;

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use thinksmarter_core::coach::{Coach, CoachClient};
use thinksmarter_core::evaluation::{
    UnattributedText, parse_evaluation_with, parse_follow_up_questions,
};
use thinksmarter_core::offline::OfflineCoach;
use thinksmarter_core::practice::{DEFAULT_CATEGORY, DEFAULT_DIFFICULTY, PracticeSession};
use thinksmarter_core::prompts::{LengthPreference, PromptBook};
use thinksmarter_core::stats::{AnswerRecord, calculate_statistics};
use thinksmarter_core::streak::ChallengeLog;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Critical-thinking practice coach")]
struct Cli {
    /// Use the built-in simulated coach instead of the hosted model
    #[arg(long, global = true)]
    offline: bool,

    /// Directory of `*.md` prompt overrides, keyed by file stem
    #[arg(long, global = true)]
    prompts: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one practice question
    Question {
        #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: u8,
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
        /// auto, short, medium or long
        #[arg(long, default_value = "auto")]
        length: String,
    },
    /// Score an answer; reads the answer from stdin when omitted
    Evaluate {
        #[arg(long)]
        question: String,
        answer: Option<String>,
        #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: u8,
        #[arg(long, default_value = "auto")]
        length: String,
    },
    /// Suggest deeper questions that build on an answer
    FollowUp {
        #[arg(long)]
        question: String,
        answer: String,
    },
    /// Critique and rewrite a piece of writing; reads stdin when omitted
    Improve {
        #[arg(long = "type", default_value = "General")]
        text_type: String,
        text: Option<String>,
    },
    /// Print a short educational fact
    Fact {
        #[arg(default_value = DEFAULT_CATEGORY)]
        category: String,
    },
    /// Step-by-step thinking guidance for a problem
    Guide { input: String },
    /// Parse a saved model reply and print it as JSON; reads stdin when no file is given
    Parse {
        file: Option<PathBuf>,
        /// Treat the reply as a numbered follow-up list
        #[arg(long)]
        follow_ups: bool,
        /// Keep text before the first section header as feedback
        #[arg(long)]
        keep_preamble: bool,
    },
    /// Answer questions in a loop; an empty answer ends the run
    Practice {
        #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: u8,
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
        #[arg(long, default_value = "auto")]
        length: String,
    },
    /// Answer today's challenge question and update the streak
    Challenge {
        /// JSON file holding past challenges and the streak
        #[arg(long, default_value = "thinksmarter-challenges.json")]
        log: PathBuf,
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
    },
}

fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;
            Ok(text)
        }
    }
}

fn parse_saved_reply(file: Option<&Path>, follow_ups: bool, keep_preamble: bool) -> Result<String> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reply file: {}", path.display()))?,
        None => read_input(None)?,
    };

    if follow_ups {
        return Ok(serde_json::to_string_pretty(&parse_follow_up_questions(&raw))?);
    }

    let policy = if keep_preamble {
        UnattributedText::Feedback
    } else {
        UnattributedText::Discard
    };
    Ok(serde_json::to_string_pretty(&parse_evaluation_with(&raw, policy))?)
}

async fn practice(
    coach: &dyn Coach,
    difficulty: u8,
    category: &str,
    length: LengthPreference,
) -> Result<()> {
    let mut session = PracticeSession::new(difficulty, category, length);
    let mut records = Vec::new();
    let mut asked = 0usize;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let question = session.next_question(coach).await?;
        asked += 1;
        println!(
            "\nQ{asked} ({}): {}\nYour answer (empty line to stop):",
            question.expected_length, question.text
        );

        let Some(answer) = lines.next_line().await? else {
            break;
        };
        if answer.trim().is_empty() {
            break;
        }

        let evaluation = match session.submit_answer(coach, &answer).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::error!("{e:#}");
                continue;
            }
        };
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        records.push(AnswerRecord::from_evaluation(
            asked as u64,
            session.category(),
            &evaluation,
            Utc::now(),
        ));

        match session.follow_ups(coach).await {
            Ok(questions) if !questions.is_empty() => {
                println!("Follow-up questions:");
                for q in questions {
                    println!("  - {q}");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("{e:#}"),
        }
    }

    let stats = calculate_statistics(asked, &records);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn load_challenge_log(path: &Path) -> Result<ChallengeLog> {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse challenge log: {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ChallengeLog::default()),
        Err(e) => Err(e)
            .with_context(|| format!("Failed to read challenge log: {}", path.display())),
    }
}

fn save_challenge_log(path: &Path, log: &ChallengeLog) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(log)?)
        .with_context(|| format!("Failed to write challenge log: {}", path.display()))
}

async fn daily_challenge(
    coach: &dyn Coach,
    log_path: &Path,
    category: &str,
    today: NaiveDate,
) -> Result<()> {
    let mut log = load_challenge_log(log_path)?;
    if log.is_completed(today) {
        println!("Today's challenge is already done.");
        println!("{}", serde_json::to_string_pretty(&log.streak)?);
        return Ok(());
    }

    let mut session = PracticeSession::new(DEFAULT_DIFFICULTY, category, LengthPreference::Auto);
    let question = session.next_question(coach).await?;
    println!("Daily challenge ({today}): {}\nYour answer:", question.text);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let answer = lines.next_line().await?.unwrap_or_default();
    let evaluation = session.submit_answer(coach, &answer).await?;
    println!("{}", serde_json::to_string_pretty(&evaluation)?);

    let question_id = log.next_question_id();
    let streak = log.complete_today(today, question_id, answer.trim(), evaluation.average_score());
    println!(
        "Streak: {} day(s), longest {}, {} completed in total",
        streak.current_streak, streak.longest_streak, streak.total_days_completed
    );
    save_challenge_log(log_path, &log)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `parse` never calls the model, so it runs without a key.
    let offline = cli.offline || matches!(cli.command, Command::Parse { .. });

    let config = Config::from_env(offline).context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let prompts = match &cli.prompts {
        Some(dir) => {
            let book = prompt_loader::load_prompt_book(dir).context("Failed to load prompt overrides")?;
            tracing::info!("Loaded prompt overrides from {}", dir.display());
            book
        }
        None => PromptBook::default(),
    };

    let coach: Box<dyn Coach> = match config.coach_config() {
        Some(coach_config) if !offline => {
            tracing::info!(model = coach_config.model(), "Using hosted coach");
            Box::new(CoachClient::new(coach_config, prompts))
        }
        _ => {
            tracing::info!("Using offline coach");
            Box::new(OfflineCoach)
        }
    };

    match cli.command {
        Command::Question {
            difficulty,
            category,
            length,
        } => {
            let mut session =
                PracticeSession::new(difficulty, &category, LengthPreference::from_name(&length));
            let question = session.next_question(coach.as_ref()).await?;
            println!("{}", question.text);
        }
        Command::Evaluate {
            question,
            answer,
            difficulty,
            length,
        } => {
            let answer = read_input(answer)?;
            if answer.trim().is_empty() {
                return Err(anyhow!("Please enter your answer"));
            }
            let length = LengthPreference::from_name(&length).resolve(difficulty);
            let evaluation = coach
                .evaluate_answer(&question, answer.trim(), length)
                .await
                .context("Failed to evaluate answer")?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        Command::FollowUp { question, answer } => {
            let questions = coach
                .generate_follow_up_questions(&question, &answer)
                .await
                .context("Failed to generate follow-up questions")?;
            for q in questions {
                println!("{q}");
            }
        }
        Command::Improve { text_type, text } => {
            let text = read_input(text)?;
            if text.trim().is_empty() {
                return Err(anyhow!("Please enter some text to improve"));
            }
            let evaluation = coach
                .improve_text(text.trim(), &text_type)
                .await
                .context("Failed to improve text")?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        Command::Fact { category } => {
            println!("{}", coach.generate_random_fact(&category).await?);
        }
        Command::Guide { input } => {
            println!("{}", coach.generate_metacognitive_guidance(&input).await?);
        }
        Command::Parse {
            file,
            follow_ups,
            keep_preamble,
        } => {
            println!("{}", parse_saved_reply(file.as_deref(), follow_ups, keep_preamble)?);
        }
        Command::Practice {
            difficulty,
            category,
            length,
        } => {
            practice(
                coach.as_ref(),
                difficulty,
                &category,
                LengthPreference::from_name(&length),
            )
            .await?;
        }
        Command::Challenge { log, category } => {
            daily_challenge(coach.as_ref(), &log, &category, Local::now().date_naive()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "thinksmarter-coach",
            "question",
            "--difficulty",
            "9",
            "--offline",
        ])
        .unwrap();
        assert!(cli.offline);
        match cli.command {
            Command::Question {
                difficulty,
                category,
                length,
            } => {
                assert_eq!(difficulty, 9);
                assert_eq!(category, "General");
                assert_eq!(length, "auto");
            }
            _ => panic!("Expected question subcommand"),
        }
    }

    #[test]
    fn test_parse_saved_reply_from_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("reply.txt");
        std::fs::write(
            &path,
            "Intro line\nCLARITY SCORE: 8\nLOGIC SCORE: 7 [sound]\nFEEDBACK:\nGood structure.",
        )?;

        let json: serde_json::Value =
            serde_json::from_str(&parse_saved_reply(Some(&path), false, false)?)?;
        assert_eq!(json["clarity_score"], 8);
        assert_eq!(json["logic_score"], 7);
        assert_eq!(json["depth_score"], 5);
        assert_eq!(json["feedback"], "Good structure.");

        let json: serde_json::Value =
            serde_json::from_str(&parse_saved_reply(Some(&path), false, true)?)?;
        assert_eq!(json["feedback"], "Intro line\nGood structure.");
        Ok(())
    }

    #[test]
    fn test_parse_saved_follow_ups() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("follow_ups.txt");
        std::fs::write(&path, "1. Why? (Score: 3)\n2. How so? (Score: 7)")?;

        let questions: Vec<String> =
            serde_json::from_str(&parse_saved_reply(Some(&path), true, false)?)?;
        assert_eq!(questions, vec!["Why?", "How so?"]);
        Ok(())
    }

    #[test]
    fn test_challenge_log_round_trips_through_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("challenges.json");

        let mut log = load_challenge_log(&path)?;
        assert_eq!(log, ChallengeLog::default());

        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        log.complete_today(today, 1, "An answer.", 7);
        save_challenge_log(&path, &log)?;

        let reloaded = load_challenge_log(&path)?;
        assert!(reloaded.is_completed(today));
        assert_eq!(reloaded.streak.current_streak, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_challenge_skips_when_already_done() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("challenges.json");
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let mut log = ChallengeLog::default();
        log.complete_today(today, 1, "Done earlier.", 6);
        save_challenge_log(&path, &log)?;

        // Returns before reading stdin or calling the coach.
        daily_challenge(&OfflineCoach, &path, "General", today).await?;
        assert_eq!(load_challenge_log(&path)?, log);
        Ok(())
    }
}
