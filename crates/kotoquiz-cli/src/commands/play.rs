//! The `kotoquiz play` command.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::mpsc;

use kotoquiz_core::driver::{PlayerInput, SessionDriver, SessionReport};
use kotoquiz_core::error::QuizError;
use kotoquiz_core::model::DifficultySpec;
use kotoquiz_core::save::SaveStore;
use kotoquiz_core::session::{AnswerOutcome, PresentedQuestion, SessionSummary};
use kotoquiz_core::traits::Presenter;
use kotoquiz_storage::config::load_config_from;

/// Prints session events to the terminal.
struct TerminalPresenter {
    clock: Mutex<String>,
}

impl TerminalPresenter {
    fn new() -> Self {
        Self {
            clock: Mutex::new("00:00".to_string()),
        }
    }

    fn clock(&self) -> String {
        self.clock
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl Presenter for TerminalPresenter {
    fn on_question(&self, question: &PresentedQuestion) {
        let retry = if question.retry { " (try again)" } else { "" };
        println!(
            "\n[{}] {}  {}{}",
            question.progress_label(),
            self.clock(),
            question.prompt,
            retry
        );
        if !question.english.trim().is_empty() {
            println!("    {}", question.english);
        }
        for (i, option) in question.options.options.iter().enumerate() {
            println!(
                "  {}) {}  {}  {}",
                i + 1,
                option.kanji,
                option.kana,
                option.romaji
            );
        }
    }

    fn on_answer(&self, outcome: &AnswerOutcome) {
        if outcome.correct {
            println!("  Correct!");
        } else {
            println!("  Wrong. The answer was {}.", outcome.correct_index + 1);
        }
    }

    fn on_gold(&self, balance: u32, delta: u32) {
        if delta > 0 {
            println!("  +{delta} gold ({balance})");
        }
    }

    fn on_timer(&self, _: u32, clock: &str) {
        if let Ok(mut current) = self.clock.lock() {
            *current = clock.to_string();
        }
    }

    fn on_summary(&self, summary: &SessionSummary) {
        use comfy_table::{Cell, Table};

        println!("\n{}", summary.reward.tier.headline());

        let mut table = Table::new();
        table.set_header(vec!["Time", "Correct", "Tier", "Base", "Bonus", "Total", "Gold"]);
        table.add_row(vec![
            Cell::new(summary.clock()),
            Cell::new(format!("{}/{}", summary.correct_count, summary.question_count)),
            Cell::new(format!("{} x{}", summary.reward.tier, summary.reward.multiplier())),
            Cell::new(summary.reward.base_gold),
            Cell::new(summary.reward.bonus_gold),
            Cell::new(summary.total_gold()),
            Cell::new(summary.balance),
        ]);
        println!("{table}");
    }

    fn on_load_failed(&self, error: &QuizError) {
        eprintln!("Could not load questions: {error}");
        eprintln!("Check `questions_dir` in your config, or run `kotoquiz validate`.");
    }
}

/// Map one line of player input to a command.
fn parse_input(line: &str) -> Option<PlayerInput> {
    match line.trim() {
        "r" | "R" => Some(PlayerInput::Restart),
        "q" | "Q" => Some(PlayerInput::Quit),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(|n| PlayerInput::Choose(n - 1)),
    }
}

/// Forward stdin lines to the driver from a dedicated thread.
///
/// The sender is dropped at end of input, which the driver treats as quit.
fn spawn_stdin_reader() -> mpsc::Receiver<PlayerInput> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_input(&line) {
                Some(input) => {
                    if tx.blocking_send(input).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("  Enter 1-4 to answer, r to restart, q to quit."),
            }
        }
    });
    rx
}

pub async fn execute(level: String, seed: Option<u64>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let spec = level
        .parse::<DifficultySpec>()
        .with_context(|| format!("bad --level '{level}'"))?;

    let store = config.open_store()?;
    let save = SaveStore::new(store.clone()).handle_login(Local::now().date_naive());
    tracing::debug!(
        profile = %config.profile,
        logins = save.login_times,
        streak = save.login_streak,
        "login recorded"
    );

    let presenter = Arc::new(TerminalPresenter::new());
    let mut driver = SessionDriver::new(
        Arc::new(config.question_source()),
        store,
        presenter,
        config.rules(),
    );
    if let Some(seed) = seed {
        driver = driver.with_seed(seed);
    }

    eprintln!(
        "kotoquiz: {spec} ({} questions). Answer with 1-4, r restarts, q quits.",
        config.session_length
    );
    let mut inputs = spawn_stdin_reader();

    loop {
        match driver.run(&spec, &mut inputs).await? {
            SessionReport::Completed(_) => {
                println!("\nPress r to play again, q to quit.");
                if !wait_for_replay(&mut inputs).await {
                    break;
                }
            }
            SessionReport::Abandoned => {
                println!("\nSession abandoned.");
                break;
            }
        }
    }

    println!("Gold: {}", driver.ledger().get());
    Ok(())
}

async fn wait_for_replay(inputs: &mut mpsc::Receiver<PlayerInput>) -> bool {
    while let Some(input) = inputs.recv().await {
        match input {
            PlayerInput::Restart => return true,
            PlayerInput::Quit => return false,
            PlayerInput::Choose(_) => {}
        }
    }
    false
}
