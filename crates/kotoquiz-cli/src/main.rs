//! kotoquiz CLI: the terminal front end of the vocabulary quiz.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "kotoquiz", version, about = "Japanese vocabulary quiz for the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a quiz session
    Play {
        /// Difficulty: one level tag or several joined with '+' (e.g. "n3", "n2+n1")
        #[arg(long, default_value = "n3")]
        level: String,

        /// Seed for question order and options, for reproducible sessions
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show player statistics (counts today's login)
    Profile {
        /// Also list every learned word
        #[arg(long)]
        words: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show or set the gold balance
    Gold {
        /// New balance, clamped to the configured cap
        #[arg(long, allow_hyphen_values = true)]
        set: Option<i64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check question partition files
    Validate {
        /// Question directory (defaults to the configured one)
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and a sample question partition
    Init,
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "kotoquiz=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            level,
            seed,
            config,
        } => commands::play::execute(level, seed, config).await,
        Commands::Profile { words, config } => commands::profile::execute(words, config),
        Commands::Gold { set, config } => commands::gold::execute(set, config),
        Commands::Validate { questions, config } => {
            commands::validate::execute(questions, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
