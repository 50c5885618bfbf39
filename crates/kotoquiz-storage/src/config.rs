//! Game configuration and backend construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kotoquiz_core::driver::GameRules;
use kotoquiz_core::model::LevelTable;
use kotoquiz_core::store::{ProfileStore, DEFAULT_PROFILE};

use crate::directory::DirectorySource;
use crate::file_store::JsonFileStore;

/// Top-level kotoquiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Player profile whose gold and save data are used.
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Directory holding the key-value store file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory holding `questions_{level}_{NNN}.json` partitions.
    #[serde(default = "default_questions_dir")]
    pub questions_dir: PathBuf,
    /// Upper bound of the gold balance.
    #[serde(default = "default_gold_cap")]
    pub gold_cap: u32,
    /// Questions per session.
    #[serde(default = "default_session_length")]
    pub session_length: usize,
    /// Distractor window on each side of the current question.
    #[serde(default = "default_distractor_window")]
    pub distractor_window: usize,
    /// Resamples before overlapping options are accepted.
    #[serde(default = "default_distractor_attempts")]
    pub distractor_attempts: usize,
    /// Time answer feedback stays up, in milliseconds.
    #[serde(default = "default_feedback_delay")]
    pub feedback_delay_ms: u64,
    /// Session clock period in milliseconds.
    #[serde(default = "default_tick")]
    pub tick_ms: u64,
    /// Partition count per level tag.
    #[serde(default)]
    pub levels: LevelTable,
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./kotoquiz-data")
}
fn default_questions_dir() -> PathBuf {
    PathBuf::from("./questions")
}
fn default_gold_cap() -> u32 {
    kotoquiz_core::ledger::DEFAULT_GOLD_CAP
}
fn default_session_length() -> usize {
    kotoquiz_core::bank::DEFAULT_SESSION_LENGTH
}
fn default_distractor_window() -> usize {
    kotoquiz_core::distractor::DEFAULT_WINDOW
}
fn default_distractor_attempts() -> usize {
    kotoquiz_core::distractor::DEFAULT_MAX_ATTEMPTS
}
fn default_feedback_delay() -> u64 {
    500
}
fn default_tick() -> u64 {
    1000
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            data_dir: default_data_dir(),
            questions_dir: default_questions_dir(),
            gold_cap: default_gold_cap(),
            session_length: default_session_length(),
            distractor_window: default_distractor_window(),
            distractor_attempts: default_distractor_attempts(),
            feedback_delay_ms: default_feedback_delay(),
            tick_ms: default_tick(),
            levels: LevelTable::default(),
        }
    }
}

impl QuizConfig {
    /// Game parameters for the session driver.
    pub fn rules(&self) -> GameRules {
        GameRules {
            session_length: self.session_length.max(1),
            gold_cap: self.gold_cap,
            distractor_window: self.distractor_window,
            distractor_attempts: self.distractor_attempts.max(1),
            levels: self.levels.clone(),
            feedback_delay: Duration::from_millis(self.feedback_delay_ms),
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
        }
    }

    /// Open the key-value store in `data_dir`, scoped to `profile`.
    pub fn open_store(&self) -> Result<ProfileStore> {
        let store = JsonFileStore::in_dir(&self.data_dir)
            .with_context(|| format!("failed to open store in {}", self.data_dir.display()))?;
        Ok(ProfileStore::new(Arc::new(store), &self.profile))
    }

    pub fn question_source(&self) -> DirectorySource {
        DirectorySource::new(&self.questions_dir)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let name = &result[start + 2..start + end];
        let value = std::env::var(name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `kotoquiz.toml` in the current directory
/// 2. `~/.config/kotoquiz/config.toml`
///
/// Environment variable overrides: `KOTOQUIZ_DATA_DIR`,
/// `KOTOQUIZ_QUESTIONS_DIR`, `KOTOQUIZ_PROFILE`.
pub fn load_config() -> Result<QuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("kotoquiz.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizConfig::default(),
    };

    if let Ok(dir) = std::env::var("KOTOQUIZ_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("KOTOQUIZ_QUESTIONS_DIR") {
        config.questions_dir = PathBuf::from(dir);
    }
    if let Ok(profile) = std::env::var("KOTOQUIZ_PROFILE") {
        config.profile = profile;
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.questions_dir = resolve_path(&config.questions_dir);

    tracing::debug!(
        source = ?config_path,
        profile = %config.profile,
        data_dir = %config.data_dir.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("kotoquiz"))
}
