//! Core data model types for kotoquiz.
//!
//! Questions as they come out of a question source, the option projections
//! shown to the player, and the difficulty/partition addressing used by the
//! bank loader.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// A single vocabulary question record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Written form (e.g. "勉強").
    #[serde(default)]
    pub kanji: String,
    /// Kana reading (e.g. "べんきょう").
    #[serde(default)]
    pub kana: String,
    /// Romanized reading (e.g. "benkyou").
    #[serde(default)]
    pub romaji: String,
    /// Chinese glosses, `；`- or `;`-separated synonyms.
    #[serde(default)]
    pub chinese: String,
    /// English gloss.
    #[serde(default)]
    pub english: String,
    /// Result of the first submission for this question in the current session.
    #[serde(skip)]
    pub answered_correctly: Option<bool>,
}

impl Question {
    pub fn new(kanji: &str, kana: &str, romaji: &str, chinese: &str, english: &str) -> Self {
        Self {
            kanji: kanji.to_string(),
            kana: kana.to_string(),
            romaji: romaji.to_string(),
            chinese: chinese.to_string(),
            english: english.to_string(),
            answered_correctly: None,
        }
    }

    /// The `kanji|kana|romaji` key used to detect repeated options.
    pub fn signature(&self) -> Signature {
        Signature(format!("{}|{}|{}", self.kanji, self.kana, self.romaji))
    }

    /// The display triple shown on an answer button.
    pub fn option_view(&self) -> OptionView {
        OptionView {
            kanji: display_text(&self.kanji),
            kana: display_text(&self.kana),
            romaji: display_text(&self.romaji),
        }
    }

    /// Chinese synonyms, trimmed, with empty entries dropped.
    pub fn chinese_synonyms(&self) -> Vec<&str> {
        self.chinese
            .split(|c| c == '；' || c == ';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Blank fields render as a single space so labels keep their height.
pub(crate) fn display_text(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        " ".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Identity of a question's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One answer button's text. Carries no correctness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub kanji: String,
    pub kana: String,
    pub romaji: String,
}

/// The options presented for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    /// Shuffled options, the correct answer among them.
    pub options: Vec<OptionView>,
    /// Position of the correct answer in `options`.
    pub correct_index: usize,
}

impl OptionSet {
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// A parsed difficulty string such as `"n3"` or `"n2+n3"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultySpec {
    raw: String,
    levels: Vec<String>,
}

impl DifficultySpec {
    /// Level tags in the order they were written.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }
}

impl fmt::Display for DifficultySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DifficultySpec {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let levels: Vec<String> = s
            .split('+')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        if levels.is_empty() {
            return Err(QuizError::InvalidDifficulty(s.to_string()));
        }
        Ok(Self {
            raw: s.trim().to_string(),
            levels,
        })
    }
}

/// Address of one question partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionRef {
    /// Level tag (e.g. "n3").
    pub level: String,
    /// 1-based partition number.
    pub index: u32,
}

impl PartitionRef {
    pub fn new(level: &str, index: u32) -> Self {
        Self {
            level: level.to_string(),
            index,
        }
    }

    /// Resource path relative to the question root, without extension.
    pub fn path(&self) -> String {
        format!("questions/questions_{}_{:03}", self.level, self.index)
    }

    /// File name of the partition, without directory.
    pub fn file_stem(&self) -> String {
        format!("questions_{}_{:03}", self.level, self.index)
    }
}

impl fmt::Display for PartitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// How many partitions each level tag has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable(HashMap<String, u32>);

impl LevelTable {
    pub fn new(entries: HashMap<String, u32>) -> Self {
        Self(entries)
    }

    /// Partition count for `level`; unknown or zero entries count as one.
    pub fn partitions(&self, level: &str) -> u32 {
        self.0.get(level).copied().unwrap_or(1).max(1)
    }

    /// Known level tags, sorted.
    pub fn levels(&self) -> Vec<&str> {
        let mut levels: Vec<&str> = self.0.keys().map(String::as_str).collect();
        levels.sort_unstable();
        levels
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self(HashMap::from([
            ("n3".to_string(), 2),
            ("n2".to_string(), 3),
            ("n1".to_string(), 6),
        ]))
    }
}
