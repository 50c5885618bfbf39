//! The `kotoquiz init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("kotoquiz.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("questions").context("failed to create questions/")?;
    write_if_missing(Path::new("questions/questions_n3_001.json"), SAMPLE_PARTITION)?;

    println!("\nNext steps:");
    println!("  1. Add more partitions to questions/ and list them under [levels]");
    println!("  2. Run: kotoquiz validate");
    println!("  3. Run: kotoquiz play --level n3");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# kotoquiz configuration

profile = "default"
data_dir = "./kotoquiz-data"
questions_dir = "./questions"

gold_cap = 99999
session_length = 20
distractor_window = 40
distractor_attempts = 10
feedback_delay_ms = 500
tick_ms = 1000

# Partition files per level: questions_{level}_{001..=N}.json
[levels]
n3 = 1
"#;

const SAMPLE_PARTITION: &str = r#"[
  {"kanji": "勉強", "kana": "べんきょう", "romaji": "benkyou", "chinese": "学习；用功", "english": "study"},
  {"kanji": "旅行", "kana": "りょこう", "romaji": "ryokou", "chinese": "旅行", "english": "travel"},
  {"kanji": "約束", "kana": "やくそく", "romaji": "yakusoku", "chinese": "约定；承诺", "english": "promise"},
  {"kanji": "経験", "kana": "けいけん", "romaji": "keiken", "chinese": "经验", "english": "experience"},
  {"kanji": "準備", "kana": "じゅんび", "romaji": "junbi", "chinese": "准备", "english": "preparation"},
  {"kanji": "説明", "kana": "せつめい", "romaji": "setsumei", "chinese": "说明；解释", "english": "explanation"},
  {"kanji": "習慣", "kana": "しゅうかん", "romaji": "shuukan", "chinese": "习惯", "english": "habit"},
  {"kanji": "相談", "kana": "そうだん", "romaji": "soudan", "chinese": "商量；咨询", "english": "consultation"},
  {"kanji": "趣味", "kana": "しゅみ", "romaji": "shumi", "chinese": "爱好", "english": "hobby"},
  {"kanji": "残念", "kana": "ざんねん", "romaji": "zannen", "chinese": "遗憾", "english": "regrettable"},
  {"kanji": "予定", "kana": "よてい", "romaji": "yotei", "chinese": "预定；计划", "english": "plan"},
  {"kanji": "連絡", "kana": "れんらく", "romaji": "renraku", "chinese": "联系", "english": "contact"}
]
"#;
