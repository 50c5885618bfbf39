//! Question source reading partition files from a directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use kotoquiz_core::error::SourceError;
use kotoquiz_core::model::{LevelTable, PartitionRef, Question};
use kotoquiz_core::traits::QuestionSource;

/// Serves `questions_{level}_{NNN}.json` files, each a JSON array of records.
pub struct DirectorySource {
    root: PathBuf,
}

/// What [`DirectorySource::survey`] found for one expected partition.
#[derive(Debug)]
pub struct PartitionReport {
    pub partition: PartitionRef,
    pub result: Result<usize, SourceError>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `partition`.
    pub fn partition_file(&self, partition: &PartitionRef) -> PathBuf {
        self.root.join(format!("{}.json", partition.file_stem()))
    }

    /// Fetch every partition listed in `levels`, sorted by level then index.
    pub async fn survey(&self, levels: &LevelTable) -> Vec<PartitionReport> {
        let mut reports = Vec::new();
        for level in levels.levels() {
            for index in 1..=levels.partitions(level) {
                let partition = PartitionRef::new(level, index);
                let result = self.fetch(&partition).await.map(|records| records.len());
                reports.push(PartitionReport { partition, result });
            }
        }
        reports
    }
}

#[async_trait]
impl QuestionSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn fetch(&self, partition: &PartitionRef) -> Result<Vec<Question>, SourceError> {
        let path = self.partition_file(partition);
        let shown = path.display().to_string();

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SourceError::NotFound(shown.clone())
            } else {
                SourceError::Io {
                    path: shown.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let records: Vec<Question> =
            serde_json::from_str(&content).map_err(|e| SourceError::Malformed {
                path: shown.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = %shown, count = records.len(), "partition read");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;

    const N3_001: &str = r#"[
        {"kanji": "勉強", "kana": "べんきょう", "romaji": "benkyou", "chinese": "学习；用功", "english": "study"},
        {"kanji": "学校", "kana": "がっこう", "romaji": "gakkou", "chinese": "学校"}
    ]"#;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("questions_n3_001.json"), N3_001).unwrap();
        fs::write(dir.path().join("questions_n3_002.json"), "{ not an array").unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_records_and_defaults_missing_fields() {
        let dir = fixture_dir();
        let source = DirectorySource::new(dir.path());

        let records = source.fetch(&PartitionRef::new("n3", 1)).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kanji, "勉強");
        assert_eq!(records[0].chinese_synonyms(), vec!["学习", "用功"]);
        assert_eq!(records[1].english, "");
        assert_eq!(records[1].answered_correctly, None);
    }

    #[tokio::test]
    async fn missing_and_malformed_partitions() {
        let dir = fixture_dir();
        let source = DirectorySource::new(dir.path());

        let missing = source.fetch(&PartitionRef::new("n1", 4)).await.unwrap_err();
        assert!(matches!(missing, SourceError::NotFound(ref p) if p.ends_with("questions_n1_004.json")));

        let malformed = source.fetch(&PartitionRef::new("n3", 2)).await.unwrap_err();
        assert!(matches!(malformed, SourceError::Malformed { .. }));
    }

    #[tokio::test]
    async fn survey_covers_every_expected_partition() {
        let dir = fixture_dir();
        let source = DirectorySource::new(dir.path());
        let levels = LevelTable::new(HashMap::from([
            ("n3".to_string(), 2),
            ("n2".to_string(), 1),
        ]));

        let reports = source.survey(&levels).await;
        let summary: Vec<(String, bool)> = reports
            .iter()
            .map(|r| (r.partition.file_stem(), r.result.is_ok()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("questions_n2_001".to_string(), false),
                ("questions_n3_001".to_string(), true),
                ("questions_n3_002".to_string(), false),
            ]
        );
        assert_eq!(*reports[1].result.as_ref().unwrap(), 2);
    }
}
