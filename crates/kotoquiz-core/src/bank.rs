//! Question bank loading.
//!
//! Resolves a difficulty spec to one randomly chosen partition per level,
//! fetches all of them concurrently, and samples the session's questions from
//! whatever arrived.

use std::sync::Arc;

use futures::future::join_all;
use rand::Rng;

use crate::error::QuizError;
use crate::model::{DifficultySpec, LevelTable, PartitionRef, Question};
use crate::session::sample_session;
use crate::traits::QuestionSource;

/// Questions per session.
pub const DEFAULT_SESSION_LENGTH: usize = 20;

/// Loads session question lists from a [`QuestionSource`].
#[derive(Clone)]
pub struct QuestionBank {
    source: Arc<dyn QuestionSource>,
    levels: LevelTable,
    session_length: usize,
}

impl QuestionBank {
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self {
            source,
            levels: LevelTable::default(),
            session_length: DEFAULT_SESSION_LENGTH,
        }
    }

    pub fn with_levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_session_length(mut self, length: usize) -> Self {
        self.session_length = length.max(1);
        self
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn session_length(&self) -> usize {
        self.session_length
    }

    /// Pick one partition per level tag, uniformly among that level's partitions.
    pub fn choose_partitions<R: Rng + ?Sized>(
        &self,
        spec: &DifficultySpec,
        rng: &mut R,
    ) -> Vec<PartitionRef> {
        spec.levels()
            .iter()
            .map(|level| {
                let count = self.levels.partitions(level);
                PartitionRef::new(level, rng.gen_range(1..=count))
            })
            .collect()
    }

    /// Fetch every partition concurrently and concatenate what succeeded.
    ///
    /// Failed partitions are logged and skipped. Records keep the order of
    /// `partitions`.
    pub async fn fetch_pool(&self, partitions: &[PartitionRef]) -> Vec<Question> {
        let fetches = partitions.iter().map(|partition| async move {
            (partition, self.source.fetch(partition).await)
        });

        let mut pool = Vec::new();
        for (partition, result) in join_all(fetches).await {
            match result {
                Ok(records) => {
                    tracing::debug!(%partition, count = records.len(), "partition loaded");
                    pool.extend(records);
                }
                Err(e) => {
                    tracing::warn!(%partition, source = self.source.name(), "failed to load partition: {e}");
                }
            }
        }
        pool
    }

    /// Load a shuffled, truncated question list for `spec`.
    ///
    /// Fails with [`QuizError::BankUnavailable`] when no partition yielded any
    /// records.
    pub async fn load<R: Rng + Send + ?Sized>(
        &self,
        spec: &DifficultySpec,
        rng: &mut R,
    ) -> Result<Vec<Question>, QuizError> {
        let partitions = self.choose_partitions(spec, rng);
        let pool = self.fetch_pool(&partitions).await;

        if pool.is_empty() {
            tracing::error!(difficulty = %spec, "question bank is empty, cannot start");
            return Err(QuizError::BankUnavailable(spec.to_string()));
        }

        let questions = sample_session(pool, self.session_length, rng);
        tracing::info!(
            difficulty = %spec,
            partitions = partitions.len(),
            questions = questions.len(),
            "question bank loaded"
        );
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::error::SourceError;

    /// Source that serves fixed partitions and records every request.
    struct FixtureSource {
        partitions: HashMap<String, Vec<Question>>,
        requests: Mutex<Vec<String>>,
    }

    impl FixtureSource {
        fn new(entries: &[(&str, u32, usize)]) -> Self {
            let partitions = entries
                .iter()
                .map(|&(level, index, count)| {
                    let records = (0..count)
                        .map(|i| {
                            Question::new(&format!("{level}-{index}-{i}"), "か", "ka", "", "")
                        })
                        .collect();
                    (PartitionRef::new(level, index).path(), records)
                })
                .collect();
            Self {
                partitions,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuestionSource for FixtureSource {
        fn name(&self) -> &str {
            "fixture"
        }

        async fn fetch(&self, partition: &PartitionRef) -> Result<Vec<Question>, SourceError> {
            let path = partition.path();
            self.requests.lock().unwrap().push(path.clone());
            self.partitions
                .get(&path)
                .cloned()
                .ok_or(SourceError::NotFound(path))
        }
    }

    #[test]
    fn partitions_stay_within_level_counts() {
        let bank = QuestionBank::new(Arc::new(FixtureSource::new(&[])));
        let spec: DifficultySpec = "n1+n2+n3+n9".parse().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);

        for _ in 0..200 {
            let chosen = bank.choose_partitions(&spec, &mut rng);
            assert_eq!(chosen.len(), 4);
            assert!((1..=6).contains(&chosen[0].index));
            assert!((1..=3).contains(&chosen[1].index));
            assert!((1..=2).contains(&chosen[2].index));
            assert_eq!(chosen[3].index, 1);
        }
    }

    #[tokio::test]
    async fn load_samples_session_length() {
        let source = FixtureSource::new(&[("n3", 1, 30), ("n3", 2, 30)]);
        let bank = QuestionBank::new(Arc::new(source));
        let spec: DifficultySpec = "n3".parse().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(12);

        let questions = bank.load(&spec, &mut rng).await.unwrap();
        assert_eq!(questions.len(), DEFAULT_SESSION_LENGTH);
        assert!(questions.iter().all(|q| q.kanji.starts_with("n3-")));
    }

    #[tokio::test]
    async fn failed_partitions_are_skipped() {
        // Only n2 exists; n5 has one (missing) partition.
        let source = FixtureSource::new(&[("n2", 1, 4), ("n2", 2, 4), ("n2", 3, 4)]);
        let bank = QuestionBank::new(Arc::new(source));
        let spec: DifficultySpec = "n5+n2".parse().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(13);

        let questions = bank.load(&spec, &mut rng).await.unwrap();
        assert_eq!(questions.len(), 4);
    }

    #[tokio::test]
    async fn empty_pool_is_fatal() {
        let bank = QuestionBank::new(Arc::new(FixtureSource::new(&[])));
        let spec: DifficultySpec = "n3".parse().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(14);

        let err = bank.load(&spec, &mut rng).await.unwrap_err();
        assert!(matches!(err, QuizError::BankUnavailable(ref s) if s == "n3"));
    }

    /// Source that takes one second per partition and serves any path.
    struct SlowSource;

    #[async_trait]
    impl QuestionSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(&self, partition: &PartitionRef) -> Result<Vec<Question>, SourceError> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let path = partition.path();
            Ok((0..3)
                .map(|i| Question::new(&format!("{path}-{i}"), "か", "ka", "", ""))
                .collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn partitions_are_fetched_concurrently() {
        let bank = QuestionBank::new(Arc::new(SlowSource)).with_session_length(10);
        let spec: DifficultySpec = "n2+n3".parse().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(16);

        let started = tokio::time::Instant::now();
        let questions = bank.load(&spec, &mut rng).await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
        assert_eq!(questions.len(), 6);
        assert!(questions.iter().any(|q| q.kanji.contains("_n2_")));
        assert!(questions.iter().any(|q| q.kanji.contains("_n3_")));
    }

    #[tokio::test]
    async fn every_level_is_requested() {
        let source = Arc::new(FixtureSource::new(&[("x", 1, 2), ("y", 1, 2)]));
        let bank = QuestionBank::new(source.clone()).with_session_length(10);
        let spec: DifficultySpec = "x+y".parse().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(15);

        let questions = bank.load(&spec, &mut rng).await.unwrap();
        assert_eq!(questions.len(), 4);
        let requests = source.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            ["questions/questions_x_001", "questions/questions_y_001"]
        );
    }
}
