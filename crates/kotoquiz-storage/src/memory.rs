//! In-memory question source for tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use kotoquiz_core::error::SourceError;
use kotoquiz_core::model::{PartitionRef, Question};
use kotoquiz_core::traits::QuestionSource;

/// Serves partitions from a map keyed by [`PartitionRef::path`].
#[derive(Default)]
pub struct MemorySource {
    partitions: HashMap<String, Vec<Question>>,
    /// Number of fetches made.
    call_count: AtomicU32,
    /// Last partition requested.
    last_request: Mutex<Option<PartitionRef>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the records of one partition.
    pub fn with_partition(mut self, level: &str, index: u32, records: Vec<Question>) -> Self {
        self.partitions
            .insert(PartitionRef::new(level, index).path(), records);
        self
    }

    /// Same records behind every partition of `level` up to `count`.
    pub fn with_level(mut self, level: &str, count: u32, records: Vec<Question>) -> Self {
        for index in 1..=count {
            self = self.with_partition(level, index, records.clone());
        }
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<PartitionRef> {
        self.last_request.lock().ok().and_then(|last| last.clone())
    }
}

#[async_trait]
impl QuestionSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, partition: &PartitionRef) -> Result<Vec<Question>, SourceError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(partition.clone());
        }

        self.partitions
            .get(&partition.path())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(partition.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_registered_partitions() {
        let source = MemorySource::new()
            .with_partition("n2", 3, vec![Question::new("猫", "ねこ", "neko", "猫", "cat")]);

        let records = source.fetch(&PartitionRef::new("n2", 3)).await.unwrap();
        assert_eq!(records[0].romaji, "neko");
        assert!(source.fetch(&PartitionRef::new("n2", 1)).await.is_err());

        assert_eq!(source.call_count(), 2);
        assert_eq!(source.last_request(), Some(PartitionRef::new("n2", 1)));
    }
}
