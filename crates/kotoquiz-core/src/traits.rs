//! Boundary traits the quiz core consumes.
//!
//! The key-value store and question source are implemented by
//! `kotoquiz-storage` (and by in-memory fakes for tests); the presenter is
//! implemented by whatever front end drives a session.

use async_trait::async_trait;

use crate::error::{QuizError, SourceError, StoreError};
use crate::model::{PartitionRef, Question};
use crate::session::{AnswerOutcome, PresentedQuestion, SessionSummary};

// ---------------------------------------------------------------------------
// Key-value store
// ---------------------------------------------------------------------------

/// Flat string-to-string local storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Question source
// ---------------------------------------------------------------------------

/// Backend that returns the question records of one partition.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Human-readable source name (e.g. "directory").
    fn name(&self) -> &str;

    /// Fetch every record in `partition`.
    async fn fetch(&self, partition: &PartitionRef) -> Result<Vec<Question>, SourceError>;
}

// ---------------------------------------------------------------------------
// Presentation layer
// ---------------------------------------------------------------------------

/// Receives state changes from a running session.
pub trait Presenter: Send + Sync {
    /// A question and its options are ready for input.
    fn on_question(&self, question: &PresentedQuestion);
    /// An answer was scored.
    fn on_answer(&self, outcome: &AnswerOutcome);
    /// The gold balance changed by `delta`.
    fn on_gold(&self, balance: u32, delta: u32);
    /// The session clock advanced. `clock` is `mm:ss`.
    fn on_timer(&self, elapsed_seconds: u32, clock: &str);
    /// The session finished and the reward was applied.
    fn on_summary(&self, summary: &SessionSummary);
    /// Loading the question bank failed; no session was started.
    fn on_load_failed(&self, error: &QuizError);
}

/// Presenter that ignores every event.
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn on_question(&self, _: &PresentedQuestion) {}
    fn on_answer(&self, _: &AnswerOutcome) {}
    fn on_gold(&self, _: u32, _: u32) {}
    fn on_timer(&self, _: u32, _: &str) {}
    fn on_summary(&self, _: &SessionSummary) {}
    fn on_load_failed(&self, _: &QuizError) {}
}
