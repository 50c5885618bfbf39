//! kotoquiz-storage: file-backed stores, question sources, and configuration.
//!
//! Implements the `KeyValueStore` and `QuestionSource` traits from
//! `kotoquiz-core` against the local filesystem, plus an in-memory question
//! source for tests and demos.

pub mod config;
pub mod directory;
pub mod file_store;
pub mod memory;

pub use config::{load_config, load_config_from, QuizConfig};
pub use directory::DirectorySource;
pub use file_store::JsonFileStore;
pub use memory::MemorySource;
