//! kotoquiz-core: quiz session state machine, rewards, and persistence model.
//!
//! This crate defines the data model, the storage and presentation traits,
//! and the bookkeeping logic that the rest of kotoquiz builds on. It performs
//! no file or terminal I/O of its own; backends live in `kotoquiz-storage`.

pub mod bank;
pub mod distractor;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod model;
pub mod reward;
pub mod save;
pub mod session;
pub mod store;
pub mod traits;

pub use error::{QuizError, SourceError, StoreError};
