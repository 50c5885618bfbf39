//! Profile-scoped access to a [`KeyValueStore`], plus an in-memory store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::traits::KeyValueStore;

/// Key holding the string-encoded gold balance.
pub const GOLD_KEY: &str = "player_coin";

/// Key holding the JSON save record.
pub const SAVE_KEY: &str = "player_data";

/// Profile used when none is configured.
pub const DEFAULT_PROFILE: &str = "default";

/// A [`KeyValueStore`] view scoped to one player profile.
///
/// Keys are namespaced as `{profile}/{key}` so several profiles can share one
/// backing store.
#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<dyn KeyValueStore>,
    profile: String,
}

impl ProfileStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, profile: &str) -> Self {
        Self {
            inner,
            profile: profile.to_string(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}/{}", self.profile, key)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(&self.scoped(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(&self.scoped(key), value)
    }
}

/// Volatile store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `set` fails, for exercising best-effort persistence.
    pub fn failing_writes() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fail_writes: true,
        }
    }

    /// Raw (unscoped) value, for assertions.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io("writes disabled".into()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
