//! Aggregate player record: validation, persistence, and updates.
//!
//! The record is stored as one JSON document. Loading never fails: each field
//! is checked on its own and replaced with its default when missing or of the
//! wrong type, and a document that is not JSON at all is reset (and the reset
//! written back).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{ProfileStore, SAVE_KEY};

/// `fastest_record` value meaning no session has been completed yet.
pub const NO_RECORD: u32 = 9999;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Cumulative statistics for one player profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    /// Fastest completed session in seconds, or [`NO_RECORD`].
    pub fastest_record: u32,
    /// Completed sessions.
    pub win_count: u32,
    /// Sessions abandoned after at least one answer.
    pub lose_count: u32,
    /// Distinct days the player logged in.
    pub login_times: u32,
    /// Consecutive-day login streak.
    pub login_streak: u32,
    /// Last login as `YYYY-MM-DD`, empty if never.
    pub last_login_date: String,
    /// Kanji of words answered correctly on the first try, in learning order.
    pub learned_words: Vec<String>,
    /// First-try-correct answers across all completed sessions.
    pub total_correct: u64,
    /// Questions across all completed sessions.
    pub total_answered: u64,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            fastest_record: NO_RECORD,
            win_count: 0,
            lose_count: 0,
            login_times: 0,
            login_streak: 0,
            last_login_date: String::new(),
            learned_words: Vec::new(),
            total_correct: 0,
            total_answered: 0,
        }
    }
}

impl SaveData {
    /// Whether a session has ever been completed.
    ///
    /// A stored `0` only arises from clamping a corrupt value, so it counts as
    /// no record.
    pub fn has_record(&self) -> bool {
        self.fastest_record != NO_RECORD && self.fastest_record != 0
    }

    /// Share of first-try-correct answers over all completed sessions.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_answered == 0 {
            None
        } else {
            Some(self.total_correct as f64 / self.total_answered as f64)
        }
    }

    /// Append `word`, trimmed, unless it is empty or already learned.
    pub fn learn(&mut self, word: &str) -> bool {
        self.keep_word(word.trim())
    }

    fn keep_word(&mut self, word: &str) -> bool {
        if word.is_empty() || self.learned_words.iter().any(|w| w == word) {
            return false;
        }
        self.learned_words.push(word.to_string());
        true
    }
}

/// Outcome of one completed session, as recorded in the save data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub elapsed_seconds: u32,
    pub correct_count: u32,
    pub question_count: u32,
    /// Kanji of the questions whose first submission was correct.
    pub learned: Vec<String>,
}

/// Build a [`SaveData`] from arbitrary JSON, defaulting field by field.
///
/// Numbers are clamped to be non-negative rather than defaulted, so a stored
/// `fastestRecord` of `-5` becomes `0`.
pub fn validate(value: &Value) -> SaveData {
    let defaults = SaveData::default();
    let Some(obj) = value.as_object() else {
        return defaults;
    };

    let count = |key: &str, default: u32| -> u32 {
        obj.get(key)
            .and_then(Value::as_f64)
            .map(|n| n.clamp(0.0, f64::from(u32::MAX)) as u32)
            .unwrap_or(default)
    };
    let total = |key: &str, default: u64| -> u64 {
        obj.get(key)
            .and_then(Value::as_f64)
            .map(|n| n.max(0.0) as u64)
            .unwrap_or(default)
    };

    let mut data = SaveData {
        fastest_record: count("fastestRecord", defaults.fastest_record),
        win_count: count("winCount", defaults.win_count),
        lose_count: count("loseCount", defaults.lose_count),
        login_times: count("loginTimes", defaults.login_times),
        login_streak: count("loginStreak", defaults.login_streak),
        last_login_date: obj
            .get("lastLoginDate")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.last_login_date),
        learned_words: Vec::new(),
        total_correct: total("totalCorrect", defaults.total_correct),
        total_answered: total("totalAnswered", defaults.total_answered),
    };

    if let Some(words) = obj.get("learnedWords").and_then(Value::as_array) {
        // Stored words are kept verbatim.
        for word in words.iter().filter_map(Value::as_str) {
            data.keep_word(word);
        }
    }

    data
}

/// Reads and writes the [`SaveData`] record of one profile.
#[derive(Clone)]
pub struct SaveStore {
    store: ProfileStore,
}

impl SaveStore {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }

    /// Load the record, creating defaults when nothing is stored.
    pub fn load(&self) -> SaveData {
        let raw = match self.store.get(SAVE_KEY) {
            Ok(raw) => raw.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("failed to read save data: {e}");
                String::new()
            }
        };

        if raw.trim().is_empty() {
            return SaveData::default();
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => validate(&value),
            Err(e) => {
                tracing::warn!("save data corrupt, resetting to defaults: {e}");
                let defaults = SaveData::default();
                self.save(&defaults);
                defaults
            }
        }
    }

    /// Write the record. Failures are logged, not returned.
    pub fn save(&self, data: &SaveData) {
        let json = match serde_json::to_string(data) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to encode save data: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(SAVE_KEY, &json) {
            tracing::error!(profile = self.store.profile(), "failed to write save data: {e}");
        }
    }

    /// Count a login on `today`. Repeated logins on the same day are no-ops.
    pub fn handle_login(&self, today: NaiveDate) -> SaveData {
        let mut data = self.load();
        let today_str = today.format(DATE_FORMAT).to_string();

        if data.last_login_date != today_str {
            data.login_times = data.login_times.saturating_add(1);
            if is_consecutive_day(&data.last_login_date, today) {
                data.login_streak = data.login_streak.saturating_add(1);
            } else {
                data.login_streak = 1;
            }
            data.last_login_date = today_str;
            self.save(&data);
        }

        data
    }

    /// Fold a completed session into the record.
    pub fn record_completed(&self, stats: &SessionStats) -> SaveData {
        let mut data = self.load();

        if !data.has_record() || stats.elapsed_seconds < data.fastest_record {
            data.fastest_record = stats.elapsed_seconds;
        }
        data.win_count = data.win_count.saturating_add(1);
        data.total_correct = data
            .total_correct
            .saturating_add(u64::from(stats.correct_count));
        data.total_answered = data
            .total_answered
            .saturating_add(u64::from(stats.question_count));
        for word in &stats.learned {
            data.learn(word);
        }

        self.save(&data);
        data
    }

    /// Count a session abandoned after at least one answer.
    pub fn record_abandoned(&self) -> SaveData {
        let mut data = self.load();
        data.lose_count = data.lose_count.saturating_add(1);
        self.save(&data);
        data
    }
}

fn is_consecutive_day(last: &str, today: NaiveDate) -> bool {
    NaiveDate::parse_from_str(last, DATE_FORMAT)
        .ok()
        .and_then(|last| last.succ_opt())
        .is_some_and(|next| next == today)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;
    use crate::traits::KeyValueStore;

    fn save_store() -> (Arc<MemoryStore>, SaveStore) {
        let backing = Arc::new(MemoryStore::new());
        let store = SaveStore::new(ProfileStore::new(backing.clone(), "p"));
        (backing, store)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn default_round_trips_through_validate() {
        let defaults = SaveData::default();
        let value = serde_json::to_value(&defaults).unwrap();
        assert_eq!(validate(&value), defaults);
    }

    #[test]
    fn negative_numbers_clamp_to_zero() {
        let data = validate(&json!({ "fastestRecord": -5 }));
        assert_eq!(data.fastest_record, 0);
        assert_eq!(data.win_count, 0);
    }

    #[test]
    fn bad_fields_default_individually() {
        let data = validate(&json!({
            "fastestRecord": "fast",
            "winCount": 3,
            "lastLoginDate": 20240101,
            "learnedWords": ["猫", 7, "犬", "猫", ""],
        }));
        assert_eq!(data.fastest_record, NO_RECORD);
        assert_eq!(data.win_count, 3);
        assert_eq!(data.last_login_date, "");
        assert_eq!(data.learned_words, ["猫", "犬"]);
    }

    #[test]
    fn stored_words_are_not_trimmed() {
        let data = validate(&json!({ "learnedWords": [" 猫 ", "犬"] }));
        assert_eq!(data.learned_words, [" 猫 ", "犬"]);

        let mut data = data;
        assert!(data.learn(" 鳥\n"));
        assert_eq!(data.learned_words, [" 猫 ", "犬", "鳥"]);
    }

    #[test]
    fn non_object_yields_defaults() {
        assert_eq!(validate(&json!([1, 2, 3])), SaveData::default());
    }

    #[test]
    fn missing_record_is_not_persisted_on_load() {
        let (backing, store) = save_store();
        assert_eq!(store.load(), SaveData::default());
        assert_eq!(backing.raw("p/player_data"), None);
    }

    #[test]
    fn corrupt_record_resets_and_persists() {
        let (backing, store) = save_store();
        backing.set("p/player_data", "{not json").unwrap();

        assert_eq!(store.load(), SaveData::default());
        let healed = backing.raw("p/player_data").unwrap();
        let value: Value = serde_json::from_str(&healed).unwrap();
        assert_eq!(validate(&value), SaveData::default());
    }

    #[test]
    fn login_counts_once_per_day_and_tracks_streak() {
        let (_, store) = save_store();

        let first = store.handle_login(date("2024-03-01"));
        assert_eq!(first.login_times, 1);
        assert_eq!(first.login_streak, 1);

        let same_day = store.handle_login(date("2024-03-01"));
        assert_eq!(same_day.login_times, 1);

        let next_day = store.handle_login(date("2024-03-02"));
        assert_eq!(next_day.login_times, 2);
        assert_eq!(next_day.login_streak, 2);

        let gap = store.handle_login(date("2024-03-05"));
        assert_eq!(gap.login_times, 3);
        assert_eq!(gap.login_streak, 1);
        assert_eq!(gap.last_login_date, "2024-03-05");
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let (_, store) = save_store();
        store.handle_login(date("2024-02-29"));
        let data = store.handle_login(date("2024-03-01"));
        assert_eq!(data.login_streak, 2);
    }

    #[test]
    fn completed_session_updates_record() {
        let (_, store) = save_store();
        let stats = SessionStats {
            elapsed_seconds: 50,
            correct_count: 18,
            question_count: 20,
            learned: vec!["水".into(), "火".into()],
        };

        let data = store.record_completed(&stats);
        assert_eq!(data.fastest_record, 50);
        assert_eq!(data.win_count, 1);
        assert_eq!(data.total_correct, 18);
        assert_eq!(data.total_answered, 20);
        assert_eq!(data.learned_words, ["水", "火"]);

        let slower = SessionStats {
            elapsed_seconds: 70,
            learned: vec!["火".into(), "木".into()],
            ..stats
        };
        let data = store.record_completed(&slower);
        assert_eq!(data.fastest_record, 50);
        assert_eq!(data.win_count, 2);
        assert_eq!(data.learned_words, ["水", "火", "木"]);
        assert!((data.accuracy().unwrap() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn clamped_zero_record_is_replaced_by_next_completion() {
        let (backing, store) = save_store();
        backing
            .set("p/player_data", r#"{"fastestRecord": -5, "winCount": 2}"#)
            .unwrap();
        assert!(!store.load().has_record());

        let data = store.record_completed(&SessionStats {
            elapsed_seconds: 30,
            correct_count: 20,
            question_count: 20,
            learned: Vec::new(),
        });
        assert_eq!(data.fastest_record, 30);
        assert!(data.has_record());
        assert_eq!(data.win_count, 3);
    }

    #[test]
    fn abandoned_session_counts_as_loss() {
        let (_, store) = save_store();
        assert_eq!(store.record_abandoned().lose_count, 1);
        assert_eq!(store.load().lose_count, 1);
    }
}
