//! Durable local key-value state.
//!
//! Mirrors the browser's `localStorage`: string keys, string values, JSON
//! payloads. Read and write failures never reach the user; the typed
//! helpers log them and fall back to "nothing stored".

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;

/// Fade timer record: `{startTime, isActive}`.
pub const FADE_TIMER_KEY: &str = "watercolor_fade_timer";
pub const STREAK_KEY: &str = "driftpad_streak";
pub const MILESTONES_KEY: &str = "driftpad_milestones";
pub const DAILY_HISTORY_KEY: &str = "driftpad_daily_history";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local storage is unavailable")]
    Unavailable,
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed persistent storage. Single-threaded, so `&self` methods with
/// interior mutability are enough.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store used by tests, the replay tool and as the browser
/// fallback when `localStorage` is blocked.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read and decode `key`. Missing, unreadable or malformed values all yield
/// `None`; malformed ones are removed so they do not fail every load.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("failed to read {key}: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("discarding corrupt {key}: {}", StoreError::from(e));
            if let Err(e) = store.remove(key) {
                log::warn!("failed to remove {key}: {e}");
            }
            None
        }
    }
}

/// Encode and write `value`. Returns `false` (and logs) on failure.
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|json| store.set(key, &json));
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to save {key}: {e}");
            false
        }
    }
}

/// Remove `key`, logging failures.
pub fn remove_key(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        log::warn!("failed to remove {key}: {e}");
    }
}
