//! Save format and storage adapters.
//!
//! The whole journey persists as one small JSON document, written through
//! the [`ProgressStore`] trait after every durable change. The format is
//! the one the original web build wrote to localStorage, so an existing
//! save keeps working wherever the engine runs.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::JourneyState;

/// Storage slot name. Doubles as the schema version: a breaking format
/// change gets a new key rather than a migration.
pub const STORAGE_KEY: &str = "do_or_do_save_v1";

/// Wire form of the saved journey.
///
/// `phase` is stored as its screen name but is informational only; loading
/// always restarts at the intro. `lastVisit` is optional on the way in
/// because early saves predate the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub level: u32,
    pub phase: String,
    #[serde(default)]
    pub last_visit: Option<i64>,
    pub kings_path_unlocked: bool,
}

impl SavedState {
    pub fn from_state(state: &JourneyState) -> Self {
        Self {
            level: state.level,
            phase: state.phase.as_str().to_string(),
            last_visit: Some(state.last_visit_ms),
            kings_path_unlocked: state.kings_path_unlocked,
        }
    }

    /// Parse and validate a stored document. Anything unreadable or out of
    /// range yields `None`; the caller falls back to a fresh journey rather
    /// than guessing at partial data. Unknown fields are ignored so newer
    /// saves still open here.
    pub fn decode(json: &str) -> Option<Self> {
        let saved: Self = match serde_json::from_str(json) {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("Discarding unreadable save: {e}");
                return None;
            }
        };
        if saved.level < 1 {
            log::warn!("Discarding save with level {}", saved.level);
            return None;
        }
        Some(saved)
    }

    pub fn encode(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

/// Where the save lives. One implementation per platform, plus an
/// in-memory one for tests and throwaway sessions.
///
/// Both operations are best-effort: `load` answers `None` for "nothing
/// usable there" and `save` swallows failures after logging them. Losing a
/// write costs at most one level of progress.
pub trait ProgressStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, json: &str);
}

#[derive(Debug, Default)]
struct MemoryInner {
    data: Option<String>,
    writes: usize,
}

/// Store backed by process memory. Clones share contents, so a test can
/// keep a handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored document directly, bypassing the write counter.
    pub fn set_contents(&self, json: &str) {
        self.inner.borrow_mut().data = Some(json.to_string());
    }

    pub fn contents(&self) -> Option<String> {
        self.inner.borrow().data.clone()
    }

    /// Number of `save` calls observed.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.inner.borrow().data.clone()
    }

    fn save(&mut self, json: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.data = Some(json.to_string());
        inner.writes += 1;
    }
}
