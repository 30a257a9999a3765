//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (js `Date` on web, chrono natively)
//! - Storage (localStorage on web, a data-directory file natively)
//!
//! The engine itself never touches any of this; shells read the clock here
//! and pass explicit timestamps in.

use crate::persistence::ProgressStore;

#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

/// Milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/// Milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Calendar day of the month (1-31) in local time. Keys the daily
/// reflection on the Kings' Path screen.
#[cfg(target_arch = "wasm32")]
pub fn day_of_month() -> u32 {
    js_sys::Date::new_0().get_date()
}

/// Calendar day of the month (1-31) in local time. Keys the daily
/// reflection on the Kings' Path screen.
#[cfg(not(target_arch = "wasm32"))]
pub fn day_of_month() -> u32 {
    use chrono::Datelike;
    chrono::Local::now().day()
}

/// Progress store backed by browser localStorage.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct WebStore;

#[cfg(target_arch = "wasm32")]
impl WebStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

#[cfg(target_arch = "wasm32")]
impl ProgressStore for WebStore {
    fn load(&self) -> Option<String> {
        Self::storage()?
            .get_item(crate::persistence::STORAGE_KEY)
            .ok()
            .flatten()
    }

    fn save(&mut self, json: &str) {
        let Some(storage) = Self::storage() else {
            log::warn!("localStorage unavailable, progress not saved");
            return;
        };
        if storage
            .set_item(crate::persistence::STORAGE_KEY, json)
            .is_err()
        {
            log::warn!("Failed to write save to localStorage");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
const SAVE_FILE: &str = "save.json";

/// Progress store backed by a JSON file in the user's data directory.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Resolve the save location from the environment: an explicit
    /// `DO_OR_DO_DATA_DIR` override, then `XDG_DATA_HOME`, then
    /// `~/.local/share`, and the working directory as a last resort.
    pub fn discover() -> Self {
        let override_dir = std::env::var("DO_OR_DO_DATA_DIR").ok();
        let xdg_data_home = std::env::var("XDG_DATA_HOME").ok();
        let home = std::env::var("HOME").ok();
        let dir = resolve_data_dir(
            override_dir.as_deref(),
            xdg_data_home.as_deref(),
            home.as_deref(),
        );
        Self {
            path: dir.join(SAVE_FILE),
        }
    }

    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn resolve_data_dir(
    override_dir: Option<&str>,
    xdg_data_home: Option<&str>,
    home: Option<&str>,
) -> PathBuf {
    // An empty value counts as unset.
    fn non_empty(v: Option<&str>) -> Option<&str> {
        v.filter(|s| !s.is_empty())
    }
    if let Some(dir) = non_empty(override_dir) {
        PathBuf::from(dir)
    } else if let Some(xdg) = non_empty(xdg_data_home) {
        Path::new(xdg).join("do-or-do")
    } else if let Some(home) = non_empty(home) {
        Path::new(home).join(".local/share/do-or-do")
    } else {
        PathBuf::from(".")
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ProgressStore for FileStore {
    fn load(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    fn save(&mut self, json: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Cannot create save directory {}: {e}", parent.display());
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, json) {
            log::warn!("Cannot write save file {}: {e}", self.path.display());
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_month_is_a_calendar_day() {
        let day = day_of_month();
        assert!((1..=31).contains(&day), "day was {day}");
    }

    #[test]
    fn test_now_ms_is_past_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::at(dir.path().join(SAVE_FILE));

        assert_eq!(store.load(), None);
        store.save(r#"{"level":2}"#);
        assert_eq!(store.load().as_deref(), Some(r#"{"level":2}"#));
    }

    #[test]
    fn test_file_store_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper").join(SAVE_FILE);
        let mut store = FileStore::at(&path);

        store.save("{}");
        assert!(path.is_file());
    }

    #[test]
    fn test_data_dir_resolution_order() {
        assert_eq!(
            resolve_data_dir(Some("/override"), Some("/xdg"), Some("/home/me")),
            PathBuf::from("/override")
        );
        assert_eq!(
            resolve_data_dir(None, Some("/xdg"), Some("/home/me")),
            PathBuf::from("/xdg/do-or-do")
        );
        assert_eq!(
            resolve_data_dir(None, None, Some("/home/me")),
            PathBuf::from("/home/me/.local/share/do-or-do")
        );
        assert_eq!(resolve_data_dir(None, None, None), PathBuf::from("."));
        // Empty values are treated as unset.
        assert_eq!(
            resolve_data_dir(Some(""), Some(""), Some("/home/me")),
            PathBuf::from("/home/me/.local/share/do-or-do")
        );
    }
}
