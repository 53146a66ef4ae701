use std::path::{Path, PathBuf};

use research_core::persist;

use crate::{Watchlist, WatchlistError};

/// Handle to the watchlist file. Passed explicitly into every operation so
/// there is no implicit global store.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the platform data directory, e.g.
    /// `~/.local/share/gradient-research/watchlist.json`.
    pub fn default_path() -> PathBuf {
        dirs_base()
            .join("gradient-research")
            .join("watchlist.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file loads as an empty watchlist.
    pub fn load(&self) -> Result<Watchlist, WatchlistError> {
        Ok(persist::load_json(&self.path)?)
    }

    /// Advisory lock for a load-mutate-save cycle. Best effort: readers and
    /// non-cooperating writers are not blocked.
    pub fn lock(&self) -> Result<persist::LockGuard, WatchlistError> {
        Ok(persist::LockGuard::acquire(&self.path)?)
    }

    pub fn save(&self, watchlist: &Watchlist) -> Result<(), WatchlistError> {
        persist::save_json_atomic(&self.path, watchlist)?;
        Ok(())
    }
}

fn dirs_base() -> PathBuf {
    dirs_fallback().unwrap_or_else(|| PathBuf::from("."))
}

fn dirs_fallback() -> Option<PathBuf> {
    std::env::var_os("GRADIENT_DATA_DIR")
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn store() -> (tempfile::TempDir, WatchlistStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));
        (dir, store)
    }

    #[test]
    fn add_then_show_includes_ticker_once() {
        let (_dir, store) = store();
        let mut wl = store.load().unwrap();
        wl.add("$cake", "The Cheesecake Factory", None, today()).unwrap();
        store.save(&wl).unwrap();

        let wl = store.load().unwrap();
        let rendered = wl.render();
        assert_eq!(rendered.matches("$CAKE").count(), 1);
        assert!(rendered.contains("The Cheesecake Factory"));
    }

    #[test]
    fn duplicate_add_rejected() {
        let (_dir, store) = store();
        let mut wl = store.load().unwrap();
        wl.add("CAKE", "The Cheesecake Factory", None, today()).unwrap();
        let err = wl.add("$cake", "The Cheesecake Factory", None, today());
        assert!(matches!(err, Err(WatchlistError::Validation(_))));
    }

    #[test]
    fn remove_then_show_excludes_ticker() {
        let (_dir, store) = store();
        let mut wl = store.load().unwrap();
        wl.add("CAKE", "The Cheesecake Factory", None, today()).unwrap();
        wl.add("BNTX", "BioNTech", None, today()).unwrap();
        wl.remove("cake").unwrap();
        store.save(&wl).unwrap();

        let wl = store.load().unwrap();
        assert!(wl.find("CAKE").is_none());
        assert!(wl.find("BNTX").is_some());
        assert!(!wl.render().contains("$CAKE"));
    }

    #[test]
    fn set_directive_unknown_ticker_leaves_file_unchanged() {
        let (_dir, store) = store();
        let mut wl = store.load().unwrap();
        wl.add("CAKE", "The Cheesecake Factory", None, today()).unwrap();
        store.save(&wl).unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let mut wl = store.load().unwrap();
        let result = wl.set_directive("ZZZT", "ai", "watch capex");
        assert!(matches!(result, Err(WatchlistError::Validation(_))));
        // Caller only saves on success, so the file is untouched.
        let after = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn set_directive_updates_entry() {
        let (_dir, store) = store();
        let mut wl = store.load().unwrap();
        wl.add("CAKE", "The Cheesecake Factory", None, today()).unwrap();
        let msg = wl.set_directive("$cake", "casual dining", "track traffic trends").unwrap();
        assert!(msg.contains("$CAKE"));

        let entry = wl.find("CAKE").unwrap();
        assert_eq!(entry.theme.as_deref(), Some("casual dining"));
        assert_eq!(entry.directive.as_deref(), Some("track traffic trends"));
    }

    #[test]
    fn global_settings_roundtrip_and_validation() {
        let (_dir, store) = store();
        let mut wl = store.load().unwrap();
        wl.set_global("significance_threshold", "7").unwrap();
        wl.set_global("cheap_model", "small-1").unwrap();
        store.save(&wl).unwrap();

        let wl = store.load().unwrap();
        let settings = wl.settings();
        assert_eq!(settings.significance_threshold, 7);
        assert_eq!(settings.cheap_model, "small-1");

        assert!(wl.clone().set_global("significance_threshold", "eleven").is_err());
        assert!(wl.clone().set_global("mystery_knob", "1").is_err());
    }
}
