use std::path::{Path, PathBuf};

use research_core::persist;

use crate::{Schedule, ScheduleError};

/// Handle to the schedule file, same atomic replace-on-write persistence as
/// the watchlist store.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    path: PathBuf,
}

impl ScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        std::env::var_os("GRADIENT_DATA_DIR")
            .map(PathBuf::from)
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gradient-research")
            .join("schedule.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Schedule, ScheduleError> {
        Ok(persist::load_json(&self.path)?)
    }

    /// Advisory lock for a load-mutate-save cycle.
    pub fn lock(&self) -> Result<persist::LockGuard, ScheduleError> {
        Ok(persist::LockGuard::acquire(&self.path)?)
    }

    pub fn save(&self, schedule: &Schedule) -> Result<(), ScheduleError> {
        persist::save_json_atomic(&self.path, schedule)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn persisted_mark_run_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScheduleStore::new(dir.path().join("schedule.json"));

        let mut schedule = store.load().unwrap();
        schedule.add("morning", "0 8 * * 1-5", None).unwrap();
        store.save(&schedule).unwrap();

        let now = chrono::Utc.with_ymd_and_hms(2026, 8, 4, 8, 0, 3).unwrap();
        let mut schedule = store.load().unwrap();
        assert_eq!(schedule.due_entries(now, None).len(), 1);
        schedule.mark_run("morning", now).unwrap();
        store.save(&schedule).unwrap();

        let schedule = store.load().unwrap();
        assert!(schedule.due_entries(now, None).is_empty());
        assert_eq!(schedule.find("morning").unwrap().last_run, Some(now));
    }
}
