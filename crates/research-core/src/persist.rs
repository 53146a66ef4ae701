//! Flat-file JSON persistence shared by the watchlist and schedule stores.
//!
//! Files are read whole and rewritten whole. Writes go to a temp path in the
//! same directory and are renamed over the original, so a crashed writer
//! leaves either the old file or the new one, never a partial.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::StoreError;

/// Load a JSON store file. A missing file is an empty store, not an error.
pub fn load_json<T>(path: &Path) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(StoreError::Io(e)),
    };

    serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
        path: path.display().to_string(),
        source,
    })
}

/// Atomic replace-on-write: serialize, write to `<file>.tmp`, rename over.
pub fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut json = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;
    json.push('\n');

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Advisory lock file guarding a store against concurrent writers from two
/// agent sessions. Best effort only: nothing stops a writer that does not
/// take the lock. Held for the duration of a load-mutate-save cycle and
/// removed on drop.
pub struct LockGuard {
    path: std::path::PathBuf,
}

impl LockGuard {
    const ATTEMPTS: u32 = 10;
    const RETRY_DELAY_MS: u64 = 50;

    /// Acquire `<store>.lock`, retrying briefly before giving up.
    pub fn acquire(store_path: &Path) -> Result<LockGuard, StoreError> {
        let mut lock_path = store_path.as_os_str().to_owned();
        lock_path.push(".lock");
        let lock_path = std::path::PathBuf::from(lock_path);

        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        for attempt in 0..Self::ATTEMPTS {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => return Ok(LockGuard { path: lock_path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if attempt + 1 < Self::ATTEMPTS {
                        std::thread::sleep(std::time::Duration::from_millis(
                            Self::RETRY_DELAY_MS,
                        ));
                    }
                }
                Err(e) => return Err(StoreError::Io(e)),
            }
        }

        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            format!(
                "another invocation holds {}; remove it if stale",
                lock_path.display()
            ),
        )))
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        names: Vec<String>,
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let doc: Doc = load_json(&dir.path().join("absent.json")).unwrap();
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let doc = Doc {
            names: vec!["CAKE".into(), "BNTX".into()],
        };

        save_json_atomic(&path, &doc).unwrap();
        let loaded: Doc = load_json(&path).unwrap();
        assert_eq!(loaded, doc);

        // No temp file left behind after the rename
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn lock_excludes_second_acquirer_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let guard = LockGuard::acquire(&path).unwrap();
        assert!(LockGuard::acquire(&path).is_err());

        drop(guard);
        assert!(LockGuard::acquire(&path).is_ok());
    }

    #[test]
    fn corrupt_file_is_reported_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_json::<Doc>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
