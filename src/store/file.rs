//! TOML file store
//!
//! Keeps the record in a single small TOML file (default
//! `~/.capture/onboarding.toml`). Writes go to a uniquely named sibling temp
//! file that is synced and then renamed over the original, so readers see
//! either the old record or the new one, never a mix.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{OnboardingStore, PersistedState};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl OnboardingStore for FileStore {
    async fn load(&self) -> Result<PersistedState, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        // A damaged file is treated like a missing one: restarting onboarding
        // beats refusing to start.
        match toml::from_str::<PersistedState>(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(
                    "Onboarding state at {:?} is unreadable, starting fresh: {}",
                    self.path,
                    e
                );
                Ok(PersistedState::default())
            }
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let contents =
            toml::to_string_pretty(state).map_err(|e| StoreError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        // Unique temp file per writer; the last rename wins
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut temp = tempfile::Builder::new()
                .prefix(".onboarding")
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            temp.write_all(contents.as_bytes())?;
            temp.as_file().sync_all()?;
            temp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| self.io_error(std::io::Error::other(e)))?
        .map_err(|e| self.io_error(e))?;

        tracing::trace!(step_id = state.step_id, "Onboarding state written to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::ProviderChoice;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("onboarding.toml"));
        assert_eq!(store.load().await.unwrap(), PersistedState::default());
    }

    #[tokio::test]
    async fn test_save_then_load_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("onboarding.toml");
        let state = PersistedState {
            step_id: 4,
            schema_version: 1,
            completed: false,
            selection: Some(ProviderChoice::Custom),
        };

        FileStore::new(&path).save(&state).await.unwrap();

        // Fresh instance, as after a process restart
        let reloaded = FileStore::new(&path).load().await.unwrap();
        assert_eq!(reloaded, state);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("onboarding.toml")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_from_separate_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("onboarding.toml");
        let first = PersistedState {
            step_id: 2,
            schema_version: 1,
            ..PersistedState::default()
        };
        let second = PersistedState {
            step_id: 5,
            schema_version: 1,
            completed: true,
            selection: Some(ProviderChoice::Hosted),
        };

        for _ in 0..50 {
            let a = FileStore::new(&path);
            let b = FileStore::new(&path);
            let (ra, rb) = tokio::join!(
                tokio::spawn(async move { a.save(&first).await }),
                tokio::spawn(async move { b.save(&second).await }),
            );
            ra.unwrap().unwrap();
            rb.unwrap().unwrap();

            let loaded = FileStore::new(&path).load().await.unwrap();
            assert!(loaded == first || loaded == second);
        }

        // Only the record itself remains; no stray temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_partial_file_defaults_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("onboarding.toml");
        std::fs::write(&path, "completed = true\n").unwrap();

        let state = FileStore::new(&path).load().await.unwrap();
        assert!(state.completed);
        assert_eq!(state.step_id, 0);
        assert_eq!(state.schema_version, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("onboarding.toml");
        std::fs::write(&path, "step_id = \"not a number").unwrap();

        let state = FileStore::new(&path).load().await.unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[tokio::test]
    async fn test_unwritable_location_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        // Parent "directory" is a regular file
        let store = FileStore::new(blocker.join("onboarding.toml"));
        let result = store.save(&PersistedState::default()).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
