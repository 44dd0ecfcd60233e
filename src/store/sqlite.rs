//! SQLite store
//!
//! Stores the record as rows of a small key-value table. Because SQLite
//! cannot update several rows atomically without one, every save runs inside
//! a single transaction.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use super::{OnboardingStore, PersistedState};
use crate::error::StoreError;

const KEY_STEP_ID: &str = "onboarding.step_id";
const KEY_SCHEMA_VERSION: &str = "onboarding.schema_version";
const KEY_COMPLETED: &str = "onboarding.completed";
const KEY_SELECTION: &str = "onboarding.selection";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS onboarding_state (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Parse a stored value, treating garbage like an absent key
fn parse_or_default<T: FromStr + Default>(key: &str, raw: &str) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw, "Ignoring unparseable onboarding value");
        T::default()
    })
}

#[async_trait]
impl OnboardingStore for SqliteStore {
    async fn load(&self) -> Result<PersistedState, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM onboarding_state")
            .fetch_all(&self.pool)
            .await?;

        let mut state = PersistedState::default();
        for (key, value) in rows {
            match key.as_str() {
                KEY_STEP_ID => state.step_id = parse_or_default(&key, &value),
                KEY_SCHEMA_VERSION => state.schema_version = parse_or_default(&key, &value),
                KEY_COMPLETED => state.completed = parse_or_default(&key, &value),
                KEY_SELECTION => state.selection = value.parse().ok(),
                _ => {}
            }
        }
        Ok(state)
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let entries = [
            (KEY_STEP_ID, state.step_id.to_string()),
            (KEY_SCHEMA_VERSION, state.schema_version.to_string()),
            (KEY_COMPLETED, state.completed.to_string()),
        ];

        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(
                "INSERT INTO onboarding_state (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        match state.selection {
            Some(choice) => {
                sqlx::query(
                    "INSERT INTO onboarding_state (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                )
                .bind(KEY_SELECTION)
                .bind(choice.name())
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM onboarding_state WHERE key = ?1")
                    .bind(KEY_SELECTION)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::ProviderChoice;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_database_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("state.db")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), PersistedState::default());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");
        let state = PersistedState {
            step_id: 5,
            schema_version: 1,
            completed: false,
            selection: Some(ProviderChoice::Hosted),
        };

        let store = SqliteStore::open(&path).await.unwrap();
        store.save(&state).await.unwrap();
        store.close().await;

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_clearing_selection_removes_key() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("state.db")).await.unwrap();

        let mut state = PersistedState {
            step_id: 4,
            schema_version: 1,
            completed: false,
            selection: Some(ProviderChoice::Ollama),
        };
        store.save(&state).await.unwrap();
        state.selection = None;
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap().selection, None);
    }

    #[tokio::test]
    async fn test_missing_and_garbage_keys_default() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("state.db")).await.unwrap();

        sqlx::query("INSERT INTO onboarding_state (key, value) VALUES (?1, ?2)")
            .bind(KEY_STEP_ID)
            .bind("six")
            .execute(&store.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO onboarding_state (key, value) VALUES (?1, ?2)")
            .bind(KEY_COMPLETED)
            .bind("true")
            .execute(&store.pool)
            .await
            .unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.step_id, 0);
        assert_eq!(state.schema_version, 0);
        assert!(state.completed);
    }
}
