//! Persistence Store
//!
//! Durable home of the onboarding record. Every backend reads and writes the
//! whole [`PersistedState`] in one operation, so a reader never sees a step id
//! from one sequence paired with the schema version of another.

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::StoreBackend;
use crate::error::StoreError;
use crate::onboarding::ProviderChoice;

/// The durable onboarding record. Missing fields read as zero/false/none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub step_id: u32,

    #[serde(default)]
    pub schema_version: u32,

    #[serde(default)]
    pub completed: bool,

    /// Provider picked mid-wizard, kept so a restart still honours the fast path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<ProviderChoice>,
}

impl PersistedState {
    /// A fresh record at the first step of the given schema version
    pub fn fresh(schema_version: u32) -> Self {
        Self {
            schema_version,
            ..Self::default()
        }
    }
}

/// Key-value store holding the onboarding record
#[async_trait]
pub trait OnboardingStore: Send + Sync {
    /// Read the current record; an empty store yields the default record
    async fn load(&self) -> Result<PersistedState, StoreError>;

    /// Replace the whole record atomically
    async fn save(&self, state: &PersistedState) -> Result<(), StoreError>;

    /// Forget all progress
    async fn clear(&self) -> Result<(), StoreError> {
        self.save(&PersistedState::default()).await
    }
}

/// Open the configured backend
pub async fn open(
    backend: StoreBackend,
    path: &Path,
) -> Result<Arc<dyn OnboardingStore>, StoreError> {
    let store: Arc<dyn OnboardingStore> = match backend {
        StoreBackend::File => Arc::new(FileStore::new(path)),
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(path).await?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(?backend, path = %path.display(), "Opened onboarding store");
    Ok(store)
}
