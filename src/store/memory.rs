//! In-memory store, for tests and `store = "memory"` dry runs.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{OnboardingStore, PersistedState};
use crate::error::StoreError;

/// Process-local store. Clones share the same record, which lets a test keep a
/// handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<PersistedState>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            writes: Arc::default(),
        }
    }

    /// Synchronous read, usable from renderers and assertions
    pub fn snapshot(&self) -> PersistedState {
        *lock(&self.state)
    }

    /// Number of `save` calls so far
    pub fn write_count(&self) -> usize {
        *lock(&self.writes)
    }
}

// A poisoned lock still holds a complete record since writes are a single assignment
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl OnboardingStore for MemoryStore {
    async fn load(&self) -> Result<PersistedState, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        *lock(&self.state) = *state;
        *lock(&self.writes) += 1;
        Ok(())
    }
}
