//! Capability probe
//!
//! The permissions step needs OS-level screen/audio capture rights. The wizard
//! only ever asks about them in the background when the user leaves that
//! step; the answer lands in [`CapabilityStatus`], which the recorder reads at
//! startup. It never influences the wizard itself.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Capability request denied by user")]
    Denied,
}

/// External check for a required OS permission
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Cheap, non-prompting check
    fn preflight(&self) -> bool;

    /// Ask for the capability; may prompt the user
    async fn confirm(&self) -> Result<(), CapabilityError>;
}

/// Probe with a fixed answer, configured via `[probe] assume_granted`
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe {
    granted: bool,
}

impl StaticProbe {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

#[async_trait]
impl CapabilityProbe for StaticProbe {
    fn preflight(&self) -> bool {
        self.granted
    }

    async fn confirm(&self) -> Result<(), CapabilityError> {
        if self.granted {
            Ok(())
        } else {
            Err(CapabilityError::Unavailable(
                "screen capture permission not granted".to_string(),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityState {
    Unknown,
    Granted,
    /// Will be requested again on the next application start
    Unavailable,
}

/// Volatile flag shared with the recorder. Clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct CapabilityStatus {
    state: Arc<AtomicU8>,
}

impl CapabilityStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> CapabilityState {
        match self.state.load(Ordering::Acquire) {
            1 => CapabilityState::Granted,
            2 => CapabilityState::Unavailable,
            _ => CapabilityState::Unknown,
        }
    }

    pub fn set(&self, state: CapabilityState) {
        let raw = match state {
            CapabilityState::Unknown => 0,
            CapabilityState::Granted => 1,
            CapabilityState::Unavailable => 2,
        };
        self.state.store(raw, Ordering::Release);
    }
}

/// Run the preflight/confirm sequence and record the outcome. Never fails.
pub async fn check_capability(probe: &dyn CapabilityProbe, status: &CapabilityStatus) {
    if probe.preflight() {
        status.set(CapabilityState::Granted);
        return;
    }

    match probe.confirm().await {
        Ok(()) => status.set(CapabilityState::Granted),
        Err(e) => {
            // Re-acquired on a later restart; nothing to do now
            tracing::debug!("Capability check failed, deferring to next launch: {}", e);
            status.set(CapabilityState::Unavailable);
        }
    }
}

/// Fire-and-forget [`check_capability`] on its own task.
///
/// Returns `None` when called outside a tokio runtime; the check is then
/// simply skipped until the next launch.
pub fn spawn_capability_check(
    probe: Arc<dyn CapabilityProbe>,
    status: CapabilityStatus,
) -> Option<tokio::task::JoinHandle<()>> {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("No async runtime, skipping capability check");
        return None;
    };
    Some(handle.spawn(async move {
        check_capability(probe.as_ref(), &status).await;
    }))
}
