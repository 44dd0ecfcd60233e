//! Error types
//!
//! Library-level errors use `thiserror`; the binary wraps them in `anyhow`.

use thiserror::Error;

use crate::onboarding::Step;

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize onboarding state: {0}")]
    Serialize(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors surfaced by the wizard controller.
///
/// Stale or unmappable step ids never show up here: they are recovered by
/// falling back to the first step.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Persistence store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot go back to {target:?}: it is not before the current step {current:?}")]
    InvalidBackTarget { target: Step, current: Step },

    #[error("A provider can only be selected on the provider selection step (current: {current:?})")]
    SelectionNotAllowed { current: Step },

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Invalid migration table: {0}")]
    InvalidMigration(String),
}

/// Stable numeric codes, used as process exit codes by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Store = 10,
    InvalidTransition = 20,
    InvalidInput = 30,
    Internal = 70,
}

impl OnboardingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Store(_) => ErrorCode::Store,
            Self::InvalidBackTarget { .. } | Self::SelectionNotAllowed { .. } => {
                ErrorCode::InvalidTransition
            }
            Self::UnknownStep(_) => ErrorCode::InvalidInput,
            Self::InvalidMigration(_) => ErrorCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, OnboardingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = OnboardingError::InvalidBackTarget {
            target: Step::Usecases,
            current: Step::Permissions,
        };
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
        assert_eq!(
            OnboardingError::UnknownStep("nope".into()).code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(ErrorCode::Store as i32, 10);
    }

    #[test]
    fn test_store_error_wraps() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: OnboardingError = StoreError::Io {
            path: "/tmp/state.toml".into(),
            source: io,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::Store);
        assert!(err.to_string().contains("/tmp/state.toml"));
    }
}
