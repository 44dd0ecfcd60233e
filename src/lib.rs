//! Capture Onboarding - Resumable First-Run Wizard
//!
//! The step state machine behind the Capture recorder's first-run setup.
//! Progress is persisted after every transition, so the wizard resumes where
//! the user left off across restarts and upgrades.
//!
//! ## Features
//!
//! - **Versioned persistence:** step ids carry a schema version and are
//!   migrated forward when the step sequence changes
//! - **Pluggable stores:** TOML file, SQLite, or in-memory
//! - **Fast path:** the hosted provider skips provider setup
//! - **Background capability probe:** leaving the permissions step checks OS
//!   capture rights without ever blocking the wizard
//!
//! ## Quick Start
//!
//! ```bash
//! # Interactive wizard
//! capture-onboarding
//!
//! # Scripted
//! capture-onboarding next
//! capture-onboarding select hosted
//! capture-onboarding status --json
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod onboarding;
pub mod store;
pub mod tui;

// Re-export commonly used types
pub use error::{ErrorCode, OnboardingError, StoreError};
pub use onboarding::{OnboardingWizard, Step};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
