//! Terminal UI
//!
//! Key handling and rendering for the interactive onboarding wizard.

pub mod events;
pub mod onboarding_render;

pub use events::{WizardCommand, map_key};
pub use onboarding_render::ConsoleRenderer;
