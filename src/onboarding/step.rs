//! Step Sequence
//!
//! The ordered list of wizard stages. A step's id is its position in
//! [`SEQUENCE`]; the list is immutable and only the persisted pointer into it
//! changes at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OnboardingError;

/// One stage of the onboarding wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Welcome,
    Introduction,
    /// Screen & audio capture permission. Leaving it kicks off the capability check.
    Permissions,
    ProviderSelection,
    /// Optional: skipped when the hosted provider was picked
    ProviderSetup,
    Usecases,
    Instructions,
    Complete,
}

/// Current sequence, in order. Index == persisted step id.
pub const SEQUENCE: &[Step] = &[
    Step::Welcome,
    Step::Introduction,
    Step::Permissions,
    Step::ProviderSelection,
    Step::ProviderSetup,
    Step::Usecases,
    Step::Instructions,
    Step::Complete,
];

impl Step {
    pub fn first() -> Step {
        SEQUENCE[0]
    }

    pub fn terminal() -> Step {
        SEQUENCE[SEQUENCE.len() - 1]
    }

    pub fn all() -> &'static [Step] {
        SEQUENCE
    }

    /// Stable id used for ordering and persistence
    pub fn id(self) -> u32 {
        // Variants are declared in sequence order
        self as u32
    }

    /// Resolve a persisted id; `None` if it is outside the current sequence
    pub fn from_id(id: u32) -> Option<Step> {
        SEQUENCE.get(id as usize).copied()
    }

    pub fn is_first(self) -> bool {
        self == Step::first()
    }

    pub fn is_terminal(self) -> bool {
        self == Step::terminal()
    }

    /// Next step in the sequence, `None` on the terminal step
    pub fn successor(self) -> Option<Step> {
        self.offset(1)
    }

    pub fn predecessor(self) -> Option<Step> {
        self.id().checked_sub(1).and_then(Step::from_id)
    }

    /// Step `n` positions ahead, if it exists
    pub fn offset(self, n: u32) -> Option<Step> {
        self.id().checked_add(n).and_then(Step::from_id)
    }

    /// 1-based position for progress display
    pub fn number(self) -> usize {
        self.id() as usize + 1
    }

    /// Total number of steps (excluding Complete)
    pub fn total() -> usize {
        SEQUENCE.len() - 1
    }

    /// Symbolic name used for notifications and render dispatch
    pub fn name(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Introduction => "introduction",
            Self::Permissions => "permissions",
            Self::ProviderSelection => "provider_selection",
            Self::ProviderSetup => "provider_setup",
            Self::Usecases => "usecases",
            Self::Instructions => "instructions",
            Self::Complete => "complete",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Welcome => "Welcome",
            Self::Introduction => "What Capture Does",
            Self::Permissions => "Permissions",
            Self::ProviderSelection => "Pick an AI Provider",
            Self::ProviderSetup => "Provider Setup",
            Self::Usecases => "What You Can Build",
            Self::Instructions => "Getting Started",
            Self::Complete => "All Set",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Self::Welcome => "Your screen and audio, searchable",
            Self::Introduction => "Everything is recorded and indexed locally",
            Self::Permissions => "Grant screen recording and microphone access",
            Self::ProviderSelection => "Choose who answers questions about your data",
            Self::ProviderSetup => "Point Capture at your model endpoint",
            Self::Usecases => "Meeting notes, time tracking, and more",
            Self::Instructions => "Where to find your recordings and settings",
            Self::Complete => "Recording starts when you close this window",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either the symbolic name or the numeric id
impl FromStr for Step {
    type Err = OnboardingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u32>() {
            return Step::from_id(id).ok_or_else(|| OnboardingError::UnknownStep(s.to_string()));
        }
        let normalized = s.to_ascii_lowercase().replace('-', "_");
        SEQUENCE
            .iter()
            .copied()
            .find(|step| step.name() == normalized)
            .ok_or_else(|| OnboardingError::UnknownStep(s.to_string()))
    }
}
