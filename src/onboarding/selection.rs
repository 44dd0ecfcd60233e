//! Mid-wizard choices that steer the next transition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AI provider picked on the provider selection step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderChoice {
    /// Managed cloud provider. Needs no setup, so it takes the fast path.
    Hosted,
    OpenAi,
    Ollama,
    Custom,
}

/// Display order on the selection screen (1-based keys map onto this)
pub const PROVIDER_CHOICES: &[ProviderChoice] = &[
    ProviderChoice::Hosted,
    ProviderChoice::OpenAi,
    ProviderChoice::Ollama,
    ProviderChoice::Custom,
];

/// The selection value that skips provider setup
pub const FAST_PATH: ProviderChoice = ProviderChoice::Hosted;

impl ProviderChoice {
    pub fn name(self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hosted => "Capture Cloud (recommended)",
            Self::OpenAi => "OpenAI",
            Self::Ollama => "Ollama (local)",
            Self::Custom => "Custom (OpenAI-compatible)",
        }
    }

    pub fn is_fast_path(self) -> bool {
        self == FAST_PATH
    }

    /// 1-based index as shown on screen
    pub fn from_index(index: usize) -> Option<ProviderChoice> {
        index.checked_sub(1).and_then(|i| PROVIDER_CHOICES.get(i)).copied()
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        PROVIDER_CHOICES
            .iter()
            .copied()
            .find(|choice| choice.name() == lowered)
            .ok_or_else(|| {
                let names: Vec<_> = PROVIDER_CHOICES.iter().map(|c| c.name()).collect();
                format!("unknown provider '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Session-scoped choices, owned by the controller and dropped on completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub provider: Option<ProviderChoice>,
}

impl SelectionState {
    pub fn takes_fast_path(&self) -> bool {
        self.provider.is_some_and(ProviderChoice::is_fast_path)
    }

    pub fn clear(&mut self) {
        self.provider = None;
    }
}
