//! Notifier collaborator
//!
//! Named wizard events for whoever is listening (analytics, logs, the TUI).
//! Delivery is best effort and must never hold up a transition.

use serde::Serialize;
use tokio::sync::mpsc;

use super::selection::ProviderChoice;
use super::step::Step;

/// Events emitted by the wizard controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WizardEvent {
    #[serde(rename = "onboarding_step_entered")]
    StepEntered { step: Step },

    #[serde(rename = "onboarding_step_exited")]
    StepExited { step: Step },

    SelectionMade { step: Step, provider: ProviderChoice },

    #[serde(rename = "onboarding_completed")]
    Completed { step: Step },
}

impl WizardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StepEntered { .. } => "onboarding_step_entered",
            Self::StepExited { .. } => "onboarding_step_exited",
            Self::SelectionMade { .. } => "selection_made",
            Self::Completed { .. } => "onboarding_completed",
        }
    }

    pub fn step(&self) -> Step {
        match self {
            Self::StepEntered { step }
            | Self::StepExited { step }
            | Self::SelectionMade { step, .. }
            | Self::Completed { step } => *step,
        }
    }
}

/// Fire-and-forget event sink
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, event: WizardEvent);
}

/// Writes events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: WizardEvent) {
        match &event {
            WizardEvent::SelectionMade { provider, .. } => {
                tracing::info!(
                    event = event.name(),
                    step = %event.step(),
                    %provider,
                    "Wizard event"
                );
            }
            _ => tracing::info!(event = event.name(), step = %event.step(), "Wizard event"),
        }
    }
}

/// Forwards events into a channel; a closed receiver is ignored
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<WizardEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WizardEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: WizardEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Wizard event dropped, no listener");
        }
    }
}
