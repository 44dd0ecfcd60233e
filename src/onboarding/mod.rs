//! Onboarding Wizard
//!
//! Step sequence, schema migration, and the controller that ties them to a
//! persistence store. Rendering, notifications and the OS permission probe
//! are collaborators injected into [`OnboardingWizard`].

pub mod capability;
pub mod migration;
pub mod notify;
pub mod selection;
pub mod step;
pub mod view;
pub mod wizard;

pub use capability::{
    CapabilityError, CapabilityProbe, CapabilityState, CapabilityStatus, StaticProbe,
};
pub use migration::{CURRENT_SCHEMA_VERSION, Migrator, VersionTable, migrate};
pub use notify::{ChannelNotifier, Notifier, TracingNotifier, WizardEvent};
pub use selection::{ProviderChoice, SelectionState};
pub use step::{SEQUENCE, Step};
pub use view::{NullRenderer, Renderer, StepView};
pub use wizard::{OnboardingWizard, Transition};
