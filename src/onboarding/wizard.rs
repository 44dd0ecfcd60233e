//! Wizard Controller
//!
//! Drives the step state machine. The persisted record is the only source of
//! truth for "where is the user": every operation re-reads it (running
//! migration when the schema is stale), computes the transition, writes the
//! new record, and only then asks the renderer to draw.

use std::sync::Arc;

use super::capability::{
    CapabilityProbe, CapabilityStatus, StaticProbe, spawn_capability_check,
};
use super::migration::Migrator;
use super::notify::{Notifier, TracingNotifier, WizardEvent};
use super::selection::{ProviderChoice, SelectionState};
use super::step::Step;
use super::view::{NullRenderer, Renderer, StepView};
use crate::error::{OnboardingError, Result};
use crate::store::{OnboardingStore, PersistedState};

/// The one step with a conditional successor
pub const FAST_PATH_STEP: Step = Step::ProviderSelection;

/// How far the fast path jumps from [`FAST_PATH_STEP`]
const FAST_PATH_JUMP: u32 = 2;

/// Leaving this step triggers the background capability check
pub const CAPABILITY_STEP: Step = Step::Permissions;

/// Outcome of [`OnboardingWizard::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved to and persisted a new step
    Entered(Step),
    /// Finished from the terminal step; the record now reads completed
    Completed,
}

/// Next step for a forward move, `None` on the terminal step
pub fn next_step(current: Step, selection: &SelectionState) -> Option<Step> {
    if current == FAST_PATH_STEP && selection.takes_fast_path() {
        return current.offset(FAST_PATH_JUMP);
    }
    current.successor()
}

/// Where "Back" leads from `current`: the predecessor, except that a step
/// reached through the fast path goes back to the fast-path step itself.
pub fn back_target(current: Step, selection: &SelectionState) -> Option<Step> {
    if selection.takes_fast_path() && FAST_PATH_STEP.offset(FAST_PATH_JUMP) == Some(current) {
        return Some(FAST_PATH_STEP);
    }
    current.predecessor()
}

/// Onboarding state machine over an injected store
pub struct OnboardingWizard {
    store: Arc<dyn OnboardingStore>,
    migrator: Migrator,
    renderer: Box<dyn Renderer>,
    notifier: Arc<dyn Notifier>,
    probe: Arc<dyn CapabilityProbe>,
    capability: CapabilityStatus,
    selection: SelectionState,
    pending_check: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for OnboardingWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingWizard")
            .field("migrator", &self.migrator)
            .field("selection", &self.selection)
            .field("capability", &self.capability.get())
            .finish()
    }
}

impl OnboardingWizard {
    /// Wizard with the built-in migration chain, no renderer, tracing
    /// notifications and a probe that reports the capability as granted.
    pub fn new(store: Arc<dyn OnboardingStore>) -> Self {
        Self {
            store,
            migrator: Migrator::builtin(),
            renderer: Box::new(NullRenderer),
            notifier: Arc::new(TracingNotifier),
            probe: Arc::new(StaticProbe::new(true)),
            capability: CapabilityStatus::new(),
            selection: SelectionState::default(),
            pending_check: None,
        }
    }

    pub fn with_migrator(mut self, migrator: Migrator) -> Self {
        self.migrator = migrator;
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Share an existing capability flag (e.g. the recorder's)
    pub fn with_capability_status(mut self, status: CapabilityStatus) -> Self {
        self.capability = status;
        self
    }

    pub fn capability_status(&self) -> &CapabilityStatus {
        &self.capability
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Handle of the most recent background capability check, if one was spawned
    pub fn take_capability_check(&mut self) -> Option<tokio::task::JoinHandle<()>> {
        self.pending_check.take()
    }

    /// Read the record, migrate it if its schema is stale, and map it onto a step.
    ///
    /// Unresolvable ids fall back to the first step. Migration results and
    /// repairs are written back in one save, so a second call finds nothing
    /// left to do.
    async fn load_resolved(&mut self) -> Result<(PersistedState, Step)> {
        let mut state = self.store.load().await?;
        let mut dirty = false;

        if self.migrator.is_stale(state.schema_version) {
            let migrated = self.migrator.migrate(state.schema_version, state.step_id);
            tracing::info!(
                from_version = state.schema_version,
                to_version = self.migrator.current_version(),
                old_step_id = state.step_id,
                new_step_id = migrated,
                "Migrating onboarding progress"
            );
            state.step_id = migrated;
            state.schema_version = self.migrator.current_version();
            dirty = true;
        }

        let step = match Step::from_id(state.step_id) {
            Some(step) => step,
            None => {
                tracing::warn!(
                    step_id = state.step_id,
                    schema_version = state.schema_version,
                    "Persisted step does not exist, restarting onboarding from the first step"
                );
                state.step_id = Step::first().id();
                dirty = true;
                Step::first()
            }
        };

        if dirty {
            self.store.save(&state).await?;
        }

        self.selection.provider = state.selection;
        Ok((state, step))
    }

    /// Current step, resolved fresh from the store
    pub async fn resolve(&mut self) -> Result<Step> {
        let (_, step) = self.load_resolved().await?;
        Ok(step)
    }

    /// Resolved persisted record (after any migration)
    pub async fn state(&mut self) -> Result<PersistedState> {
        let (state, _) = self.load_resolved().await?;
        Ok(state)
    }

    /// Resolve and draw the current step; the entry point for a UI
    pub async fn show(&mut self) -> Result<Step> {
        let step = self.resolve().await?;
        self.renderer.render(&StepView::new(step, self.selection.provider));
        Ok(step)
    }

    pub async fn needs_onboarding(&mut self) -> Result<bool> {
        Ok(!self.state().await?.completed)
    }

    /// Record the provider choice made on the provider selection step
    pub async fn select(&mut self, provider: ProviderChoice) -> Result<()> {
        let (mut state, current) = self.load_resolved().await?;
        if current != FAST_PATH_STEP {
            return Err(OnboardingError::SelectionNotAllowed { current });
        }

        self.selection.provider = Some(provider);
        state.selection = Some(provider);
        self.store.save(&state).await?;

        self.renderer.render(&StepView::new(current, self.selection.provider));
        self.notifier.notify(WizardEvent::SelectionMade {
            step: current,
            provider,
        });
        Ok(())
    }

    /// Move forward one step (two on the fast path). On the terminal step this
    /// completes the wizard.
    pub async fn advance(&mut self) -> Result<Transition> {
        let (state, current) = self.load_resolved().await?;

        match next_step(current, &self.selection) {
            Some(next) => {
                self.enter(state, current, next).await?;
                Ok(Transition::Entered(next))
            }
            None => {
                self.finish(state, current).await?;
                Ok(Transition::Completed)
            }
        }
    }

    /// Jump back to any earlier step
    pub async fn go_back(&mut self, target: Step) -> Result<Step> {
        let (state, current) = self.load_resolved().await?;
        if target >= current {
            return Err(OnboardingError::InvalidBackTarget { target, current });
        }
        self.enter(state, current, target).await
    }

    /// "Back" button: one step back along the path the user took.
    /// Returns `None` on the first step.
    pub async fn back(&mut self) -> Result<Option<Step>> {
        let (state, current) = self.load_resolved().await?;
        match back_target(current, &self.selection) {
            Some(target) => self.enter(state, current, target).await.map(Some),
            None => Ok(None),
        }
    }

    /// Finish onboarding from wherever the user is (the terminal step's
    /// "Get started", or an explicit skip).
    pub async fn complete(&mut self) -> Result<()> {
        let (state, current) = self.load_resolved().await?;
        self.finish(state, current).await
    }

    /// Throw away all progress and start over at the first step
    pub async fn reset(&mut self) -> Result<Step> {
        let state = PersistedState::fresh(self.migrator.current_version());
        self.store.save(&state).await?;
        self.selection.clear();

        let first = Step::first();
        self.renderer.render(&StepView::new(first, None));
        self.notifier.notify(WizardEvent::StepEntered { step: first });
        tracing::info!("Onboarding progress reset");
        Ok(first)
    }

    async fn enter(&mut self, mut state: PersistedState, from: Step, to: Step) -> Result<Step> {
        state.step_id = to.id();
        state.selection = self.selection.provider;
        self.store.save(&state).await?;

        if from == CAPABILITY_STEP {
            self.start_capability_check();
        }

        self.renderer.render(&StepView::new(to, self.selection.provider));
        self.notifier.notify(WizardEvent::StepExited { step: from });
        self.notifier.notify(WizardEvent::StepEntered { step: to });

        tracing::debug!(from = %from, to = %to, "Onboarding step changed");
        Ok(to)
    }

    /// Mark onboarding done and park the pointer on the first step, so a
    /// later re-run starts clean regardless of where the user left off.
    async fn finish(&mut self, state: PersistedState, from: Step) -> Result<()> {
        let done = PersistedState {
            step_id: Step::first().id(),
            schema_version: state.schema_version,
            completed: true,
            selection: None,
        };
        self.store.save(&done).await?;
        self.selection.clear();

        if from == CAPABILITY_STEP {
            self.start_capability_check();
        }

        self.renderer.finished();
        self.notifier.notify(WizardEvent::StepExited { step: from });
        self.notifier.notify(WizardEvent::Completed { step: from });

        tracing::info!(from = %from, "Onboarding completed");
        Ok(())
    }

    fn start_capability_check(&mut self) {
        self.pending_check = spawn_capability_check(self.probe.clone(), self.capability.clone());
    }
}
