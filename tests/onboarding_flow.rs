//! End-to-end onboarding flows across simulated application restarts.
//!
//! Each "launch" builds a fresh wizard over the same durable store, the way
//! the recorder does on startup.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use capture_onboarding::onboarding::{
    CapabilityError, CapabilityProbe, CapabilityState, CURRENT_SCHEMA_VERSION, ChannelNotifier,
    Migrator, ProviderChoice, Step, Transition, VersionTable, WizardEvent,
};
use capture_onboarding::store::{FileStore, OnboardingStore, PersistedState, SqliteStore};
use capture_onboarding::{OnboardingError, OnboardingWizard};

/// Probe whose confirm always fails, counting how often it was asked
#[derive(Default)]
struct FailingProbe {
    confirms: AtomicUsize,
}

#[async_trait]
impl CapabilityProbe for FailingProbe {
    fn preflight(&self) -> bool {
        false
    }

    async fn confirm(&self) -> Result<(), CapabilityError> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        Err(CapabilityError::Unavailable("no display server".to_string()))
    }
}

/// Probe whose confirm never resolves
struct HangingProbe;

#[async_trait]
impl CapabilityProbe for HangingProbe {
    fn preflight(&self) -> bool {
        false
    }

    async fn confirm(&self) -> Result<(), CapabilityError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

fn file_store(dir: &TempDir) -> Arc<dyn OnboardingStore> {
    Arc::new(FileStore::new(dir.path().join("onboarding.toml")))
}

#[tokio::test]
async fn test_legacy_progress_migrates_once() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    store
        .save(&PersistedState {
            step_id: 2,
            schema_version: 0,
            completed: false,
            selection: None,
        })
        .await
        .unwrap();

    let mut wizard = OnboardingWizard::new(store.clone());
    assert_eq!(wizard.resolve().await.unwrap(), Step::Usecases);

    let state = store.load().await.unwrap();
    assert_eq!(state.step_id, 5);
    assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);

    // Second launch reads the migrated record as-is
    let mut relaunched = OnboardingWizard::new(file_store(&dir));
    assert_eq!(relaunched.resolve().await.unwrap(), Step::Usecases);
    assert_eq!(store.load().await.unwrap(), state);
}

#[tokio::test]
async fn test_multi_version_chain_on_sqlite() {
    static V1_TO_V2: &[(u32, u32)] = &[
        (0, 0),
        (1, 1),
        (2, 2),
        (3, 3),
        (4, 4),
        (5, 6),
        (6, 6),
        (7, 7),
    ];

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("onboarding.db");
    let store: Arc<dyn OnboardingStore> = Arc::new(SqliteStore::open(&path).await.unwrap());
    store
        .save(&PersistedState {
            step_id: 2,
            schema_version: 0,
            ..PersistedState::default()
        })
        .await
        .unwrap();

    let migrator = Migrator::new(
        2,
        vec![
            capture_onboarding::onboarding::migration::V0_TO_V1,
            VersionTable::new(1, V1_TO_V2),
        ],
    )
    .unwrap();

    let mut wizard = OnboardingWizard::new(store.clone()).with_migrator(migrator);
    // v0 usecases(2) -> v1 usecases(5) -> v2 instructions(6)
    assert_eq!(wizard.resolve().await.unwrap(), Step::Instructions);

    let state = store.load().await.unwrap();
    assert_eq!((state.step_id, state.schema_version), (6, 2));
}

#[tokio::test]
async fn test_unknown_id_restarts_from_first_step() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    store
        .save(&PersistedState {
            step_id: 42,
            schema_version: CURRENT_SCHEMA_VERSION,
            ..PersistedState::default()
        })
        .await
        .unwrap();

    let mut wizard = OnboardingWizard::new(store.clone());
    assert_eq!(wizard.resolve().await.unwrap(), Step::Welcome);
    assert_eq!(store.load().await.unwrap().step_id, 0);
}

#[tokio::test]
async fn test_fast_path_survives_restart() {
    let dir = TempDir::new().unwrap();
    let mut wizard = OnboardingWizard::new(file_store(&dir));

    while wizard.resolve().await.unwrap() != Step::ProviderSelection {
        wizard.advance().await.unwrap();
    }
    wizard.select(ProviderChoice::Hosted).await.unwrap();
    drop(wizard);

    // The choice is persisted, so the next launch still skips provider setup
    let mut relaunched = OnboardingWizard::new(file_store(&dir));
    assert_eq!(
        relaunched.advance().await.unwrap(),
        Transition::Entered(Step::Usecases)
    );
    assert_eq!(relaunched.back().await.unwrap(), Some(Step::ProviderSelection));
}

#[tokio::test]
async fn test_other_provider_takes_setup_step() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    store
        .save(&PersistedState {
            step_id: Step::ProviderSelection.id(),
            schema_version: CURRENT_SCHEMA_VERSION,
            ..PersistedState::default()
        })
        .await
        .unwrap();

    let mut wizard = OnboardingWizard::new(store);
    wizard.select(ProviderChoice::Ollama).await.unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        Transition::Entered(Step::ProviderSetup)
    );
}

#[tokio::test]
async fn test_go_back_persists_across_restart() {
    let dir = TempDir::new().unwrap();
    let mut wizard = OnboardingWizard::new(file_store(&dir));
    for _ in 0..3 {
        wizard.advance().await.unwrap();
    }
    assert_eq!(wizard.resolve().await.unwrap(), Step::ProviderSelection);

    assert_eq!(wizard.go_back(Step::Introduction).await.unwrap(), Step::Introduction);

    let mut relaunched = OnboardingWizard::new(file_store(&dir));
    assert_eq!(relaunched.resolve().await.unwrap(), Step::Introduction);

    let err = relaunched.go_back(Step::Usecases).await.unwrap_err();
    assert!(matches!(err, OnboardingError::InvalidBackTarget { .. }));
    assert_eq!(relaunched.resolve().await.unwrap(), Step::Introduction);
}

#[tokio::test]
async fn test_probe_failure_never_blocks_navigation() {
    let dir = TempDir::new().unwrap();
    let probe = Arc::new(FailingProbe::default());
    let mut wizard = OnboardingWizard::new(file_store(&dir)).with_probe(probe.clone());

    wizard.advance().await.unwrap();
    wizard.advance().await.unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        Transition::Entered(Step::ProviderSelection)
    );

    wizard.take_capability_check().unwrap().await.unwrap();
    assert_eq!(probe.confirms.load(Ordering::SeqCst), 1);
    assert_eq!(wizard.capability_status().get(), CapabilityState::Unavailable);
    assert_eq!(wizard.resolve().await.unwrap(), Step::ProviderSelection);
}

#[tokio::test]
async fn test_hanging_probe_does_not_delay_transition() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    store
        .save(&PersistedState {
            step_id: Step::Permissions.id(),
            schema_version: CURRENT_SCHEMA_VERSION,
            ..PersistedState::default()
        })
        .await
        .unwrap();

    let mut wizard = OnboardingWizard::new(store.clone()).with_probe(Arc::new(HangingProbe));
    let transition = tokio::time::timeout(std::time::Duration::from_secs(5), wizard.advance())
        .await
        .expect("advance must not wait on the probe")
        .unwrap();
    assert_eq!(transition, Transition::Entered(Step::ProviderSelection));
    assert_eq!(store.load().await.unwrap().step_id, Step::ProviderSelection.id());

    if let Some(check) = wizard.take_capability_check() {
        check.abort();
    }
    assert_eq!(wizard.capability_status().get(), CapabilityState::Unknown);
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    store
        .save(&PersistedState {
            step_id: 3,
            schema_version: 0,
            ..PersistedState::default()
        })
        .await
        .unwrap();

    let mut wizard = OnboardingWizard::new(store.clone());
    let first = wizard.resolve().await.unwrap();
    let after_first = store.load().await.unwrap();
    let second = wizard.resolve().await.unwrap();

    assert_eq!(first, Step::Permissions);
    assert_eq!(first, second);
    assert_eq!(store.load().await.unwrap(), after_first);
}

#[tokio::test]
async fn test_full_walk_and_completion_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("onboarding.db");
    let store: Arc<dyn OnboardingStore> = Arc::new(SqliteStore::open(&path).await.unwrap());

    let (notifier, mut events) = ChannelNotifier::new();
    let mut wizard = OnboardingWizard::new(store.clone()).with_notifier(Arc::new(notifier));
    assert!(wizard.needs_onboarding().await.unwrap());

    let mut visited = vec![wizard.resolve().await.unwrap()];
    loop {
        match wizard.advance().await.unwrap() {
            Transition::Entered(step) => visited.push(step),
            Transition::Completed => break,
        }
    }
    assert_eq!(visited, Step::all().to_vec());

    let state = store.load().await.unwrap();
    assert!(state.completed);
    assert_eq!(state.step_id, Step::first().id());
    assert!(!wizard.needs_onboarding().await.unwrap());

    let mut completed = 0;
    while let Ok(event) = events.try_recv() {
        if let WizardEvent::Completed { step } = event {
            assert_eq!(step, Step::Complete);
            completed += 1;
        }
    }
    assert_eq!(completed, 1);

    // A later launch sees the finished record
    drop(wizard);
    let reopened: Arc<dyn OnboardingStore> = Arc::new(SqliteStore::open(&path).await.unwrap());
    let mut relaunched = OnboardingWizard::new(reopened);
    assert!(!relaunched.needs_onboarding().await.unwrap());
}
