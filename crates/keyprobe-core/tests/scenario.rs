// ABOUTME: Integration tests for the create-then-lookup scenario.
// ABOUTME: Runs both apply steps against an in-memory directory.

use async_trait::async_trait;
use keyprobe_api::{KeyDirectory, MemoryDirectory};
use keyprobe_core::{
    check_attribute, check_key_exists, run_lookup_scenario, ApplyEngine, EngineError,
    LocalEngine, ScenarioError, ScenarioOptions, State, VerifyError,
};
use keyprobe_ssh::{AuthorizedKeyText, KeyPolicy};
use std::sync::Arc;

const LOOKUP: &str = "data.digitalocean_ssh_key.foobar";

fn ed25519_options() -> ScenarioOptions {
    ScenarioOptions {
        policy: KeyPolicy::ed25519(),
        ..ScenarioOptions::default()
    }
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_lookup_returns_generated_key_byte_for_byte() {
    let directory = Arc::new(MemoryDirectory::new());
    let mut engine = LocalEngine::new(directory.clone());
    let options = ScenarioOptions {
        keep: true,
        ..ed25519_options()
    };

    let report = run_lookup_scenario(&mut engine, directory.as_ref(), &options)
        .await
        .expect("scenario should pass");

    assert!(!report.destroyed);
    assert_eq!(report.record.public_key, report.public_key.as_str());
    assert_eq!(report.record.name, report.name);
    assert!(!report.record.public_key.ends_with('\n'));

    let state = engine.state();
    check_attribute(state, LOOKUP, "public_key", report.public_key.as_str()).unwrap();
    check_attribute(state, LOOKUP, "name", &report.name).unwrap();
    assert_eq!(
        state.get(LOOKUP).unwrap().id,
        state.get("digitalocean_ssh_key.foo").unwrap().id
    );
    assert_eq!(directory.len(), 1, "kept key should remain");
}

#[tokio::test]
async fn test_scenario_destroys_key_afterwards() {
    let directory = Arc::new(MemoryDirectory::starting_at(1000));
    let mut engine = LocalEngine::new(directory.clone());

    let report = run_lookup_scenario(&mut engine, directory.as_ref(), &ed25519_options())
        .await
        .expect("scenario should pass");

    assert!(report.destroyed);
    assert_eq!(report.record.id, 1000);
    assert!(directory.is_empty());
    assert!(engine.state().is_empty());
}

#[tokio::test]
async fn test_scenario_with_default_rsa_policy() {
    let directory = Arc::new(MemoryDirectory::new());
    let mut engine = LocalEngine::new(directory.clone());

    let report = run_lookup_scenario(&mut engine, directory.as_ref(), &ScenarioOptions::default())
        .await
        .expect("scenario should pass");

    assert!(report.public_key.as_str().starts_with("ssh-rsa "));
    assert_eq!(
        AuthorizedKeyText::parse(&report.record.public_key).unwrap(),
        report.public_key
    );
}

#[tokio::test]
async fn test_scenario_rejects_weak_key_size_before_touching_directory() {
    let directory = Arc::new(MemoryDirectory::new());
    let mut engine = LocalEngine::new(directory.clone());
    let options = ScenarioOptions {
        policy: KeyPolicy::rsa(1024),
        ..ScenarioOptions::default()
    };

    let err = run_lookup_scenario(&mut engine, directory.as_ref(), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::Key(_)));
    assert!(directory.is_empty());
}

// ============================================================================
// Failure paths
// ============================================================================

/// Engine that rewrites the lookup's public key after the real apply.
struct TamperingEngine {
    inner: LocalEngine<Arc<MemoryDirectory>>,
}

#[async_trait]
impl ApplyEngine for TamperingEngine {
    async fn apply(&mut self, config: &str) -> Result<State, EngineError> {
        let mut state = self.inner.apply(config).await?;
        if let Some(rs) = state.resources.get_mut(LOOKUP) {
            let key = rs.attributes.get("public_key").cloned().unwrap_or_default();
            rs.attributes
                .insert("public_key".to_string(), format!("{key}\n"));
        }
        Ok(state)
    }

    async fn destroy(&mut self) -> Result<(), EngineError> {
        self.inner.destroy().await
    }

    fn state(&self) -> &State {
        self.inner.state()
    }
}

#[tokio::test]
async fn test_trailing_newline_fails_check_and_still_destroys() {
    let directory = Arc::new(MemoryDirectory::new());
    let mut engine = TamperingEngine {
        inner: LocalEngine::new(directory.clone()),
    };

    let err = run_lookup_scenario(&mut engine, directory.as_ref(), &ed25519_options())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScenarioError::Verify(VerifyError::AttributeMismatch { ref attribute, .. })
            if attribute == "public_key"
    ));
    assert!(directory.is_empty(), "key should be destroyed after failure");
}

/// Engine whose second apply fails, as when the lookup finds nothing.
struct FailingSecondStep {
    inner: LocalEngine<Arc<MemoryDirectory>>,
    applies: usize,
}

#[async_trait]
impl ApplyEngine for FailingSecondStep {
    async fn apply(&mut self, config: &str) -> Result<State, EngineError> {
        self.applies += 1;
        if self.applies == 2 {
            return Err(EngineError::KeyNameNotFound("missing".to_string()));
        }
        self.inner.apply(config).await
    }

    async fn destroy(&mut self) -> Result<(), EngineError> {
        self.inner.destroy().await
    }

    fn state(&self) -> &State {
        self.inner.state()
    }
}

#[tokio::test]
async fn test_step_failure_reports_step_and_cleans_up() {
    let directory = Arc::new(MemoryDirectory::new());
    let mut engine = FailingSecondStep {
        inner: LocalEngine::new(directory.clone()),
        applies: 0,
    };

    let err = run_lookup_scenario(&mut engine, directory.as_ref(), &ed25519_options())
        .await
        .unwrap_err();

    assert!(matches!(err, ScenarioError::Step { step: 2, .. }));
    assert!(directory.is_empty());
}

// ============================================================================
// Verifier against engine output
// ============================================================================

#[tokio::test]
async fn test_verifier_against_applied_state() {
    let directory = Arc::new(MemoryDirectory::starting_at(42));
    let mut engine = LocalEngine::new(directory.clone());
    let (_, public_key) = keyprobe_ssh::generate_authorized_key(&KeyPolicy::ed25519()).unwrap();
    let (create, read) = keyprobe_core::scenario::scenario_configs("probe", &public_key);

    engine.apply(&create).await.unwrap();
    let state = engine.apply(&read).await.unwrap();
    assert_eq!(state.get(LOOKUP).unwrap().id, "42");

    let mut key = keyprobe_api::KeyRecord::default();
    check_key_exists(&state, LOOKUP, directory.as_ref(), &mut key)
        .await
        .unwrap();
    assert_eq!(key.id, 42);
    assert_eq!(key.name, "probe");

    // Once the key is gone the check surfaces the directory error.
    directory.delete(42).await.unwrap();
    let err = check_key_exists(&state, LOOKUP, directory.as_ref(), &mut key)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::ExternalCall(_)));
}
