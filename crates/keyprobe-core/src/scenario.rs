// ABOUTME: End-to-end lookup scenario: create a key, read it back by name, verify
// ABOUTME: Two sequential apply steps followed by existence, attribute, and destroy checks

use tracing::{info, warn};
use uuid::Uuid;

use keyprobe_api::{KeyDirectory, KeyId, KeyRecord};
use keyprobe_ssh::{generate_authorized_key, AuthorizedKeyText, KeyPolicy};

use crate::engine::ApplyEngine;
use crate::error::ScenarioError;
use crate::fragment::{LookupFragment, ResourceFragment, KEY_RESOURCE_TYPE};
use crate::verify::{check_attribute, check_key_exists};

pub const RESOURCE_LABEL: &str = "foo";
pub const LOOKUP_LABEL: &str = "foobar";
pub const DEFAULT_NAME_PREFIX: &str = "keyprobe-acc";

#[derive(Debug, Clone)]
pub struct ScenarioOptions {
    pub policy: KeyPolicy,
    pub name_prefix: String,
    /// Leave the created key in place instead of destroying it.
    pub keep: bool,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            policy: KeyPolicy::default(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            keep: false,
        }
    }
}

/// Outcome of a successful scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub public_key: AuthorizedKeyText,
    /// Directory record read during verification.
    pub record: KeyRecord,
    pub destroyed: bool,
}

/// Unique key name, e.g. `keyprobe-acc-6f1c...`.
pub fn random_key_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// The two configurations applied by the scenario: the resource alone,
/// then the resource plus a lookup that references its name.
pub fn scenario_configs(name: &str, public_key: &AuthorizedKeyText) -> (String, String) {
    let resource = ResourceFragment::new(RESOURCE_LABEL, name, public_key.as_str());
    let lookup = LookupFragment::new(LOOKUP_LABEL, resource.name_ref());
    let create = resource.to_string();
    let read = format!("{create}\n{lookup}");
    (create, read)
}

/// Create a fresh key through `engine`, look it up by name, and check the
/// lookup against `directory`. The key is destroyed afterwards unless
/// `options.keep` is set, including when a step or check failed.
pub async fn run_lookup_scenario<E, D>(
    engine: &mut E,
    directory: &D,
    options: &ScenarioOptions,
) -> Result<ScenarioReport, ScenarioError>
where
    E: ApplyEngine + ?Sized,
    D: KeyDirectory + ?Sized,
{
    let (_private_key, public_key) = generate_authorized_key(&options.policy)?;
    let name = random_key_name(&options.name_prefix);
    info!(%name, algorithm = %options.policy.algorithm, "starting lookup scenario");

    let outcome = run_steps(engine, directory, &name, &public_key).await;

    if options.keep {
        return outcome.map(|record| ScenarioReport {
            name,
            public_key,
            record,
            destroyed: false,
        });
    }

    let destroyed = engine.destroy().await;
    let record = match (outcome, destroyed) {
        (Ok(record), Ok(())) => record,
        (Ok(_), Err(e)) => return Err(ScenarioError::Destroy(e)),
        (Err(e), Ok(())) => return Err(e),
        (Err(e), Err(destroy_error)) => {
            warn!(error = %destroy_error, "cleanup after failed scenario also failed");
            return Err(e);
        }
    };

    check_destroyed(directory, record.id).await?;
    info!(%name, id = record.id, "lookup scenario passed");

    Ok(ScenarioReport {
        name,
        public_key,
        record,
        destroyed: true,
    })
}

async fn run_steps<E, D>(
    engine: &mut E,
    directory: &D,
    name: &str,
    public_key: &AuthorizedKeyText,
) -> Result<KeyRecord, ScenarioError>
where
    E: ApplyEngine + ?Sized,
    D: KeyDirectory + ?Sized,
{
    let (create, read) = scenario_configs(name, public_key);
    let address = format!("data.{KEY_RESOURCE_TYPE}.{LOOKUP_LABEL}");

    info!(step = 1, "applying key resource");
    engine
        .apply(&create)
        .await
        .map_err(|source| ScenarioError::Step { step: 1, source })?;

    info!(step = 2, "applying key resource with lookup");
    let state = engine
        .apply(&read)
        .await
        .map_err(|source| ScenarioError::Step { step: 2, source })?;

    let mut record = KeyRecord::default();
    check_key_exists(&state, &address, directory, &mut record).await?;
    check_attribute(&state, &address, "name", name)?;
    check_attribute(&state, &address, "public_key", public_key.as_str())?;

    Ok(record)
}

async fn check_destroyed<D>(directory: &D, id: KeyId) -> Result<(), ScenarioError>
where
    D: KeyDirectory + ?Sized,
{
    match directory.get_by_id(id).await {
        Ok(_) => Err(ScenarioError::StillExists(id)),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(ScenarioError::Api(e)),
    }
}
