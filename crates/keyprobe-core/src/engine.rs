// ABOUTME: Apply engine seam and a local engine that reconciles SSH key fragments
// ABOUTME: Creates, renames, replaces, and deletes keys, then reads lookups by name

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use keyprobe_api::{KeyCreateRequest, KeyDirectory, KeyId, KeyRecord};

use crate::error::EngineError;
use crate::fragment::{self, Block, Expr, KEY_RESOURCE_TYPE};
use crate::state::{ResourceState, State};

type Result<T> = std::result::Result<T, EngineError>;

/// Something that reconciles configuration text against live resources.
#[async_trait]
pub trait ApplyEngine: Send {
    /// Apply `config` and return the resulting state.
    async fn apply(&mut self, config: &str) -> Result<State>;

    /// Delete every managed resource recorded in the state.
    async fn destroy(&mut self) -> Result<()>;

    fn state(&self) -> &State;
}

/// Engine that only understands `digitalocean_ssh_key` resources and data
/// sources, backed by a [`KeyDirectory`].
pub struct LocalEngine<D> {
    directory: D,
    state: State,
}

struct DesiredKey {
    address: String,
    name: String,
    public_key: String,
}

impl<D: KeyDirectory> LocalEngine<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            state: State::default(),
        }
    }

    /// Start from previously recorded state.
    pub fn with_state(directory: D, state: State) -> Self {
        Self { directory, state }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    async fn create(&self, desired: &DesiredKey) -> Result<KeyRecord> {
        let record = self
            .directory
            .create(&KeyCreateRequest::new(&desired.name, &desired.public_key))
            .await?;
        info!(address = %desired.address, id = record.id, "created ssh key");
        Ok(record)
    }

    async fn reconcile(&self, desired: &DesiredKey) -> Result<KeyRecord> {
        let Some(prior) = self.state.get(&desired.address) else {
            return self.create(desired).await;
        };
        let id = parse_key_id(&desired.address, &prior.id)?;

        let current = match self.directory.get_by_id(id).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                warn!(address = %desired.address, id, "ssh key disappeared, recreating");
                return self.create(desired).await;
            }
            Err(e) => return Err(e.into()),
        };

        if current.public_key.trim() != desired.public_key.trim() {
            info!(address = %desired.address, id, "public key changed, replacing");
            self.directory.delete(id).await?;
            return self.create(desired).await;
        }

        if current.name != desired.name {
            info!(address = %desired.address, id, name = %desired.name, "renaming ssh key");
            return Ok(self.directory.rename(id, &desired.name).await?);
        }

        debug!(address = %desired.address, id, "ssh key unchanged");
        Ok(current)
    }

    async fn lookup(&self, address: &str, name: &str) -> Result<KeyRecord> {
        let mut matches = self.directory.find_by_name(name).await?;
        match matches.len() {
            0 => Err(EngineError::KeyNameNotFound(name.to_string())),
            1 => {
                let record = matches.remove(0);
                debug!(address, id = record.id, "read ssh key by name");
                Ok(record)
            }
            count => Err(EngineError::AmbiguousKeyName {
                name: name.to_string(),
                count,
            }),
        }
    }
}

#[async_trait]
impl<D: KeyDirectory> ApplyEngine for LocalEngine<D> {
    async fn apply(&mut self, config: &str) -> Result<State> {
        let document = fragment::parse(config)?;

        let mut resources = Vec::new();
        let mut lookups = Vec::new();
        let mut seen = BTreeSet::new();
        for block in &document.blocks {
            let address = block_address(block)?;
            if !seen.insert(address.clone()) {
                return Err(EngineError::DuplicateAddress(address));
            }
            match block.kind.as_str() {
                "resource" => resources.push((address, block)),
                _ => lookups.push((address, block)),
            }
        }

        let mut next = State::default();
        for (address, block) in resources {
            check_attributes(&address, block, &["name", "public_key"])?;
            let desired = DesiredKey {
                name: required(&address, block, "name", &next)?,
                public_key: required(&address, block, "public_key", &next)?,
                address,
            };
            let record = self.reconcile(&desired).await?;
            let resource = ResourceState::from(&record);
            // Track each key as soon as it exists so a later failure can't orphan it.
            self.state.insert(desired.address.clone(), resource.clone());
            next.insert(desired.address, resource);
        }

        let removed: Vec<(String, String)> = self
            .state
            .managed()
            .filter(|(address, _)| next.get(address).is_none())
            .map(|(address, rs)| (address.clone(), rs.id.clone()))
            .collect();
        // A removed key stays tracked until its delete succeeds.
        for (address, id) in removed {
            let id = parse_key_id(&address, &id)?;
            match self.directory.delete(id).await {
                Ok(()) => info!(%address, id, "deleted ssh key"),
                Err(e) if e.is_not_found() => warn!(%address, id, "ssh key already gone"),
                Err(e) => return Err(e.into()),
            }
            self.state.remove(&address);
        }
        self.state = next.clone();

        for (address, block) in lookups {
            check_attributes(&address, block, &["name"])?;
            let name = required(&address, block, "name", &next)?;
            let record = self.lookup(&address, &name).await?;
            next.insert(address, ResourceState::from(&record));
        }

        self.state = next.clone();
        Ok(next)
    }

    async fn destroy(&mut self) -> Result<()> {
        let managed: Vec<(String, String)> = self
            .state
            .managed()
            .map(|(address, rs)| (address.clone(), rs.id.clone()))
            .collect();

        let mut first_error = None;
        for (address, id) in managed {
            let outcome = match parse_key_id(&address, &id) {
                Ok(id) => self.directory.delete(id).await.map_err(EngineError::from),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => {
                    info!(%address, "destroyed ssh key");
                    self.state.remove(&address);
                }
                Err(EngineError::Api(e)) if e.is_not_found() => {
                    warn!(%address, "ssh key already gone");
                    self.state.remove(&address);
                }
                Err(e) => {
                    warn!(%address, error = %e, "failed to destroy ssh key");
                    first_error.get_or_insert(e);
                }
            }
        }

        self.state.resources.retain(|address, _| !crate::state::is_data_address(address));
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn state(&self) -> &State {
        &self.state
    }
}

fn block_address(block: &Block) -> Result<String> {
    let prefix = match block.kind.as_str() {
        "resource" => "",
        "data" => "data.",
        other => return Err(EngineError::UnsupportedBlock(other.to_string())),
    };
    let [resource_type, label] = block.labels.as_slice() else {
        return Err(EngineError::MalformedBlock {
            kind: block.kind.clone(),
            reason: format!("expected 2 labels, found {}", block.labels.len()),
        });
    };
    if resource_type != KEY_RESOURCE_TYPE {
        return Err(EngineError::UnsupportedType(resource_type.clone()));
    }
    Ok(format!("{prefix}{resource_type}.{label}"))
}

fn check_attributes(address: &str, block: &Block, allowed: &[&str]) -> Result<()> {
    match block
        .attributes
        .iter()
        .find(|(name, _)| !allowed.contains(&name.as_str()))
    {
        Some((name, _)) => Err(EngineError::UnknownAttribute {
            address: address.to_string(),
            attribute: name.clone(),
        }),
        None => Ok(()),
    }
}

fn required(address: &str, block: &Block, attribute: &str, state: &State) -> Result<String> {
    let expr = block
        .attribute(attribute)
        .ok_or_else(|| EngineError::MissingAttribute {
            address: address.to_string(),
            attribute: attribute.to_string(),
        })?;
    evaluate(address, expr, state)
}

/// Resolve a literal or a `type.label.attr` / `data.type.label.attr` reference.
fn evaluate(address: &str, expr: &Expr, state: &State) -> Result<String> {
    let parts = match expr {
        Expr::Literal(value) => return Ok(value.clone()),
        Expr::Reference(parts) => parts,
    };

    let unresolved = || EngineError::UnresolvedReference {
        address: address.to_string(),
        reference: parts.join("."),
    };
    let (target, attribute) = match parts.as_slice() {
        [data, ty, label, attr] if data == "data" => (format!("data.{ty}.{label}"), attr),
        [ty, label, attr] => (format!("{ty}.{label}"), attr),
        _ => return Err(unresolved()),
    };

    state
        .get(&target)
        .and_then(|rs| rs.attribute(attribute))
        .map(str::to_string)
        .ok_or_else(unresolved)
}

fn parse_key_id(address: &str, id: &str) -> Result<KeyId> {
    id.parse().map_err(|_| EngineError::CorruptState {
        address: address.to_string(),
        id: id.to_string(),
    })
}
