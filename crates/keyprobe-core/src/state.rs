// ABOUTME: State table produced by an apply: resource address -> id and attributes
// ABOUTME: JSON serializable so checks can run against a saved state file

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use keyprobe_api::KeyRecord;

/// Recorded state of one resource or data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Opaque identifier; numeric for SSH keys.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        if key == "id" {
            return Some(&self.id);
        }
        self.attributes.get(key).map(String::as_str)
    }
}

impl From<&KeyRecord> for ResourceState {
    fn from(record: &KeyRecord) -> Self {
        ResourceState::new(record.id.to_string())
            .with_attribute("name", record.name.as_str())
            .with_attribute("public_key", record.public_key.as_str())
            .with_attribute("fingerprint", record.fingerprint.as_str())
    }
}

/// Addresses are `type.label` for managed resources and
/// `data.type.label` for data sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl State {
    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    pub fn insert(&mut self, address: impl Into<String>, resource: ResourceState) {
        self.resources.insert(address.into(), resource);
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        self.resources.remove(address)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Managed resources only (data sources excluded).
    pub fn managed(&self) -> impl Iterator<Item = (&String, &ResourceState)> {
        self.resources
            .iter()
            .filter(|(address, _)| !is_data_address(address))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn is_data_address(address: &str) -> bool {
    address.starts_with("data.")
}
