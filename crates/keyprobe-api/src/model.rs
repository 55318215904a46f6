// ABOUTME: Wire models for the SSH key directory API
// ABOUTME: Key records, create/update bodies, and response envelopes

use serde::{Deserialize, Serialize};

/// Numeric identifier assigned by the directory service.
pub type KeyId = u64;

/// A stored SSH key as served by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: KeyId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: String,
}

/// Body for creating a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCreateRequest {
    pub name: String,
    pub public_key: String,
}

impl KeyCreateRequest {
    pub fn new(name: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_key: public_key.into(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct KeyUpdateRequest<'a> {
    pub name: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct KeyEnvelope {
    pub ssh_key: KeyRecord,
}

#[derive(Deserialize)]
pub(crate) struct KeyListEnvelope {
    #[serde(default)]
    pub ssh_keys: Vec<KeyRecord>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Deserialize, Default)]
pub(crate) struct Links {
    #[serde(default)]
    pub pages: Option<Pages>,
}

#[derive(Deserialize)]
pub(crate) struct Pages {
    #[serde(default)]
    pub next: Option<String>,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}
