// ABOUTME: In-process KeyDirectory used by tests and dry runs
// ABOUTME: Mirrors the service's validation of names, key text, and duplicates

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::directory::KeyDirectory;
use crate::error::{ApiError, Result};
use crate::model::{KeyCreateRequest, KeyId, KeyRecord};

struct MemoryState {
    next_id: KeyId,
    keys: BTreeMap<KeyId, KeyRecord>,
}

/// Directory that keeps keys in memory with sequential ids.
pub struct MemoryDirectory {
    state: Mutex<MemoryState>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Directory whose first created key receives `first_id`.
    pub fn starting_at(first_id: KeyId) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: first_id,
                keys: BTreeMap::new(),
            }),
        }
    }

    /// Store a record verbatim, bypassing validation.
    pub fn insert(&self, record: KeyRecord) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(record.id.saturating_add(1));
        state.keys.insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.lock().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ApiError::Unprocessable("name is required".to_string()));
    }
    Ok(())
}

#[async_trait]
impl KeyDirectory for MemoryDirectory {
    async fn get_by_id(&self, id: KeyId) -> Result<KeyRecord> {
        self.lock()
            .keys
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<KeyRecord>> {
        Ok(self.lock().keys.values().cloned().collect())
    }

    async fn create(&self, request: &KeyCreateRequest) -> Result<KeyRecord> {
        validate_name(&request.name)?;

        let public_key = keyprobe_ssh::PublicKey::from_openssh(request.public_key.trim())
            .map_err(|e| ApiError::Unprocessable(format!("invalid public key: {e}")))?;
        let fingerprint = keyprobe_ssh::compute_fingerprint(&public_key)
            .map_err(|e| ApiError::Unprocessable(e.to_string()))?;

        let mut state = self.lock();
        if state.keys.values().any(|k| k.fingerprint == fingerprint) {
            return Err(ApiError::Unprocessable(
                "SSH Key is already in use on your account".to_string(),
            ));
        }

        let id = state.next_id;
        if state.keys.contains_key(&id) {
            return Err(ApiError::Unprocessable("no key ids left".to_string()));
        }
        state.next_id = id.saturating_add(1);

        let record = KeyRecord {
            id,
            name: request.name.clone(),
            public_key: request.public_key.clone(),
            fingerprint,
        };
        state.keys.insert(id, record.clone());
        debug!(id, name = %record.name, "created key");

        Ok(record)
    }

    async fn rename(&self, id: KeyId, name: &str) -> Result<KeyRecord> {
        validate_name(name)?;

        let mut state = self.lock();
        let record = state.keys.get_mut(&id).ok_or(ApiError::NotFound(id))?;
        record.name = name.to_string();
        Ok(record.clone())
    }

    async fn delete(&self, id: KeyId) -> Result<()> {
        self.lock()
            .keys
            .remove(&id)
            .map(|_| ())
            .ok_or(ApiError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyprobe_ssh::{generate_authorized_key, KeyPolicy};

    fn public_key_text() -> String {
        let (_, text) = generate_authorized_key(&KeyPolicy::ed25519()).unwrap();
        text.into_string()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let dir = MemoryDirectory::starting_at(40);
        let a = dir
            .create(&KeyCreateRequest::new("a", public_key_text()))
            .await
            .unwrap();
        let b = dir
            .create(&KeyCreateRequest::new("b", public_key_text()))
            .await
            .unwrap();
        assert_eq!(a.id, 40);
        assert_eq!(b.id, 41);
        assert_eq!(a.fingerprint.len(), 64);
        assert_eq!(dir.len(), 2);
    }

    #[tokio::test]
    async fn test_create_keeps_public_key_verbatim() {
        let dir = MemoryDirectory::new();
        let text = public_key_text();
        let record = dir
            .create(&KeyCreateRequest::new("foo", text.clone()))
            .await
            .unwrap();
        assert_eq!(record.public_key, text);
        assert_eq!(dir.get_by_id(record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_key() {
        let dir = MemoryDirectory::new();
        let text = public_key_text();
        dir.create(&KeyCreateRequest::new("one", text.clone()))
            .await
            .unwrap();
        let err = dir
            .create(&KeyCreateRequest::new("two", text))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unprocessable(msg) if msg.contains("already in use")));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_key_and_blank_name() {
        let dir = MemoryDirectory::new();
        let err = dir
            .create(&KeyCreateRequest::new("foo", "ssh-rsa nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unprocessable(_)));

        let err = dir
            .create(&KeyCreateRequest::new("  ", public_key_text()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unprocessable(_)));
        assert!(dir.is_empty());
    }

    #[tokio::test]
    async fn test_insert_at_max_id_does_not_overflow() {
        let dir = MemoryDirectory::new();
        dir.insert(KeyRecord {
            id: KeyId::MAX,
            name: "last".to_string(),
            ..KeyRecord::default()
        });
        assert_eq!(dir.get_by_id(KeyId::MAX).await.unwrap().name, "last");

        // The id space is exhausted, so creating must fail instead of overwriting.
        let err = dir
            .create(&KeyCreateRequest::new("next", public_key_text()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unprocessable(_)));
        assert_eq!(dir.get_by_id(KeyId::MAX).await.unwrap().name, "last");
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let dir = MemoryDirectory::new();
        let err = dir.get_by_id(7).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(7)));
    }

    #[tokio::test]
    async fn test_rename_and_find_by_name() {
        let dir = MemoryDirectory::new();
        let record = dir
            .create(&KeyCreateRequest::new("before", public_key_text()))
            .await
            .unwrap();

        dir.rename(record.id, "after").await.unwrap();

        assert!(dir.find_by_name("before").await.unwrap().is_empty());
        let found = dir.find_by_name("after").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, record.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = MemoryDirectory::new();
        let record = dir
            .create(&KeyCreateRequest::new("gone", public_key_text()))
            .await
            .unwrap();

        dir.delete(record.id).await.unwrap();
        assert!(dir.get_by_id(record.id).await.unwrap_err().is_not_found());
        assert!(matches!(
            dir.delete(record.id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_insert_advances_next_id() {
        let dir = MemoryDirectory::new();
        dir.insert(KeyRecord {
            id: 42,
            name: "seeded".to_string(),
            ..Default::default()
        });
        let created = dir
            .create(&KeyCreateRequest::new("next", public_key_text()))
            .await
            .unwrap();
        assert_eq!(created.id, 43);
    }
}
