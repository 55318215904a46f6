// ABOUTME: KeyDirectory trait shared by the HTTP and in-memory clients
// ABOUTME: Read, list, create, rename, and delete stored SSH keys

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{KeyCreateRequest, KeyId, KeyRecord};

/// System of record for named SSH keys.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    /// Fetch one key by its numeric id.
    async fn get_by_id(&self, id: KeyId) -> Result<KeyRecord>;

    /// List every key on the account.
    async fn list(&self) -> Result<Vec<KeyRecord>>;

    async fn create(&self, request: &KeyCreateRequest) -> Result<KeyRecord>;

    async fn rename(&self, id: KeyId, name: &str) -> Result<KeyRecord>;

    async fn delete(&self, id: KeyId) -> Result<()>;

    /// All keys whose name matches exactly.
    async fn find_by_name(&self, name: &str) -> Result<Vec<KeyRecord>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|key| key.name == name)
            .collect())
    }
}

#[async_trait]
impl<T: KeyDirectory + ?Sized> KeyDirectory for Arc<T> {
    async fn get_by_id(&self, id: KeyId) -> Result<KeyRecord> {
        (**self).get_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<KeyRecord>> {
        (**self).list().await
    }

    async fn create(&self, request: &KeyCreateRequest) -> Result<KeyRecord> {
        (**self).create(request).await
    }

    async fn rename(&self, id: KeyId, name: &str) -> Result<KeyRecord> {
        (**self).rename(id, name).await
    }

    async fn delete(&self, id: KeyId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<KeyRecord>> {
        (**self).find_by_name(name).await
    }
}
