// ABOUTME: HTTP KeyDirectory for the DigitalOcean v2 account keys API
// ABOUTME: Bearer-token JSON client with pagination and typed error mapping

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::directory::KeyDirectory;
use crate::error::{ApiError, Result};
use crate::model::{
    ErrorBody, KeyCreateRequest, KeyEnvelope, KeyId, KeyListEnvelope, KeyRecord, KeyUpdateRequest,
};

pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";
pub const DEFAULT_PAGE_SIZE: u32 = 200;

const KEYS_PATH: &str = "v2/account/keys";

/// Directory client talking to the live API.
pub struct HttpDirectory {
    client: Client,
    base_url: Url,
    token: String,
    per_page: u32,
}

impl std::fmt::Debug for HttpDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirectory")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .field("per_page", &self.per_page)
            .finish()
    }
}

impl HttpDirectory {
    /// Create a client for `base_url` (e.g. "https://api.digitalocean.com").
    ///
    /// `timeout` bounds each HTTP request; there are no retries.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("keyprobe/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            token: token.into(),
            per_page: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn keys_url(&self) -> Result<Url> {
        self.base_url
            .join(KEYS_PATH)
            .map_err(|source| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                source,
            })
    }

    fn key_url(&self, id: KeyId) -> Result<Url> {
        let url = format!("{}/{}", self.keys_url()?.as_str().trim_end_matches('/'), id);
        Url::parse(&url).map_err(|source| ApiError::InvalidUrl { url, source })
    }

    async fn send(&self, request: RequestBuilder, id: Option<KeyId>) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%status, error = %e, "failed to read error body");
                format!("failed to read error body: {e}")
            }
        };
        Err(status_error(status, &body, id))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        id: Option<KeyId>,
    ) -> Result<T> {
        let response = self.send(request, id).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Ensure the base URL ends with a slash so relative joins keep its path.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|source| ApiError::InvalidUrl {
        url: trimmed.to_string(),
        source,
    })
}

fn status_error(status: StatusCode, body: &str, id: Option<KeyId>) -> ApiError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (error_id, message) = match parsed {
        Some(b) => (b.id, b.message),
        None => (String::new(), body.trim().to_string()),
    };

    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => ApiError::NotFound(id),
        (StatusCode::UNPROCESSABLE_ENTITY, _) => ApiError::Unprocessable(message),
        _ => ApiError::Status {
            status: status.as_u16(),
            id: error_id,
            message,
        },
    }
}

#[async_trait]
impl KeyDirectory for HttpDirectory {
    async fn get_by_id(&self, id: KeyId) -> Result<KeyRecord> {
        let url = self.key_url(id)?;
        debug!(%url, "GET ssh key");
        let envelope: KeyEnvelope = self.send_json(self.client.get(url), Some(id)).await?;
        Ok(envelope.ssh_key)
    }

    async fn list(&self) -> Result<Vec<KeyRecord>> {
        let mut url = self.keys_url()?;
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("per_page", &self.per_page.to_string());

        let mut keys = Vec::new();
        loop {
            debug!(%url, "GET ssh key page");
            let page: KeyListEnvelope = self.send_json(self.client.get(url.clone()), None).await?;
            keys.extend(page.ssh_keys);

            let next = page.links.pages.and_then(|p| p.next);
            match next {
                Some(next) if next != url.as_str() => {
                    url = Url::parse(&next).map_err(|source| ApiError::InvalidUrl {
                        url: next.clone(),
                        source,
                    })?;
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn create(&self, request: &KeyCreateRequest) -> Result<KeyRecord> {
        let url = self.keys_url()?;
        debug!(%url, name = %request.name, "POST ssh key");
        let envelope: KeyEnvelope = self
            .send_json(self.client.post(url).json(request), None)
            .await?;
        Ok(envelope.ssh_key)
    }

    async fn rename(&self, id: KeyId, name: &str) -> Result<KeyRecord> {
        let url = self.key_url(id)?;
        debug!(%url, name, "PUT ssh key");
        let envelope: KeyEnvelope = self
            .send_json(
                self.client.put(url).json(&KeyUpdateRequest { name }),
                Some(id),
            )
            .await?;
        Ok(envelope.ssh_key)
    }

    async fn delete(&self, id: KeyId) -> Result<()> {
        let url = self.key_url(id)?;
        debug!(%url, "DELETE ssh key");
        self.send(self.client.delete(url), Some(id)).await?;
        Ok(())
    }
}
