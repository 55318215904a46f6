// ABOUTME: Configuration loading for keyprobe
// ABOUTME: TOML file with defaults, environment overrides, and a typed client accessor

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use keyprobe_api::{HttpDirectory, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
use keyprobe_ssh::KeyPolicy;

use crate::error::ConfigError;
use crate::scenario::{ScenarioOptions, DEFAULT_NAME_PREFIX};

pub const TOKEN_ENV: &str = "DIGITALOCEAN_TOKEN";
pub const TOKEN_ENV_FALLBACK: &str = "DIGITALOCEAN_ACCESS_TOKEN";
pub const API_URL_ENV: &str = "DIGITALOCEAN_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub api: ApiConfig,
    /// Key pair generation policy
    pub key: KeyPolicy,
    pub scenario: ScenarioConfig,
}

/// Directory service connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. "https://api.digitalocean.com"
    pub url: String,
    /// Bearer token
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Page size used when listing keys
    pub per_page: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 30,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("per_page", &self.per_page)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Prefix for generated key names
    pub name_prefix: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

impl ProbeConfig {
    /// Default config file location (~/.config/keyprobe/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config").join("keyprobe").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(TOKEN_ENV).or_else(|| non_empty(TOKEN_ENV_FALLBACK)) {
            self.api.token = Some(token);
        }
        if let Some(url) = non_empty(API_URL_ENV) {
            self.api.url = url;
        }
    }

    /// Apply command-line overrides; these win over everything else.
    pub fn with_overrides(mut self, api_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api.url = url;
        }
        if let Some(token) = token {
            self.api.token = Some(token);
        }
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.api
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Build the HTTP directory client described by this configuration.
    pub fn directory(&self) -> Result<HttpDirectory, ConfigError> {
        let token = self.token().ok_or(ConfigError::MissingToken)?;
        let directory = HttpDirectory::new(
            &self.api.url,
            token,
            Duration::from_secs(self.api.timeout_secs),
        )?;
        Ok(directory.with_page_size(self.api.per_page))
    }

    pub fn scenario_options(&self) -> ScenarioOptions {
        ScenarioOptions {
            policy: self.key,
            name_prefix: self.scenario.name_prefix.clone(),
            keep: false,
        }
    }
}
