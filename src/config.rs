//! Usher configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main usher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsherConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// MOTD cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Provider webhook configuration
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Origins allowed to call the API (empty = any origin)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

/// Session provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider backend to use
    pub backend: ProviderBackend,

    /// Base URL of the provider REST API
    pub url: String,

    /// API secret for the provider REST API
    pub secret: String,

    /// Request timeout in seconds for provider calls
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: ProviderBackend::default(),
            url: "https://localhost:4443".to_string(),
            secret: String::new(),
            timeout_secs: 5,
        }
    }
}

/// Session provider backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderBackend {
    /// OpenVidu-compatible REST API (default)
    #[default]
    Openvidu,

    /// In-process sessions, for development and tests
    Memory,
}

/// MOTD cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache backend to use
    pub backend: CacheBackend,

    /// Redis connection URL
    pub url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Cache backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Redis (default)
    #[default]
    Redis,

    /// In-process map with TTL, for development and tests
    Memory,
}

/// Provider webhook configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret the provider presents in the Authorization header
    pub secret: String,
}

impl UsherConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Overlay environment variables onto this configuration.
    ///
    /// Recognized variables: `USHER_PROVIDER_URL`, `USHER_PROVIDER_SECRET`,
    /// `USHER_CACHE_URL`, `USHER_WEBHOOK_SECRET`, and `USHER_ALLOWED_ORIGINS`
    /// (comma-separated list).
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("USHER_PROVIDER_URL") {
            self.provider.url = v;
        }
        if let Ok(v) = std::env::var("USHER_PROVIDER_SECRET") {
            self.provider.secret = v;
        }
        if let Ok(v) = std::env::var("USHER_CACHE_URL") {
            self.cache.url = v;
        }
        if let Ok(v) = std::env::var("USHER_WEBHOOK_SECRET") {
            self.webhook.secret = v;
        }
        if let Ok(v) = std::env::var("USHER_ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    /// Check settings the selected backends cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.provider.backend == ProviderBackend::Openvidu {
            if self.provider.url.is_empty() {
                return Err(Error::Config("provider.url must be set".to_string()));
            }
            if self.provider.secret.is_empty() {
                return Err(Error::Config(
                    "provider.secret must be set (or USHER_PROVIDER_SECRET)".to_string(),
                ));
            }
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.url.is_empty() {
            return Err(Error::Config("cache.url must be set".to_string()));
        }
        // The webhook route is always mounted; an empty secret would let
        // header-less deliveries through.
        if self.webhook.secret.is_empty() {
            return Err(Error::Config(
                "webhook.secret must be set (or USHER_WEBHOOK_SECRET)".to_string(),
            ));
        }
        Ok(())
    }
}
