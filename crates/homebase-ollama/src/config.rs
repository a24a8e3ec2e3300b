//! Client configuration.

use std::time::Duration;

use crate::DEFAULT_OLLAMA_URL;

/// Overall timeout for one generation call.
pub const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for the model listing call.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Ollama client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    /// Server base URL, without a trailing slash
    pub base_url: String,
    /// Bound on a whole generation call, connect through last chunk
    pub generate_timeout: Duration,
    /// Bound on the model listing call
    pub list_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            generate_timeout: DEFAULT_GENERATE_TIMEOUT,
            list_timeout: DEFAULT_LIST_TIMEOUT,
        }
    }
}

impl OllamaConfig {
    /// Create config from environment variables.
    ///
    /// - `OLLAMA_HOST` - server address (default: `http://localhost:11434`)
    /// - `HOMEBASE_TIMEOUT_SECS` - generation timeout in seconds (default: 600)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("OLLAMA_HOST")
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_base_url(&v))
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let generate_timeout = lookup("HOMEBASE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GENERATE_TIMEOUT);

        Self {
            base_url,
            generate_timeout,
            list_timeout: DEFAULT_LIST_TIMEOUT,
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> OllamaConfigBuilder {
        OllamaConfigBuilder::default()
    }
}

/// Accept `host:port` as well as full URLs, and drop trailing slashes.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct OllamaConfigBuilder {
    config: OllamaConfig,
}

impl OllamaConfigBuilder {
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self {
        self.config.base_url = normalize_base_url(url.as_ref());
        self
    }

    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout = timeout;
        self
    }

    pub fn list_timeout(mut self, timeout: Duration) -> Self {
        self.config.list_timeout = timeout;
        self
    }

    pub fn build(self) -> OllamaConfig {
        self.config
    }
}
