//! Runtime configuration.
//!
//! Everything is read from the environment (after loading `.env` with
//! `dotenvy`). The inference token has no fallback: a missing token is a
//! startup error.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Hosted model endpoint used when `PAPERLENS_MODEL_URL` is unset.
pub const DEFAULT_MODEL_URL: &str =
    "https://router.huggingface.co/hf-inference/models/mistral-community/Mistral-7B-Instruct-v0.1";

const DEFAULT_BIND: &str = "127.0.0.1:8501";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_MAX_STAGED_BYTES: usize = 100 * 1024 * 1024;

/// Settings for the text-generation endpoint.
#[derive(Clone)]
pub struct InferenceConfig {
    /// Bearer token for the endpoint.
    pub api_token: SecretString,
    /// Full URL of the model endpoint.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub temperature: f32,
    pub top_p: f32,
    /// Cap on cached responses. `None` keeps every response for the process lifetime.
    pub cache_max_entries: Option<usize>,
}

impl InferenceConfig {
    /// Config with the stock generation parameters and the given token.
    pub fn new(api_token: SecretString) -> Self {
        Self {
            api_token,
            endpoint: DEFAULT_MODEL_URL.to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            top_p: 0.95,
            cache_max_entries: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_token", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("cache_max_entries", &self.cache_max_entries)
            .finish()
    }
}

/// Settings for the web gateway and its sessions.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: SocketAddr,
    /// Sessions idle for longer than this are dropped.
    pub session_idle: Duration,
    /// How often the pruner looks for idle sessions.
    pub prune_interval: Duration,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
    /// Total bytes of files one session may have waiting for analysis.
    pub max_staged_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            session_idle: Duration::from_secs(3600),
            prune_interval: Duration::from_secs(300),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_staged_bytes: DEFAULT_MAX_STAGED_BYTES,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub inference: InferenceConfig,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("HF_API_TOKEN")
            .or_else(|| lookup("HUGGINGFACE_API_KEY"))
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("HF_API_TOKEN".to_string()))?;

        let mut inference = InferenceConfig::new(SecretString::from(token));
        if let Some(url) = lookup("PAPERLENS_MODEL_URL") {
            inference.endpoint = url;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "PAPERLENS_TIMEOUT_SECS")? {
            inference.timeout = Duration::from_secs(secs);
        }
        if let Some(t) = parse_var::<f32>(&lookup, "PAPERLENS_TEMPERATURE")? {
            inference.temperature = t;
        }
        if let Some(p) = parse_var::<f32>(&lookup, "PAPERLENS_TOP_P")? {
            inference.top_p = p;
        }
        inference.cache_max_entries = parse_var::<usize>(&lookup, "PAPERLENS_CACHE_MAX_ENTRIES")?;

        let mut gateway = GatewayConfig::default();
        let bind = lookup("PAPERLENS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        gateway.bind = bind.parse().map_err(|e| ConfigError::InvalidValue {
            key: "PAPERLENS_BIND".to_string(),
            message: format!("{bind}: {e}"),
        })?;
        if let Some(secs) = parse_var::<u64>(&lookup, "PAPERLENS_SESSION_IDLE_SECS")? {
            gateway.session_idle = Duration::from_secs(secs);
        }
        if let Some(bytes) = parse_var::<usize>(&lookup, "PAPERLENS_MAX_UPLOAD_BYTES")? {
            gateway.max_upload_bytes = bytes;
        }
        if let Some(bytes) = parse_var::<usize>(&lookup, "PAPERLENS_MAX_STAGED_BYTES")? {
            gateway.max_staged_bytes = bytes;
        }

        Ok(Self { inference, gateway })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw}: {e}"),
            }),
    }
}
