use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_ENDPOINT: &str = "http://localhost:15672";
const DEFAULT_USERNAME: &str = "guest";

/// Connection settings for the management API.
///
/// Built once at startup and handed to [`HttpClient::new`](crate::HttpClient::new);
/// every resource kind shares the resulting client read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub endpoint: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,
    /// PEM bundle used to verify the server certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cacert_file: Option<String>,
    /// Overall request timeout. `None` leaves reqwest's default in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            insecure: false,
            cacert_file: None,
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `RABBITMQ_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|var| std::env::var(var).ok())
    }

    /// Read a JSON config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "client config loaded");
        config.with_env_overrides(|var| std::env::var(var).ok())
    }

    /// Overlay values from `lookup`. Takes a lookup function so tests don't
    /// have to mutate the process environment.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("RABBITMQ_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(username) = lookup("RABBITMQ_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("RABBITMQ_PASSWORD") {
            self.password = password;
        }
        if let Some(insecure) = lookup("RABBITMQ_INSECURE") {
            self.insecure = parse_bool("RABBITMQ_INSECURE", &insecure)?;
        }
        if let Some(cacert) = lookup("RABBITMQ_CACERT") {
            self.cacert_file = Some(cacert).filter(|c| !c.is_empty());
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        let url = reqwest::Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.username.is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        Ok(())
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}
