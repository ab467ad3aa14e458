use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The management API answered with a non-2xx status.
    #[error("management API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// 404 is the one status the management API uses for "no such object".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint must not be empty")]
    MissingEndpoint,

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("username must not be empty")]
    MissingUsername,

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("failed to read CA certificate {path}: {source}")]
    CaCert {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
