use thiserror::Error;
use warren_client::ApiError;

#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// Create found a remote object already living at the natural key.
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: String, id: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    /// Any non-2xx answer from the management API other than an absence we
    /// know how to handle.
    #[error("management API returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    #[error("state error: {0}")]
    State(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for ProvisionerError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, body } => Self::Remote { status, body },
            ApiError::Decode(e) => Self::Serialization(e),
            other => Self::Transport(format_err_chain(&other)),
        }
    }
}

impl ProvisionerError {
    /// Prepend the resource address to messages that don't carry one.
    pub fn with_resource(self, addr: &str) -> Self {
        match self {
            Self::Validation(msg) => Self::Validation(format!("{addr}: {msg}")),
            Self::Transport(msg) => Self::Transport(format!("{addr}: {msg}")),
            Self::State(msg) => Self::State(format!("{addr}: {msg}")),
            other => other,
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// reqwest errors have a terse `Display` ("error sending request") with the
/// useful detail further down the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
