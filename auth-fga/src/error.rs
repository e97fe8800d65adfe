use thiserror::Error;

#[derive(Error, Debug)]
pub enum FgaError {
    /// The engine could not be reached, or the connection failed mid-request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The engine answered with a non-success status or a per-item error.
    #[error("Remote error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Batch check item {correlation_id} failed: {message}")]
    BatchItem {
        correlation_id: String,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid authorization model: {0}")]
    InvalidModel(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl FgaError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// True for failures that originate at the remote-call boundary.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Remote { .. }
                | Self::BatchItem { .. }
                | Self::UnexpectedResponse(_)
        )
    }
}

impl From<reqwest::Error> for FgaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FgaError::UnexpectedResponse(err.to_string())
        } else {
            FgaError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, FgaError>;
