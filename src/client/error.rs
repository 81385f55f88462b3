//! Backend client error types.

use thiserror::Error;

/// Errors returned by a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The call never reached the backend or no response came back.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend responded with a failure status.
    #[error("service error ({status}): {message}")]
    Service {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The backend responded but the body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether the failure happened below the service layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Decode(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else if e.is_timeout() {
            ClientError::Transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            ClientError::Transport(format!("cannot connect to backend: {}", e))
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
