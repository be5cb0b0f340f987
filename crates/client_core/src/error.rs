use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server rejected request ({status}): {}", .error.message)]
    Api { status: u16, error: ApiError },
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid server url '{0}'")]
    InvalidUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("event feed failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl ClientError {
    /// The API error code when the server sent a structured rejection.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { error, .. } => Some(error.code),
            _ => None,
        }
    }
}
