//! Error types for the model service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ServiceError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ServiceError::Auth(message),
            429 => ServiceError::Quota(message),
            _ => ServiceError::Api { status, message },
        }
    }
}
