//! HTTP error types

/// Error type for target service calls
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// No response was received (connect failure, reset, timeout)
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The body of a 200 response did not have the expected shape
    #[error("Malformed response body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The client could not be built or the request could not be formed
    #[error("Client setup failed: {0}")]
    ConfigError(String),

    /// The endpoint answered with something other than 200
    #[error("{endpoint} returned {status}: {message}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// A 200 response whose envelope lacks a required field
    #[error("{endpoint} response is missing '{field}'")]
    MissingField { endpoint: String, field: String },
}

impl HttpError {
    /// True when the failure happened below HTTP (no response observed)
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::NetworkError(_))
    }
}
