//! Error types for the prediction client.

use thiserror::Error;

/// Failure of a single outbound HTTP call.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Transport error: {0}")]
    Other(String),
}

/// Prediction client errors.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Malformed model identifier {0:?}: expected \"<path>:<version>\"")]
    MalformedIdentifier(String),
    #[error("Failed to create prediction (HTTP {status}): {body}")]
    CreateFailed { status: u16, body: String },
    #[error("Failed to fetch (HTTP {status}): {body}")]
    FetchFailed { status: u16, body: String },
    #[error("Failed to cancel prediction (HTTP {status}): {body}")]
    CancelFailed { status: u16, body: String },
    #[error("Max retries exceeded after {0} attempts")]
    RetriesExhausted(u32),
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}
