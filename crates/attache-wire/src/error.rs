//! Error types for attache-wire

use thiserror::Error;

/// Result type alias using attache-wire Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the agent service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status
    #[error("agent service returned status {status}")]
    Status { status: u16 },

    /// Thread creation answered without a usable thread id
    #[error("agent service returned no thread id")]
    MissingThreadId,

    /// File type outside the upload allow-list
    #[error("unsupported file type: {media_type} (supported: PDF, Excel, CSV)")]
    UnsupportedAttachment { media_type: String },
}
