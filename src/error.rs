//! Error types for the composition pipeline.

use thiserror::Error;

/// Result type alias using the compmeta error type.
pub type Result<T> = std::result::Result<T, CompmetaError>;

/// Main error type for the composition pipeline.
///
/// Every variant renders to a human-readable message; fetch and aggregation
/// tasks surface these messages inside failure results rather than structured
/// error codes. Nothing here is retried internally - retry policy belongs to
/// the caller.
#[derive(Error, Debug)]
pub enum CompmetaError {
    /// Fetch request was issued without an API base URL
    #[error("API base URL is required")]
    MissingBaseUrl,

    /// Server answered with a non-success status
    #[error("HTTP {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },

    /// Transport-level failure from the underlying HTTP client
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Response bytes could not be decoded as text
    #[error("{0}")]
    Decode(String),

    /// Structured payload could not be parsed
    #[error(transparent)]
    Parse(#[from] serde_json::Error),

    /// Malformed aggregation batch (missing members, non-numeric spec id)
    #[error("invalid aggregation batch: {0}")]
    Aggregation(String),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
