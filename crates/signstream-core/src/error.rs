//! Error types for the signstream recognition core

use thiserror::Error;

/// Result type alias for recognition operations
pub type SignResult<T> = Result<T, SignError>;

/// Errors that can occur in the landmark-to-sentence pipeline
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Provider {provider} is not configured (missing credential)")]
    MissingCredential { provider: &'static str },

    #[error("Provider {provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("Provider {0} timed out")]
    ProviderTimeout(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
