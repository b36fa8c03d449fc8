//! Pachca-related errors.

use thiserror::Error;

/// Errors that can occur when interacting with Pachca.
#[derive(Debug, Error)]
pub enum PachcaError {
    /// HTTP request failed before a response arrived.
    #[error("Pachca request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Pachca response error: {0}")]
    Response(String),

    /// Pachca API returned a non-success status.
    #[error("Pachca API returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for the logs.
        body: String,
    },

    /// Invalid webhook signature or stale webhook timestamp.
    #[error("Invalid Pachca signature: {0}")]
    InvalidSignature(String),
}
