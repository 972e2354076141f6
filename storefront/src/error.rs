//! Error types for the storefront client.

use thiserror::Error;

/// Errors from the basket-creation call.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// The HTTP request could not be sent.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The storefront answered with a non-success status.
    #[error("storefront error (status {status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        message: String,
    },

    /// The storefront answered 2xx but not with JSON.
    #[error("storefront did not return JSON (content-type: {content_type})")]
    NotJson {
        /// The content type actually returned
        content_type: String,
    },

    /// The JSON body did not parse as a basket record.
    #[error("response parsing failed: {0}")]
    ResponseParseFailed(String),
}
