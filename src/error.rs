//! Error type for remote SLS operations.

/// Error returned by a remote call. Failures are surfaced to the caller
/// unchanged, with no local retry or classification.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SlsError {
    /// Non-successful HTTP response from the SLS service, body carried
    /// verbatim as the message.
    #[error("sls responded [{status}] {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        message: Box<str>,
    },
    /// Connection or protocol level HTTP client error.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Malformed response body from a read or listing call.
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}
