//! Error types for provider OAuth operations

/// Errors from talking to the provider's OAuth endpoints.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced an HTTP response (DNS, connect, TLS, reset).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The token endpoint answered with a non-success status.
    #[error("token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Success status, but the body lacked the fields we need.
    #[error("malformed token response: {0}")]
    MalformedResponse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
