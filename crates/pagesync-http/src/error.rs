//! Error types for pagesync-http.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while issuing a buffered HTTP call.
///
/// Non-2xx responses are not errors at this layer; they are returned to the
/// caller with their status intact.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request method is not a valid HTTP token.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A request header could not be encoded.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    /// Network error (connection refused, TLS failure, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
