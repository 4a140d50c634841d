//! Error types for the taskwall-deck crate.
//!
//! Messages are stable and safe to show on the display's status line.
//! Credentials never appear in error text.

/// Errors that can occur while talking to the board service or
/// aggregating its data.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with a non-success status code.
    #[error("service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body, or the raw body.
        message: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for taskwall-deck results.
pub type Result<T> = std::result::Result<T, DeckError>;
