//! Shared HTTP client construction for board service requests.

use crate::config::DeckConfig;
use crate::error::DeckError;
use std::time::Duration;

/// Default User-Agent sent when none is configured.
pub fn default_user_agent() -> String {
    format!("taskwall/{}", env!("CARGO_PKG_VERSION"))
}

/// Build a [`reqwest::Client`] configured for the board service.
///
/// The client has:
/// - Timeout from config
/// - Custom or default User-Agent
/// - gzip decompression
/// - A bounded redirect policy
///
/// # Errors
///
/// Returns [`DeckError::Http`] if the client cannot be constructed.
pub fn build_client(config: &DeckConfig) -> Result<reqwest::Client, DeckError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => default_user_agent(),
    };

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| DeckError::Http(format!("failed to build HTTP client: {e}")))
}
