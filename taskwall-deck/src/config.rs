//! Client configuration with sensible defaults.
//!
//! [`DeckConfig`] carries the service location, basic-auth credentials and
//! request behaviour. Credentials are passed through untouched; how they are
//! obtained is the caller's concern.

use crate::error::DeckError;
use url::Url;

/// Path of the Deck REST API below the server root.
pub const API_PATH: &str = "index.php/apps/deck/api/v1.0/";

/// Configuration for the board service client.
#[derive(Clone)]
pub struct DeckConfig {
    /// Server root, e.g. `https://cloud.example.org`.
    pub base_url: String,
    /// Basic-auth user name. Empty disables the `Authorization` header.
    pub username: String,
    /// Basic-auth password or app token.
    pub password: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, `taskwall/<version>` is sent.
    pub user_agent: Option<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: 15,
            user_agent: None,
        }
    }
}

// Hand-written so the password never lands in logs.
impl std::fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeckConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl DeckConfig {
    /// Create a config for the given server root and credentials.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `base_url` must be a non-empty `http` or `https` URL
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), DeckError> {
        if self.timeout_seconds == 0 {
            return Err(DeckError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        self.api_root().map(|_| ())
    }

    /// Resolve the API root URL (always ends with a slash so relative
    /// joins stay below it).
    pub fn api_root(&self) -> Result<Url, DeckError> {
        let trimmed = self.base_url.trim();
        if trimmed.is_empty() {
            return Err(DeckError::Config("base_url must not be empty".into()));
        }
        let mut root = Url::parse(trimmed)
            .map_err(|e| DeckError::Config(format!("invalid base_url: {e}")))?;
        if root.scheme() != "http" && root.scheme() != "https" {
            return Err(DeckError::Config(format!(
                "base_url scheme must be http or https, got {}",
                root.scheme()
            )));
        }
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        root.join(API_PATH)
            .map_err(|e| DeckError::Config(format!("invalid base_url: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = DeckConfig::default();
        assert_eq!(config.timeout_seconds, 15);
        assert!(config.user_agent.is_none());
        assert!(config.base_url.is_empty());
    }

    #[test]
    fn default_config_fails_without_base_url() {
        let err = DeckConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn valid_config_passes_validation() {
        let config = DeckConfig::new("https://cloud.example.org", "wall", "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = DeckConfig {
            timeout_seconds: 0,
            ..DeckConfig::new("https://cloud.example.org", "wall", "secret")
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn non_http_scheme_rejected() {
        let config = DeckConfig::new("ftp://cloud.example.org", "wall", "secret");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn api_root_appends_deck_path() {
        let config = DeckConfig::new("https://cloud.example.org", "", "");
        let root = config.api_root().unwrap();
        assert_eq!(
            root.as_str(),
            "https://cloud.example.org/index.php/apps/deck/api/v1.0/"
        );
    }

    #[test]
    fn api_root_keeps_sub_path_installs() {
        let config = DeckConfig::new("https://example.org/nextcloud", "", "");
        let root = config.api_root().unwrap();
        assert_eq!(
            root.as_str(),
            "https://example.org/nextcloud/index.php/apps/deck/api/v1.0/"
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = DeckConfig::new("https://cloud.example.org", "wall", "hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }
}
