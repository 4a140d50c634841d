//! HTTP implementation of [`BoardSource`] for the Deck REST API.
//!
//! Endpoints (relative to [`DeckConfig::api_root`]):
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list boards | `GET boards` |
//! | list stacks | `GET boards/{board}/stacks` |
//! | list cards | `GET boards/{board}/stacks/{stack}` (the `cards` field) |
//! | complete board | `GET boards/{board}?details=true` |
//!
//! Every request carries `OCS-APIRequest: true` and HTTP basic auth when a
//! user name is configured.

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::DeckConfig;
use crate::error::DeckError;
use crate::http::build_client;
use crate::source::BoardSource;
use crate::wire::{BoardPayload, StackPayload};

/// Board service client over HTTP.
#[derive(Debug, Clone)]
pub struct DeckClient {
    config: DeckConfig,
    api_root: Url,
    client: reqwest::Client,
}

impl DeckClient {
    /// Validate `config` and build the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Config`] for an invalid configuration and
    /// [`DeckError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: DeckConfig) -> Result<Self, DeckError> {
        config.validate()?;
        let api_root = config.api_root()?;
        let client = build_client(&config)?;
        Ok(Self {
            config,
            api_root,
            client,
        })
    }

    /// The resolved API root all endpoints are joined onto.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    fn endpoint(&self, path: &str) -> Result<Url, DeckError> {
        self.api_root
            .join(path)
            .map_err(|e| DeckError::Config(format!("invalid endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DeckError> {
        let path = url.path().to_owned();
        let mut request = self
            .client
            .get(url)
            .header("OCS-APIRequest", "true")
            .header("Accept", "application/json");
        if !self.config.username.is_empty() {
            request = request.basic_auth(&self.config.username, Some(&self.config.password));
        }

        tracing::trace!(%path, "deck request");
        let response = request
            .send()
            .await
            .map_err(|e| DeckError::Http(format!("GET {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DeckError::Http(format!("GET {path} body read failed: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| DeckError::Parse(format!("{path}: {e}")))
    }
}

impl BoardSource for DeckClient {
    async fn list_boards(&self) -> Result<Vec<BoardPayload>, DeckError> {
        let url = self.endpoint("boards")?;
        self.get_json(url).await
    }

    async fn list_stacks(&self, board_id: i64) -> Result<Vec<StackPayload>, DeckError> {
        let url = self.endpoint(&format!("boards/{board_id}/stacks"))?;
        self.get_json(url).await
    }

    async fn list_cards(
        &self,
        board_id: i64,
        stack_id: i64,
    ) -> Result<Vec<serde_json::Value>, DeckError> {
        let url = self.endpoint(&format!("boards/{board_id}/stacks/{stack_id}"))?;
        let stack: StackPayload = self.get_json(url).await?;
        Ok(stack.cards.unwrap_or_default())
    }

    async fn board_complete(&self, board_id: i64) -> Result<BoardPayload, DeckError> {
        let mut url = self.endpoint(&format!("boards/{board_id}"))?;
        url.query_pairs_mut().append_pair("details", "true");
        self.get_json(url).await
    }
}

/// Map a non-success response to [`DeckError::Status`].
fn map_http_error(status: reqwest::StatusCode, body: &str) -> DeckError {
    DeckError::Status {
        status: status.as_u16(),
        message: extract_error_message(body),
    }
}

/// Pull a human-readable message out of a Deck or OCS error body.
fn extract_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.get("message")
            .and_then(|m| m.as_str())
            .or_else(|| {
                v.get("ocs")
                    .and_then(|o| o.get("meta"))
                    .and_then(|m| m.get("message"))
                    .and_then(|m| m.as_str())
            })
            .map(String::from)
    });
    match message {
        Some(m) => m,
        None if body.trim().is_empty() => "empty response body".to_owned(),
        None => body.chars().take(200).collect(),
    }
}
