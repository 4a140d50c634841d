//! # taskwall-deck
//!
//! Read-only client and aggregator for Deck-style kanban boards
//! (boards → stacks → cards) served over the Nextcloud Deck REST API.
//!
//! ## Design
//!
//! - One [`BoardSource`] trait for the four remote reads; [`DeckClient`] is
//!   the HTTP implementation, tests use in-memory fakes
//! - Boards are fetched concurrently and each one independently walks a
//!   two-step strategy chain (complete board, then per-stack listing)
//! - Failures are contained: a stack whose cards fail stays empty, a board
//!   whose every strategy fails is dropped, the rest of the result survives
//! - Loosely-shaped payloads are normalised into [`Board`], [`Stack`] and
//!   [`Card`] with typed due dates, labels and assignees
//!
//! ## Security
//!
//! - Credentials are sent only as HTTP basic auth and never logged
//! - Request paths are logged at trace level only

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod source;
pub mod types;
pub mod wire;

pub use aggregate::{BoardFetch, Strategy};
pub use client::DeckClient;
pub use config::DeckConfig;
pub use error::{DeckError, Result};
pub use source::BoardSource;
pub use types::{AggregateResult, AssignedUser, Board, BoardSummary, Card, Label, Stack};

/// Aggregate the given boards from any [`BoardSource`].
///
/// An empty `board_ids` slice means every non-archived board the source
/// lists. Boards that cannot be fetched by any strategy are left out; the
/// returned boards keep the order of `board_ids` (or of the listing).
///
/// # Errors
///
/// Returns an error only when `board_ids` is empty and listing the boards
/// fails.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> taskwall_deck::Result<()> {
/// let config = taskwall_deck::DeckConfig::new("https://cloud.example.org", "me", "app-token");
/// let client = taskwall_deck::DeckClient::new(config)?;
/// let result = taskwall_deck::fetch_all(&client, &[]).await?;
/// for board in &result.boards {
///     println!("{}: {} cards", board.title, board.total_cards());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn fetch_all<S: BoardSource>(source: &S, board_ids: &[i64]) -> Result<AggregateResult> {
    aggregate::fetch_all(source, board_ids).await
}

/// Build a [`DeckClient`] from `config` and aggregate the given boards.
///
/// # Errors
///
/// Returns [`DeckError::Config`] for an invalid configuration, otherwise
/// the same as [`fetch_all`].
pub async fn fetch_with_config(config: DeckConfig, board_ids: &[i64]) -> Result<AggregateResult> {
    let client = DeckClient::new(config)?;
    fetch_all(&client, board_ids).await
}
