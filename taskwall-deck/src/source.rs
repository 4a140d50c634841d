//! Trait definition for the remote board service.
//!
//! The aggregator only talks to a [`BoardSource`]; [`crate::DeckClient`]
//! is the HTTP implementation, tests plug in in-memory fakes.

use crate::error::DeckError;
use crate::wire::{BoardPayload, StackPayload};

/// The four read operations the board service exposes.
///
/// Implementations return raw payloads; normalisation happens in the
/// aggregator. All implementations must be `Send + Sync` so boards can be
/// fetched concurrently.
pub trait BoardSource: Send + Sync {
    /// List every board visible to the configured credentials.
    fn list_boards(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<BoardPayload>, DeckError>> + Send;

    /// List the stacks of one board. Embedded cards, if any, are ignored by
    /// the aggregator.
    fn list_stacks(
        &self,
        board_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<StackPayload>, DeckError>> + Send;

    /// List the raw cards of one stack.
    fn list_cards(
        &self,
        board_id: i64,
        stack_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<serde_json::Value>, DeckError>> + Send;

    /// Fetch a board with nested stacks and, ideally, nested cards.
    fn board_complete(
        &self,
        board_id: i64,
    ) -> impl std::future::Future<Output = Result<BoardPayload, DeckError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A fixed single-board source for trait bound checks.
    struct StaticSource;

    impl BoardSource for StaticSource {
        async fn list_boards(&self) -> Result<Vec<BoardPayload>, DeckError> {
            Ok(vec![BoardPayload::new(1, "Only")])
        }

        async fn list_stacks(&self, _board_id: i64) -> Result<Vec<StackPayload>, DeckError> {
            Ok(vec![StackPayload::new(10, "To Do")])
        }

        async fn list_cards(
            &self,
            _board_id: i64,
            _stack_id: i64,
        ) -> Result<Vec<serde_json::Value>, DeckError> {
            Ok(vec![json!({"id": 100, "title": "Card"})])
        }

        async fn board_complete(&self, board_id: i64) -> Result<BoardPayload, DeckError> {
            Err(DeckError::Status {
                status: 404,
                message: format!("board {board_id} not found"),
            })
        }
    }

    #[test]
    fn static_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StaticSource>();
    }

    #[tokio::test]
    async fn static_source_lists_boards() {
        let boards = StaticSource.list_boards().await.expect("boards");
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].title.as_deref(), Some("Only"));
    }

    #[tokio::test]
    async fn static_source_propagates_errors() {
        let err = StaticSource.board_complete(3).await.unwrap_err();
        assert!(err.to_string().contains("board 3 not found"));
    }
}
