//! Board aggregation: id resolution, concurrent per-board fetch, assembly.
//!
//! Boards are fetched concurrently, each through the strategy chain in
//! [`strategy`]. One board failing never affects another; only a failure
//! to list boards (when no explicit ids were given) fails the whole call.

pub mod normalize;
pub mod strategy;

use std::collections::{HashMap, HashSet};

use crate::error::DeckError;
use crate::source::BoardSource;
use crate::types::{AggregateResult, BoardSummary};

use normalize::summarize;
pub use strategy::{BoardFetch, Strategy, fetch_board};

/// Fetch and normalise every requested board.
///
/// # Pipeline
///
/// 1. Resolve ids: the given ids in order (deduplicated), or every
///    non-archived board from [`BoardSource::list_boards`] when empty
/// 2. Fan out one [`fetch_board`] per id with [`futures::future::join_all`]
/// 3. Log degraded and dropped boards at warn level
/// 4. Keep successfully assembled boards in input order
///
/// # Errors
///
/// Returns the listing error only when `board_ids` is empty and the board
/// listing itself fails. Per-board and per-stack failures never surface.
pub async fn fetch_all<S: BoardSource>(
    source: &S,
    board_ids: &[i64],
) -> Result<AggregateResult, DeckError> {
    let (ids, summaries) = resolve_board_ids(source, board_ids).await?;

    let outcomes =
        futures::future::join_all(ids.iter().map(|&id| fetch_board(source, id, summaries.get(&id))))
            .await;

    let mut boards = Vec::with_capacity(outcomes.len());
    let mut dropped = 0_usize;
    for outcome in outcomes {
        match outcome {
            BoardFetch::Complete { board, strategy } => {
                tracing::debug!(
                    board_id = board.id,
                    %strategy,
                    cards = board.total_cards(),
                    "board fetched"
                );
                boards.push(board);
            }
            BoardFetch::Degraded {
                board,
                strategy,
                failed_stacks,
            } => {
                tracing::warn!(
                    board_id = board.id,
                    %strategy,
                    ?failed_stacks,
                    "board fetched with empty stacks"
                );
                boards.push(board);
            }
            BoardFetch::Dropped { board_id, reason } => {
                tracing::warn!(board_id, %reason, "board dropped from result");
                dropped += 1;
            }
        }
    }

    let result = AggregateResult::new(boards);
    tracing::info!(
        boards = result.boards.len(),
        dropped,
        cards = result.total_cards(),
        "aggregation finished"
    );
    Ok(result)
}

/// Resolve the ids to fetch plus whatever board summaries are known.
///
/// # Errors
///
/// Propagates the [`BoardSource::list_boards`] error when `requested` is
/// empty.
pub async fn resolve_board_ids<S: BoardSource>(
    source: &S,
    requested: &[i64],
) -> Result<(Vec<i64>, HashMap<i64, BoardSummary>), DeckError> {
    if !requested.is_empty() {
        return Ok((dedup_preserving_order(requested.iter().copied()), HashMap::new()));
    }

    let listed = source.list_boards().await.map_err(|err| {
        tracing::error!(error = %err, "listing boards failed");
        err
    })?;

    let summaries: Vec<BoardSummary> = listed.iter().map(summarize).collect();
    let skipped = summaries.iter().filter(|s| s.archived).count();
    if skipped > 0 {
        tracing::debug!(skipped, "skipping archived boards");
    }

    let ids = dedup_preserving_order(summaries.iter().filter(|s| !s.archived).map(|s| s.id));
    let by_id = summaries.into_iter().map(|s| (s.id, s)).collect();
    Ok((ids, by_id))
}

fn dedup_preserving_order(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{BoardPayload, StackPayload};
    use serde_json::Value;

    struct ListingSource {
        boards: Vec<BoardPayload>,
        listing_fails: bool,
    }

    impl BoardSource for ListingSource {
        async fn list_boards(&self) -> Result<Vec<BoardPayload>, DeckError> {
            if self.listing_fails {
                return Err(DeckError::Status {
                    status: 401,
                    message: "bad credentials".into(),
                });
            }
            Ok(self.boards.clone())
        }

        async fn list_stacks(&self, _board_id: i64) -> Result<Vec<StackPayload>, DeckError> {
            Ok(vec![])
        }

        async fn list_cards(
            &self,
            _board_id: i64,
            _stack_id: i64,
        ) -> Result<Vec<Value>, DeckError> {
            Ok(vec![])
        }

        async fn board_complete(&self, board_id: i64) -> Result<BoardPayload, DeckError> {
            Ok(BoardPayload::new(board_id, "b").with_stacks(vec![]))
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_preserving_order([3, 1, 3, 2, 1].into_iter()), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn explicit_ids_skip_listing() {
        let source = ListingSource {
            boards: vec![],
            listing_fails: true,
        };
        let (ids, summaries) = resolve_board_ids(&source, &[5, 4]).await.expect("ids");
        assert_eq!(ids, vec![5, 4]);
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn empty_filter_lists_and_skips_archived() {
        let mut archived = BoardPayload::new(2, "Archived");
        archived.archived = Some(true);
        let source = ListingSource {
            boards: vec![BoardPayload::new(1, "One"), archived, BoardPayload::new(3, "Three")],
            listing_fails: false,
        };
        let (ids, summaries) = resolve_board_ids(&source, &[]).await.expect("ids");
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(summaries.len(), 3);
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let source = ListingSource {
            boards: vec![],
            listing_fails: true,
        };
        let err = fetch_all(&source, &[]).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn zero_boards_is_an_empty_result_not_an_error() {
        let source = ListingSource {
            boards: vec![],
            listing_fails: false,
        };
        let result = fetch_all(&source, &[]).await.expect("result");
        assert!(result.is_empty());
        assert_eq!(result.total_cards(), 0);
    }
}
