//! Per-board fetch strategies and their outcome type.
//!
//! A board is fetched by trying each [`Strategy`] in [`Strategy::CHAIN`]
//! order until one succeeds. A strategy only fails as a whole when its
//! board-level call fails; per-stack card failures leave that stack empty
//! and are reported through [`Assembled::failed_stacks`].

use std::fmt;

use serde_json::Value;

use super::normalize::{normalize_board, normalize_stack};
use crate::error::DeckError;
use crate::source::BoardSource;
use crate::types::{Board, BoardSummary};
use crate::wire::StackPayload;

/// How a board's task tree is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One "complete board" call, with per-stack card fetches for stacks
    /// that arrive without embedded cards.
    Complete,
    /// List the stacks, then fetch every stack's cards separately.
    PerStack,
}

impl Strategy {
    /// Strategies in the order they are attempted.
    pub const CHAIN: [Strategy; 2] = [Strategy::Complete, Strategy::PerStack];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::PerStack => "per-stack",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A board assembled by one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub board: Board,
    /// Stacks kept with an empty card list because their card fetch failed.
    pub failed_stacks: Vec<i64>,
}

/// Final outcome of fetching one board.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardFetch {
    /// Every stack loaded.
    Complete { board: Board, strategy: Strategy },
    /// The board loaded but some stacks are empty because their cards
    /// could not be fetched.
    Degraded {
        board: Board,
        strategy: Strategy,
        failed_stacks: Vec<i64>,
    },
    /// Every strategy failed; the board is left out of the result.
    Dropped { board_id: i64, reason: String },
}

impl BoardFetch {
    fn from_assembled(assembled: Assembled, strategy: Strategy) -> Self {
        if assembled.failed_stacks.is_empty() {
            Self::Complete {
                board: assembled.board,
                strategy,
            }
        } else {
            Self::Degraded {
                board: assembled.board,
                strategy,
                failed_stacks: assembled.failed_stacks,
            }
        }
    }

    pub fn board(&self) -> Option<&Board> {
        match self {
            Self::Complete { board, .. } | Self::Degraded { board, .. } => Some(board),
            Self::Dropped { .. } => None,
        }
    }
}

/// Fetch one board by walking the strategy chain.
///
/// Never returns an error: total failure is the [`BoardFetch::Dropped`]
/// value, with every strategy's error joined into `reason`.
pub async fn fetch_board<S: BoardSource>(
    source: &S,
    board_id: i64,
    summary: Option<&BoardSummary>,
) -> BoardFetch {
    let mut failures = Vec::new();

    for strategy in Strategy::CHAIN {
        match run_strategy(strategy, source, board_id, summary).await {
            Ok(assembled) => {
                if !failures.is_empty() {
                    tracing::info!(board_id, %strategy, "board recovered via fallback strategy");
                }
                return BoardFetch::from_assembled(assembled, strategy);
            }
            Err(err) => {
                tracing::warn!(board_id, %strategy, error = %err, "board fetch strategy failed");
                failures.push(format!("{strategy}: {err}"));
            }
        }
    }

    BoardFetch::Dropped {
        board_id,
        reason: failures.join("; "),
    }
}

/// Run a single strategy for one board.
pub async fn run_strategy<S: BoardSource>(
    strategy: Strategy,
    source: &S,
    board_id: i64,
    summary: Option<&BoardSummary>,
) -> Result<Assembled, DeckError> {
    match strategy {
        Strategy::Complete => via_complete_board(source, board_id).await,
        Strategy::PerStack => via_stack_listing(source, board_id, summary).await,
    }
}

async fn via_complete_board<S: BoardSource>(
    source: &S,
    board_id: i64,
) -> Result<Assembled, DeckError> {
    let payload = source.board_complete(board_id).await?;
    let Some(stack_payloads) = payload.stacks.as_ref() else {
        return Err(DeckError::Parse(format!(
            "complete board {board_id} carries no stacks"
        )));
    };

    let mut stacks = Vec::with_capacity(stack_payloads.len());
    let mut failed_stacks = Vec::new();
    for stack in stack_payloads {
        let raw_cards = match &stack.cards {
            Some(embedded) => embedded.clone(),
            None => match load_stack_cards(source, board_id, stack).await {
                Some(fetched) => fetched,
                None => {
                    failed_stacks.push(stack.id);
                    Vec::new()
                }
            },
        };
        stacks.push(normalize_stack(board_id, stack, &raw_cards));
    }

    // The requested id stays authoritative.
    let board = normalize_board(
        board_id,
        payload.title.as_deref(),
        payload.color.as_deref(),
        stacks,
    );
    Ok(Assembled {
        board,
        failed_stacks,
    })
}

async fn via_stack_listing<S: BoardSource>(
    source: &S,
    board_id: i64,
    summary: Option<&BoardSummary>,
) -> Result<Assembled, DeckError> {
    let stack_payloads = source.list_stacks(board_id).await?;

    let mut stacks = Vec::with_capacity(stack_payloads.len());
    let mut failed_stacks = Vec::new();
    for stack in &stack_payloads {
        let raw_cards = match load_stack_cards(source, board_id, stack).await {
            Some(fetched) => fetched,
            None => {
                failed_stacks.push(stack.id);
                Vec::new()
            }
        };
        stacks.push(normalize_stack(board_id, stack, &raw_cards));
    }

    let board = normalize_board(
        board_id,
        summary.map(|s| s.title.as_str()),
        summary.and_then(|s| s.color.as_deref()),
        stacks,
    );
    Ok(Assembled {
        board,
        failed_stacks,
    })
}

/// Fetch one stack's cards; a failure is logged and reported as `None`.
async fn load_stack_cards<S: BoardSource>(
    source: &S,
    board_id: i64,
    stack: &StackPayload,
) -> Option<Vec<Value>> {
    match source.list_cards(board_id, stack.id).await {
        Ok(cards) => Some(cards),
        Err(err) => {
            tracing::warn!(
                board_id,
                stack_id = stack.id,
                error = %err,
                "stack card fetch failed, keeping stack empty"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::BoardPayload;
    use serde_json::json;

    /// Source whose every call is scripted by flags.
    #[derive(Default)]
    struct ScriptedSource {
        complete_fails: bool,
        complete_without_stacks: bool,
        stacks_fail: bool,
        failing_card_stacks: Vec<i64>,
    }

    impl BoardSource for ScriptedSource {
        async fn list_boards(&self) -> Result<Vec<BoardPayload>, DeckError> {
            Ok(vec![])
        }

        async fn list_stacks(&self, _board_id: i64) -> Result<Vec<StackPayload>, DeckError> {
            if self.stacks_fail {
                return Err(DeckError::Http("stacks down".into()));
            }
            Ok(vec![StackPayload::new(1, "To Do"), StackPayload::new(2, "Done")])
        }

        async fn list_cards(
            &self,
            _board_id: i64,
            stack_id: i64,
        ) -> Result<Vec<Value>, DeckError> {
            if self.failing_card_stacks.contains(&stack_id) {
                return Err(DeckError::Status {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(vec![json!({"id": stack_id * 100, "title": "fetched"})])
        }

        async fn board_complete(&self, board_id: i64) -> Result<BoardPayload, DeckError> {
            if self.complete_fails {
                return Err(DeckError::Http("complete down".into()));
            }
            let board = BoardPayload::new(board_id, "Complete");
            if self.complete_without_stacks {
                return Ok(board);
            }
            Ok(board.with_stacks(vec![
                StackPayload::new(1, "To Do")
                    .with_cards(vec![json!({"id": 11, "title": "embedded"})]),
                StackPayload::new(2, "Done"),
            ]))
        }
    }

    #[test]
    fn chain_order_is_complete_then_per_stack() {
        assert_eq!(Strategy::CHAIN, [Strategy::Complete, Strategy::PerStack]);
        assert_eq!(Strategy::PerStack.to_string(), "per-stack");
    }

    #[tokio::test]
    async fn complete_strategy_fills_missing_stack_cards() {
        let source = ScriptedSource::default();
        let outcome = fetch_board(&source, 7, None).await;
        let BoardFetch::Complete { board, strategy } = outcome else {
            panic!("expected complete outcome");
        };
        assert_eq!(strategy, Strategy::Complete);
        assert_eq!(board.title, "Complete");
        assert_eq!(board.stacks[0].cards[0].title, "embedded");
        assert_eq!(board.stacks[1].cards[0].id, 200);
    }

    #[tokio::test]
    async fn complete_strategy_keeps_board_when_a_stack_fails() {
        let source = ScriptedSource {
            failing_card_stacks: vec![2],
            ..Default::default()
        };
        let outcome = fetch_board(&source, 7, None).await;
        let BoardFetch::Degraded {
            board,
            strategy,
            failed_stacks,
        } = outcome
        else {
            panic!("expected degraded outcome");
        };
        assert_eq!(strategy, Strategy::Complete);
        assert_eq!(failed_stacks, vec![2]);
        assert_eq!(board.stacks[0].cards.len(), 1);
        assert!(board.stacks[1].cards.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_per_stack_when_complete_fails() {
        let source = ScriptedSource {
            complete_fails: true,
            ..Default::default()
        };
        let summary = BoardSummary {
            id: 7,
            title: "Listed title".into(),
            color: Some("#00ff00".into()),
            archived: false,
        };
        let outcome = fetch_board(&source, 7, Some(&summary)).await;
        let BoardFetch::Complete { board, strategy } = outcome else {
            panic!("expected complete outcome");
        };
        assert_eq!(strategy, Strategy::PerStack);
        assert_eq!(board.title, "Listed title");
        assert_eq!(board.color.as_deref(), Some("#00ff00"));
        assert_eq!(board.total_cards(), 2);
    }

    #[tokio::test]
    async fn complete_payload_without_stacks_falls_back() {
        let source = ScriptedSource {
            complete_without_stacks: true,
            ..Default::default()
        };
        let outcome = fetch_board(&source, 3, None).await;
        let BoardFetch::Complete { board, strategy } = outcome else {
            panic!("expected complete outcome");
        };
        assert_eq!(strategy, Strategy::PerStack);
        assert_eq!(board.title, "Board 3");
    }

    #[tokio::test]
    async fn per_stack_failures_leave_stacks_empty() {
        let source = ScriptedSource {
            complete_fails: true,
            failing_card_stacks: vec![1, 2],
            ..Default::default()
        };
        let outcome = fetch_board(&source, 7, None).await;
        let BoardFetch::Degraded { board, failed_stacks, .. } = outcome else {
            panic!("expected degraded outcome");
        };
        assert_eq!(failed_stacks, vec![1, 2]);
        assert_eq!(board.stacks.len(), 2);
        assert_eq!(board.total_cards(), 0);
    }

    #[tokio::test]
    async fn both_strategies_failing_drops_board() {
        let source = ScriptedSource {
            complete_fails: true,
            stacks_fail: true,
            ..Default::default()
        };
        let outcome = fetch_board(&source, 7, None).await;
        assert!(outcome.board().is_none());
        let BoardFetch::Dropped { board_id, reason } = outcome else {
            panic!("expected dropped outcome");
        };
        assert_eq!(board_id, 7);
        assert!(reason.contains("complete: HTTP error: complete down"));
        assert!(reason.contains("per-stack: HTTP error: stacks down"));
    }
}
