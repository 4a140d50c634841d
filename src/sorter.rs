//! Task ordering for the currently displayed board.
//!
//! Active cards are flattened into [`DisplayTask`]s and ordered by tier:
//!
//! 1. Overdue (within the overdue window), earliest due first
//! 2. Due now or later, earliest due first
//! 3. Assigned, most assignees first
//! 4. Everything else
//!
//! Ties in any tier fall through to creation time, newest first, with a
//! missing creation time sorting as the epoch. Cards overdue beyond the
//! window are ordered as if they had no due date.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::UrgencyConfig;
use crate::urgency::overdue_within_window;
use taskwall_deck::{Board, Card};

/// A card together with the board and stack it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTask {
    pub board_id: i64,
    pub board_title: String,
    pub stack_id: i64,
    pub stack_title: String,
    pub card: Card,
}

/// Every active card on `board`, in board order.
pub fn flatten(board: &Board) -> Vec<DisplayTask> {
    board
        .active_cards()
        .map(|(stack, card)| DisplayTask {
            board_id: board.id,
            board_title: board.title.clone(),
            stack_id: stack.id,
            stack_title: stack.title.clone(),
            card: card.clone(),
        })
        .collect()
}

/// The `limit` most important active tasks of `board`.
pub fn top_tasks(
    board: &Board,
    limit: usize,
    now: DateTime<Utc>,
    cfg: &UrgencyConfig,
) -> Vec<DisplayTask> {
    let mut tasks = flatten(board);
    tasks.sort_by_cached_key(|task| sort_key(&task.card, now, cfg));
    tasks.truncate(limit);
    tasks
}

fn sort_key(card: &Card, now: DateTime<Utc>, cfg: &UrgencyConfig) -> (u8, i64, Reverse<i64>) {
    let created = Reverse(card.created_at.map_or(0, |t| t.timestamp_millis()));
    let assignees = i64::try_from(card.assigned_users.len()).unwrap_or(i64::MAX);

    match card.due {
        Some(due) if overdue_within_window(due, now, cfg) => (0, due.timestamp_millis(), created),
        Some(due) if due >= now => (1, due.timestamp_millis(), created),
        _ if assignees > 0 => (2, -assignees, created),
        _ => (3, 0, created),
    }
}
