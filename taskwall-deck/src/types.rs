//! Normalised entity model: boards, stacks, cards and the aggregate result.
//!
//! These records are rebuilt from scratch on every refresh and never
//! mutated in place. All optional service fields have already been
//! default-filled by [`crate::aggregate::normalize`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A label attached to a card. The title drives priority keyword matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub title: String,
    /// Hex colour as sent by the service, if any.
    pub color: Option<String>,
}

impl Label {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: None,
        }
    }
}

/// A user assigned to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedUser {
    pub uid: String,
    pub display_name: String,
}

impl AssignedUser {
    pub fn new(uid: impl Into<String>) -> Self {
        let uid = uid.into();
        Self {
            display_name: uid.clone(),
            uid,
        }
    }
}

/// A single task on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique within the parent stack.
    pub id: i64,
    pub title: String,
    /// Empty when the service sent none.
    pub description: String,
    pub due: Option<DateTime<Utc>>,
    pub labels: Vec<Label>,
    pub assigned_users: Vec<AssignedUser>,
    pub created_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub done: bool,
    /// Host-defined display order. The sorter ignores it.
    pub order: i64,
}

impl Card {
    /// Create a card with every optional field at its default.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            due: None,
            labels: Vec::new(),
            assigned_users: Vec::new(),
            created_at: None,
            archived: false,
            done: false,
            order: 0,
        }
    }

    /// A card is active while it is neither archived nor done.
    pub fn is_active(&self) -> bool {
        !self.archived && !self.done
    }
}

/// A column of cards within a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    /// Unique within the parent board.
    pub id: i64,
    pub title: String,
    pub order: i64,
    /// Array position carries no meaning.
    pub cards: Vec<Card>,
}

impl Stack {
    pub fn new(id: i64, title: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            id,
            title: title.into(),
            order: 0,
            cards,
        }
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

/// A named collection of stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Unique within an [`AggregateResult`].
    pub id: i64,
    pub title: String,
    /// Display colour in `#rrggbb` form.
    pub color: Option<String>,
    pub stacks: Vec<Stack>,
}

impl Board {
    pub fn new(id: i64, title: impl Into<String>, stacks: Vec<Stack>) -> Self {
        Self {
            id,
            title: title.into(),
            color: None,
            stacks,
        }
    }

    /// Sum of the card counts of every stack.
    pub fn total_cards(&self) -> usize {
        self.stacks.iter().map(Stack::card_count).sum()
    }

    /// Every active card together with the stack that holds it.
    pub fn active_cards(&self) -> impl Iterator<Item = (&Stack, &Card)> {
        self.stacks.iter().flat_map(|stack| {
            stack
                .cards
                .iter()
                .filter(|card| card.is_active())
                .map(move |card| (stack, card))
        })
    }
}

/// Board listing entry as returned by "list boards".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: i64,
    pub title: String,
    pub color: Option<String>,
    /// Archived or deleted on the service side.
    pub archived: bool,
}

/// The normalised, possibly partial snapshot of one refresh cycle.
///
/// Boards that could not be fetched are absent, never represented by
/// placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub boards: Vec<Board>,
    pub fetched_at: DateTime<Utc>,
}

impl AggregateResult {
    /// Wrap `boards` with the current time as fetch timestamp.
    pub fn new(boards: Vec<Board>) -> Self {
        Self {
            boards,
            fetched_at: Utc::now(),
        }
    }

    /// Card count across every board.
    pub fn total_cards(&self) -> usize {
        self.boards.iter().map(Board::total_cards).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn board_ids(&self) -> Vec<i64> {
        self.boards.iter().map(|b| b.id).collect()
    }
}
