//! Tolerant payload records for the board service's JSON.
//!
//! Every field except the ids is optional so that missing keys and explicit
//! `null`s both decode. Cards stay as raw [`serde_json::Value`]s until
//! [`crate::aggregate::normalize`] converts them one at a time; a single bad
//! card can then be skipped without losing its stack.

use serde::{Deserialize, Serialize};

/// A board as returned by "list boards" or "complete board".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPayload {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
    /// Epoch seconds; `0` or absent means not deleted.
    #[serde(default, rename = "deletedAt")]
    pub deleted_at: Option<i64>,
    /// Present only on "complete board" responses.
    #[serde(default)]
    pub stacks: Option<Vec<StackPayload>>,
}

/// A stack as returned by "list stacks" or nested in a complete board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackPayload {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    /// `None` when the service did not embed cards for this stack.
    #[serde(default)]
    pub cards: Option<Vec<serde_json::Value>>,
}

impl BoardPayload {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            color: None,
            archived: None,
            deleted_at: None,
            stacks: None,
        }
    }

    /// Attach nested stacks, turning this into a "complete board" payload.
    pub fn with_stacks(mut self, stacks: Vec<StackPayload>) -> Self {
        self.stacks = Some(stacks);
        self
    }

    /// Whether the board is archived or soft-deleted.
    pub fn is_archived(&self) -> bool {
        self.archived.unwrap_or(false) || self.deleted_at.is_some_and(|ts| ts > 0)
    }
}

impl StackPayload {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            order: None,
            cards: None,
        }
    }

    /// Embed raw card values in this stack.
    pub fn with_cards(mut self, cards: Vec<serde_json::Value>) -> Self {
        self.cards = Some(cards);
        self
    }
}
