//! Priority and urgency classification of cards.
//!
//! Two related but distinct questions are answered here:
//!
//! - [`classify`]: what priority level and colour a card is *shown* with
//!   (labels first, then due date against `urgent_threshold_days`)
//! - [`is_urgent`]: whether a card counts toward its board's rotation time
//!   (due date only, against `upcoming_threshold_days` and
//!   `max_overdue_days`)
//!
//! All day arithmetic works on absolute instants, so the local offset of
//! the display cancels out in every difference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::UrgencyConfig;
use taskwall_deck::{Board, Card};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

const HIGH_LABELS: [&str; 2] = ["high", "urgent"];
const LOW_LABELS: [&str; 1] = ["low"];

/// Display priority of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Low,
    Overdue,
    Urgent,
    Normal,
}

/// Colour hint for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorHint {
    Danger,
    Warning,
    Muted,
    Neutral,
}

impl From<Priority> for ColorHint {
    fn from(level: Priority) -> Self {
        match level {
            Priority::High | Priority::Overdue => Self::Danger,
            Priority::Urgent => Self::Warning,
            Priority::Low => Self::Muted,
            Priority::Normal => Self::Neutral,
        }
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub level: Priority,
    pub color: ColorHint,
    /// Whole days until the due date, rounded up; negative when overdue.
    pub due_in_days: Option<i64>,
}

/// `ceil((due - now) / 1 day)`.
pub fn day_delta(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff = (due - now).num_milliseconds();
    -(-diff).div_euclid(MILLIS_PER_DAY)
}

/// Classify a card for display.
pub fn classify(card: &Card, now: DateTime<Utc>, cfg: &UrgencyConfig) -> Classification {
    let due_in_days = card.due.map(|due| day_delta(due, now));
    let level = label_priority(card, cfg).unwrap_or_else(|| match card.due {
        Some(due) if due < now => Priority::Overdue,
        Some(due) if day_delta(due, now) <= i64::from(cfg.urgent_threshold_days) => {
            Priority::Urgent
        }
        _ => Priority::Normal,
    });

    Classification {
        level,
        color: level.into(),
        due_in_days,
    }
}

/// Whether a card counts as urgent for rotation timing.
///
/// Cards without a due date are never urgent. Past-due cards are urgent
/// while no more than `max_overdue_days` overdue; future cards while due
/// within `upcoming_threshold_days`. Both bounds are inclusive.
pub fn is_urgent(card: &Card, now: DateTime<Utc>, cfg: &UrgencyConfig) -> bool {
    match card.due {
        None => false,
        Some(due) if due < now => overdue_within_window(due, now, cfg),
        Some(due) => day_delta(due, now) <= i64::from(cfg.upcoming_threshold_days),
    }
}

/// Whether a past due date is still within the overdue window.
pub fn overdue_within_window(due: DateTime<Utc>, now: DateTime<Utc>, cfg: &UrgencyConfig) -> bool {
    due < now && -day_delta(due, now) <= i64::from(cfg.max_overdue_days)
}

/// Number of active (not archived, not done) urgent cards on a board.
pub fn urgent_count(board: &Board, now: DateTime<Utc>, cfg: &UrgencyConfig) -> usize {
    board
        .active_cards()
        .filter(|(_, card)| is_urgent(card, now, cfg))
        .count()
}

fn label_priority(card: &Card, cfg: &UrgencyConfig) -> Option<Priority> {
    let titles: Vec<String> = card.labels.iter().map(|l| l.title.to_lowercase()).collect();
    let any_contains = |builtin: &[&str], extra: &[String]| {
        titles.iter().any(|title| {
            builtin.iter().any(|kw| title.contains(kw))
                || extra
                    .iter()
                    .map(|kw| kw.trim().to_lowercase())
                    .filter(|kw| !kw.is_empty())
                    .any(|kw| title.contains(&kw))
        })
    };

    if any_contains(&HIGH_LABELS, &cfg.high_keywords) {
        Some(Priority::High)
    } else if any_contains(&LOW_LABELS, &cfg.low_keywords) {
        Some(Priority::Low)
    } else {
        None
    }
}
