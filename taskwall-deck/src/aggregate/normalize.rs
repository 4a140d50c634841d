//! Default-filling conversion from wire payloads to the entity model.
//!
//! This is the only place that probes JSON shapes. Everything downstream
//! works with [`Card`], [`Stack`] and [`Board`] and never sees a missing
//! field.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::types::{AssignedUser, Board, BoardSummary, Card, Label, Stack};
use crate::wire::{BoardPayload, StackPayload};

/// Convert one raw card. Returns `None` when the value is not an object or
/// carries no integer id.
pub fn normalize_card(raw: &Value) -> Option<Card> {
    let obj = raw.as_object()?;
    let id = obj.get("id").and_then(Value::as_i64)?;

    Some(Card {
        id,
        title: string_field(obj.get("title")),
        description: string_field(obj.get("description")),
        due: obj.get("duedate").and_then(parse_timestamp),
        labels: obj.get("labels").map(parse_labels).unwrap_or_default(),
        assigned_users: obj
            .get("assignedUsers")
            .map(parse_assigned_users)
            .unwrap_or_default(),
        created_at: obj.get("createdAt").and_then(parse_timestamp),
        archived: obj.get("archived").and_then(Value::as_bool).unwrap_or(false),
        done: obj.get("done").is_some_and(parse_done),
        order: obj.get("order").and_then(Value::as_i64).unwrap_or(0),
    })
}

/// Convert a stack payload together with the raw cards that belong to it.
/// Cards that cannot be normalised are skipped with a warning.
pub fn normalize_stack(board_id: i64, payload: &StackPayload, raw_cards: &[Value]) -> Stack {
    let mut cards = Vec::with_capacity(raw_cards.len());
    for raw in raw_cards {
        match normalize_card(raw) {
            Some(card) => cards.push(card),
            None => tracing::warn!(
                board_id,
                stack_id = payload.id,
                "skipping card without an integer id"
            ),
        }
    }

    Stack {
        id: payload.id,
        title: payload.title.clone().unwrap_or_default(),
        order: payload.order.unwrap_or(0),
        cards,
    }
}

/// Assemble a board from its identifying fields and already-normalised stacks.
pub fn normalize_board(
    id: i64,
    title: Option<&str>,
    color: Option<&str>,
    stacks: Vec<Stack>,
) -> Board {
    Board {
        id,
        title: title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| fallback_board_title(id), str::to_owned),
        color: color.and_then(normalize_color),
        stacks,
    }
}

/// Summary entry for a listed board.
pub fn summarize(payload: &BoardPayload) -> BoardSummary {
    BoardSummary {
        id: payload.id,
        title: payload
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| fallback_board_title(payload.id)),
        color: payload.color.as_deref().and_then(normalize_color),
        archived: payload.is_archived(),
    }
}

/// Title used when the service did not provide one.
pub fn fallback_board_title(id: i64) -> String {
    format!("Board {id}")
}

/// Normalise a colour to `#rrggbb` (or `#rgb`) form. Non-hex values are
/// kept verbatim; empty values become `None`.
pub fn normalize_color(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('#') {
        return Some(trimmed.to_ascii_lowercase());
    }
    let is_hex = (trimmed.len() == 6 || trimmed.len() == 3)
        && trimmed.chars().all(|c| c.is_ascii_hexdigit());
    if is_hex {
        Some(format!("#{}", trimmed.to_ascii_lowercase()))
    } else {
        Some(trimmed.to_owned())
    }
}

fn string_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Parse a timestamp given as epoch seconds, RFC 3339, or a naive local
/// date/datetime. Unparseable or non-positive values yield `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            if secs <= 0 {
                return None;
            }
            DateTime::from_timestamp(secs, 0)
        }
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // PHP's DateTime::ATOM variant without colon in the offset.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return local_to_utc(date.and_hms_opt(0, 0, 0)?);
    }
    if let Ok(secs) = s.parse::<i64>() {
        return parse_timestamp(&Value::from(secs));
    }
    tracing::debug!(value = s, "unparseable timestamp ignored");
    None
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `done` is a boolean on older services and a completion timestamp (or
/// `null`) on newer ones.
fn parse_done(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    }
}

fn parse_labels(value: &Value) -> Vec<Label> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(title) => Some(Label::new(title.clone())),
            Value::Object(obj) => {
                let title = obj.get("title").and_then(Value::as_str)?;
                Some(Label {
                    title: title.to_owned(),
                    color: obj
                        .get("color")
                        .and_then(Value::as_str)
                        .and_then(normalize_color),
                })
            }
            _ => None,
        })
        .collect()
}

fn parse_assigned_users(value: &Value) -> Vec<AssignedUser> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(uid) => Some(AssignedUser::new(uid.clone())),
            Value::Object(obj) => {
                let person = obj.get("participant").unwrap_or(item);
                let uid = person
                    .get("uid")
                    .or_else(|| person.get("primaryKey"))
                    .and_then(Value::as_str)?;
                let display_name = person
                    .get("displayname")
                    .and_then(Value::as_str)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(uid);
                Some(AssignedUser {
                    uid: uid.to_owned(),
                    display_name: display_name.to_owned(),
                })
            }
            _ => None,
        })
        .collect()
}
