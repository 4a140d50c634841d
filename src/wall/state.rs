//! Shared wall state and the read-only views handed to the renderer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::UrgencyConfig;
use crate::rotation::{RotationHost, RotationState, rotation_duration};
use crate::sorter::DisplayTask;
use crate::urgency::{Classification, urgent_count};
use taskwall_deck::{AggregateResult, Board};

/// Source of "now" for urgency and ordering decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The system clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Everything that must change together when a new result is accepted.
pub struct WallState {
    pub(crate) result: Option<Arc<AggregateResult>>,
    pub(crate) rotation: RotationState,
    pub(crate) loading: bool,
    pub(crate) last_error: Option<String>,
    pub(crate) base_duration: Duration,
    pub(crate) urgency: UrgencyConfig,
    pub(crate) clock: Clock,
}

impl WallState {
    pub(crate) fn new(base_duration: Duration, urgency: UrgencyConfig, clock: Clock) -> Self {
        Self {
            result: None,
            rotation: RotationState::default(),
            loading: false,
            last_error: None,
            base_duration,
            urgency,
            clock,
        }
    }

    /// Replace the result and restart the rotation in the same step.
    /// Returns the new rotation generation.
    pub(crate) fn accept(&mut self, result: AggregateResult) -> u64 {
        let boards = result.boards.len();
        self.result = Some(Arc::new(result));
        self.loading = false;
        self.last_error = None;
        self.rotation.reset(boards)
    }

    /// Board currently on screen.
    pub(crate) fn current_board(&self) -> Option<&Board> {
        let index = self.rotation.index()?;
        self.result.as_ref()?.boards.get(index)
    }

    pub(crate) fn view(&self) -> AggregateView {
        if self.loading {
            return AggregateView::Loading;
        }
        match (&self.result, &self.last_error) {
            (Some(result), stale_error) => AggregateView::Ready {
                result: Arc::clone(result),
                stale_error: stale_error.clone(),
            },
            (None, Some(error)) => AggregateView::Failed(error.clone()),
            (None, None) => AggregateView::Loading,
        }
    }

    pub(crate) fn snapshot(&self) -> RotationSnapshot {
        let now = (self.clock)();
        RotationSnapshot {
            current_board: self.current_board().map(|board| BoardHeader {
                id: board.id,
                title: board.title.clone(),
                color: board.color.clone(),
                urgent_count: urgent_count(board, now, &self.urgency),
            }),
            index: self.rotation.index(),
            total: self.result.as_ref().map_or(0, |r| r.boards.len()),
            progress: self.rotation.progress(),
            transitioning: self.rotation.is_transitioning(),
        }
    }
}

impl RotationHost for WallState {
    fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    fn rotation_mut(&mut self) -> &mut RotationState {
        &mut self.rotation
    }

    fn display_duration(&self, index: usize) -> Duration {
        let now = (self.clock)();
        let urgent = self
            .result
            .as_ref()
            .and_then(|r| r.boards.get(index))
            .map_or(0, |board| urgent_count(board, now, &self.urgency));
        rotation_duration(urgent, self.base_duration)
    }
}

/// What the renderer should show for the aggregate as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateView {
    /// No result yet, or a manual refresh is in flight.
    Loading,
    /// A result is available. `stale_error` is set when the latest refresh
    /// failed and this is the previous good result.
    Ready {
        result: Arc<AggregateResult>,
        stale_error: Option<String>,
    },
    /// Nothing was ever fetched successfully.
    Failed(String),
}

/// Identifying fields of the board on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardHeader {
    pub id: i64,
    pub title: String,
    pub color: Option<String>,
    pub urgent_count: usize,
}

/// Rotation position for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationSnapshot {
    pub current_board: Option<BoardHeader>,
    pub index: Option<usize>,
    pub total: usize,
    pub progress: f64,
    pub transitioning: bool,
}

/// A display task with its priority classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedTask {
    #[serde(flatten)]
    pub task: DisplayTask,
    pub classification: Classification,
}

/// Overall status line of a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FrameStatus {
    Loading,
    Ready {
        fetched_at: DateTime<Utc>,
        boards: usize,
        cards: usize,
        stale_error: Option<String>,
    },
    Failed {
        error: String,
    },
}

impl From<&AggregateView> for FrameStatus {
    fn from(view: &AggregateView) -> Self {
        match view {
            AggregateView::Loading => Self::Loading,
            AggregateView::Ready {
                result,
                stale_error,
            } => Self::Ready {
                fetched_at: result.fetched_at,
                boards: result.boards.len(),
                cards: result.total_cards(),
                stale_error: stale_error.clone(),
            },
            AggregateView::Failed(error) => Self::Failed {
                error: error.clone(),
            },
        }
    }
}

/// One complete render snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallFrame {
    pub generated_at: DateTime<Utc>,
    pub status: FrameStatus,
    pub rotation: RotationSnapshot,
    pub tasks: Vec<ClassifiedTask>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use taskwall_deck::{Card, Stack};

    fn fixed_clock() -> Clock {
        Arc::new(|| Utc.with_ymd_and_hms(2026, 5, 12, 9, 0, 0).unwrap())
    }

    fn state() -> WallState {
        WallState::new(Duration::from_secs(40), UrgencyConfig::default(), fixed_clock())
    }

    fn board_with_urgent(id: i64, urgent: usize) -> Board {
        let now = Utc.with_ymd_and_hms(2026, 5, 12, 9, 0, 0).unwrap();
        let cards = (0..urgent)
            .map(|i| {
                let mut card = Card::new(i as i64, "soon");
                card.due = Some(now + chrono::Duration::days(1));
                card
            })
            .collect();
        Board::new(id, format!("Board {id}"), vec![Stack::new(1, "To Do", cards)])
    }

    #[test]
    fn empty_state_is_loading() {
        assert_eq!(state().view(), AggregateView::Loading);
    }

    #[test]
    fn error_without_result_is_failed() {
        let mut s = state();
        s.last_error = Some("service returned 401: nope".into());
        assert_eq!(s.view(), AggregateView::Failed("service returned 401: nope".into()));
    }

    #[test]
    fn error_with_result_is_stale_ready() {
        let mut s = state();
        s.accept(AggregateResult::new(vec![board_with_urgent(1, 0)]));
        s.last_error = Some("timeout".into());
        let AggregateView::Ready { stale_error, .. } = s.view() else {
            panic!("expected ready view");
        };
        assert_eq!(stale_error.as_deref(), Some("timeout"));
    }

    #[test]
    fn accept_clears_error_and_resets_rotation() {
        let mut s = state();
        s.loading = true;
        s.last_error = Some("old".into());
        s.accept(AggregateResult::new(vec![board_with_urgent(1, 0), board_with_urgent(2, 0)]));
        assert!(!s.loading);
        assert!(s.last_error.is_none());
        assert_eq!(s.rotation.index(), Some(0));
        assert_eq!(s.current_board().map(|b| b.id), Some(1));
    }

    #[test]
    fn display_duration_scales_with_urgency() {
        let mut s = state();
        s.accept(AggregateResult::new(vec![board_with_urgent(1, 6), board_with_urgent(2, 0)]));
        assert_eq!(s.display_duration(0), Duration::from_secs(40));
        assert_eq!(s.display_duration(1), Duration::from_secs(20));
        assert_eq!(s.display_duration(9), Duration::from_secs(20));
    }

    #[test]
    fn empty_result_has_no_current_board() {
        let mut s = state();
        s.accept(AggregateResult::new(vec![]));
        let snapshot = s.snapshot();
        assert!(snapshot.current_board.is_none());
        assert_eq!(snapshot.index, None);
        assert_eq!(snapshot.total, 0);
        assert!(matches!(s.view(), AggregateView::Ready { .. }));
    }

    #[test]
    fn snapshot_reports_urgent_count() {
        let mut s = state();
        s.accept(AggregateResult::new(vec![board_with_urgent(4, 2)]));
        let header = s.snapshot().current_board.expect("board");
        assert_eq!(header.id, 4);
        assert_eq!(header.urgent_count, 2);
    }
}
