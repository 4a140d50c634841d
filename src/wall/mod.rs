//! The display engine facade.
//!
//! [`TaskWall`] owns the latest [`AggregateResult`] together with the
//! rotation over its boards. Both live in one [`WallState`] behind one
//! mutex, so a reader never sees a new result paired with an index from
//! the old one.
//!
//! # Refresh
//!
//! Manual and background refreshes share [`TaskWall::refresh`]:
//! fetch, then replace the result and restart the rotation. A manual
//! refresh raises the `loading` flag while it runs; a background refresh
//! keeps showing the current result. A failed refresh keeps the previous
//! result and records the error next to it.

pub mod state;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WallConfig;
use crate::error::Result;
use crate::rotation::{RotationScheduler, lock_or_recover};
use crate::selection::{SelectionStore, effective_filter};
use crate::sorter::{DisplayTask, top_tasks};
use crate::urgency::classify;
use taskwall_deck::{AggregateResult, BoardSource};

pub use state::{
    AggregateView, BoardHeader, ClassifiedTask, Clock, FrameStatus, RotationSnapshot, WallFrame,
    WallState, system_clock,
};

/// Who asked for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Operator-triggered; shows a blocking loading indicator.
    Manual,
    /// Periodic; silent.
    Background,
}

/// Aggregated boards plus their rotation, for one display.
pub struct TaskWall<S: BoardSource> {
    source: S,
    config: WallConfig,
    state: Arc<Mutex<WallState>>,
    scheduler: RotationScheduler<WallState>,
    selection: Mutex<BTreeSet<i64>>,
    selection_store: Option<SelectionStore>,
    refresh_guard: tokio::sync::Mutex<()>,
    clock: Clock,
}

impl<S: BoardSource> TaskWall<S> {
    /// Create a wall over `source` using the system clock and no persisted
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WallError::Config`] if `config` does not validate.
    pub fn new(source: S, config: WallConfig) -> Result<Self> {
        Self::with_clock(source, config, system_clock())
    }

    /// Create a wall with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WallError::Config`] if `config` does not validate.
    pub fn with_clock(source: S, config: WallConfig, clock: Clock) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(Mutex::new(WallState::new(
            config.rotation.base_duration(),
            config.urgency.clone(),
            Arc::clone(&clock),
        )));
        let scheduler = RotationScheduler::new(Arc::clone(&state), &config.rotation);
        Ok(Self {
            source,
            config,
            state,
            scheduler,
            selection: Mutex::new(BTreeSet::new()),
            selection_store: None,
            refresh_guard: tokio::sync::Mutex::new(()),
            clock,
        })
    }

    /// Load the saved selection from `store` and persist later changes there.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the saved selection cannot be read.
    pub fn with_selection_store(mut self, store: SelectionStore) -> Result<Self> {
        let saved = store.load()?;
        tracing::info!(boards = saved.len(), path = %store.path().display(), "selection loaded");
        *lock_or_recover(&self.selection) = saved;
        self.selection_store = Some(store);
        Ok(self)
    }

    pub fn config(&self) -> &WallConfig {
        &self.config
    }

    /// Board ids the next refresh will fetch. Empty means all boards.
    pub fn board_filter(&self) -> Vec<i64> {
        effective_filter(&lock_or_recover(&self.selection), &self.config.deck.board_ids)
    }

    pub fn selected_boards(&self) -> BTreeSet<i64> {
        lock_or_recover(&self.selection).clone()
    }

    /// Fetch with the current filter and accept the result.
    ///
    /// # Errors
    ///
    /// Returns the aggregation error. The previous result stays in place
    /// and the error is reported through [`TaskWall::aggregate_view`].
    pub async fn refresh(&self, mode: RefreshMode) -> Result<()> {
        let _guard = self.refresh_guard.lock().await;
        let _loading = (mode == RefreshMode::Manual).then(|| LoadingFlag::raise(&self.state));

        let filter = self.board_filter();
        tracing::debug!(?mode, ?filter, "refreshing boards");
        match taskwall_deck::fetch_all(&self.source, &filter).await {
            Ok(result) => {
                self.accept_result(result);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(?mode, error = %err, "refresh failed, keeping previous result");
                lock_or_recover(&self.state).last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Replace the current result and restart the rotation from the first
    /// board.
    pub fn accept_result(&self, result: AggregateResult) {
        let (boards, cards) = (result.boards.len(), result.total_cards());
        let generation = lock_or_recover(&self.state).accept(result);
        tracing::info!(boards, cards, generation, "result accepted");
        self.scheduler.restart();
    }

    /// Change the board selection, persist it, and refresh.
    ///
    /// # Errors
    ///
    /// Returns the store error if the selection cannot be saved (the
    /// in-memory selection is still updated), or the refresh error.
    pub async fn select_boards(&self, board_ids: BTreeSet<i64>) -> Result<()> {
        *lock_or_recover(&self.selection) = board_ids.clone();
        if let Some(store) = &self.selection_store {
            store.save(&board_ids)?;
        }
        self.refresh(RefreshMode::Manual).await
    }

    pub fn aggregate_view(&self) -> AggregateView {
        lock_or_recover(&self.state).view()
    }

    pub fn rotation_snapshot(&self) -> RotationSnapshot {
        lock_or_recover(&self.state).snapshot()
    }

    /// The `limit` most important tasks of the board on screen.
    pub fn display_tasks(&self, limit: usize) -> Vec<DisplayTask> {
        let now = (self.clock)();
        let state = lock_or_recover(&self.state);
        state
            .current_board()
            .map(|board| top_tasks(board, limit, now, &self.config.urgency))
            .unwrap_or_default()
    }

    /// Everything the renderer needs for one tick.
    pub fn frame(&self) -> WallFrame {
        let now = (self.clock)();
        let state = lock_or_recover(&self.state);
        let view = state.view();
        let tasks = state
            .current_board()
            .map(|board| {
                top_tasks(board, self.config.display.task_limit, now, &self.config.urgency)
            })
            .unwrap_or_default()
            .into_iter()
            .map(|task| ClassifiedTask {
                classification: classify(&task.card, now, &self.config.urgency),
                task,
            })
            .collect();

        WallFrame {
            generated_at: now,
            status: FrameStatus::from(&view),
            rotation: state.snapshot(),
            tasks,
        }
    }

    /// Stop rotation timers.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}

/// The `loading` flag of a manual refresh. Lowered on drop, so a refresh
/// future dropped mid-fetch does not leave the view stuck on loading.
struct LoadingFlag<'a>(&'a Mutex<WallState>);

impl<'a> LoadingFlag<'a> {
    fn raise(state: &'a Mutex<WallState>) -> Self {
        lock_or_recover(state).loading = true;
        Self(state)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        lock_or_recover(self.0).loading = false;
    }
}

impl<S: BoardSource + 'static> TaskWall<S> {
    /// Refresh every `refresh.interval_secs` in the background until
    /// `cancel` fires. The first background refresh happens one interval
    /// from now.
    pub fn spawn_refresh_loop(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let wall = Arc::clone(self);
        let period = wall.config.refresh.interval();
        tokio::spawn(async move {
            tracing::info!(interval_secs = period.as_secs(), "background refresh started");
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("background refresh cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        // Failures are already recorded on the wall.
                        let _ = wall.refresh(RefreshMode::Background).await;
                    }
                }
            }
        })
    }
}
