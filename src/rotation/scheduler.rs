//! Timer driver for [`RotationState`].
//!
//! One spawned task owns both clocks: a deadline sleep for the display
//! duration and an interval for progress updates. Restarting aborts that
//! task, so both clocks die together; anything already past its await
//! point is stopped by the generation check in [`RotationState`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::state::{RotationPhase, RotationState};
use crate::config::RotationConfig;

/// Shared state the scheduler drives.
///
/// The rotation lives next to whatever it rotates over, so the owner can
/// replace its data and reset the rotation under one lock.
pub trait RotationHost: Send + 'static {
    fn rotation(&self) -> &RotationState;
    fn rotation_mut(&mut self) -> &mut RotationState;
    /// How long board `index` stays on screen.
    fn display_duration(&self, index: usize) -> Duration;
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock_or_recover<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(|p| p.into_inner())
}

/// Shortest progress tick the driver will arm.
const MIN_PROGRESS_TICK: Duration = Duration::from_millis(1);

/// Owns the driver task for one shared host.
pub struct RotationScheduler<H: RotationHost> {
    shared: Arc<Mutex<H>>,
    progress_tick: Duration,
    transition: Duration,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<H: RotationHost> RotationScheduler<H> {
    pub fn new(shared: Arc<Mutex<H>>, config: &RotationConfig) -> Self {
        Self {
            shared,
            progress_tick: config.progress_tick().max(MIN_PROGRESS_TICK),
            transition: config.transition(),
            driver: Mutex::new(None),
        }
    }

    /// Cancel any running driver and start one for the current generation.
    ///
    /// Callers reset the [`RotationState`] first (under the host lock) and
    /// then restart. Must be called within a tokio runtime.
    pub fn restart(&self) {
        let mut driver = lock_or_recover(&self.driver);
        if let Some(handle) = driver.take() {
            handle.abort();
        }

        let (generation, phase) = {
            let host = lock_or_recover(&self.shared);
            (host.rotation().generation(), host.rotation().phase())
        };
        if phase == RotationPhase::Idle {
            tracing::debug!(generation, "rotation idle");
            return;
        }

        tracing::debug!(generation, "rotation driver started");
        *driver = Some(tokio::spawn(drive(
            Arc::clone(&self.shared),
            generation,
            self.progress_tick,
            self.transition,
        )));
    }

    /// Cancel timers. The rotation state is left as it is.
    pub fn shutdown(&self) {
        if let Some(handle) = lock_or_recover(&self.driver).take() {
            handle.abort();
            tracing::debug!("rotation driver stopped");
        }
    }

    /// Whether a driver task is alive.
    pub fn is_running(&self) -> bool {
        lock_or_recover(&self.driver)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<H: RotationHost> Drop for RotationScheduler<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn drive<H: RotationHost>(
    shared: Arc<Mutex<H>>,
    generation: u64,
    progress_tick: Duration,
    transition: Duration,
) {
    loop {
        let next = {
            let host = lock_or_recover(&shared);
            if host.rotation().generation() != generation {
                return;
            }
            match host.rotation().phase() {
                RotationPhase::Idle => return,
                RotationPhase::Displaying { index, .. } => Step::Display {
                    index,
                    duration: host.display_duration(index),
                },
                RotationPhase::Transitioning { .. } => Step::Transition,
            }
        };

        if let Step::Display { index, duration } = next {
            tracing::trace!(index, ?duration, "displaying board");
            if !display(&shared, generation, duration, progress_tick).await {
                return;
            }
            if !lock_or_recover(&shared).rotation_mut().begin_transition(generation) {
                return;
            }
        }

        tokio::time::sleep(transition).await;
        if lock_or_recover(&shared)
            .rotation_mut()
            .finish_transition(generation)
            .is_none()
        {
            return;
        }
    }
}

enum Step {
    Display { index: usize, duration: Duration },
    Transition,
}

/// Run the progress clock until the display deadline. Returns `false` when
/// the generation went stale meanwhile.
async fn display<H: RotationHost>(
    shared: &Mutex<H>,
    generation: u64,
    duration: Duration,
    progress_tick: Duration,
) -> bool {
    let started = Instant::now();
    let deadline = started + duration;
    let mut ticker = tokio::time::interval_at(started + progress_tick, progress_tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            biased;
            _ = &mut sleep => return true,
            _ = ticker.tick() => {
                let progress = if duration.is_zero() {
                    100.0
                } else {
                    started.elapsed().as_secs_f64() / duration.as_secs_f64() * 100.0
                };
                if !lock_or_recover(shared).rotation_mut().set_progress(generation, progress) {
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    /// Host with fixed per-board durations.
    struct FixedHost {
        rotation: RotationState,
        durations: Vec<Duration>,
    }

    impl RotationHost for FixedHost {
        fn rotation(&self) -> &RotationState {
            &self.rotation
        }

        fn rotation_mut(&mut self) -> &mut RotationState {
            &mut self.rotation
        }

        fn display_duration(&self, index: usize) -> Duration {
            self.durations[index]
        }
    }

    fn config() -> RotationConfig {
        RotationConfig {
            base_duration_ms: 1_000,
            progress_tick_ms: 100,
            transition_ms: 150,
        }
    }

    fn setup(durations_ms: &[u64]) -> (Arc<Mutex<FixedHost>>, RotationScheduler<FixedHost>) {
        let host = Arc::new(Mutex::new(FixedHost {
            rotation: RotationState::new(durations_ms.len()),
            durations: durations_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
        }));
        let scheduler = RotationScheduler::new(Arc::clone(&host), &config());
        (host, scheduler)
    }

    fn phase(host: &Arc<Mutex<FixedHost>>) -> RotationPhase {
        host.lock().unwrap().rotation.phase()
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    /// Let the driver arm its clocks, move time forward, let it react.
    async fn advance(ms: u64) {
        settle().await;
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_progress_tick_still_rotates() {
        let host = Arc::new(Mutex::new(FixedHost {
            rotation: RotationState::new(2),
            durations: vec![Duration::from_millis(1_000); 2],
        }));
        let config = RotationConfig {
            progress_tick_ms: 0,
            ..config()
        };
        let scheduler = RotationScheduler::new(Arc::clone(&host), &config);
        scheduler.restart();

        advance(1_010).await;
        assert_eq!(phase(&host), RotationPhase::Transitioning { from: 0, to: 1 });
        advance(150).await;
        assert!(matches!(phase(&host), RotationPhase::Displaying { index: 1, .. }));
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn progress_advances_then_board_changes() {
        let (host, scheduler) = setup(&[1_000, 2_000]);
        scheduler.restart();
        assert!(scheduler.is_running());

        advance(500).await;
        let RotationPhase::Displaying { index, progress } = phase(&host) else {
            panic!("expected displaying");
        };
        assert_eq!(index, 0);
        assert!((40.0..=60.0).contains(&progress), "progress {progress}");

        advance(510).await;
        assert_eq!(phase(&host), RotationPhase::Transitioning { from: 0, to: 1 });

        advance(150).await;
        assert_eq!(
            phase(&host),
            RotationPhase::Displaying {
                index: 1,
                progress: 0.0
            }
        );

        advance(2_000).await;
        advance(150).await;
        let RotationPhase::Displaying { index, .. } = phase(&host) else {
            panic!("expected displaying");
        };
        assert_eq!(index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_rotation_spawns_no_driver() {
        let (host, scheduler) = setup(&[1_000]);
        scheduler.restart();
        assert!(!scheduler.is_running());
        advance(5_000).await;
        assert_eq!(phase(&host), RotationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_transition_leaves_no_residual_timer() {
        let (host, scheduler) = setup(&[1_000, 1_000, 1_000]);
        scheduler.restart();

        advance(1_010).await;
        assert!(matches!(phase(&host), RotationPhase::Transitioning { .. }));

        host.lock().unwrap().rotation.reset(3);
        scheduler.restart();
        assert_eq!(
            phase(&host),
            RotationPhase::Displaying {
                index: 0,
                progress: 0.0
            }
        );

        // The old transition would have finished here.
        advance(200).await;
        let RotationPhase::Displaying { index, .. } = phase(&host) else {
            panic!("expected displaying");
        };
        assert_eq!(index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_to_single_board_goes_idle() {
        let (host, scheduler) = setup(&[1_000, 1_000]);
        scheduler.restart();
        advance(1_010).await;

        host.lock().unwrap().rotation.reset(1);
        scheduler.restart();
        assert!(!scheduler.is_running());
        advance(3_000).await;
        assert_eq!(phase(&host), RotationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_timers() {
        let (host, scheduler) = setup(&[1_000, 1_000]);
        scheduler.restart();
        advance(300).await;
        scheduler.shutdown();
        assert!(!scheduler.is_running());

        let before = phase(&host);
        advance(5_000).await;
        assert_eq!(phase(&host), before);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_driver_cannot_write() {
        let (host, _scheduler) = setup(&[1_000, 1_000]);
        let generation = host.lock().unwrap().rotation.generation();
        let stale = tokio::spawn(drive(
            Arc::clone(&host),
            generation,
            Duration::from_millis(100),
            Duration::from_millis(150),
        ));

        host.lock().unwrap().rotation.reset(2);
        advance(2_000).await;
        assert_eq!(
            phase(&host),
            RotationPhase::Displaying {
                index: 0,
                progress: 0.0
            }
        );
        assert!(stale.is_finished());
    }
}
