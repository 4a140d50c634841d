//! Pure rotation state machine.
//!
//! Every mutation that a timer can trigger takes the generation it was
//! scheduled under and is a no-op when the state has since been reset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the rotation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RotationPhase {
    /// Zero or one board: nothing rotates.
    Idle,
    /// Board `index` is on screen; `progress` runs from 0 to 100.
    Displaying { index: usize, progress: f64 },
    /// Fading from board `from` to board `to`.
    Transitioning { from: usize, to: usize },
}

/// Rotation state for one accepted aggregate result.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationState {
    board_count: usize,
    phase: RotationPhase,
    generation: u64,
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RotationState {
    pub fn new(board_count: usize) -> Self {
        Self {
            board_count,
            phase: initial_phase(board_count),
            generation: 0,
        }
    }

    /// Start over for a new result. Returns the new generation.
    ///
    /// Resetting an idle state to another idle state keeps the generation,
    /// so repeated empty refreshes do not churn timers.
    pub fn reset(&mut self, board_count: usize) -> u64 {
        let phase = initial_phase(board_count);
        if phase == RotationPhase::Idle && self.phase == RotationPhase::Idle {
            self.board_count = board_count;
            return self.generation;
        }
        self.board_count = board_count;
        self.phase = phase;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn board_count(&self) -> usize {
        self.board_count
    }

    /// Index of the board on screen. During a transition this is still the
    /// outgoing board; for an idle single-board rotation it is 0.
    pub fn index(&self) -> Option<usize> {
        match self.phase {
            RotationPhase::Idle if self.board_count == 1 => Some(0),
            RotationPhase::Idle => None,
            RotationPhase::Displaying { index, .. } => Some(index),
            RotationPhase::Transitioning { from, .. } => Some(from),
        }
    }

    pub fn progress(&self) -> f64 {
        match self.phase {
            RotationPhase::Idle => 0.0,
            RotationPhase::Displaying { progress, .. } => progress,
            RotationPhase::Transitioning { .. } => 100.0,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, RotationPhase::Transitioning { .. })
    }

    /// Update progress. Returns `false` when `generation` is stale or the
    /// rotation is not displaying.
    pub fn set_progress(&mut self, generation: u64, value: f64) -> bool {
        if generation != self.generation {
            return false;
        }
        match &mut self.phase {
            RotationPhase::Displaying { progress, .. } => {
                *progress = value.clamp(0.0, 100.0);
                true
            }
            _ => false,
        }
    }

    /// Display time is up: move to `Transitioning`. Returns `false` when
    /// `generation` is stale or the rotation is not displaying.
    pub fn begin_transition(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.board_count == 0 {
            return false;
        }
        match self.phase {
            RotationPhase::Displaying { index, .. } => {
                self.phase = RotationPhase::Transitioning {
                    from: index,
                    to: (index + 1) % self.board_count,
                };
                true
            }
            _ => false,
        }
    }

    /// Transition delay elapsed: display the next board from progress 0.
    /// Returns the new index, or `None` when `generation` is stale or no
    /// transition is in flight.
    pub fn finish_transition(&mut self, generation: u64) -> Option<usize> {
        if generation != self.generation {
            return None;
        }
        match self.phase {
            RotationPhase::Transitioning { to, .. } => {
                self.phase = RotationPhase::Displaying {
                    index: to,
                    progress: 0.0,
                };
                Some(to)
            }
            _ => None,
        }
    }
}

fn initial_phase(board_count: usize) -> RotationPhase {
    if board_count <= 1 {
        RotationPhase::Idle
    } else {
        RotationPhase::Displaying {
            index: 0,
            progress: 0.0,
        }
    }
}

/// Percentage of the base duration a board is shown for, by urgent count.
pub fn duration_percent(urgent_count: usize) -> u32 {
    match urgent_count {
        0 => 50,
        1 => 60,
        2 => 70,
        3 => 80,
        4 => 90,
        _ => 100,
    }
}

/// Display time for a board with `urgent_count` urgent cards.
pub fn rotation_duration(urgent_count: usize, base: Duration) -> Duration {
    base * duration_percent(urgent_count) / 100
}
