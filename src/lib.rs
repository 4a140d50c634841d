//! Taskwall: task aggregation and display rotation for a foyer display.
//!
//! Boards, stacks and cards are pulled from a Deck-style board service by
//! [`taskwall_deck`] and turned into what an unattended screen shows:
//! one board at a time, its most pressing tasks first, rotating on a timer
//! that lingers longer on boards with more urgent work.
//!
//! # Architecture
//!
//! - **Aggregation** (`taskwall_deck`): concurrent per-board fetch with a
//!   fallback chain; failing boards are dropped, not fatal
//! - **Urgency** ([`urgency`]): label and due-date classification
//! - **Sorting** ([`sorter`]): tiered ordering of a board's active cards
//! - **Rotation** ([`rotation`]): state machine plus one timer task
//! - **Wall** ([`wall`]): result and rotation under one lock, refresh loop,
//!   render frames
//! - **Selection** ([`selection`]): persisted choice of boards

pub mod config;
pub mod error;
pub mod paths;
pub mod rotation;
pub mod selection;
pub mod sorter;
pub mod urgency;
pub mod wall;

pub use config::WallConfig;
pub use error::{Result, WallError};
pub use rotation::{RotationPhase, RotationScheduler, RotationState};
pub use selection::SelectionStore;
pub use sorter::{DisplayTask, top_tasks};
pub use urgency::{Classification, ColorHint, Priority, classify, is_urgent};
pub use wall::{AggregateView, RefreshMode, RotationSnapshot, TaskWall, WallFrame};
