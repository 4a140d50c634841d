//! Board rotation: a pure state machine plus the timer task that drives it.
//!
//! ```text
//!            duration elapsed             transition elapsed
//! Displaying(i, 0..100) ──────▶ Transitioning(i → i+1) ──────▶ Displaying(i+1, 0)
//!        ▲                                                            │
//!        └──────────────── reset on every accepted result ◀───────────┘
//! ```
//!
//! With zero or one board the rotation is `Idle` and no timer runs.

pub mod scheduler;
pub mod state;

pub(crate) use scheduler::lock_or_recover;
pub use scheduler::{RotationHost, RotationScheduler};
pub use state::{RotationPhase, RotationState, duration_percent, rotation_duration};
