//! Deterministic journey engine
//!
//! All progression logic lives here. This module must be pure and deterministic:
//! - Time arrives as explicit `now_ms` arguments, never from a clock
//! - Delayed work goes through the effect timeline, never a platform timer
//! - Storage goes through the `ProgressStore` seam
//! - No rendering or platform dependencies

pub mod journey;
pub mod schedule;
pub mod state;

pub use journey::{Journey, Snapshot};
pub use schedule::{Effect, Timeline};
pub use state::{JourneyState, Phase};
