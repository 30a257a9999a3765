//! DO OR DO - A wonderland of choice
//!
//! One symbolic task per level, one hundred levels, one save slot.
//!
//! Core modules:
//! - `engine`: Deterministic progression (phase machine, timed effects)
//! - `content`: The fixed narrative and task pools
//! - `persistence`: Save format and the storage seam
//! - `platform`: Browser/native clock and storage backends

pub mod content;
pub mod engine;
pub mod persistence;
pub mod platform;

pub use content::{MAX_LEVEL, Task, TaskCategory, reflection_for_day, task_for_level};
pub use engine::{Journey, JourneyState, Phase, Snapshot};
pub use persistence::{MemoryStore, ProgressStore, SavedState, STORAGE_KEY};

/// Pacing constants, all in milliseconds
pub mod consts {
    /// How long the bloom overlay covers the screen after a completion
    pub const BLOOM_DURATION_MS: i64 = 1500;
    /// Delay before a confirmed completion mutates the journey; must stay
    /// shorter than the bloom so the swap happens under cover
    pub const COMPLETION_SWAP_DELAY_MS: i64 = 500;
    /// How long the skip message stays on screen
    pub const SKIP_MESSAGE_DURATION_MS: i64 = 3000;
    /// Pause on the savor prompt before completion can be confirmed
    pub const SAVOR_DELAY_MS: i64 = 1500;
}
