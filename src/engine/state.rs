//! Journey state and phase types.
//!
//! Everything that must survive a session lives in [`JourneyState`]; the
//! save format it maps to is in the `persistence` module.

/// Current phase of the journey.
///
/// `Intro`, `Completed` and `PostGame` are resting phases, safe to resume
/// into. `Playing` is transient: a save taken mid-`Playing` still reopens at
/// the intro screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Title screen, the phase every session starts in.
    Intro,
    /// Active task display.
    Playing,
    /// Shown once per run, on completing the final level.
    Completed,
    /// Kings' Path reflection mode.
    PostGame,
}

impl Phase {
    /// Wire name, as written into the save (and as the original web saves
    /// spelled it).
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Intro => "INTRO",
            Phase::Playing => "PLAYING",
            Phase::Completed => "COMPLETED",
            Phase::PostGame => "POST_GAME",
        }
    }
}

/// Complete progression state for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyState {
    /// Current/next level to attempt, 1-based. Only a completed task moves
    /// it, and only upward; a full reset is the one way back down.
    pub level: u32,
    /// Current phase.
    pub phase: Phase,
    /// Epoch millis of the last level advance. Informational only.
    pub last_visit_ms: i64,
    /// Set exactly once, on completing the final level. Cleared only by a
    /// full reset.
    pub kings_path_unlocked: bool,
}

impl JourneyState {
    /// Fresh first-run state.
    pub fn new(now_ms: i64) -> Self {
        Self {
            level: 1,
            phase: Phase::Intro,
            last_visit_ms: now_ms,
            kings_path_unlocked: false,
        }
    }
}
