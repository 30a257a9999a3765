//! The progression engine.
//!
//! [`Journey`] owns the phase machine, the level counter, the unlock flag,
//! the transient message, and the effect timeline, and it re-persists after
//! every durable change. All mutation goes through the intent handlers and
//! [`Journey::advance`]; shells only ever read snapshots back out.

use crate::consts::{BLOOM_DURATION_MS, COMPLETION_SWAP_DELAY_MS, SKIP_MESSAGE_DURATION_MS};
use crate::content::{self, MAX_LEVEL, RESET_MESSAGE, SKIP_MESSAGE, Task};
use crate::persistence::{ProgressStore, SavedState};

use super::schedule::{Effect, Timeline};
use super::state::{JourneyState, Phase};

/// Transient narrative message, replaced wholesale by each new post.
#[derive(Debug, Clone, Copy)]
struct Message {
    /// Expiry effects carry this id, so an old timer cannot clear a newer
    /// message.
    id: u64,
    text: &'static str,
}

/// Read-only view of the current state, rebuilt per render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub level: u32,
    pub phase: Phase,
    /// The current task, present only while `Playing`.
    pub task: Option<Task>,
    pub kings_path_unlocked: bool,
}

/// The progression engine. Single-threaded: intents and due effects mutate
/// state in call order, nothing blocks, and effects are observed through a
/// subsequent snapshot.
pub struct Journey<S: ProgressStore> {
    state: JourneyState,
    store: S,
    timeline: Timeline,
    message: Option<Message>,
    /// Raised the instant a completion is requested, lowered by the run's
    /// own `EndBloom` or by a reset.
    bloom: bool,
    /// Run generation; bumped on every reset so in-flight completion
    /// effects from the previous run disarm themselves.
    run: u64,
    next_message_id: u64,
}

impl<S: ProgressStore> Journey<S> {
    /// Load the saved journey (or start fresh) and persist the normalized
    /// state back.
    ///
    /// The stored phase is never trusted: whatever was active when the last
    /// session ended, this one resumes at the intro screen.
    pub fn load(store: S, now_ms: i64) -> Self {
        let state = match store.load().and_then(|json| SavedState::decode(&json)) {
            Some(saved) => {
                log::info!("Resuming journey at level {}", saved.level);
                JourneyState {
                    level: saved.level,
                    phase: Phase::Intro,
                    last_visit_ms: saved.last_visit.unwrap_or(now_ms),
                    kings_path_unlocked: saved.kings_path_unlocked,
                }
            }
            None => {
                log::info!("No usable save, starting a fresh journey");
                JourneyState::new(now_ms)
            }
        };

        let mut journey = Self {
            state,
            store,
            timeline: Timeline::new(),
            message: None,
            bloom: false,
            run: 0,
            next_message_id: 0,
        };
        journey.persist();
        journey
    }

    /// Leave the intro screen.
    ///
    /// With `reset = false`: into `Playing` for the current level, or
    /// straight to `PostGame` when the journey is already finished (final
    /// level done and the path unlocked, or a legacy save past the final
    /// level). With `reset = true`: wipe everything and start a fresh run,
    /// from any phase. Reset is the one way back down.
    pub fn begin(&mut self, reset: bool, now_ms: i64) {
        if reset {
            self.run += 1;
            self.bloom = false;
            self.state = JourneyState::new(now_ms);
            self.state.phase = Phase::Playing;
            self.post_message(RESET_MESSAGE, None, now_ms);
            log::info!("Journey reset, starting over at level 1");
            self.persist();
            return;
        }

        if self.state.phase != Phase::Intro {
            log::debug!("begin ignored in phase {:?}", self.state.phase);
            return;
        }

        self.message = None;
        self.state.phase = if self.state.level > MAX_LEVEL {
            // Finished on an older version that counted past the end.
            Phase::PostGame
        } else if self.state.level == MAX_LEVEL && self.state.kings_path_unlocked {
            // Returning after the final completion: the Completed screen is
            // shown once per run, so re-entry goes straight to the path.
            Phase::PostGame
        } else {
            Phase::Playing
        };
        log::debug!("begin -> {:?} at level {}", self.state.phase, self.state.level);
        self.persist();
    }

    /// Mark the current task complete.
    ///
    /// Raises the bloom immediately and arms the two fixed delays: the
    /// bloom runs its full duration, and the actual state swap fires part
    /// way through so the change lands while the screen is covered. Both
    /// effects always run to completion; nothing later cancels them.
    pub fn task_complete(&mut self, now_ms: i64) {
        if self.state.phase != Phase::Playing {
            log::debug!("task_complete ignored in phase {:?}", self.state.phase);
            return;
        }
        if self.completion_pending() {
            // The presentation disables its confirm control while
            // completing; a duplicate that slips through must not arm a
            // second level advance.
            log::debug!("task_complete ignored, sequence already in flight");
            return;
        }

        self.bloom = true;
        self.timeline.schedule(
            now_ms + BLOOM_DURATION_MS,
            Effect::EndBloom { run: self.run },
        );
        self.timeline.schedule(
            now_ms + COMPLETION_SWAP_DELAY_MS,
            Effect::ApplyCompletion { run: self.run },
        );
        log::debug!("Completion sequence armed for level {}", self.state.level);
    }

    /// Skip today's task. Posts a transient message and nothing else: the
    /// level does not move and the save is not touched.
    pub fn task_skip(&mut self, now_ms: i64) {
        if self.state.phase != Phase::Playing {
            log::debug!("task_skip ignored in phase {:?}", self.state.phase);
            return;
        }
        self.post_message(SKIP_MESSAGE, Some(SKIP_MESSAGE_DURATION_MS), now_ms);
    }

    /// Step from the one-time Completed screen into the Kings' Path.
    pub fn enter_post_game(&mut self) {
        if self.state.phase != Phase::Completed {
            log::debug!("enter_post_game ignored in phase {:?}", self.state.phase);
            return;
        }
        self.state.phase = Phase::PostGame;
        self.persist();
    }

    /// Fire every effect whose deadline has passed. Shells call this from
    /// their timer driver; it is cheap when nothing is due.
    pub fn advance(&mut self, now_ms: i64) {
        for effect in self.timeline.take_due(now_ms) {
            match effect {
                Effect::EndBloom { run } => {
                    if run == self.run {
                        self.bloom = false;
                    }
                }
                Effect::ClearMessage { id } => {
                    if self.message.is_some_and(|m| m.id == id) {
                        self.message = None;
                    }
                }
                Effect::ApplyCompletion { run } => self.apply_completion(run, now_ms),
            }
        }
    }

    /// The delayed half of `task_complete`. Reads the state as it stands at
    /// fire time; a reset in the interim bumped the run generation, which
    /// disarms the swap without cancelling any timer.
    fn apply_completion(&mut self, run: u64, now_ms: i64) {
        if run != self.run {
            log::debug!("Dropping completion armed in a previous run");
            return;
        }
        if self.state.phase != Phase::Playing {
            return;
        }

        if self.state.level >= MAX_LEVEL {
            self.state.phase = Phase::Completed;
            self.state.kings_path_unlocked = true;
            log::info!("Final level complete, Kings' Path unlocked");
        } else {
            self.state.level += 1;
            self.state.last_visit_ms = now_ms;
            log::debug!("Advanced to level {}", self.state.level);
        }
        self.persist();
    }

    /// Read-only view for rendering.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            level: self.state.level,
            phase: self.state.phase,
            task: (self.state.phase == Phase::Playing)
                .then(|| content::task_for_level(self.state.level)),
            kings_path_unlocked: self.state.kings_path_unlocked,
        }
    }

    /// The transient narrative message, if one is showing.
    pub fn message(&self) -> Option<&'static str> {
        self.message.map(|m| m.text)
    }

    /// Whether the bloom overlay should be covering the screen.
    pub fn bloom_active(&self) -> bool {
        self.bloom
    }

    /// Earliest pending deadline, so shells can arm one wakeup per effect.
    pub fn next_fire_at(&self) -> Option<i64> {
        self.timeline.next_fire_at()
    }

    fn completion_pending(&self) -> bool {
        self.timeline
            .effects()
            .any(|e| matches!(e, Effect::ApplyCompletion { run } if *run == self.run))
    }

    fn post_message(&mut self, text: &'static str, ttl_ms: Option<i64>, now_ms: i64) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.message = Some(Message { id, text });
        if let Some(ttl) = ttl_ms {
            self.timeline.schedule(now_ms + ttl, Effect::ClearMessage { id });
        }
    }

    /// Write the whole state through the adapter. Best-effort: a failed
    /// write is indistinguishable from success and the journey carries on.
    fn persist(&mut self) {
        if let Some(json) = SavedState::from_state(&self.state).encode() {
            self.store.save(&json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    /// An arbitrary session start time.
    const T0: i64 = 1_700_000_000_000;

    fn fresh() -> Journey<MemoryStore> {
        Journey::load(MemoryStore::new(), T0)
    }

    /// Store pre-seeded with a save the original web app could have written.
    fn seeded(level: u32, unlocked: bool) -> MemoryStore {
        let store = MemoryStore::new();
        store.set_contents(&format!(
            r#"{{"level":{level},"phase":"INTRO","lastVisit":1650000000000,"kingsPathUnlocked":{unlocked}}}"#
        ));
        store
    }

    #[test]
    fn test_fresh_install_defaults() {
        let journey = fresh();
        let snap = journey.snapshot();
        assert_eq!(snap.level, 1);
        assert_eq!(snap.phase, Phase::Intro);
        assert_eq!(snap.task, None);
        assert!(!snap.kings_path_unlocked);
        assert_eq!(journey.message(), None);
        assert!(!journey.bloom_active());
    }

    #[test]
    fn test_begin_enters_playing_with_task() {
        let mut journey = fresh();
        journey.begin(false, T0);

        let snap = journey.snapshot();
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.level, 1);
        let task = snap.task.expect("playing phase carries a task");
        assert_eq!(task.id, 1);
    }

    #[test]
    fn test_completion_swaps_after_delay_under_bloom() {
        let mut journey = fresh();
        journey.begin(false, T0);
        journey.task_complete(T0);

        // Bloom raised immediately, state untouched until the swap delay.
        assert!(journey.bloom_active());
        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS - 1);
        assert_eq!(journey.snapshot().level, 1);

        // The swap fires while the bloom is still up. Below the final level
        // it only moves the counter; the path stays locked.
        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS);
        let snap = journey.snapshot();
        assert_eq!(snap.level, 2);
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.task.unwrap().id, 2);
        assert!(!snap.kings_path_unlocked);
        assert!(journey.bloom_active());
        assert_eq!(journey.state.last_visit_ms, T0 + COMPLETION_SWAP_DELAY_MS);

        // And the bloom outlives it.
        journey.advance(T0 + BLOOM_DURATION_MS);
        assert!(!journey.bloom_active());
    }

    #[test]
    fn test_swap_delay_stays_under_bloom_cover() {
        assert!(COMPLETION_SWAP_DELAY_MS < BLOOM_DURATION_MS);
    }

    #[test]
    fn test_duplicate_complete_arms_single_advance() {
        let mut journey = fresh();
        journey.begin(false, T0);
        journey.task_complete(T0);
        journey.task_complete(T0 + 50);

        journey.advance(T0 + BLOOM_DURATION_MS);
        assert_eq!(journey.snapshot().level, 2);
    }

    #[test]
    fn test_skip_leaves_state_and_posts_message() {
        let mut journey = fresh();
        journey.begin(false, T0);
        let writes_before = journey.store.writes();

        journey.task_skip(T0);
        let snap = journey.snapshot();
        assert_eq!(snap.level, 1);
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(journey.message(), Some(SKIP_MESSAGE));
        // Nothing durable changed, so nothing was written.
        assert_eq!(journey.store.writes(), writes_before);

        // The message clears itself after its display window.
        journey.advance(T0 + SKIP_MESSAGE_DURATION_MS - 1);
        assert_eq!(journey.message(), Some(SKIP_MESSAGE));
        journey.advance(T0 + SKIP_MESSAGE_DURATION_MS);
        assert_eq!(journey.message(), None);
    }

    #[test]
    fn test_stale_message_timer_spares_newer_message() {
        let mut journey = fresh();
        journey.begin(false, T0);

        journey.task_skip(T0);
        // A second skip just before the first expires.
        journey.task_skip(T0 + 2_900);

        // The first timer fires; the replacement message must survive.
        journey.advance(T0 + SKIP_MESSAGE_DURATION_MS);
        assert_eq!(journey.message(), Some(SKIP_MESSAGE));

        journey.advance(T0 + 2_900 + SKIP_MESSAGE_DURATION_MS);
        assert_eq!(journey.message(), None);
    }

    #[test]
    fn test_skip_does_not_disturb_completion_sequence() {
        let mut journey = fresh();
        journey.begin(false, T0);
        journey.task_complete(T0);
        journey.task_skip(T0 + 100);

        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS);
        assert_eq!(journey.snapshot().level, 2);
        assert!(journey.bloom_active());
        // Skip message lives its own life alongside the bloom.
        assert_eq!(journey.message(), Some(SKIP_MESSAGE));
        journey.advance(T0 + 100 + SKIP_MESSAGE_DURATION_MS);
        assert_eq!(journey.message(), None);
    }

    #[test]
    fn test_final_level_unlocks_kings_path() {
        let mut journey = Journey::load(seeded(MAX_LEVEL, false), T0);
        journey.begin(false, T0);

        let snap = journey.snapshot();
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.task.unwrap().id, MAX_LEVEL);

        journey.task_complete(T0);
        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS);

        let snap = journey.snapshot();
        assert_eq!(snap.phase, Phase::Completed);
        assert_eq!(snap.level, MAX_LEVEL);
        assert!(snap.kings_path_unlocked);

        journey.enter_post_game();
        assert_eq!(journey.snapshot().phase, Phase::PostGame);
    }

    #[test]
    fn test_finished_journey_reopens_into_post_game() {
        // Final level done and the path unlocked: re-entry skips Completed.
        let mut journey = Journey::load(seeded(MAX_LEVEL, true), T0);
        assert_eq!(journey.snapshot().phase, Phase::Intro);

        journey.begin(false, T0);
        assert_eq!(journey.snapshot().phase, Phase::PostGame);
    }

    #[test]
    fn test_level_past_the_end_reopens_into_post_game() {
        // A legacy save that counted past the final level.
        let mut journey = Journey::load(seeded(MAX_LEVEL + 3, false), T0);
        journey.begin(false, T0);
        assert_eq!(journey.snapshot().phase, Phase::PostGame);
    }

    #[test]
    fn test_reset_restores_defaults_from_anywhere() {
        let mut journey = Journey::load(seeded(MAX_LEVEL, true), T0);
        journey.begin(false, T0);
        assert_eq!(journey.snapshot().phase, Phase::PostGame);

        journey.begin(true, T0 + 10);
        let snap = journey.snapshot();
        assert_eq!(snap.level, 1);
        assert_eq!(snap.phase, Phase::Playing);
        assert!(!snap.kings_path_unlocked);
        assert_eq!(journey.state.last_visit_ms, T0 + 10);
        assert_eq!(journey.message(), Some(RESET_MESSAGE));
    }

    #[test]
    fn test_unlock_survives_everything_but_reset() {
        let mut journey = Journey::load(seeded(MAX_LEVEL, true), T0);
        journey.begin(false, T0);
        journey.enter_post_game();
        journey.advance(T0 + 10_000);
        assert!(journey.snapshot().kings_path_unlocked);

        journey.begin(true, T0 + 20_000);
        assert!(!journey.snapshot().kings_path_unlocked);
    }

    #[test]
    fn test_reset_disarms_inflight_completion() {
        let mut journey = fresh();
        journey.begin(false, T0);
        journey.task_complete(T0);

        // Reset lands inside the swap window.
        journey.begin(true, T0 + 100);

        // Reset tears the bloom down along with the rest of the old run.
        assert!(!journey.bloom_active());

        // The old run's swap fires but must not touch the new run.
        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS);
        let snap = journey.snapshot();
        assert_eq!(snap.level, 1);
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(journey.message(), Some(RESET_MESSAGE));

        // The bloom timer still fires, as a no-op for the new run.
        journey.advance(T0 + BLOOM_DURATION_MS);
        assert!(!journey.bloom_active());
        assert_eq!(journey.next_fire_at(), None);
    }

    #[test]
    fn test_completion_after_reset_applies_to_new_run() {
        let mut journey = fresh();
        journey.begin(false, T0);
        journey.task_complete(T0);
        journey.begin(true, T0 + 100);

        // A fresh completion in the new run works normally.
        journey.task_complete(T0 + 200);
        journey.advance(T0 + 200 + COMPLETION_SWAP_DELAY_MS);
        assert_eq!(journey.snapshot().level, 2);
    }

    #[test]
    fn test_stale_bloom_timer_spares_new_runs_bloom() {
        let mut journey = fresh();
        journey.begin(false, T0);
        journey.task_complete(T0);

        // Reset mid-bloom, then complete again right away in the new run.
        journey.begin(true, T0 + 200);
        journey.task_complete(T0 + 300);

        // The old run's bloom timer fires; the new run's bloom stays up.
        journey.advance(T0 + BLOOM_DURATION_MS);
        assert!(journey.bloom_active());
        assert_eq!(journey.snapshot().level, 2);

        // The new run's own timer lowers it on schedule.
        journey.advance(T0 + 300 + BLOOM_DURATION_MS);
        assert!(!journey.bloom_active());
    }

    #[test]
    fn test_intents_outside_their_phase_are_ignored() {
        let mut journey = fresh();

        // Nothing is playing yet.
        journey.task_complete(T0);
        journey.task_skip(T0);
        journey.enter_post_game();
        let snap = journey.snapshot();
        assert_eq!(snap.phase, Phase::Intro);
        assert_eq!(snap.level, 1);
        assert_eq!(journey.message(), None);
        assert_eq!(journey.next_fire_at(), None);

        // begin(false) is an intro-screen intent.
        journey.begin(false, T0);
        journey.begin(false, T0);
        assert_eq!(journey.snapshot().phase, Phase::Playing);
    }

    #[test]
    fn test_playing_phase_in_store_normalizes_to_intro() {
        let store = MemoryStore::new();
        store.set_contents(r#"{"level":5,"phase":"PLAYING","kingsPathUnlocked":false}"#);

        let journey = Journey::load(store, T0);
        let snap = journey.snapshot();
        assert_eq!(snap.phase, Phase::Intro);
        assert_eq!(snap.level, 5);
        // lastVisit was absent; load time stands in.
        assert_eq!(journey.state.last_visit_ms, T0);
    }

    #[test]
    fn test_malformed_store_falls_back_to_defaults() {
        for junk in [
            "",
            "not json",
            "[]",
            r#"{"level":0,"phase":"INTRO","lastVisit":1,"kingsPathUnlocked":false}"#,
            r#"{"level":"five","phase":"INTRO","lastVisit":1,"kingsPathUnlocked":false}"#,
            r#"{"phase":"INTRO","lastVisit":1,"kingsPathUnlocked":false}"#,
        ] {
            let store = MemoryStore::new();
            store.set_contents(junk);
            let journey = Journey::load(store, T0);
            assert_eq!(journey.state, JourneyState::new(T0), "junk: {junk}");
        }
    }

    #[test]
    fn test_load_normalization_is_persisted() {
        let store = MemoryStore::new();
        store.set_contents(r#"{"level":7,"phase":"PLAYING","lastVisit":42,"kingsPathUnlocked":false}"#);

        let journey = Journey::load(store.clone(), T0);
        assert_eq!(journey.store.writes(), 1);

        let written = store.contents().unwrap();
        let saved = SavedState::decode(&written).unwrap();
        assert_eq!(saved.level, 7);
        assert_eq!(saved.phase, "INTRO");
        assert_eq!(saved.last_visit, Some(42));
    }

    #[test]
    fn test_every_durable_change_writes_through() {
        let store = MemoryStore::new();
        let mut journey = Journey::load(store.clone(), T0);
        assert_eq!(store.writes(), 1); // load normalization

        journey.begin(false, T0);
        assert_eq!(store.writes(), 2);

        journey.task_complete(T0);
        assert_eq!(store.writes(), 2); // nothing durable until the swap

        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS);
        assert_eq!(store.writes(), 3);
        let saved = SavedState::decode(&store.contents().unwrap()).unwrap();
        assert_eq!(saved.level, 2);
        assert_eq!(saved.phase, "PLAYING");
        assert!(!saved.kings_path_unlocked);

        journey.task_skip(T0 + 2_000);
        journey.advance(T0 + 10_000);
        assert_eq!(store.writes(), 3); // skip and message expiry write nothing

        journey.begin(true, T0 + 11_000);
        assert_eq!(store.writes(), 4);
    }

    #[test]
    fn test_progress_survives_reload_through_the_store() {
        let store = MemoryStore::new();
        let mut journey = Journey::load(store.clone(), T0);
        journey.begin(false, T0);
        journey.task_complete(T0);
        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS);
        journey.task_complete(T0 + 5_000);
        journey.advance(T0 + 5_000 + COMPLETION_SWAP_DELAY_MS);
        assert_eq!(journey.snapshot().level, 3);
        drop(journey);

        // Next session: same store, level kept, phase back at the intro.
        let journey = Journey::load(store, T0 + 86_400_000);
        let snap = journey.snapshot();
        assert_eq!(snap.level, 3);
        assert_eq!(snap.phase, Phase::Intro);
    }

    #[test]
    fn test_next_fire_at_tracks_pending_deadlines() {
        let mut journey = fresh();
        journey.begin(false, T0);
        assert_eq!(journey.next_fire_at(), None);

        journey.task_complete(T0);
        assert_eq!(journey.next_fire_at(), Some(T0 + COMPLETION_SWAP_DELAY_MS));

        journey.advance(T0 + COMPLETION_SWAP_DELAY_MS);
        assert_eq!(journey.next_fire_at(), Some(T0 + BLOOM_DURATION_MS));

        journey.advance(T0 + BLOOM_DURATION_MS);
        assert_eq!(journey.next_fire_at(), None);
    }
}
