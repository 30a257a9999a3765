//! Static content pools and the deterministic level → task mapping.
//!
//! Everything here is fixed data: the journey must hand out the same task
//! for the same level forever, across sessions and reloads, so the pools
//! are ordered arrays indexed by simple modular arithmetic. No RNG.

/// Final level of the journey.
pub const MAX_LEVEL: u32 = 100;

/// Message shown when a run is restarted from the beginning.
pub const RESET_MESSAGE: &str = "Every story deserves another beginning.";

/// Message shown when the day's task is skipped.
pub const SKIP_MESSAGE: &str = "Rest is also a form of action. Return when ready.";

/// Symbolic task categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    Reading,
    Writing,
    Movement,
    Creativity,
    Music,
    Reflection,
    Kindness,
    Learning,
    Awareness,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Reading => "Reading",
            TaskCategory::Writing => "Writing",
            TaskCategory::Movement => "Movement",
            TaskCategory::Creativity => "Creativity",
            TaskCategory::Music => "Music",
            TaskCategory::Reflection => "Reflection",
            TaskCategory::Kindness => "Kindness",
            TaskCategory::Learning => "Learning",
            TaskCategory::Awareness => "Awareness",
        }
    }
}

/// One day's task, derived from the level number. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    /// Equal to the level it was derived from.
    pub id: u32,
    pub category: TaskCategory,
    pub narrative: &'static str,
    pub instruction: &'static str,
}

/// Gentle scene-setting lines, cycled across levels.
const NARRATIVES: [&str; 10] = [
    "The mist clears slightly, revealing a path.",
    "The wind whispers of old stories.",
    "You are standing at the edge of something new.",
    "A quiet moment in a loud world.",
    "The sun warms the stone beneath your feet.",
    "There is no rush here, only presence.",
    "Reflect on where you have come from.",
    "The horizon is vast and welcoming.",
    "Small steps carve deep canyons.",
    "You breathe in the possibility of change.",
];

/// Task instructions, cycled across levels.
const TASK_POOL: [(TaskCategory, &str); 15] = [
    (TaskCategory::Reading, "Read 3 pages of any book nearby."),
    (TaskCategory::Writing, "Write one honest sentence about today."),
    (TaskCategory::Movement, "Stretch your arms up to the sky for 10 seconds."),
    (TaskCategory::Creativity, "Draw a shape that represents how you feel."),
    (TaskCategory::Music, "Listen to one song with your eyes closed."),
    (TaskCategory::Reflection, "Sit quietly for 2 minutes. Do nothing."),
    (TaskCategory::Kindness, "Send a kind text message to someone."),
    (TaskCategory::Learning, "Learn one new word or fact today."),
    (TaskCategory::Awareness, "Notice 3 blue things in your surroundings."),
    (TaskCategory::Movement, "Take a short walk, even just around the room."),
    (TaskCategory::Writing, "List three things you are grateful for."),
    (TaskCategory::Reflection, "Forgive yourself for one small thing."),
    (TaskCategory::Creativity, "Rearrange a small part of your desk or room."),
    (TaskCategory::Awareness, "Drink a glass of water slowly."),
    (TaskCategory::Kindness, "Smile at yourself in the mirror."),
];

/// Daily reflections for the post-game Kings' Path.
const KINGS_PATH_CHALLENGES: [&str; 4] = [
    "Reflect: What does wealth mean beyond money?",
    "Action: Help someone without them knowing.",
    "Create: Write a letter to your past self.",
    "Learn: Read about a culture different from yours.",
];

/// Produce the task for a level.
///
/// Pure and total for every `level >= 1`. The pools are shorter than
/// [`MAX_LEVEL`], so content repeats over the journey by design.
pub fn task_for_level(level: u32) -> Task {
    debug_assert!(level >= 1, "levels are 1-based");
    let narrative_index = (level as usize - 1) % NARRATIVES.len();
    let task_index = (level as usize - 1) % TASK_POOL.len();

    let (category, instruction) = TASK_POOL[task_index];

    Task {
        id: level,
        category,
        narrative: NARRATIVES[narrative_index],
        instruction,
    }
}

/// Pick the Kings' Path reflection for a calendar day.
///
/// Keyed off the day of the month, so two sessions on the same day see the
/// same reflection and it rolls over at midnight, independent of run state.
pub fn reflection_for_day(day_of_month: u32) -> &'static str {
    KINGS_PATH_CHALLENGES[day_of_month as usize % KINGS_PATH_CHALLENGES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_task_id_matches_level() {
        for level in 1..=MAX_LEVEL {
            assert_eq!(task_for_level(level).id, level);
        }
    }

    #[test]
    fn test_level_one_uses_first_pool_entries() {
        let task = task_for_level(1);
        assert_eq!(task.narrative, NARRATIVES[0]);
        assert_eq!(task.instruction, TASK_POOL[0].1);
        assert_eq!(task.category, TaskCategory::Reading);
    }

    #[test]
    fn test_pools_cycle() {
        // Pools are shorter than the journey, so indices wrap.
        let wrapped = task_for_level(NARRATIVES.len() as u32 + 1);
        assert_eq!(wrapped.narrative, NARRATIVES[0]);

        let wrapped = task_for_level(TASK_POOL.len() as u32 + 1);
        assert_eq!(wrapped.instruction, TASK_POOL[0].1);
    }

    #[test]
    fn test_pools_shorter_than_journey() {
        assert!(NARRATIVES.len() < MAX_LEVEL as usize);
        assert!(TASK_POOL.len() < MAX_LEVEL as usize);
    }

    #[test]
    fn test_reflection_keyed_by_day() {
        assert_eq!(reflection_for_day(0), KINGS_PATH_CHALLENGES[0]);
        assert_eq!(reflection_for_day(1), KINGS_PATH_CHALLENGES[1]);
        // Day 31 wraps: 31 % 4 == 3.
        assert_eq!(reflection_for_day(31), KINGS_PATH_CHALLENGES[3]);
        // Same day, same reflection.
        assert_eq!(reflection_for_day(17), reflection_for_day(17));
    }

    proptest! {
        #[test]
        fn prop_task_is_stable(level in 1u32..=100_000) {
            // Same level, identical task, every time.
            prop_assert_eq!(task_for_level(level), task_for_level(level));
        }

        #[test]
        fn prop_task_id_is_level(level in 1u32..=100_000) {
            prop_assert_eq!(task_for_level(level).id, level);
        }

        #[test]
        fn prop_reflection_total_for_any_day(day in 0u32..=31) {
            let text = reflection_for_day(day);
            prop_assert!(KINGS_PATH_CHALLENGES.contains(&text));
        }
    }
}
