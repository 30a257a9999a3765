//! One-shot effect timeline.
//!
//! The completion sequence and message expiry are driven by fixed-delay
//! callbacks, not blocking sleeps: intents push effects with an absolute
//! deadline, and the shell calls [`Journey::advance`] (which drains
//! [`Timeline::take_due`]) when a deadline passes. Effects are one-shot,
//! non-repeating, and never cancelled; stale ones are disarmed by the tags
//! they carry (run generation, message id), not by removal.
//!
//! [`Journey::advance`]: super::Journey::advance

/// A deferred engine effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Lower the bloom flag at the end of the completion animation. Tagged
    /// with the run generation; a stale one leaves a newer run's bloom up.
    EndBloom { run: u64 },
    /// Apply the completion mutation (level advance or final unlock) while
    /// the bloom covers the swap. Tagged with the run generation it was
    /// scheduled under; a reset in the interim makes it a no-op.
    ApplyCompletion { run: u64 },
    /// Expire the transient message with this id. A newer message keeps a
    /// different id and is left alone.
    ClearMessage { id: u64 },
}

#[derive(Debug, Clone)]
struct Scheduled {
    fire_at_ms: i64,
    /// Insertion order, to keep draining stable for equal deadlines.
    seq: u64,
    effect: Effect,
}

/// Pending one-shot effects, ordered by deadline.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pending: Vec<Scheduled>,
    next_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `effect` to fire once `now >= fire_at_ms`.
    pub fn schedule(&mut self, fire_at_ms: i64, effect: Effect) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled {
            fire_at_ms,
            seq,
            effect,
        });
    }

    /// Remove and return every effect whose deadline has passed, earliest
    /// deadline first.
    pub fn take_due(&mut self, now_ms: i64) -> Vec<Effect> {
        let mut due: Vec<Scheduled> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].fire_at_ms <= now_ms {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|s| (s.fire_at_ms, s.seq));
        due.into_iter().map(|s| s.effect).collect()
    }

    /// Earliest pending deadline, if any. Shells use this to arm exactly one
    /// wakeup per due effect.
    pub fn next_fire_at(&self) -> Option<i64> {
        self.pending.iter().map(|s| s.fire_at_ms).min()
    }

    /// The armed effects, in no particular order.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.pending.iter().map(|s| &s.effect)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
