//! Mastery State Machine
//!
//! Per (user, word) there are two states:
//!
//! - **Unseen or mastered** - no [`MasteryRecord`]
//! - **Struggling** - a record exists with `correct_streak < threshold`
//!
//! A miss creates the record (or bumps its mistake count and clears the
//! streak). Hits only matter while a record exists; reaching the threshold
//! deletes it. The transition is computed here without touching storage; the
//! engine applies the returned [`MasteryTransition`] and its pool-list effect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MasteryRecord, DEFAULT_MASTERY_THRESHOLD};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryPolicy {
    /// Consecutive correct answers that retire a struggling word
    pub threshold: u32,
}

impl Default for MasteryPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MASTERY_THRESHOLD,
        }
    }
}

impl MasteryPolicy {
    /// A zero threshold would master a word on the attempt that created it; clamp to 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }
}

/// Outcome of applying one attempt to the current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MasteryTransition {
    /// Correct answer on a word with no record; nothing to store
    Untracked,
    /// First miss: insert this record and add the word to the pool list
    Created(MasteryRecord),
    /// Record changed but the word is still struggling
    Updated(MasteryRecord),
    /// Streak reached the threshold: delete the record and remove the pool entry.
    /// Carries the final state for logging.
    Mastered(MasteryRecord),
}

impl MasteryTransition {
    /// The pool-list side effect this transition calls for.
    pub fn pool_effect(&self) -> PoolEffect {
        match self {
            MasteryTransition::Created(_) => PoolEffect::Add,
            MasteryTransition::Mastered(_) => PoolEffect::Remove,
            MasteryTransition::Untracked | MasteryTransition::Updated(_) => PoolEffect::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolEffect {
    None,
    Add,
    Remove,
}

/// Apply one attempt outcome to `current`.
pub fn apply_attempt(
    policy: &MasteryPolicy,
    current: Option<&MasteryRecord>,
    user_id: &str,
    word_id: &str,
    is_correct: bool,
    now: DateTime<Utc>,
) -> MasteryTransition {
    match (current, is_correct) {
        (None, true) => MasteryTransition::Untracked,
        (None, false) => MasteryTransition::Created(MasteryRecord {
            word_id: word_id.to_string(),
            user_id: user_id.to_string(),
            mistake_count: 1,
            correct_streak: 0,
            last_practiced_at: now,
        }),
        (Some(record), false) => {
            let mut next = record.clone();
            next.mistake_count = next.mistake_count.saturating_add(1);
            next.correct_streak = 0;
            next.last_practiced_at = now;
            MasteryTransition::Updated(next)
        }
        (Some(record), true) => {
            let mut next = record.clone();
            next.correct_streak = next.correct_streak.saturating_add(1);
            next.last_practiced_at = now;
            if next.correct_streak >= policy.threshold {
                MasteryTransition::Mastered(next)
            } else {
                MasteryTransition::Updated(next)
            }
        }
    }
}
