//! Common Types and Constants
//!
//! Record types shared by the algorithms and the engine's record store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Consecutive correct answers needed before a struggling word is mastered
pub const DEFAULT_MASTERY_THRESHOLD: u32 = 5;

/// Cap on extra session copies of a struggling word
pub const MAX_EXTRA_OCCURRENCES: u32 = 3;

/// Bonus multiplier, expressed as a ratio so rounding stays integral (1.5 = 3/2)
pub const POOL_BONUS_NUMERATOR: u32 = 3;
pub const POOL_BONUS_DENOMINATOR: u32 = 2;

/// Reserved name of the per-user, system-managed difficult words list
pub const DEFAULT_POOL_LIST_NAME: &str = "Difficult Words";

pub const DEFAULT_CORRECT_WORD_POINTS: u32 = 10;
pub const DEFAULT_PERFECT_LIST_POINTS: u32 = 50;
pub const DEFAULT_STREAK_POINTS: u32 = 20;

// ==================== Word Types ====================

/// A practicable word, owned by exactly one word list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub list_id: String,
    pub text: String,
    #[serde(default)]
    pub explanation: String,
    /// Set on pool-list copies: id of the word the copy was made from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_word_id: Option<String>,
}

impl Word {
    /// Id that mastery state is tracked under. Pool copies defer to their source word.
    pub fn tracking_id(&self) -> &str {
        self.source_word_id.as_deref().unwrap_or(&self.id)
    }
}

/// Difficulty label a parent attaches to a word list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient parse; unknown labels fall back to `Medium`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" | "makkelijk" => Difficulty::Easy,
            "hard" | "moeilijk" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordList {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

// ==================== Mastery Types ====================

/// Per user x word difficulty state. Present only while the word is struggling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub word_id: String,
    pub user_id: String,
    pub mistake_count: u32,
    pub correct_streak: u32,
    pub last_practiced_at: DateTime<Utc>,
}

/// How pool-list entries are matched to the word they were copied from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolMatch {
    /// Pool copy's `source_word_id` equals the original word id
    #[default]
    SourceId,
    /// Legacy: pool copy's text equals the original word text
    Text,
}

impl PoolMatch {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "source-id" | "source_id" | "id" => Some(PoolMatch::SourceId),
            "text" => Some(PoolMatch::Text),
            _ => None,
        }
    }

    /// Whether `candidate` (an entry of the pool list) stands for `original`.
    pub fn matches(&self, candidate: &Word, original: &Word) -> bool {
        match self {
            PoolMatch::SourceId => candidate.source_word_id.as_deref() == Some(original.id.as_str()),
            PoolMatch::Text => candidate.text == original.text,
        }
    }
}

// ==================== Session Types ====================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub id: String,
    pub user_id: String,
    pub word_list_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_words: u32,
    pub correct_count: u32,
    pub points_earned: u32,
}

impl PracticeSession {
    pub fn is_sealed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Calendar day (UTC) the session counts toward: the day it was sealed,
    /// or the day it started while still open.
    pub fn practice_day(&self) -> NaiveDate {
        self.end_time.unwrap_or(self.start_time).date_naive()
    }

    /// Seconds between start and end; zero while the session is open.
    pub fn duration_secs(&self) -> i64 {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds().max(0))
            .unwrap_or(0)
    }
}

/// One submitted answer. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub session_id: String,
    pub word_id: String,
    pub input_text: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

// ==================== Points Types ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointActivity {
    CorrectWord,
    PerfectList,
    DailyStreak,
}

impl PointActivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointActivity::CorrectWord => "correct_word",
            PointActivity::PerfectList => "perfect_list",
            PointActivity::DailyStreak => "daily_streak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correct_word" => Some(PointActivity::CorrectWord),
            "perfect_list" => Some(PointActivity::PerfectList),
            "daily_streak" => Some(PointActivity::DailyStreak),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEntry {
    pub id: String,
    pub user_id: String,
    pub activity: PointActivity,
    pub amount: u32,
    pub created_at: DateTime<Utc>,
}

/// Per-user point values
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSettings {
    pub correct_word_points: u32,
    pub perfect_list_points: u32,
    pub streak_points: u32,
}

impl Default for PointSettings {
    fn default() -> Self {
        Self {
            correct_word_points: DEFAULT_CORRECT_WORD_POINTS,
            perfect_list_points: DEFAULT_PERFECT_LIST_POINTS,
            streak_points: DEFAULT_STREAK_POINTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: &str, text: &str, source: Option<&str>) -> Word {
        Word {
            id: id.to_string(),
            list_id: "l1".to_string(),
            text: text.to_string(),
            explanation: String::new(),
            source_word_id: source.map(str::to_string),
        }
    }

    #[test]
    fn tracking_id_prefers_source_word() {
        assert_eq!(word("w1", "kat", None).tracking_id(), "w1");
        assert_eq!(word("copy", "kat", Some("w1")).tracking_id(), "w1");
    }

    #[test]
    fn pool_match_by_source_id_ignores_text_collisions() {
        let original = word("w1", "bank", None);
        let other = word("w2", "bank", None);
        let copy = word("p1", "bank", Some("w1"));

        assert!(PoolMatch::SourceId.matches(&copy, &original));
        assert!(!PoolMatch::SourceId.matches(&copy, &other));
        // legacy strategy collides on identical text
        assert!(PoolMatch::Text.matches(&copy, &other));
    }

    #[test]
    fn difficulty_parse_falls_back_to_medium() {
        assert_eq!(Difficulty::parse_or_default("Hard"), Difficulty::Hard);
        assert_eq!(Difficulty::parse_or_default(" easy "), Difficulty::Easy);
        assert_eq!(Difficulty::parse_or_default("Gemiddeld"), Difficulty::Medium);
        assert_eq!(Difficulty::parse_or_default(""), Difficulty::Medium);
    }

    #[test]
    fn pool_match_parse() {
        assert_eq!(PoolMatch::parse("text"), Some(PoolMatch::Text));
        assert_eq!(PoolMatch::parse("SOURCE-ID"), Some(PoolMatch::SourceId));
        assert_eq!(PoolMatch::parse("name"), None);
    }

    #[test]
    fn word_deserializes_with_missing_explanation() {
        let w: Word =
            serde_json::from_str(r#"{"id":"w1","listId":"l1","text":"fiets"}"#).unwrap();
        assert_eq!(w.explanation, "");
        assert_eq!(w.source_word_id, None);
    }

    #[test]
    fn point_activity_parse_accepts_stored_labels() {
        for activity in [
            PointActivity::CorrectWord,
            PointActivity::PerfectList,
            PointActivity::DailyStreak,
        ] {
            assert_eq!(PointActivity::parse(activity.as_str()), Some(activity));
        }
        assert_eq!(PointActivity::parse("minutes"), None);
    }

    #[test]
    fn session_crossing_midnight_counts_on_its_end_day() {
        let start = DateTime::parse_from_rfc3339("2024-03-09T23:50:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut session = PracticeSession {
            id: "s1".into(),
            user_id: "u1".into(),
            word_list_id: "l1".into(),
            start_time: start,
            end_time: None,
            total_words: 1,
            correct_count: 0,
            points_earned: 0,
        };
        assert_eq!(session.practice_day(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        session.end_time = Some(start + chrono::Duration::minutes(20));
        assert_eq!(session.practice_day(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn session_duration_is_zero_while_open() {
        let start = Utc::now();
        let mut session = PracticeSession {
            id: "s1".into(),
            user_id: "u1".into(),
            word_list_id: "l1".into(),
            start_time: start,
            end_time: None,
            total_words: 3,
            correct_count: 0,
            points_earned: 0,
        };
        assert_eq!(session.duration_secs(), 0);
        session.end_time = Some(start + chrono::Duration::seconds(95));
        assert_eq!(session.duration_secs(), 95);
        assert!(session.is_sealed());
    }
}
