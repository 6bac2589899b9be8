use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use spelling_algo::sanitize::require_text;
use spelling_algo::{Attempt, PracticeSession};

use crate::db::RecordStore;
use crate::error::EngineResult;

const RECENT_SESSION_LIMIT: usize = 10;
const HARDEST_WORD_LIMIT: usize = 5;
const HARDEST_WORD_MIN_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStat {
    pub session_id: String,
    pub word_list_id: String,
    pub start_time: DateTime<Utc>,
    pub total_words: u32,
    pub correct_count: u32,
    pub points_earned: u32,
    /// Percentage of correct attempts in the session
    pub accuracy: u32,
    pub duration_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStat {
    pub word_id: String,
    pub text: String,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub total_points: u64,
    pub total_sessions: usize,
    pub total_attempts: usize,
    pub correct_attempts: usize,
    pub incorrect_attempts: usize,
    pub accuracy: u32,
    pub unique_words_practiced: usize,
    pub recent_sessions: Vec<SessionStat>,
    pub hardest_words: Vec<WordStat>,
    pub word_list_count: usize,
    pub total_practice_secs: i64,
    pub average_session_secs: i64,
    pub current_streak_days: u32,
    pub last_practice_date: Option<NaiveDate>,
    pub struggling_words: usize,
}

/// Rounded percentage; zero when there is nothing to divide by.
fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let pct = (part as u64 * 100 + whole as u64 / 2) / whole as u64;
    u32::try_from(pct).unwrap_or(100)
}

/// Consecutive practice days ending today, or yesterday when today has no practice yet.
pub fn day_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

fn session_stat(session: &PracticeSession, attempts: &[Attempt]) -> SessionStat {
    let correct = attempts.iter().filter(|a| a.is_correct).count();
    SessionStat {
        session_id: session.id.clone(),
        word_list_id: session.word_list_id.clone(),
        start_time: session.start_time,
        total_words: session.total_words,
        correct_count: session.correct_count,
        points_earned: session.points_earned,
        accuracy: percentage(correct, attempts.len()),
        duration_secs: session.duration_secs(),
    }
}

pub async fn user_statistics(store: &dyn RecordStore, user_id: &str) -> EngineResult<UserStatistics> {
    user_statistics_at(store, user_id, Utc::now().date_naive()).await
}

/// Statistics with the day streak measured from `today` (UTC).
pub async fn user_statistics_at(
    store: &dyn RecordStore,
    user_id: &str,
    today: NaiveDate,
) -> EngineResult<UserStatistics> {
    let user_id = require_text("user id", user_id)?;

    let mut sessions = store.list_sessions(user_id).await?;
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    let mut per_session = Vec::with_capacity(sessions.len());
    for session in &sessions {
        per_session.push(store.list_attempts(&session.id).await?);
    }
    let attempts: Vec<&Attempt> = per_session.iter().flatten().collect();

    let total_attempts = attempts.len();
    let correct_attempts = attempts.iter().filter(|a| a.is_correct).count();

    // word id -> (attempts, correct)
    let mut by_word: HashMap<&str, (usize, usize)> = HashMap::new();
    for attempt in &attempts {
        let entry = by_word.entry(attempt.word_id.as_str()).or_default();
        entry.0 += 1;
        if attempt.is_correct {
            entry.1 += 1;
        }
    }

    let mut hardest = Vec::new();
    for (word_id, (tries, correct)) in &by_word {
        if *tries < HARDEST_WORD_MIN_ATTEMPTS {
            continue;
        }
        let text = match store.get_word(word_id).await? {
            Some(word) => word.text,
            None => continue,
        };
        hardest.push(WordStat {
            word_id: word_id.to_string(),
            text,
            attempts: *tries,
            correct: *correct,
            accuracy: percentage(*correct, *tries),
        });
    }
    hardest.sort_by(|a, b| {
        (a.accuracy, Reverse(a.attempts), &a.text).cmp(&(b.accuracy, Reverse(b.attempts), &b.text))
    });
    hardest.truncate(HARDEST_WORD_LIMIT);

    let recent_sessions = sessions
        .iter()
        .zip(&per_session)
        .take(RECENT_SESSION_LIMIT)
        .map(|(session, attempts)| session_stat(session, attempts))
        .collect();

    let total_practice_secs: i64 = sessions.iter().map(PracticeSession::duration_secs).sum();
    let average_session_secs = if sessions.is_empty() {
        0
    } else {
        total_practice_secs / sessions.len() as i64
    };

    let days: BTreeSet<NaiveDate> = sessions.iter().map(PracticeSession::practice_day).collect();
    let total_points = store
        .list_point_entries(user_id)
        .await?
        .iter()
        .map(|entry| u64::from(entry.amount))
        .sum();

    Ok(UserStatistics {
        total_points,
        total_sessions: sessions.len(),
        total_attempts,
        correct_attempts,
        incorrect_attempts: total_attempts - correct_attempts,
        accuracy: percentage(correct_attempts, total_attempts),
        unique_words_practiced: by_word.len(),
        recent_sessions,
        hardest_words: hardest,
        word_list_count: store.list_word_lists(user_id).await?.len(),
        total_practice_secs,
        average_session_secs,
        current_streak_days: day_streak(&days, today),
        last_practice_date: days.iter().next_back().copied(),
        struggling_words: store.list_mastery(user_id).await?.len(),
    })
}
