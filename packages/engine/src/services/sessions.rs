use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use spelling_algo::sanitize::require_text;
use spelling_algo::{PointActivity, PointEntry, PracticeSession, Word};

use crate::config::EngineConfig;
use crate::db::{RecordStore, StoreError};
use crate::error::{EngineError, EngineResult};
use crate::services::practice;
use crate::services::settings::settings_or_default;
use crate::services::word_lists::find_pool_list;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedSession {
    pub session: PracticeSession,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session: PracticeSession,
    pub bonuses: Vec<PointEntry>,
    /// The session had been sealed before this call; nothing changed
    pub already_sealed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
    pub sessions: usize,
    pub point_entries: usize,
    pub mastery_records: usize,
    pub pool_words: usize,
}

async fn owned_session(
    store: &dyn RecordStore,
    user_id: &str,
    session_id: &str,
) -> EngineResult<PracticeSession> {
    let session_id = require_text("session id", session_id)?;
    let session = store
        .get_session(session_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))?;
    if session.user_id != user_id {
        return Err(EngineError::Forbidden(format!("session {session_id}")));
    }
    Ok(session)
}

/// Build the word sequence and open a session over it.
pub async fn start_session(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word_list_id: &str,
    max_words: Option<usize>,
) -> EngineResult<StartedSession> {
    let user_id = require_text("user id", user_id)?;
    let max_words = max_words.unwrap_or(config.default_max_words);
    let words = practice::build_session(store, config, user_id, word_list_id, max_words).await?;
    if words.is_empty() {
        return Err(EngineError::NoContent(format!("word list {word_list_id} has no words")));
    }

    let session = PracticeSession {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        word_list_id: word_list_id.trim().to_string(),
        start_time: Utc::now(),
        end_time: None,
        total_words: u32::try_from(words.len()).unwrap_or(u32::MAX),
        correct_count: 0,
        points_earned: 0,
    };
    store.insert_session(&session).await?;
    tracing::info!(user_id = %user_id, session_id = %session.id, words = words.len(), "practice session started");

    Ok(StartedSession { session, words })
}

/// Whether sealing a session at `now` extends a streak from yesterday.
/// Only the first session sealed on a day counts.
fn continues_streak(others: &[PracticeSession], now: DateTime<Utc>) -> bool {
    let today = now.date_naive();
    let yesterday = today - Duration::days(1);
    let sealed_on = |day: NaiveDate| {
        others
            .iter()
            .filter(|session| session.is_sealed())
            .any(|session| session.practice_day() == day)
    };
    !sealed_on(today) && sealed_on(yesterday)
}

/// Seal a session and award its end-of-session bonuses.
///
/// Sealing is one-shot: calling again returns the stored session with
/// `already_sealed` set and awards nothing.
pub async fn end_session(
    store: &dyn RecordStore,
    user_id: &str,
    session_id: &str,
) -> EngineResult<SessionSummary> {
    let user_id = require_text("user id", user_id)?;
    let mut session = owned_session(store, user_id, session_id).await?;
    if session.is_sealed() {
        return Ok(SessionSummary {
            session,
            bonuses: Vec::new(),
            already_sealed: true,
        });
    }

    let now = Utc::now();
    let settings = settings_or_default(store, user_id).await;
    let attempts = store.list_attempts(&session.id).await?;
    let others: Vec<PracticeSession> = store
        .list_sessions(user_id)
        .await?
        .into_iter()
        .filter(|other| other.id != session.id)
        .collect();

    let mut awards = Vec::new();
    let perfect = session.total_words > 0
        && session.correct_count >= session.total_words
        && attempts.iter().all(|attempt| attempt.is_correct);
    if perfect {
        awards.push((PointActivity::PerfectList, settings.perfect_list_points));
    }
    if continues_streak(&others, now) {
        awards.push((PointActivity::DailyStreak, settings.streak_points));
    }

    let bonuses: Vec<PointEntry> = awards
        .into_iter()
        .map(|(activity, amount)| PointEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            activity,
            amount,
            created_at: now,
        })
        .collect();

    session.end_time = Some(now);
    for bonus in &bonuses {
        session.points_earned = session.points_earned.saturating_add(bonus.amount);
    }
    store.update_session(&session).await?;

    for bonus in &bonuses {
        if let Err(err) = store.insert_point_entry(bonus).await {
            tracing::warn!(user_id = %user_id, activity = bonus.activity.as_str(), error = %err, "failed to record bonus points");
        }
    }
    tracing::info!(
        user_id = %user_id,
        session_id = %session.id,
        correct = session.correct_count,
        total = session.total_words,
        points = session.points_earned,
        "practice session sealed"
    );

    Ok(SessionSummary {
        session,
        bonuses,
        already_sealed: false,
    })
}

/// Seal a session the user walked away from. No bonuses; failures are only logged.
pub async fn abandon_session(store: &dyn RecordStore, user_id: &str, session_id: &str) {
    let mut session = match owned_session(store, user_id, session_id).await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(user_id = %user_id, session_id = %session_id, error = %err, "cannot abandon session");
            return;
        }
    };
    if session.is_sealed() {
        return;
    }
    session.end_time = Some(Utc::now());
    if let Err(err) = store.update_session(&session).await {
        tracing::warn!(user_id = %user_id, session_id = %session_id, error = %err, "failed to seal abandoned session");
    }
}

/// The user's sessions, most recent first.
pub async fn list_sessions(store: &dyn RecordStore, user_id: &str) -> EngineResult<Vec<PracticeSession>> {
    let user_id = require_text("user id", user_id)?;
    let mut sessions = store.list_sessions(user_id).await?;
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    Ok(sessions)
}

pub async fn delete_session(store: &dyn RecordStore, user_id: &str, session_id: &str) -> EngineResult<()> {
    let user_id = require_text("user id", user_id)?;
    let session = owned_session(store, user_id, session_id).await?;
    store.delete_session(&session.id).await?;
    Ok(())
}

/// Wipe practice history, points and mastery state. Word lists are kept;
/// the pool list is emptied.
pub async fn reset_progress(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
) -> EngineResult<ResetSummary> {
    let user_id = require_text("user id", user_id)?;
    let mut summary = ResetSummary::default();

    for session in store.list_sessions(user_id).await? {
        store.delete_session(&session.id).await?;
        summary.sessions += 1;
    }

    summary.point_entries = store.list_point_entries(user_id).await?.len();
    store.delete_point_entries(user_id).await?;

    for record in store.list_mastery(user_id).await? {
        match store.delete_mastery(user_id, &record.word_id).await {
            Ok(()) => summary.mastery_records += 1,
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    if let Some(pool) = find_pool_list(store, config, user_id).await? {
        for word in store.list_words(&pool.id).await? {
            store.delete_word(&word.id).await?;
            summary.pool_words += 1;
        }
    }

    tracing::info!(user_id = %user_id, ?summary, "progress reset");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(id: &str, end: DateTime<Utc>) -> PracticeSession {
        PracticeSession {
            id: id.into(),
            user_id: "u1".into(),
            word_list_id: "l1".into(),
            start_time: end - Duration::minutes(5),
            end_time: Some(end),
            total_words: 1,
            correct_count: 1,
            points_earned: 0,
        }
    }

    #[test]
    fn streak_needs_yesterday_and_not_today() {
        let now = Utc::now();
        let yesterday = sealed("a", now - Duration::days(1));
        let today = sealed("b", now);
        let old = sealed("c", now - Duration::days(3));

        assert!(continues_streak(&[yesterday.clone()], now));
        assert!(!continues_streak(&[yesterday, today], now));
        assert!(!continues_streak(&[old], now));
        assert!(!continues_streak(&[], now));
    }
}
