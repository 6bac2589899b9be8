use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spelling_algo::sanitize::require_text;
use spelling_algo::{is_correct, points, Attempt, PointActivity, PointEntry, Word};

use crate::config::EngineConfig;
use crate::db::RecordStore;
use crate::error::{EngineError, EngineResult};
use crate::services::mastery::{self, MasteryOutcome};
use crate::services::settings::settings_or_default;
use crate::services::word_lists::find_pool_list;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttempt {
    pub user_id: String,
    pub session_id: String,
    pub word_id: String,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub attempt_id: String,
    pub is_correct: bool,
    pub points: u32,
    /// The expected spelling, returned only on a miss
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_text: Option<String>,
    pub mastery: MasteryOutcome,
}

async fn in_pool_list(store: &dyn RecordStore, config: &EngineConfig, user_id: &str, word: &Word) -> bool {
    match find_pool_list(store, config, user_id).await {
        Ok(Some(pool)) => pool.id == word.list_id,
        Ok(None) => false,
        Err(err) => {
            tracing::warn!(user_id = %user_id, word_id = %word.id, error = %err, "pool list lookup failed");
            false
        }
    }
}

/// Check one answer inside an open session and record everything it causes.
///
/// The word must come from the session's list or from the user's pool list;
/// only the latter earns the bonus. The attempt row is the only write whose
/// failure is returned. Session counters, point entries and mastery state are
/// updated best-effort.
pub async fn submit_attempt(
    store: &dyn RecordStore,
    config: &EngineConfig,
    request: SubmitAttempt,
) -> EngineResult<AttemptResult> {
    let user_id = require_text("user id", &request.user_id)?;
    let session_id = require_text("session id", &request.session_id)?;
    let word_id = require_text("word id", &request.word_id)?;

    let mut session = store
        .get_session(session_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))?;
    if session.user_id != user_id {
        return Err(EngineError::Forbidden(format!("session {session_id}")));
    }
    if session.is_sealed() {
        return Err(EngineError::SessionSealed(session_id.to_string()));
    }
    let word = store
        .get_word(word_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("word {word_id}")))?;
    let in_pool = in_pool_list(store, config, user_id, &word).await;
    if word.list_id != session.word_list_id && !in_pool {
        return Err(EngineError::Forbidden(format!("word {word_id}")));
    }

    let correct = is_correct(&request.input, &word.text);
    let earlier_attempts = store.list_attempts(session_id).await?;
    let missed_before = earlier_attempts
        .iter()
        .any(|attempt| attempt.word_id == word.id && !attempt.is_correct);

    let earned = if missed_before {
        0
    } else {
        let settings = settings_or_default(store, user_id).await;
        points(correct, settings.correct_word_points, in_pool)
    };

    let now = Utc::now();
    let attempt = Attempt {
        id: Uuid::new_v4().to_string(),
        session_id: session.id.clone(),
        word_id: word.id.clone(),
        input_text: request.input.clone(),
        is_correct: correct,
        created_at: now,
    };
    store.insert_attempt(&attempt).await?;

    if correct {
        session.correct_count += 1;
    }
    session.points_earned = session.points_earned.saturating_add(earned);
    if let Err(err) = store.update_session(&session).await {
        tracing::warn!(session_id = %session.id, error = %err, "failed to update session counters");
    }

    if earned > 0 {
        let entry = PointEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            activity: PointActivity::CorrectWord,
            amount: earned,
            created_at: now,
        };
        if let Err(err) = store.insert_point_entry(&entry).await {
            tracing::warn!(user_id = %user_id, amount = earned, error = %err, "failed to record points");
        }
    }

    let mastery = match mastery::record_attempt(store, config, user_id, &word.id, correct).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(user_id = %user_id, word_id = %word.id, error = %err, "mastery update failed");
            MasteryOutcome::Degraded {
                reason: err.to_string(),
            }
        }
    };

    tracing::debug!(
        user_id = %user_id,
        session_id = %session.id,
        word_id = %word.id,
        is_correct = correct,
        points = earned,
        missed_before,
        "attempt recorded"
    );

    Ok(AttemptResult {
        attempt_id: attempt.id,
        is_correct: correct,
        points: earned,
        correct_text: (!correct).then(|| word.text.clone()),
        mastery,
    })
}
