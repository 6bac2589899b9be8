use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use spelling_algo::sanitize::require_text;
use spelling_algo::{apply_attempt, MasteryRecord, MasteryTransition, Word};

use crate::config::EngineConfig;
use crate::db::{RecordStore, StoreError, StoreResult};
use crate::error::{EngineError, EngineResult};
use crate::services::word_lists::{ensure_pool_list, find_pool_list};

/// What happened to the difficult words list during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolChange {
    Unchanged,
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
    /// Mastery state was written but the pool list could not be updated
    Failed,
}

/// Result of feeding one attempt to the mastery tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MasteryOutcome {
    /// Correct answer on a word that was never struggling
    Untracked,
    Struggling {
        record: MasteryRecord,
        pool: PoolChange,
    },
    Mastered {
        pool: PoolChange,
    },
    /// The store could not be read or written; nothing was changed
    Degraded {
        reason: String,
    },
}

impl MasteryOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, MasteryOutcome::Degraded { .. })
    }
}

pub(crate) async fn timed<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout)?
}

fn degraded(user_id: &str, word_id: &str, stage: &str, err: &StoreError) -> MasteryOutcome {
    tracing::warn!(user_id = %user_id, word_id = %word_id, stage, error = %err, "mastery update skipped");
    MasteryOutcome::Degraded {
        reason: format!("{stage}: {err}"),
    }
}

/// Apply one attempt outcome to the user's mastery state for `word_id`.
///
/// Store failures never surface as errors: they are logged and reported as
/// [`MasteryOutcome::Degraded`] (state untouched) or [`PoolChange::Failed`]
/// (state written, pool list not). Only malformed ids, unknown words and words
/// from another user's list are errors.
pub async fn record_attempt(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word_id: &str,
    is_correct: bool,
) -> EngineResult<MasteryOutcome> {
    let user_id = require_text("user id", user_id)?;
    let word_id = require_text("word id", word_id)?;
    let limit = config.store_timeout;

    let word = match timed(limit, store.get_word(word_id)).await {
        Ok(Some(word)) => word,
        Ok(None) => return Err(EngineError::NotFound(format!("word {word_id}"))),
        Err(err) => return Ok(degraded(user_id, word_id, "load word", &err)),
    };
    match timed(limit, store.get_word_list(&word.list_id)).await {
        Ok(Some(list)) if list.user_id == user_id => {}
        Ok(Some(_)) => return Err(EngineError::Forbidden(format!("word {word_id}"))),
        Ok(None) => return Err(EngineError::NotFound(format!("word list {}", word.list_id))),
        Err(err) => return Ok(degraded(user_id, word_id, "load word list", &err)),
    }
    let tracking_id = word.tracking_id().to_string();

    let current = match timed(limit, store.find_mastery(user_id, &tracking_id)).await {
        Ok(current) => current,
        Err(err) => return Ok(degraded(user_id, &tracking_id, "load mastery", &err)),
    };

    let transition = apply_attempt(
        &config.mastery_policy(),
        current.as_ref(),
        user_id,
        &tracking_id,
        is_correct,
        Utc::now(),
    );
    tracing::debug!(user_id = %user_id, word_id = %tracking_id, is_correct, effect = ?transition.pool_effect(), "mastery transition");

    let outcome = match transition {
        MasteryTransition::Untracked => MasteryOutcome::Untracked,
        MasteryTransition::Created(record) => {
            if let Err(err) = timed(limit, store.insert_mastery(&record)).await {
                return Ok(degraded(user_id, &tracking_id, "insert mastery", &err));
            }
            let origin = resolve_origin(store, limit, &word).await;
            let pool = match add_to_pool(store, config, user_id, &origin).await {
                Ok(change) => change,
                Err(err) => {
                    tracing::warn!(user_id = %user_id, word_id = %origin.id, error = %err, "failed to add word to pool list");
                    PoolChange::Failed
                }
            };
            MasteryOutcome::Struggling { record, pool }
        }
        MasteryTransition::Updated(record) => {
            if let Err(err) = timed(limit, store.update_mastery(&record)).await {
                return Ok(degraded(user_id, &tracking_id, "update mastery", &err));
            }
            // Every miss re-checks the pool so an earlier failed add gets repaired
            let pool = if is_correct {
                PoolChange::Unchanged
            } else {
                let origin = resolve_origin(store, limit, &word).await;
                match add_to_pool(store, config, user_id, &origin).await {
                    Ok(change) => change,
                    Err(err) => {
                        tracing::warn!(user_id = %user_id, word_id = %origin.id, error = %err, "failed to add word to pool list");
                        PoolChange::Failed
                    }
                }
            };
            MasteryOutcome::Struggling { record, pool }
        }
        MasteryTransition::Mastered(record) => {
            match timed(limit, store.delete_mastery(user_id, &tracking_id)).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(err) => return Ok(degraded(user_id, &tracking_id, "delete mastery", &err)),
            }
            tracing::debug!(user_id = %user_id, word_id = %tracking_id, mistakes = record.mistake_count, "word mastered");
            let origin = resolve_origin(store, limit, &word).await;
            let pool = match remove_from_pool(store, config, user_id, &origin).await {
                Ok(change) => change,
                Err(err) => {
                    tracing::warn!(user_id = %user_id, word_id = %origin.id, error = %err, "failed to remove word from pool list");
                    PoolChange::Failed
                }
            };
            MasteryOutcome::Mastered { pool }
        }
    };

    Ok(outcome)
}

/// The word a pool copy was made from; the word itself when it is not a copy
/// or its source has since disappeared.
async fn resolve_origin(store: &dyn RecordStore, limit: Duration, word: &Word) -> Word {
    let Some(source_id) = word.source_word_id.as_deref() else {
        return word.clone();
    };
    match timed(limit, store.get_word(source_id)).await {
        Ok(Some(source)) => source,
        Ok(None) => word.clone(),
        Err(err) => {
            tracing::warn!(word_id = %word.id, source_id, error = %err, "pool copy source lookup failed");
            word.clone()
        }
    }
}

async fn add_to_pool(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    origin: &Word,
) -> StoreResult<PoolChange> {
    let limit = config.store_timeout;
    let pool_list = timed(limit, ensure_pool_list(store, config, user_id)).await?;
    if origin.list_id == pool_list.id {
        return Ok(PoolChange::AlreadyPresent);
    }

    let entries = timed(limit, store.list_words(&pool_list.id)).await?;
    if entries.iter().any(|entry| config.pool_match.matches(entry, origin)) {
        return Ok(PoolChange::AlreadyPresent);
    }

    let explanation = if origin.explanation.trim().is_empty() {
        format!("Difficult word: {}", origin.text)
    } else {
        origin.explanation.clone()
    };
    let copy = Word {
        id: Uuid::new_v4().to_string(),
        list_id: pool_list.id.clone(),
        text: origin.text.clone(),
        explanation,
        source_word_id: Some(origin.id.clone()),
    };
    timed(limit, store.insert_word(&copy)).await?;

    tracing::info!(user_id = %user_id, word = %origin.text, "added word to pool list");
    Ok(PoolChange::Added)
}

async fn remove_from_pool(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    origin: &Word,
) -> StoreResult<PoolChange> {
    let limit = config.store_timeout;
    let Some(pool_list) = timed(limit, find_pool_list(store, config, user_id)).await? else {
        return Ok(PoolChange::NotPresent);
    };

    let entries = timed(limit, store.list_words(&pool_list.id)).await?;
    let mut removed = 0usize;
    for entry in entries
        .iter()
        .filter(|entry| entry.id == origin.id || config.pool_match.matches(entry, origin))
    {
        match timed(limit, store.delete_word(&entry.id)).await {
            Ok(()) => removed += 1,
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }
    }

    if removed == 0 {
        return Ok(PoolChange::NotPresent);
    }
    tracing::info!(user_id = %user_id, word = %origin.text, "removed mastered word from pool list");
    Ok(PoolChange::Removed)
}

/// Drop all mastery traces of a word that is being deleted: its record and its pool copies.
pub(crate) async fn forget_word(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word: &Word,
) -> StoreResult<()> {
    match store.delete_mastery(user_id, word.tracking_id()).await {
        Ok(()) | Err(StoreError::NotFound(_)) => {}
        Err(err) => return Err(err),
    }
    if word.source_word_id.is_none() {
        remove_from_pool(store, config, user_id, word).await?;
    }
    Ok(())
}
