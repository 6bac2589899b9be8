use spelling_algo::sanitize::{require_text, validate_max_words};
use spelling_algo::{MasteryRecord, Word};

use crate::config::EngineConfig;
use crate::db::RecordStore;
use crate::error::EngineResult;
use crate::services::mastery::timed;
use crate::services::word_lists::owned_list;

/// Words of the list plus the user's mastery records for the weighting step.
pub(crate) async fn session_inputs(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word_list_id: &str,
) -> EngineResult<(Vec<Word>, Vec<MasteryRecord>)> {
    let user_id = require_text("user id", user_id)?;
    let list = owned_list(store, user_id, word_list_id).await?;
    let base_words = store.list_words(&list.id).await?;
    if base_words.is_empty() {
        return Ok((base_words, Vec::new()));
    }

    let mastery = match timed(config.store_timeout, store.list_mastery(user_id)).await {
        Ok(records) => records,
        Err(err) => {
            // 掌握度读取失败时退化为不加权的练习
            tracing::warn!(user_id = %user_id, list_id = %list.id, error = %err, "mastery state unavailable, building unweighted session");
            Vec::new()
        }
    };
    Ok((base_words, mastery))
}

/// Practice sequence for one session over `word_list_id`.
///
/// Struggling words are repeated according to their mistake count before the
/// shuffle. An empty list gives an empty sequence.
pub async fn build_session(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word_list_id: &str,
    max_words: usize,
) -> EngineResult<Vec<Word>> {
    validate_max_words(max_words)?;
    let (base_words, mastery) = session_inputs(store, config, user_id, word_list_id).await?;
    if base_words.is_empty() {
        tracing::debug!(user_id = %user_id, list_id = %word_list_id, "no words to practice");
        return Ok(Vec::new());
    }

    let words = spelling_algo::build_session(&base_words, &mastery, max_words);
    tracing::debug!(
        user_id = %user_id,
        list_id = %word_list_id,
        base = base_words.len(),
        struggling = mastery.len(),
        selected = words.len(),
        "built practice session"
    );
    Ok(words)
}
