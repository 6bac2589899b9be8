use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spelling_algo::sanitize::{coerce_optional_text, require_text};
use spelling_algo::{Difficulty, Word, WordList};

use crate::config::EngineConfig;
use crate::db::{RecordStore, StoreResult};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordListInput {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInput {
    pub text: String,
    pub explanation: Option<String>,
}

/// One list parsed from the plain-text import format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedWordList {
    pub name: String,
    pub words: Vec<String>,
}

pub fn is_pool_list(config: &EngineConfig, list: &WordList) -> bool {
    list.name == config.pool_list_name
}

pub async fn find_pool_list(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
) -> StoreResult<Option<WordList>> {
    store
        .find_word_list_by_name(user_id, &config.pool_list_name)
        .await
}

/// The user's difficult words list, created on first use.
pub async fn ensure_pool_list(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
) -> StoreResult<WordList> {
    if let Some(list) = find_pool_list(store, config, user_id).await? {
        return Ok(list);
    }
    let list = WordList {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: config.pool_list_name.clone(),
        description: "Words that still need extra practice".to_string(),
        difficulty: Difficulty::Hard,
    };
    store.insert_word_list(&list).await?;
    tracing::info!(user_id = %user_id, list_id = %list.id, "created pool list");
    Ok(list)
}

/// Load a list the user may edit: it must exist, belong to them, and not be the pool list.
async fn editable_list(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    list_id: &str,
) -> EngineResult<WordList> {
    let list = owned_list(store, user_id, list_id).await?;
    if is_pool_list(config, &list) {
        return Err(EngineError::Forbidden(format!(
            "list '{}' is managed automatically",
            list.name
        )));
    }
    Ok(list)
}

pub(crate) async fn owned_list(
    store: &dyn RecordStore,
    user_id: &str,
    list_id: &str,
) -> EngineResult<WordList> {
    let list_id = require_text("word list id", list_id)?;
    let list = store
        .get_word_list(list_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("word list {list_id}")))?;
    if list.user_id != user_id {
        return Err(EngineError::Forbidden(format!("word list {list_id}")));
    }
    Ok(list)
}

fn reject_reserved_name(config: &EngineConfig, name: &str) -> EngineResult<()> {
    if name == config.pool_list_name {
        return Err(EngineError::Forbidden(format!("list name '{name}' is reserved")));
    }
    Ok(())
}

pub async fn list_word_lists(store: &dyn RecordStore, user_id: &str) -> EngineResult<Vec<WordList>> {
    let user_id = require_text("user id", user_id)?;
    Ok(store.list_word_lists(user_id).await?)
}

pub async fn list_words(store: &dyn RecordStore, user_id: &str, list_id: &str) -> EngineResult<Vec<Word>> {
    let list = owned_list(store, user_id, list_id).await?;
    Ok(store.list_words(&list.id).await?)
}

pub async fn create_word_list(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    input: WordListInput,
) -> EngineResult<WordList> {
    let user_id = require_text("user id", user_id)?;
    let name = require_text("list name", &input.name)?;
    reject_reserved_name(config, name)?;

    let list = WordList {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: coerce_optional_text(input.description.as_deref()),
        difficulty: input
            .difficulty
            .as_deref()
            .map(Difficulty::parse_or_default)
            .unwrap_or_default(),
    };
    store.insert_word_list(&list).await?;
    Ok(list)
}

pub async fn update_word_list(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    list_id: &str,
    input: WordListInput,
) -> EngineResult<WordList> {
    let mut list = editable_list(store, config, user_id, list_id).await?;
    let name = require_text("list name", &input.name)?;
    reject_reserved_name(config, name)?;

    list.name = name.to_string();
    list.description = coerce_optional_text(input.description.as_deref());
    if let Some(difficulty) = input.difficulty.as_deref() {
        list.difficulty = Difficulty::parse_or_default(difficulty);
    }
    store.update_word_list(&list).await?;
    Ok(list)
}

pub async fn delete_word_list(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    list_id: &str,
) -> EngineResult<()> {
    let list = editable_list(store, config, user_id, list_id).await?;
    for word in store.list_words(&list.id).await? {
        if let Err(err) = crate::services::mastery::forget_word(store, config, user_id, &word).await {
            tracing::warn!(user_id = %user_id, word_id = %word.id, error = %err, "failed to clear mastery state of deleted word");
        }
    }
    store.delete_word_list(&list.id).await?;
    Ok(())
}

pub async fn add_word(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    list_id: &str,
    input: WordInput,
) -> EngineResult<Word> {
    let list = editable_list(store, config, user_id, list_id).await?;
    let text = require_text("word", &input.text)?;

    let word = Word {
        id: Uuid::new_v4().to_string(),
        list_id: list.id,
        text: text.to_string(),
        explanation: coerce_optional_text(input.explanation.as_deref()),
        source_word_id: None,
    };
    store.insert_word(&word).await?;
    Ok(word)
}

async fn editable_word(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word_id: &str,
) -> EngineResult<Word> {
    let word_id = require_text("word id", word_id)?;
    let word = store
        .get_word(word_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("word {word_id}")))?;
    editable_list(store, config, user_id, &word.list_id).await?;
    Ok(word)
}

pub async fn update_word(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word_id: &str,
    input: WordInput,
) -> EngineResult<Word> {
    let mut word = editable_word(store, config, user_id, word_id).await?;
    word.text = require_text("word", &input.text)?.to_string();
    word.explanation = coerce_optional_text(input.explanation.as_deref());
    store.update_word(&word).await?;
    Ok(word)
}

pub async fn delete_word(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    word_id: &str,
) -> EngineResult<()> {
    let word = editable_word(store, config, user_id, word_id).await?;
    if let Err(err) = crate::services::mastery::forget_word(store, config, user_id, &word).await {
        tracing::warn!(user_id = %user_id, word_id = %word.id, error = %err, "failed to clear mastery state of deleted word");
    }
    store.delete_word(&word.id).await?;
    Ok(())
}

/// Parse the plain-text list format: a line starting with `/` opens a list
/// named by the rest of the line, every following non-blank line is a word.
/// Words before the first header are ignored.
pub fn parse_word_lists(content: &str) -> Vec<ParsedWordList> {
    let mut lists = Vec::new();
    let mut current: Option<ParsedWordList> = None;

    for line in content.lines().map(str::trim) {
        if let Some(name) = line.strip_prefix('/') {
            if let Some(done) = current.take() {
                lists.push(done);
            }
            current = Some(ParsedWordList {
                name: name.trim().to_string(),
                words: Vec::new(),
            });
        } else if !line.is_empty() {
            if let Some(list) = current.as_mut() {
                list.words.push(line.to_string());
            }
        }
    }
    if let Some(done) = current {
        lists.push(done);
    }
    lists
}

/// Create one list per parsed block. Blocks with a blank or reserved name are skipped.
pub async fn import_word_lists(
    store: &dyn RecordStore,
    config: &EngineConfig,
    user_id: &str,
    content: &str,
) -> EngineResult<Vec<WordList>> {
    let mut created = Vec::new();
    for parsed in parse_word_lists(content) {
        let input = WordListInput {
            name: parsed.name.clone(),
            ..WordListInput::default()
        };
        let list = match create_word_list(store, config, user_id, input).await {
            Ok(list) => list,
            Err(err @ (EngineError::Validation(_) | EngineError::Forbidden(_))) => {
                tracing::warn!(name = %parsed.name, error = %err, "skipping imported list");
                continue;
            }
            Err(err) => return Err(err),
        };
        for text in parsed.words {
            add_word(
                store,
                config,
                user_id,
                &list.id,
                WordInput {
                    text,
                    explanation: None,
                },
            )
            .await?;
        }
        tracing::info!(user_id = %user_id, list = %list.name, "imported word list");
        created.push(list);
    }
    Ok(created)
}
