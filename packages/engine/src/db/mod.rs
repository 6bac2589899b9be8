pub mod memory;
pub mod sqlite;
pub mod sqlite_schema;

use async_trait::async_trait;
use thiserror::Error;

use spelling_algo::{
    Attempt, MasteryRecord, PointEntry, PointSettings, PracticeSession, Word, WordList,
};

pub use memory::InMemoryStore;
pub use sqlite::{SqliteInitError, SqliteStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out")]
    Timeout,
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over the engine's record kinds.
///
/// Lookups return `Ok(None)` / empty vectors for absent rows; updates and
/// deletes of a missing id return [`StoreError::NotFound`]. Implementations
/// do no cross-record arbitration: callers own ordering.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ---- words ----
    async fn get_word(&self, id: &str) -> StoreResult<Option<Word>>;
    async fn list_words(&self, list_id: &str) -> StoreResult<Vec<Word>>;
    async fn insert_word(&self, word: &Word) -> StoreResult<()>;
    async fn update_word(&self, word: &Word) -> StoreResult<()>;
    async fn delete_word(&self, id: &str) -> StoreResult<()>;

    // ---- word lists ----
    async fn get_word_list(&self, id: &str) -> StoreResult<Option<WordList>>;
    async fn list_word_lists(&self, user_id: &str) -> StoreResult<Vec<WordList>>;
    async fn find_word_list_by_name(&self, user_id: &str, name: &str) -> StoreResult<Option<WordList>>;
    async fn insert_word_list(&self, list: &WordList) -> StoreResult<()>;
    async fn update_word_list(&self, list: &WordList) -> StoreResult<()>;
    /// Deletes the list together with its words.
    async fn delete_word_list(&self, id: &str) -> StoreResult<()>;

    // ---- mastery records ----
    async fn find_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<Option<MasteryRecord>>;
    async fn list_mastery(&self, user_id: &str) -> StoreResult<Vec<MasteryRecord>>;
    async fn insert_mastery(&self, record: &MasteryRecord) -> StoreResult<()>;
    async fn update_mastery(&self, record: &MasteryRecord) -> StoreResult<()>;
    async fn delete_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<()>;

    // ---- sessions ----
    async fn get_session(&self, id: &str) -> StoreResult<Option<PracticeSession>>;
    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<PracticeSession>>;
    async fn insert_session(&self, session: &PracticeSession) -> StoreResult<()>;
    async fn update_session(&self, session: &PracticeSession) -> StoreResult<()>;
    /// Deletes the session together with its attempts.
    async fn delete_session(&self, id: &str) -> StoreResult<()>;

    // ---- attempts ----
    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()>;
    async fn list_attempts(&self, session_id: &str) -> StoreResult<Vec<Attempt>>;

    // ---- points ----
    async fn insert_point_entry(&self, entry: &PointEntry) -> StoreResult<()>;
    async fn list_point_entries(&self, user_id: &str) -> StoreResult<Vec<PointEntry>>;
    async fn delete_point_entries(&self, user_id: &str) -> StoreResult<()>;

    // ---- settings ----
    async fn get_settings(&self, user_id: &str) -> StoreResult<Option<PointSettings>>;
    async fn upsert_settings(&self, user_id: &str, settings: &PointSettings) -> StoreResult<()>;
}
