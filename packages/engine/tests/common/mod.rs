#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use spelling_algo::{
    Attempt, Difficulty, MasteryRecord, PointEntry, PointSettings, PracticeSession, Word, WordList,
};
use spelling_engine::db::{InMemoryStore, RecordStore, StoreError, StoreResult};

/// In-memory store whose mastery, word-insert or attempt paths can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_mastery: AtomicBool,
    pub fail_word_inserts: AtomicBool,
    pub fail_attempts: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get_word(&self, id: &str) -> StoreResult<Option<Word>> {
        self.inner.get_word(id).await
    }
    async fn list_words(&self, list_id: &str) -> StoreResult<Vec<Word>> {
        self.inner.list_words(list_id).await
    }
    async fn insert_word(&self, word: &Word) -> StoreResult<()> {
        Self::check(&self.fail_word_inserts)?;
        self.inner.insert_word(word).await
    }
    async fn update_word(&self, word: &Word) -> StoreResult<()> {
        self.inner.update_word(word).await
    }
    async fn delete_word(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_word(id).await
    }

    async fn get_word_list(&self, id: &str) -> StoreResult<Option<WordList>> {
        self.inner.get_word_list(id).await
    }
    async fn list_word_lists(&self, user_id: &str) -> StoreResult<Vec<WordList>> {
        self.inner.list_word_lists(user_id).await
    }
    async fn find_word_list_by_name(&self, user_id: &str, name: &str) -> StoreResult<Option<WordList>> {
        self.inner.find_word_list_by_name(user_id, name).await
    }
    async fn insert_word_list(&self, list: &WordList) -> StoreResult<()> {
        self.inner.insert_word_list(list).await
    }
    async fn update_word_list(&self, list: &WordList) -> StoreResult<()> {
        self.inner.update_word_list(list).await
    }
    async fn delete_word_list(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_word_list(id).await
    }

    async fn find_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<Option<MasteryRecord>> {
        Self::check(&self.fail_mastery)?;
        self.inner.find_mastery(user_id, word_id).await
    }
    async fn list_mastery(&self, user_id: &str) -> StoreResult<Vec<MasteryRecord>> {
        Self::check(&self.fail_mastery)?;
        self.inner.list_mastery(user_id).await
    }
    async fn insert_mastery(&self, record: &MasteryRecord) -> StoreResult<()> {
        Self::check(&self.fail_mastery)?;
        self.inner.insert_mastery(record).await
    }
    async fn update_mastery(&self, record: &MasteryRecord) -> StoreResult<()> {
        Self::check(&self.fail_mastery)?;
        self.inner.update_mastery(record).await
    }
    async fn delete_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<()> {
        Self::check(&self.fail_mastery)?;
        self.inner.delete_mastery(user_id, word_id).await
    }

    async fn get_session(&self, id: &str) -> StoreResult<Option<PracticeSession>> {
        self.inner.get_session(id).await
    }
    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<PracticeSession>> {
        self.inner.list_sessions(user_id).await
    }
    async fn insert_session(&self, session: &PracticeSession) -> StoreResult<()> {
        self.inner.insert_session(session).await
    }
    async fn update_session(&self, session: &PracticeSession) -> StoreResult<()> {
        self.inner.update_session(session).await
    }
    async fn delete_session(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_session(id).await
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()> {
        Self::check(&self.fail_attempts)?;
        self.inner.insert_attempt(attempt).await
    }
    async fn list_attempts(&self, session_id: &str) -> StoreResult<Vec<Attempt>> {
        self.inner.list_attempts(session_id).await
    }

    async fn insert_point_entry(&self, entry: &PointEntry) -> StoreResult<()> {
        self.inner.insert_point_entry(entry).await
    }
    async fn list_point_entries(&self, user_id: &str) -> StoreResult<Vec<PointEntry>> {
        self.inner.list_point_entries(user_id).await
    }
    async fn delete_point_entries(&self, user_id: &str) -> StoreResult<()> {
        self.inner.delete_point_entries(user_id).await
    }

    async fn get_settings(&self, user_id: &str) -> StoreResult<Option<PointSettings>> {
        self.inner.get_settings(user_id).await
    }
    async fn upsert_settings(&self, user_id: &str, settings: &PointSettings) -> StoreResult<()> {
        self.inner.upsert_settings(user_id, settings).await
    }
}

pub fn word_list(id: &str, user_id: &str, name: &str) -> WordList {
    WordList {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: String::new(),
        difficulty: Difficulty::Medium,
    }
}

pub fn word(id: &str, list_id: &str, text: &str) -> Word {
    Word {
        id: id.to_string(),
        list_id: list_id.to_string(),
        text: text.to_string(),
        explanation: String::new(),
        source_word_id: None,
    }
}

/// One list `l1` owned by `u1` holding the given words (ids equal their text).
pub async fn seed_list(store: &dyn RecordStore, words: &[&str]) {
    store
        .insert_word_list(&word_list("l1", "u1", "Week 1"))
        .await
        .expect("insert list");
    for text in words {
        store.insert_word(&word(text, "l1", text)).await.expect("insert word");
    }
}
