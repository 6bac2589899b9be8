use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use spelling_algo::{
    Attempt, MasteryRecord, PointEntry, PointSettings, PracticeSession, Word, WordList,
};

use super::{RecordStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    words: Vec<Word>,
    word_lists: Vec<WordList>,
    mastery: Vec<MasteryRecord>,
    sessions: Vec<PracticeSession>,
    attempts: Vec<Attempt>,
    points: Vec<PointEntry>,
    settings: HashMap<String, PointSettings>,
}

/// Process-local store. Rows keep insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace_by<T: Clone>(rows: &mut [T], value: &T, kind: &str, key: &str, pred: impl Fn(&T) -> bool) -> StoreResult<()> {
    match rows.iter_mut().find(|row| pred(row)) {
        Some(row) => {
            *row = value.clone();
            Ok(())
        }
        None => Err(StoreError::NotFound(format!("{kind} {key}"))),
    }
}

fn remove_by<T>(rows: &mut Vec<T>, kind: &str, key: &str, pred: impl Fn(&T) -> bool) -> StoreResult<()> {
    let before = rows.len();
    rows.retain(|row| !pred(row));
    if rows.len() == before {
        return Err(StoreError::NotFound(format!("{kind} {key}")));
    }
    Ok(())
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get_word(&self, id: &str) -> StoreResult<Option<Word>> {
        Ok(self.tables.read().words.iter().find(|w| w.id == id).cloned())
    }

    async fn list_words(&self, list_id: &str) -> StoreResult<Vec<Word>> {
        Ok(self
            .tables
            .read()
            .words
            .iter()
            .filter(|w| w.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn insert_word(&self, word: &Word) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.words.iter().any(|w| w.id == word.id) {
            return Err(StoreError::Conflict(format!("word {}", word.id)));
        }
        tables.words.push(word.clone());
        Ok(())
    }

    async fn update_word(&self, word: &Word) -> StoreResult<()> {
        replace_by(&mut self.tables.write().words, word, "word", &word.id, |w| w.id == word.id)
    }

    async fn delete_word(&self, id: &str) -> StoreResult<()> {
        remove_by(&mut self.tables.write().words, "word", id, |w| w.id == id)
    }

    async fn get_word_list(&self, id: &str) -> StoreResult<Option<WordList>> {
        Ok(self.tables.read().word_lists.iter().find(|l| l.id == id).cloned())
    }

    async fn list_word_lists(&self, user_id: &str) -> StoreResult<Vec<WordList>> {
        Ok(self
            .tables
            .read()
            .word_lists
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_word_list_by_name(&self, user_id: &str, name: &str) -> StoreResult<Option<WordList>> {
        Ok(self
            .tables
            .read()
            .word_lists
            .iter()
            .find(|l| l.user_id == user_id && l.name == name)
            .cloned())
    }

    async fn insert_word_list(&self, list: &WordList) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.word_lists.iter().any(|l| l.id == list.id) {
            return Err(StoreError::Conflict(format!("word list {}", list.id)));
        }
        tables.word_lists.push(list.clone());
        Ok(())
    }

    async fn update_word_list(&self, list: &WordList) -> StoreResult<()> {
        replace_by(&mut self.tables.write().word_lists, list, "word list", &list.id, |l| {
            l.id == list.id
        })
    }

    async fn delete_word_list(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        remove_by(&mut tables.word_lists, "word list", id, |l| l.id == id)?;
        tables.words.retain(|w| w.list_id != id);
        Ok(())
    }

    async fn find_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<Option<MasteryRecord>> {
        Ok(self
            .tables
            .read()
            .mastery
            .iter()
            .find(|m| m.user_id == user_id && m.word_id == word_id)
            .cloned())
    }

    async fn list_mastery(&self, user_id: &str) -> StoreResult<Vec<MasteryRecord>> {
        Ok(self
            .tables
            .read()
            .mastery
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_mastery(&self, record: &MasteryRecord) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables
            .mastery
            .iter()
            .any(|m| m.user_id == record.user_id && m.word_id == record.word_id)
        {
            return Err(StoreError::Conflict(format!(
                "mastery {}/{}",
                record.user_id, record.word_id
            )));
        }
        tables.mastery.push(record.clone());
        Ok(())
    }

    async fn update_mastery(&self, record: &MasteryRecord) -> StoreResult<()> {
        let key = format!("{}/{}", record.user_id, record.word_id);
        replace_by(&mut self.tables.write().mastery, record, "mastery", &key, |m| {
            m.user_id == record.user_id && m.word_id == record.word_id
        })
    }

    async fn delete_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<()> {
        let key = format!("{user_id}/{word_id}");
        remove_by(&mut self.tables.write().mastery, "mastery", &key, |m| {
            m.user_id == user_id && m.word_id == word_id
        })
    }

    async fn get_session(&self, id: &str) -> StoreResult<Option<PracticeSession>> {
        Ok(self.tables.read().sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<PracticeSession>> {
        Ok(self
            .tables
            .read()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_session(&self, session: &PracticeSession) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.sessions.iter().any(|s| s.id == session.id) {
            return Err(StoreError::Conflict(format!("session {}", session.id)));
        }
        tables.sessions.push(session.clone());
        Ok(())
    }

    async fn update_session(&self, session: &PracticeSession) -> StoreResult<()> {
        replace_by(&mut self.tables.write().sessions, session, "session", &session.id, |s| {
            s.id == session.id
        })
    }

    async fn delete_session(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        remove_by(&mut tables.sessions, "session", id, |s| s.id == id)?;
        tables.attempts.retain(|a| a.session_id != id);
        Ok(())
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()> {
        self.tables.write().attempts.push(attempt.clone());
        Ok(())
    }

    async fn list_attempts(&self, session_id: &str) -> StoreResult<Vec<Attempt>> {
        Ok(self
            .tables
            .read()
            .attempts
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert_point_entry(&self, entry: &PointEntry) -> StoreResult<()> {
        self.tables.write().points.push(entry.clone());
        Ok(())
    }

    async fn list_point_entries(&self, user_id: &str) -> StoreResult<Vec<PointEntry>> {
        Ok(self
            .tables
            .read()
            .points
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_point_entries(&self, user_id: &str) -> StoreResult<()> {
        self.tables.write().points.retain(|p| p.user_id != user_id);
        Ok(())
    }

    async fn get_settings(&self, user_id: &str) -> StoreResult<Option<PointSettings>> {
        Ok(self.tables.read().settings.get(user_id).cloned())
    }

    async fn upsert_settings(&self, user_id: &str, settings: &PointSettings) -> StoreResult<()> {
        self.tables
            .write()
            .settings
            .insert(user_id.to_string(), settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn word(id: &str, list_id: &str) -> Word {
        Word {
            id: id.to_string(),
            list_id: list_id.to_string(),
            text: format!("text-{id}"),
            explanation: String::new(),
            source_word_id: None,
        }
    }

    #[tokio::test]
    async fn test_delete_list_cascades_to_words() {
        let store = InMemoryStore::new();
        let list = WordList {
            id: "l1".into(),
            user_id: "u1".into(),
            name: "Week 1".into(),
            description: String::new(),
            difficulty: Default::default(),
        };
        store.insert_word_list(&list).await.unwrap();
        store.insert_word(&word("w1", "l1")).await.unwrap();
        store.insert_word(&word("w2", "l2")).await.unwrap();

        store.delete_word_list("l1").await.unwrap();

        assert!(store.get_word("w1").await.unwrap().is_none());
        assert!(store.get_word("w2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = InMemoryStore::new();
        store.insert_word(&word("w1", "l1")).await.unwrap();
        assert!(matches!(
            store.insert_word(&word("w1", "l1")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_rows_report_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(store.delete_word("nope").await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.delete_mastery("u1", "w1").await,
            Err(StoreError::NotFound(_))
        ));
        let record = MasteryRecord {
            word_id: "w1".into(),
            user_id: "u1".into(),
            mistake_count: 1,
            correct_streak: 0,
            last_practiced_at: Utc::now(),
        };
        assert!(matches!(
            store.update_mastery(&record).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
