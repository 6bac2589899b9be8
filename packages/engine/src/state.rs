use std::sync::Arc;

use chrono::NaiveDate;

use spelling_algo::sanitize::{validate_base_points, validate_target};
use spelling_algo::{PointSettings, PracticeSession, ValidationError, Word, WordList};

use crate::config::EngineConfig;
use crate::db::RecordStore;
use crate::error::EngineResult;
use crate::services::attempts::{self, AttemptResult, SubmitAttempt};
use crate::services::mastery::{self, MasteryOutcome};
use crate::services::sessions::{self, ResetSummary, SessionSummary, StartedSession};
use crate::services::statistics::{self, UserStatistics};
use crate::services::word_lists::{self, WordInput, WordListInput};
use crate::services::{practice, settings};

/// Entry point for host applications: one store, one configuration.
#[derive(Clone)]
pub struct PracticeEngine {
    store: Arc<dyn RecordStore>,
    config: EngineConfig,
}

impl PracticeEngine {
    pub fn new(store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Core contracts ====================

    pub fn is_correct(&self, input: &str, target: &str) -> Result<bool, ValidationError> {
        validate_target(target)?;
        Ok(spelling_algo::is_correct(input, target))
    }

    pub fn points(&self, is_correct: bool, base_points: u32, bonus: bool) -> Result<u32, ValidationError> {
        validate_base_points(base_points)?;
        Ok(spelling_algo::points(is_correct, base_points, bonus))
    }

    pub async fn record_attempt(&self, user_id: &str, word_id: &str, is_correct: bool) -> EngineResult<MasteryOutcome> {
        mastery::record_attempt(self.store(), &self.config, user_id, word_id, is_correct).await
    }

    pub async fn build_session(&self, user_id: &str, word_list_id: &str, max_words: usize) -> EngineResult<Vec<Word>> {
        practice::build_session(self.store(), &self.config, user_id, word_list_id, max_words).await
    }

    // ==================== Sessions ====================

    pub async fn start_session(
        &self,
        user_id: &str,
        word_list_id: &str,
        max_words: Option<usize>,
    ) -> EngineResult<StartedSession> {
        sessions::start_session(self.store(), &self.config, user_id, word_list_id, max_words).await
    }

    pub async fn submit_attempt(&self, request: SubmitAttempt) -> EngineResult<AttemptResult> {
        attempts::submit_attempt(self.store(), &self.config, request).await
    }

    pub async fn end_session(&self, user_id: &str, session_id: &str) -> EngineResult<SessionSummary> {
        sessions::end_session(self.store(), user_id, session_id).await
    }

    pub async fn abandon_session(&self, user_id: &str, session_id: &str) {
        sessions::abandon_session(self.store(), user_id, session_id).await
    }

    pub async fn list_sessions(&self, user_id: &str) -> EngineResult<Vec<PracticeSession>> {
        sessions::list_sessions(self.store(), user_id).await
    }

    pub async fn delete_session(&self, user_id: &str, session_id: &str) -> EngineResult<()> {
        sessions::delete_session(self.store(), user_id, session_id).await
    }

    pub async fn reset_progress(&self, user_id: &str) -> EngineResult<ResetSummary> {
        sessions::reset_progress(self.store(), &self.config, user_id).await
    }

    // ==================== Word lists ====================

    pub async fn list_word_lists(&self, user_id: &str) -> EngineResult<Vec<WordList>> {
        word_lists::list_word_lists(self.store(), user_id).await
    }

    pub async fn list_words(&self, user_id: &str, list_id: &str) -> EngineResult<Vec<Word>> {
        word_lists::list_words(self.store(), user_id, list_id).await
    }

    pub async fn create_word_list(&self, user_id: &str, input: WordListInput) -> EngineResult<WordList> {
        word_lists::create_word_list(self.store(), &self.config, user_id, input).await
    }

    pub async fn update_word_list(&self, user_id: &str, list_id: &str, input: WordListInput) -> EngineResult<WordList> {
        word_lists::update_word_list(self.store(), &self.config, user_id, list_id, input).await
    }

    pub async fn delete_word_list(&self, user_id: &str, list_id: &str) -> EngineResult<()> {
        word_lists::delete_word_list(self.store(), &self.config, user_id, list_id).await
    }

    pub async fn add_word(&self, user_id: &str, list_id: &str, input: WordInput) -> EngineResult<Word> {
        word_lists::add_word(self.store(), &self.config, user_id, list_id, input).await
    }

    pub async fn update_word(&self, user_id: &str, word_id: &str, input: WordInput) -> EngineResult<Word> {
        word_lists::update_word(self.store(), &self.config, user_id, word_id, input).await
    }

    pub async fn delete_word(&self, user_id: &str, word_id: &str) -> EngineResult<()> {
        word_lists::delete_word(self.store(), &self.config, user_id, word_id).await
    }

    pub async fn import_word_lists(&self, user_id: &str, content: &str) -> EngineResult<Vec<WordList>> {
        word_lists::import_word_lists(self.store(), &self.config, user_id, content).await
    }

    // ==================== Points & statistics ====================

    pub async fn get_settings(&self, user_id: &str) -> EngineResult<PointSettings> {
        settings::get_settings(self.store(), user_id).await
    }

    pub async fn update_settings(&self, user_id: &str, value: PointSettings) -> EngineResult<PointSettings> {
        settings::update_settings(self.store(), user_id, value).await
    }

    pub async fn total_points(&self, user_id: &str) -> EngineResult<u64> {
        settings::total_points(self.store(), user_id).await
    }

    pub async fn user_statistics(&self, user_id: &str) -> EngineResult<UserStatistics> {
        statistics::user_statistics(self.store(), user_id).await
    }

    pub async fn user_statistics_at(&self, user_id: &str, today: NaiveDate) -> EngineResult<UserStatistics> {
        statistics::user_statistics_at(self.store(), user_id, today).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    fn engine() -> PracticeEngine {
        PracticeEngine::new(Arc::new(InMemoryStore::new()), EngineConfig::default())
    }

    #[test]
    fn pure_contracts_validate_input() {
        let engine = engine();
        assert_eq!(engine.is_correct("  Appel ", "appel"), Ok(true));
        assert_eq!(engine.is_correct("appel", "  "), Err(ValidationError::Empty("target word")));
        assert_eq!(engine.points(true, 7, true), Ok(11));
        assert_eq!(engine.points(false, 7, true), Ok(0));
        assert_eq!(engine.points(true, 0, false), Err(ValidationError::NotPositive("base points")));
    }
}
