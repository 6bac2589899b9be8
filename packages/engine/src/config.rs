use std::path::PathBuf;
use std::time::Duration;

use spelling_algo::{MasteryPolicy, PoolMatch, DEFAULT_MASTERY_THRESHOLD, DEFAULT_POOL_LIST_NAME};

use crate::db::sqlite::default_db_path;

const DEFAULT_MAX_WORDS: usize = 10;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: PathBuf,
    pub engine: EngineConfig,
}

/// Tunables of the practice engine itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mastery_threshold: u32,
    pub pool_match: PoolMatch,
    pub pool_list_name: String,
    pub default_max_words: usize,
    /// Upper bound on each store call made while updating mastery state
    pub store_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
            pool_match: PoolMatch::default(),
            pool_list_name: DEFAULT_POOL_LIST_NAME.to_string(),
            default_max_words: DEFAULT_MAX_WORDS,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    pub fn mastery_policy(&self) -> MasteryPolicy {
        MasteryPolicy::new(self.mastery_threshold)
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mastery_threshold = std::env::var("MASTERY_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.mastery_threshold);

        let pool_match = std::env::var("POOL_MATCH")
            .ok()
            .and_then(|value| PoolMatch::parse(&value))
            .unwrap_or(defaults.pool_match);

        let pool_list_name = std::env::var("POOL_LIST_NAME")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.pool_list_name);

        let default_max_words = std::env::var("DEFAULT_MAX_WORDS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.default_max_words);

        let store_timeout = std::env::var("STORE_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.store_timeout);

        Self {
            mastery_threshold,
            pool_match,
            pool_list_name,
            default_max_words,
            store_timeout,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let db_path = std::env::var("SPELLING_DB_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        Self {
            log_level,
            db_path,
            engine: EngineConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_canonical_values() {
        let config = EngineConfig::default();
        assert_eq!(config.mastery_threshold, 5);
        assert_eq!(config.pool_match, PoolMatch::SourceId);
        assert_eq!(config.pool_list_name, "Difficult Words");
        assert_eq!(config.default_max_words, 10);
        assert_eq!(config.mastery_policy().threshold, 5);
    }
}
