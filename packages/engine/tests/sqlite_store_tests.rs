mod common;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use common::{seed_list, word};
use spelling_algo::{MasteryRecord, PointSettings};
use spelling_engine::db::StoreError;
use spelling_engine::{EngineConfig, PracticeEngine, RecordStore, SqliteStore};

const SEQUENCE: &[(&str, bool)] = &[
    ("kasteel", false),
    ("ridder", true),
    ("kasteel", true),
    ("kasteel", false),
    ("draak", false),
    ("kasteel", true),
    ("draak", true),
    ("draak", true),
    ("draak", true),
    ("draak", true),
    ("draak", true),
];

async fn open(path: &Path) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open(path).await.expect("open sqlite store"))
}

/// (word id, mistakes, streak) of every record plus the sorted pool list texts.
async fn snapshot(engine: &PracticeEngine) -> (Vec<(String, u32, u32)>, Vec<String>) {
    let store = engine.store();
    let mut records: Vec<_> = store
        .list_mastery("u1")
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.word_id, r.mistake_count, r.correct_streak))
        .collect();
    records.sort();

    let mut pool = match store
        .find_word_list_by_name("u1", &engine.config().pool_list_name)
        .await
        .unwrap()
    {
        Some(list) => store
            .list_words(&list.id)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.text)
            .collect(),
        None => Vec::new(),
    };
    pool.sort();
    (records, pool)
}

#[tokio::test]
async fn replay_across_restart_matches_single_run() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::default();

    let straight_path = dir.path().join("straight.db");
    let straight = open(&straight_path).await;
    seed_list(straight.as_ref(), &["kasteel", "ridder", "draak"]).await;
    let engine = PracticeEngine::new(straight.clone(), config.clone());
    for (word_id, correct) in SEQUENCE {
        engine.record_attempt("u1", word_id, *correct).await.unwrap();
    }
    let expected = snapshot(&engine).await;
    straight.close().await;

    let restarted_path = dir.path().join("restarted.db");
    let (first, second) = SEQUENCE.split_at(5);
    {
        let store = open(&restarted_path).await;
        seed_list(store.as_ref(), &["kasteel", "ridder", "draak"]).await;
        let engine = PracticeEngine::new(store.clone(), config.clone());
        for (word_id, correct) in first {
            engine.record_attempt("u1", word_id, *correct).await.unwrap();
        }
        store.close().await;
    }
    let store = open(&restarted_path).await;
    let engine = PracticeEngine::new(store.clone(), config);
    for (word_id, correct) in second {
        engine.record_attempt("u1", word_id, *correct).await.unwrap();
    }

    let actual = snapshot(&engine).await;
    assert_eq!(actual, expected);
    assert_eq!(
        actual,
        (vec![("kasteel".to_string(), 2, 1)], vec!["kasteel".to_string()])
    );
    store.close().await;
}

#[tokio::test]
async fn reopening_keeps_schema_and_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("data.db");

    let store = open(&path).await;
    seed_list(store.as_ref(), &["appel"]).await;
    store
        .upsert_settings(
            "u1",
            &PointSettings {
                correct_word_points: 3,
                ..PointSettings::default()
            },
        )
        .await
        .unwrap();
    store.close().await;

    let store = open(&path).await;
    assert_eq!(store.list_words("l1").await.unwrap().len(), 1);
    assert_eq!(
        store.get_settings("u1").await.unwrap().map(|s| s.correct_word_points),
        Some(3)
    );
    store.close().await;
}

#[tokio::test]
async fn sqlite_store_reports_conflicts_and_missing_rows() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir.path().join("data.db")).await;
    seed_list(store.as_ref(), &["appel"]).await;

    assert!(matches!(
        store.insert_word(&word("appel", "l1", "appel")).await,
        Err(StoreError::Conflict(_))
    ));
    assert!(matches!(store.delete_word("peer").await, Err(StoreError::NotFound(_))));

    let record = MasteryRecord {
        word_id: "appel".into(),
        user_id: "u1".into(),
        mistake_count: 1,
        correct_streak: 0,
        last_practiced_at: Utc::now(),
    };
    store.insert_mastery(&record).await.unwrap();
    assert!(matches!(store.insert_mastery(&record).await, Err(StoreError::Conflict(_))));
    store.delete_mastery("u1", "appel").await.unwrap();
    assert!(matches!(
        store.delete_mastery("u1", "appel").await,
        Err(StoreError::NotFound(_))
    ));
    store.close().await;
}

#[tokio::test]
async fn deleting_a_list_removes_its_words() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir.path().join("data.db")).await;
    seed_list(store.as_ref(), &["appel", "peer"]).await;

    store.delete_word_list("l1").await.unwrap();

    assert!(store.get_word_list("l1").await.unwrap().is_none());
    assert!(store.get_word("appel").await.unwrap().is_none());
    store.close().await;
}
