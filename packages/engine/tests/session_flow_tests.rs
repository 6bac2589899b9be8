mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use common::seed_list;
use spelling_algo::{PointActivity, PracticeSession};
use spelling_engine::services::attempts::SubmitAttempt;
use spelling_engine::services::word_lists::WordListInput;
use spelling_engine::{EngineConfig, EngineError, InMemoryStore, PracticeEngine, RecordStore};

fn engine() -> (Arc<InMemoryStore>, PracticeEngine) {
    let store = Arc::new(InMemoryStore::new());
    let engine = PracticeEngine::new(store.clone(), EngineConfig::default());
    (store, engine)
}

fn submit(session_id: &str, word_id: &str, input: &str) -> SubmitAttempt {
    SubmitAttempt {
        user_id: "u1".into(),
        session_id: session_id.into(),
        word_id: word_id.into(),
        input: input.into(),
    }
}

#[tokio::test]
async fn perfect_session_awards_bonus_once() {
    let (store, engine) = engine();
    seed_list(store.as_ref(), &["maan", "zon"]).await;

    let started = engine.start_session("u1", "l1", None).await.unwrap();
    assert_eq!(started.session.total_words, 2);
    for word in &started.words {
        let result = engine
            .submit_attempt(submit(&started.session.id, &word.id, &word.text.to_uppercase()))
            .await
            .unwrap();
        assert!(result.is_correct);
    }

    let summary = engine.end_session("u1", &started.session.id).await.unwrap();
    assert!(!summary.already_sealed);
    assert_eq!(summary.bonuses.len(), 1);
    assert_eq!(summary.bonuses[0].activity, PointActivity::PerfectList);
    assert_eq!(summary.session.points_earned, 70);
    assert_eq!(engine.total_points("u1").await.unwrap(), 70);

    let again = engine.end_session("u1", &started.session.id).await.unwrap();
    assert!(again.already_sealed);
    assert!(again.bonuses.is_empty());
    assert_eq!(engine.total_points("u1").await.unwrap(), 70);

    assert!(matches!(
        engine
            .submit_attempt(submit(&started.session.id, "maan", "maan"))
            .await,
        Err(EngineError::SessionSealed(_))
    ));
}

#[tokio::test]
async fn session_with_a_miss_is_not_perfect() {
    let (store, engine) = engine();
    seed_list(store.as_ref(), &["maan"]).await;

    let started = engine.start_session("u1", "l1", Some(1)).await.unwrap();
    let id = started.session.id.clone();
    engine.submit_attempt(submit(&id, "maan", "maam")).await.unwrap();
    engine.submit_attempt(submit(&id, "maan", "maan")).await.unwrap();

    let summary = engine.end_session("u1", &id).await.unwrap();
    assert!(summary.bonuses.is_empty());
    assert_eq!(summary.session.correct_count, 1);
    assert_eq!(summary.session.points_earned, 0);
}

#[tokio::test]
async fn empty_list_has_no_content() {
    let (store, engine) = engine();
    seed_list(store.as_ref(), &[]).await;
    assert!(matches!(
        engine.start_session("u1", "l1", None).await,
        Err(EngineError::NoContent(_))
    ));
    assert!(store.list_sessions("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn sealing_the_day_after_earns_a_streak_bonus() {
    let (store, engine) = engine();
    seed_list(store.as_ref(), &["maan"]).await;
    let yesterday = Utc::now() - Duration::days(1);
    store
        .insert_session(&PracticeSession {
            id: "old".into(),
            user_id: "u1".into(),
            word_list_id: "l1".into(),
            start_time: yesterday - Duration::minutes(10),
            end_time: Some(yesterday),
            total_words: 1,
            correct_count: 0,
            points_earned: 0,
        })
        .await
        .unwrap();

    let started = engine.start_session("u1", "l1", Some(1)).await.unwrap();
    let summary = engine.end_session("u1", &started.session.id).await.unwrap();

    let activities: Vec<_> = summary.bonuses.iter().map(|b| b.activity).collect();
    assert_eq!(activities, vec![PointActivity::DailyStreak]);

    let second = engine.start_session("u1", "l1", Some(1)).await.unwrap();
    let summary = engine.end_session("u1", &second.session.id).await.unwrap();
    assert!(summary.bonuses.is_empty());
}

#[tokio::test]
async fn abandon_seals_without_bonus_and_never_fails() {
    let (store, engine) = engine();
    seed_list(store.as_ref(), &["maan"]).await;
    let started = engine.start_session("u1", "l1", Some(1)).await.unwrap();
    engine
        .submit_attempt(submit(&started.session.id, "maan", "maan"))
        .await
        .unwrap();

    engine.abandon_session("u1", &started.session.id).await;
    engine.abandon_session("u1", "does-not-exist").await;

    let session = store.get_session(&started.session.id).await.unwrap().unwrap();
    assert!(session.is_sealed());
    assert_eq!(engine.total_points("u1").await.unwrap(), 10);
}

#[tokio::test]
async fn statistics_summarize_history() {
    let (store, engine) = engine();
    seed_list(store.as_ref(), &["maan", "zon", "ster"]).await;

    let started = engine.start_session("u1", "l1", Some(3)).await.unwrap();
    let id = started.session.id.clone();
    engine.submit_attempt(submit(&id, "maan", "maan")).await.unwrap();
    engine.submit_attempt(submit(&id, "zon", "zom")).await.unwrap();
    engine.submit_attempt(submit(&id, "zon", "zonn")).await.unwrap();
    engine.submit_attempt(submit(&id, "ster", "ster")).await.unwrap();
    engine.end_session("u1", &id).await.unwrap();

    let stats = engine.user_statistics("u1").await.unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.total_attempts, 4);
    assert_eq!(stats.correct_attempts, 2);
    assert_eq!(stats.incorrect_attempts, 2);
    assert_eq!(stats.accuracy, 50);
    assert_eq!(stats.unique_words_practiced, 3);
    assert_eq!(stats.total_points, 20);
    assert_eq!(stats.hardest_words.len(), 1);
    assert_eq!(stats.hardest_words[0].text, "zon");
    assert_eq!(stats.hardest_words[0].accuracy, 0);
    assert_eq!(stats.recent_sessions.len(), 1);
    assert_eq!(stats.current_streak_days, 1);
    assert_eq!(stats.last_practice_date, Some(Utc::now().date_naive()));
    assert_eq!(stats.struggling_words, 1);
    // Week 1 plus the difficult words list
    assert_eq!(stats.word_list_count, 2);
}

#[tokio::test]
async fn reset_clears_progress_but_keeps_lists() {
    let (store, engine) = engine();
    seed_list(store.as_ref(), &["maan", "zon"]).await;
    let started = engine.start_session("u1", "l1", None).await.unwrap();
    let id = started.session.id.clone();
    engine.submit_attempt(submit(&id, "maan", "maan")).await.unwrap();
    engine.submit_attempt(submit(&id, "zon", "son")).await.unwrap();
    engine.end_session("u1", &id).await.unwrap();

    let summary = engine.reset_progress("u1").await.unwrap();

    assert_eq!(summary.sessions, 1);
    assert_eq!(summary.mastery_records, 1);
    assert_eq!(summary.pool_words, 1);
    assert!(store.list_sessions("u1").await.unwrap().is_empty());
    assert!(store.list_attempts(&id).await.unwrap().is_empty());
    assert_eq!(engine.total_points("u1").await.unwrap(), 0);
    assert!(store.list_mastery("u1").await.unwrap().is_empty());
    assert_eq!(engine.list_words("u1", "l1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn imported_lists_can_be_practiced() {
    let (_store, engine) = engine();
    let created = engine
        .import_word_lists("u1", "/Fruit\nappel\npeer\n/Groente\nprei\n")
        .await
        .unwrap();
    assert_eq!(created.len(), 2);

    let words = engine.build_session("u1", &created[0].id, 10).await.unwrap();
    let mut texts: Vec<_> = words.into_iter().map(|w| w.text).collect();
    texts.sort();
    assert_eq!(texts, vec!["appel".to_string(), "peer".to_string()]);

    assert!(matches!(
        engine
            .create_word_list(
                "u1",
                WordListInput {
                    name: " ".into(),
                    ..WordListInput::default()
                }
            )
            .await,
        Err(EngineError::Validation(_))
    ));
}
