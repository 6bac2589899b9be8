use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use spelling_algo::{
    Attempt, Difficulty, MasteryRecord, PointActivity, PointEntry, PointSettings,
    PracticeSession, Word, WordList,
};

use super::sqlite_schema::{split_sql_statements, SCHEMA_VERSION, SQLITE_SCHEMA_SQL};
use super::{RecordStore, StoreError, StoreResult};

#[derive(Debug, Error)]
pub enum SqliteInitError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Default database file under the platform's local data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spelling-practice")
        .join("data.db")
}

/// Durable store backed by a single SQLite file.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_path` and applies the schema.
    pub async fn open(db_path: &Path) -> Result<Self, SqliteInitError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SqliteInitError::Io(e.to_string()))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| SqliteInitError::Config(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        tracing::info!(path = %db_path.display(), "sqlite store ready");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    let version: Option<String> =
        sqlx::query_scalar(r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#)
            .fetch_optional(pool)
            .await
            .unwrap_or(None);

    if version.as_deref() == Some(SCHEMA_VERSION) {
        return Ok(());
    }

    for stmt in split_sql_statements(SQLITE_SCHEMA_SQL) {
        sqlx::query(&stmt).execute(pool).await?;
    }

    sqlx::query(r#"INSERT OR REPLACE INTO "_db_metadata" ("key", "value") VALUES ('schema_version', ?)"#)
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    tracing::info!(version = SCHEMA_VERSION, "sqlite schema applied");
    Ok(())
}

fn to_u32(value: i64, column: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

fn map_word(row: &SqliteRow) -> StoreResult<Word> {
    Ok(Word {
        id: row.try_get("id")?,
        list_id: row.try_get("listId")?,
        text: row.try_get("text")?,
        explanation: row.try_get("explanation")?,
        source_word_id: row.try_get("sourceWordId")?,
    })
}

fn map_word_list(row: &SqliteRow) -> StoreResult<WordList> {
    let difficulty: String = row.try_get("difficulty")?;
    Ok(WordList {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        difficulty: Difficulty::parse_or_default(&difficulty),
    })
}

fn map_mastery(row: &SqliteRow) -> StoreResult<MasteryRecord> {
    Ok(MasteryRecord {
        word_id: row.try_get("wordId")?,
        user_id: row.try_get("userId")?,
        mistake_count: to_u32(row.try_get("mistakeCount")?, "mistakeCount")?,
        correct_streak: to_u32(row.try_get("correctStreak")?, "correctStreak")?,
        last_practiced_at: row.try_get::<DateTime<Utc>, _>("lastPracticedAt")?,
    })
}

fn map_session(row: &SqliteRow) -> StoreResult<PracticeSession> {
    Ok(PracticeSession {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        word_list_id: row.try_get("wordListId")?,
        start_time: row.try_get::<DateTime<Utc>, _>("startTime")?,
        end_time: row.try_get::<Option<DateTime<Utc>>, _>("endTime")?,
        total_words: to_u32(row.try_get("totalWords")?, "totalWords")?,
        correct_count: to_u32(row.try_get("correctCount")?, "correctCount")?,
        points_earned: to_u32(row.try_get("pointsEarned")?, "pointsEarned")?,
    })
}

fn map_attempt(row: &SqliteRow) -> StoreResult<Attempt> {
    Ok(Attempt {
        id: row.try_get("id")?,
        session_id: row.try_get("sessionId")?,
        word_id: row.try_get("wordId")?,
        input_text: row.try_get("inputText")?,
        is_correct: row.try_get("isCorrect")?,
        created_at: row.try_get::<DateTime<Utc>, _>("createdAt")?,
    })
}

fn map_point_entry(row: &SqliteRow) -> StoreResult<PointEntry> {
    let activity: String = row.try_get("activity")?;
    Ok(PointEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        activity: PointActivity::parse(&activity)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown activity {activity}")))?,
        amount: to_u32(row.try_get("amount")?, "amount")?,
        created_at: row.try_get::<DateTime<Utc>, _>("createdAt")?,
    })
}

fn expect_affected(rows: u64, kind: &str, key: &str) -> StoreResult<()> {
    if rows == 0 {
        return Err(StoreError::NotFound(format!("{kind} {key}")));
    }
    Ok(())
}

fn conflict_or_sql(err: sqlx::Error, kind: &str, key: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{kind} {key}"))
        }
        _ => StoreError::Sql(err),
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_word(&self, id: &str) -> StoreResult<Option<Word>> {
        let row = sqlx::query(
            r#"SELECT "id","listId","text","explanation","sourceWordId" FROM "words" WHERE "id" = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_word).transpose()
    }

    async fn list_words(&self, list_id: &str) -> StoreResult<Vec<Word>> {
        let rows = sqlx::query(
            r#"SELECT "id","listId","text","explanation","sourceWordId" FROM "words"
               WHERE "listId" = ? ORDER BY "seq""#,
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_word).collect()
    }

    async fn insert_word(&self, word: &Word) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO "words" ("id","listId","text","explanation","sourceWordId")
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&word.id)
        .bind(&word.list_id)
        .bind(&word.text)
        .bind(&word.explanation)
        .bind(&word.source_word_id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_sql(e, "word", &word.id))?;
        Ok(())
    }

    async fn update_word(&self, word: &Word) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE "words" SET "listId" = ?, "text" = ?, "explanation" = ?, "sourceWordId" = ?
               WHERE "id" = ?"#,
        )
        .bind(&word.list_id)
        .bind(&word.text)
        .bind(&word.explanation)
        .bind(&word.source_word_id)
        .bind(&word.id)
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "word", &word.id)
    }

    async fn delete_word(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM "words" WHERE "id" = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "word", id)
    }

    async fn get_word_list(&self, id: &str) -> StoreResult<Option<WordList>> {
        let row = sqlx::query(
            r#"SELECT "id","userId","name","description","difficulty" FROM "word_lists" WHERE "id" = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_word_list).transpose()
    }

    async fn list_word_lists(&self, user_id: &str) -> StoreResult<Vec<WordList>> {
        let rows = sqlx::query(
            r#"SELECT "id","userId","name","description","difficulty" FROM "word_lists"
               WHERE "userId" = ? ORDER BY "seq""#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_word_list).collect()
    }

    async fn find_word_list_by_name(&self, user_id: &str, name: &str) -> StoreResult<Option<WordList>> {
        let row = sqlx::query(
            r#"SELECT "id","userId","name","description","difficulty" FROM "word_lists"
               WHERE "userId" = ? AND "name" = ? ORDER BY "seq" LIMIT 1"#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_word_list).transpose()
    }

    async fn insert_word_list(&self, list: &WordList) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO "word_lists" ("id","userId","name","description","difficulty")
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&list.id)
        .bind(&list.user_id)
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.difficulty.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_sql(e, "word list", &list.id))?;
        Ok(())
    }

    async fn update_word_list(&self, list: &WordList) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE "word_lists" SET "name" = ?, "description" = ?, "difficulty" = ? WHERE "id" = ?"#,
        )
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.difficulty.as_str())
        .bind(&list.id)
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "word list", &list.id)
    }

    async fn delete_word_list(&self, id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(r#"DELETE FROM "word_lists" WHERE "id" = ?"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        expect_affected(result.rows_affected(), "word list", id)?;
        sqlx::query(r#"DELETE FROM "words" WHERE "listId" = ?"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<Option<MasteryRecord>> {
        let row = sqlx::query(
            r#"SELECT "userId","wordId","mistakeCount","correctStreak","lastPracticedAt"
               FROM "mastery_records" WHERE "userId" = ? AND "wordId" = ?"#,
        )
        .bind(user_id)
        .bind(word_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_mastery).transpose()
    }

    async fn list_mastery(&self, user_id: &str) -> StoreResult<Vec<MasteryRecord>> {
        let rows = sqlx::query(
            r#"SELECT "userId","wordId","mistakeCount","correctStreak","lastPracticedAt"
               FROM "mastery_records" WHERE "userId" = ? ORDER BY rowid"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_mastery).collect()
    }

    async fn insert_mastery(&self, record: &MasteryRecord) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO "mastery_records" ("userId","wordId","mistakeCount","correctStreak","lastPracticedAt")
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&record.user_id)
        .bind(&record.word_id)
        .bind(i64::from(record.mistake_count))
        .bind(i64::from(record.correct_streak))
        .bind(record.last_practiced_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_sql(e, "mastery", &format!("{}/{}", record.user_id, record.word_id)))?;
        Ok(())
    }

    async fn update_mastery(&self, record: &MasteryRecord) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE "mastery_records" SET "mistakeCount" = ?, "correctStreak" = ?, "lastPracticedAt" = ?
               WHERE "userId" = ? AND "wordId" = ?"#,
        )
        .bind(i64::from(record.mistake_count))
        .bind(i64::from(record.correct_streak))
        .bind(record.last_practiced_at)
        .bind(&record.user_id)
        .bind(&record.word_id)
        .execute(&self.pool)
        .await?;
        expect_affected(
            result.rows_affected(),
            "mastery",
            &format!("{}/{}", record.user_id, record.word_id),
        )
    }

    async fn delete_mastery(&self, user_id: &str, word_id: &str) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM "mastery_records" WHERE "userId" = ? AND "wordId" = ?"#)
            .bind(user_id)
            .bind(word_id)
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "mastery", &format!("{user_id}/{word_id}"))
    }

    async fn get_session(&self, id: &str) -> StoreResult<Option<PracticeSession>> {
        let row = sqlx::query(
            r#"SELECT "id","userId","wordListId","startTime","endTime","totalWords","correctCount","pointsEarned"
               FROM "practice_sessions" WHERE "id" = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_session).transpose()
    }

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<PracticeSession>> {
        let rows = sqlx::query(
            r#"SELECT "id","userId","wordListId","startTime","endTime","totalWords","correctCount","pointsEarned"
               FROM "practice_sessions" WHERE "userId" = ? ORDER BY "seq""#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_session).collect()
    }

    async fn insert_session(&self, session: &PracticeSession) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO "practice_sessions"
               ("id","userId","wordListId","startTime","endTime","totalWords","correctCount","pointsEarned")
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.word_list_id)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(i64::from(session.total_words))
        .bind(i64::from(session.correct_count))
        .bind(i64::from(session.points_earned))
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_sql(e, "session", &session.id))?;
        Ok(())
    }

    async fn update_session(&self, session: &PracticeSession) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE "practice_sessions"
               SET "endTime" = ?, "totalWords" = ?, "correctCount" = ?, "pointsEarned" = ?
               WHERE "id" = ?"#,
        )
        .bind(session.end_time)
        .bind(i64::from(session.total_words))
        .bind(i64::from(session.correct_count))
        .bind(i64::from(session.points_earned))
        .bind(&session.id)
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "session", &session.id)
    }

    async fn delete_session(&self, id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(r#"DELETE FROM "practice_sessions" WHERE "id" = ?"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        expect_affected(result.rows_affected(), "session", id)?;
        sqlx::query(r#"DELETE FROM "attempts" WHERE "sessionId" = ?"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO "attempts" ("id","sessionId","wordId","inputText","isCorrect","createdAt")
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&attempt.id)
        .bind(&attempt.session_id)
        .bind(&attempt.word_id)
        .bind(&attempt.input_text)
        .bind(attempt.is_correct)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_sql(e, "attempt", &attempt.id))?;
        Ok(())
    }

    async fn list_attempts(&self, session_id: &str) -> StoreResult<Vec<Attempt>> {
        let rows = sqlx::query(
            r#"SELECT "id","sessionId","wordId","inputText","isCorrect","createdAt"
               FROM "attempts" WHERE "sessionId" = ? ORDER BY "seq""#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_attempt).collect()
    }

    async fn insert_point_entry(&self, entry: &PointEntry) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO "point_entries" ("id","userId","activity","amount","createdAt")
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.activity.as_str())
        .bind(i64::from(entry.amount))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_sql(e, "point entry", &entry.id))?;
        Ok(())
    }

    async fn list_point_entries(&self, user_id: &str) -> StoreResult<Vec<PointEntry>> {
        let rows = sqlx::query(
            r#"SELECT "id","userId","activity","amount","createdAt"
               FROM "point_entries" WHERE "userId" = ? ORDER BY "seq""#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_point_entry).collect()
    }

    async fn delete_point_entries(&self, user_id: &str) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM "point_entries" WHERE "userId" = ?"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_settings(&self, user_id: &str) -> StoreResult<Option<PointSettings>> {
        let row = sqlx::query(
            r#"SELECT "correctWordPoints","perfectListPoints","streakPoints"
               FROM "point_settings" WHERE "userId" = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| -> StoreResult<PointSettings> {
            Ok(PointSettings {
                correct_word_points: to_u32(row.try_get("correctWordPoints")?, "correctWordPoints")?,
                perfect_list_points: to_u32(row.try_get("perfectListPoints")?, "perfectListPoints")?,
                streak_points: to_u32(row.try_get("streakPoints")?, "streakPoints")?,
            })
        })
        .transpose()
    }

    async fn upsert_settings(&self, user_id: &str, settings: &PointSettings) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO "point_settings" ("userId","correctWordPoints","perfectListPoints","streakPoints")
               VALUES (?, ?, ?, ?)
               ON CONFLICT ("userId") DO UPDATE SET
                 "correctWordPoints" = excluded."correctWordPoints",
                 "perfectListPoints" = excluded."perfectListPoints",
                 "streakPoints" = excluded."streakPoints""#,
        )
        .bind(user_id)
        .bind(i64::from(settings.correct_word_points))
        .bind(i64::from(settings.perfect_list_points))
        .bind(i64::from(settings.streak_points))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
