//! Word progress storage
//!
//! Candidate pools for the session composer, per-word progress rows, catalogue
//! lookups and per-learner statistics. Every query is scoped by `userId`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use danci_review_algo::{
    CandidatePools, CandidateQuery, ConfigError, MasteryStatus, OrderBy, StudyCard, WordCard,
    WordLabel, WordProgress,
};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::db::{format_timestamp, parse_timestamp};

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unknown words: {}", .0.join(", "))]
    UnknownWords(Vec<String>),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("transaction timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordProgressStats {
    pub total_words: i64,
    pub new_words: i64,
    pub learning_words: i64,
    pub reviewing_words: i64,
    pub mastered_words: i64,
    pub due_words: i64,
}

const CARD_COLUMNS: &str = r#"w."id", w."english", w."japanese",
    p."totalReviews", p."correctAnswers", p."streak", p."status",
    p."lastReviewedAt", p."recommendedReviewDate""#;

// ==================== Candidates ====================

/// Run the composer's candidate queries. `new` also covers catalogue words the
/// learner has never seen; those come back with a default progress record.
pub async fn fetch_candidates(
    pool: &SqlitePool,
    user_id: &str,
    queries: &[CandidateQuery],
    now: DateTime<Utc>,
) -> Result<CandidatePools<StudyCard>, sqlx::Error> {
    let mut pools = CandidatePools::default();

    for query in queries {
        if query.count == 0 {
            continue;
        }
        let limit = i64::try_from(query.count).unwrap_or(i64::MAX);

        let rows = match query.status {
            MasteryStatus::New => {
                let sql = format!(
                    r#"SELECT {CARD_COLUMNS}
                    FROM "words" w
                    LEFT JOIN "word_progress" p ON p."wordId" = w."id" AND p."userId" = ?
                    WHERE p."wordId" IS NULL OR p."status" = 'new'
                    ORDER BY w."createdAt" DESC, w."id" ASC
                    LIMIT ?"#
                );
                sqlx::query(&sql)
                    .bind(user_id)
                    .bind(limit)
                    .fetch_all(pool)
                    .await?
            }
            status => {
                debug_assert_eq!(query.order_by, OrderBy::RecommendedReviewDateAsc);
                let sql = format!(
                    r#"SELECT {CARD_COLUMNS}
                    FROM "word_progress" p
                    JOIN "words" w ON w."id" = p."wordId"
                    WHERE p."userId" = ? AND p."status" = ?
                    ORDER BY p."recommendedReviewDate" ASC, w."id" ASC
                    LIMIT ?"#
                );
                sqlx::query(&sql)
                    .bind(user_id)
                    .bind(status.as_str())
                    .bind(limit)
                    .fetch_all(pool)
                    .await?
            }
        };

        let target = pools.pool_mut(query.status);
        for row in &rows {
            target.push(map_card_row(row, now)?);
        }
    }

    tracing::debug!(
        user_id,
        new = pools.new.len(),
        learning = pools.learning.len(),
        reviewing = pools.reviewing.len(),
        mastered = pools.mastered.len(),
        "candidate pools fetched"
    );
    Ok(pools)
}

// ==================== Progress Rows ====================

/// Stored progress for the given words; words without a row are absent
pub async fn load_progress(
    conn: &mut SqliteConnection,
    user_id: &str,
    word_ids: &[String],
) -> Result<HashMap<String, WordProgress>, sqlx::Error> {
    if word_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"SELECT "wordId", "totalReviews", "correctAnswers", "streak", "status",
          "lastReviewedAt", "recommendedReviewDate"
        FROM "word_progress"
        WHERE "userId" = "#,
    );
    qb.push_bind(user_id);
    qb.push(r#" AND "wordId" IN ("#);
    {
        let mut sep = qb.separated(", ");
        for id in word_ids {
            sep.push_bind(id);
        }
    }
    qb.push(")");

    let rows = qb.build().fetch_all(&mut *conn).await?;
    let mut out = HashMap::with_capacity(rows.len());
    for row in &rows {
        let word_id: String = row.try_get("wordId")?;
        let progress = map_progress(row, word_id.clone())?;
        out.insert(word_id, progress);
    }
    Ok(out)
}

pub async fn upsert_progress(
    conn: &mut SqliteConnection,
    user_id: &str,
    progress: &WordProgress,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let now = format_timestamp(now);
    sqlx::query(
        r#"
        INSERT INTO "word_progress"
          ("userId","wordId","totalReviews","correctAnswers","streak","status",
           "lastReviewedAt","recommendedReviewDate","createdAt","updatedAt")
        VALUES (?,?,?,?,?,?,?,?,?,?)
        ON CONFLICT ("userId","wordId") DO UPDATE SET
          "totalReviews" = excluded."totalReviews",
          "correctAnswers" = excluded."correctAnswers",
          "streak" = excluded."streak",
          "status" = excluded."status",
          "lastReviewedAt" = excluded."lastReviewedAt",
          "recommendedReviewDate" = excluded."recommendedReviewDate",
          "updatedAt" = excluded."updatedAt"
        "#,
    )
    .bind(user_id)
    .bind(&progress.word_id)
    .bind(i64::from(progress.total_reviews))
    .bind(i64::from(progress.correct_answers))
    .bind(i64::from(progress.streak))
    .bind(progress.status.as_str())
    .bind(progress.last_reviewed_at.map(format_timestamp))
    .bind(format_timestamp(progress.recommended_review_date))
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ==================== Catalogue ====================

/// Labels of the catalogue words among `word_ids`; unknown ids are absent
pub async fn word_labels(
    conn: &mut SqliteConnection,
    word_ids: &[String],
) -> Result<HashMap<String, WordLabel>, sqlx::Error> {
    if word_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb =
        QueryBuilder::<Sqlite>::new(r#"SELECT "id", "english", "japanese" FROM "words" WHERE "id" IN ("#);
    {
        let mut sep = qb.separated(", ");
        for id in word_ids {
            sep.push_bind(id);
        }
    }
    qb.push(")");

    let rows = qb.build().fetch_all(&mut *conn).await?;
    let mut out = HashMap::with_capacity(rows.len());
    for row in &rows {
        out.insert(
            row.try_get::<String, _>("id")?,
            WordLabel {
                english: row.try_get("english")?,
                japanese: row.try_get("japanese")?,
            },
        );
    }
    Ok(out)
}

// ==================== Statistics ====================

pub async fn get_status_stats(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<WordProgressStats, sqlx::Error> {
    let total_words: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(pool)
        .await?;

    let row = sqlx::query(
        r#"
        SELECT
          COALESCE(SUM(CASE WHEN "status" = 'learning' THEN 1 ELSE 0 END), 0) AS "learning",
          COALESCE(SUM(CASE WHEN "status" = 'reviewing' THEN 1 ELSE 0 END), 0) AS "reviewing",
          COALESCE(SUM(CASE WHEN "status" = 'mastered' THEN 1 ELSE 0 END), 0) AS "mastered",
          COALESCE(SUM(CASE WHEN "status" != 'new' AND "recommendedReviewDate" <= ? THEN 1 ELSE 0 END), 0) AS "due"
        FROM "word_progress"
        WHERE "userId" = ?
        "#,
    )
    .bind(format_timestamp(now))
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let learning_words: i64 = row.try_get("learning")?;
    let reviewing_words: i64 = row.try_get("reviewing")?;
    let mastered_words: i64 = row.try_get("mastered")?;

    Ok(WordProgressStats {
        total_words,
        new_words: (total_words - learning_words - reviewing_words - mastered_words).max(0),
        learning_words,
        reviewing_words,
        mastered_words,
        due_words: row.try_get("due")?,
    })
}

/// Reviewed words whose recommended date has passed, most overdue first
pub async fn list_due(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<StudyCard>, sqlx::Error> {
    let sql = format!(
        r#"SELECT {CARD_COLUMNS}
        FROM "word_progress" p
        JOIN "words" w ON w."id" = p."wordId"
        WHERE p."userId" = ? AND p."status" != 'new' AND p."recommendedReviewDate" <= ?
        ORDER BY p."recommendedReviewDate" ASC, w."id" ASC
        LIMIT ?"#
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(format_timestamp(now))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;

    rows.iter().map(|row| map_card_row(row, now)).collect()
}

// ==================== Row Mapping ====================

fn map_card_row(row: &SqliteRow, now: DateTime<Utc>) -> Result<StudyCard, sqlx::Error> {
    let word = WordCard {
        id: row.try_get("id")?,
        english: row.try_get("english")?,
        japanese: row.try_get("japanese")?,
    };

    let has_progress = row.try_get::<Option<String>, _>("status")?.is_some();
    let progress = if has_progress {
        map_progress(row, word.id.clone())?
    } else {
        WordProgress::new(word.id.clone(), now)
    };

    Ok(StudyCard { word, progress })
}

fn map_progress(row: &SqliteRow, word_id: String) -> Result<WordProgress, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<MasteryStatus>()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

    let last_reviewed_at = row
        .try_get::<Option<String>, _>("lastReviewedAt")?
        .map(|raw| decode_timestamp(&raw))
        .transpose()?;
    let recommended: String = row.try_get("recommendedReviewDate")?;

    Ok(WordProgress {
        word_id,
        total_reviews: decode_count(row, "totalReviews")?,
        correct_answers: decode_count(row, "correctAnswers")?,
        streak: decode_count(row, "streak")?,
        status,
        last_reviewed_at,
        recommended_review_date: decode_timestamp(&recommended)?,
    })
}

fn decode_count(row: &SqliteRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    parse_timestamp(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}
