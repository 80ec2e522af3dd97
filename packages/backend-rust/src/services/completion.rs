//! Batch completion
//!
//! Applies a finished session in one transaction: progress rows, the session
//! row and its answer records are written together or not at all.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use danci_review_algo::{
    reconcile_with, settle, summarize, BatchCompletionRequest, BatchCompletionResponse,
    EngineConfig, MissingProgress, ProgressSnapshot, SessionAnswer, WordProgress,
};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db::{format_timestamp, Database};
use crate::services::word_progress::{load_progress, upsert_progress, word_labels, ProgressError};

pub const MAX_BATCH_SIZE: usize = 500;

pub fn validate_batch(req: &BatchCompletionRequest) -> Result<(), ProgressError> {
    if req.answers.is_empty() {
        return Err(ProgressError::Validation("answers must not be empty".to_string()));
    }
    if req.answers.len() > MAX_BATCH_SIZE {
        return Err(ProgressError::Validation(format!(
            "at most {MAX_BATCH_SIZE} answers per batch"
        )));
    }
    if req.words_studied < 0 {
        return Err(ProgressError::Validation(
            "wordsStudied must not be negative".to_string(),
        ));
    }
    if req.answers.iter().any(|a| a.word_id.trim().is_empty()) {
        return Err(ProgressError::Validation("wordId must not be empty".to_string()));
    }
    Ok(())
}

/// Validate and commit a completed session within `timeout`. A timed-out
/// transaction is dropped, which rolls it back.
pub async fn complete_session(
    db: &Database,
    engine: &EngineConfig,
    user_id: &str,
    req: &BatchCompletionRequest,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Result<BatchCompletionResponse, ProgressError> {
    validate_batch(req)?;

    match tokio::time::timeout(timeout, apply_batch(db, engine, user_id, req, now)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(user_id, ?timeout, "batch completion timed out, rolled back");
            Err(ProgressError::Timeout(timeout))
        }
    }
}

async fn apply_batch(
    db: &Database,
    engine: &EngineConfig,
    user_id: &str,
    req: &BatchCompletionRequest,
    now: DateTime<Utc>,
) -> Result<BatchCompletionResponse, ProgressError> {
    let word_ids = distinct_word_ids(&req.answers);
    let mut tx = db.pool().begin().await?;

    let labels = word_labels(&mut *tx, &word_ids).await?;
    let unknown: Vec<String> = word_ids
        .iter()
        .filter(|id| !labels.contains_key(*id))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ProgressError::UnknownWords(unknown));
    }

    let mut stored = load_progress(&mut *tx, user_id, &word_ids).await?;
    let initial: HashMap<String, ProgressSnapshot> = stored
        .iter()
        .map(|(id, progress)| (id.clone(), progress.snapshot()))
        .collect();

    let run = reconcile_with(&engine.mastery, &initial, &req.answers, MissingProgress::StartFresh);

    let session_id = Uuid::new_v4().to_string();
    insert_session(&mut *tx, &session_id, user_id, req, now).await?;

    for word_id in &word_ids {
        let Some(snapshot) = run.progress.get(word_id) else {
            continue;
        };
        let mut progress = stored
            .remove(word_id)
            .unwrap_or_else(|| WordProgress::new(word_id.clone(), now));
        settle(&engine.interval, &mut progress, snapshot, now);
        upsert_progress(&mut *tx, user_id, &progress, now).await?;
    }

    tx.commit().await?;

    let status_changes = summarize(&run.outcomes, &labels);
    let counts = status_changes.counts();
    tracing::info!(
        user_id,
        %session_id,
        answers = req.answers.len(),
        words = word_ids.len(),
        upgrades = counts.upgrades,
        downgrades = counts.downgrades,
        "session committed"
    );

    Ok(BatchCompletionResponse {
        session_id,
        completed_at: now,
        status_changes,
    })
}

async fn insert_session(
    conn: &mut SqliteConnection,
    session_id: &str,
    user_id: &str,
    req: &BatchCompletionRequest,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "learning_sessions" ("id","userId","wordsStudied","completedAt") VALUES (?,?,?,?)"#,
    )
    .bind(session_id)
    .bind(user_id)
    .bind(req.words_studied)
    .bind(format_timestamp(now))
    .execute(&mut *conn)
    .await?;

    for (position, answer) in req.answers.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO "answer_records"
              ("id","sessionId","userId","wordId","isCorrect","responseTime","mode","position")
            VALUES (?,?,?,?,?,?,?,?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(user_id)
        .bind(&answer.word_id)
        .bind(answer.is_correct)
        .bind(i64::try_from(answer.response_time).unwrap_or(i64::MAX))
        .bind(answer.mode.as_str())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Answered word ids in first-appearance order
fn distinct_word_ids(answers: &[SessionAnswer]) -> Vec<String> {
    let mut seen = HashSet::new();
    answers
        .iter()
        .filter(|a| seen.insert(a.word_id.as_str()))
        .map(|a| a.word_id.clone())
        .collect()
}
