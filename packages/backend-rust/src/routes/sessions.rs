use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use danci_review_algo::{BatchCompletionRequest, SessionComposer};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::services::{completion, sessions};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NextSessionQuery {
    pattern: Option<String>,
}

pub async fn next(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<NextSessionQuery>,
) -> Result<Response, AppError> {
    let pattern = query.pattern.as_deref().filter(|p| !p.trim().is_empty());
    let mut composer = SessionComposer::new(state.engine());

    let delivery = sessions::next_session(
        state.db(),
        state.engine(),
        &mut composer,
        &user.id,
        pattern,
        Utc::now(),
    )
    .await?;

    Ok(ok(delivery).into_response())
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<BatchCompletionRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|err| AppError::validation(err.body_text()))?;

    let response = completion::complete_session(
        state.db(),
        state.engine(),
        &user.id,
        &request,
        Utc::now(),
        state.config().commit_timeout,
    )
    .await?;

    Ok(ok(response).into_response())
}
