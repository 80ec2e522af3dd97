use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::services::word_progress;
use crate::services::ProgressError;
use crate::state::AppState;

const DEFAULT_DUE_LIMIT: usize = 20;
const MAX_DUE_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    limit: Option<usize>,
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let stats = word_progress::get_status_stats(state.db().pool(), &user.id, Utc::now())
        .await
        .map_err(ProgressError::from)?;
    Ok(ok(stats).into_response())
}

pub async fn due(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DueQuery>,
) -> Result<Response, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_DUE_LIMIT).clamp(1, MAX_DUE_LIMIT);
    let cards = word_progress::list_due(state.db().pool(), &user.id, Utc::now(), limit)
        .await
        .map_err(ProgressError::from)?;
    Ok(ok(cards).into_response())
}
