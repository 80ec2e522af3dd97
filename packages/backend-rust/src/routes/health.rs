use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    version: &'static str,
    start_time: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    database: &'static str,
    database_latency_ms: Option<u64>,
}

async fn root(State(state): State<AppState>) -> Response {
    let latency = state.db().ping().await;
    let ok = latency.is_ok();

    let response = HealthResponse {
        status: if ok { "ok" } else { "degraded" },
        database: if ok { "connected" } else { "disconnected" },
        timestamp: now_iso(),
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    let start_time: DateTime<Utc> = state.started_at_system().into();
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
        start_time: start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
    .into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let (status, database, database_latency_ms) = match state.db().ping().await {
        Ok(latency) => ("healthy", "connected", Some(latency.as_millis() as u64)),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            ("unhealthy", "disconnected", None)
        }
    };

    let status_code = if database_latency_ms.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = ReadinessResponse {
        status,
        timestamp: now_iso(),
        database,
        database_latency_ms,
    };
    (status_code, Json(response)).into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
