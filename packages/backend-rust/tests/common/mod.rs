#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use danci_review_algo::EngineConfig;
use danci_review_backend::auth::hash_token;
use danci_review_backend::config::Config;
use danci_review_backend::db::{format_timestamp, Database};
use danci_review_backend::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

pub const USER_ID: &str = "u1";
pub const TOKEN: &str = "token-u1";
pub const OTHER_USER_ID: &str = "u2";
pub const OTHER_TOKEN: &str = "token-u2";
pub const EXPIRED_TOKEN: &str = "token-expired";
pub const WORD_COUNT: usize = 12;

pub struct TestEnv {
    _dir: TempDir,
    pub db: Database,
    pub engine: EngineConfig,
}

impl TestEnv {
    /// Fresh SQLite file with the schema applied and a seeded catalogue
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("review.db").display());
        let db = Database::connect(&url).await.expect("failed to connect");
        db.migrate().await.expect("migration failed");

        let env = Self {
            _dir: dir,
            db,
            engine: EngineConfig::default(),
        };
        env.seed().await;
        env
    }

    async fn seed(&self) {
        let pool = self.db.pool();
        let base = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();

        for i in 1..=WORD_COUNT {
            sqlx::query(
                r#"INSERT INTO "words" ("id","english","japanese","createdAt") VALUES (?,?,?,?)"#,
            )
            .bind(word_id(i))
            .bind(format!("english-{i}"))
            .bind(format!("japanese-{i}"))
            .bind(format_timestamp(base + Duration::hours(i as i64)))
            .execute(pool)
            .await
            .expect("seed word");
        }

        let tokens = [
            (TOKEN, USER_ID, None),
            (OTHER_TOKEN, OTHER_USER_ID, None),
            (
                EXPIRED_TOKEN,
                USER_ID,
                Some(format_timestamp(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())),
            ),
        ];
        for (token, user, expires_at) in tokens {
            sqlx::query(
                r#"INSERT INTO "user_tokens" ("tokenHash","userId","expiresAt") VALUES (?,?,?)"#,
            )
            .bind(hash_token(token))
            .bind(user)
            .bind(expires_at)
            .execute(pool)
            .await
            .expect("seed token");
        }
    }

    pub fn app(&self) -> Router {
        let config = Config::default();
        danci_review_backend::create_app(AppState::new(
            self.db.clone(),
            self.engine.clone(),
            config,
        ))
    }

    /// Write a progress row directly, bypassing the engine
    pub async fn put_progress(
        &self,
        user_id: &str,
        word: &str,
        counters: (u32, u32, u32),
        status: &str,
        recommended: DateTime<Utc>,
    ) {
        let now = format_timestamp(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO "word_progress"
              ("userId","wordId","totalReviews","correctAnswers","streak","status",
               "lastReviewedAt","recommendedReviewDate","createdAt","updatedAt")
            VALUES (?,?,?,?,?,?,?,?,?,?)
            "#,
        )
        .bind(user_id)
        .bind(word)
        .bind(i64::from(counters.0))
        .bind(i64::from(counters.1))
        .bind(i64::from(counters.2))
        .bind(status)
        .bind(&now)
        .bind(format_timestamp(recommended))
        .bind(&now)
        .bind(&now)
        .execute(self.db.pool())
        .await
        .expect("seed progress");
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!(r#"SELECT COUNT(*) FROM "{table}""#))
            .fetch_one(self.db.pool())
            .await
            .expect("count rows")
    }
}

pub fn word_id(i: usize) -> String {
    format!("w{i:02}")
}

pub async fn send(app: Router, request: Request<Body>) -> (axum::http::StatusCode, serde_json::Value) {
    let response: Response<Body> = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
