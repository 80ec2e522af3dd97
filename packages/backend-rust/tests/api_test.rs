use std::collections::HashSet;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

mod common;

use common::{get, post_json, send, word_id, TestEnv, EXPIRED_TOKEN, OTHER_TOKEN, TOKEN};

// ==================== Health ====================

#[tokio::test]
async fn test_health_endpoints() {
    let env = TestEnv::new().await;

    for uri in ["/health", "/health/live", "/health/ready"] {
        let (status, body) = send(env.app(), get(uri, None)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.get("status").is_some(), "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let env = TestEnv::new().await;
    let (status, body) = send(env.app(), get("/api/nope", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ==================== Auth ====================

#[tokio::test]
async fn test_unauthorized_without_token() {
    let env = TestEnv::new().await;
    let (status, body) = send(env.app(), get("/api/sessions/next", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unauthorized_with_unknown_or_expired_token() {
    let env = TestEnv::new().await;
    for token in ["nope", EXPIRED_TOKEN] {
        let (status, _) = send(env.app(), get("/api/word-progress/stats", Some(token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{token}");
    }
}

// ==================== Sessions ====================

#[tokio::test]
async fn test_next_session_with_named_pattern() {
    let env = TestEnv::new().await;
    let (status, body) = send(env.app(), get("/api/sessions/next?pattern=new-focus", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["pattern"], "new-focus");
    assert_eq!(data["sessionSize"], 10);

    let cards = data["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 10);

    let ids: HashSet<&str> = cards.iter().map(|c| c["word"]["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 10);
    for card in cards {
        assert_eq!(card["progress"]["status"], "new");
        assert_eq!(card["progress"]["totalReviews"], 0);
        assert!(card["word"]["english"].as_str().unwrap().starts_with("english-"));
    }
}

#[tokio::test]
async fn test_next_session_random_pattern_is_short_when_catalogue_is_small() {
    let env = TestEnv::new().await;
    let (status, body) = send(env.app(), get("/api/sessions/next", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    let size = data["sessionSize"].as_u64().unwrap() as usize;
    let delivered = data["cards"].as_array().unwrap().len();
    assert_eq!(size, 10);
    assert!(delivered <= size);
    assert!(delivered > 0);
}

#[tokio::test]
async fn test_next_session_unknown_pattern() {
    let env = TestEnv::new().await;
    let (status, body) = send(env.app(), get("/api/sessions/next?pattern=cram", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_next_session_prefers_due_learning_words() {
    let env = TestEnv::new().await;
    let now = Utc::now();
    for i in 1..=3 {
        env.put_progress(common::USER_ID, &word_id(i), (2, 1, 1), "learning", now - Duration::days(i as i64))
            .await;
    }

    let (status, body) = send(env.app(), get("/api/sessions/next?pattern=balanced", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);

    let cards = body["data"]["cards"].as_array().unwrap();
    let learning = cards
        .iter()
        .filter(|c| c["progress"]["status"] == "learning")
        .count();
    assert_eq!(learning, 3);
}

// ==================== Completion ====================

#[tokio::test]
async fn test_complete_session_reports_status_changes() {
    let env = TestEnv::new().await;
    let body = json!({
        "wordsStudied": 2,
        "answers": [
            {"wordId": word_id(1), "isCorrect": true, "responseTime": 1200, "mode": "english_to_japanese"},
            {"wordId": word_id(2), "isCorrect": false, "responseTime": 3100},
            {"wordId": word_id(1), "isCorrect": true, "responseTime": 800, "mode": "spelling"}
        ]
    });

    let (status, response) = send(env.app(), post_json("/api/sessions/complete", Some(TOKEN), body)).await;
    assert_eq!(status, StatusCode::OK, "{response}");

    let data = &response["data"];
    assert!(data["sessionId"].as_str().is_some());
    assert!(data["completedAt"].as_str().is_some());

    let upgrades = data["statusChanges"]["upgrades"].as_array().unwrap();
    assert_eq!(upgrades.len(), 2);
    assert_eq!(upgrades[0]["wordId"], word_id(1));
    assert_eq!(upgrades[0]["english"], "english-1");
    assert_eq!(upgrades[0]["from"], "new");
    assert_eq!(upgrades[0]["to"], "learning");
    assert_eq!(upgrades[0]["isUpgrade"], true);
    assert!(data["statusChanges"]["downgrades"].as_array().unwrap().is_empty());

    assert_eq!(env.count("learning_sessions").await, 1);
    assert_eq!(env.count("answer_records").await, 3);

    let (_, stats) = send(env.app(), get("/api/word-progress/stats", Some(TOKEN))).await;
    assert_eq!(stats["data"]["totalWords"], 12);
    assert_eq!(stats["data"]["learningWords"], 2);
    assert_eq!(stats["data"]["newWords"], 10);
    assert_eq!(stats["data"]["dueWords"], 0);
}

#[tokio::test]
async fn test_progress_is_partitioned_by_user() {
    let env = TestEnv::new().await;
    let body = json!({
        "wordsStudied": 1,
        "answers": [{"wordId": word_id(1), "isCorrect": true, "responseTime": 900}]
    });
    let (status, _) = send(env.app(), post_json("/api/sessions/complete", Some(TOKEN), body)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(env.app(), get("/api/word-progress/stats", Some(OTHER_TOKEN))).await;
    assert_eq!(stats["data"]["learningWords"], 0);
    assert_eq!(stats["data"]["newWords"], 12);
}

#[tokio::test]
async fn test_complete_rejects_unknown_words_without_writes() {
    let env = TestEnv::new().await;
    let body = json!({
        "wordsStudied": 2,
        "answers": [
            {"wordId": word_id(1), "isCorrect": true, "responseTime": 900},
            {"wordId": "ghost", "isCorrect": true, "responseTime": 900}
        ]
    });

    let (status, response) = send(env.app(), post_json("/api/sessions/complete", Some(TOKEN), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "UNKNOWN_WORDS");
    assert_eq!(env.count("word_progress").await, 0);
    assert_eq!(env.count("learning_sessions").await, 0);
    assert_eq!(env.count("answer_records").await, 0);
}

#[tokio::test]
async fn test_complete_validation_errors() {
    let env = TestEnv::new().await;
    let cases = [
        json!({"wordsStudied": 0, "answers": []}),
        json!({"wordsStudied": -1, "answers": [{"wordId": word_id(1), "isCorrect": true, "responseTime": 1}]}),
        json!({"wordsStudied": 1, "answers": [{"wordId": "", "isCorrect": true, "responseTime": 1}]}),
        json!({"wordsStudied": 1, "answers": [{"wordId": word_id(1)}]}),
    ];

    for body in cases {
        let (status, response) =
            send(env.app(), post_json("/api/sessions/complete", Some(TOKEN), body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response["code"], "VALIDATION_ERROR", "{body}");
    }
}

#[tokio::test]
async fn test_complete_rejects_oversized_batch() {
    let env = TestEnv::new().await;
    let answers: Vec<_> = (0..501)
        .map(|i| json!({"wordId": word_id(i % 12 + 1), "isCorrect": true, "responseTime": 500}))
        .collect();
    let body = json!({"wordsStudied": 12, "answers": answers});

    let (status, response) = send(env.app(), post_json("/api/sessions/complete", Some(TOKEN), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "VALIDATION_ERROR");
}

// ==================== Word Progress ====================

#[tokio::test]
async fn test_due_lists_overdue_words_soonest_first() {
    let env = TestEnv::new().await;
    let now = Utc::now();
    env.put_progress(common::USER_ID, &word_id(4), (6, 5, 3), "mastered", now - Duration::days(1))
        .await;
    env.put_progress(common::USER_ID, &word_id(3), (5, 3, 1), "reviewing", now - Duration::days(5))
        .await;
    env.put_progress(common::USER_ID, &word_id(5), (5, 3, 1), "reviewing", now + Duration::days(5))
        .await;

    let (status, body) = send(env.app(), get("/api/word-progress/due?limit=10", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["word"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![word_id(3), word_id(4)]);

    let (_, stats) = send(env.app(), get("/api/word-progress/stats", Some(TOKEN))).await;
    assert_eq!(stats["data"]["dueWords"], 2);
    assert_eq!(stats["data"]["reviewingWords"], 2);
    assert_eq!(stats["data"]["masteredWords"], 1);
}
