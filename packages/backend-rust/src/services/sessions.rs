use chrono::{DateTime, Utc};
use danci_review_algo::{EngineConfig, SessionComposer, SessionDelivery};

use crate::db::Database;
use crate::services::word_progress::{fetch_candidates, ProgressError};

/// Compose the learner's next session. Without a pattern name one of the
/// configured patterns is picked at random.
pub async fn next_session(
    db: &Database,
    engine: &EngineConfig,
    composer: &mut SessionComposer,
    user_id: &str,
    pattern_name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SessionDelivery, ProgressError> {
    let pattern = match pattern_name {
        Some(name) => engine.session.pattern(name)?.clone(),
        None => composer.choose_pattern()?,
    };

    let queries = composer.candidate_queries(&pattern);
    let pools = fetch_candidates(db.pool(), user_id, &queries, now).await?;
    let cards = composer.build_session(&pattern, pools, now);

    tracing::info!(
        user_id,
        pattern = %pattern.name,
        session_size = pattern.total(),
        delivered = cards.len(),
        "session composed"
    );

    Ok(SessionDelivery {
        session_size: pattern.total(),
        pattern: pattern.name,
        cards,
    })
}
