//! Priority Scorer
//!
//! Urgency of reviewing a word now. Higher is more urgent. Only used to order
//! candidate pools, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{accuracy, WordProgress, SECONDS_PER_DAY};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriorityWeights {
    /// Weight per overdue day, the dominant term
    pub overdue_weight: f64,
    /// Flat bonus for a word answered wrong last time
    pub recent_failure_bonus: f64,
    /// Reviews needed before the recent-failure bonus applies
    pub recent_failure_min_reviews: u32,
    /// Reviews needed before accuracy penalties apply
    pub accuracy_min_reviews: u32,
    pub severe_accuracy: f64,
    pub severe_accuracy_bonus: f64,
    pub low_accuracy: f64,
    pub low_accuracy_bonus: f64,
    /// Weight per day since the last review
    pub recency_weight: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            overdue_weight: 10.0,
            recent_failure_bonus: 5.0,
            recent_failure_min_reviews: 2,
            accuracy_min_reviews: 4,
            severe_accuracy: 0.5,
            severe_accuracy_bonus: 4.0,
            low_accuracy: 0.7,
            low_accuracy_bonus: 2.0,
            recency_weight: 0.1,
        }
    }
}

impl PriorityWeights {
    pub fn score(
        &self,
        recommended_review_date: DateTime<Utc>,
        last_reviewed_at: Option<DateTime<Utc>>,
        streak: u32,
        total_reviews: u32,
        correct_answers: u32,
        now: DateTime<Utc>,
    ) -> f64 {
        let overdue_days = days_between(recommended_review_date, now).max(0.0);
        let mut score = overdue_days * self.overdue_weight;

        if streak == 0 && total_reviews >= self.recent_failure_min_reviews {
            score += self.recent_failure_bonus;
        }

        if total_reviews >= self.accuracy_min_reviews {
            let acc = accuracy(correct_answers, total_reviews);
            if acc < self.severe_accuracy {
                score += self.severe_accuracy_bonus;
            } else if acc < self.low_accuracy {
                score += self.low_accuracy_bonus;
            }
        }

        if let Some(last) = last_reviewed_at {
            score += days_between(last, now).max(0.0) * self.recency_weight;
        }

        score
    }

    pub fn score_progress(&self, progress: &WordProgress, now: DateTime<Utc>) -> f64 {
        self.score(
            progress.recommended_review_date,
            progress.last_reviewed_at,
            progress.streak,
            progress.total_reviews,
            progress.correct_answers,
            now,
        )
    }
}

/// Score with the default weights
pub fn priority(progress: &WordProgress, now: DateTime<Utc>) -> f64 {
    PriorityWeights::default().score_progress(progress, now)
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}
