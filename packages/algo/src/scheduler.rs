//! Interval Scheduler
//!
//! Computes the next recommended review date from the streak-indexed step
//! table, scaled by accuracy and review volume. Multipliers compose
//! multiplicatively and the product is floored once.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MasteryStatus, ProgressSnapshot};

/// Upper bound on any scheduled interval, roughly a century
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Parameters of the interval scheduler
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntervalConfig {
    /// Base interval in days indexed by streak, last entry repeats
    pub steps: Vec<u32>,
    /// Ceiling for `learning` words with few reviews
    pub learning_cap_days: u32,
    /// Reviews at or below which the learning cap applies
    pub learning_cap_max_reviews: u32,
    /// Reviews needed before accuracy is trusted
    pub accuracy_min_reviews: u32,
    /// Below this accuracy the severe shrink applies
    pub severe_accuracy: f64,
    pub severe_multiplier: f64,
    /// Below this accuracy the mild shrink applies
    pub low_accuracy: f64,
    pub low_multiplier: f64,
    /// At or above this accuracy the interval is extended
    pub high_accuracy: f64,
    pub high_multiplier: f64,
    /// Reviews above which the volume bonus applies
    pub volume_threshold: u32,
    pub volume_multiplier: f64,
    pub min_interval_days: u32,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            steps: vec![1, 3, 7, 14, 30],
            learning_cap_days: 3,
            learning_cap_max_reviews: 3,
            accuracy_min_reviews: 4,
            severe_accuracy: 0.5,
            severe_multiplier: 0.7,
            low_accuracy: 0.6,
            low_multiplier: 0.85,
            high_accuracy: 0.9,
            high_multiplier: 1.2,
            volume_threshold: 10,
            volume_multiplier: 1.1,
            min_interval_days: 1,
        }
    }
}

impl IntervalConfig {
    /// Base interval for a streak, clamped to the last step
    pub fn base_days(&self, streak: u32) -> u32 {
        let idx = (streak as usize).min(self.steps.len().saturating_sub(1));
        self.steps.get(idx).copied().unwrap_or(self.min_interval_days)
    }

    pub fn accuracy_multiplier(&self, accuracy: f64, total_reviews: u32) -> f64 {
        if total_reviews < self.accuracy_min_reviews {
            return 1.0;
        }
        if accuracy < self.severe_accuracy {
            self.severe_multiplier
        } else if accuracy < self.low_accuracy {
            self.low_multiplier
        } else if accuracy >= self.high_accuracy {
            self.high_multiplier
        } else {
            1.0
        }
    }

    pub fn volume_multiplier(&self, total_reviews: u32) -> f64 {
        if total_reviews > self.volume_threshold {
            self.volume_multiplier
        } else {
            1.0
        }
    }

    /// Final interval in whole days
    pub fn interval_days(
        &self,
        streak: u32,
        accuracy: f64,
        total_reviews: u32,
        status: MasteryStatus,
    ) -> u32 {
        let mut base = self.base_days(streak);
        if status == MasteryStatus::Learning && total_reviews <= self.learning_cap_max_reviews {
            base = base.min(self.learning_cap_days);
        }

        let scaled = base as f64
            * self.accuracy_multiplier(accuracy, total_reviews)
            * self.volume_multiplier(total_reviews);

        let floored = if scaled.is_finite() && scaled > 0.0 {
            scaled.floor() as u32
        } else {
            0
        };
        floored.max(self.min_interval_days).min(MAX_INTERVAL_DAYS)
    }

    pub fn next_review_date(
        &self,
        streak: u32,
        accuracy: f64,
        total_reviews: u32,
        status: MasteryStatus,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let days = self.interval_days(streak, accuracy, total_reviews, status);
        now.checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn next_review_for(&self, snapshot: &ProgressSnapshot, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_review_date(
            snapshot.streak,
            snapshot.accuracy(),
            snapshot.total_reviews,
            snapshot.status,
            now,
        )
    }
}

/// Schedule with the default interval table
pub fn next_review_date(
    streak: u32,
    accuracy: f64,
    total_reviews: u32,
    status: MasteryStatus,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    IntervalConfig::default().next_review_date(streak, accuracy, total_reviews, status, now)
}
