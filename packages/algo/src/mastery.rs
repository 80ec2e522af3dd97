//! Mastery Classifier
//!
//! Maps review counters to a [`MasteryStatus`]. Rules are evaluated in order,
//! first match wins:
//!
//! 1. no reviews yet -> `new`
//! 2. at most `learning_max_reviews` reviews -> `learning`
//! 3. recency path (`streak >= mastered_streak`) or aptitude path
//!    (`streak >= aptitude_streak` and accuracy >= `aptitude_accuracy`) -> `mastered`
//! 4. otherwise -> `reviewing`

use serde::{Deserialize, Serialize};

use crate::types::{accuracy, MasteryStatus, ProgressSnapshot};

/// Thresholds of the mastery state machine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryRules {
    /// Words with this many reviews or fewer stay in `learning`
    pub learning_max_reviews: u32,
    /// Streak that qualifies for `mastered` on its own
    pub mastered_streak: u32,
    /// Shorter streak accepted when overall accuracy is high
    pub aptitude_streak: u32,
    /// Accuracy required alongside `aptitude_streak`
    pub aptitude_accuracy: f64,
}

impl MasteryRules {
    pub const DEFAULT: MasteryRules = MasteryRules {
        learning_max_reviews: 3,
        mastered_streak: 3,
        aptitude_streak: 2,
        aptitude_accuracy: 0.80,
    };

    pub fn classify(&self, total_reviews: u32, correct_answers: u32, streak: u32) -> MasteryStatus {
        if total_reviews == 0 {
            return MasteryStatus::New;
        }
        if total_reviews <= self.learning_max_reviews {
            return MasteryStatus::Learning;
        }

        let recency_path = streak >= self.mastered_streak;
        let aptitude_path = streak >= self.aptitude_streak
            && accuracy(correct_answers, total_reviews) >= self.aptitude_accuracy;

        if recency_path || aptitude_path {
            MasteryStatus::Mastered
        } else {
            MasteryStatus::Reviewing
        }
    }

    /// Status implied by the counters of a snapshot, ignoring its stored status
    pub fn classify_snapshot(&self, snapshot: &ProgressSnapshot) -> MasteryStatus {
        self.classify(snapshot.total_reviews, snapshot.correct_answers, snapshot.streak)
    }
}

impl Default for MasteryRules {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Classify with the canonical rule set
pub fn classify(total_reviews: u32, correct_answers: u32, streak: u32) -> MasteryStatus {
    MasteryRules::DEFAULT.classify(total_reviews, correct_answers, streak)
}
