//! Common Types and Constants
//!
//! Shared data structures used across the review engine modules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Number of words in one study session for the built-in patterns
pub const DEFAULT_SESSION_SIZE: usize = 10;

/// Pool over-fetch factor applied to every pattern quota
pub const DEFAULT_CANDIDATE_MULTIPLIER: usize = 3;

/// Seconds in one day, used for fractional day arithmetic
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// ==================== Mastery Status ====================

/// Coarse learning stage of a word for one learner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryStatus {
    #[default]
    New,
    Learning,
    Reviewing,
    Mastered,
}

impl MasteryStatus {
    /// All statuses in progression order
    pub const ALL: [MasteryStatus; 4] = [
        MasteryStatus::New,
        MasteryStatus::Learning,
        MasteryStatus::Reviewing,
        MasteryStatus::Mastered,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Reviewing => "reviewing",
            Self::Mastered => "mastered",
        }
    }

    /// Position in the progression new < learning < reviewing < mastered
    pub const fn rank(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Reviewing => 2,
            Self::Mastered => 3,
        }
    }

    pub fn is_upgrade_to(self, to: MasteryStatus) -> bool {
        to.rank() > self.rank()
    }

    pub fn is_downgrade_to(self, to: MasteryStatus) -> bool {
        to.rank() < self.rank()
    }
}

impl fmt::Display for MasteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mastery status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for MasteryStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "learning" => Ok(Self::Learning),
            "reviewing" => Ok(Self::Reviewing),
            "mastered" => Ok(Self::Mastered),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

// ==================== Progress ====================

/// Review counters of one word, the input of the mastery classifier.
///
/// This is the shape held client-side at session start and resolved against
/// the answer batch without network access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_reviews: u32,
    pub correct_answers: u32,
    /// Consecutive correct answers, reset to 0 on a miss
    pub streak: u32,
    pub status: MasteryStatus,
}

impl ProgressSnapshot {
    /// Share of correct answers, 0.0 for an unreviewed word
    pub fn accuracy(&self) -> f64 {
        accuracy(self.correct_answers, self.total_reviews)
    }
}

/// Per learner × word progress record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub word_id: String,
    pub total_reviews: u32,
    pub correct_answers: u32,
    pub streak: u32,
    pub status: MasteryStatus,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub recommended_review_date: DateTime<Utc>,
}

impl WordProgress {
    /// Default record created on first session inclusion
    pub fn new(word_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            word_id: word_id.into(),
            total_reviews: 0,
            correct_answers: 0,
            streak: 0,
            status: MasteryStatus::New,
            last_reviewed_at: None,
            recommended_review_date: now,
        }
    }

    pub fn accuracy(&self) -> f64 {
        accuracy(self.correct_answers, self.total_reviews)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_reviews: self.total_reviews,
            correct_answers: self.correct_answers,
            streak: self.streak,
            status: self.status,
        }
    }
}

impl AsRef<WordProgress> for WordProgress {
    fn as_ref(&self) -> &WordProgress {
        self
    }
}

pub(crate) fn accuracy(correct_answers: u32, total_reviews: u32) -> f64 {
    if total_reviews == 0 {
        return 0.0;
    }
    correct_answers as f64 / total_reviews as f64
}

// ==================== Answers ====================

/// Quiz direction the learner answered in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    #[default]
    EnglishToJapanese,
    JapaneseToEnglish,
    Listening,
    Spelling,
}

impl AnswerMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnglishToJapanese => "english_to_japanese",
            Self::JapaneseToEnglish => "japanese_to_english",
            Self::Listening => "listening",
            Self::Spelling => "spelling",
        }
    }
}

/// One answered word within a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnswer {
    pub word_id: String,
    pub is_correct: bool,
    /// Milliseconds between prompt and answer
    pub response_time: u64,
    #[serde(default)]
    pub mode: AnswerMode,
}

// ==================== Word Content ====================

/// Display labels of a word, used when reporting status changes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordLabel {
    pub english: String,
    pub japanese: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&MasteryStatus::Reviewing).unwrap();
        assert_eq!(json, "\"reviewing\"");
        let back: MasteryStatus = serde_json::from_str("\"mastered\"").unwrap();
        assert_eq!(back, MasteryStatus::Mastered);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("LEARNING".parse::<MasteryStatus>().unwrap(), MasteryStatus::Learning);
        assert!("relearning".parse::<MasteryStatus>().is_err());
    }

    #[test]
    fn test_upgrade_direction() {
        assert!(MasteryStatus::Learning.is_upgrade_to(MasteryStatus::Mastered));
        assert!(MasteryStatus::Mastered.is_downgrade_to(MasteryStatus::Reviewing));
        assert!(!MasteryStatus::New.is_downgrade_to(MasteryStatus::New));
    }

    #[test]
    fn test_answer_wire_shape() {
        let answer: SessionAnswer = serde_json::from_str(
            r#"{"wordId":"w1","isCorrect":true,"responseTime":1800,"mode":"listening"}"#,
        )
        .unwrap();
        assert_eq!(answer.word_id, "w1");
        assert_eq!(answer.mode, AnswerMode::Listening);
    }

    #[test]
    fn test_accuracy_of_unreviewed_word_is_zero() {
        let progress = WordProgress::new("w1", Utc::now());
        assert_eq!(progress.accuracy(), 0.0);
    }
}
