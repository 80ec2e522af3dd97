//! Wire Contracts
//!
//! Request/response shapes shared by the persistence collaborator and its
//! clients. All fields are camelCase on the wire.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MasteryStatus, ProgressSnapshot, SessionAnswer, WordLabel, WordProgress};

// ==================== Session Delivery ====================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCard {
    pub id: String,
    pub english: String,
    pub japanese: String,
}

/// One word of a delivered session with its progress at delivery time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyCard {
    pub word: WordCard,
    pub progress: WordProgress,
}

impl AsRef<WordProgress> for StudyCard {
    fn as_ref(&self) -> &WordProgress {
        &self.progress
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDelivery {
    pub pattern: String,
    /// Words the pattern asked for; `cards` is shorter when candidates ran out
    pub session_size: usize,
    pub cards: Vec<StudyCard>,
}

impl SessionDelivery {
    /// Snapshot the client keeps for the optimistic pass
    pub fn snapshot(&self) -> HashMap<String, ProgressSnapshot> {
        self.cards
            .iter()
            .map(|card| (card.word.id.clone(), card.progress.snapshot()))
            .collect()
    }

    pub fn labels(&self) -> HashMap<String, WordLabel> {
        self.cards
            .iter()
            .map(|card| {
                (
                    card.word.id.clone(),
                    WordLabel {
                        english: card.word.english.clone(),
                        japanese: card.word.japanese.clone(),
                    },
                )
            })
            .collect()
    }
}

// ==================== Batch Completion ====================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCompletionRequest {
    pub words_studied: i64,
    pub answers: Vec<SessionAnswer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub word_id: String,
    pub english: String,
    pub japanese: String,
    pub from: MasteryStatus,
    pub to: MasteryStatus,
    pub is_upgrade: bool,
    pub is_downgrade: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanges {
    pub upgrades: Vec<StatusChange>,
    pub downgrades: Vec<StatusChange>,
    pub maintained: Vec<StatusChange>,
}

impl StatusChanges {
    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            upgrades: self.upgrades.len(),
            downgrades: self.downgrades.len(),
            maintained: self.maintained.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub upgrades: usize,
    pub downgrades: usize,
    pub maintained: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCompletionResponse {
    pub session_id: String,
    pub completed_at: DateTime<Utc>,
    pub status_changes: StatusChanges,
}
