//! Study session driver
//!
//! Holds the progress snapshot taken at delivery, computes status changes
//! locally the moment a session ends, and commits the answer batch on a
//! background task. The authoritative result is reconciled against what was
//! shown once it arrives.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use danci_review_algo::{
    reconcile, resolve, summarize, BatchCompletionRequest, BatchCompletionResponse, MasteryRules,
    ProgressSnapshot, Resolution, SessionAnswer, SessionDelivery, StatusChanges, StudyCard,
    WordLabel,
};
use tokio::task::JoinHandle;

use crate::config::RetryPolicy;
use crate::error::CommitError;
use crate::transport::CompletionTransport;
use crate::uploader::commit_with_retry;

pub struct StudySession {
    pattern: String,
    cards: Vec<StudyCard>,
    snapshot: HashMap<String, ProgressSnapshot>,
    labels: HashMap<String, WordLabel>,
    rules: MasteryRules,
    answers: Vec<SessionAnswer>,
}

impl StudySession {
    pub fn new(delivery: SessionDelivery, rules: MasteryRules) -> Self {
        let snapshot = delivery.snapshot();
        let labels = delivery.labels();
        Self {
            pattern: delivery.pattern,
            cards: delivery.cards,
            snapshot,
            labels,
            rules,
            answers: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn cards(&self) -> &[StudyCard] {
        &self.cards
    }

    pub fn answers(&self) -> &[SessionAnswer] {
        &self.answers
    }

    pub fn record(&mut self, answer: SessionAnswer) {
        self.answers.push(answer);
    }

    /// Status changes implied by the answers so far, from the delivery snapshot
    pub fn optimistic_changes(&self) -> StatusChanges {
        let outcomes = reconcile(&self.rules, &self.snapshot, &self.answers);
        summarize(&outcomes, &self.labels)
    }

    fn completion_request(&self) -> BatchCompletionRequest {
        let studied: HashSet<&str> = self.answers.iter().map(|a| a.word_id.as_str()).collect();
        BatchCompletionRequest {
            words_studied: studied.len() as i64,
            answers: self.answers.clone(),
        }
    }

    /// End the session. The optimistic summary is returned immediately; the
    /// batch commit runs on a spawned task. Must be called inside a tokio
    /// runtime.
    pub fn finish<T: CompletionTransport>(
        self,
        transport: Arc<T>,
        policy: RetryPolicy,
    ) -> FinishedSession {
        let optimistic = self.optimistic_changes();

        let handle = if self.answers.is_empty() {
            None
        } else {
            let request = self.completion_request();
            tracing::info!(
                pattern = %self.pattern,
                answers = request.answers.len(),
                words = request.words_studied,
                "session finished, committing in background"
            );
            Some(tokio::spawn(async move {
                commit_with_retry(transport.as_ref(), &request, policy).await
            }))
        };

        FinishedSession {
            pending: PendingCommit {
                optimistic: optimistic.clone(),
                handle,
            },
            optimistic,
        }
    }
}

pub struct FinishedSession {
    /// Shown to the learner right away
    pub optimistic: StatusChanges,
    pub pending: PendingCommit,
}

/// Handle on the background commit
pub struct PendingCommit {
    optimistic: StatusChanges,
    handle: Option<JoinHandle<Result<BatchCompletionResponse, CommitError>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub response: BatchCompletionResponse,
    pub resolution: Resolution,
}

impl CommitOutcome {
    /// Summary to keep on screen after the commit
    pub fn displayed<'a>(&'a self, optimistic: &'a StatusChanges) -> &'a StatusChanges {
        self.resolution.displayed(optimistic)
    }
}

impl PendingCommit {
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the commit and compare its result with the optimistic summary.
    /// A failed commit leaves the optimistic summary in place.
    pub async fn resolve(self) -> Result<CommitOutcome, CommitError> {
        let Some(handle) = self.handle else {
            return Err(CommitError::NothingToCommit);
        };

        let response = match handle.await {
            Ok(result) => result?,
            Err(err) => return Err(CommitError::Aborted(err.to_string())),
        };

        let resolution = resolve(&self.optimistic, response.status_changes.clone());
        Ok(CommitOutcome {
            response,
            resolution,
        })
    }
}
