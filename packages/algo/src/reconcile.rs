//! Progress Reconciler
//!
//! One implementation of the per-answer progress update, run in two places:
//! the client applies it to the snapshot taken at session start for instant
//! feedback, and the server applies it again to the stored rows inside the
//! commit transaction. The two summaries are then compared by
//! [`resolve`]; a mismatch only swaps the displayed result.
//!
//! Answers are applied sequentially through a per-word cache, so several
//! answers for the same word within one batch compound.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::{ChangeCounts, StatusChange, StatusChanges};
use crate::mastery::MasteryRules;
use crate::scheduler::IntervalConfig;
use crate::types::{MasteryStatus, ProgressSnapshot, SessionAnswer, WordLabel, WordProgress};

/// What to do with an answer whose word has no known progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingProgress {
    /// Optimistic pass: drop the answer
    Skip,
    /// Authoritative pass: start from a fresh record
    StartFresh,
}

/// Result of applying a single answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub word_id: String,
    pub is_correct: bool,
    pub previous_status: MasteryStatus,
    pub status: MasteryStatus,
    pub status_changed: bool,
    pub progress: ProgressSnapshot,
}

/// Apply one answer to a snapshot and reclassify
pub fn apply_answer(
    rules: &MasteryRules,
    snapshot: &ProgressSnapshot,
    is_correct: bool,
) -> ProgressSnapshot {
    let total_reviews = snapshot.total_reviews.saturating_add(1);
    let correct_answers = if is_correct {
        snapshot.correct_answers.saturating_add(1)
    } else {
        snapshot.correct_answers
    };
    let streak = if is_correct {
        snapshot.streak.saturating_add(1)
    } else {
        0
    };

    let mut next = ProgressSnapshot {
        total_reviews,
        correct_answers,
        streak,
        status: snapshot.status,
    };
    next.status = rules.classify_snapshot(&next);
    next
}

/// Per-batch working copy of word progress
pub struct ProgressLedger<'a> {
    rules: &'a MasteryRules,
    missing: MissingProgress,
    cache: HashMap<String, ProgressSnapshot>,
}

impl<'a> ProgressLedger<'a> {
    pub fn new(
        rules: &'a MasteryRules,
        initial: HashMap<String, ProgressSnapshot>,
        missing: MissingProgress,
    ) -> Self {
        Self {
            rules,
            missing,
            cache: initial,
        }
    }

    /// Apply one answer. Returns `None` when the word is unknown and the
    /// ledger skips missing words.
    pub fn record(&mut self, answer: &SessionAnswer) -> Option<AnswerOutcome> {
        let current = match self.cache.get(&answer.word_id) {
            Some(snapshot) => *snapshot,
            None => match self.missing {
                MissingProgress::Skip => {
                    tracing::warn!(
                        word_id = %answer.word_id,
                        "no initial progress for answered word, skipping"
                    );
                    return None;
                }
                MissingProgress::StartFresh => ProgressSnapshot::default(),
            },
        };

        let next = apply_answer(self.rules, &current, answer.is_correct);
        self.cache.insert(answer.word_id.clone(), next);

        Some(AnswerOutcome {
            word_id: answer.word_id.clone(),
            is_correct: answer.is_correct,
            previous_status: current.status,
            status: next.status,
            status_changed: next.status != current.status,
            progress: next,
        })
    }

    pub fn into_progress(self) -> HashMap<String, ProgressSnapshot> {
        self.cache
    }
}

/// Outcomes plus the final per-word progress of one reconcile run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileRun {
    pub outcomes: Vec<AnswerOutcome>,
    pub progress: HashMap<String, ProgressSnapshot>,
}

pub fn reconcile_with(
    rules: &MasteryRules,
    initial: &HashMap<String, ProgressSnapshot>,
    answers: &[SessionAnswer],
    missing: MissingProgress,
) -> ReconcileRun {
    let mut ledger = ProgressLedger::new(rules, initial.clone(), missing);
    let outcomes = answers
        .iter()
        .filter_map(|answer| ledger.record(answer))
        .collect();
    ReconcileRun {
        outcomes,
        progress: ledger.into_progress(),
    }
}

/// Optimistic pass against a session-start snapshot
pub fn reconcile(
    rules: &MasteryRules,
    initial: &HashMap<String, ProgressSnapshot>,
    answers: &[SessionAnswer],
) -> Vec<AnswerOutcome> {
    reconcile_with(rules, initial, answers, MissingProgress::Skip).outcomes
}

/// Net status change per word: status before its first answer against status
/// after its last one, in order of first appearance.
pub fn summarize(outcomes: &[AnswerOutcome], labels: &HashMap<String, WordLabel>) -> StatusChanges {
    let mut order: Vec<&str> = Vec::new();
    let mut net: HashMap<&str, (MasteryStatus, MasteryStatus)> = HashMap::new();

    for outcome in outcomes {
        net.entry(outcome.word_id.as_str())
            .and_modify(|(_, to)| *to = outcome.status)
            .or_insert_with(|| {
                order.push(outcome.word_id.as_str());
                (outcome.previous_status, outcome.status)
            });
    }

    let mut changes = StatusChanges::default();
    for word_id in order {
        let Some(&(from, to)) = net.get(word_id) else {
            continue;
        };
        let label = labels.get(word_id).cloned().unwrap_or_default();
        let change = StatusChange {
            word_id: word_id.to_string(),
            english: label.english,
            japanese: label.japanese,
            from,
            to,
            is_upgrade: from.is_upgrade_to(to),
            is_downgrade: from.is_downgrade_to(to),
        };
        if change.is_upgrade {
            changes.upgrades.push(change);
        } else if change.is_downgrade {
            changes.downgrades.push(change);
        } else {
            changes.maintained.push(change);
        }
    }
    changes
}

/// Write reconciled counters back to a stored record and reschedule it
pub fn settle(
    interval: &IntervalConfig,
    progress: &mut WordProgress,
    snapshot: &ProgressSnapshot,
    now: DateTime<Utc>,
) {
    progress.total_reviews = snapshot.total_reviews;
    progress.correct_answers = snapshot.correct_answers;
    progress.streak = snapshot.streak;
    progress.status = snapshot.status;
    progress.last_reviewed_at = Some(now);
    progress.recommended_review_date = interval.next_review_for(snapshot, now);
}

// ==================== Discrepancy Handling ====================

/// Outcome of comparing the optimistic and authoritative summaries
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Counts agree, keep what is displayed
    Confirmed,
    /// Counts differ, display the authoritative summary instead
    Corrected {
        optimistic: ChangeCounts,
        authoritative: StatusChanges,
    },
}

impl Resolution {
    pub fn is_corrected(&self) -> bool {
        matches!(self, Self::Corrected { .. })
    }

    /// Summary that should be on screen after resolution
    pub fn displayed<'a>(&'a self, optimistic: &'a StatusChanges) -> &'a StatusChanges {
        match self {
            Self::Confirmed => optimistic,
            Self::Corrected { authoritative, .. } => authoritative,
        }
    }
}

pub fn resolve(optimistic: &StatusChanges, authoritative: StatusChanges) -> Resolution {
    let local = optimistic.counts();
    let remote = authoritative.counts();
    if local.upgrades == remote.upgrades && local.downgrades == remote.downgrades {
        return Resolution::Confirmed;
    }

    tracing::info!(
        optimistic_upgrades = local.upgrades,
        optimistic_downgrades = local.downgrades,
        authoritative_upgrades = remote.upgrades,
        authoritative_downgrades = remote.downgrades,
        "optimistic status changes diverged, showing authoritative result"
    );
    Resolution::Corrected {
        optimistic: local,
        authoritative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnswerMode;

    fn answer(word_id: &str, is_correct: bool) -> SessionAnswer {
        SessionAnswer {
            word_id: word_id.to_string(),
            is_correct,
            response_time: 1500,
            mode: AnswerMode::EnglishToJapanese,
        }
    }

    fn snapshot(total: u32, correct: u32, streak: u32) -> ProgressSnapshot {
        ProgressSnapshot {
            total_reviews: total,
            correct_answers: correct,
            streak,
            status: crate::mastery::classify(total, correct, streak),
        }
    }

    fn rules() -> MasteryRules {
        MasteryRules::default()
    }

    #[test]
    fn test_apply_answer_counters() {
        let next = apply_answer(&rules(), &snapshot(3, 2, 2), true);
        assert_eq!(next.total_reviews, 4);
        assert_eq!(next.correct_answers, 3);
        assert_eq!(next.streak, 3);
        assert_eq!(next.status, MasteryStatus::Mastered);

        let missed = apply_answer(&rules(), &next, false);
        assert_eq!(missed.streak, 0);
        assert_eq!(missed.correct_answers, 3);
        assert_eq!(missed.status, MasteryStatus::Reviewing);
    }

    #[test]
    fn test_apply_answer_reclassifies_stale_status() {
        let stale = ProgressSnapshot {
            status: MasteryStatus::Mastered,
            ..snapshot(1, 1, 1)
        };
        let next = apply_answer(&rules(), &stale, false);
        assert_eq!(next.total_reviews, 2);
        assert_eq!(next.status, MasteryStatus::Learning);
    }

    #[test]
    fn test_repeated_answers_compound() {
        let initial = HashMap::from([("w1".to_string(), snapshot(3, 3, 3))]);
        let answers = vec![answer("w1", false), answer("w1", true), answer("w1", true)];
        let outcomes = reconcile(&rules(), &initial, &answers);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, MasteryStatus::Reviewing);
        assert_eq!(outcomes[1].progress.total_reviews, 5);
        // 5 of 6 correct with streak 2 qualifies via accuracy
        assert_eq!(outcomes[2].progress.total_reviews, 6);
        assert_eq!(outcomes[2].status, MasteryStatus::Mastered);
        assert!(outcomes[2].status_changed);
    }

    #[test]
    fn test_optimistic_pass_skips_unknown_words() {
        let initial = HashMap::from([("w1".to_string(), ProgressSnapshot::default())]);
        let answers = vec![answer("ghost", true), answer("w1", true)];
        let outcomes = reconcile(&rules(), &initial, &answers);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].word_id, "w1");
    }

    #[test]
    fn test_authoritative_pass_starts_fresh() {
        let run = reconcile_with(
            &rules(),
            &HashMap::new(),
            &[answer("ghost", true)],
            MissingProgress::StartFresh,
        );
        assert_eq!(run.outcomes.len(), 1);
        assert_eq!(run.outcomes[0].previous_status, MasteryStatus::New);
        assert_eq!(run.progress["ghost"].status, MasteryStatus::Learning);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let initial = HashMap::from([
            ("a".to_string(), snapshot(4, 3, 1)),
            ("b".to_string(), snapshot(0, 0, 0)),
        ]);
        let answers = vec![answer("a", true), answer("b", false), answer("a", true)];
        let first = reconcile(&rules(), &initial, &answers);
        let second = reconcile(&rules(), &initial, &answers);
        assert_eq!(first, second);
    }

    #[test]
    fn test_summarize_uses_net_change() {
        let initial = HashMap::from([
            ("up".to_string(), snapshot(0, 0, 0)),
            ("down".to_string(), snapshot(6, 6, 6)),
            ("flat".to_string(), snapshot(6, 6, 6)),
        ]);
        let answers = vec![
            answer("up", true),
            answer("down", false),
            answer("flat", false),
            answer("flat", true),
            answer("flat", true),
            answer("flat", true),
        ];
        let labels = HashMap::from([(
            "up".to_string(),
            WordLabel {
                english: "apple".to_string(),
                japanese: "りんご".to_string(),
            },
        )]);
        let outcomes = reconcile(&rules(), &initial, &answers);
        let changes = summarize(&outcomes, &labels);

        assert_eq!(changes.upgrades.len(), 1);
        assert_eq!(changes.upgrades[0].english, "apple");
        assert_eq!(changes.upgrades[0].to, MasteryStatus::Learning);
        assert_eq!(changes.downgrades.len(), 1);
        assert_eq!(changes.downgrades[0].word_id, "down");
        assert_eq!(changes.maintained.len(), 1);
        assert_eq!(changes.maintained[0].word_id, "flat");
        assert!(!changes.maintained[0].is_upgrade);
    }

    #[test]
    fn test_settle_reschedules() {
        let now = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap();
        let mut stored = WordProgress::new("w", now);
        let next = snapshot(5, 3, 2);
        settle(&IntervalConfig::default(), &mut stored, &next, now);
        assert_eq!(stored.total_reviews, 5);
        assert_eq!(stored.status, MasteryStatus::Reviewing);
        assert_eq!(stored.last_reviewed_at, Some(now));
        // streak 2 -> 7 days, accuracy 0.6 -> 1.0
        assert_eq!(stored.recommended_review_date, now + chrono::Duration::days(7));
    }

    #[test]
    fn test_resolve_confirms_matching_counts() {
        let initial = HashMap::from([("w".to_string(), snapshot(0, 0, 0))]);
        let outcomes = reconcile(&rules(), &initial, &[answer("w", true)]);
        let optimistic = summarize(&outcomes, &HashMap::new());
        let resolution = resolve(&optimistic, optimistic.clone());
        assert_eq!(resolution, Resolution::Confirmed);
        assert_eq!(resolution.displayed(&optimistic), &optimistic);
    }

    #[test]
    fn test_resolve_prefers_authoritative_on_mismatch() {
        let optimistic = StatusChanges::default();
        let initial = HashMap::from([("w".to_string(), snapshot(0, 0, 0))]);
        let authoritative = summarize(
            &reconcile(&rules(), &initial, &[answer("w", true)]),
            &HashMap::new(),
        );

        let resolution = resolve(&optimistic, authoritative.clone());
        assert!(resolution.is_corrected());
        assert_eq!(resolution.displayed(&optimistic), &authoritative);
    }
}
