//! Session Composer
//!
//! Builds one study session from per-status candidate pools:
//!
//! - `new` candidates are shuffled before slicing, they carry no priority signal
//! - the other categories are ordered by priority (random tiebreak) and sliced
//! - a shortage in any category is backfilled from the shuffled leftovers
//! - the final list is shuffled so statuses are not grouped
//!
//! The random source is injected so sessions are reproducible under a seed.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, EngineConfig};
use crate::priority::PriorityWeights;
use crate::types::{MasteryStatus, WordProgress, DEFAULT_CANDIDATE_MULTIPLIER};

// ==================== Patterns ====================

/// Named quota template for one session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPattern {
    pub name: String,
    pub new: usize,
    pub learning: usize,
    pub reviewing: usize,
    pub mastered: usize,
}

impl SessionPattern {
    pub fn new(
        name: impl Into<String>,
        new: usize,
        learning: usize,
        reviewing: usize,
        mastered: usize,
    ) -> Self {
        Self {
            name: name.into(),
            new,
            learning,
            reviewing,
            mastered,
        }
    }

    pub fn quota(&self, status: MasteryStatus) -> usize {
        match status {
            MasteryStatus::New => self.new,
            MasteryStatus::Learning => self.learning,
            MasteryStatus::Reviewing => self.reviewing,
            MasteryStatus::Mastered => self.mastered,
        }
    }

    /// Session size produced by this pattern
    pub fn total(&self) -> usize {
        self.new + self.learning + self.reviewing + self.mastered
    }
}

/// The built-in pattern set, every entry sums to ten words
pub fn default_patterns() -> Vec<SessionPattern> {
    vec![
        SessionPattern::new("balanced", 3, 3, 3, 1),
        SessionPattern::new("new-focus", 5, 2, 2, 1),
        SessionPattern::new("review-focus", 2, 2, 4, 2),
        SessionPattern::new("consolidate", 1, 4, 4, 1),
    ]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub patterns: Vec<SessionPattern>,
    /// Pool size = quota * multiplier, leaves room for reordering and backfill
    pub candidate_multiplier: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
        }
    }
}

impl SessionConfig {
    pub fn pattern(&self, name: &str) -> Result<&SessionPattern, ConfigError> {
        self.patterns
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownPattern(name.to_string()))
    }

    /// Query specs the persistence collaborator must fetch for a pattern
    pub fn candidate_queries(&self, pattern: &SessionPattern) -> Vec<CandidateQuery> {
        MasteryStatus::ALL
            .iter()
            .map(|&status| CandidateQuery {
                status,
                count: pattern.quota(status) * self.candidate_multiplier,
                order_by: OrderBy::for_status(status),
            })
            .collect()
    }
}

// ==================== Candidate Queries ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    /// Most recently created words first
    CreatedAtDesc,
    /// Soonest due first
    RecommendedReviewDateAsc,
}

impl OrderBy {
    pub fn for_status(status: MasteryStatus) -> Self {
        match status {
            MasteryStatus::New => Self::CreatedAtDesc,
            _ => Self::RecommendedReviewDateAsc,
        }
    }
}

/// What to fetch for one status category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuery {
    pub status: MasteryStatus,
    pub count: usize,
    pub order_by: OrderBy,
}

/// Fetched candidates per status, in storage order
#[derive(Clone, Debug)]
pub struct CandidatePools<T> {
    pub new: Vec<T>,
    pub learning: Vec<T>,
    pub reviewing: Vec<T>,
    pub mastered: Vec<T>,
}

impl<T> Default for CandidatePools<T> {
    fn default() -> Self {
        Self {
            new: Vec::new(),
            learning: Vec::new(),
            reviewing: Vec::new(),
            mastered: Vec::new(),
        }
    }
}

impl<T> CandidatePools<T> {
    pub fn pool_mut(&mut self, status: MasteryStatus) -> &mut Vec<T> {
        match status {
            MasteryStatus::New => &mut self.new,
            MasteryStatus::Learning => &mut self.learning,
            MasteryStatus::Reviewing => &mut self.reviewing,
            MasteryStatus::Mastered => &mut self.mastered,
        }
    }

    pub fn total(&self) -> usize {
        self.new.len() + self.learning.len() + self.reviewing.len() + self.mastered.len()
    }
}

// ==================== Composer ====================

pub struct SessionComposer {
    session: SessionConfig,
    weights: PriorityWeights,
    rng: ChaCha8Rng,
}

impl SessionComposer {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Deterministic composer for tests and replays
    pub fn with_seed(config: &EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(config: &EngineConfig, rng: ChaCha8Rng) -> Self {
        Self {
            session: config.session.clone(),
            weights: config.priority.clone(),
            rng,
        }
    }

    /// Pick a pattern uniformly from the configured set
    pub fn choose_pattern(&mut self) -> Result<SessionPattern, ConfigError> {
        self.session
            .patterns
            .choose(&mut self.rng)
            .cloned()
            .ok_or(ConfigError::NoPatterns)
    }

    pub fn candidate_queries(&self, pattern: &SessionPattern) -> Vec<CandidateQuery> {
        self.session.candidate_queries(pattern)
    }

    /// Compose a session of `pattern.total()` items, or fewer when the pools
    /// do not hold that many candidates in total.
    pub fn build_session<T: AsRef<WordProgress>>(
        &mut self,
        pattern: &SessionPattern,
        pools: CandidatePools<T>,
        now: DateTime<Utc>,
    ) -> Vec<T> {
        let session_size = pattern.total();
        let CandidatePools {
            mut new,
            learning,
            reviewing,
            mastered,
        } = pools;

        let mut selected = Vec::with_capacity(session_size);
        let mut leftovers = Vec::new();

        new.shuffle(&mut self.rng);
        take_front(new, pattern.new, &mut selected, &mut leftovers);

        for (status, pool) in [
            (MasteryStatus::Learning, learning),
            (MasteryStatus::Reviewing, reviewing),
            (MasteryStatus::Mastered, mastered),
        ] {
            let ordered = self.order_by_priority(pool, now);
            take_front(ordered, pattern.quota(status), &mut selected, &mut leftovers);
        }

        let shortage = session_size.saturating_sub(selected.len());
        if shortage > 0 {
            leftovers.shuffle(&mut self.rng);
            let filled = shortage.min(leftovers.len());
            tracing::debug!(
                pattern = %pattern.name,
                shortage,
                filled,
                "backfilling session from leftover candidates"
            );
            selected.extend(leftovers.into_iter().take(filled));
        }

        selected.shuffle(&mut self.rng);
        selected
    }

    fn order_by_priority<T: AsRef<WordProgress>>(
        &mut self,
        pool: Vec<T>,
        now: DateTime<Utc>,
    ) -> Vec<T> {
        let mut scored: Vec<(f64, u64, T)> = pool
            .into_iter()
            .map(|item| {
                let score = self.weights.score_progress(item.as_ref(), now);
                (score, self.rng.gen::<u64>(), item)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });

        scored.into_iter().map(|(_, _, item)| item).collect()
    }
}

fn take_front<T>(mut pool: Vec<T>, quota: usize, selected: &mut Vec<T>, leftovers: &mut Vec<T>) {
    let rest = pool.split_off(quota.min(pool.len()));
    selected.extend(pool);
    leftovers.extend(rest);
}
