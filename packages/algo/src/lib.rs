//! # danci-review-algo - adaptive review engine
//!
//! Pure Rust implementation of the review engine of the Danci vocabulary app:
//!
//! - **Mastery Classifier** - review counters to `new` / `learning` / `reviewing` / `mastered`
//! - **Interval Scheduler** - streak-indexed review intervals scaled by accuracy and volume
//! - **Priority Scorer** - urgency ordering of due words
//! - **Session Composer** - quota-based session building with backfill
//! - **Progress Reconciler** - shared answer replay for optimistic and authoritative passes
//!
//! Everything here is synchronous and free of I/O. Persistence and transport
//! live in the backend and client packages, which both depend on this crate so
//! the two reconcile passes can never drift apart.
//!
//! ## Module structure
//!
//! - [`types`] - progress records, answers, statuses
//! - [`config`] - immutable [`EngineConfig`] and its validation
//! - [`mastery`] - mastery classifier
//! - [`scheduler`] - interval scheduler
//! - [`priority`] - priority scorer
//! - [`session`] - session patterns, candidate queries, composer
//! - [`reconcile`] - answer replay, status change summary, discrepancy resolution
//! - [`contract`] - wire shapes shared with the backend
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use danci_review_algo::{classify, reconcile, MasteryRules, MasteryStatus, ProgressSnapshot, SessionAnswer};
//!
//! assert_eq!(classify(5, 4, 2), MasteryStatus::Mastered);
//!
//! let initial = HashMap::from([("w1".to_string(), ProgressSnapshot::default())]);
//! let answers = vec![SessionAnswer {
//!     word_id: "w1".to_string(),
//!     is_correct: true,
//!     response_time: 1200,
//!     mode: Default::default(),
//! }];
//! let outcomes = reconcile(&MasteryRules::default(), &initial, &answers);
//! assert_eq!(outcomes[0].status, MasteryStatus::Learning);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod contract;
pub mod mastery;
pub mod priority;
pub mod reconcile;
pub mod scheduler;
pub mod session;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use config::{ConfigError, EngineConfig};

pub use contract::{
    BatchCompletionRequest, BatchCompletionResponse, ChangeCounts, SessionDelivery, StatusChange,
    StatusChanges, StudyCard, WordCard,
};

pub use mastery::{classify, MasteryRules};

pub use priority::{priority, PriorityWeights};

pub use reconcile::{
    apply_answer, reconcile, reconcile_with, resolve, settle, summarize, AnswerOutcome,
    MissingProgress, ProgressLedger, ReconcileRun, Resolution,
};

pub use scheduler::{next_review_date, IntervalConfig, MAX_INTERVAL_DAYS};

pub use session::{
    default_patterns, CandidatePools, CandidateQuery, OrderBy, SessionComposer, SessionConfig,
    SessionPattern,
};
