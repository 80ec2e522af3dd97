//! # danci-review-client
//!
//! Client side of a review session:
//!
//! - [`StudySession`] records answers against the snapshot delivered with the
//!   session and reports status changes without waiting for the network
//! - [`commit_with_retry`] sends the answer batch with bounded backoff
//! - [`PendingCommit::resolve`] swaps in the authoritative summary when the
//!   two passes disagree
//!
//! ```no_run
//! use std::sync::Arc;
//! use danci_review_algo::{MasteryRules, SessionAnswer};
//! use danci_review_client::{ClientConfig, HttpTransport, StudySession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://127.0.0.1:3000", "token");
//! let transport = Arc::new(HttpTransport::new(&config)?);
//!
//! let delivery = transport.next_session(None).await?;
//! let mut session = StudySession::new(delivery, MasteryRules::default());
//! let first = session.cards()[0].word.id.clone();
//! session.record(SessionAnswer {
//!     word_id: first,
//!     is_correct: true,
//!     response_time: 1400,
//!     mode: Default::default(),
//! });
//!
//! let finished = session.finish(transport, config.retry);
//! println!("{} upgrades", finished.optimistic.upgrades.len());
//! let outcome = finished.pending.resolve().await?;
//! println!("corrected: {}", outcome.resolution.is_corrected());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod transport;
pub mod uploader;

pub use config::{ClientConfig, RetryPolicy};
pub use error::{CommitError, TransportError};
pub use session::{CommitOutcome, FinishedSession, PendingCommit, StudySession};
pub use transport::{CompletionTransport, HttpTransport};
pub use uploader::commit_with_retry;
