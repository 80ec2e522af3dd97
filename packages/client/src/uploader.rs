use danci_review_algo::{BatchCompletionRequest, BatchCompletionResponse};

use crate::config::RetryPolicy;
use crate::error::{CommitError, TransportError};
use crate::transport::CompletionTransport;

/// Send one batch, retrying transient failures with exponential backoff.
pub async fn commit_with_retry<T: CompletionTransport>(
    transport: &T,
    request: &BatchCompletionRequest,
    policy: RetryPolicy,
) -> Result<BatchCompletionResponse, CommitError> {
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err: TransportError = match transport.complete(request).await {
            Ok(response) => {
                tracing::debug!(attempt, session_id = %response.session_id, "batch committed");
                return Ok(response);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            tracing::warn!(attempt, error = %err, "batch commit rejected");
            return Err(CommitError::Rejected(err));
        }
        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = %err, "batch commit failed");
            return Err(CommitError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.delay_after(attempt);
        tracing::warn!(attempt, ?delay, error = %err, "batch commit failed, retrying");
        tokio::time::sleep(delay).await;
    }
}
