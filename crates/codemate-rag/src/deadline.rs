//! Per-request deadline and cancellation
//!
//! The request deadline and cancellation signal are passed explicitly into
//! the retriever and generator instead of living in ambient task state.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Execution budget for one query: an absolute deadline plus a cancellation
/// handle. Cloning shares the same deadline and token.
#[derive(Debug, Clone)]
pub struct RequestCtx {
    deadline: Instant,
    cancel: CancellationToken,
}

impl RequestCtx {
    /// Budget starting now, expiring after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self::with_token(timeout, CancellationToken::new())
    }

    /// Budget tied to an externally owned cancellation token, so the caller
    /// (e.g. the HTTP layer) can abort the request mid-flight.
    pub fn with_token(timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancel,
        }
    }

    /// Time left until the deadline. Zero once expired.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Effective timeout for one stage: the stage cap bounded by the deadline.
    pub fn stage_timeout(&self, cap: Duration) -> Duration {
        cap.min(self.remaining())
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Run `fut` under the stage cap, the request deadline, and cancellation.
///
/// Returns `None` when time runs out or the request is cancelled; the
/// in-flight future is dropped either way, which aborts the underlying
/// collaborator call.
pub(crate) async fn bounded<F, T>(ctx: &RequestCtx, cap: Duration, fut: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        _ = ctx.token().cancelled() => None,
        res = tokio::time::timeout(ctx.stage_timeout(cap), fut) => res.ok(),
    }
}
