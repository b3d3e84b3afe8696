//! Per-call context threaded through every store operation

use crate::errors::DataError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Deadline carried by a store call
///
/// Cancellation needs no flag: dropping the operation's future cancels it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryContext {
    deadline: Option<Instant>,
}

impl QueryContext {
    /// A context without deadline
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Drive `fut` to completion or fail once the deadline passes
    pub(crate) async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T, DataError>
    where
        F: Future<Output = Result<T, DataError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| DataError::DeadlineExceeded(operation.to_string()))?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_context_never_expires() {
        let ctx = QueryContext::background();
        assert!(!ctx.is_expired());
        assert_eq!(ctx.remaining(), None);
        let value = ctx.run("noop", async { Ok::<_, DataError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn deadline_interrupts_slow_work() {
        let ctx = QueryContext::with_timeout(Duration::from_millis(20));
        let err = ctx
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, DataError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::DeadlineExceeded(op) if op == "slow"));
    }

    #[tokio::test]
    async fn past_deadline_is_expired() {
        let ctx = QueryContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }
}
