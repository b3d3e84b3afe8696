//! Error types for guarded calls

use thiserror::Error;

/// Outcome of a call rejected by, or failed behind, the breaker
#[derive(Error, Debug)]
pub enum BreakerError<E> {
    #[error("circuit breaker '{0}' is open")]
    Open(String),

    #[error("circuit breaker '{0}' is half-open and out of trial requests")]
    TooManyRequests(String),

    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// True when the call never reached the guarded backend
    pub fn is_rejected(&self) -> bool {
        !matches!(self, BreakerError::Inner(_))
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Inner(e) => Some(e),
            _ => None,
        }
    }
}
