//! Convenience re-exports for common circuit-breaker usage

pub use crate::breaker::{CircuitBreaker, Settings};
pub use crate::errors::BreakerError;
pub use crate::event::StateChange;
pub use crate::state::{CircuitState, Counts};

// Re-export centralized config
pub use config::BreakerConfig;
