//! Circuit breaker for store access
//!
//! This crate provides the state machine that fails calls fast once the guarded
//! backend keeps failing, and periodically lets trial calls through to detect recovery.
//!
//! ```text
//! Closed   -- consecutive failures reach threshold --> Open
//! Open     -- timeout elapsed ------------------------> HalfOpen
//! HalfOpen -- max_requests consecutive successes ----> Closed
//! HalfOpen -- any failure ----------------------------> Open
//! ```

pub mod breaker;
pub mod errors;
pub mod event;
pub mod observers;
pub mod prelude;
pub mod state;

// Re-export centralized config
pub use config::BreakerConfig;

pub use breaker::{CircuitBreaker, Settings};
pub use errors::BreakerError;
pub use event::StateChange;
pub use observers::{StateObservers, TransitionCallback};
pub use state::{CircuitState, Counts};
