//! State transition events
//!
//! Every transition of a breaker produces one `StateChange`, delivered to the
//! registered observers.

use serde::{Deserialize, Serialize};

use crate::state::CircuitState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    /// Name of the breaker that changed state
    pub breaker: String,
    pub from: CircuitState,
    pub to: CircuitState,
    /// Transition timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StateChange {
    pub fn new(breaker: &str, from: CircuitState, to: CircuitState) -> Self {
        Self {
            breaker: breaker.to_string(),
            from,
            to,
            timestamp: chrono::Utc::now(),
        }
    }

    /// True when the breaker started rejecting calls
    pub fn is_trip(&self) -> bool {
        self.to == CircuitState::Open
    }
}
