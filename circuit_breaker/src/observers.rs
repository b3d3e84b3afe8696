use crate::event::StateChange;

/// Callback invoked on every state transition; returning `false` unregisters it
pub type TransitionCallback = Box<dyn Fn(&StateChange) -> bool + Send + Sync>;

/// Registry of state transition observers
///
/// Observers are advisory: a breaker without observers behaves identically.
pub struct StateObservers {
    callbacks: std::sync::RwLock<Vec<TransitionCallback>>,
}

impl std::fmt::Debug for StateObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateObservers")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl StateObservers {
    pub fn new() -> Self {
        Self {
            callbacks: std::sync::RwLock::new(Vec::new()),
        }
    }

    /// Add transition callback, kept for the life of the registry
    pub fn add_callback<F>(&self, callback: F)
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.add_subscriber(move |change| {
            callback(change);
            true
        });
    }

    /// Add a callback that stays registered until it returns `false`
    pub fn add_subscriber<F>(&self, callback: F)
    where
        F: Fn(&StateChange) -> bool + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push(Box::new(callback));
        }
    }

    /// Log the transition and hand it to every observer
    pub fn emit(&self, change: &StateChange) {
        tracing::info!(
            breaker = %change.breaker,
            from = %change.from,
            to = %change.to,
            "circuit breaker state changed"
        );
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.retain(|callback| callback(change));
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for StateObservers {
    fn default() -> Self {
        Self::new()
    }
}
