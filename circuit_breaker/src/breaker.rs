//! Circuit breaker state machine
//!
//! A single `CircuitBreaker` wraps every call to the guarded backend. Each call is
//! judged solely by whether it returned `Err`.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use config::BreakerConfig;

use crate::errors::BreakerError;
use crate::event::StateChange;
use crate::observers::StateObservers;
use crate::state::{CircuitState, Counts};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Breaker tuning
#[derive(Debug, Clone)]
pub struct Settings {
    pub name: String,
    /// Trial calls allowed while half-open; 0 means 1
    pub max_requests: u32,
    /// Closed-state window after which counts reset; zero never resets
    pub interval: Duration,
    /// Time spent open before probing again; zero means 60 seconds
    pub timeout: Duration,
    /// Consecutive failures that trip a closed breaker
    pub failure_threshold: u32,
}

impl Settings {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_requests: 1,
            interval: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            failure_threshold: 3,
        }
    }

    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_failure_threshold(mut self, failure_threshold: u32) -> Self {
        self.failure_threshold = failure_threshold;
        self
    }
}

impl From<&BreakerConfig> for Settings {
    fn from(config: &BreakerConfig) -> Self {
        Settings::new(&config.name)
            .with_max_requests(config.max_requests)
            .with_interval(config.interval())
            .with_timeout(config.timeout())
            .with_failure_threshold(config.failure_threshold)
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

/// Fails calls fast after sustained failure of the guarded backend
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    max_requests: u32,
    interval: Duration,
    timeout: Duration,
    failure_threshold: u32,
    inner: Mutex<Inner>,
    observers: StateObservers,
}

impl CircuitBreaker {
    pub fn new(settings: Settings) -> Self {
        let interval = settings.interval;
        let breaker = Self {
            name: settings.name,
            max_requests: settings.max_requests.max(1),
            interval,
            timeout: if settings.timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                settings.timeout
            },
            failure_threshold: settings.failure_threshold.max(1),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry: None,
            }),
            observers: StateObservers::new(),
        };
        {
            let mut inner = breaker.lock();
            breaker.new_generation(&mut inner, Instant::now());
        }
        breaker
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an observer notified on every state transition
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.observers.add_callback(callback);
    }

    /// Register an observer that is dropped once it returns `false`
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&StateChange) -> bool + Send + Sync + 'static,
    {
        self.observers.add_subscriber(callback);
    }

    pub fn observers(&self) -> &StateObservers {
        &self.observers
    }

    /// Current state, applying any transition that is due
    pub fn state(&self) -> CircuitState {
        let (state, changes) = {
            let mut inner = self.lock();
            let mut changes = Vec::new();
            self.current_state(&mut inner, Instant::now(), &mut changes);
            (inner.state, changes)
        };
        self.notify(changes);
        state
    }

    /// Counters of the current generation
    pub fn counts(&self) -> Counts {
        self.lock().counts
    }

    /// Run `op` if the breaker allows it and record its outcome
    ///
    /// While open, `op` is never invoked. A call whose future is dropped before it
    /// completes is recorded as a failure.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = self.before_request::<E>()?;
        let mut guard = CallGuard {
            breaker: self,
            generation,
            settled: false,
        };

        let result = op().await;
        guard.settle(result.is_ok());
        result.map_err(BreakerError::Inner)
    }

    fn before_request<E>(&self) -> Result<u64, BreakerError<E>> {
        let mut changes = Vec::new();
        let outcome = {
            let mut inner = self.lock();
            let (state, generation) = self.current_state(&mut inner, Instant::now(), &mut changes);
            match state {
                CircuitState::Open => Err(BreakerError::Open(self.name.clone())),
                CircuitState::HalfOpen if inner.counts.requests >= self.max_requests => {
                    Err(BreakerError::TooManyRequests(self.name.clone()))
                }
                _ => {
                    inner.counts.on_request();
                    Ok(generation)
                }
            }
        };
        self.notify(changes);
        outcome
    }

    fn after_request(&self, before: u64, success: bool) {
        let mut changes = Vec::new();
        {
            let mut inner = self.lock();
            let now = Instant::now();
            let (state, generation) = self.current_state(&mut inner, now, &mut changes);
            // Results from an earlier generation no longer describe the backend
            if generation == before {
                if success {
                    self.on_success(&mut inner, state, now, &mut changes);
                } else {
                    self.on_failure(&mut inner, state, now, &mut changes);
                }
            }
        }
        self.notify(changes);
    }

    fn on_success(
        &self,
        inner: &mut Inner,
        state: CircuitState,
        now: Instant,
        changes: &mut Vec<StateChange>,
    ) {
        match state {
            CircuitState::Closed => inner.counts.on_success(),
            CircuitState::HalfOpen => {
                inner.counts.on_success();
                if inner.counts.consecutive_successes >= self.max_requests {
                    self.set_state(inner, CircuitState::Closed, now, changes);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(
        &self,
        inner: &mut Inner,
        state: CircuitState,
        now: Instant,
        changes: &mut Vec<StateChange>,
    ) {
        match state {
            CircuitState::Closed => {
                inner.counts.on_failure();
                if inner.counts.consecutive_failures >= self.failure_threshold {
                    self.set_state(inner, CircuitState::Open, now, changes);
                }
            }
            CircuitState::HalfOpen => self.set_state(inner, CircuitState::Open, now, changes),
            CircuitState::Open => {}
        }
    }

    fn current_state(
        &self,
        inner: &mut Inner,
        now: Instant,
        changes: &mut Vec<StateChange>,
    ) -> (CircuitState, u64) {
        match inner.state {
            CircuitState::Closed => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.new_generation(inner, now);
                }
            }
            CircuitState::Open => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.set_state(inner, CircuitState::HalfOpen, now, changes);
                }
            }
            CircuitState::HalfOpen => {}
        }
        (inner.state, inner.generation)
    }

    fn set_state(
        &self,
        inner: &mut Inner,
        state: CircuitState,
        now: Instant,
        changes: &mut Vec<StateChange>,
    ) {
        if inner.state == state {
            return;
        }
        let from = inner.state;
        inner.state = state;
        self.new_generation(inner, now);
        changes.push(StateChange::new(&self.name, from, state));
    }

    fn new_generation(&self, inner: &mut Inner, now: Instant) {
        inner.generation = inner.generation.wrapping_add(1);
        inner.counts.clear();
        inner.expiry = match inner.state {
            CircuitState::Closed if self.interval.is_zero() => None,
            CircuitState::Closed => Some(now + self.interval),
            CircuitState::Open => Some(now + self.timeout),
            CircuitState::HalfOpen => None,
        };
    }

    fn notify(&self, changes: Vec<StateChange>) {
        for change in &changes {
            self.observers.emit(change);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Records a failure for calls that never reported back
struct CallGuard<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl CallGuard<'_> {
    fn settle(&mut self, success: bool) {
        self.settled = true;
        self.breaker.after_request(self.generation, success);
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.after_request(self.generation, false);
        }
    }
}
