//! Circuit breaker guarding a single helper service

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,   // Normal operation
    Open,     // Failing, reject requests
    HalfOpen, // Letting a probe through
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: usize,
    last_failure: Option<Instant>,
    opened_at: Option<Instant>,
}

impl BreakerInner {
    fn closed() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            opened_at: None,
        }
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone)]
pub struct BreakerStats {
    pub state: BreakerState,
    pub consecutive_failures: usize,
    pub last_failure: Option<Instant>,
}

/// Trips after `failure_threshold` consecutive failures and rejects calls
/// until `reset_timeout` has passed; then lets one probe through. Other
/// callers are rejected until the probe is recorded, or until another
/// `reset_timeout` passes without a result.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(BreakerInner::closed()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call may go out now. Moves an expired open circuit to
    /// half-open and admits the caller as its single probe.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == BreakerState::Closed {
            return true;
        }

        // in half-open, `opened_at` marks when the probe went out
        let expired = inner
            .opened_at
            .map(|t| t.elapsed() >= self.config.reset_timeout)
            .unwrap_or(true);
        if expired {
            inner.state = BreakerState::HalfOpen;
            inner.opened_at = Some(Instant::now());
        }
        expired
    }

    pub fn record_success(&self) {
        *self.lock() = BreakerInner::closed();
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.consecutive_failures += 1;
        inner.last_failure = Some(now);

        // a failed probe reopens immediately
        if inner.state == BreakerState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold
        {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(now);
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        BreakerStats {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            last_failure: inner.last_failure,
        }
    }

    pub fn reset(&self) {
        self.record_success();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: usize, reset_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            reset_timeout: Duration::from_millis(reset_ms),
        })
    }

    #[test]
    fn test_closed_by_default() {
        let breaker = CircuitBreaker::default();
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn test_opens_after_threshold() {
        let breaker = breaker(3, 30_000);

        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.allow_request());

        breaker.record_failure();
        assert!(!breaker.allow_request());
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn test_success_resets_failures() {
        let breaker = breaker(3, 30_000);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();

        let stats = breaker.stats();
        assert_eq!(stats.state, BreakerState::Closed);
        assert_eq!(stats.consecutive_failures, 0);
        assert!(stats.last_failure.is_none());
    }

    #[test]
    fn test_half_open_after_timeout_and_reopens_on_failed_probe() {
        let breaker = breaker(2, 50);
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.allow_request());

        std::thread::sleep(Duration::from_millis(80));

        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow_request());
    }

    #[test]
    fn test_half_open_admits_single_probe_and_closes_on_success() {
        let breaker = breaker(1, 50);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);

        std::thread::sleep(Duration::from_millis(80));

        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        // concurrent callers wait for the probe
        assert!(!breaker.allow_request());
        assert!(!breaker.allow_request());

        breaker.record_success();
        let stats = breaker.stats();
        assert_eq!(stats.state, BreakerState::Closed);
        assert_eq!(stats.consecutive_failures, 0);
        assert!(breaker.allow_request());
        assert!(breaker.allow_request());
    }

    #[test]
    fn test_unresolved_probe_is_replaced_after_timeout() {
        let breaker = breaker(1, 50);
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(80));

        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());

        std::thread::sleep(Duration::from_millis(80));
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
    }
}
