//! The breaker controller: state machine, call wrapper and recovery loop.

use crate::classify::{CallFailure, FailureClassifier};
use crate::config::BreakerConfig;
use crate::error::BreakerError;
use crate::events::{BreakerObserver, EventKind, Notifier};
use crate::probe::{next_reset_timeout, ReadinessCheck};
use crate::state::{BreakerMetrics, BreakerState};

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A circuit breaker guarding calls to one failure-prone integration point.
///
/// The breaker wraps caller-supplied async operations, counts classified
/// failures, and stops invoking operations once the count crosses the
/// configured threshold. Recovery is probed with exponential backoff through
/// an optional readiness gate.
///
/// # States
///
/// - **Closed**: Normal operation. Calls pass through, classified failures
///   are counted.
/// - **Open**: The integration point is assumed down. Calls are rejected
///   immediately; a background timer periodically consults the readiness
///   gate.
/// - **Half-Open**: The gate passed. The next call is admitted as a probe.
/// - **Half-Closed**: The probe is in flight. Every other call is rejected
///   until it settles: success closes the circuit, a classified failure
///   reopens it.
///
/// # Sharing
///
/// Construct one breaker per integration point at application start and hand
/// it to every call site for that point. Cloning is cheap and clones observe
/// the same circuit; two independently constructed breakers never share
/// state.
///
/// # Example
///
/// ```rust
/// use tripswitch::{BreakerConfig, CircuitBreaker};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let breaker: CircuitBreaker<std::io::Error> =
///     CircuitBreaker::new("payments", BreakerConfig::default());
///
/// let value = breaker
///     .execute(|| async { Ok::<_, std::io::Error>(42) })
///     .await
///     .unwrap();
/// assert_eq!(value, 42);
/// # }
/// ```
pub struct CircuitBreaker<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for CircuitBreaker<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// How a call was admitted by the state machine.
enum Admission {
    /// Closed: a normal guarded call.
    Pass,
    /// Half-open: this call is the recovery probe.
    Probe,
    /// Open or half-closed: rejected without invoking the operation.
    Reject,
}

struct Inner<E> {
    core: Mutex<Core>,
    metrics: Mutex<BreakerMetrics>,
    classifier: FailureClassifier<E>,
    readiness: Arc<dyn ReadinessCheck>,
    notifier: Notifier,
    name: String,
}

/// Mutable state machine data. Guarded by one mutex, never held across an
/// await.
struct Core {
    state: BreakerState,
    error_count: u32,
    max_failures: u32,
    /// Current recovery delay; doubles on each entry into open.
    reset_timeout: Duration,
    min_reset_timeout: Duration,
    max_reset_timeout: Duration,
    call_timeout: Duration,
    /// Bumped on every transition; a pending recovery timer from an older
    /// epoch is stale and must not act.
    epoch: u64,
}

impl<E: 'static> CircuitBreaker<E> {
    /// Creates a breaker named after the integration point it guards.
    ///
    /// The name shows up in rejection errors, log events and notifications.
    pub fn new(name: impl Into<String>, config: BreakerConfig<E>) -> Self {
        let name = name.into();
        let config = config.normalized();
        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(Core {
                    state: BreakerState::Closed,
                    error_count: 0,
                    max_failures: config.max_failures,
                    reset_timeout: config.reset_timeout,
                    min_reset_timeout: config.reset_timeout,
                    max_reset_timeout: config.max_reset_timeout,
                    call_timeout: config.call_timeout,
                    epoch: 0,
                }),
                metrics: Mutex::new(BreakerMetrics::new()),
                classifier: config.classifier,
                readiness: config.readiness,
                notifier: Notifier::new(name.clone()),
                name,
            }),
        }
    }

    /// Creates a breaker with the default configuration.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, BreakerConfig::default())
    }

    /// Invokes `operation` under the breaker's policy.
    ///
    /// The operation is a closure producing the future to guard; arguments
    /// travel by capture. It is invoked only while the circuit admits calls
    /// (closed or half-open) and races the configured call timeout.
    ///
    /// # Errors
    ///
    /// - [`BreakerError::Open`] - the circuit forbids calls; the operation
    ///   was never invoked.
    /// - [`BreakerError::Timeout`] - the operation missed the call deadline;
    ///   its eventual outcome is discarded.
    /// - [`BreakerError::Operation`] - the operation failed; the original
    ///   error, re-raised unchanged whether or not it counted toward
    ///   tripping.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = {
            let mut core = self.inner.lock_core();
            match core.state {
                BreakerState::Closed => Admission::Pass,
                BreakerState::HalfOpen => {
                    // First caller in half-open becomes the probe; the flip
                    // happens under the admission lock, before the operation
                    // runs, so a concurrent caller sees half-closed.
                    core.epoch += 1;
                    core.state = BreakerState::HalfClosed;
                    Admission::Probe
                }
                BreakerState::Open | BreakerState::HalfClosed => Admission::Reject,
            }
        };

        let probing = match admission {
            Admission::Reject => {
                self.inner.lock_metrics().record_rejected();
                return Err(BreakerError::Open {
                    breaker: self.inner.name.clone(),
                });
            }
            Admission::Probe => {
                self.inner.notifier.emit(EventKind::HalfClose);
                true
            }
            Admission::Pass => false,
        };

        let call_timeout = self.inner.lock_core().call_timeout;

        match tokio::time::timeout(call_timeout, operation()).await {
            Ok(Ok(value)) => {
                self.inner.lock_metrics().record_success();
                if probing {
                    self.inner.enter_closed();
                }
                Ok(value)
            }
            Ok(Err(err)) => {
                self.inner.lock_metrics().record_failure();
                self.on_failure(CallFailure::Operation(&err));
                Err(BreakerError::Operation(err))
            }
            Err(_) => {
                self.inner.lock_metrics().record_timeout();
                self.on_failure(CallFailure::Timeout(call_timeout));
                Err(BreakerError::Timeout {
                    breaker: self.inner.name.clone(),
                    elapsed: call_timeout,
                })
            }
        }
    }

    /// Forces the circuit open and starts recovery probing.
    ///
    /// Also used internally when the failure threshold is crossed. The
    /// recovery delay doubles on every entry into open, capped at the
    /// configured maximum. Must be called from within a tokio runtime.
    pub fn open(&self) {
        Inner::trip(&self.inner);
    }

    /// Forces the circuit closed and clears the failure count.
    pub fn close(&self) {
        self.inner.enter_closed();
    }

    /// Moves the circuit to half-open: the next call is admitted as a probe.
    pub fn half_open(&self) {
        self.inner.enter_half_open();
    }

    /// Marks a probe in flight: every call is rejected until a transition.
    pub fn half_close(&self) {
        self.inner.enter_half_closed();
    }

    /// Registers an observer for lifecycle notifications.
    pub fn subscribe(&self, observer: Arc<dyn BreakerObserver>) {
        self.inner.notifier.subscribe(observer);
    }

    /// Returns the name of the guarded integration point.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the current state of the circuit.
    pub fn state(&self) -> BreakerState {
        self.inner.lock_core().state
    }

    /// Returns the number of classified failures counted since the circuit
    /// last closed.
    pub fn error_count(&self) -> u32 {
        self.inner.lock_core().error_count
    }

    /// Returns the number of classified failures tolerated before tripping.
    pub fn max_failures(&self) -> u32 {
        self.inner.lock_core().max_failures
    }

    /// Sets the number of classified failures tolerated before tripping.
    pub fn set_max_failures(&self, max_failures: u32) {
        self.inner.lock_core().max_failures = max_failures;
    }

    /// Returns the current recovery delay.
    pub fn reset_timeout(&self) -> Duration {
        self.inner.lock_core().reset_timeout
    }

    /// Sets the current recovery delay, clamped to the configured bounds.
    pub fn set_reset_timeout(&self, timeout: Duration) {
        let mut core = self.inner.lock_core();
        core.reset_timeout = timeout.clamp(core.min_reset_timeout, core.max_reset_timeout);
    }

    /// Returns the floor the recovery delay resets to on close.
    pub fn min_reset_timeout(&self) -> Duration {
        self.inner.lock_core().min_reset_timeout
    }

    /// Sets the recovery delay floor, raising the cap and the current delay
    /// if they fall below it.
    pub fn set_min_reset_timeout(&self, timeout: Duration) {
        let mut core = self.inner.lock_core();
        core.min_reset_timeout = timeout;
        core.max_reset_timeout = core.max_reset_timeout.max(timeout);
        core.reset_timeout = core.reset_timeout.max(timeout);
    }

    /// Returns the cap for the doubling recovery delay.
    pub fn max_reset_timeout(&self) -> Duration {
        self.inner.lock_core().max_reset_timeout
    }

    /// Sets the recovery delay cap, clamped to stay at or above the floor.
    pub fn set_max_reset_timeout(&self, timeout: Duration) {
        let mut core = self.inner.lock_core();
        core.max_reset_timeout = timeout.max(core.min_reset_timeout);
        core.reset_timeout = core.reset_timeout.min(core.max_reset_timeout);
    }

    /// Returns the per-call deadline.
    pub fn call_timeout(&self) -> Duration {
        self.inner.lock_core().call_timeout
    }

    /// Sets the per-call deadline for subsequent calls.
    pub fn set_call_timeout(&self, timeout: Duration) {
        self.inner.lock_core().call_timeout = timeout;
    }

    /// Returns a snapshot of the call metrics.
    pub fn metrics(&self) -> BreakerMetrics {
        self.inner.lock_metrics().clone()
    }

    /// Routes a failure through the classifier; a classified failure that
    /// pushes the count strictly above the threshold trips the circuit.
    fn on_failure(&self, failure: CallFailure<'_, E>) {
        if !self.inner.classifier.is_classified(&failure) {
            return;
        }
        let tripped = {
            let mut core = self.inner.lock_core();
            core.error_count += 1;
            core.error_count > core.max_failures
        };
        if tripped {
            Inner::trip(&self.inner);
        }
    }
}

impl<E> fmt::Debug for CircuitBreaker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.lock_core();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.inner.name)
            .field("state", &core.state)
            .field("error_count", &core.error_count)
            .field("reset_timeout", &core.reset_timeout)
            .finish_non_exhaustive()
    }
}

impl<E> Inner<E> {
    fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_metrics(&self) -> MutexGuard<'_, BreakerMetrics> {
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_epoch(&self) -> u64 {
        self.lock_core().epoch
    }

    /// Enters the open state: doubles the recovery delay (capped) and
    /// returns the epoch and delay for the recovery timer to arm against.
    fn enter_open(&self) -> (u64, Duration) {
        let (epoch, delay) = {
            let mut core = self.lock_core();
            core.epoch += 1;
            core.state = BreakerState::Open;
            core.reset_timeout = next_reset_timeout(core.reset_timeout, core.max_reset_timeout);
            (core.epoch, core.reset_timeout)
        };
        self.lock_metrics().record_opened();
        self.notifier.emit(EventKind::Open {
            reset_timeout_ms: delay.as_millis() as u64,
        });
        (epoch, delay)
    }

    fn enter_closed(&self) {
        {
            let mut core = self.lock_core();
            core.epoch += 1;
            core.state = BreakerState::Closed;
            core.error_count = 0;
            core.reset_timeout = core.min_reset_timeout;
        }
        self.lock_metrics().record_closed();
        self.notifier.emit(EventKind::Close);
    }

    fn enter_half_open(&self) {
        {
            let mut core = self.lock_core();
            core.epoch += 1;
            core.state = BreakerState::HalfOpen;
        }
        self.notifier.emit(EventKind::HalfOpen);
    }

    fn enter_half_closed(&self) {
        {
            let mut core = self.lock_core();
            core.epoch += 1;
            core.state = BreakerState::HalfClosed;
        }
        self.notifier.emit(EventKind::HalfClose);
    }
}

impl<E: 'static> Inner<E> {
    /// Opens the circuit and arms the recovery timer.
    fn trip(inner: &Arc<Self>) {
        let (epoch, delay) = inner.enter_open();
        tokio::spawn(Self::run_recovery(Arc::clone(inner), epoch, delay));
    }

    /// The recovery loop: wait out the backoff, consult the readiness gate,
    /// and either go half-open or stay open with a doubled delay. A loop
    /// rather than rescheduling through chained futures, so the schedule is
    /// bounded and a stale timer (superseded by a forced transition) simply
    /// exits at the epoch check.
    async fn run_recovery(inner: Arc<Self>, mut epoch: u64, mut delay: Duration) {
        loop {
            tokio::time::sleep(delay).await;
            if inner.current_epoch() != epoch {
                return;
            }
            let verdict = inner.readiness.ready().await;
            if inner.current_epoch() != epoch {
                return;
            }
            match verdict {
                Ok(true) => {
                    inner.enter_half_open();
                    return;
                }
                Ok(false) => {
                    (epoch, delay) = inner.enter_open();
                }
                Err(err) => {
                    inner.notifier.emit(EventKind::Error {
                        message: err.to_string(),
                    });
                    (epoch, delay) = inner.enter_open();
                }
            }
        }
    }
}
