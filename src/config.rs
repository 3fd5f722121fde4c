//! Breaker configuration.

use crate::classify::{CallFailure, FailureClassifier};
use crate::probe::{AlwaysReady, ReadinessCheck};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a [`CircuitBreaker`](crate::CircuitBreaker).
///
/// All fields have working defaults; override them with the `with_*`
/// builders. `E` is the error type of the operations the breaker will guard.
///
/// # Examples
///
/// ```rust,ignore
/// use tripswitch::{BreakerConfig, CallFailure};
/// use std::time::Duration;
///
/// let config = BreakerConfig::default()
///     .with_max_failures(3)
///     .with_reset_timeout(Duration::from_millis(250))
///     .with_call_timeout(Duration::from_secs(2))
///     .with_error_match(|f: &CallFailure<'_, HttpError>| {
///         matches!(f, CallFailure::Operation(e) if e.status >= 500)
///     });
/// ```
#[derive(Clone)]
pub struct BreakerConfig<E> {
    /// Classified failures tolerated before the circuit trips. The circuit
    /// opens when the failure count goes strictly above this value, so `0`
    /// trips on the first classified failure.
    pub max_failures: u32,

    /// Initial (and minimum) delay before the first recovery check. Doubles
    /// on every entry into the open state.
    pub reset_timeout: Duration,

    /// Upper bound for the doubling recovery delay.
    pub max_reset_timeout: Duration,

    /// Deadline applied to every guarded call.
    pub call_timeout: Duration,

    /// Decides which failures count toward tripping.
    pub classifier: FailureClassifier<E>,

    /// Gate consulted before leaving the open state.
    pub readiness: Arc<dyn ReadinessCheck>,
}

impl<E> Default for BreakerConfig<E> {
    fn default() -> Self {
        Self {
            max_failures: 5,
            reset_timeout: Duration::from_millis(500),
            max_reset_timeout: Duration::from_millis(300_000),
            call_timeout: Duration::from_millis(5_000),
            classifier: FailureClassifier::default(),
            readiness: Arc::new(AlwaysReady),
        }
    }
}

impl<E> BreakerConfig<E> {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of classified failures tolerated before tripping.
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Sets the initial (and minimum) recovery delay.
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Sets the cap for the doubling recovery delay.
    pub fn with_max_reset_timeout(mut self, timeout: Duration) -> Self {
        self.max_reset_timeout = timeout;
        self
    }

    /// Sets the per-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the failure classifier wholesale.
    pub fn with_classifier(mut self, classifier: FailureClassifier<E>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Sets the match predicate: only failures it accepts count toward
    /// tripping. Defaults to matching everything.
    pub fn with_error_match<F>(mut self, matches: F) -> Self
    where
        F: Fn(&CallFailure<'_, E>) -> bool + Send + Sync + 'static,
    {
        self.classifier = self.classifier.with_match(matches);
        self
    }

    /// Sets the ignore predicate: failures it accepts never count, even when
    /// matched. Defaults to ignoring nothing.
    pub fn with_error_ignore<F>(mut self, ignores: F) -> Self
    where
        F: Fn(&CallFailure<'_, E>) -> bool + Send + Sync + 'static,
    {
        self.classifier = self.classifier.with_ignore(ignores);
        self
    }

    /// Sets the readiness gate consulted before leaving the open state.
    /// Defaults to [`AlwaysReady`].
    pub fn with_readiness_check<C>(mut self, check: C) -> Self
    where
        C: ReadinessCheck + 'static,
    {
        self.readiness = Arc::new(check);
        self
    }

    /// Clamps the timeout bounds so `reset_timeout <= max_reset_timeout`.
    pub(crate) fn normalized(mut self) -> Self {
        self.max_reset_timeout = self.max_reset_timeout.max(self.reset_timeout);
        self
    }
}

impl<E> fmt::Debug for BreakerConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerConfig")
            .field("max_failures", &self.max_failures)
            .field("reset_timeout", &self.reset_timeout)
            .field("max_reset_timeout", &self.max_reset_timeout)
            .field("call_timeout", &self.call_timeout)
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestError;

    #[test]
    fn test_defaults() {
        let config: BreakerConfig<TestError> = BreakerConfig::default();
        assert_eq!(config.max_failures, 5);
        assert_eq!(config.reset_timeout, Duration::from_millis(500));
        assert_eq!(config.max_reset_timeout, Duration::from_millis(300_000));
        assert_eq!(config.call_timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn test_builder() {
        let config: BreakerConfig<TestError> = BreakerConfig::new()
            .with_max_failures(2)
            .with_reset_timeout(Duration::from_millis(100))
            .with_max_reset_timeout(Duration::from_secs(10))
            .with_call_timeout(Duration::from_secs(1));

        assert_eq!(config.max_failures, 2);
        assert_eq!(config.reset_timeout, Duration::from_millis(100));
        assert_eq!(config.max_reset_timeout, Duration::from_secs(10));
        assert_eq!(config.call_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_normalized_raises_cap_to_floor() {
        let config: BreakerConfig<TestError> = BreakerConfig::new()
            .with_reset_timeout(Duration::from_secs(60))
            .with_max_reset_timeout(Duration::from_secs(10))
            .normalized();

        assert_eq!(config.max_reset_timeout, Duration::from_secs(60));
    }
}
