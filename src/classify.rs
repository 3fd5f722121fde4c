//! Failure classification.
//!
//! Not every failure should push the breaker toward tripping: a 4xx response
//! or an expected rate-limit reply says nothing about the health of the
//! integration point. The classifier decides which failures count, using two
//! overridable predicates fixed at construction time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A failure surfaced by a guarded call, as seen by the classifier.
///
/// Timeouts are classified alongside operation errors so a custom match
/// predicate can decide whether they count toward tripping.
#[derive(Debug)]
pub enum CallFailure<'a, E> {
    /// The operation itself returned an error.
    Operation(&'a E),
    /// The operation did not settle within the call timeout.
    Timeout(Duration),
}

impl<'a, E> CallFailure<'a, E> {
    /// Returns `true` if this failure is a call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns the operation error, if this failure is one.
    pub fn operation(&self) -> Option<&'a E> {
        match self {
            Self::Operation(e) => Some(*e),
            Self::Timeout(_) => None,
        }
    }
}

/// A shared predicate over call failures.
pub type FailurePredicate<E> = Arc<dyn Fn(&CallFailure<'_, E>) -> bool + Send + Sync>;

/// Decides whether a failure counts toward tripping the breaker.
///
/// A failure is *classified*, and therefore counted, when the match
/// predicate accepts it and the ignore predicate does not. Defaults: match
/// everything, ignore nothing, so out of the box every failure counts.
///
/// Predicates are expected to be total; a panicking predicate propagates the
/// panic to the caller of the guarded call.
///
/// # Examples
///
/// ```rust
/// use tripswitch::classify::{CallFailure, FailureClassifier};
///
/// struct HttpError { status: u16 }
///
/// // Only server-side failures count toward tripping.
/// let classifier = FailureClassifier::new().with_match(|f: &CallFailure<'_, HttpError>| {
///     match f {
///         CallFailure::Operation(e) => e.status >= 500,
///         CallFailure::Timeout(_) => true,
///     }
/// });
///
/// let err = HttpError { status: 404 };
/// assert!(!classifier.is_classified(&CallFailure::Operation(&err)));
/// ```
#[derive(Clone)]
pub struct FailureClassifier<E> {
    matches: FailurePredicate<E>,
    ignores: FailurePredicate<E>,
}

impl<E> FailureClassifier<E> {
    /// Creates a classifier that counts every failure.
    pub fn new() -> Self {
        Self {
            matches: Arc::new(|_: &CallFailure<'_, E>| true),
            ignores: Arc::new(|_: &CallFailure<'_, E>| false),
        }
    }

    /// Sets the match predicate. Only failures it accepts are counted.
    pub fn with_match<F>(mut self, matches: F) -> Self
    where
        F: Fn(&CallFailure<'_, E>) -> bool + Send + Sync + 'static,
    {
        self.matches = Arc::new(matches);
        self
    }

    /// Sets the ignore predicate. Failures it accepts are never counted,
    /// even when the match predicate accepts them.
    pub fn with_ignore<F>(mut self, ignores: F) -> Self
    where
        F: Fn(&CallFailure<'_, E>) -> bool + Send + Sync + 'static,
    {
        self.ignores = Arc::new(ignores);
        self
    }

    /// Returns `true` if the failure counts toward tripping.
    pub fn is_classified(&self, failure: &CallFailure<'_, E>) -> bool {
        (self.matches)(failure) && !(self.ignores)(failure)
    }
}

impl<E> Default for FailureClassifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for FailureClassifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureClassifier").finish_non_exhaustive()
    }
}
