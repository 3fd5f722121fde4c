//! Recovery probing: the backoff schedule and the readiness gate that
//! govern leaving the open state.

use async_trait::async_trait;
use std::time::Duration;

/// Boxed error type surfaced by a failing readiness check.
pub type ReadinessError = Box<dyn std::error::Error + Send + Sync>;

/// An external readiness gate consulted before leaving the open state.
///
/// After each backoff delay the breaker asks the gate whether the
/// integration point looks healthy enough to probe. A `true` verdict moves
/// the circuit to half-open; `false` re-arms the backoff with a doubled
/// delay. An error from the gate is treated like `false` and additionally
/// surfaced to observers as an "error" notification; it never reaches a
/// caller, since no call was in flight.
///
/// Typical gates ping a health endpoint or check a service-discovery entry.
/// The default gate, [`AlwaysReady`], skips the question entirely.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use tripswitch::probe::{ReadinessCheck, ReadinessError};
/// use async_trait::async_trait;
///
/// struct HealthEndpoint {
///     url: String,
/// }
///
/// #[async_trait]
/// impl ReadinessCheck for HealthEndpoint {
///     async fn ready(&self) -> Result<bool, ReadinessError> {
///         let response = ping(&self.url).await?;
///         Ok(response.is_success())
///     }
/// }
/// ```
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Returns `Ok(true)` when the integration point may be probed.
    async fn ready(&self) -> Result<bool, ReadinessError>;
}

/// The default readiness gate: always reports ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

#[async_trait]
impl ReadinessCheck for AlwaysReady {
    async fn ready(&self) -> Result<bool, ReadinessError> {
        Ok(true)
    }
}

/// Doubles the reset timeout for the next recovery attempt, capped.
///
/// Applied on every entry into the open state, so backoff compounds across
/// consecutive failed recovery cycles until it reaches the cap.
pub(crate) fn next_reset_timeout(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_ready() {
        assert!(AlwaysReady.ready().await.unwrap());
    }

    #[test]
    fn test_backoff_doubles() {
        let max = Duration::from_secs(300);
        assert_eq!(
            next_reset_timeout(Duration::from_millis(500), max),
            Duration::from_millis(1000)
        );
        assert_eq!(
            next_reset_timeout(Duration::from_millis(1000), max),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_backoff_capped() {
        let max = Duration::from_secs(4);
        assert_eq!(
            next_reset_timeout(Duration::from_secs(3), max),
            Duration::from_secs(4)
        );
        assert_eq!(
            next_reset_timeout(Duration::from_secs(4), max),
            Duration::from_secs(4)
        );
    }
}
