//! Breaker states and call metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The current position of a breaker's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Normal operation. Calls pass through; classified failures are counted.
    Closed,

    /// The integration point is assumed down. Calls are rejected immediately
    /// while the recovery prober waits out the current reset timeout.
    Open,

    /// The readiness gate has passed. The next call is admitted as a probe.
    HalfOpen,

    /// A single probe call is in flight. Every other call is rejected until
    /// the probe settles.
    HalfClosed,
}

impl BreakerState {
    /// Returns `true` if the circuit is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if the circuit is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if the circuit is half-open.
    pub fn is_half_open(&self) -> bool {
        matches!(self, Self::HalfOpen)
    }

    /// Returns `true` if a probe is in flight.
    pub fn is_half_closed(&self) -> bool {
        matches!(self, Self::HalfClosed)
    }

    /// Returns `true` if calls may currently be admitted.
    pub fn admits_calls(&self) -> bool {
        matches!(self, Self::Closed | Self::HalfOpen)
    }

    /// Returns the stable lower-case name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
            Self::HalfClosed => "half_closed",
        }
    }
}

impl Default for BreakerState {
    fn default() -> Self {
        Self::Closed
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A snapshot of what the breaker has seen since construction.
///
/// Timed-out calls are counted both in `failed_calls` and in
/// `timed_out_calls`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakerMetrics {
    /// Total number of calls handled, including rejected ones.
    pub total_calls: u64,
    /// Number of calls that completed successfully.
    pub successful_calls: u64,
    /// Number of calls that failed, including timeouts.
    pub failed_calls: u64,
    /// Number of calls that hit the call timeout.
    pub timed_out_calls: u64,
    /// Number of calls rejected without invoking the operation.
    pub rejected_calls: u64,
    /// Number of times the circuit has entered the open state.
    pub times_opened: u64,
    /// Number of times the circuit has entered the closed state.
    pub times_closed: u64,
}

impl BreakerMetrics {
    /// Creates new empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful call.
    pub fn record_success(&mut self) {
        self.total_calls += 1;
        self.successful_calls += 1;
    }

    /// Records a failed call.
    pub fn record_failure(&mut self) {
        self.total_calls += 1;
        self.failed_calls += 1;
    }

    /// Records a timed-out call.
    pub fn record_timeout(&mut self) {
        self.total_calls += 1;
        self.failed_calls += 1;
        self.timed_out_calls += 1;
    }

    /// Records a call rejected while the circuit forbids calls.
    pub fn record_rejected(&mut self) {
        self.total_calls += 1;
        self.rejected_calls += 1;
    }

    /// Records entry into the open state.
    pub fn record_opened(&mut self) {
        self.times_opened += 1;
    }

    /// Records entry into the closed state.
    pub fn record_closed(&mut self) {
        self.times_closed += 1;
    }

    /// Returns the success rate (0.0 to 1.0) over all calls.
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 1.0;
        }
        self.successful_calls as f64 / self.total_calls as f64
    }

    /// Returns the failure rate (0.0 to 1.0) over all calls.
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.failed_calls as f64 / self.total_calls as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_closed() {
        let state = BreakerState::default();
        assert!(state.is_closed());
        assert!(state.admits_calls());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(BreakerState::Closed.name(), "closed");
        assert_eq!(BreakerState::Open.name(), "open");
        assert_eq!(BreakerState::HalfOpen.name(), "half_open");
        assert_eq!(BreakerState::HalfClosed.name(), "half_closed");
    }

    #[test]
    fn test_admits_calls() {
        assert!(BreakerState::Closed.admits_calls());
        assert!(BreakerState::HalfOpen.admits_calls());
        assert!(!BreakerState::Open.admits_calls());
        assert!(!BreakerState::HalfClosed.admits_calls());
    }

    #[test]
    fn test_metrics() {
        let mut metrics = BreakerMetrics::new();
        assert_eq!(metrics.success_rate(), 1.0);
        assert_eq!(metrics.failure_rate(), 0.0);

        metrics.record_success();
        metrics.record_success();
        metrics.record_failure();
        metrics.record_timeout();

        assert_eq!(metrics.total_calls, 4);
        assert_eq!(metrics.successful_calls, 2);
        assert_eq!(metrics.failed_calls, 2);
        assert_eq!(metrics.timed_out_calls, 1);
        assert_eq!(metrics.success_rate(), 0.5);
        assert_eq!(metrics.failure_rate(), 0.5);
    }

    #[test]
    fn test_metrics_rejection_counts_toward_total() {
        let mut metrics = BreakerMetrics::new();
        metrics.record_rejected();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.rejected_calls, 1);
        assert_eq!(metrics.failed_calls, 0);
    }

    #[test]
    fn test_state_serializes_as_snake_case() {
        let json = serde_json::to_string(&BreakerState::HalfClosed).unwrap();
        assert_eq!(json, "\"half_closed\"");
    }
}
