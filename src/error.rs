//! Error types for guarded calls.
//!
//! The breaker never masks a failure raised by the wrapped operation:
//! operation errors and timeouts are classified for bookkeeping and then
//! re-raised to the caller unchanged. The only error the breaker synthesizes
//! on its own is [`BreakerError::Open`], returned when a call is rejected
//! without the operation ever being invoked.

use std::time::Duration;
use thiserror::Error;

/// The error type returned by guarded calls.
///
/// `E` is the error type of the wrapped operation, carried through unchanged
/// so callers can branch on "breaker open" vs "underlying failure."
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The circuit forbids calls (open, or a probe is already in flight).
    /// The operation was never invoked.
    #[error("circuit breaker '{breaker}' is open; call rejected")]
    Open {
        /// Name of the breaker that rejected the call.
        breaker: String,
    },

    /// The operation did not settle within the call timeout.
    #[error("call guarded by breaker '{breaker}' timed out after {elapsed:?}")]
    Timeout {
        /// Name of the breaker that enforced the deadline.
        breaker: String,
        /// The deadline that was exceeded.
        elapsed: Duration,
    },

    /// The operation itself failed. Carried unchanged.
    #[error("{0}")]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// Returns `true` if the call was rejected with the circuit open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Returns `true` if the call hit the call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the underlying operation error, if this is one.
    pub fn operation(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Consumes the error, returning the underlying operation error if this
    /// is one.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` type for guarded calls.
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;
