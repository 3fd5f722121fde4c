//! # Tripswitch
//!
//! An async circuit breaker for guarding calls to failure-prone integration
//! points: remote services, databases, anything that can go down and come
//! back.
//!
//! ## Overview
//!
//! A [`CircuitBreaker`] wraps caller-supplied async operations and:
//!
//! - Counts failures that the configurable classifier deems meaningful
//! - Stops invoking the operation once failures cross a threshold
//! - Enforces a per-call deadline on every guarded call
//! - Probes recovery with exponential backoff, optionally gated by an
//!   external readiness check
//! - Notifies registered observers of every state transition
//!
//! Construct one breaker per integration point at application start and
//! share it (clones are cheap handles onto the same circuit) across every
//! call site for that point. The breaker never retries the underlying
//! operation; retry policy belongs to the caller or a surrounding layer.
//!
//! ## Quick Start
//!
//! ```rust
//! use tripswitch::{BreakerConfig, BreakerError, CircuitBreaker};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct UpstreamError;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let breaker: CircuitBreaker<UpstreamError> = CircuitBreaker::new(
//!         "inventory",
//!         BreakerConfig::default()
//!             .with_max_failures(3)
//!             .with_call_timeout(Duration::from_secs(2)),
//!     );
//!
//!     match breaker.execute(|| async { Ok::<_, UpstreamError>("stock") }).await {
//!         Ok(value) => println!("upstream said: {value}"),
//!         Err(BreakerError::Open { .. }) => println!("circuit open, not calling"),
//!         Err(other) => println!("call failed: {other:?}"),
//!     }
//! }
//! ```
//!
//! ## States
//!
//! - **Closed**: calls pass through; classified failures are counted.
//! - **Open**: calls are rejected immediately; a backoff timer periodically
//!   consults the readiness gate.
//! - **Half-Open**: the gate passed; the next call is admitted as a probe.
//! - **Half-Closed**: the probe is in flight; everything else is rejected.
//!   Probe success closes the circuit, a classified probe failure reopens
//!   it.
//!
//! ## Architecture
//!
//! - **Breaker**: the controller tying state machine, call wrapper and
//!   recovery loop together
//! - **Classify**: predicates deciding which failures count toward tripping
//! - **Probe**: the backoff schedule and the pluggable readiness gate
//! - **Events**: the observer/notification surface
//! - **State**: state enum and call metrics

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod breaker;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod probe;
pub mod state;

// Re-export commonly used types at the crate root
pub use crate::breaker::CircuitBreaker;
pub use crate::classify::{CallFailure, FailureClassifier, FailurePredicate};
pub use crate::config::BreakerConfig;
pub use crate::error::{BreakerError, BreakerResult};
pub use crate::events::{BreakerEvent, BreakerObserver, EventKind};
pub use crate::probe::{AlwaysReady, ReadinessCheck, ReadinessError};
pub use crate::state::{BreakerMetrics, BreakerState};

/// Prelude module for convenient imports.
///
/// ```rust
/// use tripswitch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::breaker::CircuitBreaker;
    pub use crate::classify::{CallFailure, FailureClassifier};
    pub use crate::config::BreakerConfig;
    pub use crate::error::{BreakerError, BreakerResult};
    pub use crate::events::{BreakerEvent, BreakerObserver, EventKind};
    pub use crate::probe::{AlwaysReady, ReadinessCheck, ReadinessError};
    pub use crate::state::{BreakerMetrics, BreakerState};
}
