//! Breaker lifecycle notifications.
//!
//! Observers exist for external monitoring only; the breaker never consumes
//! its own notifications. Every transition is also emitted as a structured
//! `tracing` event, so a subscriber can capture the same signal without
//! registering an observer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// What happened inside the breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// The circuit opened; calls will be rejected until recovery succeeds.
    Open {
        /// Delay before the next readiness check, in milliseconds.
        reset_timeout_ms: u64,
    },
    /// The circuit closed; normal operation resumed.
    Close,
    /// The readiness gate passed; the next call will be admitted as a probe.
    HalfOpen,
    /// A probe call is in flight.
    HalfClose,
    /// The readiness gate itself failed. The circuit stays open.
    Error {
        /// Rendered readiness-check error.
        message: String,
    },
}

impl EventKind {
    /// Returns the stable lower-case name of the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Close => "close",
            Self::HalfOpen => "half_open",
            Self::HalfClose => "half_close",
            Self::Error { .. } => "error",
        }
    }
}

/// A notification delivered to registered observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerEvent {
    /// Name of the breaker that emitted the event.
    pub breaker: String,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// An observer of breaker lifecycle events.
///
/// Observers run synchronously on the task that performed the transition;
/// keep them cheap and non-blocking.
pub trait BreakerObserver: Send + Sync {
    /// Called for every emitted event.
    fn notify(&self, event: &BreakerEvent);
}

/// Fans transitions out to tracing and to registered observers.
pub(crate) struct Notifier {
    breaker: String,
    observers: RwLock<Vec<Arc<dyn BreakerObserver>>>,
}

impl Notifier {
    pub(crate) fn new(breaker: String) -> Self {
        Self {
            breaker,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, observer: Arc<dyn BreakerObserver>) {
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(observer);
    }

    pub(crate) fn emit(&self, kind: EventKind) {
        match &kind {
            EventKind::Open { reset_timeout_ms } => tracing::warn!(
                breaker = %self.breaker,
                reset_timeout_ms,
                "circuit opened"
            ),
            EventKind::Close => tracing::info!(breaker = %self.breaker, "circuit closed"),
            EventKind::HalfOpen => {
                tracing::debug!(breaker = %self.breaker, "circuit half-open, awaiting probe")
            }
            EventKind::HalfClose => {
                tracing::debug!(breaker = %self.breaker, "probe call in flight")
            }
            EventKind::Error { message } => tracing::warn!(
                breaker = %self.breaker,
                error = %message,
                "readiness check failed"
            ),
        }

        let event = BreakerEvent {
            breaker: self.breaker.clone(),
            timestamp: Utc::now(),
            kind,
        };

        // Snapshot under the lock, notify outside it, so an observer may
        // re-enter the breaker (or subscribe) without deadlocking.
        let observers = self
            .observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for observer in &observers {
            observer.notify(&event);
        }
    }
}
