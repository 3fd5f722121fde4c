//! Readiness gate and observer example.
//!
//! This example shows how to:
//! - Gate recovery on an external health signal
//! - Watch the backoff double while the gate refuses
//! - Receive lifecycle notifications through an observer
//!
//! Run with: cargo run --example readiness_gate

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tripswitch::prelude::*;

/// A health gate that refuses the first two checks, then passes.
struct WarmupGate {
    checks: AtomicU32,
}

#[async_trait]
impl ReadinessCheck for WarmupGate {
    async fn ready(&self) -> Result<bool, ReadinessError> {
        let n = self.checks.fetch_add(1, Ordering::SeqCst);
        println!("  [gate] check #{} -> {}", n + 1, n >= 2);
        Ok(n >= 2)
    }
}

/// Prints every breaker notification as it arrives.
struct Printer;

impl BreakerObserver for Printer {
    fn notify(&self, event: &BreakerEvent) {
        println!(
            "  [event] {} from '{}' at {}",
            event.kind.name(),
            event.breaker,
            event.timestamp.format("%H:%M:%S%.3f")
        );
    }
}

#[derive(Debug)]
struct UpstreamError;

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("upstream unavailable")
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Readiness Gate Example ===\n");

    let breaker: CircuitBreaker<UpstreamError> = CircuitBreaker::new(
        "search",
        BreakerConfig::default()
            .with_max_failures(0)
            .with_reset_timeout(Duration::from_millis(100))
            .with_readiness_check(WarmupGate {
                checks: AtomicU32::new(0),
            }),
    );
    breaker.subscribe(Arc::new(Printer));

    // One classified failure trips the circuit.
    let _ = breaker.execute(|| async { Err::<(), _>(UpstreamError) }).await;
    println!(
        "\nTripped: state={}, next check in {:?}",
        breaker.state(),
        breaker.reset_timeout()
    );

    // Gate refuses twice (backoff doubles each cycle: 200ms, 400ms, 800ms),
    // then passes and the circuit goes half-open.
    println!("\nWaiting out the recovery cycles...\n");
    tokio::time::sleep(Duration::from_millis(1600)).await;
    println!("\nState after gate passed: {}", breaker.state());

    // The admitted probe closes the circuit.
    let value = breaker
        .execute(|| async { Ok::<_, UpstreamError>("hit") })
        .await;
    println!("Probe result: {value:?}");
    println!("Final state: {}", breaker.state());

    println!("\n=== Example Complete ===");
}
