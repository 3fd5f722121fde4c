//! Basic circuit breaker tour.
//!
//! This example shows how to:
//! - Guard calls to an unreliable async operation
//! - Configure failure thresholds and timeouts
//! - Handle rejected calls while the circuit is open
//! - Watch the circuit trip and recover
//!
//! Run with: cargo run --example guarded_calls

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tripswitch::prelude::*;

#[derive(Debug, Error)]
#[error("upstream returned status {status}")]
struct UpstreamError {
    status: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing so the breaker's transition events are visible.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Guarded Calls Example ===\n");

    let breaker: CircuitBreaker<UpstreamError> = CircuitBreaker::new(
        "inventory",
        BreakerConfig::default()
            .with_max_failures(2)
            .with_reset_timeout(Duration::from_millis(500))
            .with_call_timeout(Duration::from_secs(1)),
    );

    println!("Breaker configuration:");
    println!("  Max failures:  {}", breaker.max_failures());
    println!("  Reset timeout: {:?}", breaker.reset_timeout());
    println!("  Call timeout:  {:?}", breaker.call_timeout());
    println!();

    // An upstream that is down for now; only invoked calls consume attempts.
    let attempts = Arc::new(AtomicU32::new(0));

    println!("Sending calls to trip the breaker...\n");
    for i in 1..=6 {
        let n = Arc::clone(&attempts);
        let result = breaker
            .execute(move || async move {
                let attempt = n.fetch_add(1, Ordering::SeqCst);
                if attempt < 6 {
                    Err(UpstreamError { status: 503 })
                } else {
                    Ok("stock level: 42")
                }
            })
            .await;

        match result {
            Ok(value) => println!("Call #{i}: ok ({value})"),
            Err(BreakerError::Open { .. }) => {
                println!("Call #{i}: rejected, circuit is {}", breaker.state())
            }
            Err(e) => println!("Call #{i}: failed ({e})"),
        }
    }

    let metrics = breaker.metrics();
    println!(
        "\nMetrics so far: {} total, {} failed, {} rejected",
        metrics.total_calls, metrics.failed_calls, metrics.rejected_calls
    );

    // The first recovery window is 1s (500ms doubled on open).
    println!("\nWaiting for the recovery window...");
    tokio::time::sleep(Duration::from_millis(1200)).await;
    println!("State after wait: {}", breaker.state());

    // The upstream has recovered; the probe closes the circuit.
    let n = Arc::clone(&attempts);
    match breaker
        .execute(move || async move {
            n.fetch_add(1, Ordering::SeqCst);
            Ok::<_, UpstreamError>("stock level: 42")
        })
        .await
    {
        Ok(value) => println!("Probe call: ok ({value})"),
        Err(e) => println!("Probe call: failed ({e})"),
    }

    println!("Final state: {}", breaker.state());
    println!("Final metrics: {:?}", breaker.metrics());

    println!("\n=== Example Complete ===");
}
