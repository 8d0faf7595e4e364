//! Monotonic time as a host capability.
//!
//! Nothing in this crate calls `tokio::time::Instant::now()` or
//! `tokio::time::sleep` directly outside of this module. Going through
//! [`Clock`] means a test can swap in a fake and drive `BlockWithDeadline`
//! publishing or the ask-service's own timeouts deterministically with
//! `tokio::time::pause()`/`advance()` rather than racing real wall time.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Monotonic time plus a sleep/timeout capability.
///
/// `Send + Sync` so a `Clock` can be shared across subscriber tasks behind an
/// `Arc`, the same way the broker shares its `Arc<dyn IdGenerator>`.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Race `fut` against a deadline of `duration` from now. Returns `Err`
    /// with the elapsed duration if the deadline passed first.
    fn timeout<'a, F>(
        &'a self,
        duration: Duration,
        fut: F,
    ) -> std::pin::Pin<Box<dyn Future<Output = Result<F::Output, Elapsed>> + Send + 'a>>
    where
        F: Future + Send + 'a,
        F::Output: Send;
}

/// A deadline elapsed before the raced future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed;

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline elapsed")
    }
}

impl std::error::Error for Elapsed {}

/// Default [`Clock`] delegating to Tokio's time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn timeout<'a, F>(
        &'a self,
        duration: Duration,
        fut: F,
    ) -> std::pin::Pin<Box<dyn Future<Output = Result<F::Output, Elapsed>> + Send + 'a>>
    where
        F: Future + Send + 'a,
        F::Output: Send,
    {
        Box::pin(async move {
            tokio::time::timeout(duration, fut)
                .await
                .map_err(|_| Elapsed)
        })
    }
}
