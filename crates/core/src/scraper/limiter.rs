//! Outbound call limiter.
//!
//! Serializes remote lookups (IMDb searches and detail fetches) under a
//! shared concurrency ceiling. Waiters are admitted in arrival order.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::warn;

use crate::metrics;

/// Concurrency gate for outbound lookups.
///
/// Shared by reference (`Arc<CallLimiter>`) between every caller that must
/// respect the same ceiling.
pub struct CallLimiter {
    semaphore: Semaphore,
    max_concurrent: usize,
    in_flight: AtomicUsize,
}

impl CallLimiter {
    /// Create a limiter allowing `max_concurrent` tasks at once (minimum 1).
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Tasks currently executing (not waiting).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run `task` once a slot is free and return its result.
    ///
    /// The slot is released when the task completes, fails, or unwinds.
    pub async fn schedule<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                // Only possible once the semaphore is closed, which never happens here
                warn!(error = %e, "Call limiter closed, running task ungated");
                None
            }
        };

        let _guard = InFlightGuard::enter(&self.in_flight);
        task().await
    }
}

impl Default for CallLimiter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl std::fmt::Debug for CallLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallLimiter")
            .field("max_concurrent", &self.max_concurrent)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Tracks one executing task; decrements on drop so panics are counted too.
struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        metrics::LIMITER_IN_FLIGHT.inc();
        Self { counter }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        metrics::LIMITER_IN_FLIGHT.dec();
    }
}
