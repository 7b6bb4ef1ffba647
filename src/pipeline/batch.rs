//! Bounded-concurrency dispatch.
//!
//! Items run concurrently within a batch and batches run strictly one after
//! another, separated by a fixed delay. Results come back in input order
//! regardless of completion order. This is the pipeline's only rate limiter.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;

/// Batch size and inter-batch pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub delay: Duration,
}

impl BatchPolicy {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay,
        }
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Run `call(index, item)` for every item, `batch_size` at a time.
///
/// The delay is inserted between batches, never after the last one.
pub async fn dispatch_batched<T, R, F, Fut>(items: Vec<T>, policy: BatchPolicy, call: F) -> Vec<R>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut pending = items.into_iter().enumerate().peekable();
    let mut batch_index = 0;

    while pending.peek().is_some() {
        let batch: Vec<_> = pending
            .by_ref()
            .take(policy.batch_size)
            .map(|(i, item)| call(i, item))
            .collect();

        log::debug!(
            "Dispatching batch {} ({} of {} items)",
            batch_index,
            batch.len(),
            total
        );
        results.extend(join_all(batch).await);
        batch_index += 1;

        if pending.peek().is_some() && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }

    results
}
