//! Batched provider requests
//!
//! A [`Batch`] collects independent provider calls of one kind and executes
//! them together, up to `max_concurrent` in flight at a time. Results come
//! back in queue order, so callers can pair each response with the request
//! that produced it without callbacks. Executing an empty batch is a no-op.

use std::future::Future;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;

use crate::error::Result;

/// A group of queued provider calls producing `T`
pub struct Batch<'a, T> {
    label: String,
    requests: Vec<BoxFuture<'a, Result<T>>>,
    max_concurrent: usize,
}

impl<'a, T: Send + 'a> Batch<'a, T> {
    /// Create an empty batch.
    ///
    /// `label` only appears in logs.
    pub fn new(label: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            label: label.into(),
            requests: Vec::new(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Queue one call. Nothing runs until the batch executes.
    pub fn queue<F>(&mut self, request: F)
    where
        F: Future<Output = Result<T>> + Send + 'a,
    {
        self.requests.push(Box::pin(request));
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Run every queued call, or nothing if none were queued.
    ///
    /// Responses are returned in queue order. The first failing call fails
    /// the whole batch and remaining calls are dropped.
    pub async fn execute_if_non_empty(self) -> Result<Vec<T>> {
        if self.requests.is_empty() {
            debug!("Skipping empty batch '{}'", self.label);
            return Ok(Vec::new());
        }

        debug!(
            "Executing batch '{}' with {} requests (max {} concurrent)",
            self.label,
            self.requests.len(),
            self.max_concurrent
        );

        let responses: Vec<T> = stream::iter(self.requests)
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        debug!("Batch '{}' returned {} responses", self.label, responses.len());
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::ProviderError;

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let batch: Batch<'_, String> = Batch::new("empty", 4);
        assert!(batch.is_empty());

        let result = batch.execute_if_non_empty().await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_queued_calls_do_not_run_until_execute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut batch = Batch::new("lazy", 4);

        for i in 0..3 {
            let calls = calls.clone();
            batch.queue(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(i)
            });
        }
        assert_eq!(batch.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        batch.execute_if_non_empty().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_results_keep_queue_order() {
        let mut batch = Batch::new("ordered", 4);
        for (i, delay) in [30u64, 5, 15].into_iter().enumerate() {
            batch.queue(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(i)
            });
        }

        let result = batch.execute_if_non_empty().await.unwrap();
        assert_eq!(result, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_respects_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));
        let mut batch = Batch::new("bounded", 2);

        for i in 0..5 {
            let in_flight = in_flight.clone();
            let max_observed = max_observed.clone();
            batch.queue(async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            });
        }

        let result = batch.execute_if_non_empty().await.unwrap();
        assert_eq!(result.len(), 5);
        assert!(max_observed.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_propagates_errors() {
        let mut batch = Batch::new("failing", 4);
        for i in 0..3 {
            batch.queue(async move {
                if i == 1 {
                    Err(ProviderError::InvalidResponse("truncated page".to_string()).into())
                } else {
                    Ok(i)
                }
            });
        }

        assert!(batch.execute_if_non_empty().await.is_err());
    }
}
