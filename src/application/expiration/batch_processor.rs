use futures_util::stream::{self, StreamExt};
use std::future::Future;
use tracing::warn;

/// Configuration for batch processing operations
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of items in flight at once
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 10 }
    }
}

/// Result of processing a single item in a batch
#[derive(Debug)]
pub struct BatchItemResult<T, R = ()> {
    pub item: T,
    pub result: R,
}

/// Processes items on spawned tasks with a sliding concurrency window.
///
/// Results come back in input order. An item whose task panicked is logged
/// and left out of the results.
pub struct BatchProcessor;

impl BatchProcessor {
    pub async fn process_concurrent<F, Fut, T, R>(
        items: Vec<T>,
        config: &BatchConfig,
        processor: F,
    ) -> Vec<BatchItemResult<T, R>>
    where
        F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        T: Send + Clone + 'static,
        R: Send + 'static,
    {
        stream::iter(items)
            .map(|item| {
                let processor = processor.clone();
                tokio::spawn(async move {
                    let result = processor(item.clone()).await;
                    BatchItemResult { item, result }
                })
            })
            .buffered(config.concurrency.max(1))
            .filter_map(|joined| async move {
                match joined {
                    Ok(result) => Some(result),
                    Err(e) => {
                        warn!(error = %e, "Batch processing task panicked");
                        None
                    }
                }
            })
            .collect()
            .await
    }
}
