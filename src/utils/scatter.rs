//! # Scatter-Gather
//!
//! Runs one task per keyed item on a [`JoinSet`], bounded by a semaphore, and
//! gathers exactly one [`OperationResult`] per distinct key.
//!
//! - One item's failure never cancels its siblings.
//! - Every spawned task is joined before returning, even when some fail.
//! - If the caller's context is cancelled or its deadline passes, outstanding
//!   tasks are aborted, the set is drained, and every unfinished key gets an
//!   error result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::{OperationContext, OperationResult, OperationType, Results};
use crate::errors::{NboxError, Result};

/// Fallback bound when a caller passes zero.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

pub async fn scatter_gather<T, F, Fut>(
    ctx: &OperationContext,
    operation_name: &str,
    items: Vec<(String, T)>,
    max_concurrency: usize,
    operation: F,
) -> Results
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<OperationType>> + Send + 'static,
{
    // Later duplicates replace earlier ones; each key runs once.
    let mut unique: HashMap<String, T> = HashMap::with_capacity(items.len());
    for (key, item) in items {
        unique.insert(key, item);
    }
    let keys: Vec<String> = unique.keys().cloned().collect();
    let mut results = Results::with_capacity(keys.len());

    if ctx.is_cancelled() {
        for key in keys {
            let error = NboxError::cancelled(operation_name);
            results.insert(key.clone(), OperationResult::error(key, error));
        }
        return results;
    }

    let limit = if max_concurrency == 0 { DEFAULT_MAX_CONCURRENCY } else { max_concurrency };
    let semaphore = Arc::new(Semaphore::new(limit));
    let operation = Arc::new(operation);
    let mut tasks = JoinSet::new();

    for (key, item) in unique {
        let semaphore = Arc::clone(&semaphore);
        let operation = Arc::clone(&operation);
        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => operation(item).await,
                Err(_) => Err(NboxError::internal("concurrency limiter closed")),
            };
            (key, outcome)
        });
    }

    let mut cancelled = false;
    loop {
        let joined = if cancelled {
            tasks.join_next().await
        } else {
            tokio::select! {
                biased;
                _ = ctx.done() => {
                    warn!(operation = %operation_name, pending = tasks.len(), "Cancelling outstanding tasks");
                    tasks.abort_all();
                    cancelled = true;
                    continue;
                }
                joined = tasks.join_next() => joined,
            }
        };

        match joined {
            Some(Ok((key, outcome))) => {
                let result = match outcome {
                    Ok(action) => OperationResult { key: key.clone(), action, error: None },
                    Err(e) => OperationResult::error(key.clone(), e),
                };
                results.insert(key, result);
            }
            Some(Err(join_error)) => {
                // The key of an aborted or panicked task is filled in below.
                debug!(operation = %operation_name, error = %join_error, "Task did not complete");
            }
            None => break,
        }
    }

    for key in keys {
        if !results.contains_key(&key) {
            let error = if cancelled {
                NboxError::cancelled(operation_name)
            } else {
                NboxError::internal(format!("{} task for '{}' did not complete", operation_name, key))
            };
            results.insert(key.clone(), OperationResult::error(key, error));
        }
    }

    results
}
