//! Batched per-entity fetching.
//!
//! Sub-collections live under each patient, so they can only be read one
//! patient at a time. Reads are issued in fixed-size batches with a pause
//! between batches to stay under the backend's request quota.

use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::progress::{ProgressReporter, ProgressSpan, ProgressStep};
use crate::store::StoreResult;

pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(100);

/// How per-entity reads are chunked and throttled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    /// Reads in flight per batch
    pub batch_size: usize,
    /// Pause between consecutive batches
    pub delay: Duration,
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay: DEFAULT_BATCH_DELAY,
        }
    }
}

/// Result of reading one entity's sub-collection.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fetched(Vec<T>),
    Failed { error: String },
}

impl<T> FetchOutcome<T> {
    /// Records read; empty when the fetch failed.
    pub fn records(&self) -> &[T] {
        match self {
            FetchOutcome::Fetched(records) => records,
            FetchOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

/// Outcomes keyed by entity id.
pub type FetchResults<T> = HashMap<String, FetchOutcome<T>>;

/// Fetch a sub-resource for every id, `plan.batch_size` at a time.
///
/// Progress is reported after each batch, scaled into `span`. A failed read
/// never aborts the pass; it is recorded as [`FetchOutcome::Failed`].
pub async fn fetch_in_batches<T, F, Fut>(
    ids: &[String],
    fetch: F,
    plan: &BatchPlan,
    progress: &ProgressReporter<'_>,
    step: ProgressStep,
    span: ProgressSpan,
) -> FetchResults<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = StoreResult<Vec<T>>>,
{
    let total = ids.len();
    let mut results = HashMap::with_capacity(total);

    if total == 0 {
        progress.report(step, span.at(0, 0), format!("No {} to load", step.label()));
        return results;
    }

    let batch_size = plan.batch_size.max(1);
    let batch_count = total.div_ceil(batch_size);
    let mut done = 0;

    for (index, chunk) in ids.chunks(batch_size).enumerate() {
        let outcomes = join_all(chunk.iter().map(|id| fetch(id.clone()))).await;

        for (id, outcome) in chunk.iter().zip(outcomes) {
            let outcome = match outcome {
                Ok(records) => FetchOutcome::Fetched(records),
                Err(e) => {
                    warn!(entity = %id, step = step.label(), "Fetch failed, counting as empty: {}", e);
                    FetchOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.insert(id.clone(), outcome);
        }

        done += chunk.len();
        debug!(batch = index + 1, batch_count, done, total, step = step.label(), "Batch complete");
        progress.report(
            step,
            span.at(done, total),
            format!("Loading {}: {}/{}", step.label(), done, total),
        );

        if index + 1 < batch_count && !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }
    }

    results
}
