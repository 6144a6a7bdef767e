use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use underdoc_core::batch::{BatchExecutionMode, BatchItemOutcome, BatchReport, FailurePolicy};
use underdoc_core::config::DEFAULT_MAX_CONCURRENCY;
use underdoc_core::error::{Result, UnderDocError};
use underdoc_core::extractor::Extractor;
use underdoc_core::image::ImageReference;
use underdoc_sources::{BatchSource, ObjectStoreSource};

use crate::aggregator::{aggregate, BatchContext};

/// Runs single-image extractions over a collection of references and
/// aggregates what comes back.
///
/// Parallel batches get their own worker pool, sized by `max_concurrency` and
/// torn down before [`BatchOrchestrator::extract_batch`] returns.
#[derive(Clone)]
pub struct BatchOrchestrator {
    extractor: Arc<dyn Extractor>,
    max_concurrency: usize,
    policy: FailurePolicy,
}

impl BatchOrchestrator {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self {
            extractor,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Enumerate `source` up front, then extract every reference it yields.
    pub async fn run(
        &self,
        source: &BatchSource,
        objects: &ObjectStoreSource,
        mode: BatchExecutionMode,
    ) -> Result<BatchReport> {
        info!(source = %source, mode = %mode, "Extracting expense data");
        let references = source.enumerate(objects).await?;
        self.extract_batch(references, mode).await
    }

    pub async fn extract_batch(
        &self,
        references: Vec<ImageReference>,
        mode: BatchExecutionMode,
    ) -> Result<BatchReport> {
        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = references.len();

        info!(batch_id = %batch_id, mode = %mode, count = total, "Starting batch extraction");

        let outcomes = match mode {
            BatchExecutionMode::Sequential => self.run_sequential(references).await,
            BatchExecutionMode::Parallel => self.run_parallel(references).await,
        };

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            warn!(
                batch_id = %batch_id,
                succeeded = total.saturating_sub(failed),
                failed = failed,
                policy = ?self.policy,
                "Batch extraction completed with partial failures"
            );
        } else {
            info!(batch_id = %batch_id, count = total, "Batch extraction completed successfully");
        }

        let context = BatchContext {
            batch_id,
            mode,
            started_at,
            finished_at: Utc::now(),
            total,
        };
        aggregate(outcomes, self.policy, context)
    }

    async fn run_sequential(&self, references: Vec<ImageReference>) -> Vec<BatchItemOutcome> {
        let mut outcomes = Vec::with_capacity(references.len());

        for (i, reference) in references.into_iter().enumerate() {
            let outcome = match self.extractor.extract_in_batch(&reference).await {
                Ok(response) => BatchItemOutcome::extracted(reference, response.receipt_data),
                Err(e) => {
                    error!(index = i, source = %reference, error = %e, "Extraction failed for batch item");
                    BatchItemOutcome::failed(reference, &e)
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn run_parallel(&self, references: Vec<ImageReference>) -> Vec<BatchItemOutcome> {
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();
        let mut pending = HashMap::with_capacity(references.len());

        for reference in references {
            let extractor = self.extractor.clone();
            let permits = permits.clone();
            let task_reference = reference.clone();

            let handle = join_set.spawn(async move {
                let reference = task_reference;
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let err = UnderDocError::Worker(format!("worker pool closed: {e}"));
                        return BatchItemOutcome::failed(reference, &err);
                    }
                };

                match extractor.extract_in_batch(&reference).await {
                    Ok(response) => BatchItemOutcome::extracted(reference, response.receipt_data),
                    Err(e) => {
                        error!(source = %reference, error = %e, "Extraction failed for batch item");
                        BatchItemOutcome::failed(reference, &e)
                    }
                }
            });
            pending.insert(handle.id(), reference);
        }

        let mut outcomes = Vec::with_capacity(pending.len());

        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    pending.remove(&id);
                    outcomes.push(outcome);
                }
                Err(join_err) => {
                    error!(error = %join_err, "Batch worker task panicked");
                    if let Some(reference) = pending.remove(&join_err.id()) {
                        let err = UnderDocError::Worker(join_err.to_string());
                        outcomes.push(BatchItemOutcome::failed(reference, &err));
                    }
                }
            }
        }

        outcomes
    }
}
