use chrono::{DateTime, Utc};
use uuid::Uuid;

use underdoc_core::batch::{
    BatchExecutionMode, BatchFailure, BatchItemOutcome, BatchReport, ExpenseDataWithSource,
    FailurePolicy, ItemOutcome,
};
use underdoc_core::error::{Result, UnderDocError};

/// Bookkeeping the orchestrator collected for one batch call.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub batch_id: Uuid,
    pub mode: BatchExecutionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
}

/// Fold per-item outcomes into the final report.
///
/// Outcomes keep the order they arrive in; nothing is deduplicated or sorted.
/// Failed items are dropped, recorded, or fail the batch according to `policy`.
pub fn aggregate(
    outcomes: Vec<BatchItemOutcome>,
    policy: FailurePolicy,
    context: BatchContext,
) -> Result<BatchReport> {
    let mut expense_data_list = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for BatchItemOutcome { source, outcome } in outcomes {
        let source_file_name = source.to_string();
        match outcome {
            ItemOutcome::Extracted(expense_data) => {
                expense_data_list.push(ExpenseDataWithSource {
                    source,
                    source_file_name,
                    expense_data,
                });
            }
            ItemOutcome::Failed(failure) => failures.push(BatchFailure {
                source,
                source_file_name,
                kind: failure.kind,
                message: failure.message,
            }),
        }
    }

    match policy {
        FailurePolicy::Drop => failures.clear(),
        FailurePolicy::Surface => {}
        FailurePolicy::FailBatch => {
            if let Some(first) = failures.first() {
                return Err(UnderDocError::BatchFailed {
                    failed: failures.len(),
                    total: context.total,
                    first_error: format!("{}: {}", first.source_file_name, first.message),
                });
            }
        }
    }

    Ok(BatchReport {
        batch_id: context.batch_id,
        mode: context.mode,
        started_at: context.started_at,
        finished_at: context.finished_at,
        total: context.total,
        expense_data_list,
        failures,
    })
}
