use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorKind, UnderDocError};
use crate::expense::ExpenseData;
use crate::image::ImageReference;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BatchExecutionMode {
    /// One item at a time, in input order.
    Sequential,
    /// All items dispatched to a bounded worker pool; completion order.
    #[default]
    Parallel,
}

impl fmt::Display for BatchExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Parallel => f.write_str("parallel"),
        }
    }
}

impl FromStr for BatchExecutionMode {
    type Err = UnderDocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(UnderDocError::Config(format!(
                "unknown batch execution mode '{other}'"
            ))),
        }
    }
}

/// What the aggregator does with items that failed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log and discard failed items; the report only lists successes.
    Drop,
    /// Keep a failure record per failed item in the report.
    #[default]
    Surface,
    /// Fail the whole batch if any item failed.
    FailBatch,
}

impl FromStr for FailurePolicy {
    type Err = UnderDocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "surface" => Ok(Self::Surface),
            "fail" | "fail_batch" | "fail-batch" => Ok(Self::FailBatch),
            other => Err(UnderDocError::Config(format!("unknown failure policy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&UnderDocError> for ItemFailure {
    fn from(err: &UnderDocError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Extracted(ExpenseData),
    Failed(ItemFailure),
}

/// The result of one batch item, owned by the worker that produced it until
/// it is handed back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItemOutcome {
    pub source: ImageReference,
    pub outcome: ItemOutcome,
}

impl BatchItemOutcome {
    pub fn extracted(source: ImageReference, data: ExpenseData) -> Self {
        Self {
            source,
            outcome: ItemOutcome::Extracted(data),
        }
    }

    pub fn failed(source: ImageReference, err: &UnderDocError) -> Self {
        Self {
            source,
            outcome: ItemOutcome::Failed(err.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Extracted(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseDataWithSource {
    pub source: ImageReference,
    pub source_file_name: String,
    pub expense_data: ExpenseData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchFailure {
    pub source: ImageReference,
    pub source_file_name: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Final result of one batch call. Built once, immutable after return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub mode: BatchExecutionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of references enumerated for the batch.
    pub total: usize,
    pub expense_data_list: Vec<ExpenseDataWithSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.expense_data_list.len()
    }

    /// Items that did not make it into `expense_data_list`, whether or not
    /// their failure records were kept.
    pub fn failed(&self) -> usize {
        self.total.saturating_sub(self.succeeded())
    }

    pub fn is_empty(&self) -> bool {
        self.expense_data_list.is_empty()
    }
}
