pub mod batch;
pub mod config;
pub mod error;
pub mod expense;
pub mod extractor;
pub mod image;
pub mod resolver;

pub use batch::{
    BatchExecutionMode, BatchFailure, BatchItemOutcome, BatchReport, ExpenseDataWithSource,
    FailurePolicy, ItemFailure, ItemOutcome,
};
pub use config::ClientConfig;
pub use error::{ErrorKind, Result, UnderDocError};
pub use expense::{
    Expense, ExpenseData, ExpenseImageType, ExpenseItem, ExtractionRequest, ExtractionResponse,
};
pub use extractor::Extractor;
pub use image::{infer_format, ImageFormat, ImageReference, ObjectLocator};
pub use resolver::{ImageResolver, ResolvedImage};
