mod aggregator;
mod orchestrator;

pub use aggregator::{aggregate, BatchContext};
pub use orchestrator::BatchOrchestrator;
