//! Application layer: the enrichment pipeline
//!
//! Resolution, merge and the run loop that ties them to the infrastructure.

pub mod enrichment;
pub mod merge;
pub mod resolver;

pub use enrichment::{EnrichmentError, EnrichmentService, RunSummary, run_enrich};
pub use merge::{apply_spec, mark_failed, merge};
pub use resolver::{Resolution, Strategy, StrategyResolver};
