//! Spec extraction from fetched content
//!
//! Two modes share one trait: structured documents from the metadata API and
//! unstructured retailer pages. Extraction never fails outright; anything it
//! cannot find is simply absent from the returned [`SpecMap`].

pub mod config;
pub mod context;
pub mod document;
pub mod links;
pub mod page_extractor;
pub mod rules;
pub mod structured_extractor;

pub use config::ParsingConfig;
pub use context::ExtractContext;
pub use document::PageReader;
pub use links::{LinkCandidate, pick_candidate};
pub use page_extractor::{PageDiagnostic, PageExtractor};
pub use rules::{ExtractionRule, RuleSet, apply_rules};
pub use structured_extractor::StructuredExtractor;

use crate::domain::SpecMap;

/// Converts a fetched body into a partial spec mapping
///
/// Implementations work on `&str` and build any parsed document internally,
/// since `scraper::Html` must not be held across an await.
pub trait SpecExtractor {
    fn extract(&self, body: &str, context: &ExtractContext) -> SpecMap;
}
