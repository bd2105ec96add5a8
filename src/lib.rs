//! Media Spec Enricher - technical specs for a physical-media catalog
//!
//! Pending catalog records are resolved to a source (the TMDB API or a
//! retailer page), fetched, run through the spec extractors and merged back
//! into the catalog file.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{EnrichmentError, EnrichmentService, RunSummary, run_enrich};
pub use domain::{Catalog, EnrichmentStatus, Locator, MovieRecord, SpecField, SpecMap, SpecValue};
pub use infrastructure::{AppConfig, CatalogError, CatalogStore, ConfigError, ConfigManager};
