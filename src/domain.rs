//! Domain module - catalog records, locators and extracted specs
//!
//! Pure data. Nothing in here performs I/O.

pub mod locator;
pub mod movie;
pub mod spec_map;

pub use locator::Locator;
pub use movie::{Catalog, EnrichmentStatus, MovieRecord, clean_title};
pub use spec_map::{SpecField, SpecMap, SpecValue};
