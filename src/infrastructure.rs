//! Infrastructure layer: configuration, logging, HTTP, external sources,
//! catalog persistence and the parsing layer

pub mod catalog_store;
pub mod config; // Configuration constants and helpers
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod search;
pub mod tmdb;

// Re-export commonly used items
pub use catalog_store::{CatalogError, CatalogStore};
pub use config::{AppConfig, ConfigError, ConfigManager};
pub use http_client::{FetchOutcome, FetchedPage, HttpClient};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{PageExtractor, SpecExtractor, StructuredExtractor};
pub use parsing_error::{ParsingError, ParsingResult};
pub use search::{DuckDuckGoSearch, SearchProvider, StaticSearch};
pub use tmdb::TmdbClient;
