//! Configuration infrastructure
//!
//! Settings are assembled once at startup from three tiers, lowest precedence
//! first:
//! 1. Compiled defaults (the [`defaults`] module)
//! 2. An optional JSON config file
//! 3. Process environment (credential, catalog location, delay override)
//!
//! The resulting [`AppConfig`] is passed by reference into the pipeline;
//! components never read the environment themselves.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// Environment variable names
pub mod env_keys {
    pub const TMDB_API_KEY: &str = "TMDB_API_KEY";
    pub const CATALOG_PATH: &str = "CATALOG_PATH";
    pub const GITHUB_WORKSPACE: &str = "GITHUB_WORKSPACE";
    pub const REQUEST_DELAY_MS: &str = "ENRICH_REQUEST_DELAY_MS";
}

/// Fatal configuration problems; any of these aborts before a record is touched
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required credential {name} is not set")]
    MissingCredential { name: &'static str },

    #[error("catalog file not found: {}", path.display())]
    CatalogNotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Outbound request behaviour
    pub http: HttpConfig,

    /// Base URLs of the remote sources
    pub sources: SourcesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Catalog location; resolved from the environment when not set in the file
    pub catalog_path: Option<PathBuf>,

    /// Metadata API key. Only ever read from the environment.
    #[serde(skip)]
    pub tmdb_api_key: Option<String>,
}

/// HTTP behaviour shared by every outbound request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,

    /// Fixed per-request timeout; never adapted or retried
    pub timeout_seconds: u64,

    /// Politeness delay after each record that touched the network
    pub request_delay_ms: u64,
}

/// Remote source locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Structured metadata API root, e.g. `https://api.themoviedb.org/3`
    pub tmdb_api_base: String,

    /// Retailer site root, e.g. `https://www.blu-ray.com`
    pub site_base: String,

    /// General search provider HTML endpoint
    pub search_endpoint: String,

    /// Maximum candidates taken from the general search provider
    pub search_max_results: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// JSON formatted file output
    pub json_format: bool,

    /// Console output (stderr)
    pub console_output: bool,

    /// File output under `log_dir`
    pub file_output: bool,

    /// Directory for log files; defaults to `./logs`
    pub log_dir: Option<PathBuf>,

    pub file_name: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            accept: defaults::ACCEPT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            referer: defaults::REFERER.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            tmdb_api_base: tmdb::API_BASE.to_string(),
            site_base: bluray_com::BASE_URL.to_string(),
            search_endpoint: duckduckgo::HTML_ENDPOINT.to_string(),
            search_max_results: defaults::SEARCH_MAX_RESULTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

impl AppConfig {
    /// Layer environment values over whatever the file provided.
    ///
    /// `lookup` stands in for `std::env::var` so tests can feed a fixed map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(env_keys::TMDB_API_KEY) {
            self.tmdb_api_key = Some(key);
        }

        if let Some(path) = non_empty(env_keys::CATALOG_PATH) {
            self.catalog_path = Some(PathBuf::from(path));
        } else if self.catalog_path.is_none() {
            let workspace = non_empty(env_keys::GITHUB_WORKSPACE).unwrap_or_else(|| ".".to_string());
            self.catalog_path = Some(Path::new(&workspace).join(defaults::CATALOG_FILE_NAME));
        }

        if let Some(raw) = non_empty(env_keys::REQUEST_DELAY_MS) {
            self.http.request_delay_ms =
                raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    field: env_keys::REQUEST_DELAY_MS,
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// The metadata API key, or the error that aborts the run
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential {
                name: env_keys::TMDB_API_KEY,
            })
    }

    /// The catalog path, which must point at an existing file
    pub fn require_catalog(&self) -> Result<&Path, ConfigError> {
        let path = self
            .catalog_path
            .as_deref()
            .unwrap_or_else(|| Path::new(defaults::CATALOG_FILE_NAME));
        if path.is_file() {
            Ok(path)
        } else {
            Err(ConfigError::CatalogNotFound {
                path: path.to_path_buf(),
            })
        }
    }

    /// Check everything an enrichment run needs
    pub fn validate_for_enrichment(&self) -> Result<(), ConfigError> {
        self.require_api_key()?;
        self.require_catalog()?;
        if self.sources.search_max_results == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sources.search_max_results",
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration manager for locating and loading the optional config file
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Per-user configuration directory
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR_NAME))
    }

    /// Manager for an explicit path, or for the per-user default location
    pub fn new(explicit: Option<PathBuf>) -> Self {
        let config_path = explicit.unwrap_or_else(|| {
            Self::get_config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(defaults::CONFIG_FILE_NAME)
        });
        Self { config_path }
    }

    /// Load the file if present; a missing file yields defaults
    pub async fn load_config(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_path.exists() {
            info!("No config file at {:?}, using defaults", self.config_path);
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.config_path.clone(),
                source,
            })?;

        let config = serde_json::from_str::<AppConfig>(&content).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Load the file, then apply the process environment
    pub async fn load_with_env(&self) -> Result<AppConfig, ConfigError> {
        let mut config = self.load_config().await?;
        config.apply_env(|key| std::env::var(key).ok())?;
        if config.http.request_delay_ms == 0 {
            warn!("Politeness delay disabled; requests will be sent back to back");
        }
        Ok(config)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// TMDB (structured metadata API) constants
pub mod tmdb {
    pub const API_BASE: &str = "https://api.themoviedb.org/3";

    /// Release type code for physical media in the release_dates payload
    pub const RELEASE_TYPE_PHYSICAL: u8 = 5;
}

/// Retailer site constants
pub mod bluray_com {
    pub const BASE_URL: &str = "https://www.blu-ray.com";

    /// Path segment every movie detail page carries
    pub const MOVIE_PATH_MARKER: &str = "/movies/";

    /// Section searched by the site-internal quick search
    pub const SEARCH_SECTION: &str = "bluraymovies";
}

/// General search provider constants
pub mod duckduckgo {
    pub const HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "media-spec-enricher";
    pub const CONFIG_FILE_NAME: &str = "config.json";
    pub const CATALOG_FILE_NAME: &str = "movies.json";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
    pub const REFERER: &str = "https://www.google.com/";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default delay between records in milliseconds
    pub const REQUEST_DELAY_MS: u64 = 2000;

    pub const SEARCH_MAX_RESULTS: usize = 5;

    /// Visible text shorter than this suggests a block page or an empty shell
    pub const MIN_VISIBLE_TEXT_LEN: usize = 500;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_NAME: &str = "enricher.log";
}

/// URL building helper functions
pub mod utils {
    use super::bluray_com;
    use url::Url;

    /// Movie details endpoint for a numeric id
    pub fn tmdb_movie_url(api_base: &str, id: u64, api_key: &str) -> String {
        format!(
            "{}/movie/{}?api_key={}",
            api_base.trim_end_matches('/'),
            id,
            urlencode(api_key)
        )
    }

    /// Title search endpoint
    pub fn tmdb_search_url(api_base: &str, query: &str, api_key: &str) -> String {
        format!(
            "{}/search/movie?api_key={}&query={}",
            api_base.trim_end_matches('/'),
            urlencode(api_key),
            urlencode(query)
        )
    }

    /// Release dates endpoint for a numeric id
    pub fn tmdb_release_dates_url(api_base: &str, id: u64, api_key: &str) -> String {
        format!(
            "{}/movie/{}/release_dates?api_key={}",
            api_base.trim_end_matches('/'),
            id,
            urlencode(api_key)
        )
    }

    /// Site-internal quick search URL
    pub fn site_search_url(site_base: &str, keyword: &str) -> String {
        format!(
            "{}/search/?quicksearch=1&quicksearch_keyword={}&section={}",
            site_base.trim_end_matches('/'),
            urlencode(keyword),
            bluray_com::SEARCH_SECTION
        )
    }

    /// Site-scoped query for the general search provider
    pub fn scoped_query(site_base: &str, title: &str) -> String {
        format!("site:{} {} blu-ray specs", site_host(site_base), title)
    }

    /// Host part of a base URL, without a leading `www.`
    pub fn site_host(site_base: &str) -> String {
        Url::parse(site_base)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .map_or_else(
                || site_base.to_string(),
                |h| h.trim_start_matches("www.").to_string(),
            )
    }

    /// Resolve a possibly relative href against a base URL
    pub fn resolve_url(base: &str, href: &str) -> Option<String> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Some(href.to_string());
        }
        let base = Url::parse(base).ok()?;
        base.join(href).ok().map(String::from)
    }

    pub fn urlencode(s: &str) -> String {
        url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let mut config = AppConfig::default();
        config.apply_env(lookup(&[])).unwrap();

        let err = config.require_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { name: "TMDB_API_KEY" }));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let mut config = AppConfig::default();
        config.apply_env(lookup(&[("TMDB_API_KEY", "  ")])).unwrap();
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_catalog_path_from_workspace() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[("GITHUB_WORKSPACE", "/srv/repo")]))
            .unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("/srv/repo/movies.json")));
    }

    #[test]
    fn test_explicit_catalog_path_wins() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[
                ("GITHUB_WORKSPACE", "/srv/repo"),
                ("CATALOG_PATH", "/data/catalog.json"),
            ]))
            .unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("/data/catalog.json")));
    }

    #[test]
    fn test_missing_catalog_file_is_config_error() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[
                ("TMDB_API_KEY", "k"),
                ("CATALOG_PATH", "/definitely/not/here/movies.json"),
            ]))
            .unwrap();
        assert!(matches!(
            config.validate_for_enrichment(),
            Err(ConfigError::CatalogNotFound { .. })
        ));
    }

    #[test]
    fn test_bad_delay_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(lookup(&[("ENRICH_REQUEST_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"http": {"timeout_seconds": 5}}"#).unwrap();
        assert_eq!(config.http.timeout_seconds, 5);
        assert_eq!(config.http.request_delay_ms, defaults::REQUEST_DELAY_MS);
        assert_eq!(config.sources.site_base, bluray_com::BASE_URL);
    }

    #[test]
    fn test_url_builders() {
        assert_eq!(
            utils::tmdb_movie_url("https://api.themoviedb.org/3/", 603, "k"),
            "https://api.themoviedb.org/3/movie/603?api_key=k"
        );
        assert_eq!(
            utils::site_search_url("https://www.blu-ray.com", "Heat 1995"),
            "https://www.blu-ray.com/search/?quicksearch=1&quicksearch_keyword=Heat+1995&section=bluraymovies"
        );
        assert_eq!(
            utils::scoped_query("https://www.blu-ray.com", "Heat"),
            "site:blu-ray.com Heat blu-ray specs"
        );
        assert_eq!(
            utils::resolve_url("https://www.blu-ray.com/search/?q=1", "/movies/Heat/2398/").as_deref(),
            Some("https://www.blu-ray.com/movies/Heat/2398/")
        );
    }

    #[tokio::test]
    async fn test_missing_config_file_yields_defaults() {
        let manager = ConfigManager::new(Some(PathBuf::from("/no/such/config.json")));
        let config = manager.load_config().await.unwrap();
        assert_eq!(config.logging.level, defaults::LOG_LEVEL);
    }
}
