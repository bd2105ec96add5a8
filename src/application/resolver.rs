//! Strategy Resolver: record -> source locator
//!
//! Strategies run in a fixed order and the first one that yields a locator
//! wins:
//! 1. direct TMDB id
//! 2. a source address already on the record
//! 3. site-scoped query through the general search provider
//! 4. the retailer site's own search, UPC first, then title
//!
//! A strategy that errors is logged and skipped; exhausting the chain yields
//! `None`.

use std::fmt;

use anyhow::{Result, anyhow};
use scraper::Html;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{Locator, MovieRecord};
use crate::infrastructure::config::{AppConfig, SourcesConfig, utils};
use crate::infrastructure::http_client::{FetchOutcome, HttpClient};
use crate::infrastructure::parsing::links::{is_movie_page, pick_candidate};
use crate::infrastructure::parsing::{PageReader, ParsingConfig};
use crate::infrastructure::search::SearchProvider;

/// Extra-field key older catalogs used for a stored retailer link
const LEGACY_URL_KEY: &str = "bluray_url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectId,
    Passthrough,
    ScopedSearch,
    SiteSearch,
}

impl Strategy {
    /// Canonical order
    pub const ORDER: [Self; 4] = [
        Self::DirectId,
        Self::Passthrough,
        Self::ScopedSearch,
        Self::SiteSearch,
    ];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DirectId => "direct-id",
            Self::Passthrough => "passthrough",
            Self::ScopedSearch => "scoped-search",
            Self::SiteSearch => "site-search",
        };
        f.write_str(s)
    }
}

/// A locator plus the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub locator: Locator,
    pub strategy: Strategy,
}

pub struct StrategyResolver {
    http: HttpClient,
    search: Box<dyn SearchProvider>,
    reader: PageReader,
    sources: SourcesConfig,
    api_key: String,
    site_host: String,
    movie_path_marker: String,
}

impl StrategyResolver {
    pub fn new(config: &AppConfig, http: HttpClient, search: Box<dyn SearchProvider>) -> Result<Self> {
        let parsing = ParsingConfig::default();
        Ok(Self {
            http,
            search,
            reader: PageReader::with_config(&parsing)?,
            api_key: config.require_api_key()?.to_string(),
            site_host: utils::site_host(&config.sources.site_base),
            sources: config.sources.clone(),
            movie_path_marker: parsing.movie_path_marker,
        })
    }

    /// Walk the strategy chain for one record
    pub async fn resolve(&self, record: &MovieRecord) -> Option<Resolution> {
        for strategy in Strategy::ORDER {
            match self.try_strategy(strategy, record).await {
                Ok(Some(locator)) => {
                    info!("Resolved '{}' via {}: {}", record.title, strategy, locator);
                    return Some(Resolution { locator, strategy });
                }
                Ok(None) => debug!("Strategy {} found nothing for '{}'", strategy, record.title),
                Err(e) => warn!("Strategy {} failed for '{}': {:#}", strategy, record.title, e),
            }
        }

        warn!("No source found for '{}' after {} strategies", record.title, Strategy::ORDER.len());
        None
    }

    pub async fn try_strategy(&self, strategy: Strategy, record: &MovieRecord) -> Result<Option<Locator>> {
        match strategy {
            Strategy::DirectId => Ok(self.direct_id(record)),
            Strategy::Passthrough => Ok(passthrough(record)),
            Strategy::ScopedSearch => self.scoped_search(record).await,
            Strategy::SiteSearch => self.site_search(record).await,
        }
    }

    fn direct_id(&self, record: &MovieRecord) -> Option<Locator> {
        let tmdb_id = record.external_id()?;
        Some(Locator::Structured {
            url: utils::tmdb_movie_url(&self.sources.tmdb_api_base, tmdb_id, &self.api_key),
            tmdb_id,
        })
    }

    async fn scoped_search(&self, record: &MovieRecord) -> Result<Option<Locator>> {
        let title = record.clean_title();
        if title.is_empty() {
            return Ok(None);
        }

        let query = utils::scoped_query(&self.sources.site_base, title);
        let candidates = self.search.search(&query).await?;
        debug!(
            "{} returned {} candidates for '{}'",
            self.search.name(),
            candidates.len(),
            query
        );

        Ok(pick_candidate(&candidates, title, &self.site_host, &self.movie_path_marker)
            .map(|c| Locator::page(c.url.clone())))
    }

    async fn site_search(&self, record: &MovieRecord) -> Result<Option<Locator>> {
        let title = record.clean_title();
        let keywords: Vec<&str> = record
            .upc
            .as_deref()
            .map(str::trim)
            .into_iter()
            .chain(std::iter::once(title))
            .filter(|k| !k.is_empty())
            .collect();

        let mut last_error = None;
        for keyword in keywords {
            match self.site_search_keyword(keyword, title).await {
                Ok(Some(locator)) => return Ok(Some(locator)),
                Ok(None) => {}
                Err(e) => {
                    warn!("Site search for '{}' failed: {:#}", keyword, e);
                    last_error = Some(e);
                }
            }
        }

        last_error.map_or(Ok(None), Err)
    }

    async fn site_search_keyword(&self, keyword: &str, title: &str) -> Result<Option<Locator>> {
        let url = utils::site_search_url(&self.sources.site_base, keyword);
        let page = match self.http.fetch(&url).await {
            FetchOutcome::Success(page) => page,
            FetchOutcome::Blocked { status, .. } => {
                return Err(anyhow!("site search blocked (HTTP {status})"));
            }
            FetchOutcome::Failed { reason, .. } => return Err(anyhow!("site search failed: {reason}")),
        };

        // Single-hit searches redirect straight to the movie page
        if is_movie_page(&page.final_url, &self.site_host, &self.movie_path_marker) {
            return Ok(Some(Locator::page(page.final_url)));
        }

        let anchors = {
            let html = Html::parse_document(&page.body);
            self.reader.anchors(&html, &page.final_url)
        };
        Ok(pick_candidate(&anchors, title, &self.site_host, &self.movie_path_marker)
            .map(|c| Locator::page(c.url.clone())))
    }
}

/// Source address already present on the record
fn passthrough(record: &MovieRecord) -> Option<Locator> {
    let legacy = record.extra.get(LEGACY_URL_KEY).and_then(Value::as_str);
    record
        .source_url
        .as_deref()
        .into_iter()
        .chain(legacy)
        .chain(std::iter::once(record.title.trim()))
        .find(|candidate| is_http_url(candidate))
        .map(Locator::page)
}

fn is_http_url(s: &str) -> bool {
    Url::parse(s).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}
