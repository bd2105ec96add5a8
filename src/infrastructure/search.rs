//! General web search provider
//!
//! The resolver only needs ranked candidate links for a query, so the provider
//! sits behind a trait and tests swap in canned results.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use scraper::Html;
use tracing::debug;

use super::config::utils::urlencode;
use super::http_client::{FetchOutcome, HttpClient};
use super::parsing::{LinkCandidate, PageReader};

/// Ranked candidate links for a free-text query
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Name for log lines
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<LinkCandidate>>;
}

/// DuckDuckGo's HTML results page
pub struct DuckDuckGoSearch {
    http: HttpClient,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(http: HttpClient, endpoint: impl Into<String>, max_results: usize) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            max_results,
        }
    }

    fn query_url(&self, query: &str) -> String {
        format!("{}?q={}", self.endpoint, urlencode(query))
    }

    fn parse_results(&self, body: &str, base_url: &str) -> Result<Vec<LinkCandidate>> {
        let reader = PageReader::new()?;
        let html = Html::parse_document(body);
        let mut links = reader.search_result_links(&html, base_url);
        links.truncate(self.max_results);
        Ok(links)
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<Vec<LinkCandidate>> {
        let url = self.query_url(query);
        let page = match self.http.fetch(&url).await {
            FetchOutcome::Success(page) => page,
            FetchOutcome::Blocked { status, .. } => {
                return Err(anyhow!("search provider refused the query (HTTP {status})"));
            }
            FetchOutcome::Failed { reason, .. } => {
                return Err(anyhow!("search request failed: {reason}"));
            }
        };

        let links = self.parse_results(&page.body, &page.final_url)?;
        debug!("Search '{}' returned {} candidates", query, links.len());
        Ok(links)
    }
}

/// Provider with fixed results, for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSearch {
    pub results: Vec<LinkCandidate>,
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _query: &str) -> Result<Vec<LinkCandidate>> {
        Ok(self.results.clone())
    }
}
