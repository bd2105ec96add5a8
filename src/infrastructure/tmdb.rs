//! TMDB metadata API: response types and a small client
//!
//! Every field is optional. The API omits or nulls fields freely and the
//! structured extractor must stay total over what it declares.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{tmdb, utils};
use super::http_client::{FetchOutcome, HttpClient};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub spoken_languages: Option<Vec<SpokenLanguage>>,
    #[serde(default)]
    pub production_countries: Option<Vec<ProductionCountry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpokenLanguage {
    #[serde(default)]
    pub english_name: Option<String>,
    #[serde(default)]
    pub iso_639_1: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductionCountry {
    #[serde(default)]
    pub iso_3166_1: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseDatesResponse {
    #[serde(default)]
    pub results: Vec<CountryReleases>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryReleases {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseDate {
    #[serde(rename = "type")]
    pub release_type: u8,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub certification: Option<String>,
}

/// One physical release, flattened with its country
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhysicalRelease {
    pub country: String,
    pub date: Option<String>,
    pub note: Option<String>,
}

impl ReleaseDatesResponse {
    /// Physical (disc) releases across all countries, in response order
    pub fn physical(&self) -> Vec<PhysicalRelease> {
        self.results
            .iter()
            .flat_map(|country| {
                country
                    .release_dates
                    .iter()
                    .filter(|r| r.release_type == tmdb::RELEASE_TYPE_PHYSICAL)
                    .map(|r| PhysicalRelease {
                        country: country.iso_3166_1.clone(),
                        date: r.release_date.clone(),
                        note: r.note.clone().filter(|n| !n.is_empty()),
                    })
            })
            .collect()
    }
}

/// Client for the lookups outside the enrichment chain
pub struct TmdbClient<'a> {
    http: &'a HttpClient,
    api_base: String,
    api_key: String,
}

impl<'a> TmdbClient<'a> {
    pub fn new(http: &'a HttpClient, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    /// Top search result for a title
    pub async fn search_movie(&self, title: &str) -> Result<Option<SearchResult>> {
        let url = utils::tmdb_search_url(&self.api_base, title, &self.api_key);
        let response: SearchResponse = self.get_json(&url).await.context("TMDB search failed")?;
        debug!("TMDB search for '{}' returned {} results", title, response.results.len());
        Ok(response.results.into_iter().next())
    }

    /// Physical releases for a movie id
    pub async fn physical_releases(&self, id: u64) -> Result<Vec<PhysicalRelease>> {
        let url = utils::tmdb_release_dates_url(&self.api_base, id, &self.api_key);
        let response: ReleaseDatesResponse = self
            .get_json(&url)
            .await
            .with_context(|| format!("TMDB release dates failed for movie {id}"))?;
        let releases = response.physical();
        info!("Movie {} has {} physical releases", id, releases.len());
        Ok(releases)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        match self.http.fetch(url).await {
            FetchOutcome::Success(page) => {
                serde_json::from_str(&page.body).context("Invalid JSON from TMDB")
            }
            FetchOutcome::Blocked { status, .. } => Err(anyhow!("TMDB refused the request (HTTP {status})")),
            FetchOutcome::Failed { reason, .. } => Err(anyhow!("TMDB request failed: {reason}")),
        }
    }
}
