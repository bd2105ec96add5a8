//! Enrichment run: select pending records, resolve, fetch, extract, merge
//!
//! Records are processed strictly one at a time in catalog order. The catalog
//! is loaded once and written back once, only if some record changed.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::merge::{mark_failed, merge};
use super::resolver::StrategyResolver;
use crate::domain::{Locator, MovieRecord};
use crate::infrastructure::catalog_store::{CatalogResult, CatalogStore};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::{FetchOutcome, HttpClient};
use crate::infrastructure::parsing::{ExtractContext, PageExtractor, SpecExtractor, StructuredExtractor};
use crate::infrastructure::search::{DuckDuckGoSearch, SearchProvider};

/// Why one record could not be enriched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("no source found for '{title}'")]
    ResolutionFailure { title: String },

    #[error("fetch blocked with HTTP {status} for {locator}")]
    FetchBlocked { status: u16, locator: String },

    #[error("fetch failed for {locator}: {reason}")]
    FetchError { locator: String, reason: String },
}

impl EnrichmentError {
    /// Whether the record is marked failed rather than left pending
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ResolutionFailure { .. } | Self::FetchBlocked { .. })
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Pending records at the start of the run
    pub pending: usize,
    pub enriched: usize,
    pub failed: usize,
    /// Transient fetch errors; left pending for the next run
    pub deferred: usize,
    /// Whether the catalog was rewritten
    pub written: bool,
}

/// One `enrich` invocation as the process sees it.
///
/// A missing credential or catalog exits 1. A run that completes exits 0,
/// whatever happened to individual records.
pub async fn run_enrich(config: &AppConfig) -> ExitCode {
    if let Err(e) = config.validate_for_enrichment() {
        error!("Cannot start enrichment: {}", e);
        return ExitCode::FAILURE;
    }

    let service = match config
        .require_catalog()
        .map_err(anyhow::Error::from)
        .and_then(|path| EnrichmentService::from_config(config, CatalogStore::new(path)))
    {
        Ok(service) => service,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match service.run().await {
        Ok(summary) => {
            info!(
                "Run complete: {} pending, {} enriched, {} failed, {} deferred, catalog {}",
                summary.pending,
                summary.enriched,
                summary.failed,
                summary.deferred,
                if summary.written { "written" } else { "unchanged" }
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

pub struct EnrichmentService {
    store: CatalogStore,
    resolver: StrategyResolver,
    http: HttpClient,
    page_extractor: PageExtractor,
    structured_extractor: StructuredExtractor,
    delay: Duration,
}

impl EnrichmentService {
    /// Service wired to the live search provider
    pub fn from_config(config: &AppConfig, store: CatalogStore) -> Result<Self> {
        let http = HttpClient::new(&config.http)?;
        let search = DuckDuckGoSearch::new(
            http.clone(),
            config.sources.search_endpoint.clone(),
            config.sources.search_max_results,
        );
        Self::new(config, store, http, Box::new(search))
    }

    pub fn new(
        config: &AppConfig,
        store: CatalogStore,
        http: HttpClient,
        search: Box<dyn SearchProvider>,
    ) -> Result<Self> {
        Ok(Self {
            store,
            resolver: StrategyResolver::new(config, http.clone(), search)?,
            http,
            page_extractor: PageExtractor::new()?,
            structured_extractor: StructuredExtractor::new(),
            delay: Duration::from_millis(config.http.request_delay_ms),
        })
    }

    /// Enrich every pending record and persist if anything changed
    pub async fn run(&self) -> CatalogResult<RunSummary> {
        let mut catalog = self.store.load().await?;
        let pending: Vec<usize> = catalog
            .movies
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_pending())
            .map(|(i, _)| i)
            .collect();

        let mut summary = RunSummary {
            pending: pending.len(),
            ..RunSummary::default()
        };
        if pending.is_empty() {
            info!("No records pending enrichment");
            return Ok(summary);
        }
        info!("Enriching {} pending records", pending.len());

        for (n, &index) in pending.iter().enumerate() {
            let record = &catalog.movies[index];
            info!("[{}/{}] {}", n + 1, pending.len(), record.title);

            let updated = match self.enrich_record(record).await {
                Ok(updated) => {
                    summary.enriched += 1;
                    updated
                }
                Err(e) if e.is_terminal() => {
                    warn!("Marking '{}' failed: {}", record.title, e);
                    summary.failed += 1;
                    mark_failed(record)
                }
                Err(e) => {
                    warn!("Leaving '{}' pending: {}", record.title, e);
                    summary.deferred += 1;
                    record.clone()
                }
            };
            catalog.movies[index] = updated;

            if n + 1 < pending.len() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        if summary.enriched + summary.failed > 0 {
            self.store.save(&mut catalog).await?;
            summary.written = true;
            info!("Catalog updated: {}", self.store.path().display());
        } else {
            info!("No record changed; catalog left as is");
        }

        Ok(summary)
    }

    /// Resolve, fetch, extract and merge one record
    pub async fn enrich_record(&self, record: &MovieRecord) -> Result<MovieRecord, EnrichmentError> {
        let resolution = self
            .resolver
            .resolve(record)
            .await
            .ok_or_else(|| EnrichmentError::ResolutionFailure {
                title: record.title.clone(),
            })?;
        let locator = resolution.locator;

        let page = match self.http.fetch(locator.url()).await {
            FetchOutcome::Success(page) => page,
            FetchOutcome::Blocked { status, .. } => {
                return Err(EnrichmentError::FetchBlocked {
                    status,
                    locator: locator.to_string(),
                });
            }
            FetchOutcome::Failed { reason, .. } => {
                return Err(EnrichmentError::FetchError {
                    locator: locator.to_string(),
                    reason,
                });
            }
        };

        let spec = self.extractor_for(&locator).extract(
            &page.body,
            &ExtractContext::new(locator.to_string(), record.title.clone()),
        );
        info!(
            "Enriched '{}' from {} with {:?}",
            record.title,
            locator,
            spec.field_names()
        );

        Ok(merge(record, &spec, &locator, Utc::now()))
    }

    fn extractor_for(&self, locator: &Locator) -> &dyn SpecExtractor {
        if locator.is_structured() {
            &self.structured_extractor
        } else {
            &self.page_extractor
        }
    }
}
