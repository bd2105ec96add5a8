//! JSON catalog persistence
//!
//! The whole catalog is read into memory and written back as one unit. Writes
//! go to a sibling temporary file which is then renamed over the catalog, so
//! a crash mid-write leaves the previous file intact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::Catalog;

/// Timestamp format of the catalog's `updated_at`
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write catalog {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// File-backed catalog
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> CatalogResult<Catalog> {
        let content = fs::read_to_string(&self.path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CatalogError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                CatalogError::Read {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let catalog: Catalog = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: self.path.clone(),
            source,
        })?;

        info!(
            "Loaded catalog {} ({} records, {} pending)",
            self.path.display(),
            catalog.movies.len(),
            catalog.pending_count()
        );
        Ok(catalog)
    }

    /// Stamp `updated_at` and replace the catalog file
    pub async fn save(&self, catalog: &mut Catalog) -> CatalogResult<()> {
        self.save_at(catalog, Utc::now()).await
    }

    pub async fn save_at(&self, catalog: &mut Catalog, now: DateTime<Utc>) -> CatalogResult<()> {
        catalog.updated_at = Some(now.format(UPDATED_AT_FORMAT).to_string());
        let mut json = serde_json::to_string_pretty(catalog)?;
        json.push('\n');

        let tmp_path = self.temp_path();
        let write_err = |source| CatalogError::Write {
            path: tmp_path.clone(),
            source,
        };

        let mut file = fs::File::create(&tmp_path).await.map_err(write_err)?;
        file.write_all(json.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        if let Err(source) = fs::rename(&tmp_path, &self.path).await {
            // Best effort; the rename error is what matters
            let _ = fs::remove_file(&tmp_path).await;
            return Err(CatalogError::Write {
                path: self.path.clone(),
                source,
            });
        }

        debug!("Wrote catalog {} ({} bytes)", self.path.display(), json.len());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "catalog".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnrichmentStatus, MovieRecord};
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_catalog_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path().join("movies.json"));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = CatalogStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_legacy_catalog_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.json");
        std::fs::write(
            &path,
            r#"{"movies":[{"id":949,"title":"Heat","status":"enriched","enriched_at":"2024-03-01T10:00:00.123456"},{"title":"Ran","status":"on_hold"},{"title":"Alien","status":"pending_enrichment"}]}"#,
        )
        .unwrap();

        let catalog = CatalogStore::new(&path).load().await.unwrap();
        assert_eq!(catalog.movies.len(), 3);
        assert_eq!(catalog.pending_count(), 1);
        assert_eq!(
            catalog.movies[0].enriched_at.as_deref(),
            Some("2024-03-01T10:00:00.123456")
        );
    }

    #[tokio::test]
    async fn test_save_round_trips_and_stamps_updated_at() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.json");
        std::fs::write(
            &path,
            json!({
                "movies": [
                    {"id": 949, "title": "Heat", "status": "pending_enrichment", "poster_path": "/heat.jpg"}
                ],
                "updated_at": "2024-01-01T00:00:00Z",
                "owner": "shelf"
            })
            .to_string(),
        )
        .unwrap();

        let store = CatalogStore::new(&path);
        let mut catalog = store.load().await.unwrap();
        catalog.movies[0].status = Some(EnrichmentStatus::Enriched);
        catalog.movies.push(MovieRecord::pending("Alien"));

        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        store.save_at(&mut catalog, now).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["updated_at"], "2025-03-04T05:06:07Z");
        assert_eq!(written["owner"], "shelf");
        assert_eq!(written["movies"][0]["poster_path"], "/heat.jpg");
        assert_eq!(written["movies"][0]["status"], "enriched");
        assert_eq!(written["movies"][1]["title"], "Alien");
        assert!(!store.temp_path().exists());
    }
}
