//! Catalog records and their enrichment lifecycle
//!
//! A record is created elsewhere with `status = pending_enrichment` and is
//! only ever mutated by the merge step. Fields this crate does not know about
//! are carried in `extra` so a rewrite of the catalog never drops them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Where a record sits in the enrichment lifecycle
///
/// Status strings written by other tools are kept verbatim in `Other` and are
/// never picked up for enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    PendingEnrichment,
    Enriched,
    FailedEnrichment,
    #[serde(untagged)]
    Other(String),
}

impl EnrichmentStatus {
    /// Whether moving from `self` to `next` is an allowed transition.
    ///
    /// Only `pending_enrichment` may move, and only forward.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingEnrichment, Self::Enriched | Self::FailedEnrichment)
        )
    }
}

impl fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PendingEnrichment => "pending_enrichment",
            Self::Enriched => "enriched",
            Self::FailedEnrichment => "failed_enrichment",
            Self::Other(raw) => raw.as_str(),
        };
        f.write_str(s)
    }
}

/// One catalog entry for a single media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Opaque identifier. Records added from the scanner carry the TMDB id here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EnrichmentStatus>,

    /// Barcode the record was scanned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_tracks: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_countries: Option<Vec<String>>,

    /// Provenance: the page or endpoint the specs came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// When the record was enriched. Kept as written: older catalogs carry
    /// naive ISO stamps without an offset, new stamps are RFC 3339 UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_at: Option<String>,

    /// Unknown keys, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieRecord {
    /// Create a pending record with only a title
    pub fn pending(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            status: Some(EnrichmentStatus::PendingEnrichment),
            upc: None,
            runtime: None,
            audio: None,
            audio_tracks: None,
            region: None,
            packaging: None,
            disc_count: None,
            production_countries: None,
            source_url: None,
            enriched_at: None,
            extra: Map::new(),
        }
    }

    /// Set the opaque id (builder style, mostly for tests and fixtures)
    pub fn with_id(mut self, id: Value) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == Some(EnrichmentStatus::PendingEnrichment)
    }

    /// The numeric TMDB id, when the opaque id is one
    pub fn external_id(&self) -> Option<u64> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Title with scanner noise removed: everything from the first `[` or `(` on
    /// is dropped ("Heat [Blu-ray] (1995)" -> "Heat").
    pub fn clean_title(&self) -> &str {
        clean_title(&self.title)
    }
}

/// Cut a title at the first bracket and trim it.
pub fn clean_title(raw: &str) -> &str {
    raw.split(['[', '(']).next().unwrap_or(raw).trim()
}

/// Ordered records plus the last-updated stamp, persisted as one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub movies: Vec<MovieRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    pub fn pending_count(&self) -> usize {
        self.movies.iter().filter(|m| m.is_pending()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_transitions_only_leave_pending() {
        use EnrichmentStatus::*;
        assert!(PendingEnrichment.can_transition_to(&Enriched));
        assert!(PendingEnrichment.can_transition_to(&FailedEnrichment));
        assert!(!Enriched.can_transition_to(&PendingEnrichment));
        assert!(!FailedEnrichment.can_transition_to(&Enriched));
        assert!(!PendingEnrichment.can_transition_to(&PendingEnrichment));
        assert!(!Other("archived".into()).can_transition_to(&Enriched));
    }

    #[test]
    fn test_legacy_stamp_and_unknown_status_round_trip() {
        let raw = json!([
            {"id": 949, "title": "Heat", "status": "enriched", "enriched_at": "2024-03-01T10:00:00.123456"},
            {"title": "Ran", "status": "needs_review"},
            {"title": "Alien", "status": "pending_enrichment"}
        ]);

        let records: Vec<MovieRecord> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(records[0].enriched_at.as_deref(), Some("2024-03-01T10:00:00.123456"));
        assert_eq!(records[1].status, Some(EnrichmentStatus::Other("needs_review".into())));
        assert!(!records[1].is_pending());
        assert!(records[2].is_pending());

        assert_eq!(serde_json::to_value(&records).unwrap(), raw);
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let raw = json!({
            "id": 603,
            "title": "The Matrix",
            "status": "pending_enrichment",
            "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
            "note": "4K steelbook",
            "added_at": "2024-03-01T10:00:00Z"
        });

        let record: MovieRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.extra.len(), 3);
        assert_eq!(record.external_id(), Some(603));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_external_id_ignores_non_numeric_ids() {
        let record = MovieRecord::pending("Heat").with_id(json!("abc-123"));
        assert_eq!(record.external_id(), None);

        let record = MovieRecord::pending("Heat").with_id(json!("949"));
        assert_eq!(record.external_id(), Some(949));
    }

    #[test]
    fn test_clean_title_strips_bracketed_suffixes() {
        assert_eq!(clean_title("Heat [Blu-ray] (1995)"), "Heat");
        assert_eq!(clean_title("  Alien (4K UHD)"), "Alien");
        assert_eq!(clean_title("Arrival"), "Arrival");
    }

    #[test]
    fn test_catalog_without_status_is_not_pending() {
        let catalog: Catalog = serde_json::from_value(json!({
            "movies": [
                {"title": "A"},
                {"title": "B", "status": "enriched"},
                {"title": "C", "status": "pending_enrichment"}
            ],
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(catalog.pending_count(), 1);
    }
}
