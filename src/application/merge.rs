//! Merge: fold a spec map into a record and move its status
//!
//! Every field present in the map overwrites the record's value, `Null`
//! included; fields absent from the map are left alone. Status only ever moves
//! out of `pending_enrichment`, so a record in any other state comes back
//! unchanged.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::domain::{EnrichmentStatus, Locator, MovieRecord, SpecField, SpecMap, SpecValue};

/// Overwrite the record's fields with every entry of `spec`.
///
/// Values of the wrong shape for a field (a list where a number belongs) are
/// skipped with a warning.
pub fn apply_spec(record: &mut MovieRecord, spec: &SpecMap) {
    for (field, value) in spec.iter() {
        let applied = match field {
            SpecField::Runtime => int_value(value).map(|v| record.runtime = v),
            SpecField::Audio => text_value(value).map(|v| record.audio = v),
            SpecField::AudioTracks => list_value(value).map(|v| record.audio_tracks = v),
            SpecField::Region => text_value(value).map(|v| record.region = v),
            SpecField::Packaging => text_value(value).map(|v| record.packaging = v),
            SpecField::DiscCount => int_value(value).map(|v| record.disc_count = v),
            SpecField::ProductionCountries => {
                list_value(value).map(|v| record.production_countries = v)
            }
            SpecField::SourceUrl => text_value(value).map(|v| record.source_url = v),
        };
        if applied.is_none() {
            warn!("Skipping {} for '{}': unusable value {:?}", field, record.title, value);
        }
    }
}

/// Successful enrichment: apply `spec`, record provenance, mark enriched.
///
/// An empty map still counts as success.
pub fn merge(record: &MovieRecord, spec: &SpecMap, locator: &Locator, now: DateTime<Utc>) -> MovieRecord {
    let mut updated = record.clone();
    if !transition(&mut updated, EnrichmentStatus::Enriched) {
        return updated;
    }

    apply_spec(&mut updated, spec);
    updated.source_url = Some(locator.provenance());
    updated.enriched_at = Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));
    debug!(
        "Merged {} fields into '{}' from {}",
        spec.len(),
        updated.title,
        locator
    );
    updated
}

/// No locator, or a blocked fetch: mark failed and touch nothing else
pub fn mark_failed(record: &MovieRecord) -> MovieRecord {
    let mut updated = record.clone();
    transition(&mut updated, EnrichmentStatus::FailedEnrichment);
    updated
}

fn transition(record: &mut MovieRecord, next: EnrichmentStatus) -> bool {
    let allowed = record
        .status
        .as_ref()
        .is_some_and(|current| current.can_transition_to(&next));
    if allowed {
        record.status = Some(next);
    } else {
        warn!(
            "Refusing status change {:?} -> {} for '{}'",
            record.status, next, record.title
        );
    }
    allowed
}

fn text_value(value: &SpecValue) -> Option<Option<String>> {
    match value {
        SpecValue::Text(s) => Some(Some(s.clone())),
        SpecValue::Integer(n) => Some(Some(n.to_string())),
        SpecValue::List(items) => Some(Some(items.join(", "))),
        SpecValue::Null => Some(None),
    }
}

fn int_value(value: &SpecValue) -> Option<Option<u32>> {
    match value {
        SpecValue::Integer(n) => u32::try_from(*n).ok().map(Some),
        SpecValue::Text(s) => s.trim().parse().ok().map(Some),
        SpecValue::List(_) => None,
        SpecValue::Null => Some(None),
    }
}

fn list_value(value: &SpecValue) -> Option<Option<Vec<String>>> {
    match value {
        SpecValue::List(items) => Some(Some(items.clone())),
        SpecValue::Text(s) => Some(Some(vec![s.clone()])),
        SpecValue::Integer(_) => None,
        SpecValue::Null => Some(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    fn page() -> Locator {
        Locator::page("https://www.blu-ray.com/movies/Heat/2398/")
    }

    #[test]
    fn test_merge_sets_fields_status_and_provenance() {
        let record = MovieRecord::pending("Heat");
        let spec: SpecMap = [
            (SpecField::Runtime, SpecValue::Integer(170)),
            (SpecField::Audio, SpecValue::from("DTS-HD Master Audio 5.1")),
        ]
        .into_iter()
        .collect();

        let merged = merge(&record, &spec, &page(), now());
        assert_eq!(merged.status, Some(EnrichmentStatus::Enriched));
        assert_eq!(merged.runtime, Some(170));
        assert_eq!(merged.audio.as_deref(), Some("DTS-HD Master Audio 5.1"));
        assert_eq!(merged.source_url.as_deref(), Some("https://www.blu-ray.com/movies/Heat/2398/"));
        assert_eq!(merged.enriched_at.as_deref(), Some("2025-01-02T03:04:05Z"));
    }

    #[test]
    fn test_empty_map_still_enriches() {
        let merged = merge(&MovieRecord::pending("Heat"), &SpecMap::new(), &page(), now());
        assert_eq!(merged.status, Some(EnrichmentStatus::Enriched));
        assert!(merged.runtime.is_none());
    }

    #[test]
    fn test_structured_provenance_hides_credential() {
        let locator = Locator::Structured {
            url: "https://api.themoviedb.org/3/movie/949?api_key=secret".to_string(),
            tmdb_id: 949,
        };
        let merged = merge(&MovieRecord::pending("Heat"), &SpecMap::new(), &locator, now());
        assert_eq!(merged.source_url.as_deref(), Some("https://www.themoviedb.org/movie/949"));
    }

    #[test]
    fn test_mark_failed_touches_no_spec_fields() {
        let mut record = MovieRecord::pending("Heat");
        record.region = Some("A".to_string());

        let failed = mark_failed(&record);
        assert_eq!(failed.status, Some(EnrichmentStatus::FailedEnrichment));
        assert_eq!(failed.region.as_deref(), Some("A"));
        assert!(failed.enriched_at.is_none());
        assert!(failed.source_url.is_none());
    }

    #[test]
    fn test_null_clears_and_absent_keeps() {
        let mut record = MovieRecord::pending("Heat");
        record.runtime = Some(100);
        record.region = Some("B".to_string());

        let mut spec = SpecMap::new();
        spec.insert(SpecField::Runtime, SpecValue::Null);
        apply_spec(&mut record, &spec);

        assert!(record.runtime.is_none());
        assert_eq!(record.region.as_deref(), Some("B"));
    }

    #[test]
    fn test_wrong_shape_is_skipped() {
        let mut record = MovieRecord::pending("Heat");
        record.disc_count = Some(2);

        let mut spec = SpecMap::new();
        spec.insert(SpecField::DiscCount, vec!["two".to_string()]);
        apply_spec(&mut record, &spec);

        assert_eq!(record.disc_count, Some(2));
    }

    fn status_strategy() -> impl Strategy<Value = EnrichmentStatus> {
        prop_oneof![
            Just(EnrichmentStatus::PendingEnrichment),
            Just(EnrichmentStatus::Enriched),
            Just(EnrichmentStatus::FailedEnrichment),
            Just(EnrichmentStatus::Other("archived".to_string())),
        ]
    }

    fn spec_strategy() -> impl Strategy<Value = SpecMap> {
        (
            proptest::option::of(0_i64..400),
            proptest::option::of("[A-Za-z ]{1,20}"),
            proptest::option::of(prop_oneof![Just("A"), Just("B"), Just("Free")]),
        )
            .prop_map(|(runtime, audio, region)| {
                let mut spec = SpecMap::new();
                if let Some(r) = runtime {
                    spec.insert(SpecField::Runtime, r);
                }
                if let Some(a) = audio {
                    spec.insert(SpecField::Audio, a);
                }
                if let Some(r) = region {
                    spec.insert(SpecField::Region, r);
                }
                spec
            })
    }

    proptest! {
        #[test]
        fn prop_status_never_leaves_final_state(status in status_strategy(), spec in spec_strategy(), fail in any::<bool>()) {
            let mut record = MovieRecord::pending("Heat");
            record.status = Some(status.clone());

            let next = if fail { mark_failed(&record) } else { merge(&record, &spec, &page(), now()) };

            if status == EnrichmentStatus::PendingEnrichment {
                prop_assert_ne!(next.status, Some(EnrichmentStatus::PendingEnrichment));
            } else {
                prop_assert_eq!(next, record);
            }
        }

        #[test]
        fn prop_second_merge_overwrites_only_present_fields(first in spec_strategy(), second in spec_strategy()) {
            let mut record = MovieRecord::pending("Heat");
            apply_spec(&mut record, &first);
            let before = record.clone();
            apply_spec(&mut record, &second);

            if !second.contains(SpecField::Runtime) {
                prop_assert_eq!(record.runtime, before.runtime);
            }
            if !second.contains(SpecField::Audio) {
                prop_assert_eq!(&record.audio, &before.audio);
            }
            if !second.contains(SpecField::Region) {
                prop_assert_eq!(&record.region, &before.region);
            }
            if let Some(SpecValue::Integer(n)) = second.get(SpecField::Runtime) {
                prop_assert_eq!(record.runtime, u32::try_from(*n).ok());
            }
        }
    }
}
