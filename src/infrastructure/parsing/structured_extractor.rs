//! Structured extraction from TMDB movie documents
//!
//! Direct projection: runtime in minutes, spoken language names as audio
//! tracks, production country codes. Every declared field is always present
//! in the result, as `Null` when the document lacks it.

use tracing::{debug, warn};

use super::context::ExtractContext;
use super::SpecExtractor;
use crate::domain::{SpecField, SpecMap, SpecValue};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use crate::infrastructure::tmdb::MovieDetails;

/// Fields this extractor always reports
pub const DECLARED_FIELDS: [SpecField; 3] = [
    SpecField::Runtime,
    SpecField::AudioTracks,
    SpecField::ProductionCountries,
];

#[derive(Debug, Clone, Default)]
pub struct StructuredExtractor;

impl StructuredExtractor {
    pub const fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &str) -> ParsingResult<MovieDetails> {
        serde_json::from_str(body).map_err(|e| ParsingError::malformed("movie details", e))
    }

    pub fn project(&self, details: &MovieDetails) -> SpecMap {
        let mut map = SpecMap::new();

        map.insert(
            SpecField::Runtime,
            details.runtime.map_or(SpecValue::Null, SpecValue::Integer),
        );

        let languages = details.spoken_languages.as_ref().map(|langs| {
            langs
                .iter()
                .filter_map(|l| l.english_name.clone())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        });
        map.insert(
            SpecField::AudioTracks,
            languages.map_or(SpecValue::Null, SpecValue::List),
        );

        let countries = details.production_countries.as_ref().map(|countries| {
            countries
                .iter()
                .filter_map(|c| c.iso_3166_1.clone())
                .collect::<Vec<_>>()
        });
        map.insert(
            SpecField::ProductionCountries,
            countries.map_or(SpecValue::Null, SpecValue::List),
        );

        map
    }
}

impl SpecExtractor for StructuredExtractor {
    fn extract(&self, body: &str, context: &ExtractContext) -> SpecMap {
        match self.parse(body) {
            Ok(details) => {
                let map = self.project(&details);
                debug!("Projected TMDB details for '{}': {:?}", context.title, map);
                map
            }
            Err(e) => {
                warn!("Unreadable TMDB response for '{}': {}", context.title, e);
                SpecMap::new()
            }
        }
    }
}
