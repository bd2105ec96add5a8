//! Partial technical-spec mappings produced by extraction
//!
//! The field vocabulary is closed. A field missing from a [`SpecMap`] means
//! "not found", never an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed vocabulary of extractable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    Runtime,
    Audio,
    AudioTracks,
    Region,
    Packaging,
    DiscCount,
    ProductionCountries,
    SourceUrl,
}

impl SpecField {
    pub const ALL: [Self; 8] = [
        Self::Runtime,
        Self::Audio,
        Self::AudioTracks,
        Self::Region,
        Self::Packaging,
        Self::DiscCount,
        Self::ProductionCountries,
        Self::SourceUrl,
    ];

    /// Record key this field is stored under
    pub const fn key(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Audio => "audio",
            Self::AudioTracks => "audio_tracks",
            Self::Region => "region",
            Self::Packaging => "packaging",
            Self::DiscCount => "disc_count",
            Self::ProductionCountries => "production_countries",
            Self::SourceUrl => "source_url",
        }
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Extracted value for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Integer(i64),
    Text(String),
    List(Vec<String>),
    /// Declared by a structured document but null or missing there
    Null,
}

impl SpecValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for SpecValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SpecValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Vec<String>> for SpecValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Partial mapping field -> value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecMap(BTreeMap<SpecField, SpecValue>);

impl SpecMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: SpecField, value: impl Into<SpecValue>) -> Option<SpecValue> {
        self.0.insert(field, value.into())
    }

    pub fn get(&self, field: SpecField) -> Option<&SpecValue> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: SpecField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpecField, &SpecValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Field names present, for log lines
    pub fn field_names(&self) -> Vec<&'static str> {
        self.0.keys().map(|f| f.key()).collect()
    }
}

impl FromIterator<(SpecField, SpecValue)> for SpecMap {
    fn from_iter<I: IntoIterator<Item = (SpecField, SpecValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for SpecMap {
    type Item = (SpecField, SpecValue);
    type IntoIter = std::collections::btree_map::IntoIter<SpecField, SpecValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_field_is_not_found() {
        let mut map = SpecMap::new();
        map.insert(SpecField::Region, "A");

        assert!(map.contains(SpecField::Region));
        assert!(map.get(SpecField::Audio).is_none());
        assert_eq!(map.field_names(), vec!["region"]);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(SpecValue::from(120_i64).as_integer(), Some(120));
        assert_eq!(SpecValue::from("Dolby Atmos").as_text(), Some("Dolby Atmos"));
        assert!(SpecValue::Null.as_text().is_none());
        assert_eq!(
            SpecValue::from(vec!["US".to_string()]).as_list(),
            Some(&["US".to_string()][..])
        );
    }
}
