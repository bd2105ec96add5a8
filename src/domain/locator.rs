use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved source address believed to describe a record.
///
/// Absence is modelled as `Option<Locator>`; a `Locator` always names
/// something fetchable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// Metadata API endpoint for a known numeric id
    Structured { url: String, tmdb_id: u64 },
    /// Retailer page, scraped as text and markup
    Page { url: String },
}

impl Locator {
    pub fn page(url: impl Into<String>) -> Self {
        Self::Page { url: url.into() }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Structured { url, .. } | Self::Page { url } => url,
        }
    }

    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }

    /// Address stored on the record as provenance.
    ///
    /// The API endpoint carries the credential in its query string, so the
    /// provenance for a structured locator is the public movie page instead.
    pub fn provenance(&self) -> String {
        match self {
            Self::Structured { tmdb_id, .. } => {
                format!("https://www.themoviedb.org/movie/{tmdb_id}")
            }
            Self::Page { url } => url.clone(),
        }
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        self.url()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured { tmdb_id, .. } => write!(f, "tmdb movie {tmdb_id}"),
            Self::Page { url } => f.write_str(url),
        }
    }
}
