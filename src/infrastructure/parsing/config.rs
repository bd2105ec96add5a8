//! Parsing configuration for HTML extraction
//!
//! Centralized CSS selectors and thresholds used by the extractors and the
//! link parsers.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::{bluray_com, defaults};

/// Main parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Visible text shorter than this is reported as a probable block page
    pub min_visible_text_len: usize,

    /// Path segment that marks a movie detail page on the retailer site
    pub movie_path_marker: String,

    /// Page titles that identify anti-bot interstitials
    pub interstitial_markers: Vec<String>,

    pub selectors: PageSelectors,
}

/// CSS selectors for retailer and search pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSelectors {
    /// Document title
    pub title: String,

    /// Any anchor with a target
    pub anchor: String,

    /// Result links on the general search provider's HTML page, tried in order
    pub search_result_link: Vec<String>,

    /// Tag names whose text is never visible
    pub hidden_tags: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            min_visible_text_len: defaults::MIN_VISIBLE_TEXT_LEN,
            movie_path_marker: bluray_com::MOVIE_PATH_MARKER.to_string(),
            interstitial_markers: vec![
                "Just a moment".to_string(),
                "Cloudflare".to_string(),
                "Access Denied".to_string(),
            ],
            selectors: PageSelectors::default(),
        }
    }
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            anchor: "a[href]".to_string(),
            search_result_link: vec![
                "a.result__a".to_string(),
                "h2.result__title a".to_string(),
                "a[data-testid='result-title-a']".to_string(),
            ],
            hidden_tags: vec![
                "script".to_string(),
                "style".to_string(),
                "noscript".to_string(),
                "template".to_string(),
            ],
        }
    }
}
