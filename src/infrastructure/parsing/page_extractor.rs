//! Unstructured extraction from retailer pages
//!
//! The page is flattened to its visible text and run through the ordered
//! rule tables. An implausibly short page or an anti-bot interstitial title is
//! reported as a diagnostic, but extraction still runs and whatever it finds
//! (often nothing) is returned.

use scraper::Html;
use tracing::{debug, warn};

use super::config::ParsingConfig;
use super::context::ExtractContext;
use super::document::{PageReader, visible_len};
use super::rules::RuleSet;
use super::SpecExtractor;
use crate::domain::SpecMap;
use crate::infrastructure::parsing_error::ParsingResult;

/// Operator-facing observations about a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDiagnostic {
    /// Visible text shorter than the configured minimum
    ShortBody { visible_len: usize, min: usize },
    /// Title matches a known block page
    Interstitial { title: String },
}

/// Visible text and title of a page, read in one synchronous step
#[derive(Debug, Clone, Default)]
pub struct PageText {
    pub title: Option<String>,
    pub text: String,
}

pub struct PageExtractor {
    config: ParsingConfig,
    reader: PageReader,
    rules: RuleSet,
}

impl PageExtractor {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(ParsingConfig::default())
    }

    pub fn with_config(config: ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            reader: PageReader::with_config(&config)?,
            rules: RuleSet::retailer_page()?,
            config,
        })
    }

    /// Flatten `body` to visible text.
    ///
    /// Plain text bodies come through unchanged, since the HTML parser wraps
    /// them in an implicit `<body>`.
    pub fn read(&self, body: &str) -> PageText {
        let html = Html::parse_document(body);
        PageText {
            title: self.reader.title(&html),
            text: self.reader.visible_text(&html),
        }
    }

    pub fn diagnose(&self, page: &PageText) -> Vec<PageDiagnostic> {
        let mut diagnostics = Vec::new();

        let len = visible_len(&page.text);
        if len < self.config.min_visible_text_len {
            diagnostics.push(PageDiagnostic::ShortBody {
                visible_len: len,
                min: self.config.min_visible_text_len,
            });
        }

        if let Some(title) = &page.title {
            let lowered = title.to_lowercase();
            if self
                .config
                .interstitial_markers
                .iter()
                .any(|marker| lowered.contains(&marker.to_lowercase()))
            {
                diagnostics.push(PageDiagnostic::Interstitial {
                    title: title.clone(),
                });
            }
        }

        diagnostics
    }
}

impl SpecExtractor for PageExtractor {
    fn extract(&self, body: &str, context: &ExtractContext) -> SpecMap {
        let page = self.read(body);

        for diagnostic in self.diagnose(&page) {
            match diagnostic {
                PageDiagnostic::ShortBody { visible_len, min } => warn!(
                    "Page for '{}' has only {} visible characters (expected at least {}), possibly a block page: {}",
                    context.title, visible_len, min, context.url
                ),
                PageDiagnostic::Interstitial { title } => warn!(
                    "Page for '{}' looks like an anti-bot interstitial ('{}'): {}",
                    context.title, title, context.url
                ),
            }
        }

        let map = self.rules.extract(&page.text);
        debug!(
            "Extracted {} fields for '{}': {:?}",
            map.len(),
            context.title,
            map.field_names()
        );
        map
    }
}
