//! Reading fetched HTML: flattened visible text, title and links
//!
//! `scraper::Html` is not `Send`, so callers parse and read a document in one
//! synchronous step and only carry the extracted strings across awaits.

use scraper::{Html, Node, Selector};
use tracing::{debug, warn};
use url::Url;

use super::config::ParsingConfig;
use super::links::LinkCandidate;
use crate::infrastructure::config::utils::resolve_url;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Compiled selectors for page reading
pub struct PageReader {
    title_selector: Selector,
    anchor_selector: Selector,
    search_link_selectors: Vec<Selector>,
    hidden_tags: Vec<String>,
}

impl PageReader {
    /// Reader with the default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        let selectors = &config.selectors;
        Ok(Self {
            title_selector: compile_selector(&selectors.title)?,
            anchor_selector: compile_selector(&selectors.anchor)?,
            search_link_selectors: compile_selectors(&selectors.search_result_link)?,
            hidden_tags: selectors.hidden_tags.clone(),
        })
    }

    /// All text a reader would see, text nodes separated by newlines.
    pub fn visible_text(&self, html: &Html) -> String {
        let mut out = String::new();
        for node in html.tree.root().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| self.hidden_tags.iter().any(|tag| tag == el.name()))
            });
            if hidden || text.trim().is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(text);
        }
        out
    }

    /// Document `<title>`, trimmed
    pub fn title(&self, html: &Html) -> Option<String> {
        html.select(&self.title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Every anchor on the page, hrefs resolved against `base_url`
    pub fn anchors(&self, html: &Html, base_url: &str) -> Vec<LinkCandidate> {
        html.select(&self.anchor_selector)
            .filter_map(|el| {
                let href = el.value().attr("href")?;
                let url = resolve_url(base_url, href)?;
                let text = normalize_ws(&el.text().collect::<String>());
                Some(LinkCandidate { url, text })
            })
            .collect()
    }

    /// Result links from the general search provider's page.
    ///
    /// Selectors are tried in order; the first one that matches anything is
    /// used. Redirect wrappers (`/l/?uddg=<target>`) are unwrapped.
    pub fn search_result_links(&self, html: &Html, base_url: &str) -> Vec<LinkCandidate> {
        for selector in &self.search_link_selectors {
            let links: Vec<LinkCandidate> = html
                .select(selector)
                .filter_map(|el| {
                    let href = el.value().attr("href")?;
                    let url = unwrap_redirect(&resolve_url(base_url, href)?);
                    let text = normalize_ws(&el.text().collect::<String>());
                    Some(LinkCandidate { url, text })
                })
                .collect();
            if !links.is_empty() {
                return links;
            }
        }
        debug!("No search result links found with {} selectors", self.search_link_selectors.len());
        Vec::new()
    }
}

fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Compile selector strings, skipping bad ones as long as one survives
fn compile_selectors(selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ParsingError::invalid_selector(
            &selector_strings.join(", "),
            errors.join(", "),
        ));
    }

    Ok(selectors)
}

/// Follow a search provider redirect wrapper to its real target
fn unwrap_redirect(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_else(|| url.to_string())
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of non-whitespace characters
pub fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
