//! Context passed to the spec extractors

/// What the extractor knows about the document it is reading
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Address the body was fetched from (after redirects)
    pub url: String,

    /// Title of the record being enriched, for log lines
    pub title: String,
}

impl ExtractContext {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}
