//! HTTP client for page and API fetches
//!
//! Every request carries the same browser identity headers. Responses are
//! classified rather than turned into errors, so callers branch on
//! [`FetchOutcome`] instead of unwinding through `?`.

use crate::infrastructure::config::HttpConfig;
use anyhow::{Context, Result};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT},
};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Query parameters whose values never reach a log line
const SECRET_PARAMS: [&str; 1] = ["api_key"];

/// A successfully fetched response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    /// Address after redirects
    pub final_url: String,
    pub body: String,
}

/// Classified result of one GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(FetchedPage),
    /// Anti-bot rejection (403/429); not retried within a run
    Blocked { status: u16, url: String },
    /// Any other non-2xx status or a transport fault
    Failed {
        status: Option<u16>,
        url: String,
        reason: String,
    },
}

/// How a status code is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Blocked,
    Failure,
}

/// Classify a response status
pub fn classify_status(status: StatusCode) -> StatusClass {
    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => StatusClass::Blocked,
        s if s.is_success() => StatusClass::Success,
        _ => StatusClass::Failure,
    }
}

/// Fetcher with a fixed browser identity and a fixed timeout
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept).context("Invalid accept header")?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).context("Invalid accept-language header")?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referer).context("Invalid referer")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// GET a URL and classify the response. Never retries.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let shown = redact_url(url);
        info!("Fetching URL: {}", shown);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Transport failure for {}: {}", shown, e);
                return FetchOutcome::Failed {
                    status: None,
                    url: url.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        match classify_status(status) {
            StatusClass::Blocked => {
                warn!("Blocked with status {} at {}", status, shown);
                FetchOutcome::Blocked {
                    status: status.as_u16(),
                    url: url.to_string(),
                }
            }
            StatusClass::Failure => {
                warn!("HTTP request failed with status {}: {}", status, shown);
                FetchOutcome::Failed {
                    status: Some(status.as_u16()),
                    url: url.to_string(),
                    reason: format!("HTTP status {status}"),
                }
            }
            StatusClass::Success => match response.text().await {
                Ok(body) => {
                    debug!(
                        "Fetched {} ({} bytes, final url {})",
                        shown,
                        body.len(),
                        redact_url(&final_url)
                    );
                    FetchOutcome::Success(FetchedPage {
                        status: status.as_u16(),
                        final_url,
                        body,
                    })
                }
                Err(e) => FetchOutcome::Failed {
                    status: Some(status.as_u16()),
                    url: url.to_string(),
                    reason: format!("Failed to read response body: {e}"),
                },
            },
        }
    }
}

/// `url` with credential query values masked, for logging
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed
        .query_pairs()
        .any(|(k, _)| is_secret(&k))
    {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if is_secret(&k) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

fn is_secret(key: &str) -> bool {
    SECRET_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(&HttpConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_user_agent_is_rejected() {
        let config = HttpConfig {
            user_agent: "bad\nagent".to_string(),
            ..HttpConfig::default()
        };
        assert!(HttpClient::new(&config).is_err());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(StatusCode::OK), StatusClass::Success);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), StatusClass::Blocked);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), StatusClass::Blocked);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusClass::Failure);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), StatusClass::Failure);
    }

    #[test]
    fn test_redact_url_masks_api_key() {
        let redacted = redact_url("https://api.themoviedb.org/3/movie/949?api_key=secret&append_to_response=release_dates");
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("append_to_response=release_dates"));
        assert_eq!(redact_url("https://www.blu-ray.com/movies/Heat/2398/"), "https://www.blu-ray.com/movies/Heat/2398/");
    }
}
