//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the identifying user agent
//! - GET requests for listing and detail pages
//! - Error classification into `FetchErrorKind`
//!
//! Retrying is the coordinator's decision; a fetch here is always one request.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::{FetchError, FetchErrorKind};
use reqwest::{redirect::Policy, Client, StatusCode};
use scraper::Html;
use std::time::Duration;
use url::Url;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Page body content
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a DOM
    ///
    /// html5ever recovers from malformed markup, so this never fails. The
    /// returned document is not `Send`; parse after the last `.await`.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Supplies the per-request timeout
///
/// # Example
///
/// ```no_run
/// use token_sifter::config::{CrawlerConfig, UserAgentConfig};
/// use token_sifter::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = crawler.request_timeout();

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies any failure
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML (or no) Content-Type | `Ok(FetchedPage)` |
/// | Non-2xx status | `FetchErrorKind::Status` |
/// | Non-HTML Content-Type | `FetchErrorKind::ContentMismatch` |
/// | Timeout (request or body) | `FetchErrorKind::Timeout` |
/// | Connection refused, DNS, TLS | `FetchErrorKind::Connect` |
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| FetchError::new(url.as_str(), classify(&e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(
            url.as_str(),
            FetchErrorKind::Status(status.as_u16()),
        ));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty() && !content_type.contains("html") {
        return Err(FetchError::new(
            url.as_str(),
            FetchErrorKind::ContentMismatch(content_type),
        ));
    }

    let final_url = response.url().clone();
    let body = response.text().await.map_err(|e| {
        let kind = if e.is_timeout() {
            FetchErrorKind::Timeout
        } else {
            FetchErrorKind::Body(e.to_string())
        };
        FetchError::new(url.as_str(), kind)
    })?;

    Ok(FetchedPage {
        url: final_url,
        status: status.as_u16(),
        body,
    })
}

/// Returns true for responses that ask the client to slow down
pub fn is_rate_limited(error: &FetchError) -> bool {
    error.kind == FetchErrorKind::Status(StatusCode::TOO_MANY_REQUESTS.as_u16())
}

fn classify(error: &reqwest::Error) -> FetchErrorKind {
    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_connect() {
        FetchErrorKind::Connect
    } else {
        FetchErrorKind::Request(error.to_string())
    }
}
