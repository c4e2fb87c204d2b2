use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Token-Sifter
///
/// Every section is optional; a missing section or key falls back to the
/// defaults that target the public Etherscan token index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub target: TargetConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Politeness and robustness knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of in-flight requests per throttled domain
    pub parallelism: u32,

    /// Fixed delay between requests to a throttled domain (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Upper bound of the uniform random delay added on top (milliseconds)
    #[serde(rename = "random-delay-ms")]
    pub random_delay_ms: u64,

    /// Domains the politeness rule applies to (e.g. "*etherscan.*")
    #[serde(rename = "domain-glob")]
    pub domain_glob: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient fetch failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff between retries, doubled on every attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound for a whole crawl run (seconds, 0 disables)
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: u64,

    /// Interval between runs in watch mode (seconds)
    #[serde(rename = "scrape-period-secs")]
    pub scrape_period_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            parallelism: 1,
            delay_ms: 0,
            random_delay_ms: 2_000,
            domain_glob: "*etherscan.*".to_string(),
            request_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 5_000,
            crawl_timeout_secs: 6 * 60 * 60,
            scrape_period_secs: 60 * 60,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Returns None when the global crawl timeout is disabled
    pub fn crawl_timeout(&self) -> Option<Duration> {
        (self.crawl_timeout_secs > 0).then(|| Duration::from_secs(self.crawl_timeout_secs))
    }

    pub fn scrape_period(&self) -> Duration {
        Duration::from_secs(self.scrape_period_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "token-sifter".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/token-sifter/token-sifter".to_string(),
            contact_email: "ops@token-sifter.dev".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Where the listing lives and which pages count as token detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Listing endpoint without the page parameter
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Query parameter carrying the 1-based page number
    #[serde(rename = "page-param")]
    pub page_param: String,

    /// Route templates of detail pages, e.g. "/token/{address}"
    #[serde(rename = "detail-routes")]
    pub detail_routes: Vec<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://etherscan.io/tokens".to_string(),
            page_param: "p".to_string(),
            detail_routes: vec!["/token/{address}".to_string()],
        }
    }
}

/// CSS selectors for the listing and detail page layouts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Pagination widget text holding the total page count
    #[serde(rename = "page-count")]
    pub page_count: String,

    /// Token-name cell of each listing row
    #[serde(rename = "token-cell")]
    pub token_cell: String,

    /// Anchor inside the token-name cell
    #[serde(rename = "token-link")]
    pub token_link: String,

    /// Breadcrumb element holding the token name
    pub name: String,

    /// First summary row item, e.g. "1,000,000 ABC"
    pub supply: String,

    /// Anchor holding the contract address
    pub contract: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            page_count: "div.col-sm-6 b:nth-child(2)".to_string(),
            token_cell: "#ContentPlaceHolder1_divresult tbody tr td:nth-child(3)".to_string(),
            token_link: "a[href]".to_string(),
            name: ".breadcrumbs #address".to_string(),
            supply: "#ContentPlaceHolder1_divSummary tbody tr:nth-child(1) td.tditem".to_string(),
            contract: "#ContentPlaceHolder1_trContract td.tditem a".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the JSON metadata document
    #[serde(rename = "metadata-path")]
    pub metadata_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metadata_path: "resources/tokenMetadata.json".to_string(),
        }
    }
}
