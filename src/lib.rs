//! Token-Sifter: a polite token-listing scraper
//!
//! This crate crawls a paginated token-listing site, follows every listed token
//! to its detail page, extracts name, symbol and contract address, and writes the
//! collected metadata as a single JSON document once the crawl is complete.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod state;
pub mod storage;
pub mod token;
pub mod url;

use thiserror::Error;

/// Main error type for Token-Sifter operations
#[derive(Debug, Error)]
pub enum SifterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] extract::ExtractError),

    #[error("Failed to persist metadata: {0}")]
    Persist(#[from] storage::PersistError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid crawl phase transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {name}: {selector}")]
    InvalidSelector { name: &'static str, selector: String },

    #[error("Invalid detail route: {0}")]
    InvalidRoute(String),
}

/// Why a single fetch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request or the body read exceeded the configured timeout
    Timeout,
    /// Connection refused, DNS failure, TLS failure
    Connect,
    /// Non-2xx response
    Status(u16),
    /// Response was not HTML
    ContentMismatch(String),
    /// Body could not be read
    Body(String),
    /// Any other request failure
    Request(String),
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::ContentMismatch(ct) => write!(f, "expected HTML, got '{}'", ct),
            Self::Body(e) => write!(f, "failed to read body: {}", e),
            Self::Request(e) => write!(f, "{}", e),
        }
    }
}

/// A network or HTTP failure for one URL
#[derive(Debug, Clone, Error)]
#[error("Fetch failed for {url}: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// Returns true if retrying the same request may succeed
    ///
    /// Timeouts, connection failures, HTTP 429 and 5xx responses are transient.
    /// Everything else (404, content mismatch, ...) is permanent for this crawl.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            FetchErrorKind::Timeout | FetchErrorKind::Connect => true,
            FetchErrorKind::Status(code) => code == 429 || (500..600).contains(&code),
            _ => false,
        }
    }
}

/// Result type alias for Token-Sifter operations
pub type Result<T> = std::result::Result<T, SifterError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, CrawlReport};
pub use state::{CrawlPhase, ResultSet};
pub use storage::{JsonFileStore, MetadataStore};
pub use token::TokenMetadata;
