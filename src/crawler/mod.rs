//! Crawler module for listing and detail page processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and failure classification
//! - Request scheduling and rate limiting
//! - Overall crawl coordination and reporting

mod coordinator;
mod fetcher;
mod report;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_page, is_rate_limited, FetchedPage};
pub use report::{CrawlReport, DetailOutcome};
pub use scheduler::{LimitRule, RequestPermit, Scheduler};
